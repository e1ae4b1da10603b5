pub mod emissions;
pub mod input;
pub mod pricing;
pub mod prompt;
pub mod usage;
