pub mod chart;
pub mod theme;
