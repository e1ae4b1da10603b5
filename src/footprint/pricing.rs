pub struct PricingModel {
    pub input_price_per_1m: f64,
    pub output_price_per_1m: f64,
}

#[derive(Default)]
pub struct PricingCalculator;

impl PricingCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn get_model_pricing(&self, model_name: &str) -> PricingModel {
        // Cohere list prices, USD per 1M tokens
        if model_name.contains("r7b") {
            PricingModel {
                input_price_per_1m: 0.0375,
                output_price_per_1m: 0.15,
            }
        } else if model_name.contains("plus") || model_name.contains("command-a") {
            PricingModel {
                input_price_per_1m: 2.50,
                output_price_per_1m: 10.00,
            }
        } else if model_name.contains("command-r") {
            PricingModel {
                input_price_per_1m: 0.15,
                output_price_per_1m: 0.60,
            }
        } else {
            // Legacy `command` / `command-light`
            PricingModel {
                input_price_per_1m: 1.00,
                output_price_per_1m: 2.00,
            }
        }
    }

    /// Cost of one completion in USD.
    pub fn calculate(&self, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        let pricing = self.get_model_pricing(model);

        let input_cost = (input_tokens as f64 / 1_000_000.0) * pricing.input_price_per_1m;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * pricing.output_price_per_1m;

        input_cost + output_cost
    }
}
