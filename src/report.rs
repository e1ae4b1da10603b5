use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::footprint::emissions::{EmissionsEstimator, FootprintBreakdown};
use crate::footprint::input::LifestyleInput;
use crate::footprint::pricing::PricingCalculator;
use crate::footprint::prompt::{PromptTemplate, report_variables};

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Hosted language model that turns a filled prompt into tips.
#[async_trait]
pub trait TipGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Completion>;

    fn model(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub input: LifestyleInput,
    pub breakdown: FootprintBreakdown,
    pub tips: Option<String>,
    /// Shown instead of tips when the model call failed.
    pub tips_error: Option<String>,
    pub cost_usd: Option<f64>,
    pub generated_at: DateTime<Utc>,
}

/// input → emissions → prompt → LLM.
pub struct ReportService {
    estimator: EmissionsEstimator,
    llm: Arc<dyn TipGenerator>,
    template: PromptTemplate,
    pricing: PricingCalculator,
}

impl ReportService {
    pub fn new(estimator: EmissionsEstimator, llm: Arc<dyn TipGenerator>, template: PromptTemplate) -> Self {
        Self {
            estimator,
            llm,
            template,
            pricing: PricingCalculator::new(),
        }
    }

    pub fn estimator(&self) -> &EmissionsEstimator {
        &self.estimator
    }

    pub async fn generate(&self, input: LifestyleInput) -> Result<Report> {
        self.generate_on(input, crate::footprint::usage::today()).await
    }

    pub async fn generate_on(&self, input: LifestyleInput, date: NaiveDate) -> Result<Report> {
        let breakdown = self.estimator.breakdown(&input, date).await;
        info!(
            energy_kg = breakdown.energy_kg,
            commute_kg = breakdown.commute_kg,
            source = ?breakdown.source,
            fallback = breakdown.source.is_fallback(),
            "Footprint computed"
        );

        let prompt = self.template.render(&report_variables(&input, &breakdown))?;

        let (tips, tips_error, cost_usd) = match self.llm.generate(&prompt).await {
            Ok(completion) => {
                let cost = self.pricing.calculate(
                    self.llm.model(),
                    completion.input_tokens,
                    completion.output_tokens,
                );
                info!(
                    model = self.llm.model(),
                    input_tokens = completion.input_tokens,
                    output_tokens = completion.output_tokens,
                    cost_usd = cost,
                    "Tips generated"
                );
                (Some(completion.text), None, Some(cost))
            }
            Err(e) => {
                warn!("Error generating tips: {e:#}");
                (None, Some(format!("Error generating tips: {e:#}")), None)
            }
        };

        Ok(Report {
            input,
            breakdown,
            tips,
            tips_error,
            cost_usd,
            generated_at: Utc::now(),
        })
    }
}
