use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::input::LifestyleInput;
use super::usage::UsageStore;

const QUOTA_WARNING: &str = "API limit reached! Using static calculation.";

/// Remote electricity-emissions estimate.
#[async_trait]
pub trait EmissionsApi: Send + Sync {
    /// Kilograms of CO2 for `kwh` of electricity consumed in `country`.
    async fn electricity_kg(&self, kwh: f64, country: &str) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    pub fallback_kg_per_kwh: f64,
    pub commute_kg_per_km: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            fallback_kg_per_kwh: 0.5,
            commute_kg_per_km: 0.12,
        }
    }
}

impl EmissionFactors {
    /// Static estimate used when the API is out of reach.
    pub fn fallback_energy_kg(&self, kwh: f64) -> f64 {
        non_negative(kwh) * non_negative(self.fallback_kg_per_kwh)
    }

    pub fn commute_kg(&self, km: f64) -> f64 {
        non_negative(km) * non_negative(self.commute_kg_per_km)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionSource {
    Api,
    /// Daily API quota used up.
    QuotaExhausted,
    /// API call failed.
    ApiUnavailable,
    /// Nothing to estimate (zero kWh).
    Skipped,
}

impl EmissionSource {
    pub fn is_fallback(self) -> bool {
        matches!(self, EmissionSource::QuotaExhausted | EmissionSource::ApiUnavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyEstimate {
    pub kg: f64,
    pub source: EmissionSource,
    pub warnings: Vec<String>,
}

/// Monthly energy plus weekly commute emissions, the two bars of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintBreakdown {
    pub energy_kg: f64,
    pub commute_kg: f64,
    pub source: EmissionSource,
    pub warnings: Vec<String>,
}

impl FootprintBreakdown {
    pub fn total_kg(&self) -> f64 {
        self.energy_kg + self.commute_kg
    }

    /// (label, kg) pairs in display order.
    pub fn categories(&self) -> [(&'static str, f64); 2] {
        [("Energy", self.energy_kg), ("Commute", self.commute_kg)]
    }
}

pub struct EmissionsEstimator {
    api: Arc<dyn EmissionsApi>,
    usage: Arc<dyn UsageStore>,
    factors: EmissionFactors,
    daily_limit: u32,
    country: String,
}

impl EmissionsEstimator {
    pub fn new(
        api: Arc<dyn EmissionsApi>,
        usage: Arc<dyn UsageStore>,
        factors: EmissionFactors,
        daily_limit: u32,
        country: impl Into<String>,
    ) -> Self {
        Self {
            api,
            usage,
            factors,
            daily_limit,
            country: country.into(),
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn usage(&self) -> &Arc<dyn UsageStore> {
        &self.usage
    }

    /// Energy emissions for `kwh`, from the API while today's quota lasts.
    /// A slot is claimed before the call and given back if the call fails, so
    /// the counter only ever holds successful calls.
    pub async fn estimate_energy(&self, kwh: f64, date: NaiveDate) -> EnergyEstimate {
        if non_negative(kwh) == 0.0 {
            return EnergyEstimate {
                kg: 0.0,
                source: EmissionSource::Skipped,
                warnings: Vec::new(),
            };
        }

        let mut warnings = Vec::new();
        let reserved = match self.usage.try_reserve(date, self.daily_limit).await {
            Ok(Some(count)) => {
                info!(count, limit = self.daily_limit, "Emissions API call reserved");
                true
            }
            Ok(None) => {
                warn!(limit = self.daily_limit, "Emissions API limit reached, using static formula");
                return EnergyEstimate {
                    kg: self.factors.fallback_energy_kg(kwh),
                    source: EmissionSource::QuotaExhausted,
                    warnings: vec![QUOTA_WARNING.to_string()],
                };
            }
            // Unreachable counter: the call goes unmetered.
            Err(e) => {
                warn!("Error reading API usage data from {}: {e:#}", self.usage.name());
                warnings.push(format!("Error reading API usage data: {e:#}"));
                false
            }
        };

        let reason = match self.api.electricity_kg(kwh, &self.country).await {
            Ok(kg) if kg.is_finite() && kg >= 0.0 => {
                return EnergyEstimate {
                    kg,
                    source: EmissionSource::Api,
                    warnings,
                };
            }
            Ok(kg) => {
                warn!(kg, "Emissions API returned an unusable value, using static formula");
                format!("emissions API returned {kg} kg")
            }
            Err(e) => {
                warn!("Error fetching emissions data: {e:#}");
                format!("{e:#}")
            }
        };

        if reserved {
            if let Err(e) = self.usage.release(date).await {
                warn!("Error updating API usage data: {e:#}");
            }
        }
        warnings.push(format!("Error fetching emissions data: {reason}. Using static calculation."));
        EnergyEstimate {
            kg: self.factors.fallback_energy_kg(kwh),
            source: EmissionSource::ApiUnavailable,
            warnings,
        }
    }

    pub async fn breakdown(&self, input: &LifestyleInput, date: NaiveDate) -> FootprintBreakdown {
        let energy = self.estimate_energy(input.energy_kwh, date).await;
        FootprintBreakdown {
            energy_kg: energy.kg,
            commute_kg: self.factors.commute_kg(input.commute_km),
            source: energy.source,
            warnings: energy.warnings,
        }
    }
}
