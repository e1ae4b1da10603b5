use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::models::{ElectricityEstimateRequest, EstimateResponse};
use super::{ClientError, build_http_client, check_status, trim_base};
use crate::config::CarbonConfig;
use crate::footprint::emissions::EmissionsApi;

const SERVICE: &str = "Carbon Interface";

/// Client for the Carbon Interface estimates API.
pub struct CarbonInterfaceClient {
    client: Client,
    api_key: String,
    pub base_url: String,
}

impl CarbonInterfaceClient {
    pub fn new(config: &CarbonConfig) -> Result<Self, ClientError> {
        let client = build_http_client(config.timeout_secs).map_err(ClientError::http(SERVICE))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: trim_base(&config.base_url),
        })
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Electricity estimate in metric tonnes of CO2.
    pub async fn estimate_carbon_mt(&self, kwh: f64, country: &str) -> Result<f64, ClientError> {
        if !self.has_key() {
            return Err(ClientError::MissingKey("CARBON_API_KEY"));
        }

        let url = format!("{}/estimates", self.base_url);
        let country = country.to_ascii_lowercase();
        let request = ElectricityEstimateRequest::kwh(kwh, &country);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::http(SERVICE))?;

        let response: EstimateResponse = check_status(SERVICE, res)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Malformed {
                service: SERVICE,
                message: e.to_string(),
            })?;

        Ok(response.data.attributes.carbon_mt)
    }

    /// Reachability check used by `doctor`.
    pub async fn ping(&self) -> Result<(), ClientError> {
        let url = format!("{}/auth", self.base_url);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(ClientError::http(SERVICE))?;
        check_status(SERVICE, res).await.map(|_| ())
    }
}

#[async_trait]
impl EmissionsApi for CarbonInterfaceClient {
    async fn electricity_kg(&self, kwh: f64, country: &str) -> Result<f64> {
        let carbon_mt = self.estimate_carbon_mt(kwh, country).await?;
        Ok(carbon_mt * 1000.0)
    }
}
