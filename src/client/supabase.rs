use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};

use super::models::{ReleaseUsageArgs, ReserveUsageArgs};
use super::{ClientError, build_http_client, check_status, trim_base};
use crate::config::SupabaseConfig;
use crate::footprint::usage::{UsageRecord, UsageStore};

const SERVICE: &str = "Supabase";

/// Usage counter kept in a Supabase table. Reservations go through
/// Postgres functions so the limit check and the bump run in one statement
/// (see `sql/api_usage.sql`).
pub struct SupabaseUsageStore {
    client: Client,
    rest_url: String,
    key: String,
    table: String,
    reserve_fn: String,
    release_fn: String,
}

impl SupabaseUsageStore {
    pub fn new(url: &str, key: &str, config: &SupabaseConfig) -> Result<Self, ClientError> {
        let client = build_http_client(config.timeout_secs).map_err(ClientError::http(SERVICE))?;
        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", trim_base(url)),
            key: key.to_string(),
            table: config.table.clone(),
            reserve_fn: config.reserve_fn.clone(),
            release_fn: config.release_fn.clone(),
        })
    }

    /// `None` when the hosted store is not configured.
    pub fn from_config(config: &SupabaseConfig) -> Result<Option<Self>, ClientError> {
        match config.credentials() {
            Some((url, key)) => Self::new(url, key, config).map(Some),
            None => Ok(None),
        }
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.key).bearer_auth(&self.key)
    }

    pub async fn record(&self, date: NaiveDate) -> Result<Option<UsageRecord>, ClientError> {
        let url = format!(
            "{}/{}?select=date,count&date=eq.{}",
            self.rest_url,
            self.table,
            date.format("%Y-%m-%d")
        );

        let res = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(ClientError::http(SERVICE))?;

        let records: Vec<UsageRecord> = check_status(SERVICE, res)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Malformed {
                service: SERVICE,
                message: e.to_string(),
            })?;

        Ok(records.into_iter().next())
    }
}

#[async_trait]
impl UsageStore for SupabaseUsageStore {
    async fn today_count(&self, date: NaiveDate) -> Result<u32> {
        let record = self.record(date).await.context("reading api usage")?;
        Ok(record.map(|r| r.count).unwrap_or(0))
    }

    async fn try_reserve(&self, date: NaiveDate, limit: u32) -> Result<Option<u32>> {
        let url = format!("{}/rpc/{}", self.rest_url, self.reserve_fn);

        let res = self
            .authorize(self.client.post(&url))
            .json(&ReserveUsageArgs { usage_date: date, max_count: limit })
            .send()
            .await
            .map_err(ClientError::http(SERVICE))?;

        let count: Option<u32> = check_status(SERVICE, res)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Malformed {
                service: SERVICE,
                message: e.to_string(),
            })
            .context("reserving api usage")?;

        Ok(count)
    }

    async fn release(&self, date: NaiveDate) -> Result<()> {
        let url = format!("{}/rpc/{}", self.rest_url, self.release_fn);

        let res = self
            .authorize(self.client.post(&url))
            .json(&ReleaseUsageArgs { usage_date: date })
            .send()
            .await
            .map_err(ClientError::http(SERVICE))?;

        check_status(SERVICE, res).await.context("releasing api usage")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
