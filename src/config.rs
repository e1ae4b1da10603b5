use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub language: String,
    pub server: ServerConfig,
    pub carbon: CarbonConfig,
    pub factors: FactorsConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CarbonConfig {
    pub api_key: String,
    pub base_url: String,
    pub country: String,
    /// Successful API estimates allowed per UTC day before the fallback formula kicks in.
    pub daily_limit: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FactorsConfig {
    pub fallback_kg_per_kwh: f64,
    pub commute_kg_per_km: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub prompt_template_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub key: Option<String>,
    #[serde(default = "default_usage_table")]
    pub table: String,
    #[serde(default = "default_reserve_fn")]
    pub reserve_fn: String,
    #[serde(default = "default_release_fn")]
    pub release_fn: String,
    #[serde(default = "default_supabase_timeout")]
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            table: default_usage_table(),
            reserve_fn: default_reserve_fn(),
            release_fn: default_release_fn(),
            timeout_secs: default_supabase_timeout(),
        }
    }
}

fn default_usage_table() -> String {
    "api_usage".to_string()
}

fn default_reserve_fn() -> String {
    "reserve_api_usage".to_string()
}

fn default_release_fn() -> String {
    "release_api_usage".to_string()
}

fn default_supabase_timeout() -> u64 {
    15
}

impl SupabaseConfig {
    /// Both url and key present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.url.as_deref(), self.key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let config = Self::defaults()?
            .add_source(File::with_name("greenme").required(false))
            .add_source(
                Environment::with_prefix("GREENME")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Self::from_config(config, |name| env::var(name).ok())
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("language", "en")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8501)?
            .set_default("carbon.api_key", "")?
            .set_default("carbon.base_url", "https://www.carboninterface.com/api/v1")?
            .set_default("carbon.country", "US")?
            .set_default("carbon.daily_limit", 3)?
            .set_default("carbon.timeout_secs", 30)?
            .set_default("factors.fallback_kg_per_kwh", 0.5)?
            .set_default("factors.commute_kg_per_km", 0.12)?
            .set_default("llm.api_key", "")?
            .set_default("llm.base_url", "https://api.cohere.com/v2")?
            .set_default("llm.model", "command-r-plus")?
            .set_default("llm.temperature", 0.75)?
            .set_default("llm.max_tokens", 1024)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("llm.prompt_template_path", None::<String>)
    }

    fn from_config(config: Config, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings: Settings = config.try_deserialize()?;
        settings.apply_plain_env(lookup);
        settings.validate()?;
        Ok(settings)
    }

    /// The plain variable names are what existing deployments export.
    fn apply_plain_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.carbon.api_key.is_empty() {
            if let Some(key) = lookup("CARBON_API_KEY") {
                self.carbon.api_key = key;
            }
        }
        if self.llm.api_key.is_empty() {
            if let Some(key) = lookup("COHERE_API_KEY").or_else(|| lookup("CO_API_KEY")) {
                self.llm.api_key = key;
            }
        }
        if self.supabase.url.is_none() {
            self.supabase.url = lookup("SUPABASE_URL");
        }
        if self.supabase.key.is_none() {
            self.supabase.key = lookup("SUPABASE_KEY");
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let factors = [
            ("factors.fallback_kg_per_kwh", self.factors.fallback_kg_per_kwh),
            ("factors.commute_kg_per_km", self.factors.commute_kg_per_km),
        ];
        for (key, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "{key} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
