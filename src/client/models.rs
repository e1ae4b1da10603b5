use serde::{Deserialize, Serialize};

// --- Carbon Interface ---

#[derive(Debug, Clone, Serialize)]
pub struct ElectricityEstimateRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub electricity_unit: &'static str,
    pub electricity_value: f64,
    pub country: &'a str,
}

impl<'a> ElectricityEstimateRequest<'a> {
    pub fn kwh(value: f64, country: &'a str) -> Self {
        Self {
            kind: "electricity",
            electricity_unit: "kwh",
            electricity_value: value,
            country,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateResponse {
    pub data: EstimateData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateData {
    #[allow(dead_code)]
    pub id: Option<String>,
    pub attributes: EstimateAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateAttributes {
    pub carbon_mt: f64,
}

// --- Cohere chat (v2) ---

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[allow(dead_code)]
    pub id: Option<String>,
    pub finish_reason: Option<String>,
    pub message: Option<AssistantMessage>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    pub billed_units: Option<BilledUnits>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BilledUnits {
    pub input_tokens: Option<f64>,
    pub output_tokens: Option<f64>,
}

impl ChatResponse {
    /// Concatenated text blocks of the reply.
    pub fn text(&self) -> String {
        self.message
            .iter()
            .flat_map(|m| m.content.iter())
            .filter(|item| item.kind == "text")
            .filter_map(|item| item.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn billed_tokens(&self) -> (u32, u32) {
        let units = self.usage.as_ref().and_then(|u| u.billed_units.as_ref());
        let input = units.and_then(|b| b.input_tokens).unwrap_or(0.0);
        let output = units.and_then(|b| b.output_tokens).unwrap_or(0.0);
        (input.max(0.0) as u32, output.max(0.0) as u32)
    }
}

// --- Supabase (PostgREST) ---

#[derive(Debug, Clone, Serialize)]
pub struct ReserveUsageArgs {
    pub usage_date: chrono::NaiveDate,
    pub max_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseUsageArgs {
    pub usage_date: chrono::NaiveDate,
}
