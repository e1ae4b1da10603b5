use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::models::{ChatMessage, ChatRequest, ChatResponse};
use super::{ClientError, build_http_client, check_status, trim_base};
use crate::config::LlmConfig;
use crate::report::{Completion, TipGenerator};

const SERVICE: &str = "Cohere";

pub struct CohereClient {
    client: Client,
    api_key: String,
    pub base_url: String,
    pub model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CohereClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ClientError> {
        let client = build_http_client(config.timeout_secs).map_err(ClientError::http(SERVICE))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: trim_base(&config.base_url),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub async fn chat(&self, prompt: &str) -> Result<ChatResponse, ClientError> {
        if !self.has_key() {
            return Err(ClientError::MissingKey("COHERE_API_KEY"));
        }

        let url = format!("{}/chat", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::http(SERVICE))?;

        check_status(SERVICE, res)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Malformed {
                service: SERVICE,
                message: e.to_string(),
            })
    }

    /// Lists models; succeeds only with a valid key.
    pub async fn ping(&self) -> Result<(), ClientError> {
        let url = format!("{}/models?page_size=1", self.base_url.replace("/v2", "/v1"));
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
impl TipGenerator for CohereClient {
    async fn generate(&self, prompt: &str) -> Result<Completion> {
        let response = self.chat(prompt).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ClientError::Malformed {
                service: SERVICE,
                message: format!(
                    "empty reply (finish reason {})",
                    response.finish_reason.as_deref().unwrap_or("unknown")
                ),
            }
            .into());
        }

        let (input_tokens, output_tokens) = response.billed_tokens();
        debug!(input_tokens, output_tokens, "Cohere reply received");

        Ok(Completion {
            text: text.trim().to_string(),
            input_tokens,
            output_tokens,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            api_key: "co-key".to_string(),
            base_url,
            model: "command-r".to_string(),
            temperature: 0.3,
            max_tokens: 256,
            timeout_secs: 5,
            prompt_template_path: None,
        }
    }

    async fn chat(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["model"], "command-r");
        assert_eq!(body["max_tokens"], 256);
        let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
        Json(json!({
            "id": "gen-1",
            "finish_reason": "COMPLETE",
            "message": {
                "role": "assistant",
                "content": [{ "type": "text", "text": format!("  Tips for: {prompt}\n") }]
            },
            "usage": { "billed_units": { "input_tokens": 12, "output_tokens": 34 } }
        }))
    }

    async fn empty_chat() -> Json<Value> {
        Json(json!({ "finish_reason": "MAX_TOKENS", "message": { "content": [] } }))
    }

    #[tokio::test]
    async fn test_generate_returns_text_and_usage() {
        let base = stub::serve(Router::new().route("/chat", post(chat))).await;
        let client = CohereClient::new(&config(base)).unwrap();

        let completion = client.generate("save energy").await.unwrap();

        assert_eq!(completion.text, "Tips for: save energy");
        assert_eq!((completion.input_tokens, completion.output_tokens), (12, 34));
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let base = stub::serve(Router::new().route("/chat", post(empty_chat))).await;
        let client = CohereClient::new(&config(base)).unwrap();

        let err = client.generate("anything").await.unwrap_err();

        assert!(err.to_string().contains("MAX_TOKENS"));
    }
}
