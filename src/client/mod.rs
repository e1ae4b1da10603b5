pub mod carbon;
pub mod cohere;
pub mod models;
pub mod supabase;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0} is not configured")]
    MissingKey(&'static str),

    #[error("request to {service} failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response from {service}: {message}")]
    Malformed { service: &'static str, message: String },
}

impl ClientError {
    pub fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ClientError::Http { service, source }
    }
}

/// JSON client with a request timeout. Auth headers are added per request.
pub fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
}

/// Turns a non-2xx response into `ClientError::Status`, keeping a bounded
/// slice of the body for the log.
pub(crate) async fn check_status(service: &'static str, res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service,
        status,
        body: body.chars().take(300).collect(),
    })
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
