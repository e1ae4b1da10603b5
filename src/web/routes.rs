use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::info;

use super::error::AppError;
use super::views::{self, FormValues};
use crate::footprint::input::LifestyleInput;
use crate::footprint::usage::today;
use crate::report::{Report, ReportService};

pub struct AppState {
    pub service: ReportService,
}

#[derive(Debug, Serialize)]
pub struct UsageSummary {
    pub date: chrono::NaiveDate,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub store: &'static str,
}

pub async fn index_handler() -> Html<String> {
    Html(views::form_page(&FormValues::default(), None))
}

pub async fn report_page_handler(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let input = match LifestyleInput::from_form_pairs(&pairs) {
        Ok(input) => input,
        Err(e) => {
            info!("Rejected form submission: {e}");
            let page = views::form_page(&FormValues::from_pairs(&pairs), Some(&e.to_string()));
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        }
    };

    let report = state.service.generate(input).await?;
    Ok(Html(views::result_page(&report)).into_response())
}

pub async fn report_api_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LifestyleInput>, JsonRejection>,
) -> Result<Json<Report>, AppError> {
    let Json(input) = body?;
    let input = input.validate()?;
    let report = state.service.generate(input).await?;
    Ok(Json(report))
}

pub async fn usage_handler(State(state): State<Arc<AppState>>) -> Result<Json<UsageSummary>, AppError> {
    let estimator = state.service.estimator();
    let date = today();
    let count = estimator.usage().today_count(date).await?;
    let limit = estimator.daily_limit();

    Ok(Json(UsageSummary {
        date,
        count,
        limit,
        remaining: limit.saturating_sub(count),
        store: estimator.usage().name(),
    }))
}

pub async fn health_handler() -> &'static str {
    "ok"
}
