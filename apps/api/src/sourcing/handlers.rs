use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::candidate::CandidatePayload;
use crate::sourcing::pipeline;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub candidates: Vec<CandidatePayload>,
    pub analysis_report: String,
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let description = req.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation(
            "Job description must not be empty".to_string(),
        ));
    }

    info!("Analyze request: {} chars", description.chars().count());

    let outcome = pipeline::run_analysis(state.search.as_ref(), state.llm.as_ref(), description)
        .await
        .map_err(|e| AppError::Search(e.to_string()))?;

    let candidates = outcome
        .candidates
        .iter()
        .map(CandidatePayload::from)
        .collect();

    Ok(Json(AnalyzeResponse {
        candidates,
        analysis_report: outcome.report,
    }))
}
