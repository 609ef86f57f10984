//! Orchestrator — the strict sequential pipeline behind the analyze
//! operation: condense, search, score, report. No internal concurrency;
//! each request is one linear pass over local values.

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::llm_client::TextGenerator;
use crate::models::candidate::ScoredCandidate;
use crate::search::{CandidateSearch, SearchError};
use crate::sourcing::{condenser, heuristic, llm_scorer, report, search_adapter};

/// Returned verbatim when the search yields no profile matches. Scoring and
/// report generation are skipped entirely in that case.
pub const NO_CANDIDATES_REPORT: &str =
    "No candidate profiles were found for this job description. Try broadening the role \
     requirements or removing niche constraints, then run the analysis again.";

/// Everything the analyze operation produces for one request.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub candidates: Vec<ScoredCandidate>,
    pub report: String,
}

/// Runs the full analysis pipeline for one job description. The returned
/// candidates are ordered by score descending.
///
/// Only search failures surface as errors. LLM failures never do: scoring
/// falls back to the heuristic path per candidate and the report falls back
/// to its deterministic template.
pub async fn run_analysis(
    search: &dyn CandidateSearch,
    llm: &dyn TextGenerator,
    description: &str,
) -> Result<AnalysisOutcome, SearchError> {
    let condensed = condenser::condense_query(description, llm).await;
    info!("Condensed query to {} chars", condensed.chars().count());

    let documents = search_adapter::search_candidates(search, &condensed, description).await?;

    if documents.is_empty() {
        info!("No candidate profiles found, skipping scoring and report");
        return Ok(AnalysisOutcome {
            candidates: Vec::new(),
            report: NO_CANDIDATES_REPORT.to_string(),
        });
    }

    let mut candidates = match llm_scorer::score_with_llm(llm, description, &documents).await {
        Ok(scored) => scored,
        Err(e) => {
            warn!("LLM scoring failed, scoring heuristically: {e}");
            documents
                .iter()
                .map(|document| heuristic::score_candidate(description, document))
                .collect()
        }
    };

    // Rank best-first; stable, so equal scores keep provider order
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let report = report::generate_report(llm, description, &candidates).await;

    Ok(AnalysisOutcome { candidates, report })
}
