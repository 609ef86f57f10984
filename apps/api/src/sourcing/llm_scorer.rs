//! LLM Scorer — one batched scoring call for the whole candidate set, plus
//! the URL-keyed reconciliation that joins the model's answers back onto the
//! input candidates.
//!
//! This is a single best-effort batch call with no per-candidate retry: any
//! failure surfaces to the orchestrator, which falls back to the heuristic
//! scorer. Reconciliation is a pure function so the join semantics are
//! testable without a model.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::llm_client::{strip_json_fences, LlmError, TextGenerator};
use crate::models::candidate::{CandidateDocument, ScoredCandidate, ScoringMethod};
use crate::sourcing::prompts::SCORING_PROMPT_TEMPLATE;

/// Substituted when the model skipped a candidate or left a field blank.
const DEFAULT_REASON: &str = "Analysis pending";
const DEFAULT_CONFIDENCE: &str = "Low";
const GENERIC_SKILLS: &str = "General Match";

/// Per-candidate snippet cap inside the batch prompt, characters.
const SNIPPET_CHAR_CAP: usize = 500;

/// Scores all candidates in one batched LLM call.
///
/// Every input candidate appears in the output exactly once, in input order.
/// Candidates the model did not score get the documented defaults; URLs the
/// model invented are dropped.
pub async fn score_with_llm(
    llm: &dyn TextGenerator,
    query: &str,
    documents: &[CandidateDocument],
) -> Result<Vec<ScoredCandidate>, LlmError> {
    let prompt = build_scoring_prompt(query, documents);
    let raw = llm.generate(&prompt).await?;
    let entries: Vec<ScoredEntry> = serde_json::from_str(strip_json_fences(&raw))?;
    info!(
        "LLM scored {} of {} candidates",
        entries.len(),
        documents.len()
    );
    Ok(reconcile(documents, entries))
}

/// One element of the model's JSON array answer. Every field except `url`
/// is optional: partial answers degrade to defaults instead of failing the
/// whole batch.
#[derive(Debug, Deserialize)]
struct ScoredEntry {
    url: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default, deserialize_with = "skills_as_list")]
    skills: Vec<String>,
}

/// Accepts `"a, b"` or `["a", "b"]`; models alternate between the two
/// despite the prompt asking for a list.
fn skills_as_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    match Option::<StringOrList>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(StringOrList::One(joined)) => Ok(joined
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()),
        Some(StringOrList::Many(list)) => Ok(list),
    }
}

fn build_scoring_prompt(query: &str, documents: &[CandidateDocument]) -> String {
    let entries: Vec<serde_json::Value> = documents
        .iter()
        .map(|d| {
            json!({
                "title": d.title,
                "url": d.url,
                "snippet": snippet(d),
            })
        })
        .collect();
    let candidates_json =
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string());

    SCORING_PROMPT_TEMPLATE
        .replace("{query}", query)
        .replace("{candidates_json}", &candidates_json)
}

fn snippet(document: &CandidateDocument) -> String {
    document
        .content
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(SNIPPET_CHAR_CAP)
        .collect()
}

/// Left-joins the model's entries onto the input candidates by URL.
///
/// Input order is preserved. Scores are clamped to 0-100 and normalized to
/// a 0.0-1.0 fraction alongside the integer percentage.
fn reconcile(documents: &[CandidateDocument], entries: Vec<ScoredEntry>) -> Vec<ScoredCandidate> {
    let mut by_url: HashMap<String, ScoredEntry> = entries
        .into_iter()
        .map(|entry| (entry.url.clone(), entry))
        .collect();

    documents
        .iter()
        .map(|document| match by_url.remove(&document.url) {
            Some(entry) => scored_from_entry(document, entry),
            None => scored_default(document),
        })
        .collect()
}

fn scored_from_entry(document: &CandidateDocument, entry: ScoredEntry) -> ScoredCandidate {
    let percentage = entry.score.clamp(0.0, 100.0).round() as u32;
    let skills: Vec<String> = entry
        .skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    ScoredCandidate {
        document: document.clone(),
        score: f64::from(percentage) / 100.0,
        match_percentage: percentage,
        confidence: entry
            .confidence
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string()),
        skills: if skills.is_empty() {
            GENERIC_SKILLS.to_string()
        } else {
            skills.join(", ")
        },
        reason: entry
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REASON.to_string()),
        skill_score: percentage,
        experience_relevance: percentage,
        public_signal_strength: percentage,
        method: ScoringMethod::Llm,
    }
}

fn scored_default(document: &CandidateDocument) -> ScoredCandidate {
    ScoredCandidate {
        document: document.clone(),
        score: 0.0,
        match_percentage: 0,
        confidence: DEFAULT_CONFIDENCE.to_string(),
        skills: GENERIC_SKILLS.to_string(),
        reason: DEFAULT_REASON.to_string(),
        skill_score: 0,
        experience_relevance: 0,
        public_signal_strength: 0,
        method: ScoringMethod::Llm,
    }
}
