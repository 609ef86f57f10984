//! Candidate data models shared across the sourcing pipeline.

use serde::{Deserialize, Serialize};

/// One retrieved search result that passed the profile-URL filter.
/// Uniquely keyed by `url` within a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDocument {
    pub title: String,
    pub url: String,
    pub content: Option<String>,
    pub image: Option<String>,
}

/// Which scorer produced a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Llm,
    Heuristic,
}

/// A candidate document augmented with scoring output.
/// Created once per request by whichever scorer ran; immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub document: CandidateDocument,
    /// Normalized score, 0.0 to 1.0. Always `match_percentage / 100`.
    pub score: f64,
    pub match_percentage: u32,
    /// Closed label set: High/Medium/Low (LLM path) or
    /// Strong Match/Good Match/Partial Match (heuristic path).
    pub confidence: String,
    /// Comma-joined skill summary, or "General Match" when nothing was found.
    pub skills: String,
    pub reason: String,
    pub skill_score: u32,
    pub experience_relevance: u32,
    pub public_signal_strength: u32,
    pub method: ScoringMethod,
}

/// The candidate record shape returned to API callers.
/// All numeric fields are display strings: this is a presentation payload,
/// not an internal computation type.
#[derive(Debug, Clone, Serialize)]
pub struct CandidatePayload {
    pub title: String,
    pub url: String,
    pub skills: String,
    pub confidence: String,
    pub skill_score: String,
    pub exp_relevance: String,
    pub signal_strength: String,
    pub match_percentage: String,
    pub reason: String,
    pub image: String,
}

impl From<&ScoredCandidate> for CandidatePayload {
    fn from(scored: &ScoredCandidate) -> Self {
        CandidatePayload {
            title: scored.document.title.clone(),
            url: scored.document.url.clone(),
            skills: scored.skills.clone(),
            confidence: scored.confidence.clone(),
            skill_score: scored.skill_score.to_string(),
            exp_relevance: scored.experience_relevance.to_string(),
            signal_strength: scored.public_signal_strength.to_string(),
            match_percentage: scored.match_percentage.to_string(),
            reason: scored.reason.clone(),
            image: scored.document.image.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scored() -> ScoredCandidate {
        ScoredCandidate {
            document: CandidateDocument {
                title: "Jane Doe - Senior Engineer".to_string(),
                url: "https://linkedin.com/in/janedoe".to_string(),
                content: Some("10 years of experience with Rust".to_string()),
                image: None,
            },
            score: 0.82,
            match_percentage: 82,
            confidence: "High".to_string(),
            skills: "Rust, Kubernetes".to_string(),
            reason: "Strong overlap with the role requirements.".to_string(),
            skill_score: 82,
            experience_relevance: 78,
            public_signal_strength: 70,
            method: ScoringMethod::Llm,
        }
    }

    #[test]
    fn test_payload_renders_numbers_as_strings() {
        let payload = CandidatePayload::from(&make_scored());
        assert_eq!(payload.match_percentage, "82");
        assert_eq!(payload.skill_score, "82");
        assert_eq!(payload.exp_relevance, "78");
        assert_eq!(payload.signal_strength, "70");
    }

    #[test]
    fn test_payload_missing_image_becomes_empty_string() {
        let payload = CandidatePayload::from(&make_scored());
        assert_eq!(payload.image, "");
    }

    #[test]
    fn test_scoring_method_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ScoringMethod::Heuristic).unwrap(),
            "\"heuristic\""
        );
        assert_eq!(serde_json::to_string(&ScoringMethod::Llm).unwrap(), "\"llm\"");
    }
}
