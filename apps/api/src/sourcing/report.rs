//! Report Generator — narrative analysis of the scored candidates.
//!
//! Preferred path asks the LLM for a structured report; any failure drops to
//! a deterministic template over the same ranked list, so the caller always
//! receives a real report and never an apology string dressed up as one.

use std::cmp::Ordering;

use serde_json::json;
use tracing::warn;

use crate::llm_client::TextGenerator;
use crate::models::candidate::ScoredCandidate;
use crate::sourcing::prompts::REPORT_PROMPT_TEMPLATE;

/// How many candidates the report covers.
const REPORT_TOP_N: usize = 10;

/// Generates the analysis report for the scored candidate set.
pub async fn generate_report(
    llm: &dyn TextGenerator,
    job_description: &str,
    candidates: &[ScoredCandidate],
) -> String {
    let top = top_ranked(candidates);
    let prompt = build_report_prompt(job_description, &top);

    match llm.generate(&prompt).await {
        Ok(report) if !report.trim().is_empty() => report.trim().to_string(),
        Ok(_) => {
            warn!("Report LLM returned empty output, using template report");
            fallback_report(&top)
        }
        Err(e) => {
            warn!("Report LLM call failed, using template report: {e}");
            fallback_report(&top)
        }
    }
}

/// Top candidates by score, descending. Stable, so equal scores keep their
/// pipeline order.
fn top_ranked(candidates: &[ScoredCandidate]) -> Vec<&ScoredCandidate> {
    let mut ranked: Vec<&ScoredCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(REPORT_TOP_N);
    ranked
}

fn build_report_prompt(job_description: &str, top: &[&ScoredCandidate]) -> String {
    let entries: Vec<serde_json::Value> = top
        .iter()
        .map(|c| {
            json!({
                "title": c.document.title,
                "url": c.document.url,
                "match_percentage": c.match_percentage,
                "confidence": c.confidence,
                "skills": c.skills,
                "reason": c.reason,
            })
        })
        .collect();
    let candidates_json =
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string());

    REPORT_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{candidates_json}", &candidates_json)
}

/// Deterministic template report over the ranked list. Same section
/// structure as the narrative version, just without prose analysis.
fn fallback_report(top: &[&ScoredCandidate]) -> String {
    let mut report = String::from("# RECRUITMENT ANALYSIS REPORT\n\n## Ranked Candidate Matches\n");

    for (rank, candidate) in top.iter().enumerate() {
        report.push_str(&format!(
            "{}. {} - {}% match ({})\n   {}\n",
            rank + 1,
            candidate.document.title,
            candidate.match_percentage,
            candidate.confidence,
            candidate.document.url,
        ));
    }

    report.push_str(
        "\n## Recommendations\n\
         - Reach out to the top-ranked candidates first; they show the strongest alignment with the role.\n\
         - Review each profile directly to verify current position and availability.\n\
         - Consider refining the job description and rerunning the search if match scores are low.\n",
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::llm_client::LlmError;
    use crate::models::candidate::{CandidateDocument, ScoringMethod};

    fn scored(url: &str, percentage: u32) -> ScoredCandidate {
        ScoredCandidate {
            document: CandidateDocument {
                title: format!("Candidate {percentage}"),
                url: url.to_string(),
                content: None,
                image: None,
            },
            score: f64::from(percentage) / 100.0,
            match_percentage: percentage,
            confidence: "Good Match".to_string(),
            skills: "Rust".to_string(),
            reason: "Relevant background.".to_string(),
            skill_score: percentage,
            experience_relevance: percentage,
            public_signal_strength: percentage,
            method: ScoringMethod::Heuristic,
        }
    }

    struct FixedLlm(String);

    #[async_trait]
    impl TextGenerator for FixedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl TextGenerator for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 429,
                message: "quota".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_llm_report_used_when_available() {
        let candidates = vec![scored("https://linkedin.com/in/a", 80)];
        let report = generate_report(
            &FixedLlm("# RECRUITMENT ANALYSIS REPORT\n\nNarrative.".to_string()),
            "rust engineer",
            &candidates,
        )
        .await;
        assert!(report.contains("Narrative."));
    }

    #[tokio::test]
    async fn test_fallback_report_on_llm_failure() {
        let candidates = vec![
            scored("https://linkedin.com/in/a", 80),
            scored("https://linkedin.com/in/b", 60),
        ];
        let report = generate_report(&FailingLlm, "rust engineer", &candidates).await;

        assert!(report.starts_with("# RECRUITMENT ANALYSIS REPORT"));
        assert!(report.contains("1. Candidate 80 - 80% match"));
        assert!(report.contains("2. Candidate 60 - 60% match"));
        assert!(report.contains("https://linkedin.com/in/a"));
        assert!(report.contains("## Recommendations"));
        assert_eq!(report.matches("\n- ").count(), 3);
    }

    #[tokio::test]
    async fn test_empty_llm_output_falls_back() {
        let candidates = vec![scored("https://linkedin.com/in/a", 70)];
        let report = generate_report(&FixedLlm("  \n ".to_string()), "q", &candidates).await;
        assert!(report.contains("Ranked Candidate Matches"));
    }

    #[test]
    fn test_top_ranked_sorts_descending_and_caps_at_ten() {
        let candidates: Vec<ScoredCandidate> = (0..15)
            .map(|i| scored(&format!("https://linkedin.com/in/{i}"), 30 + i * 4))
            .collect();

        let top = top_ranked(&candidates);
        assert_eq!(top.len(), REPORT_TOP_N);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        // Highest score (30 + 14*4 = 86) leads
        assert_eq!(top[0].match_percentage, 86);
    }

    #[test]
    fn test_report_prompt_embeds_description_and_candidates() {
        let candidates = vec![scored("https://linkedin.com/in/a", 75)];
        let top = top_ranked(&candidates);
        let prompt = build_report_prompt("senior rust role", &top);
        assert!(prompt.contains("senior rust role"));
        assert!(prompt.contains("https://linkedin.com/in/a"));
        assert!(prompt.contains("RECRUITMENT ANALYSIS REPORT"));
    }
}
