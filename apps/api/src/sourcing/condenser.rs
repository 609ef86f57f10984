//! Query Condenser — shrinks an over-long job description into a short search query.
//!
//! The common case is a description already under the budget, returned
//! unchanged. Over-budget descriptions go through an LLM keyword extraction;
//! any failure degrades to plain truncation. The contract is absolute: the
//! result is never empty and never exceeds `CONDENSE_BUDGET` characters.

use tracing::warn;

use crate::llm_client::TextGenerator;
use crate::sourcing::prompts::CONDENSE_PROMPT_TEMPLATE;

/// Character budget for the condensed search query.
pub const CONDENSE_BUDGET: usize = 250;

/// Condenses a job description to at most `CONDENSE_BUDGET` characters.
pub async fn condense_query(description: &str, llm: &dyn TextGenerator) -> String {
    if description.chars().count() <= CONDENSE_BUDGET {
        return description.to_string();
    }

    let prompt = CONDENSE_PROMPT_TEMPLATE.replace("{description}", description);

    match llm.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => truncate_chars(text.trim(), CONDENSE_BUDGET),
        Ok(_) => {
            warn!("Condenser LLM returned empty output, truncating description");
            truncate_chars(description, CONDENSE_BUDGET)
        }
        Err(e) => {
            warn!("Condenser LLM call failed, truncating description: {e}");
            truncate_chars(description, CONDENSE_BUDGET)
        }
    }
}

/// Truncates to a character (not byte) budget, so multi-byte text stays valid.
fn truncate_chars(text: &str, budget: usize) -> String {
    text.chars().take(budget).collect()
}
