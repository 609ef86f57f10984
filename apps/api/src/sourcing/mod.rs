// Candidate sourcing pipeline.
// Implements: query condensation, candidate search + filtering, LLM batch
// scoring with heuristic fallback, report generation, orchestration.
// All LLM calls go through llm_client — no direct Gemini calls here.

pub mod condenser;
pub mod handlers;
pub mod heuristic;
pub mod llm_scorer;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod search_adapter;
