// All LLM prompt constants for the sourcing pipeline.
// Each template documents its placeholders; fill with `.replace()` before sending.

/// Query condensation prompt. Replace `{description}` before sending.
/// Output is re-checked against the character budget after the call; the
/// instruction alone is not trusted.
pub const CONDENSE_PROMPT_TEMPLATE: &str = r#"Extract the most important search keywords from the following job description.

Return a short comma-separated list of keywords only: the role title, key skills, and seniority.
Keep it under 200 characters. Do NOT include explanations, markdown, or any text besides the keyword list.

JOB DESCRIPTION:
{description}"#;

/// Batch candidate scoring prompt.
/// Replace: {query}, {candidates_json}
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are an expert recruiter. I will provide a job query and a list of candidates found by a web search.
Your task is to evaluate how well each candidate matches the query.

Query: {query}

Candidates:
{candidates_json}

For each candidate, provide:
1. A match score (0-100)
2. A brief 1-sentence reason.
3. A confidence level: exactly one of "High", "Medium", "Low".
4. Top 3 matched skills found in the candidate's snippet.

Return a JSON list of objects with keys: "url", "score", "reason", "confidence", "skills".
Return ONLY valid JSON. Do NOT use markdown code fences. Do NOT include any text outside the JSON array."#;

/// Analysis report prompt.
/// Replace: {job_description}, {candidates_json}
pub const REPORT_PROMPT_TEMPLATE: &str = r#"Job Description: {job_description}

Ranked Candidates (by relevance score):
{candidates_json}

Please provide a professional recruitment analysis report that:
1. RANKS the candidates from best to worst match
2. Shows each candidate's match percentage/score
3. Highlights key qualifications and experience
4. Identifies any skill gaps or concerns
5. Provides clear recommendations for next steps
6. Uses professional recruitment terminology

Format as:
# RECRUITMENT ANALYSIS REPORT

## Job Requirements Summary
[Brief summary of requirements]

## Ranked Candidate Matches
1. [Candidate Name] - [Match Score]% - [Key Qualifications]
2. [Candidate Name] - [Match Score]% - [Key Qualifications]
...

## Detailed Analysis
[Detailed breakdown of top 3 candidates]

## Recommendations
[Actionable next steps for the recruitment team]"#;
