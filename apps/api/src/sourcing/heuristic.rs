//! Heuristic Scorer — deterministic scoring of a candidate document against
//! the job query, used whenever the LLM path is unavailable or fails.
//!
//! Pure function of (query, candidate) up to a small jitter term that breaks
//! exact ties between otherwise-identical candidates. Scores are clamped to
//! [25, 95] so this path never reads as a certain 0 or 100: these are
//! best-effort estimates for human review.

use std::collections::HashSet;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::models::candidate::{CandidateDocument, ScoredCandidate, ScoringMethod};

const SCORE_FLOOR: i32 = 25;
const SCORE_CEIL: i32 = 95;
const JITTER_SPAN: i32 = 3;

const KEYWORD_WEIGHT: f64 = 0.40;
const TITLE_WEIGHT: f64 = 0.35;
const RICHNESS_WEIGHT: f64 = 0.25;

const MIN_TOKEN_LEN: usize = 3;
const MAX_ORGANIZATIONS: usize = 3;
const MAX_SKILLS: usize = 5;
const MAX_NAME_LEN: usize = 40;
const NAME_PLACEHOLDER: &str = "This candidate";
const GENERIC_SKILLS: &str = "General Match";

/// Generic English filler plus recruiting-generic words that carry no signal
/// about the actual role.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "are", "our", "will", "this", "that", "have", "from",
    "your", "who", "can", "all", "has", "its", "but", "not", "was", "were", "they", "them",
    "their", "what", "when", "where", "how", "out", "into", "over", "more", "than", "about",
    "been", "being", "other", "such", "any", "per", "via", "within",
    "experience", "experienced", "skills", "skill", "role", "roles", "position", "candidate",
    "candidates", "looking", "seeking", "required", "requirements", "requirement", "preferred",
    "years", "year", "ability", "strong", "knowledge", "plus", "must", "join", "work", "working",
    "team", "teams", "company", "opportunity", "responsibilities", "qualifications", "benefits",
    "salary", "apply", "hiring", "job", "jobs", "ideal", "someone",
];

/// Recognized technology, design, and business-tool terms, with canonical
/// display casing. Skill tags come ONLY from this table (or the title role
/// phrases below) so they always reflect the candidate's own text, never the
/// search query.
const SKILL_VOCAB: &[(&str, &str)] = &[
    ("rust", "Rust"),
    ("python", "Python"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("java", "Java"),
    ("golang", "Go"),
    ("kotlin", "Kotlin"),
    ("swift", "Swift"),
    ("ruby", "Ruby"),
    ("php", "PHP"),
    ("scala", "Scala"),
    ("react", "React"),
    ("angular", "Angular"),
    ("vue", "Vue"),
    ("node", "Node.js"),
    ("django", "Django"),
    ("rails", "Rails"),
    ("spring", "Spring"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("gcp", "GCP"),
    ("kubernetes", "Kubernetes"),
    ("docker", "Docker"),
    ("terraform", "Terraform"),
    ("sql", "SQL"),
    ("postgresql", "PostgreSQL"),
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("kafka", "Kafka"),
    ("graphql", "GraphQL"),
    ("grpc", "gRPC"),
    ("linux", "Linux"),
    ("git", "Git"),
    ("machine learning", "Machine Learning"),
    ("deep learning", "Deep Learning"),
    ("data science", "Data Science"),
    ("pytorch", "PyTorch"),
    ("tensorflow", "TensorFlow"),
    ("nlp", "NLP"),
    ("figma", "Figma"),
    ("sketch", "Sketch"),
    ("photoshop", "Photoshop"),
    ("illustrator", "Illustrator"),
    ("wireframing", "Wireframing"),
    ("prototyping", "Prototyping"),
    ("excel", "Excel"),
    ("powerpoint", "PowerPoint"),
    ("tableau", "Tableau"),
    ("salesforce", "Salesforce"),
    ("jira", "Jira"),
    ("confluence", "Confluence"),
    ("hubspot", "HubSpot"),
    ("sap", "SAP"),
    ("agile", "Agile"),
    ("scrum", "Scrum"),
];

/// Role-type phrases matched against the candidate's title only.
const TITLE_ROLE_PHRASES: &[(&str, &str)] = &[
    ("software engineer", "Software Engineering"),
    ("data scientist", "Data Science"),
    ("data engineer", "Data Engineering"),
    ("machine learning engineer", "Machine Learning"),
    ("product manager", "Product Management"),
    ("project manager", "Project Management"),
    ("product designer", "Product Design"),
    ("ux designer", "UX Design"),
    ("frontend", "Frontend Development"),
    ("front-end", "Frontend Development"),
    ("backend", "Backend Development"),
    ("back-end", "Backend Development"),
    ("full stack", "Full-Stack Development"),
    ("full-stack", "Full-Stack Development"),
    ("devops", "DevOps"),
    ("architect", "Architecture"),
    ("analyst", "Analysis"),
    ("recruiter", "Recruiting"),
    ("marketing", "Marketing"),
];

/// Known UI-artifact phrases that the organization extractor must never
/// mistake for an employer (navigation text, platform chrome).
const ORG_BLOCKLIST: &[&str] = &[
    "LinkedIn",
    "Sign In",
    "Sign Up",
    "Join Now",
    "Join To",
    "View Profile",
    "See More",
    "Show More",
    "Learn More",
    "Privacy Policy",
    "Cookie Policy",
    "People Also Viewed",
    "New Jobs",
    "United States",
];

const NAME_SEPARATORS: &[&str] = &[" - ", " – ", " — ", " | ", " · "];

static ORG_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:at|with|from|worked\s+at)\s+([A-Z][\w&.']*(?:\s+[A-Z][\w&.']*){0,2})")
        .expect("org phrase regex")
});

static CAP_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2})\b").expect("capitalized run regex")
});

static YEARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s*\+?\s*(?:years?|yrs)\s*(?:of\s+)?experience")
        .expect("years of experience regex")
});

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Scores one candidate against the job query without any external call.
pub fn score_candidate(query: &str, document: &CandidateDocument) -> ScoredCandidate {
    let tokens = query_tokens(query);
    let title_lower = document.title.to_lowercase();
    let content = document.content.as_deref().unwrap_or("");
    let haystack = format!("{title_lower} {}", content.to_lowercase());

    let keyword_overlap = fraction_present(&tokens, &haystack);
    let title_relevance = fraction_present(&tokens, &title_lower);
    let richness = content_richness(content.chars().count());

    let combined = combine_subscores(keyword_overlap, title_relevance, richness);
    let score = jittered_clamp(combined);

    let signals = extract_signals(document);
    let reason = compose_reason(score, &signals);
    let skills = if signals.skills.is_empty() {
        GENERIC_SKILLS.to_string()
    } else {
        signals.skills.join(", ")
    };

    ScoredCandidate {
        document: document.clone(),
        score: f64::from(score) / 100.0,
        match_percentage: score,
        confidence: confidence_label(score).to_string(),
        skills,
        reason,
        skill_score: score,
        experience_relevance: jittered_clamp(title_relevance),
        public_signal_strength: jittered_clamp(richness),
        method: ScoringMethod::Heuristic,
    }
}

/// Lowercase alphabetic tokens of length >= 3, stopwords removed.
/// Falls back to all alphabetic tokens when filtering leaves nothing.
fn query_tokens(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let all: Vec<&str> = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();

    let filtered = dedup(
        all.iter()
            .copied()
            .filter(|w| w.len() >= MIN_TOKEN_LEN && !STOPWORDS.contains(w)),
    );
    if !filtered.is_empty() {
        return filtered;
    }

    dedup(all.into_iter())
}

fn dedup<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in tokens {
        if seen.insert(token) {
            out.push(token.to_string());
        }
    }
    out
}

/// Fraction of tokens appearing anywhere in the haystack, on a 0-100 scale.
fn fraction_present(tokens: &[String], haystack: &str) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let matched = tokens
        .iter()
        .filter(|t| haystack.contains(t.as_str()))
        .count();
    matched as f64 / tokens.len() as f64 * 100.0
}

/// Step function of content length, 0-100 scale.
fn content_richness(chars: usize) -> f64 {
    if chars >= 1000 {
        90.0
    } else if chars >= 500 {
        70.0
    } else if chars >= 200 {
        50.0
    } else if chars >= 50 {
        35.0
    } else {
        20.0
    }
}

fn combine_subscores(keyword_overlap: f64, title_relevance: f64, richness: f64) -> f64 {
    KEYWORD_WEIGHT * keyword_overlap + TITLE_WEIGHT * title_relevance + RICHNESS_WEIGHT * richness
}

/// Adds the symmetric tie-breaking jitter, then clamps to [25, 95].
fn jittered_clamp(raw: f64) -> u32 {
    let jitter = rand::thread_rng().gen_range(-JITTER_SPAN..=JITTER_SPAN);
    (raw.round() as i32 + jitter).clamp(SCORE_FLOOR, SCORE_CEIL) as u32
}

fn confidence_label(score: u32) -> &'static str {
    if score >= 75 {
        "Strong Match"
    } else if score >= 50 {
        "Good Match"
    } else {
        "Partial Match"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Personalization signals (independent of the score)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ProfileSignals {
    name: String,
    organizations: Vec<String>,
    skills: Vec<String>,
    years: u32,
}

fn extract_signals(document: &CandidateDocument) -> ProfileSignals {
    let content = document.content.as_deref().unwrap_or("");
    ProfileSignals {
        name: display_name(&document.title),
        organizations: extract_organizations(content),
        skills: extract_skills(&document.title, content),
        years: extract_years(content),
    }
}

/// Leading title segment before the first dash/pipe separator, trimmed.
/// Replaced with a generic placeholder when empty or implausibly long.
fn display_name(title: &str) -> String {
    let mut end = title.len();
    for sep in NAME_SEPARATORS {
        if let Some(idx) = title.find(sep) {
            end = end.min(idx);
        }
    }
    let name = title[..end].trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        NAME_PLACEHOLDER.to_string()
    } else {
        name.to_string()
    }
}

/// Up to 3 organization names: "at/with/from/worked at X" phrasing first,
/// then a consecutive-capitalized-words fallback. Blocklisted UI phrases
/// are dropped, matches deduplicated case-insensitively.
fn extract_organizations(content: &str) -> Vec<String> {
    let mut candidates: Vec<String> = ORG_PHRASE_RE
        .captures_iter(content)
        .map(|c| c[1].trim().to_string())
        .collect();

    if candidates.is_empty() {
        candidates = CAP_RUN_RE
            .captures_iter(content)
            .map(|c| c[1].trim().to_string())
            .collect();
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|org| !is_blocklisted(org))
        .filter(|org| seen.insert(org.to_lowercase()))
        .take(MAX_ORGANIZATIONS)
        .collect()
}

fn is_blocklisted(org: &str) -> bool {
    let org_lower = org.to_lowercase();
    ORG_BLOCKLIST
        .iter()
        .any(|blocked| org_lower.contains(&blocked.to_lowercase()))
}

/// Up to 5 distinct skill tags, drawn strictly from the fixed vocabulary
/// (content) and role phrases (title). Raw query words never leak in here.
fn extract_skills(title: &str, content: &str) -> Vec<String> {
    let content_lower = content.to_lowercase();
    let content_tokens: HashSet<&str> = content_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut skills: Vec<String> = Vec::new();

    for (key, canonical) in SKILL_VOCAB {
        if skills.len() == MAX_SKILLS {
            return skills;
        }
        // Single-word keys match whole tokens only, so "java" never fires
        // inside "javascript". Phrases fall back to substring matching.
        let found = if key.contains(' ') {
            content_lower.contains(key)
        } else {
            content_tokens.contains(key)
        };
        if found && !skills.iter().any(|s| s == canonical) {
            skills.push(canonical.to_string());
        }
    }

    let title_lower = title.to_lowercase();
    for (phrase, canonical) in TITLE_ROLE_PHRASES {
        if skills.len() == MAX_SKILLS {
            break;
        }
        if title_lower.contains(phrase) && !skills.iter().any(|s| s == canonical) {
            skills.push(canonical.to_string());
        }
    }

    skills
}

/// Maximum integer preceding a "years/yrs [of] experience" phrase; 0 if none.
fn extract_years(content: &str) -> u32 {
    YEARS_RE
        .captures_iter(content)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// One-sentence reason: score-tier lead clause, optional organization,
/// years, and skill context, closed with a score-tier call to action.
fn compose_reason(score: u32, signals: &ProfileSignals) -> String {
    let mut reason = if score >= 75 {
        format!("{} shows a strong match for this role", signals.name)
    } else if score >= 50 {
        format!("{} shows moderate alignment with this role", signals.name)
    } else {
        format!("{} shows limited overlap with this role", signals.name)
    };

    if !signals.organizations.is_empty() {
        reason.push_str(&format!(
            ", with experience at {}",
            signals.organizations.join(", ")
        ));
    }
    if signals.years > 0 {
        reason.push_str(&format!(" and {}+ years of experience", signals.years));
    }
    if !signals.skills.is_empty() {
        let top: Vec<&str> = signals.skills.iter().take(3).map(String::as_str).collect();
        reason.push_str(&format!(", bringing strengths in {}", top.join(", ")));
    }

    if score >= 85 {
        reason.push_str(". Highly recommended for outreach.");
    } else if score >= 70 {
        reason.push_str(". Worth considering for this search.");
    } else if score >= 50 {
        reason.push_str(". Could be a fit pending further screening.");
    } else {
        reason.push('.');
    }

    reason
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
