//! `**Heading**:` outline parsing for the analysis intent.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Analysis;

const PLACEMENT: &str = "Placement";
const CORE_WOUNDED_THEMES: &str = "Core Wounded Themes";
const SUMMARY_OVERVIEW: &str = "Summary Overview";
const WOUNDED_KEYWORDS: &str = "Wounded Keywords";
const HEALING_KEYWORDS: &str = "Healing Keywords";
const PRIMARY_CHALLENGES: &str = "Primary Challenges";
const PATH_TO_HEALING: &str = "Path to Healing";

/// Headings the analysis template asks the model to emit
pub const ANALYSIS_HEADINGS: &[&str] = &[
    PLACEMENT,
    CORE_WOUNDED_THEMES,
    SUMMARY_OVERVIEW,
    WOUNDED_KEYWORDS,
    HEALING_KEYWORDS,
    PRIMARY_CHALLENGES,
    PATH_TO_HEALING,
];

/// Body of the section introduced by `**name**:`, trimmed
///
/// The body runs to the next line starting with `**` or to the end of text.
pub fn section<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let heading = format!("**{name}**:");
    let start = text.find(&heading)? + heading.len();

    let rest = &text[start..];
    let body = rest.find("\n**").map_or(rest, |end| &rest[..end]);
    Some(body.trim())
}

fn lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

fn keywords(body: &str) -> Vec<String> {
    body.split([',', '\n'])
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_owned)
        .collect()
}

fn bullets(body: &str) -> Vec<String> {
    body.lines()
        .map(|l| l.trim().trim_start_matches(['•', '-', '*']).trim())
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse an analysis outline
///
/// Missing sections default to empty. A reply containing none of the known
/// headings is `NoStructuredValueFound`.
pub fn parse_analysis(reply: &str) -> DomainResult<Analysis> {
    if !ANALYSIS_HEADINGS
        .iter()
        .any(|name| section(reply, name).is_some())
    {
        return Err(DomainError::NoStructuredValueFound);
    }

    let get = |name: &str| section(reply, name).unwrap_or_default();

    Ok(Analysis {
        placement: get(PLACEMENT).to_string(),
        core_wounded_themes: get(CORE_WOUNDED_THEMES).to_string(),
        summary_overview: lines(get(SUMMARY_OVERVIEW)),
        wounded_keywords: keywords(get(WOUNDED_KEYWORDS)),
        healing_keywords: keywords(get(HEALING_KEYWORDS)),
        primary_challenges: bullets(get(PRIMARY_CHALLENGES)),
        path_to_healing: bullets(get(PATH_TO_HEALING)),
    })
}
