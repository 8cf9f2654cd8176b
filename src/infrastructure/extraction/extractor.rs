//! Structured output extraction
//!
//! Strip fences, locate the first balanced span, parse it once, normalize.

use serde_json::Value;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{JsonShape, StructuredRecord};

use super::json_span::{find_balanced_span, strip_code_fences};

/// Extract and parse the first balanced JSON value of `shape` from `reply`
///
/// Fails with `NoStructuredValueFound` when no span balances and with
/// `MalformedStructuredValue` when the span is not valid JSON.
pub fn extract_value(reply: &str, shape: JsonShape) -> DomainResult<Value> {
    let cleaned = strip_code_fences(reply);
    let span = find_balanced_span(&cleaned, shape).ok_or(DomainError::NoStructuredValueFound)?;

    debug!(
        reply_len = reply.len(),
        span_len = span.len(),
        ?shape,
        "Found balanced span"
    );

    Ok(serde_json::from_str(span)?)
}

/// Extract a schema-complete record from a model reply
pub fn extract_record<R: StructuredRecord>(reply: &str) -> DomainResult<R> {
    let value = extract_value(reply, R::SHAPE)?;
    Ok(R::normalize(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{HealingPlan, Overview};

    #[test]
    fn test_fenced_plan_with_trailing_note() {
        let reply = "```json\n[{\"day\":\"Day 1\",\"overview\":\"x\",\"activity\":\"y\",\"prompts\":[\"a\",\"b\"],\"meditation\":\"z\"}]\n``` some trailing note";
        let plan: HealingPlan = extract_record(reply).unwrap();

        assert_eq!(plan.len(), 1);
        let day = &plan.days()[0];
        assert_eq!(day.day, "Day 1");
        assert_eq!(day.overview, "x");
        assert_eq!(day.activity, "y");
        assert_eq!(day.prompts, vec!["a", "b"]);
        assert_eq!(day.meditation, "z");
        assert_eq!(day.affirmation, "");
    }

    #[test]
    fn test_reply_without_brackets() {
        let err = extract_record::<HealingPlan>("I'm sorry, I can't produce a plan today.")
            .unwrap_err();
        assert!(matches!(err, DomainError::NoStructuredValueFound));
    }

    #[test]
    fn test_invalid_span_is_malformed_not_retried() {
        // The first balanced span is prose, and a valid array follows it
        let reply = r#"Days [one, two] then [{"day": "Day 1"}]"#;
        let err = extract_record::<HealingPlan>(reply).unwrap_err();
        assert!(matches!(err, DomainError::MalformedStructuredValue(_)));
    }

    #[test]
    fn test_overview_inside_prose() {
        let reply = r#"Here is the overview you asked for:
{"description": "Chiron in Aries", "woundPoints": ["identity"], "extra": 1}
Let me know if you want more [details]."#;
        let overview: Overview = extract_record(reply).unwrap();
        assert_eq!(overview.description, "Chiron in Aries");
        assert_eq!(overview.wound_points, vec!["identity"]);
        assert!(overview.reflective_questions.is_empty());
    }

    #[test]
    fn test_extract_value_auto() {
        let value = extract_value("result: {\"ok\": true}", JsonShape::Auto).unwrap();
        assert_eq!(value["ok"], true);
    }
}
