//! Balanced JSON span detection
//!
//! Model replies wrap JSON in prose and Markdown fences, and the prose after
//! the value can itself contain bracket characters. The scanner here counts
//! nesting depth from an opening bracket and ends the span at the first
//! return to depth zero, ignoring brackets inside string literals.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::JsonShape;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").expect("fence pattern is valid"));

/// Remove every ```` ```json ```` / ```` ``` ```` marker, wherever it occurs
pub fn strip_code_fences(text: &str) -> Cow<'_, str> {
    FENCE_RE.replace_all(text, "")
}

/// Find the first balanced JSON span of the requested shape
///
/// `Auto` tries the bracket kind that occurs first, then the other kind.
/// Within one kind, an opening bracket whose scan reaches the end of the text
/// without balancing is abandoned in favour of the next opening bracket.
pub fn find_balanced_span(text: &str, shape: JsonShape) -> Option<&str> {
    let mut kinds: Vec<(char, char)> = shape.brackets().to_vec();
    kinds.sort_by_key(|(open, _)| text.find(*open).unwrap_or(usize::MAX));

    kinds
        .into_iter()
        .find_map(|(open, close)| first_balanced_of_kind(text, open, close))
}

fn first_balanced_of_kind(text: &str, open: char, close: char) -> Option<&str> {
    text.match_indices(open).find_map(|(start, _)| {
        scan_to_balance(&text[start..], open, close).map(|len| &text[start..start + len])
    })
}

/// Byte length of the balanced span at the start of `text`, if it closes
fn scan_to_balance(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i + c.len_utf8());
            }
        }
    }

    None
}
