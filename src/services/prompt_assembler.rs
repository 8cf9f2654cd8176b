//! Template placeholder substitution
//!
//! `{name}` with `name` an identifier is a placeholder. `{{` and `}}` are
//! literal braces. Any other brace is copied unchanged, so JSON examples in a
//! template need no escaping. `{context}` always receives the retrieved
//! passages joined by a blank line.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::PlacementParameters;

/// Placeholder reserved for the joined retrieval context
pub const CONTEXT_PLACEHOLDER: &str = "context";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Fill `template` with the retrieval context and placement parameters
pub fn assemble(
    template: &str,
    context: &[String],
    parameters: &PlacementParameters,
) -> DomainResult<String> {
    let joined = context.join(CONTEXT_SEPARATOR);
    let mut out = String::with_capacity(template.len() + joined.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if let Some(name) = placeholder_at(tail) {
            let value = if name == CONTEXT_PLACEHOLDER {
                joined.as_str()
            } else {
                parameters
                    .get(name)
                    .map(String::as_str)
                    .ok_or_else(|| DomainError::MissingPlaceholder(name.to_string()))?
            };
            out.push_str(value);
            rest = &tail[name.len() + 2..];
            continue;
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Identifier of the placeholder starting at `text`, if `text` opens one
fn placeholder_at(text: &str) -> Option<&str> {
    let body = text.strip_prefix('{')?;
    let end = body.find('}')?;
    let name = &body[..end];
    is_identifier(name).then_some(name)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
