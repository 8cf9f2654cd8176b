use std::sync::LazyLock;

use regex::{Captures, Regex};

static ANTHROPIC_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-ant-[a-zA-Z0-9_-]{20,}").expect("valid pattern"));

static OPENAI_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-(?:proj-)?[a-zA-Z0-9_-]{20,}").expect("valid pattern"));

static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9_.\-]+").expect("valid pattern"));

static KEY_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"["']?(?:api_key|apikey|x-api-key|token|secret)["']?\s*[:=]\s*["']?[a-zA-Z0-9_.\-\[\]]{8,}["']?"#,
    )
    .expect("valid pattern")
});

/// Redacts API keys and bearer tokens
///
/// Applied to upstream error bodies before they reach a log line or an
/// error message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretScrubber;

impl SecretScrubber {
    pub const fn new() -> Self {
        Self
    }

    /// Scrub a message of sensitive data
    pub fn scrub(&self, message: &str) -> String {
        let scrubbed = ANTHROPIC_KEY.replace_all(message, "[API_KEY_REDACTED]");
        let scrubbed = OPENAI_KEY.replace_all(&scrubbed, "[API_KEY_REDACTED]");
        let scrubbed = BEARER.replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        let scrubbed = KEY_FIELD.replace_all(&scrubbed, |caps: &Captures| {
            let full = &caps[0];
            match full.find([':', '=']) {
                Some(pos) => format!("{}[REDACTED]", &full[..=pos]),
                None => "[REDACTED]".to_string(),
            }
        });
        scrubbed.into_owned()
    }
}

/// Scrub with the default scrubber
pub fn scrub_secrets(message: &str) -> String {
    SecretScrubber::new().scrub(message)
}
