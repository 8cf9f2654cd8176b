//! Prompt templates for each generation intent
//!
//! Built-in templates can be replaced per intent by pointing the
//! `templates` configuration section at a file. Templates are plain text
//! with `{name}` placeholders; see [`super::prompt_assembler`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::TemplatesConfig;

/// What the model is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Plan,
    Overview,
    Analysis,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plan => "plan",
            Self::Overview => "overview",
            Self::Analysis => "analysis",
        };
        f.write_str(s)
    }
}

pub const DEFAULT_PLAN_TEMPLATE: &str = r#"You are a compassionate guide versed in the healing map of Chiron.

Write a seven-day healing plan for someone with Chiron in {sign} in the {house} house.
Base every day on the reference passages below. Each day offers one practical
activity, journaling prompts, a short meditation and an affirmation.

Reference passages:
{context}

Answer with a JSON array only. Use exactly these keys for every day:
[
  {
    "day": "Day 1",
    "overview": "...",
    "activity": "...",
    "prompts": ["...", "..."],
    "meditation": "...",
    "affirmation": "..."
  }
]
"#;

pub const DEFAULT_OVERVIEW_TEMPLATE: &str = r#"You are an astrologer who explains the Chiron wound with warmth and clarity.

Describe Chiron in {sign} in the {house} house using the reference passages below.

Reference passages:
{context}

Answer with a single JSON object only, using exactly these keys:
{
  "description": "...",
  "coreWoundsAndEmotionalThemes": ["..."],
  "patternsAndStruggles": ["..."],
  "healingAndTransformation": ["..."],
  "spiritualWisdomAndGifts": ["..."],
  "woundPoints": ["..."],
  "patternsConnectedToThisWound": ["..."],
  "healingBenefits": ["..."],
  "reflectiveQuestions": ["..."]
}
"#;

pub const DEFAULT_ANALYSIS_TEMPLATE: &str = "You are an astrologer writing a concise Chiron analysis.

Analyse Chiron in {sign} in the {house} house using the reference passages below.

Reference passages:
{context}

Use this outline and keep every heading exactly as written:

**Placement**: Chiron in {sign}, {house} house
**Core Wounded Themes**: one or two sentences
**Summary Overview**: three short lines
**Wounded Keywords**: comma-separated keywords
**Healing Keywords**: comma-separated keywords
**Primary Challenges**:
- one challenge per line
**Path to Healing**:
- one step per line
";

/// Resolved templates for every intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub plan: String,
    pub overview: String,
    pub analysis: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            plan: DEFAULT_PLAN_TEMPLATE.to_string(),
            overview: DEFAULT_OVERVIEW_TEMPLATE.to_string(),
            analysis: DEFAULT_ANALYSIS_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Built-in templates with configured file overrides applied
    pub async fn load(config: &TemplatesConfig) -> DomainResult<Self> {
        let mut templates = Self::default();
        if let Some(path) = &config.plan {
            templates.plan = read_template(path).await?;
        }
        if let Some(path) = &config.overview {
            templates.overview = read_template(path).await?;
        }
        if let Some(path) = &config.analysis {
            templates.analysis = read_template(path).await?;
        }
        Ok(templates)
    }

    pub fn get(&self, intent: Intent) -> &str {
        match intent {
            Intent::Plan => &self.plan,
            Intent::Overview => &self.overview,
            Intent::Analysis => &self.analysis,
        }
    }
}

async fn read_template(path: &Path) -> DomainResult<String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::io(path, e))?;
    debug!(path = %path.display(), len = text.len(), "Loaded template override");
    Ok(text)
}
