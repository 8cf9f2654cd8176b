//! Structured output extraction
//!
//! Turns free-text model replies into schema-complete records: balanced
//! JSON span detection for the plan and overview intents, and `**Heading**:`
//! outline parsing for the analysis intent.

pub mod extractor;
pub mod json_span;
pub mod sections;

pub use extractor::{extract_record, extract_value};
pub use json_span::{find_balanced_span, strip_code_fences};
pub use sections::parse_analysis;
