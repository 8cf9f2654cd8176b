//! Generation cycle state and outcome.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// States of one generate-and-extract cycle.
///
/// `Prompted -> Called -> {FailedGeneration | Received}
///  -> {FailedExtraction | Extracted} -> {FailedParse | Normalized}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Prompted,
    Called,
    Received,
    Extracted,
    Normalized,
    FailedGeneration,
    FailedExtraction,
    FailedParse,
}

impl CycleState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Normalized | Self::FailedGeneration | Self::FailedExtraction | Self::FailedParse
        )
    }

    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::FailedGeneration | Self::FailedExtraction | Self::FailedParse
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Prompted, Self::Called)
                | (Self::Called, Self::Received | Self::FailedGeneration)
                | (Self::Received, Self::Extracted | Self::FailedExtraction)
                | (Self::Extracted, Self::Normalized | Self::FailedParse)
        )
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Prompted => "prompted",
            Self::Called => "called",
            Self::Received => "received",
            Self::Extracted => "extracted",
            Self::Normalized => "normalized",
            Self::FailedGeneration => "failed_generation",
            Self::FailedExtraction => "failed_extraction",
            Self::FailedParse => "failed_parse",
        };
        f.write_str(s)
    }
}

/// Result of a generation request as seen by collaborators.
///
/// `NotProduced` means the generative step yielded no usable record; it is
/// distinct from the system-level errors returned as `Err(DomainError)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationOutcome<T> {
    Produced { record: T },
    NotProduced { state: CycleState, reason: String },
}

impl<T> GenerationOutcome<T> {
    pub const fn is_produced(&self) -> bool {
        matches!(self, Self::Produced { .. })
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Produced { record } => Some(record),
            Self::NotProduced { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            Self::Produced { record } => Some(record),
            Self::NotProduced { .. } => None,
        }
    }
}

/// Placement parameters merged into prompt templates (sign, house, ...).
pub type PlacementParameters = BTreeMap<String, String>;

/// A question about one placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// Free-text question used as the retrieval query
    pub question: String,

    /// Template parameters; `sign` and `house` by convention
    pub parameters: PlacementParameters,
}

impl PlacementRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            parameters: PlacementParameters::new(),
        }
    }

    pub fn with_sign(self, sign: impl Into<String>) -> Self {
        self.with_parameter("sign", sign)
    }

    pub fn with_house(self, house: impl Into<String>) -> Self {
        self.with_parameter("house", house)
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}
