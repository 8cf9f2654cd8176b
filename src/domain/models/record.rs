//! Structured records produced by the generation pipeline.
//!
//! Every record is schema-complete: normalization copies each expected field
//! when it is present with the expected shape and substitutes the default
//! (`""` for text, `[]` for lists) otherwise. Unknown fields are dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which JSON value the extractor should look for in model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonShape {
    /// First balanced `[...]`
    Array,
    /// First balanced `{...}`
    Object,
    /// Whichever opening bracket occurs first
    Auto,
}

impl JsonShape {
    pub const fn brackets(self) -> &'static [(char, char)] {
        match self {
            Self::Array => &[('[', ']')],
            Self::Object => &[('{', '}')],
            Self::Auto => &[('[', ']'), ('{', '}')],
        }
    }
}

/// A record type that can be normalized from an arbitrary parsed JSON value.
pub trait StructuredRecord: Sized + Serialize {
    /// JSON shape the model is asked to return
    const SHAPE: JsonShape;

    /// Field names every normalized record carries
    fn field_names() -> &'static [&'static str];

    /// Normalize a parsed value. Never fails.
    fn normalize(value: &Value) -> Self;
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

fn list_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// One day of a healing plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    pub day: String,
    pub overview: String,
    pub activity: String,
    pub prompts: Vec<String>,
    pub meditation: String,
    pub affirmation: String,
}

impl PlanDay {
    const FIELDS: &'static [&'static str] = &[
        "day",
        "overview",
        "activity",
        "prompts",
        "meditation",
        "affirmation",
    ];

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            day: text_field(obj, "day"),
            overview: text_field(obj, "overview"),
            activity: text_field(obj, "activity"),
            prompts: list_field(obj, "prompts"),
            meditation: text_field(obj, "meditation"),
            affirmation: text_field(obj, "affirmation"),
        }
    }
}

/// Day-by-day healing plan, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealingPlan(pub Vec<PlanDay>);

impl HealingPlan {
    pub fn days(&self) -> &[PlanDay] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl StructuredRecord for HealingPlan {
    const SHAPE: JsonShape = JsonShape::Array;

    fn field_names() -> &'static [&'static str] {
        PlanDay::FIELDS
    }

    /// Arrays keep their object items in order and skip anything else; a
    /// lone object is read as a one-day plan.
    fn normalize(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(PlanDay::from_object)
                    .collect(),
            ),
            Value::Object(obj) => Self(vec![PlanDay::from_object(obj)]),
            _ => Self::default(),
        }
    }
}

/// Thematic overview of a placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub description: String,
    pub core_wounds_and_emotional_themes: Vec<String>,
    pub patterns_and_struggles: Vec<String>,
    pub healing_and_transformation: Vec<String>,
    pub spiritual_wisdom_and_gifts: Vec<String>,
    pub wound_points: Vec<String>,
    pub patterns_connected_to_this_wound: Vec<String>,
    pub healing_benefits: Vec<String>,
    pub reflective_questions: Vec<String>,
}

impl StructuredRecord for Overview {
    const SHAPE: JsonShape = JsonShape::Object;

    fn field_names() -> &'static [&'static str] {
        &[
            "description",
            "coreWoundsAndEmotionalThemes",
            "patternsAndStruggles",
            "healingAndTransformation",
            "spiritualWisdomAndGifts",
            "woundPoints",
            "patternsConnectedToThisWound",
            "healingBenefits",
            "reflectiveQuestions",
        ]
    }

    fn normalize(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);
        Self {
            description: text_field(obj, "description"),
            core_wounds_and_emotional_themes: list_field(obj, "coreWoundsAndEmotionalThemes"),
            patterns_and_struggles: list_field(obj, "patternsAndStruggles"),
            healing_and_transformation: list_field(obj, "healingAndTransformation"),
            spiritual_wisdom_and_gifts: list_field(obj, "spiritualWisdomAndGifts"),
            wound_points: list_field(obj, "woundPoints"),
            patterns_connected_to_this_wound: list_field(obj, "patternsConnectedToThisWound"),
            healing_benefits: list_field(obj, "healingBenefits"),
            reflective_questions: list_field(obj, "reflectiveQuestions"),
        }
    }
}

/// Sectioned placement analysis, parsed from `**Heading**:` outlines rather
/// than JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub placement: String,
    pub core_wounded_themes: String,
    pub summary_overview: Vec<String>,
    pub wounded_keywords: Vec<String>,
    pub healing_keywords: Vec<String>,
    pub primary_challenges: Vec<String>,
    pub path_to_healing: Vec<String>,
}

impl Analysis {
    pub const FIELDS: &'static [&'static str] = &[
        "placement",
        "coreWoundedThemes",
        "summaryOverview",
        "woundedKeywords",
        "healingKeywords",
        "primaryChallenges",
        "pathToHealing",
    ];
}
