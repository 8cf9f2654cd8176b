//! Implementation of the `healmap plan`, `overview` and `analysis` commands.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{bullet_list, heading, output, CommandOutput};
use crate::cli::types::PlacementArgs;
use crate::cli::NoStructuredResult;
use crate::domain::models::{
    Analysis, Config, GenerationOutcome, HealingPlan, Overview, PlacementRequest,
};
use crate::services::{HealmapPipeline, Intent};

#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub sign: String,
    pub house: String,
    pub plan: HealingPlan,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let mut sections = vec![heading(&format!(
            "Healing plan for Chiron in {} ({} house)",
            self.sign, self.house
        ))];
        for (i, day) in self.plan.days().iter().enumerate() {
            let title = if day.day.is_empty() {
                format!("Day {}", i + 1)
            } else {
                day.day.clone()
            };
            sections.push(format!(
                "{}\n  {}\n\n  Activity: {}\n  Prompts:\n{}\n  Meditation: {}\n  Affirmation: {}",
                heading(&title),
                day.overview,
                day.activity,
                bullet_list(&day.prompts),
                day.meditation,
                day.affirmation
            ));
        }
        sections.join("\n\n")
    }
}

#[derive(Debug, Serialize)]
pub struct OverviewOutput {
    pub sign: String,
    pub house: String,
    #[serde(flatten)]
    pub overview: Overview,
}

impl CommandOutput for OverviewOutput {
    fn to_human(&self) -> String {
        let o = &self.overview;
        let lists: [(&str, &[String]); 8] = [
            ("Core wounds and emotional themes", o.core_wounds_and_emotional_themes.as_slice()),
            ("Patterns and struggles", o.patterns_and_struggles.as_slice()),
            ("Healing and transformation", o.healing_and_transformation.as_slice()),
            ("Spiritual wisdom and gifts", o.spiritual_wisdom_and_gifts.as_slice()),
            ("Wound points", o.wound_points.as_slice()),
            ("Patterns connected to this wound", o.patterns_connected_to_this_wound.as_slice()),
            ("Healing benefits", o.healing_benefits.as_slice()),
            ("Reflective questions", o.reflective_questions.as_slice()),
        ];

        let mut sections = vec![
            heading(&format!(
                "Chiron in {} ({} house)",
                self.sign, self.house
            )),
            o.description.clone(),
        ];
        sections.extend(
            lists
                .iter()
                .map(|(title, items)| format!("{}\n{}", heading(title), bullet_list(items))),
        );
        sections.join("\n\n")
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisOutput {
    pub sign: String,
    pub house: String,
    #[serde(flatten)]
    pub analysis: Analysis,
}

impl CommandOutput for AnalysisOutput {
    fn to_human(&self) -> String {
        let a = &self.analysis;
        [
            format!("{}\n  {}", heading("Placement"), a.placement),
            format!("{}\n  {}", heading("Core wounded themes"), a.core_wounded_themes),
            format!("{}\n{}", heading("Summary"), bullet_list(&a.summary_overview)),
            format!("{}\n  {}", heading("Wounded keywords"), a.wounded_keywords.join(", ")),
            format!("{}\n  {}", heading("Healing keywords"), a.healing_keywords.join(", ")),
            format!("{}\n{}", heading("Primary challenges"), bullet_list(&a.primary_challenges)),
            format!("{}\n{}", heading("Path to healing"), bullet_list(&a.path_to_healing)),
        ]
        .join("\n\n")
    }
}

/// Explicit `--sign` and `--house` win over `--param sign=...`.
fn placement_request(args: &PlacementArgs) -> PlacementRequest {
    args.params
        .iter()
        .fold(PlacementRequest::new(&args.question), |request, (key, value)| {
            request.with_parameter(key, value)
        })
        .with_sign(&args.sign)
        .with_house(&args.house)
}

fn produced<T>(intent: Intent, outcome: GenerationOutcome<T>) -> Result<T> {
    match outcome {
        GenerationOutcome::Produced { record } => Ok(record),
        GenerationOutcome::NotProduced { state, .. } => Err(NoStructuredResult {
            detail: format!("Model could not generate a valid {intent}"),
            state,
        }
        .into()),
    }
}

async fn pipeline(config: &Config) -> Result<HealmapPipeline> {
    HealmapPipeline::from_config(config)
        .await
        .context("Failed to set up the pipeline")
}

pub async fn execute_plan(config: &Config, args: PlacementArgs, json_mode: bool) -> Result<()> {
    let outcome = pipeline(config)
        .await?
        .generate_plan(&placement_request(&args))
        .await
        .context("Plan generation failed")?;
    let plan = produced(Intent::Plan, outcome)?;

    output(
        &PlanOutput {
            sign: args.sign,
            house: args.house,
            plan,
        },
        json_mode,
    );
    Ok(())
}

pub async fn execute_overview(config: &Config, args: PlacementArgs, json_mode: bool) -> Result<()> {
    let outcome = pipeline(config)
        .await?
        .generate_overview(&placement_request(&args))
        .await
        .context("Overview generation failed")?;
    let overview = produced(Intent::Overview, outcome)?;

    output(
        &OverviewOutput {
            sign: args.sign,
            house: args.house,
            overview,
        },
        json_mode,
    );
    Ok(())
}

pub async fn execute_analysis(config: &Config, args: PlacementArgs, json_mode: bool) -> Result<()> {
    let outcome = pipeline(config)
        .await?
        .generate_analysis(&placement_request(&args))
        .await
        .context("Analysis generation failed")?;
    let analysis = produced(Intent::Analysis, outcome)?;

    output(
        &AnalysisOutput {
            sign: args.sign,
            house: args.house,
            analysis,
        },
        json_mode,
    );
    Ok(())
}
