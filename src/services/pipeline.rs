//! Retrieval and structured generation pipeline
//!
//! One request runs sequentially: load-or-build the index, retrieve the top-k
//! passages for the question, assemble the intent's prompt, call the model
//! once and extract a record from the reply. Failures of the generative step
//! are reported as [`GenerationOutcome::NotProduced`]; everything else is a
//! [`DomainError`].

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::adapters::create_generation_client;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Analysis, Config, CycleState, GenerationOutcome, HealingPlan, Overview, PlacementRequest,
    RetrievalResult,
};
use crate::domain::ports::GenerationClient;
use crate::infrastructure::extraction::{extract_record, parse_analysis};

use super::index_service::{IndexOrigin, IndexService, LoadedIndex};
use super::prompt_assembler::assemble;
use super::retriever::Retriever;
use super::templates::{Intent, PromptTemplates};

/// Tunables applied to every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub temperature: f32,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            temperature: config.generation.temperature,
        }
    }
}

/// Walks one generate-and-extract cycle through its legal states
struct Cycle {
    intent: Intent,
    state: CycleState,
}

impl Cycle {
    const fn start(intent: Intent) -> Self {
        Self {
            intent,
            state: CycleState::Prompted,
        }
    }

    fn advance(&mut self, next: CycleState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal cycle transition {} -> {}",
            self.state,
            next
        );
        debug!(intent = %self.intent, from = %self.state, to = %next, "Cycle transition");
        self.state = next;
    }

    fn not_produced<T>(mut self, next: CycleState, reason: &DomainError) -> GenerationOutcome<T> {
        self.advance(next);
        warn!(intent = %self.intent, state = %self.state, %reason, "No structured result");
        GenerationOutcome::NotProduced {
            state: self.state,
            reason: reason.to_string(),
        }
    }
}

/// Facade over index lifecycle, retrieval and generation
#[derive(Clone)]
pub struct HealmapPipeline {
    index_service: IndexService,
    retriever: Retriever,
    generator: Arc<dyn GenerationClient>,
    templates: PromptTemplates,
    settings: PipelineSettings,
}

impl std::fmt::Debug for HealmapPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealmapPipeline").finish_non_exhaustive()
    }
}

impl HealmapPipeline {
    pub fn new(
        index_service: IndexService,
        generator: Arc<dyn GenerationClient>,
        templates: PromptTemplates,
        settings: PipelineSettings,
    ) -> Self {
        let retriever = Retriever::new(Arc::clone(index_service.embedder()));
        Self {
            index_service,
            retriever,
            generator,
            templates,
            settings,
        }
    }

    /// Wire every component from configuration
    pub async fn from_config(config: &Config) -> DomainResult<Self> {
        let index_service = IndexService::from_config(config)?;
        let generator = create_generation_client(&config.generation)?;
        let templates = PromptTemplates::load(&config.templates).await?;

        Ok(Self::new(
            index_service,
            generator,
            templates,
            PipelineSettings::from(config),
        ))
    }

    pub fn index_service(&self) -> &IndexService {
        &self.index_service
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Load or build the index without running a query
    pub async fn prepare_index(&self, force: bool) -> DomainResult<(Arc<LoadedIndex>, IndexOrigin)> {
        self.index_service.ensure(force).await
    }

    /// Top-k passages for `query`; `k` defaults to the configured value
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> DomainResult<RetrievalResult> {
        let index = self.index_service.load_or_build().await?;
        self.retriever
            .search(&index, query, k.unwrap_or(self.settings.top_k))
            .await
    }

    pub async fn generate_plan(
        &self,
        request: &PlacementRequest,
    ) -> DomainResult<GenerationOutcome<HealingPlan>> {
        self.run(Intent::Plan, request, extract_record::<HealingPlan>)
            .await
    }

    pub async fn generate_overview(
        &self,
        request: &PlacementRequest,
    ) -> DomainResult<GenerationOutcome<Overview>> {
        self.run(Intent::Overview, request, extract_record::<Overview>)
            .await
    }

    pub async fn generate_analysis(
        &self,
        request: &PlacementRequest,
    ) -> DomainResult<GenerationOutcome<Analysis>> {
        self.run(Intent::Analysis, request, parse_analysis).await
    }

    #[instrument(skip(self, request, parse), fields(question_len = request.question.len()))]
    async fn run<T>(
        &self,
        intent: Intent,
        request: &PlacementRequest,
        parse: fn(&str) -> DomainResult<T>,
    ) -> DomainResult<GenerationOutcome<T>> {
        let retrieved = self.retrieve(&request.question, None).await?;
        let prompt = assemble(
            self.templates.get(intent),
            &retrieved.texts(),
            &request.parameters,
        )?;

        let mut cycle = Cycle::start(intent);
        cycle.advance(CycleState::Called);

        let reply = match self
            .generator
            .generate(&prompt, self.settings.temperature)
            .await
        {
            Ok(reply) => reply,
            Err(e) if e.is_no_structured_result() => {
                return Ok(cycle.not_produced(CycleState::FailedGeneration, &e));
            }
            Err(e) => return Err(e),
        };
        cycle.advance(CycleState::Received);

        let record = match parse(&reply) {
            Ok(record) => record,
            Err(e @ DomainError::MalformedStructuredValue(_)) => {
                cycle.advance(CycleState::Extracted);
                return Ok(cycle.not_produced(CycleState::FailedParse, &e));
            }
            Err(e) if e.is_no_structured_result() => {
                return Ok(cycle.not_produced(CycleState::FailedExtraction, &e));
            }
            Err(e) => return Err(e),
        };
        cycle.advance(CycleState::Extracted);
        cycle.advance(CycleState::Normalized);

        info!(
            %intent,
            passages = retrieved.len(),
            model = self.generator.model(),
            "Structured record produced"
        );
        Ok(GenerationOutcome::Produced { record })
    }
}
