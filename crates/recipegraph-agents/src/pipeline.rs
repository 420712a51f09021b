// ABOUTME: End-to-end recipe analysis: Pass 1 extraction followed by Pass 2 linking
// ABOUTME: Wires provider, text analyzer and configuration into the two passes

use anyhow::{Context, Result};
use recipegraph_ai::{GenerationConfig, LLMProvider, LLMProviderFactory};
use recipegraph_core::{ParsingState, RecipeGraphConfig, RecipeSession, UserDataPolicy};
use recipegraph_parser::{RuleBasedAnalyzer, TextAnalyzer};
use std::sync::Arc;
use tracing::{info, warn};

use crate::agent::AgentConfig;
use crate::error::PipelineError;
use crate::extraction::EntityExtractor;
use crate::linking::DependencyLinker;

pub struct RecipePipeline {
    extractor: EntityExtractor,
    linker: DependencyLinker,
}

impl RecipePipeline {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        analyzer: Arc<dyn TextAnalyzer>,
        config: &RecipeGraphConfig,
    ) -> Self {
        let policy = UserDataPolicy::from_config(&config.logging);
        let extractor = EntityExtractor::new(provider.clone(), analyzer.clone())
            .with_generation_config(GenerationConfig::from_llm_config(&config.llm))
            .with_derived_basic_actions(config.pipeline.derive_basic_actions)
            .with_user_data_policy(policy);
        let linker = DependencyLinker::new(provider, analyzer, AgentConfig::from_config(config))
            .with_user_data_policy(policy);

        Self { extractor, linker }
    }

    /// Build the provider from `config.llm` and start a rule-based analyzer.
    ///
    /// Configuration problems (unknown provider, missing model or key) are
    /// returned here rather than degrading later.
    pub fn from_config(config: &RecipeGraphConfig) -> Result<Self> {
        let provider = LLMProviderFactory::create_from_config(&config.llm)
            .context("Failed to create LLM provider")?;
        let analyzer =
            RuleBasedAnalyzer::started().context("Failed to start the text analyzer")?;

        Ok(Self::new(provider, Arc::new(analyzer), config))
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    pub fn linker(&self) -> &DependencyLinker {
        &self.linker
    }

    /// Pass 1 only.
    pub async fn extract(&self, recipe_text: &str) -> RecipeSession {
        self.extractor.extract(recipe_text).await
    }

    /// Pass 2 only; also the retry path from `DependenciesError`.
    pub async fn link(&self, session: &mut RecipeSession) -> Result<(), PipelineError> {
        self.linker.link(session).await
    }

    /// Both passes. Linking is skipped when extraction did not complete.
    pub async fn analyze(&self, recipe_text: &str) -> Result<RecipeSession, PipelineError> {
        let mut session = self.extract(recipe_text).await;

        if session.parsing_state() != ParsingState::Completed {
            warn!(
                "Skipping dependency linking, session is {}",
                session.parsing_state()
            );
            return Ok(session);
        }

        self.link(&mut session).await?;
        info!("Recipe analysis finished: {}", session.parsing_state());
        Ok(session)
    }
}
