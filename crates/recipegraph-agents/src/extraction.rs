//! Pass 1: one model call that turns recipe text into entities.
//!
//! Failures here are soft. The session is always handed back; a failed
//! pass shows up as `extraction_status == Failed` with empty entity lists.

use recipegraph_ai::{clean_json_response, GenerationConfig, LLMProvider};
use recipegraph_core::{BasicAction, RecipeSession, SessionError, UserDataPolicy};
use recipegraph_parser::{convert_entities, TextAnalyzer};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::prompts;

const SNIPPET_RADIUS: usize = 50;
const PREVIEW_CHARS: usize = 500;

/// Where a JSON decode failed, with a window of the text around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Up to 50 characters either side of the failure
    pub snippet: String,
    /// Spaces followed by `^` under the failing character of `snippet`
    pub marker: String,
}

impl DecodeFailure {
    pub fn from_error(text: &str, err: &serde_json::Error) -> Self {
        let offset = char_offset(text, err.line(), err.column());
        let chars: Vec<char> = text.chars().collect();
        let start = offset.saturating_sub(SNIPPET_RADIUS);
        let end = (offset + SNIPPET_RADIUS).min(chars.len());

        Self {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
            snippet: chars[start.min(end)..end].iter().collect(),
            marker: format!("{}^", " ".repeat(offset - start.min(offset))),
        }
    }
}

/// Character index for a 1-based line and byte column as reported by serde_json.
fn char_offset(text: &str, line: usize, column: usize) -> usize {
    let mut byte = 0;
    for (index, segment) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            byte += column.saturating_sub(1).min(segment.len());
            break;
        }
        byte += segment.len();
    }
    let mut byte = byte.min(text.len());
    while !text.is_char_boundary(byte) {
        byte -= 1;
    }
    text[..byte].chars().count()
}

fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(limit).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Runs Pass 1 against an injected provider and text analyzer.
pub struct EntityExtractor {
    provider: Arc<dyn LLMProvider>,
    analyzer: Arc<dyn TextAnalyzer>,
    generation: GenerationConfig,
    derive_basic_actions: bool,
    policy: UserDataPolicy,
}

impl EntityExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self {
            provider,
            analyzer,
            generation: GenerationConfig::default(),
            derive_basic_actions: false,
            policy: UserDataPolicy::default(),
        }
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Derive basic actions from the verb lexicon when the model returns none.
    pub fn with_derived_basic_actions(mut self, enabled: bool) -> Self {
        self.derive_basic_actions = enabled;
        self
    }

    pub fn with_user_data_policy(mut self, policy: UserDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extract into a fresh session.
    pub async fn extract(&self, recipe_text: &str) -> RecipeSession {
        let mut session = RecipeSession::new();
        if let Err(e) = self.extract_into(&mut session, recipe_text).await {
            error!("Entity extraction left the session in an unexpected state: {}", e);
        }
        session
    }

    /// Run Pass 1 on an existing session, replacing its entities.
    ///
    /// Only invalid session transitions are returned as errors; model and
    /// decode failures end in `fail_extraction`.
    pub async fn extract_into(
        &self,
        session: &mut RecipeSession,
        recipe_text: &str,
    ) -> Result<(), SessionError> {
        session.begin_extraction(recipe_text)?;
        info!(
            "Extracting entities with {}/{}",
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let prompt = prompts::extraction_prompt(recipe_text);
        let response = match self.provider.complete(&prompt, &self.generation).await {
            Ok(response) => response,
            Err(e) => {
                error!("Entity extraction request failed: {:#}", e);
                return session.fail_extraction();
            }
        };

        if response.is_blank() {
            warn!("No result returned from the model");
            return session.fail_extraction();
        }
        if response.is_truncated() {
            warn!("Model stopped at the token limit, the JSON may be incomplete");
        }
        let response = response.content;
        debug!(
            "Model raw response: {}",
            self.policy.redact(&preview(&response, PREVIEW_CHARS))
        );

        let cleaned = clean_json_response(&response);
        let document: Value = match serde_json::from_str(&cleaned) {
            Ok(document) => document,
            Err(e) => {
                self.log_decode_failure(&cleaned, &e);
                warn!("Returning empty session due to JSON parsing failure");
                return session.fail_extraction();
            }
        };

        let mut converted = convert_entities(&document);
        if converted.is_empty() {
            warn!(
                "Model response contained no usable entities ({} warnings)",
                converted.warnings.len()
            );
            return session.fail_extraction();
        }

        if self.derive_basic_actions && converted.basic_actions.is_empty() {
            converted.basic_actions = self.basic_actions_from_lexicon(recipe_text);
        }

        info!(
            "Parsed recipe: {} ingredients, {} equipment, {} basic actions",
            converted.ingredients.len(),
            converted.equipment.len(),
            converted.basic_actions.len()
        );
        session.finish_extraction(
            converted.ingredients,
            converted.equipment,
            converted.basic_actions,
        )
    }

    fn log_decode_failure(&self, cleaned: &str, err: &serde_json::Error) {
        let failure = DecodeFailure::from_error(cleaned, err);
        error!("JSON parsing failed: {}", failure.message);
        error!(
            "JSON error at line {}, column {}",
            failure.line, failure.column
        );
        if self.policy.allows_user_data() {
            error!("Error context: ...{}...", failure.snippet);
            error!("Error position: ...{}", failure.marker);
            debug!("Full cleaned response that failed to parse: {}", cleaned);
        }
    }

    /// One basic action per (lemma, sentence) pair found by the analyzer.
    fn basic_actions_from_lexicon(&self, recipe_text: &str) -> Vec<BasicAction> {
        let mentions = match self.analyzer.cooking_verbs(recipe_text) {
            Ok(mentions) => mentions,
            Err(e) => {
                warn!("Could not derive basic actions: {}", e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let derived: Vec<BasicAction> = mentions
            .into_iter()
            .filter(|m| seen.insert((m.lemma.clone(), m.sentence_index)))
            .filter_map(|m| BasicAction::new(m.lemma, m.sentence, m.sentence_index).ok())
            .collect();

        info!(
            "Derived {} basic actions with '{}'",
            derived.len(),
            self.analyzer.name()
        );
        derived
    }
}
