//! Pass 2: link basic actions to ingredient and equipment ids.

use recipegraph_ai::LLMProvider;
use recipegraph_core::{Action, EntityId, RecipeSession, UserDataPolicy};
use recipegraph_parser::{SentenceContextBuilder, TextAnalyzer};
use recipegraph_tools::{normalize_action_shape, LinkToolExecutor};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::agent::{AgentConfig, LinkingAgent};
use crate::error::PipelineError;
use crate::prompts;

/// Convert raw agent action entries into validated actions.
///
/// Each entry is normalized like the `normalize_action_shape` tool and then
/// built through [`Action::new`]; entries that fail are skipped.
pub fn actions_from_values(values: &[JsonValue]) -> Vec<Action> {
    values
        .iter()
        .filter_map(|value| {
            let Some(normalized) = normalize_action_shape(value) else {
                warn!("Skipping action entry that is not an object");
                return None;
            };
            let ingredient_ids = normalized
                .ingredient_ids
                .into_iter()
                .map(EntityId::from)
                .collect();
            let equipment_id = normalized.equipment_id.map(EntityId::from);

            match Action::new(normalized.name, ingredient_ids, equipment_id) {
                Ok(action) => Some(action),
                Err(e) => {
                    warn!("Skipping action: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Runs Pass 2 with a fresh [`LinkingAgent`] per call.
pub struct DependencyLinker {
    provider: Arc<dyn LLMProvider>,
    context_builder: SentenceContextBuilder,
    executor: Arc<LinkToolExecutor>,
    agent_config: AgentConfig,
    policy: UserDataPolicy,
}

impl DependencyLinker {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        analyzer: Arc<dyn TextAnalyzer>,
        agent_config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            context_builder: SentenceContextBuilder::new(analyzer),
            executor: Arc::new(LinkToolExecutor::new()),
            agent_config,
            policy: UserDataPolicy::default(),
        }
    }

    pub fn with_user_data_policy(mut self, policy: UserDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shared executor, exposed for call statistics.
    pub fn executor(&self) -> &Arc<LinkToolExecutor> {
        &self.executor
    }

    /// Link the session's basic actions.
    ///
    /// A session that is not ready is left untouched. A failing run leaves
    /// the session in `DependenciesError` and still returns `Ok`; only an
    /// agent that cannot be constructed is an error, and it also moves the
    /// session to its terminal `Error` stage.
    pub async fn link(&self, session: &mut RecipeSession) -> Result<(), PipelineError> {
        if session.basic_actions().is_empty() {
            warn!("No basic actions found, cannot parse dependencies");
            return Ok(());
        }
        if session.ingredients().is_empty() && session.equipment().is_empty() {
            warn!("No ingredients or equipment found, cannot parse dependencies");
            return Ok(());
        }

        let context = self.context_builder.build(session.raw_text())?;
        debug!("Sentence context has {} sentences", context.len());

        let agent = match LinkingAgent::new(
            self.provider.clone(),
            self.executor.clone(),
            self.agent_config.clone(),
        ) {
            Ok(agent) => agent,
            Err(e) => {
                error!("Error creating agent: {}", e);
                session.mark_error(e.to_string());
                return Err(PipelineError::AgentConstruction(e));
            }
        };

        let task = prompts::linking_task(session, &context);
        session.begin_linking()?;

        let run = match agent.run(&task).await {
            Ok(run) => run,
            Err(e) => {
                warn!("Agent execution failed: {}", e);
                session.fail_linking()?;
                return Ok(());
            }
        };

        debug!(
            "Agent result after {} steps ({} tool calls): {}",
            run.steps.len(),
            run.tool_calls(),
            self.policy.redact(&format!("{:?}", run.result))
        );

        let values = run.result.into_action_values();
        let actions = actions_from_values(&values);
        info!(
            "Linked {} of {} returned actions",
            actions.len(),
            values.len()
        );
        session.finish_linking(actions)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actions_from_values_skips_bad_entries() {
        let values = vec![
            json!({"name": "mix", "ingredient_ids": ["i1", "i2"], "equipment_id": "e1"}),
            json!({"name": "rest", "ingredient_ids": [], "equipment_id": null}),
            json!({"name": "  ", "ingredient_ids": ["i1"]}),
            json!("mix"),
            json!({"ingredient_ids": "i3"}),
        ];

        let actions = actions_from_values(&values);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].name, "mix");
        assert_eq!(actions[0].ingredient_ids.len(), 2);
        assert_eq!(actions[0].equipment_id, Some(EntityId::from("e1")));
        assert_eq!(actions[1].name, "unknown_action");
        assert_eq!(actions[2].name, "unknown_action");
        assert_eq!(actions[2].ingredient_ids, vec![EntityId::from("i3")]);
    }
}
