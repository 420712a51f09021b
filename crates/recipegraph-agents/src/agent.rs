// ABOUTME: Bounded tool-calling agent that links basic actions to ingredients and equipment
// ABOUTME: Message-passing loop over the LLM provider with a fixed step budget and a tagged result

use recipegraph_ai::{
    clean_json_response, extract_trailing_json_object, GenerationConfig, LLMProvider, Message,
};
use recipegraph_core::RecipeGraphConfig;
use recipegraph_tools::{LinkToolExecutor, LinkToolSchemas};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::prompts;

const AGENT_LOG_TARGET: &str = "recipegraph::agent";

/// Configuration for the linking agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum number of model turns before giving up
    pub max_steps: usize,
    pub generation: GenerationConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            generation: GenerationConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn from_config(config: &RecipeGraphConfig) -> Self {
        Self {
            max_steps: config.pipeline.agent_max_steps,
            generation: GenerationConfig::from_llm_config(&config.llm),
        }
    }
}

/// What the agent handed back when it stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AgentResult {
    /// A JSON value returned directly as the final answer
    Structured(JsonValue),
    /// A textual final answer wrapped with run metadata
    RunOutput { output: String, steps: usize },
    /// Free-form text that did not follow the reply protocol
    Text(String),
}

impl AgentResult {
    /// The raw action entries carried by this result.
    ///
    /// Text variants go through trailing JSON extraction; anything that
    /// does not yield an `actions` list produces no entries.
    pub fn into_action_values(self) -> Vec<JsonValue> {
        let value = match self {
            AgentResult::Structured(value) => Some(value),
            AgentResult::RunOutput { output, .. } => extract_trailing_json_object(&output),
            AgentResult::Text(text) => extract_trailing_json_object(&text),
        };

        match value {
            Some(JsonValue::Object(mut map)) => match map.remove("actions") {
                Some(JsonValue::Array(actions)) => actions,
                _ => {
                    warn!(target: AGENT_LOG_TARGET, "Agent result has no 'actions' list");
                    Vec::new()
                }
            },
            Some(JsonValue::Array(actions)) => actions,
            _ => {
                warn!(target: AGENT_LOG_TARGET, "No JSON found in agent result");
                Vec::new()
            }
        }
    }
}

/// A single turn of the agent loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    pub step_number: usize,
    pub reasoning: Option<String>,
    pub tool_name: Option<String>,
    pub tool_params: Option<JsonValue>,
    pub tool_result: Option<JsonValue>,
    pub tool_error: Option<String>,
    pub is_final: bool,
}

impl AgentStep {
    fn new(step_number: usize) -> Self {
        Self {
            step_number,
            reasoning: None,
            tool_name: None,
            tool_params: None,
            tool_result: None,
            tool_error: None,
            is_final: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentRun {
    pub result: AgentResult,
    pub steps: Vec<AgentStep>,
    pub total_tokens: usize,
}

impl AgentRun {
    pub fn tool_calls(&self) -> usize {
        self.steps.iter().filter(|s| s.tool_name.is_some()).count()
    }
}

#[derive(Debug, PartialEq)]
enum AgentReply {
    ToolCall {
        reasoning: Option<String>,
        name: String,
        params: JsonValue,
    },
    Final {
        reasoning: Option<String>,
        result: AgentResult,
    },
    Continue {
        reasoning: Option<String>,
    },
}

/// Tool-calling agent for dependency linking
pub struct LinkingAgent {
    provider: Arc<dyn LLMProvider>,
    executor: Arc<LinkToolExecutor>,
    config: AgentConfig,
}

impl std::fmt::Debug for LinkingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkingAgent")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_name())
            .field("config", &self.config)
            .finish()
    }
}

impl LinkingAgent {
    /// Fails for a zero step budget or a provider without a model name.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        executor: Arc<LinkToolExecutor>,
        config: AgentConfig,
    ) -> Result<Self, AgentError> {
        if config.max_steps == 0 {
            return Err(AgentError::Config(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if provider.model_name().trim().is_empty() {
            return Err(AgentError::Config(format!(
                "provider '{}' has no model configured",
                provider.provider_name()
            )));
        }

        Ok(Self {
            provider,
            executor,
            config,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the loop until the model gives a final answer or the budget runs out.
    pub async fn run(&self, task: &str) -> Result<AgentRun, AgentError> {
        info!(
            target: AGENT_LOG_TARGET,
            "Starting linking agent: model={}, max_steps={}",
            self.provider.model_name(),
            self.config.max_steps
        );

        let mut conversation = vec![
            Message::system(prompts::linking_system_prompt(&LinkToolSchemas::all())),
            Message::user(task),
        ];
        let mut steps = Vec::new();
        let mut total_tokens = 0;

        for step_number in 1..=self.config.max_steps {
            debug!(target: AGENT_LOG_TARGET, "Agent step {}/{}", step_number, self.config.max_steps);

            let response = self
                .provider
                .generate_chat(&conversation, &self.config.generation)
                .await
                .map_err(|e| AgentError::Provider(format!("{e:#}")))?;
            total_tokens += response.total_tokens.unwrap_or(0);
            conversation.push(Message::assistant(response.content.clone()));

            let mut step = AgentStep::new(step_number);
            match parse_reply(&response.content, step_number) {
                AgentReply::ToolCall {
                    reasoning,
                    name,
                    params,
                } => {
                    step.reasoning = reasoning;
                    let observation = match self.executor.execute(&name, params.clone()) {
                        Ok(result) => {
                            let text = serde_json::to_string(&result)
                                .unwrap_or_else(|_| result.to_string());
                            step.tool_result = Some(result);
                            format!("Observation: {text}")
                        }
                        Err(e) => {
                            warn!(target: AGENT_LOG_TARGET, tool = %name, "Tool call failed: {}", e);
                            step.tool_error = Some(e.to_string());
                            format!("Observation: error: {e}")
                        }
                    };
                    step.tool_name = Some(name);
                    step.tool_params = Some(params);
                    conversation.push(Message::user(observation));
                    steps.push(step);
                }
                AgentReply::Final { reasoning, result } => {
                    step.reasoning = reasoning;
                    step.is_final = true;
                    steps.push(step);
                    info!(
                        target: AGENT_LOG_TARGET,
                        "Linking agent finished after {} steps ({} tokens)",
                        step_number,
                        total_tokens
                    );
                    return Ok(AgentRun {
                        result,
                        steps,
                        total_tokens,
                    });
                }
                AgentReply::Continue { reasoning } => {
                    step.reasoning = reasoning;
                    conversation.push(Message::user(
                        "Observation: no tool_call and no final_answer. \
                         Call a tool or set is_final with a final_answer.",
                    ));
                    steps.push(step);
                }
            }
        }

        warn!(
            target: AGENT_LOG_TARGET,
            "Linking agent reached max_steps ({}) without a final answer",
            self.config.max_steps
        );
        Err(AgentError::StepBudgetExhausted(self.config.max_steps))
    }
}

fn parse_reply(content: &str, step_number: usize) -> AgentReply {
    let cleaned = clean_json_response(content);
    let parsed = match serde_json::from_str::<JsonValue>(&cleaned) {
        Ok(JsonValue::Object(map)) => map,
        _ => {
            debug!(target: AGENT_LOG_TARGET, "Reply is not a JSON object, treating it as final text");
            return AgentReply::Final {
                reasoning: None,
                result: AgentResult::Text(content.to_string()),
            };
        }
    };

    let reasoning = parsed
        .get("reasoning")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    if let Some(tool_call) = parsed.get("tool_call").and_then(JsonValue::as_object) {
        if let Some(name) = tool_call.get("tool_name").and_then(JsonValue::as_str) {
            let params = tool_call
                .get("parameters")
                .cloned()
                .unwrap_or_else(|| json!({}));
            return AgentReply::ToolCall {
                reasoning,
                name: name.to_string(),
                params,
            };
        }
    }

    let is_final = parsed
        .get("is_final")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);

    if let Some(answer) = parsed.get("final_answer").filter(|v| !v.is_null()) {
        let result = match answer {
            JsonValue::String(text) => AgentResult::RunOutput {
                output: text.clone(),
                steps: step_number,
            },
            other => AgentResult::Structured(other.clone()),
        };
        return AgentReply::Final { reasoning, result };
    }

    if parsed.contains_key("actions") {
        return AgentReply::Final {
            reasoning,
            result: AgentResult::Structured(JsonValue::Object(parsed)),
        };
    }

    if is_final {
        let output = reasoning.clone().unwrap_or_default();
        return AgentReply::Final {
            reasoning,
            result: AgentResult::RunOutput {
                output,
                steps: step_number,
            },
        };
    }

    AgentReply::Continue { reasoning }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call() {
        let reply = parse_reply(
            r#"{"reasoning": "look", "tool_call": {"tool_name": "find_equipment_in_text", "parameters": {"text": "x", "equipment_names": []}}, "is_final": false}"#,
            1,
        );
        match reply {
            AgentReply::ToolCall { name, params, .. } => {
                assert_eq!(name, "find_equipment_in_text");
                assert_eq!(params["text"], "x");
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_parse_fenced_final_answer_object() {
        let reply = parse_reply(
            "```json\n{\"tool_call\": null, \"is_final\": true, \"final_answer\": {\"actions\": []}}\n```",
            3,
        );
        assert_eq!(
            reply,
            AgentReply::Final {
                reasoning: None,
                result: AgentResult::Structured(json!({"actions": []})),
            }
        );
    }

    #[test]
    fn test_parse_final_answer_string_is_run_output() {
        let reply = parse_reply(
            r#"{"is_final": true, "final_answer": "Done: {\"actions\": []}"}"#,
            4,
        );
        match reply {
            AgentReply::Final {
                result: AgentResult::RunOutput { output, steps },
                ..
            } => {
                assert!(output.starts_with("Done"));
                assert_eq!(steps, 4);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_parse_plain_text_is_final_text() {
        let reply = parse_reply("I could not find anything useful.", 1);
        assert!(matches!(
            reply,
            AgentReply::Final {
                result: AgentResult::Text(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_bare_actions_object() {
        let reply = parse_reply(r#"{"actions": [{"name": "mix"}]}"#, 2);
        assert!(matches!(
            reply,
            AgentReply::Final {
                result: AgentResult::Structured(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_reasoning_only_continues() {
        let reply = parse_reply(r#"{"reasoning": "thinking", "is_final": false}"#, 1);
        assert_eq!(
            reply,
            AgentReply::Continue {
                reasoning: Some("thinking".to_string())
            }
        );
    }

    #[test]
    fn test_action_values_from_each_variant() {
        let structured = AgentResult::Structured(json!({"actions": [{"name": "mix"}]}));
        assert_eq!(structured.into_action_values().len(), 1);

        let run = AgentResult::RunOutput {
            output: r#"Result: {"actions": [{"name": "a"}, {"name": "b"}]}"#.to_string(),
            steps: 2,
        };
        assert_eq!(run.into_action_values().len(), 2);

        let text = AgentResult::Text("nothing here".to_string());
        assert!(text.into_action_values().is_empty());

        let broken = AgentResult::Text("{\"actions\": [oops".to_string());
        assert!(broken.into_action_values().is_empty());
    }
}
