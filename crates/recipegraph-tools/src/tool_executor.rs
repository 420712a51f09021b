// ABOUTME: Executor for the dependency-linking tools
// ABOUTME: Validates tool names against the schemas, parses arguments and dispatches to the pure tools

use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

use crate::link_tools;
use crate::tool_schemas::LinkToolSchemas;

const TOOL_LOG_TARGET: &str = "recipegraph::tools";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing parameter '{parameter}' for tool {tool}")]
    MissingParameter { tool: String, parameter: String },

    #[error("Invalid parameter '{parameter}' for tool {tool}: {reason}")]
    InvalidParameter {
        tool: String,
        parameter: String,
        reason: String,
    },
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Dispatches tool calls from the agent loop. Tools are pure, so the
/// executor only keeps call counters.
#[derive(Debug, Default)]
pub struct LinkToolExecutor {
    total_calls: AtomicUsize,
    per_tool: Mutex<HashMap<String, usize>>,
}

impl LinkToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute(&self, tool_name: &str, parameters: JsonValue) -> ToolResult<JsonValue> {
        LinkToolSchemas::get_by_name(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .per_tool
            .lock()
            .entry(tool_name.to_string())
            .or_insert(0) += 1;

        debug!(target: TOOL_LOG_TARGET, tool = tool_name, "executing tool");

        let result = match tool_name {
            "find_ingredients_in_text" => {
                self.execute_find_names(tool_name, "ingredient_names", &parameters)?
            }
            "find_equipment_in_text" => {
                self.execute_find_names(tool_name, "equipment_names", &parameters)?
            }
            "filter_actions_with_links" => {
                self.execute_filter_actions_with_links(tool_name, &parameters)?
            }
            "normalize_action_shape" => {
                self.execute_normalize_action_shape(tool_name, &parameters)?
            }
            _ => return Err(ToolError::UnknownTool(tool_name.to_string())),
        };

        debug!(target: TOOL_LOG_TARGET, tool = tool_name, "tool finished");
        Ok(result)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, tool_name: &str) -> usize {
        self.per_tool.lock().get(tool_name).copied().unwrap_or(0)
    }

    fn execute_find_names(
        &self,
        tool: &str,
        names_key: &str,
        parameters: &JsonValue,
    ) -> ToolResult<JsonValue> {
        let text = parameters
            .get("text")
            .or_else(|| parameters.get("sentence"))
            .ok_or_else(|| missing(tool, "text"))?
            .as_str()
            .ok_or_else(|| invalid(tool, "text", "expected a string"))?;
        let names = string_array(tool, names_key, parameters)?;

        let found = if names_key == "ingredient_names" {
            link_tools::find_ingredients_in_text(text, &names)
        } else {
            link_tools::find_equipment_in_text(text, &names)
        };
        Ok(json!(found))
    }

    fn execute_filter_actions_with_links(
        &self,
        tool: &str,
        parameters: &JsonValue,
    ) -> ToolResult<JsonValue> {
        let actions = action_array(tool, parameters)?;
        Ok(JsonValue::Array(link_tools::filter_actions_with_links(
            actions,
        )))
    }

    fn execute_normalize_action_shape(
        &self,
        tool: &str,
        parameters: &JsonValue,
    ) -> ToolResult<JsonValue> {
        let actions = action_array(tool, parameters)?;
        let normalized = link_tools::normalize_actions(actions);
        serde_json::to_value(normalized).map_err(|e| invalid(tool, "actions", &e.to_string()))
    }
}

fn missing(tool: &str, parameter: &str) -> ToolError {
    ToolError::MissingParameter {
        tool: tool.to_string(),
        parameter: parameter.to_string(),
    }
}

fn invalid(tool: &str, parameter: &str, reason: &str) -> ToolError {
    ToolError::InvalidParameter {
        tool: tool.to_string(),
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    }
}

fn string_array(tool: &str, key: &str, parameters: &JsonValue) -> ToolResult<Vec<String>> {
    parameters
        .get(key)
        .ok_or_else(|| missing(tool, key))?
        .as_array()
        .ok_or_else(|| invalid(tool, key, "expected an array of strings"))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(tool, key, "expected an array of strings"))
        })
        .collect()
}

fn action_array<'a>(tool: &str, parameters: &'a JsonValue) -> ToolResult<&'a [JsonValue]> {
    parameters
        .get("actions")
        .ok_or_else(|| missing(tool, "actions"))?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| invalid(tool, "actions", "expected an array"))
}
