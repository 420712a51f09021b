// ABOUTME: LLM tool schemas for the dependency-linking tools
// ABOUTME: JSON schemas listed in the agent's system prompt so the model knows names and parameters

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Tool schema for LLM function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: JsonValue,
}

/// Collection of all linking tool schemas
pub struct LinkToolSchemas;

impl LinkToolSchemas {
    pub fn all() -> Vec<ToolSchema> {
        vec![
            Self::find_ingredients_in_text(),
            Self::find_equipment_in_text(),
            Self::filter_actions_with_links(),
            Self::normalize_action_shape(),
        ]
    }

    pub fn find_ingredients_in_text() -> ToolSchema {
        ToolSchema {
            name: "find_ingredients_in_text".to_string(),
            description: "Find which of the given ingredient names appear in a sentence or context window. \
                Matching is a case-insensitive substring check; the original names are returned."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Sentence or context window to search"
                    },
                    "ingredient_names": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Candidate ingredient names from the recipe"
                    }
                },
                "required": ["text", "ingredient_names"]
            }),
        }
    }

    pub fn find_equipment_in_text() -> ToolSchema {
        ToolSchema {
            name: "find_equipment_in_text".to_string(),
            description: "Find which of the given equipment names appear in a sentence or context window. \
                Matching is a case-insensitive substring check; the original names are returned."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Sentence or context window to search"
                    },
                    "equipment_names": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Candidate equipment names from the recipe"
                    }
                },
                "required": ["text", "equipment_names"]
            }),
        }
    }

    pub fn filter_actions_with_links() -> ToolSchema {
        ToolSchema {
            name: "filter_actions_with_links".to_string(),
            description: "Drop actions that reference neither an ingredient nor a piece of equipment."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "actions": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Candidate actions with name, ingredient_ids and equipment_id"
                    }
                },
                "required": ["actions"]
            }),
        }
    }

    pub fn normalize_action_shape() -> ToolSchema {
        ToolSchema {
            name: "normalize_action_shape".to_string(),
            description: "Coerce candidate actions to {name, ingredient_ids: [string], equipment_id: string|null}. \
                Non-object entries are skipped."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "actions": {
                        "type": "array",
                        "description": "Candidate actions to normalize"
                    }
                },
                "required": ["actions"]
            }),
        }
    }

    pub fn get_by_name(name: &str) -> Option<ToolSchema> {
        Self::all().into_iter().find(|s| s.name == name)
    }

    pub fn tool_names() -> Vec<String> {
        Self::all().into_iter().map(|s| s.name).collect()
    }
}
