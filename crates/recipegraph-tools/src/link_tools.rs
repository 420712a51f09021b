// ABOUTME: Pure functions the linking agent calls to match names and clean up actions
// ABOUTME: Case-insensitive substring matching plus the action link filter and shape normalizer

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const UNKNOWN_ACTION_NAME: &str = "unknown_action";

fn find_names_in_text(text: &str, names: &[String]) -> Vec<String> {
    let haystack = text.to_lowercase();
    names
        .iter()
        .filter(|name| !name.trim().is_empty() && haystack.contains(&name.to_lowercase()))
        .cloned()
        .collect()
}

/// Ingredient names that occur in `text`, in catalog order.
pub fn find_ingredients_in_text(text: &str, ingredient_names: &[String]) -> Vec<String> {
    find_names_in_text(text, ingredient_names)
}

/// Equipment names that occur in `text`, in catalog order.
pub fn find_equipment_in_text(text: &str, equipment_names: &[String]) -> Vec<String> {
    find_names_in_text(text, equipment_names)
}

fn has_ingredient_links(action: &JsonValue) -> bool {
    match action.get("ingredient_ids") {
        Some(JsonValue::Array(ids)) => !ids.is_empty(),
        Some(JsonValue::String(id)) => !id.is_empty(),
        _ => false,
    }
}

fn has_equipment_link(action: &JsonValue) -> bool {
    match action.get("equipment_id") {
        Some(JsonValue::String(id)) => !id.is_empty(),
        Some(JsonValue::Array(ids)) => !ids.is_empty(),
        _ => false,
    }
}

/// Keep only actions with at least one ingredient or an equipment reference.
pub fn filter_actions_with_links(actions: &[JsonValue]) -> Vec<JsonValue> {
    actions
        .iter()
        .filter(|action| has_ingredient_links(action) || has_equipment_link(action))
        .cloned()
        .collect()
}

/// An action dictionary with guaranteed field types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ingredient_ids: Vec<String>,
    pub equipment_id: Option<String>,
}

impl NormalizedAction {
    pub fn is_linked(&self) -> bool {
        !self.ingredient_ids.is_empty() || self.equipment_id.is_some()
    }
}

fn id_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce one action into [`NormalizedAction`]; non-objects yield `None`.
///
/// A missing name becomes `unknown_action`, a single string id becomes a
/// one-element list and a list-valued equipment id keeps its first entry.
pub fn normalize_action_shape(action: &JsonValue) -> Option<NormalizedAction> {
    let object = action.as_object()?;

    let name = object
        .get("name")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_ACTION_NAME)
        .to_string();

    let description = object
        .get("description")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();

    let ingredient_ids = match object.get("ingredient_ids") {
        Some(JsonValue::Array(ids)) => ids.iter().filter_map(id_string).collect(),
        Some(JsonValue::String(id)) if !id.is_empty() => vec![id.clone()],
        _ => Vec::new(),
    };

    let equipment_id = match object.get("equipment_id") {
        Some(JsonValue::Array(ids)) => ids.first().and_then(id_string),
        Some(other) => id_string(other),
        None => None,
    };

    Some(NormalizedAction {
        name,
        description,
        ingredient_ids,
        equipment_id,
    })
}

pub fn normalize_actions(actions: &[JsonValue]) -> Vec<NormalizedAction> {
    actions.iter().filter_map(normalize_action_shape).collect()
}
