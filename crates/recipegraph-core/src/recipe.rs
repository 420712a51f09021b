use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::DomainError;

/// Opaque identity shared by ingredients, equipment and actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Placeholder shown wherever an id no longer resolves to an entity.
pub const UNKNOWN_ENTITY: &str = "Unknown";

fn as_object<'a>(value: &'a Value, entity: &'static str) -> Result<&'a Map<String, Value>, DomainError> {
    value.as_object().ok_or(DomainError::NotAnObject { entity })
}

fn required_str(
    map: &Map<String, Value>,
    entity: &'static str,
    field: &'static str,
) -> Result<String, DomainError> {
    match map.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(DomainError::EmptyField { entity, field })
        }
        Some(other) => Err(DomainError::InvalidField {
            entity,
            field,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

fn optional_str(
    map: &Map<String, Value>,
    entity: &'static str,
    field: &'static str,
) -> Result<Option<String>, DomainError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(DomainError::InvalidField {
            entity,
            field,
            reason: format!("expected a string or null, got {other}"),
        }),
    }
}

fn string_list(
    map: &Map<String, Value>,
    entity: &'static str,
    field: &'static str,
) -> Result<Vec<String>, DomainError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(DomainError::InvalidField {
                    entity,
                    field,
                    reason: format!("list member {other} is not a string"),
                }),
            })
            .collect(),
        Some(other) => Err(DomainError::InvalidField {
            entity,
            field,
            reason: format!("expected a list of strings, got {other}"),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: EntityId,
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub modifiers: Vec<String>,
    pub raw_text: String,
}

impl Ingredient {
    /// Build an ingredient; `raw_text` is always derived from the parts.
    pub fn new(
        name: impl Into<String>,
        amount: Option<f64>,
        unit: Option<String>,
        modifiers: Vec<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::EmptyField {
                entity: "ingredient",
                field: "name",
            });
        }
        if let Some(amount) = amount {
            if !amount.is_finite() {
                return Err(DomainError::InvalidField {
                    entity: "ingredient",
                    field: "amount",
                    reason: format!("{amount} is not a finite number"),
                });
            }
        }
        let unit = unit.filter(|u| !u.trim().is_empty());
        let raw_text = reconstruct_raw_text(amount, unit.as_deref(), &name, &modifiers);

        Ok(Self {
            id: EntityId::generate(),
            name,
            amount,
            unit,
            modifiers,
            raw_text,
        })
    }

    /// Strict conversion of a single JSON object. Any field of the wrong
    /// type is an error; use the tolerant batch converter for model output.
    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        let map = as_object(value, "ingredient")?;
        let name = required_str(map, "ingredient", "name")?;
        let amount = match map.get("amount") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(other) => {
                return Err(DomainError::InvalidField {
                    entity: "ingredient",
                    field: "amount",
                    reason: format!("expected a number or null, got {other}"),
                })
            }
        };
        let unit = optional_str(map, "ingredient", "unit")?;
        let modifiers = string_list(map, "ingredient", "modifiers")?;

        Self::new(name, amount, unit, modifiers)
    }
}

/// Space-joins the non-empty parts in the order amount, unit, name, modifiers.
pub fn reconstruct_raw_text(
    amount: Option<f64>,
    unit: Option<&str>,
    name: &str,
    modifiers: &[String],
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3 + modifiers.len());
    if let Some(amount) = amount {
        parts.push(amount.to_string());
    }
    if let Some(unit) = unit {
        parts.push(unit.to_string());
    }
    parts.push(name.to_string());
    parts.extend(modifiers.iter().cloned());

    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EntityId,
    pub name: String,
    pub required: bool,
    /// Short free-text annotation such as "preheated to 350°F".
    pub modifiers: Option<String>,
}

impl Equipment {
    pub fn new(
        name: impl Into<String>,
        required: bool,
        modifiers: Option<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::EmptyField {
                entity: "equipment",
                field: "name",
            });
        }
        Ok(Self {
            id: EntityId::generate(),
            name,
            required,
            modifiers,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        let map = as_object(value, "equipment")?;
        let name = required_str(map, "equipment", "name")?;
        let required = match map.get("required") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(DomainError::InvalidField {
                    entity: "equipment",
                    field: "required",
                    reason: format!("expected a boolean, got {other}"),
                })
            }
        };
        let modifiers = optional_str(map, "equipment", "modifiers")?;

        Self::new(name, required, modifiers)
    }
}

/// A cooking verb found in a sentence, not yet linked to anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAction {
    pub verb: String,
    pub sentence: String,
    pub sentence_index: usize,
}

impl BasicAction {
    pub fn new(
        verb: impl Into<String>,
        sentence: impl Into<String>,
        sentence_index: usize,
    ) -> Result<Self, DomainError> {
        let verb = verb.into().trim().to_string();
        if verb.is_empty() {
            return Err(DomainError::EmptyField {
                entity: "basic_action",
                field: "verb",
            });
        }
        Ok(Self {
            verb,
            sentence: sentence.into(),
            sentence_index,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        let map = as_object(value, "basic_action")?;
        let verb = required_str(map, "basic_action", "verb")?;
        let sentence = optional_str(map, "basic_action", "sentence")?.unwrap_or_default();
        let sentence_index = match map.get("sentence_index") {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(index) => index as usize,
                None => {
                    return Err(DomainError::InvalidField {
                        entity: "basic_action",
                        field: "sentence_index",
                        reason: format!("{n} is not a non-negative integer"),
                    })
                }
            },
            Some(other) => {
                return Err(DomainError::InvalidField {
                    entity: "basic_action",
                    field: "sentence_index",
                    reason: format!("expected an integer, got {other}"),
                })
            }
        };

        Self::new(verb, sentence, sentence_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: EntityId,
    pub name: String,
    pub ingredient_ids: Vec<EntityId>,
    pub equipment_id: Option<EntityId>,
}

impl Action {
    /// Materialize an action. Empty ids are dropped; an action left with
    /// neither an ingredient nor an equipment reference is rejected.
    pub fn new(
        name: impl Into<String>,
        ingredient_ids: Vec<EntityId>,
        equipment_id: Option<EntityId>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::EmptyField {
                entity: "action",
                field: "name",
            });
        }
        let ingredient_ids: Vec<EntityId> = ingredient_ids
            .into_iter()
            .filter(|id| !id.is_empty())
            .collect();
        let equipment_id = equipment_id.filter(|id| !id.is_empty());

        if ingredient_ids.is_empty() && equipment_id.is_none() {
            return Err(DomainError::UnlinkedAction { name });
        }

        Ok(Self {
            id: EntityId::generate(),
            name,
            ingredient_ids,
            equipment_id,
        })
    }

    /// Strict conversion of `{"name", "ingredient_ids", "equipment_id"}`.
    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        let map = as_object(value, "action")?;
        let name = required_str(map, "action", "name")?;
        let ingredient_ids = string_list(map, "action", "ingredient_ids")?
            .into_iter()
            .map(EntityId::from)
            .collect();
        let equipment_id = optional_str(map, "action", "equipment_id")?.map(EntityId::from);

        Self::new(name, ingredient_ids, equipment_id)
    }

    pub fn has_links(&self) -> bool {
        !self.ingredient_ids.is_empty() || self.equipment_id.is_some()
    }
}
