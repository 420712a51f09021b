use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::SessionError;
use crate::recipe::{Action, BasicAction, EntityId, Equipment, Ingredient, UNKNOWN_ENTITY};

/// Progress of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

/// Stage of the workflow, derived from the two pass statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingState {
    Initial,
    ParsingRecipe,
    ParsingDependencies,
    Completed,
    Error,
    DependenciesError,
}

impl ParsingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParsingState::Initial => "initial",
            ParsingState::ParsingRecipe => "parsing_recipe",
            ParsingState::ParsingDependencies => "parsing_dependencies",
            ParsingState::Completed => "completed",
            ParsingState::Error => "error",
            ParsingState::DependenciesError => "dependencies_error",
        }
    }
}

impl fmt::Display for ParsingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All state for one recipe as it moves through both passes.
///
/// Entities are only replaced wholesale by the transition methods; actions
/// refer to ingredients and equipment by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeSession {
    #[serde(default)]
    raw_text: String,
    #[serde(default)]
    ingredients: Vec<Ingredient>,
    #[serde(default)]
    equipment: Vec<Equipment>,
    #[serde(default)]
    basic_actions: Vec<BasicAction>,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    extraction_status: PhaseStatus,
    #[serde(default)]
    linking_status: PhaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fatal_error: Option<String>,
}

impl RecipeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session whose extraction already finished with the given entities.
    pub fn from_parts(
        raw_text: impl Into<String>,
        ingredients: Vec<Ingredient>,
        equipment: Vec<Equipment>,
        basic_actions: Vec<BasicAction>,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            ingredients,
            equipment,
            basic_actions,
            actions,
            extraction_status: PhaseStatus::Done,
            linking_status: PhaseStatus::Pending,
            fatal_error: None,
        }
    }

    pub fn parsing_state(&self) -> ParsingState {
        if self.fatal_error.is_some() {
            return ParsingState::Error;
        }
        match (self.extraction_status, self.linking_status) {
            (PhaseStatus::Pending | PhaseStatus::Failed, _) => ParsingState::Initial,
            (PhaseStatus::Running, _) => ParsingState::ParsingRecipe,
            (PhaseStatus::Done, PhaseStatus::Pending | PhaseStatus::Done) => {
                ParsingState::Completed
            }
            (PhaseStatus::Done, PhaseStatus::Running) => ParsingState::ParsingDependencies,
            (PhaseStatus::Done, PhaseStatus::Failed) => ParsingState::DependenciesError,
        }
    }

    pub fn extraction_status(&self) -> PhaseStatus {
        self.extraction_status
    }

    pub fn linking_status(&self) -> PhaseStatus {
        self.linking_status
    }

    pub fn fatal_error(&self) -> Option<&str> {
        self.fatal_error.as_deref()
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    pub fn basic_actions(&self) -> &[BasicAction] {
        &self.basic_actions
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    fn ensure_not_terminal(&self) -> Result<(), SessionError> {
        match &self.fatal_error {
            Some(reason) => Err(SessionError::Terminal(reason.clone())),
            None => Ok(()),
        }
    }

    fn invalid(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.parsing_state(),
            event,
        }
    }

    /// Start Pass 1. Previous entities are discarded.
    pub fn begin_extraction(&mut self, raw_text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_not_terminal()?;
        if self.extraction_status == PhaseStatus::Running
            || self.linking_status == PhaseStatus::Running
        {
            return Err(self.invalid("begin extraction"));
        }
        self.raw_text = raw_text.into();
        self.ingredients.clear();
        self.equipment.clear();
        self.basic_actions.clear();
        self.actions.clear();
        self.extraction_status = PhaseStatus::Running;
        self.linking_status = PhaseStatus::Pending;
        Ok(())
    }

    pub fn finish_extraction(
        &mut self,
        ingredients: Vec<Ingredient>,
        equipment: Vec<Equipment>,
        basic_actions: Vec<BasicAction>,
    ) -> Result<(), SessionError> {
        self.ensure_not_terminal()?;
        if self.extraction_status != PhaseStatus::Running {
            return Err(self.invalid("finish extraction"));
        }
        self.ingredients = ingredients;
        self.equipment = equipment;
        self.basic_actions = basic_actions;
        self.extraction_status = PhaseStatus::Done;
        Ok(())
    }

    /// Pass 1 failed softly; raw text is kept, entity lists are empty.
    pub fn fail_extraction(&mut self) -> Result<(), SessionError> {
        self.ensure_not_terminal()?;
        if self.extraction_status != PhaseStatus::Running {
            return Err(self.invalid("fail extraction"));
        }
        self.ingredients.clear();
        self.equipment.clear();
        self.basic_actions.clear();
        self.extraction_status = PhaseStatus::Failed;
        Ok(())
    }

    /// Start Pass 2. Allowed from `Completed` and, as a retry, from
    /// `DependenciesError`.
    pub fn begin_linking(&mut self) -> Result<(), SessionError> {
        self.ensure_not_terminal()?;
        match self.parsing_state() {
            ParsingState::Completed | ParsingState::DependenciesError => {
                self.linking_status = PhaseStatus::Running;
                Ok(())
            }
            _ => Err(self.invalid("begin linking")),
        }
    }

    /// Replace the actions wholesale and complete the session.
    pub fn finish_linking(&mut self, actions: Vec<Action>) -> Result<(), SessionError> {
        self.ensure_not_terminal()?;
        if self.linking_status != PhaseStatus::Running {
            return Err(self.invalid("finish linking"));
        }
        self.actions = actions;
        self.linking_status = PhaseStatus::Done;
        Ok(())
    }

    /// Pass 2 failed; all entities are left untouched.
    pub fn fail_linking(&mut self) -> Result<(), SessionError> {
        self.ensure_not_terminal()?;
        if self.linking_status != PhaseStatus::Running {
            return Err(self.invalid("fail linking"));
        }
        self.linking_status = PhaseStatus::Failed;
        Ok(())
    }

    /// Enter the terminal `Error` stage. Only `clear` leaves it.
    pub fn mark_error(&mut self, reason: impl Into<String>) {
        self.fatal_error = Some(reason.into());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn has_parsed_data(&self) -> bool {
        !self.ingredients.is_empty() && !self.equipment.is_empty()
    }

    /// Pass 2 needs verbs to link and at least one thing to link them to.
    pub fn is_ready_for_linking(&self) -> bool {
        !self.basic_actions.is_empty()
            && (!self.ingredients.is_empty() || !self.equipment.is_empty())
    }

    pub fn find_ingredient(&self, id: &EntityId) -> Option<&Ingredient> {
        self.ingredients.iter().find(|ingredient| &ingredient.id == id)
    }

    pub fn find_equipment(&self, id: &EntityId) -> Option<&Equipment> {
        self.equipment.iter().find(|equipment| &equipment.id == id)
    }

    pub fn ingredient_name_or_unknown(&self, id: &EntityId) -> &str {
        self.find_ingredient(id)
            .map(|ingredient| ingredient.name.as_str())
            .unwrap_or(UNKNOWN_ENTITY)
    }

    pub fn equipment_name_or_unknown(&self, id: &EntityId) -> &str {
        self.find_equipment(id)
            .map(|equipment| equipment.name.as_str())
            .unwrap_or(UNKNOWN_ENTITY)
    }

    /// Full JSON dump of the session including the derived stage.
    pub fn snapshot(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert(
                "parsing_state".to_string(),
                Value::String(self.parsing_state().as_str().to_string()),
            );
        }
        value
    }

    pub fn format_ingredients_for_display(&self) -> String {
        if self.ingredients.is_empty() {
            return "No ingredients parsed yet.".to_string();
        }

        bullet_list(self.ingredients.iter().map(|ingredient| {
            let mut parts = Vec::new();
            if let Some(amount) = ingredient.amount.filter(|a| *a != 0.0) {
                parts.push(amount.to_string());
            }
            if let Some(unit) = &ingredient.unit {
                parts.push(unit.clone());
            }
            parts.push(ingredient.name.clone());
            if !ingredient.modifiers.is_empty() {
                parts.push(format!("({})", ingredient.modifiers.join(", ")));
            }
            parts.join(" ")
        }))
    }

    pub fn format_equipment_for_display(&self) -> String {
        if self.equipment.is_empty() {
            return "No equipment parsed yet.".to_string();
        }

        bullet_list(self.equipment.iter().map(|equipment| {
            let mut display = equipment.name.clone();
            if let Some(modifiers) = equipment.modifiers.as_deref().filter(|m| !m.is_empty()) {
                display.push_str(&format!(" ({modifiers})"));
            }
            if equipment.required {
                display.push_str(" [required]");
            }
            display
        }))
    }

    pub fn format_basic_actions_for_display(&self) -> String {
        if self.basic_actions.is_empty() {
            return "No basic actions parsed yet.".to_string();
        }

        bullet_list(self.basic_actions.iter().map(|basic| {
            let excerpt: String = basic.sentence.chars().take(80).collect();
            format!("'{}' in: {}...", basic.verb, excerpt)
        }))
    }

    pub fn format_actions_for_display(&self) -> String {
        if self.actions.is_empty() {
            return "No actions parsed yet.".to_string();
        }

        bullet_list(self.actions.iter().map(|action| {
            let mut parts = vec![format!("Action: {}", action.name)];
            if !action.ingredient_ids.is_empty() {
                let names: Vec<&str> = self
                    .ingredients
                    .iter()
                    .filter(|ingredient| action.ingredient_ids.contains(&ingredient.id))
                    .map(|ingredient| ingredient.name.as_str())
                    .collect();
                parts.push(format!("Ingredients: {}", names.join(", ")));
            }
            if let Some(equipment_id) = &action.equipment_id {
                parts.push(format!(
                    "Equipment: {}",
                    self.equipment_name_or_unknown(equipment_id)
                ));
            }
            parts.join(" | ")
        }))
    }
}

fn bullet_list(items: impl Iterator<Item = String>) -> String {
    items
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
