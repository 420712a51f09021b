//! Tolerant conversion of Pass 1 model output into domain entities.
//!
//! Every item is converted independently: a malformed item is skipped and
//! recorded as a [`ConversionWarning`], never turned into an error.

use recipegraph_core::{BasicAction, Equipment, Ingredient};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionWarning {
    /// "ingredients", "equipment", "basic_actions" or "document"
    pub section: &'static str,
    /// Position of the offending item inside its section
    pub index: Option<usize>,
    pub message: String,
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]: {}", self.section, index, self.message),
            None => write!(f, "{}: {}", self.section, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedEntities {
    pub ingredients: Vec<Ingredient>,
    pub equipment: Vec<Equipment>,
    pub basic_actions: Vec<BasicAction>,
    pub warnings: Vec<ConversionWarning>,
}

impl ConvertedEntities {
    pub fn total_entities(&self) -> usize {
        self.ingredients.len() + self.equipment.len() + self.basic_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entities() == 0
    }

    fn warn(&mut self, section: &'static str, index: Option<usize>, message: impl Into<String>) {
        let warning = ConversionWarning {
            section,
            index,
            message: message.into(),
        };
        warn!("Entity conversion: {}", warning);
        self.warnings.push(warning);
    }
}

/// Convert a decoded model response into entities. Never fails.
pub fn convert_entities(document: &Value) -> ConvertedEntities {
    let mut converted = ConvertedEntities::default();

    let Some(map) = document.as_object() else {
        converted.warn(
            "document",
            None,
            format!("expected a JSON object, got {}", type_name(document)),
        );
        return converted;
    };

    debug!(
        "Parsed JSON contains keys: {:?}",
        map.keys().collect::<Vec<_>>()
    );

    for (index, item) in section(&mut converted, map, "ingredients").iter().enumerate() {
        if let Some(ingredient) = convert_ingredient(&mut converted, index, item) {
            converted.ingredients.push(ingredient);
        }
    }

    for (index, item) in section(&mut converted, map, "equipment").iter().enumerate() {
        if let Some(equipment) = convert_equipment(&mut converted, index, item) {
            converted.equipment.push(equipment);
        }
    }

    for (index, item) in section(&mut converted, map, "basic_actions").iter().enumerate() {
        if let Some(basic_action) = convert_basic_action(&mut converted, index, item) {
            converted.basic_actions.push(basic_action);
        }
    }

    debug!(
        "Converted {} ingredients, {} equipment, {} basic actions ({} warnings)",
        converted.ingredients.len(),
        converted.equipment.len(),
        converted.basic_actions.len(),
        converted.warnings.len()
    );

    converted
}

fn section<'a>(
    converted: &mut ConvertedEntities,
    map: &'a Map<String, Value>,
    name: &'static str,
) -> &'a [Value] {
    match map.get(name) {
        Some(Value::Array(items)) => items,
        None => {
            converted.warn(name, None, "missing, treated as empty");
            &[]
        }
        Some(other) => {
            converted.warn(
                name,
                None,
                format!("must be an array, got {}", type_name(other)),
            );
            &[]
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn item_object<'a>(
    converted: &mut ConvertedEntities,
    section: &'static str,
    index: usize,
    item: &'a Value,
) -> Option<&'a Map<String, Value>> {
    let object = item.as_object();
    if object.is_none() {
        converted.warn(
            section,
            Some(index),
            format!("skipped {} item, expected an object", type_name(item)),
        );
    }
    object
}

fn string_field(
    converted: &mut ConvertedEntities,
    section: &'static str,
    index: usize,
    item: &Map<String, Value>,
    field: &str,
) -> Option<String> {
    match item.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        None | Some(Value::Null) => Some(String::new()),
        Some(other) => {
            converted.warn(
                section,
                Some(index),
                format!("skipped, '{}' is a {}", field, type_name(other)),
            );
            None
        }
    }
}

fn convert_ingredient(
    converted: &mut ConvertedEntities,
    index: usize,
    item: &Value,
) -> Option<Ingredient> {
    const SECTION: &str = "ingredients";
    let item = item_object(converted, SECTION, index, item)?;
    let name = string_field(converted, SECTION, index, item, "name")?;

    let modifiers = match item.get("modifiers") {
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    let amount = match item.get("amount") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => {
            let parsed = parse_amount(s);
            if parsed.is_none() {
                converted.warn(SECTION, Some(index), "unparseable amount dropped");
            }
            parsed
        }
        Some(other) => {
            converted.warn(
                SECTION,
                Some(index),
                format!("amount of type {} dropped", type_name(other)),
            );
            None
        }
    };

    let unit = match item.get("unit") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        None | Some(Value::Null) | Some(Value::String(_)) => None,
        Some(other) => {
            converted.warn(
                SECTION,
                Some(index),
                format!("unit of type {} dropped", type_name(other)),
            );
            None
        }
    };

    match Ingredient::new(name, amount, unit, modifiers) {
        Ok(ingredient) => Some(ingredient),
        Err(e) => {
            converted.warn(SECTION, Some(index), format!("skipped: {e}"));
            None
        }
    }
}

fn convert_equipment(
    converted: &mut ConvertedEntities,
    index: usize,
    item: &Value,
) -> Option<Equipment> {
    const SECTION: &str = "equipment";
    let item = item_object(converted, SECTION, index, item)?;
    let name = string_field(converted, SECTION, index, item, "name")?;

    let required = match item.get("required") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) if n.as_u64() == Some(0) => false,
        Some(Value::Number(n)) if n.as_u64() == Some(1) => true,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
        Some(other) => {
            converted.warn(
                SECTION,
                Some(index),
                format!("skipped, 'required' is not a boolean ({})", type_name(other)),
            );
            return None;
        }
    };

    let modifiers = match item.get("modifiers") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            converted.warn(
                SECTION,
                Some(index),
                format!("skipped, 'modifiers' must be a string, got {}", type_name(other)),
            );
            return None;
        }
    };

    match Equipment::new(name, required, modifiers) {
        Ok(equipment) => Some(equipment),
        Err(e) => {
            converted.warn(SECTION, Some(index), format!("skipped: {e}"));
            None
        }
    }
}

fn convert_basic_action(
    converted: &mut ConvertedEntities,
    index: usize,
    item: &Value,
) -> Option<BasicAction> {
    const SECTION: &str = "basic_actions";
    let item = item_object(converted, SECTION, index, item)?;
    let verb = string_field(converted, SECTION, index, item, "verb")?;
    let sentence = string_field(converted, SECTION, index, item, "sentence")?;

    let sentence_index = match item.get("sentence_index") {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_u64().map(|i| i as usize).or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as usize)
        }),
        Some(_) => None,
    };
    let Some(sentence_index) = sentence_index else {
        converted.warn(
            SECTION,
            Some(index),
            "skipped, 'sentence_index' must be a non-negative integer",
        );
        return None;
    };

    match BasicAction::new(verb, sentence, sentence_index) {
        Ok(basic_action) => Some(basic_action),
        Err(e) => {
            converted.warn(SECTION, Some(index), format!("skipped: {e}"));
            None
        }
    }
}

fn vulgar_fraction(c: char) -> Option<f64> {
    match c {
        '½' => Some(0.5),
        '⅓' => Some(1.0 / 3.0),
        '⅔' => Some(2.0 / 3.0),
        '¼' => Some(0.25),
        '¾' => Some(0.75),
        '⅛' => Some(0.125),
        _ => None,
    }
}

fn parse_quantity_token(token: &str) -> Option<f64> {
    if let Some((numerator, denominator)) = token.split_once('/') {
        let numerator: f64 = numerator.trim().parse().ok()?;
        let denominator: f64 = denominator.trim().parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }

    let mut chars = token.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        if let Some(value) = vulgar_fraction(only) {
            return Some(value);
        }
    }

    // "1½"
    if let Some(last) = token.chars().last() {
        if let Some(fraction) = vulgar_fraction(last) {
            let whole = &token[..token.len() - last.len_utf8()];
            return whole.parse::<f64>().ok().map(|w| w + fraction);
        }
    }

    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a quantity such as `"2"`, `"2.5"`, `"1/2"`, `"1 1/2"` or `"1½"`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [single] => parse_quantity_token(single),
        [whole, fraction] if fraction.contains('/') || fraction.chars().all(|c| vulgar_fraction(c).is_some()) => {
            let whole: f64 = whole.parse().ok()?;
            parse_quantity_token(fraction).map(|f| whole + f)
        }
        _ => None,
    }
}
