//! Pre-formatted hover text, one line per fact joined with `<br>`.

use recipegraph_core::{Action, Equipment, Ingredient, RecipeSession};

const LINE_BREAK: &str = "<br>";

pub fn ingredient_hover(ingredient: &Ingredient) -> String {
    let mut parts = vec![format!("<b>{}</b>", ingredient.name)];
    if let Some(amount) = ingredient.amount.filter(|a| *a != 0.0) {
        let mut amount_text = amount.to_string();
        if let Some(unit) = ingredient.unit.as_deref().filter(|u| !u.is_empty()) {
            amount_text.push(' ');
            amount_text.push_str(unit);
        }
        parts.push(format!("Amount: {amount_text}"));
    }
    if !ingredient.modifiers.is_empty() {
        parts.push(format!("Modifiers: {}", ingredient.modifiers.join(", ")));
    }
    parts.join(LINE_BREAK)
}

pub fn equipment_hover(equipment: &Equipment) -> String {
    let mut parts = vec![
        format!("<b>{}</b>", equipment.name),
        format!("Required: {}", if equipment.required { "Yes" } else { "No" }),
    ];
    if let Some(modifiers) = equipment.modifiers.as_deref().filter(|m| !m.is_empty()) {
        parts.push(format!("Modifiers: {modifiers}"));
    }
    parts.join(LINE_BREAK)
}

/// Names are resolved against the session; dangling ids show as "Unknown".
pub fn action_hover(action: &Action, session: &RecipeSession) -> String {
    let mut parts = vec![format!("<b>Action: {}</b>", action.name)];
    if !action.ingredient_ids.is_empty() {
        let names: Vec<&str> = action
            .ingredient_ids
            .iter()
            .map(|id| session.ingredient_name_or_unknown(id))
            .collect();
        parts.push(format!("Ingredients: {}", names.join(", ")));
    }
    if let Some(equipment_id) = &action.equipment_id {
        parts.push(format!(
            "Equipment: {}",
            session.equipment_name_or_unknown(equipment_id)
        ));
    }
    parts.join(LINE_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipegraph_core::EntityId;

    #[test]
    fn test_ingredient_hover() {
        let flour = Ingredient::new(
            "flour",
            Some(2.5),
            Some("cups".into()),
            vec!["sifted".into(), "all-purpose".into()],
        )
        .unwrap();
        assert_eq!(
            ingredient_hover(&flour),
            "<b>flour</b><br>Amount: 2.5 cups<br>Modifiers: sifted, all-purpose"
        );

        let salt = Ingredient::new("salt", None, None, vec![]).unwrap();
        assert_eq!(ingredient_hover(&salt), "<b>salt</b>");
    }

    #[test]
    fn test_equipment_hover() {
        let mixer = Equipment::new("Stand mixer", false, Some("dough hook".into())).unwrap();
        assert_eq!(
            equipment_hover(&mixer),
            "<b>Stand mixer</b><br>Required: No<br>Modifiers: dough hook"
        );
    }

    #[test]
    fn test_action_hover_with_dangling_references() {
        let flour = Ingredient::new("flour", None, None, vec![]).unwrap();
        let action = Action::new(
            "mix",
            vec![flour.id.clone(), EntityId::from("gone")],
            Some(EntityId::from("missing-bowl")),
        )
        .unwrap();
        let session = RecipeSession::from_parts("", vec![flour], vec![], vec![], vec![]);

        assert_eq!(
            action_hover(&action, &session),
            "<b>Action: mix</b><br>Ingredients: flour, Unknown<br>Equipment: Unknown"
        );
    }
}
