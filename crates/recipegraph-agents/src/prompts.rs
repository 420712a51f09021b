// ABOUTME: Prompt text for both passes of recipe analysis
// ABOUTME: Fixed extraction preamble, the linking agent's protocol prompt and the per-recipe linking task

use recipegraph_core::RecipeSession;
use recipegraph_parser::SentenceContext;
use recipegraph_tools::ToolSchema;
use serde_json::{json, Value as JsonValue};

/// Role preamble shared by both passes
pub const BRIEFING: &str = r#"You are a kitchen operations GURU, who excels at planning any and all things kitchen logistics.

You have been tasked with helping home chefs plan their meal prep for a given recipe.

You take the utmost care to provide solid, well-reasoned advice, and always check your work before responding."#;

/// Pass 1 instructions; the recipe text is appended after this block.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"Now, you will assist one such chef by parsing the ingredients, the equipment and the cooking actions from the recipe.

Return ONE JSON object and nothing else, with this structure:
{
  "ingredients": [
    {"name": "flour", "amount": 3, "unit": "cups", "modifiers": ["all-purpose"]}
  ],
  "equipment": [
    {"name": "Stand mixer", "required": false, "modifiers": "dough hook attachment"}
  ],
  "basic_actions": [
    {"verb": "combine", "sentence": "In a large mixing bowl, combine the flour and salt.", "sentence_index": 0}
  ]
}

Rules:
- "amount" is a number or null, "unit" is a string or null, "modifiers" is a list of strings.
- "required" is true unless the recipe says the equipment is optional.
- One basic action per cooking verb, with the sentence it appears in and that sentence's 0-based position in the recipe.
- Double-check that you haven't missed any ingredients or equipment from the raw text.

IMPORTANT:
* DO NOT ADD ANY STEPS TO THE USER'S TEXT.

Now, please parse the following recipe:
"#;

pub fn extraction_prompt(recipe_text: &str) -> String {
    format!("{BRIEFING}\n\n{EXTRACTION_INSTRUCTIONS}{recipe_text}")
}

/// System prompt for the linking agent: tools plus the reply protocol.
pub fn linking_system_prompt(tools: &[ToolSchema]) -> String {
    let tools_json = serde_json::to_string_pretty(tools).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a recipe analysis expert. Your task is to link pre-identified cooking verbs \
         to specific ingredients and equipment.\n\n\
         AVAILABLE TOOLS:\n\
         {tools_json}\n\n\
         RESPONSE FORMAT (JSON ONLY):\n\
         To call a tool:\n\
         {{\n  \
           \"reasoning\": \"What you are doing next\",\n  \
           \"tool_call\": {{\"tool_name\": \"find_ingredients_in_text\", \"parameters\": {{ ... }}}},\n  \
           \"is_final\": false\n\
         }}\n\n\
         When you are done:\n\
         {{\n  \
           \"reasoning\": \"Short summary\",\n  \
           \"tool_call\": null,\n  \
           \"is_final\": true,\n  \
           \"final_answer\": {{\"actions\": [ ... ]}}\n\
         }}\n\n\
         Tool results arrive as messages starting with \"Observation:\". \
         Make one tool call per reply."
    )
}

fn catalog(entries: impl Iterator<Item = (String, String)>) -> JsonValue {
    JsonValue::Array(
        entries
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect(),
    )
}

/// The per-recipe linking task handed to the agent as its first user message.
pub fn linking_task(session: &RecipeSession, context: &SentenceContext) -> String {
    let basic_actions = JsonValue::Array(
        session
            .basic_actions()
            .iter()
            .map(|ba| {
                let mut window = context.window(ba.sentence_index);
                if window.is_empty() {
                    window = ba.sentence.clone();
                }
                json!({
                    "verb": ba.verb,
                    "sentence": ba.sentence,
                    "sentence_index": ba.sentence_index,
                    "context": window,
                })
            })
            .collect(),
    );
    let ingredients = catalog(
        session
            .ingredients()
            .iter()
            .map(|i| (i.id.to_string(), i.name.clone())),
    );
    let equipment = catalog(
        session
            .equipment()
            .iter()
            .map(|e| (e.id.to_string(), e.name.clone())),
    );
    let sentences = serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());
    let pretty = |value: &JsonValue| {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    };

    format!(
        "=== The original Recipe ===\n\
         {raw}\n\
         === end original recipe ===\n\n\
         AVAILABLE INGREDIENTS (id + name):\n{ingredients}\n\n\
         AVAILABLE EQUIPMENT (id + name):\n{equipment}\n\n\
         BASIC ACTIONS (identified, but not yet associated with ingredients nor equipment):\n{actions}\n\n\
         SENTENCES (sentence_index -> sentence):\n{sentences}\n\n\
         Your goal: return a JSON object with this structure:\n\
         {{\n  \"actions\": [\n    {{\n      \"name\": \"action_verb\",\n      \
         \"ingredient_ids\": [\"id1\", \"id2\"],\n      \"equipment_id\": \"equipment_id\"\n    }}\n  ]\n}}\n\n\
         Steps:\n\
         1. For each basic action, take its \"context\" field: its own sentence plus the two preceding \
         sentences (sentence_index - 1 and sentence_index - 2, skipping indices below 0).\n\
         2. Search that context for names:\n   \
            - find_ingredients_in_text(text=context, ingredient_names=all ingredient names)\n   \
            - find_equipment_in_text(text=context, equipment_names=all equipment names)\n   \
            A name matches when its lowercase form appears anywhere in the lowercase context.\n\
         3. Create action objects linking each verb to the ids of the matched ingredients and equipment.\n\
         4. Call filter_actions_with_links(actions=...) to drop actions without any link.\n\
         5. OUTPUT FINAL JSON: {{\"actions\": [filtered actions]}} as your final_answer.\n\n\
         Use ids from the catalogs above, never names, in ingredient_ids and equipment_id.",
        raw = session.raw_text(),
        ingredients = pretty(&ingredients),
        equipment = pretty(&equipment),
        actions = pretty(&basic_actions),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipegraph_core::{BasicAction, Equipment, Ingredient};
    use recipegraph_tools::LinkToolSchemas;

    #[test]
    fn test_extraction_prompt_ends_with_recipe() {
        let prompt = extraction_prompt("Mix flour.");
        assert!(prompt.starts_with(BRIEFING));
        assert!(prompt.contains("\"basic_actions\""));
        assert!(prompt.ends_with("Mix flour."));
    }

    #[test]
    fn test_system_prompt_lists_every_tool() {
        let prompt = linking_system_prompt(&LinkToolSchemas::all());
        for name in LinkToolSchemas::tool_names() {
            assert!(prompt.contains(&name), "missing {name}");
        }
        assert!(prompt.contains("final_answer"));
    }

    #[test]
    fn test_linking_task_carries_catalogs_and_context() {
        let flour = Ingredient::new("flour", Some(2.0), Some("cups".into()), vec![]).unwrap();
        let bowl = Equipment::new("bowl", true, None).unwrap();
        let session = RecipeSession::from_parts(
            "Mix flour in a bowl.",
            vec![flour.clone()],
            vec![bowl.clone()],
            vec![BasicAction::new("mix", "Mix flour in a bowl.", 0).unwrap()],
            vec![],
        );
        let context = SentenceContext::from_sentences(vec!["Mix flour in a bowl.".to_string()]);

        let task = linking_task(&session, &context);
        assert!(task.contains(flour.id.as_str()));
        assert!(task.contains(bowl.id.as_str()));
        assert!(task.contains("\"sentence_index\": 0"));
        assert!(task.contains("\"0\": \"Mix flour in a bowl.\""));
        assert!(task.contains("sentence_index - 2"));
    }

    #[test]
    fn test_basic_actions_carry_their_context_window() {
        let flour = Ingredient::new("flour", None, None, vec![]).unwrap();
        let sentences = ["Sift the flour.", "Add salt.", "Crack two eggs.", "Whisk well."];
        let session = RecipeSession::from_parts(
            sentences.join(" "),
            vec![flour],
            vec![],
            vec![
                BasicAction::new("sift", sentences[0], 0).unwrap(),
                BasicAction::new("whisk", sentences[3], 3).unwrap(),
                BasicAction::new("fold", "Fold gently.", 9).unwrap(),
            ],
            vec![],
        );
        let context = SentenceContext::from_sentences(sentences.iter().map(|s| s.to_string()));

        let task = linking_task(&session, &context);
        assert!(task.contains("\"context\": \"Sift the flour.\""));
        assert!(task.contains("\"context\": \"Add salt. Crack two eggs. Whisk well.\""));
        assert!(task.contains("\"context\": \"Fold gently.\""));
    }
}
