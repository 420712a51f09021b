mod common;

use common::{analyzer, final_answer, tool_call, Reply, ScriptedProvider, RECIPE};
use recipegraph_agents::{AgentConfig, DependencyLinker, PipelineError};
use recipegraph_core::{
    BasicAction, EntityId, Equipment, Ingredient, ParsingState, PhaseStatus, RecipeSession,
};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    session: RecipeSession,
    flour: EntityId,
    sugar: EntityId,
    bowl: EntityId,
    oven: EntityId,
}

fn fixture() -> Fixture {
    let flour = Ingredient::new("flour", Some(2.0), Some("cups".into()), vec![]).unwrap();
    let sugar = Ingredient::new("sugar", Some(0.5), Some("cup".into()), vec![]).unwrap();
    let oven = Equipment::new("oven", true, None).unwrap();
    let bowl = Equipment::new("bowl", true, Some("large".into())).unwrap();
    let basic_actions = vec![
        BasicAction::new("whisk", "In a large bowl, whisk the flour and sugar.", 1).unwrap(),
        BasicAction::new("bake", "Bake for 30 minutes.", 3).unwrap(),
    ];

    Fixture {
        flour: flour.id.clone(),
        sugar: sugar.id.clone(),
        bowl: bowl.id.clone(),
        oven: oven.id.clone(),
        session: RecipeSession::from_parts(
            RECIPE,
            vec![flour, sugar],
            vec![oven, bowl],
            basic_actions,
            vec![],
        ),
    }
}

fn linker(provider: Arc<ScriptedProvider>, max_steps: usize) -> DependencyLinker {
    DependencyLinker::new(
        provider,
        analyzer(),
        AgentConfig {
            max_steps,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_agent_links_actions_with_tools() {
    let mut fx = fixture();
    let answer = json!({"actions": [
        {"name": "whisk", "ingredient_ids": [fx.flour.as_str(), fx.sugar.as_str()], "equipment_id": fx.bowl.as_str()},
        {"name": "bake", "ingredient_ids": [], "equipment_id": fx.oven.as_str()},
        {"name": "rest", "ingredient_ids": [], "equipment_id": null}
    ]});
    let provider = ScriptedProvider::texts(&[
        &tool_call(
            "find_ingredients_in_text",
            json!({"text": "Preheat the oven to 350F. In a large bowl, whisk the flour and sugar.",
                   "ingredient_names": ["flour", "sugar"]}),
        ),
        &tool_call(
            "find_equipment_in_text",
            json!({"text": "In a large bowl, whisk the flour and sugar.", "equipment_names": ["oven", "bowl"]}),
        ),
        &tool_call("filter_actions_with_links", answer.clone()),
        &final_answer(answer),
    ]);
    let linker = linker(provider.clone(), 10);

    linker.link(&mut fx.session).await.unwrap();

    assert_eq!(fx.session.parsing_state(), ParsingState::Completed);
    assert_eq!(fx.session.linking_status(), PhaseStatus::Done);
    assert_eq!(provider.calls(), 4);
    assert_eq!(linker.executor().total_calls(), 3);

    let actions = fx.session.actions();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].name, "whisk");
    assert_eq!(actions[0].ingredient_ids, vec![fx.flour.clone(), fx.sugar.clone()]);
    assert_eq!(actions[0].equipment_id, Some(fx.bowl.clone()));
    assert_eq!(actions[1].equipment_id, Some(fx.oven.clone()));

    let conversations = provider.conversations();
    let second = conversations[1].last().unwrap();
    assert_eq!(second.content, r#"Observation: ["flour","sugar"]"#);
    let third = conversations[2].last().unwrap();
    assert_eq!(third.content, r#"Observation: ["bowl"]"#);
}

#[tokio::test]
async fn test_task_prompt_lists_catalog_ids() {
    let mut fx = fixture();
    let provider = ScriptedProvider::texts(&[&final_answer(json!({"actions": []}))]);
    linker(provider.clone(), 3).link(&mut fx.session).await.unwrap();

    let task = &provider.conversations()[0][1].content;
    assert!(task.contains(fx.flour.as_str()));
    assert!(task.contains(fx.oven.as_str()));
    assert!(task.contains("\"verb\": \"whisk\""));
    assert!(task.contains("\"3\": \"Bake for 30 minutes.\""));
    assert_eq!(fx.session.parsing_state(), ParsingState::Completed);
    assert!(fx.session.actions().is_empty());
}

#[tokio::test]
async fn test_not_ready_session_is_untouched() {
    let provider = ScriptedProvider::texts(&[]);
    let flour = Ingredient::new("flour", None, None, vec![]).unwrap();
    let mut session = RecipeSession::from_parts(RECIPE, vec![flour], vec![], vec![], vec![]);

    linker(provider.clone(), 5).link(&mut session).await.unwrap();

    assert_eq!(provider.calls(), 0);
    assert_eq!(session.parsing_state(), ParsingState::Completed);
    assert_eq!(session.linking_status(), PhaseStatus::Pending);
}

#[tokio::test]
async fn test_step_budget_exhaustion_then_retry() {
    let mut fx = fixture();
    let looping = tool_call(
        "find_ingredients_in_text",
        json!({"text": "flour", "ingredient_names": ["flour"]}),
    );
    let provider = ScriptedProvider::texts(&[&looping, &looping, &looping]);

    linker(provider.clone(), 2)
        .link(&mut fx.session)
        .await
        .unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(fx.session.parsing_state(), ParsingState::DependenciesError);
    assert_eq!(fx.session.ingredients().len(), 2);
    assert_eq!(fx.session.basic_actions().len(), 2);
    assert!(fx.session.actions().is_empty());

    let retry = ScriptedProvider::texts(&[&final_answer(json!({"actions": [
        {"name": "bake", "ingredient_ids": [], "equipment_id": fx.oven.as_str()}
    ]}))]);
    linker(retry, 2).link(&mut fx.session).await.unwrap();

    assert_eq!(fx.session.parsing_state(), ParsingState::Completed);
    assert_eq!(fx.session.actions().len(), 1);
}

#[tokio::test]
async fn test_provider_error_during_run() {
    let mut fx = fixture();
    let provider = ScriptedProvider::new(vec![Reply::Fail("connection reset".to_string())]);

    linker(provider, 5).link(&mut fx.session).await.unwrap();

    assert_eq!(fx.session.parsing_state(), ParsingState::DependenciesError);
    assert_eq!(fx.session.equipment().len(), 2);
}

#[tokio::test]
async fn test_agent_construction_failure_is_fatal() {
    let mut fx = fixture();
    let provider = ScriptedProvider::with_model("", vec![]);

    let err = linker(provider.clone(), 5)
        .link(&mut fx.session)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::AgentConstruction(_)));
    assert_eq!(provider.calls(), 0);
    assert_eq!(fx.session.parsing_state(), ParsingState::Error);
    assert!(fx.session.fatal_error().is_some());
}

#[tokio::test]
async fn test_zero_step_budget_is_a_config_error() {
    let mut fx = fixture();
    let err = linker(ScriptedProvider::texts(&[]), 0)
        .link(&mut fx.session)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::AgentConstruction(_)));
    assert_eq!(fx.session.parsing_state(), ParsingState::Error);
}

#[tokio::test]
async fn test_unparseable_text_yields_zero_actions() {
    let mut fx = fixture();
    let provider = ScriptedProvider::texts(&["I am not sure which ingredients are involved."]);

    linker(provider, 5).link(&mut fx.session).await.unwrap();

    assert_eq!(fx.session.parsing_state(), ParsingState::Completed);
    assert!(fx.session.actions().is_empty());
}

#[tokio::test]
async fn test_text_with_trailing_json_is_recovered() {
    let mut fx = fixture();
    let reply = format!(
        "After checking every sentence, here you go: {{\"is_final\": true, \"final_answer\": \"{{\\\"actions\\\": [{{\\\"name\\\": \\\"whisk\\\", \\\"ingredient_ids\\\": [\\\"{}\\\"]}}]}}\"}}",
        fx.flour
    );
    let provider = ScriptedProvider::texts(&[&reply]);

    linker(provider, 5).link(&mut fx.session).await.unwrap();

    assert_eq!(fx.session.actions().len(), 1);
    assert_eq!(fx.session.actions()[0].ingredient_ids, vec![fx.flour.clone()]);
}

#[tokio::test]
async fn test_tool_errors_are_reported_back_to_the_model() {
    let mut fx = fixture();
    let provider = ScriptedProvider::texts(&[
        &tool_call("taste_the_batter", json!({})),
        &final_answer(json!({"actions": []})),
    ]);

    linker(provider.clone(), 5)
        .link(&mut fx.session)
        .await
        .unwrap();

    let conversations = provider.conversations();
    let observation = &conversations[1].last().unwrap().content;
    assert!(observation.starts_with("Observation: error: Unknown tool"));
    assert_eq!(fx.session.parsing_state(), ParsingState::Completed);
}
