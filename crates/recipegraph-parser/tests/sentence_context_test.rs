use recipegraph_parser::{RuleBasedAnalyzer, SentenceContextBuilder, TextAnalyzer};
use std::sync::Arc;

fn builder() -> SentenceContextBuilder {
    let analyzer: Arc<dyn TextAnalyzer> = Arc::new(RuleBasedAnalyzer::started().unwrap());
    SentenceContextBuilder::new(analyzer)
}

#[test]
fn test_recipe_format() {
    let recipe_text = "Preheat oven to 375°F.

In a large bowl, combine flour, sugar, and salt. Add butter and mix until crumbly.
Press mixture into prepared pan. Bake until golden brown.";

    let context = builder().build(recipe_text).unwrap();

    assert!(context.len() >= 3);
    let sentences: Vec<&str> = context.iter().map(|(_, s)| s).collect();
    assert_eq!(sentences[0], "Preheat oven to 375°F.");
    assert!(sentences.iter().any(|s| s.contains("combine flour")));
    assert!(sentences.iter().any(|s| s.contains("Bake until golden")));
}

#[test]
fn test_ingredient_list_and_numbered_steps() {
    let recipe_text = "Ingredients: 2 cups flour, 1 cup sugar, 1/2 cup butter.

1. Preheat oven to 350F.
2. Mix dry ingredients together.
3. Add butter and combine until mixture forms a dough.";

    let context = builder().build(recipe_text).unwrap();

    assert_eq!(context.len(), 4);
    assert_eq!(context.get(1), Some("1. Preheat oven to 350F."));
    assert!(context.get(2).unwrap().contains("Mix dry ingredients"));
}

#[test]
fn test_indices_are_consecutive_and_windows_clamp() {
    let context = builder()
        .build("Heat the oven to 350F. Mix flour and salt in a bowl. Bake for 30 minutes.")
        .unwrap();

    let indices: Vec<usize> = context.iter().map(|(i, _)| i).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(context.window(0), "Heat the oven to 350F.");
    assert_eq!(
        context.window(2),
        "Heat the oven to 350F. Mix flour and salt in a bowl. Bake for 30 minutes."
    );
}

#[test]
fn test_verbs_follow_sentence_indices() {
    let analyzer = RuleBasedAnalyzer::started().unwrap();
    let mentions = analyzer
        .cooking_verbs("Heat the oven to 350F. Mix flour and salt in a bowl. Bake for 30 minutes.")
        .unwrap();

    let found: Vec<(&str, usize)> = mentions
        .iter()
        .map(|m| (m.lemma.as_str(), m.sentence_index))
        .collect();
    assert_eq!(found, vec![("heat", 0), ("mix", 1), ("bake", 2)]);
    analyzer.shutdown();
}
