use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::text_analysis::{AnalyzerError, TextAnalyzer};

/// Sentences preceding the current one that belong to its context window.
pub const CONTEXT_LOOKBACK: usize = 2;

/// Ordered `index -> sentence` map with consecutive indices from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentenceContext {
    sentences: BTreeMap<usize, String>,
}

impl SentenceContext {
    pub fn from_sentences(sentences: impl IntoIterator<Item = String>) -> Self {
        Self {
            sentences: sentences.into_iter().enumerate().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.sentences.get(&index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.sentences.iter().map(|(i, s)| (*i, s.as_str()))
    }

    /// Sentence `index` plus up to two preceding sentences, joined by a space.
    pub fn window(&self, index: usize) -> String {
        let first = index.saturating_sub(CONTEXT_LOOKBACK);
        self.sentences
            .range(first..=index)
            .map(|(_, sentence)| sentence.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn as_map(&self) -> &BTreeMap<usize, String> {
        &self.sentences
    }
}

/// Builds [`SentenceContext`] maps with an injected analyzer.
#[derive(Clone)]
pub struct SentenceContextBuilder {
    analyzer: Arc<dyn TextAnalyzer>,
}

impl SentenceContextBuilder {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self { analyzer }
    }

    pub fn build(&self, text: &str) -> Result<SentenceContext, AnalyzerError> {
        if text.trim().is_empty() {
            return Ok(SentenceContext::default());
        }

        let context = SentenceContext::from_sentences(self.analyzer.segment(text)?);
        debug!(
            "Built sentence context with {} sentences using '{}'",
            context.len(),
            self.analyzer.name()
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_analysis::RuleBasedAnalyzer;

    fn builder() -> SentenceContextBuilder {
        SentenceContextBuilder::new(Arc::new(RuleBasedAnalyzer::started().unwrap()))
    }

    #[test]
    fn basic_recipe_has_three_sentences() {
        let context = builder()
            .build("Heat the oven to 350F. Mix flour and salt in a bowl. Bake for 30 minutes.")
            .unwrap();

        assert_eq!(context.len(), 3);
        assert_eq!(context.get(0), Some("Heat the oven to 350F."));
        assert!(context.get(1).unwrap().contains("Mix flour"));
        assert!(context.get(2).unwrap().contains("Bake for 30 minutes"));
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(builder().build("").unwrap().is_empty());
        assert!(builder().build("   \n\t   ").unwrap().is_empty());
    }

    #[test]
    fn single_sentence() {
        let context = builder().build("Mix everything together until smooth.").unwrap();
        assert_eq!(context.len(), 1);
        assert_eq!(context.get(0), Some("Mix everything together until smooth."));
    }

    #[test]
    fn window_clamps_at_start() {
        let context = SentenceContext::from_sentences(
            ["A.", "B.", "C.", "D."].into_iter().map(String::from),
        );
        assert_eq!(context.window(0), "A.");
        assert_eq!(context.window(1), "A. B.");
        assert_eq!(context.window(3), "B. C. D.");
        assert_eq!(context.window(10), "");
    }

    #[test]
    fn serializes_as_plain_map() {
        let context = SentenceContext::from_sentences(vec!["Stir.".to_string()]);
        assert_eq!(serde_json::to_string(&context).unwrap(), r#"{"0":"Stir."}"#);
    }
}
