pub mod entity_converter;
pub mod sentence_context;
pub mod text_analysis;

pub use entity_converter::{convert_entities, parse_amount, ConversionWarning, ConvertedEntities};
pub use sentence_context::{SentenceContext, SentenceContextBuilder};
pub use text_analysis::{AnalyzerError, RuleBasedAnalyzer, TextAnalyzer, VerbMention};
