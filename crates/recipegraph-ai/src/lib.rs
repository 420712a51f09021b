pub mod llm_factory;
pub mod llm_provider;
pub mod openai_compatible_provider;
pub mod response_cleaner;

pub use llm_factory::LLMProviderFactory;
pub use llm_provider::*;
pub use openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};
pub use response_cleaner::{clean_json_response, extract_trailing_json_object};
