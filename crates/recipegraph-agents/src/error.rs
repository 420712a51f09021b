use recipegraph_core::SessionError;
use recipegraph_parser::AnalyzerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid agent configuration: {0}")]
    Config(String),

    #[error("LLM generation failed: {0}")]
    Provider(String),

    #[error("Agent used all {0} steps without a final answer")]
    StepBudgetExhausted(usize),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to create linking agent: {0}")]
    AgentConstruction(#[source] AgentError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}
