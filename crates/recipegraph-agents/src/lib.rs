// ABOUTME: Two-pass recipe analysis built on the LLM provider layer
// ABOUTME: Pass 1 extracts entities, Pass 2 links actions through a bounded tool-calling agent

pub mod agent;
pub mod error;
pub mod extraction;
pub mod linking;
pub mod pipeline;
pub mod prompts;

pub use agent::{AgentConfig, AgentResult, AgentRun, AgentStep, LinkingAgent};
pub use error::{AgentError, PipelineError};
pub use extraction::EntityExtractor;
pub use linking::{actions_from_values, DependencyLinker};
pub use pipeline::RecipePipeline;
