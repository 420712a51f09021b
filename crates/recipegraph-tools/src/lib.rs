// ABOUTME: Tool layer for the dependency-linking agent
// ABOUTME: Pure text-matching and action-shaping tools, their schemas and the executor that dispatches them

pub mod link_tools;
pub mod tool_executor;
pub mod tool_schemas;

pub use link_tools::*;
pub use tool_executor::*;
pub use tool_schemas::*;
