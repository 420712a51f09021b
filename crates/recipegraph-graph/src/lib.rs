// ABOUTME: Renderer-agnostic dependency graph for an analyzed recipe
// ABOUTME: Ingredient, action and equipment nodes with hover text, theme styling and laid-out positions

pub mod builder;
pub mod hover;
pub mod layout;
pub mod model;
pub mod theme;

pub use builder::GraphBuilder;
pub use layout::{ForceLayout, LayoutParams};
pub use model::{
    Annotation, DependencyGraph, EdgeGroup, EdgeKind, GraphEdge, GraphNode, NodeGroup, NodeKind,
    Position, GRAPH_TITLE, HINT_TEXT, NO_ACTIONS_TEXT,
};
pub use theme::{NodeStyle, Theme};
