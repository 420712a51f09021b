//! Graph data handed to a renderer.

use serde::{Deserialize, Serialize};

use crate::theme::Theme;

pub const GRAPH_TITLE: &str = "Recipe Dependency Graph";
pub const NO_ACTIONS_TEXT: &str =
    "No actions found. Parse recipe actions first to generate dependency graph.";
pub const HINT_TEXT: &str = "Hover over nodes for details. Drag to explore the network.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Ingredient,
    Action,
    Equipment,
}

impl NodeKind {
    /// Legend order
    pub const ALL: [NodeKind; 3] = [NodeKind::Ingredient, NodeKind::Action, NodeKind::Equipment];

    pub fn size(self) -> u32 {
        match self {
            NodeKind::Ingredient => 35,
            NodeKind::Equipment => 40,
            NodeKind::Action => 45,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            NodeKind::Ingredient => "circle",
            NodeKind::Equipment => "square",
            NodeKind::Action => "diamond",
        }
    }

    pub fn group_name(self) -> &'static str {
        match self {
            NodeKind::Ingredient => "Ingredients",
            NodeKind::Action => "Actions",
            NodeKind::Equipment => "Equipment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    IngredientToAction,
    ActionToEquipment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Entity id; actions are prefixed with `action_`
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub size: u32,
    pub color: String,
    pub symbol: String,
    pub hover_text: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// Text placed in paper coordinates (0..1 on both axes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: u32,
    pub color: String,
}

/// Nodes of one kind, the unit a renderer draws as a single trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeGroup<'a> {
    pub kind: NodeKind,
    pub name: &'static str,
    pub symbol: &'static str,
    pub color: &'a str,
    pub nodes: Vec<&'a GraphNode>,
}

/// Line segments of one edge kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeGroup {
    pub kind: EdgeKind,
    pub segments: Vec<(Position, Position)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub title: String,
    pub theme: Theme,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub annotations: Vec<Annotation>,
    pub show_legend: bool,
}

impl DependencyGraph {
    /// The empty state shown before any actions exist.
    pub fn placeholder(theme: Theme) -> Self {
        let annotation = Annotation {
            text: NO_ACTIONS_TEXT.to_string(),
            x: 0.5,
            y: 0.5,
            font_size: 16,
            color: theme.annotation_text.clone(),
        };
        Self {
            title: GRAPH_TITLE.to_string(),
            theme,
            nodes: Vec::new(),
            edges: Vec::new(),
            annotations: vec![annotation],
            show_legend: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Non-empty node groups in legend order.
    pub fn node_groups(&self) -> Vec<NodeGroup<'_>> {
        NodeKind::ALL
            .iter()
            .filter_map(|&kind| {
                let nodes: Vec<&GraphNode> = self.nodes_of(kind).collect();
                if nodes.is_empty() {
                    return None;
                }
                Some(NodeGroup {
                    kind,
                    name: kind.group_name(),
                    symbol: kind.symbol(),
                    color: self.theme.color_for(kind),
                    nodes,
                })
            })
            .collect()
    }

    /// Non-empty edge groups with resolved endpoint positions.
    pub fn edge_groups(&self) -> Vec<EdgeGroup> {
        [EdgeKind::IngredientToAction, EdgeKind::ActionToEquipment]
            .into_iter()
            .filter_map(|kind| {
                let segments: Vec<(Position, Position)> = self
                    .edges_of(kind)
                    .filter_map(|edge| {
                        let source = self.node(&edge.source)?;
                        let target = self.node(&edge.target)?;
                        Some((source.position, target.position))
                    })
                    .collect();
                (!segments.is_empty()).then_some(EdgeGroup { kind, segments })
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_has_single_annotation() {
        let graph = DependencyGraph::placeholder(Theme::light());
        assert!(graph.is_placeholder());
        assert_eq!(graph.annotations.len(), 1);
        assert!(graph.annotations[0].text.contains("No actions found"));
        assert!(graph.node_groups().is_empty());
        assert!(graph.edge_groups().is_empty());
    }

    #[test]
    fn test_kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&EdgeKind::IngredientToAction).unwrap(),
            "\"ingredient_to_action\""
        );
        assert_eq!(serde_json::to_string(&NodeKind::Equipment).unwrap(), "\"equipment\"");
    }
}
