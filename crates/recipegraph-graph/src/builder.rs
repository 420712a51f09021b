use recipegraph_core::{GraphConfig, RecipeSession};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::hover::{action_hover, equipment_hover, ingredient_hover};
use crate::layout::{ForceLayout, LayoutParams};
use crate::model::{
    Annotation, DependencyGraph, EdgeKind, GraphEdge, GraphNode, NodeKind, Position, GRAPH_TITLE,
    HINT_TEXT,
};
use crate::theme::Theme;

const GRAPH_LOG_TARGET: &str = "recipegraph::graph";

/// Turns linked sessions into positioned, styled dependency graphs.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    theme: Theme,
    layout: ForceLayout,
}

impl GraphBuilder {
    pub fn new(theme: Theme, params: LayoutParams) -> Self {
        Self {
            theme,
            layout: ForceLayout::new(params),
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(Theme::from_config(config), LayoutParams::from(config))
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Builds the graph for the session's actions.
    ///
    /// A session without actions yields [`DependencyGraph::placeholder`].
    /// References to ingredient or equipment ids that are not in the
    /// session produce no edge.
    pub fn build(&self, session: &RecipeSession) -> DependencyGraph {
        if session.actions().is_empty() {
            debug!(target: GRAPH_LOG_TARGET, "No actions, returning placeholder graph");
            return DependencyGraph::placeholder(self.theme.clone());
        }

        let mut nodes = Vec::with_capacity(
            session.ingredients().len() + session.equipment().len() + session.actions().len(),
        );
        for ingredient in session.ingredients() {
            nodes.push(self.node(
                ingredient.id.to_string(),
                &ingredient.name,
                NodeKind::Ingredient,
                ingredient_hover(ingredient),
            ));
        }
        for equipment in session.equipment() {
            nodes.push(self.node(
                equipment.id.to_string(),
                &equipment.name,
                NodeKind::Equipment,
                equipment_hover(equipment),
            ));
        }
        for action in session.actions() {
            nodes.push(self.node(
                action_node_id(action.id.as_str()),
                &action.name,
                NodeKind::Action,
                action_hover(action, session),
            ));
        }

        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();

        let mut edges = Vec::new();
        for action in session.actions() {
            let action_id = action_node_id(action.id.as_str());
            for ingredient_id in &action.ingredient_ids {
                if index.contains_key(ingredient_id.as_str()) {
                    edges.push(GraphEdge {
                        source: ingredient_id.to_string(),
                        target: action_id.clone(),
                        kind: EdgeKind::IngredientToAction,
                    });
                } else {
                    debug!(
                        target: GRAPH_LOG_TARGET,
                        "Dropping edge from unknown ingredient {} to action '{}'",
                        ingredient_id,
                        action.name
                    );
                }
            }
            if let Some(equipment_id) = &action.equipment_id {
                if index.contains_key(equipment_id.as_str()) {
                    edges.push(GraphEdge {
                        source: action_id.clone(),
                        target: equipment_id.to_string(),
                        kind: EdgeKind::ActionToEquipment,
                    });
                } else {
                    debug!(
                        target: GRAPH_LOG_TARGET,
                        "Dropping edge from action '{}' to unknown equipment {}",
                        action.name,
                        equipment_id
                    );
                }
            }
        }

        let pairs: Vec<(usize, usize)> = edges
            .iter()
            .filter_map(|edge| Some((*index.get(&edge.source)?, *index.get(&edge.target)?)))
            .collect();
        let positions = self.layout.compute(nodes.len(), &pairs);
        for (node, position) in nodes.iter_mut().zip(positions) {
            node.position = position;
        }

        info!(
            target: GRAPH_LOG_TARGET,
            "Built dependency graph with {} nodes and {} edges",
            nodes.len(),
            edges.len()
        );

        DependencyGraph {
            title: GRAPH_TITLE.to_string(),
            annotations: vec![Annotation {
                text: HINT_TEXT.to_string(),
                x: 0.005,
                y: -0.002,
                font_size: 12,
                color: self.theme.annotation_text.clone(),
            }],
            theme: self.theme.clone(),
            nodes,
            edges,
            show_legend: true,
        }
    }

    fn node(&self, id: String, name: &str, kind: NodeKind, hover_text: String) -> GraphNode {
        let style = self.theme.style(kind);
        GraphNode {
            id,
            name: name.to_string(),
            kind,
            size: style.size,
            color: style.color,
            symbol: style.symbol,
            hover_text,
            position: Position::default(),
        }
    }
}

fn action_node_id(action_id: &str) -> String {
    format!("action_{action_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_node_ids_are_prefixed() {
        assert_eq!(action_node_id("42"), "action_42");
    }

    #[test]
    fn test_empty_session_gives_placeholder() {
        let graph = GraphBuilder::default().build(&RecipeSession::new());
        assert!(graph.is_placeholder());
        assert!(!graph.show_legend);
    }
}
