use recipegraph_core::GraphConfig;
use serde::{Deserialize, Serialize};

use crate::model::NodeKind;

/// Colors for one display mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub dark: bool,
    pub background: String,
    pub text: String,
    pub annotation_text: String,
    pub edges: String,
    pub ingredients: String,
    pub equipment: String,
    pub actions: String,
}

/// Marker appearance of a node kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub size: u32,
    pub symbol: String,
    pub color: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            dark: false,
            background: "white".to_string(),
            text: "#000000".to_string(),
            annotation_text: "gray".to_string(),
            edges: "#888888".to_string(),
            ingredients: "#00FF7F".to_string(),
            equipment: "#FF4500".to_string(),
            actions: "#1E90FF".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            background: "#2F2F2F".to_string(),
            text: "#FFFFFF".to_string(),
            annotation_text: "#CCCCCC".to_string(),
            edges: "#666666".to_string(),
            ingredients: "#00FF7F".to_string(),
            equipment: "#FF6347".to_string(),
            actions: "#87CEEB".to_string(),
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Light unless `graph.dark_mode` is set.
    pub fn from_config(config: &GraphConfig) -> Self {
        Self::for_mode(config.dark_mode.unwrap_or(false))
    }

    pub fn color_for(&self, kind: NodeKind) -> &str {
        match kind {
            NodeKind::Ingredient => &self.ingredients,
            NodeKind::Equipment => &self.equipment,
            NodeKind::Action => &self.actions,
        }
    }

    pub fn style(&self, kind: NodeKind) -> NodeStyle {
        NodeStyle {
            size: kind.size(),
            symbol: kind.symbol().to_string(),
            color: self.color_for(kind).to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
