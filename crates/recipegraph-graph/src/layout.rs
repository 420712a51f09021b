//! Fixed-iteration force-directed layout.
//!
//! Nodes start evenly spaced on a circle of radius `max(1, n / 6)`. Each
//! iteration sums an inverse-square repulsion over every node pair and a
//! linear spring along every edge, then moves each node by the damped
//! force. There is no convergence test; the iteration count bounds the cost.

use recipegraph_core::GraphConfig;
use std::f64::consts::PI;

use crate::model::Position;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub iterations: usize,
    pub damping: f64,
    /// `k` in the `k / d²` repulsion
    pub repulsion: f64,
    /// Spring constant along edges
    pub attraction: f64,
    /// Lower clamp for the distance between two nodes
    pub min_distance: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            iterations: 50,
            damping: 0.1,
            repulsion: 0.1,
            attraction: 0.02,
            min_distance: 0.1,
        }
    }
}

impl From<&GraphConfig> for LayoutParams {
    fn from(config: &GraphConfig) -> Self {
        Self {
            iterations: config.iterations,
            damping: config.damping,
            repulsion: config.repulsion,
            attraction: config.attraction,
            min_distance: config.min_distance,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    params: LayoutParams,
}

impl ForceLayout {
    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn initial_positions(node_count: usize) -> Vec<Position> {
        let radius = (node_count as f64 / 6.0).max(1.0);
        (0..node_count)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / node_count as f64;
                Position::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect()
    }

    /// Positions for `node_count` nodes; `edges` are index pairs into them.
    /// Edges with an out-of-range endpoint are ignored.
    pub fn compute(&self, node_count: usize, edges: &[(usize, usize)]) -> Vec<Position> {
        let mut positions = Self::initial_positions(node_count);
        let edges: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(s, t)| s < node_count && t < node_count)
            .collect();
        let p = &self.params;

        for _ in 0..p.iterations {
            let mut forces = vec![(0.0_f64, 0.0_f64); node_count];

            for i in 0..node_count {
                for j in (i + 1)..node_count {
                    let (dx, dy, distance) = self.delta(positions[i], positions[j]);
                    let magnitude = p.repulsion / (distance * distance);
                    let fx = magnitude * dx / distance;
                    let fy = magnitude * dy / distance;
                    forces[i].0 -= fx;
                    forces[i].1 -= fy;
                    forces[j].0 += fx;
                    forces[j].1 += fy;
                }
            }

            for &(source, target) in &edges {
                let (dx, dy, distance) = self.delta(positions[source], positions[target]);
                let magnitude = p.attraction * distance;
                let fx = magnitude * dx / distance;
                let fy = magnitude * dy / distance;
                forces[source].0 += fx;
                forces[source].1 += fy;
                forces[target].0 -= fx;
                forces[target].1 -= fy;
            }

            for (position, (fx, fy)) in positions.iter_mut().zip(forces) {
                position.x += fx * p.damping;
                position.y += fy * p.damping;
            }
        }

        positions
    }

    fn delta(&self, from: Position, to: Position) -> (f64, f64, f64) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let distance = (dx * dx + dy * dy).sqrt().max(self.params.min_distance);
        (dx, dy, distance)
    }
}
