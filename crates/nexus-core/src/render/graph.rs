use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{ACCENT, HOT, Point, Renderer, Scene, Surface, glow};
use crate::time::Timestamp;

/// Edges only join nodes closer than this share of the shorter side.
const EDGE_DISTANCE: f64 = 0.3;
/// Chance that a close pair is actually connected.
const EDGE_PROBABILITY: f64 = 0.35;
const MARGIN: f64 = 0.08;

/// Randomly laid out nodes joined by a sparse set of short edges.
///
/// The layout is seeded from the scene's result ids, so the same result
/// set always draws the same graph.
pub struct GraphRenderer;

impl GraphRenderer {
    pub fn layout(scene: &Scene) -> (Vec<Point>, Vec<(usize, usize)>) {
        let mut rng = SmallRng::seed_from_u64(scene.seed());
        let mx = scene.width * MARGIN;
        let my = scene.height * MARGIN;

        let nodes: Vec<Point> = scene
            .points
            .iter()
            .map(|_| {
                Point::new(
                    mx + rng.random::<f64>() * (scene.width - 2.0 * mx),
                    my + rng.random::<f64>() * (scene.height - 2.0 * my),
                )
            })
            .collect();

        let threshold = scene.width.min(scene.height) * EDGE_DISTANCE;
        let mut edges = Vec::new();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                // Draw the coin for every pair so the layout does not depend
                // on which pairs happen to be close.
                let keep = rng.random::<f64>() < EDGE_PROBABILITY;
                if keep && nodes[i].distance(nodes[j]) < threshold {
                    edges.push((i, j));
                }
            }
        }
        (nodes, edges)
    }
}

impl Renderer for GraphRenderer {
    fn draw(&self, scene: &Scene, surface: &mut dyn Surface, _now: Timestamp) {
        let (nodes, edges) = Self::layout(scene);

        for &(i, j) in &edges {
            surface.line(nodes[i], nodes[j], 1.0, ACCENT.with_alpha(0.35));
        }

        for (node, point) in nodes.iter().zip(&scene.points) {
            let radius = 3.0 + 4.0 * point.weight;
            glow(surface, *node, radius * 3.0, HOT);
            surface.fill_circle(*node, radius, HOT.with_alpha(0.9));
        }
    }
}
