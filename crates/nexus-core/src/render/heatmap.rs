use super::{ACCENT, GradientStop, HOT, Point, Renderer, Scene, Surface};
use crate::time::Timestamp;

const GRID: usize = 4;
const HOT_SPOTS: usize = 3;

/// Broad density wash plus stronger gradients over the densest cells.
pub struct HeatmapRenderer;

struct Cell {
    count: usize,
    sum_x: f64,
    sum_y: f64,
}

impl HeatmapRenderer {
    /// Densest grid cells as `(centroid, count)`, densest first. Ties keep
    /// row-major cell order.
    fn hot_spots(scene: &Scene) -> Vec<(Point, usize)> {
        let mut cells: Vec<Cell> = (0..GRID * GRID)
            .map(|_| Cell {
                count: 0,
                sum_x: 0.0,
                sum_y: 0.0,
            })
            .collect();

        let cell_w = scene.width.max(1.0) / GRID as f64;
        let cell_h = scene.height.max(1.0) / GRID as f64;
        for p in &scene.points {
            let col = ((p.position.x / cell_w).floor().max(0.0) as usize).min(GRID - 1);
            let row = ((p.position.y / cell_h).floor().max(0.0) as usize).min(GRID - 1);
            let cell = &mut cells[row * GRID + col];
            cell.count += 1;
            cell.sum_x += p.position.x;
            cell.sum_y += p.position.y;
        }

        let mut spots: Vec<(Point, usize)> = cells
            .iter()
            .filter(|c| c.count > 0)
            .map(|c| {
                let n = c.count as f64;
                (Point::new(c.sum_x / n, c.sum_y / n), c.count)
            })
            .collect();
        spots.sort_by(|a, b| b.1.cmp(&a.1));
        spots.truncate(HOT_SPOTS);
        spots
    }
}

impl Renderer for HeatmapRenderer {
    fn draw(&self, scene: &Scene, surface: &mut dyn Surface, _now: Timestamp) {
        let density = (scene.points.len() as f64 / 20.0).min(1.0);
        surface.radial_gradient(
            scene.center(),
            scene.width.max(scene.height) * 0.6,
            &[
                GradientStop {
                    offset: 0.0,
                    color: ACCENT.with_alpha(0.15 + 0.35 * density),
                },
                GradientStop {
                    offset: 1.0,
                    color: ACCENT.with_alpha(0.0),
                },
            ],
        );

        let spots = Self::hot_spots(scene);
        let max = spots.first().map(|s| s.1).unwrap_or(1) as f64;
        let base = scene.width.min(scene.height) / GRID as f64;
        for (center, count) in spots {
            let strength = count as f64 / max;
            surface.radial_gradient(
                center,
                base * (0.6 + 0.6 * strength),
                &[
                    GradientStop {
                        offset: 0.0,
                        color: HOT.with_alpha(0.5 + 0.4 * strength),
                    },
                    GradientStop {
                        offset: 0.5,
                        color: ACCENT.with_alpha(0.3 * strength),
                    },
                    GradientStop {
                        offset: 1.0,
                        color: ACCENT.with_alpha(0.0),
                    },
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::scene;
    use crate::render::{DrawOp, RecordingSurface, ScenePoint};
    use uuid::Uuid;

    fn point_at(x: f64, y: f64) -> ScenePoint {
        ScenePoint {
            id: Uuid::new_v4(),
            position: Point::new(x, y),
            intensity: 5,
            weight: 1.0,
        }
    }

    #[test]
    fn test_base_gradient_plus_hot_spots() {
        let mut surface = RecordingSurface::new(400.0, 300.0);
        HeatmapRenderer.draw(&scene(30), &mut surface, 0);
        let gradients = surface.count(|op| matches!(op, DrawOp::RadialGradient { .. }));
        assert_eq!(gradients, 1 + HOT_SPOTS);
    }

    #[test]
    fn test_empty_scene_only_base_gradient() {
        let mut surface = RecordingSurface::new(400.0, 300.0);
        HeatmapRenderer.draw(&scene(0), &mut surface, 0);
        assert_eq!(surface.ops().len(), 1);
    }

    #[test]
    fn test_densest_cell_first() {
        let scene = Scene {
            width: 400.0,
            height: 400.0,
            points: vec![
                point_at(10.0, 10.0),
                point_at(390.0, 390.0),
                point_at(380.0, 380.0),
                point_at(370.0, 390.0),
            ],
        };
        let spots = HeatmapRenderer::hot_spots(&scene);
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].1, 3);
        assert!(spots[0].0.x > 300.0);
    }
}
