use super::{ACCENT, Renderer, Scene, Surface, glow};
use crate::time::Timestamp;

/// One glyph per result with a soft halo. Glyph size follows intensity,
/// opacity follows relevance.
pub struct PinsRenderer;

impl PinsRenderer {
    pub fn glyph_radius(intensity: u8) -> f64 {
        3.0 + intensity.min(10) as f64 * 0.6
    }
}

impl Renderer for PinsRenderer {
    fn draw(&self, scene: &Scene, surface: &mut dyn Surface, _now: Timestamp) {
        for point in &scene.points {
            let radius = Self::glyph_radius(point.intensity);
            glow(surface, point.position, radius * 3.0, ACCENT);
            surface.fill_circle(
                point.position,
                radius,
                ACCENT.with_alpha(0.55 + 0.45 * point.weight),
            );
        }
    }
}
