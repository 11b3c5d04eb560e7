use std::f64::consts::TAU;

use super::{LABEL, Point, RADAR_GREEN, Renderer, Scene, Surface, glow};
use crate::constants::{RADAR_PULSE_PERIOD_MS, RADAR_SWEEP_PERIOD_MS};
use crate::time::Timestamp;

const RINGS: usize = 4;
const SPOKES: usize = 8;
const TRAIL_STEPS: usize = 12;
const TRAIL_ARC: f64 = 0.6;

/// Range rings, spokes, a rotating beam with a fading trail, an expanding
/// pulse and echo points that light up as the beam passes them.
pub struct RadarRenderer;

impl RadarRenderer {
    /// Beam angle in `[0, 2π)` at `now`.
    pub fn sweep_angle(now: Timestamp) -> f64 {
        now.rem_euclid(RADAR_SWEEP_PERIOD_MS) as f64 / RADAR_SWEEP_PERIOD_MS as f64 * TAU
    }

    /// Pulse progress in `[0, 1)`; wraps to zero every pulse period.
    pub fn pulse_progress(now: Timestamp) -> f64 {
        now.rem_euclid(RADAR_PULSE_PERIOD_MS) as f64 / RADAR_PULSE_PERIOD_MS as f64
    }

    /// Echo brightness: full right behind the beam, fading over one turn.
    fn echo_alpha(beam: f64, echo: f64) -> f64 {
        let behind = (beam - echo).rem_euclid(TAU);
        1.0 - behind / TAU
    }
}

impl Renderer for RadarRenderer {
    fn draw(&self, scene: &Scene, surface: &mut dyn Surface, now: Timestamp) {
        let center = scene.center();
        let radius = scene.radius();
        let grid = RADAR_GREEN.with_alpha(0.25);

        for ring in 1..=RINGS {
            surface.stroke_circle(center, radius * ring as f64 / RINGS as f64, 1.0, grid);
        }
        for spoke in 0..SPOKES {
            let angle = spoke as f64 / SPOKES as f64 * TAU;
            surface.line(center, center.polar(radius, angle), 1.0, grid);
        }

        let beam = Self::sweep_angle(now);
        for step in (0..TRAIL_STEPS).rev() {
            let fade = 1.0 - step as f64 / TRAIL_STEPS as f64;
            let angle = beam - TRAIL_ARC * step as f64 / TRAIL_STEPS as f64;
            surface.line(
                center,
                center.polar(radius, angle),
                if step == 0 { 2.5 } else { 1.5 },
                RADAR_GREEN.with_alpha(0.6 * fade),
            );
        }

        let pulse = Self::pulse_progress(now);
        surface.stroke_circle(
            center,
            radius * pulse,
            2.0,
            RADAR_GREEN.with_alpha(1.0 - pulse),
        );

        for point in &scene.points {
            let dx = point.position.x - center.x;
            let dy = point.position.y - center.y;
            let angle = dy.atan2(dx);
            let distance = dx.hypot(dy).min(radius);
            let echo = center.polar(distance, angle);
            let alpha = Self::echo_alpha(beam, angle);
            glow(surface, echo, 8.0, RADAR_GREEN.with_alpha(alpha));
            surface.fill_circle(echo, 2.5, RADAR_GREEN.with_alpha(alpha));
        }

        surface.text(
            Point::new(8.0, scene.height - 8.0),
            &format!("{} echoes", scene.points.len()),
            11.0,
            LABEL.with_alpha(0.7),
        );
    }
}
