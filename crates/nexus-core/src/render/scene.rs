use uuid::Uuid;

use super::Point;
use crate::constants::GOLDEN_ANGLE;
use crate::ranking::ResultRecord;
use crate::timeline::TimeRange;

/// A result projected onto the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenePoint {
    pub id: Uuid,
    pub position: Point,
    pub intensity: u8,
    /// Relevance-derived weight in `0.0..=1.0`.
    pub weight: f64,
}

/// Everything a renderer reads for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub points: Vec<ScenePoint>,
}

impl Scene {
    /// Project the results that fall inside `range` (all results when
    /// `None`). Located results use an equirectangular projection; the rest
    /// are spread on a golden-angle spiral around the center.
    pub fn build(
        results: &[ResultRecord],
        range: Option<TimeRange>,
        dimensions: (f64, f64),
    ) -> Self {
        let (width, height) = dimensions;
        let visible: Vec<&ResultRecord> = results
            .iter()
            .filter(|r| range.is_none_or(|range| range.contains(r.created_at)))
            .collect();

        let max_relevance = visible
            .iter()
            .map(|r| r.relevance())
            .max()
            .unwrap_or(0)
            .max(1) as f64;

        let center = Point::new(width / 2.0, height / 2.0);
        let spiral_radius = width.min(height) * 0.45;
        let n = visible.len().max(1) as f64;

        let points = visible
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let position = match r.location {
                    Some(loc) => Point::new(
                        (loc.lon.clamp(-180.0, 180.0) + 180.0) / 360.0 * width,
                        (90.0 - loc.lat.clamp(-90.0, 90.0)) / 180.0 * height,
                    ),
                    None => {
                        let radius = ((i as f64 + 0.5) / n).sqrt() * spiral_radius;
                        center.polar(radius, i as f64 * GOLDEN_ANGLE)
                    }
                };
                ScenePoint {
                    id: r.id,
                    position,
                    intensity: r.intensity,
                    weight: r.relevance() as f64 / max_relevance,
                }
            })
            .collect();

        Self {
            width,
            height,
            points,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Half the shorter side, minus a margin.
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) * 0.45
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stable seed derived from the visible ids, for layouts that must not
    /// reshuffle between frames.
    pub fn seed(&self) -> u64 {
        self.points.iter().fold(0x9e37_79b9_7f4a_7c15, |acc, p| {
            let (hi, lo) = p.id.as_u64_pair();
            acc.rotate_left(5) ^ hi ^ lo
        })
    }
}
