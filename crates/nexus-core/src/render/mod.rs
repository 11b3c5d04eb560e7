//! Spatial renderer: four visual modes painted onto an abstract surface.
//!
//! Every mode is a pure function of the scene and the surface size, except
//! radar, which also reads the clock. `SpatialView` owns the mode switch and
//! the radar animation lifecycle.

mod graph;
mod heatmap;
mod pins;
mod radar;
mod scene;
mod view;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

pub use graph::GraphRenderer;
pub use heatmap::HeatmapRenderer;
pub use pins::PinsRenderer;
pub use radar::RadarRenderer;
pub use scene::{Scene, ScenePoint};
pub use view::{AnimationToken, FrameOutcome, ModeChange, SpatialView, ViewState};

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point at `radius` from `self` in direction `angle` (radians,
    /// clockwise from 3 o'clock in screen space).
    pub fn polar(self, radius: f64, angle: f64) -> Self {
        Self {
            x: self.x + radius * angle.cos(),
            y: self.y + radius * angle.sin(),
        }
    }
}

/// Straight-alpha color, channels in `0..=255`, alpha in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

pub const BACKGROUND: Rgba = Rgba::rgb(10, 10, 26);
pub const ACCENT: Rgba = Rgba::rgb(139, 92, 246);
pub const HOT: Rgba = Rgba::rgb(236, 72, 153);
pub const RADAR_GREEN: Rgba = Rgba::rgb(16, 185, 129);
pub const LABEL: Rgba = Rgba::rgb(226, 232, 240);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the radius, `0.0` (center) to `1.0` (edge).
    pub offset: f64,
    pub color: Rgba,
}

/// Abstract 2D drawing target.
pub trait Surface {
    /// Current size in pixels, `(width, height)`.
    fn dimensions(&self) -> (f64, f64);
    fn resize(&mut self, width: f64, height: f64);
    fn clear(&mut self, color: Rgba);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);
    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Rgba);
    fn line(&mut self, from: Point, to: Point, width: f64, color: Rgba);
    fn radial_gradient(&mut self, center: Point, radius: f64, stops: &[GradientStop]);
    fn text(&mut self, at: Point, text: &str, size: f64, color: Rgba);
}

/// One recorded primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear(Rgba),
    FillCircle { center: Point, radius: f64, color: Rgba },
    StrokeCircle { center: Point, radius: f64, width: f64, color: Rgba },
    Line { from: Point, to: Point, width: f64, color: Rgba },
    RadialGradient { center: Point, radius: f64, stops: Vec<GradientStop> },
    Text { at: Point, text: String, size: f64, color: Rgba },
}

/// Surface that keeps the primitives of the latest frame. `clear` starts
/// a new frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Surface for RecordingSurface {
    fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self, color: Rgba) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear(color));
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        self.ops.push(DrawOp::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Rgba) {
        self.ops.push(DrawOp::StrokeCircle {
            center,
            radius,
            width,
            color,
        });
    }

    fn line(&mut self, from: Point, to: Point, width: f64, color: Rgba) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn radial_gradient(&mut self, center: Point, radius: f64, stops: &[GradientStop]) {
        self.ops.push(DrawOp::RadialGradient {
            center,
            radius,
            stops: stops.to_vec(),
        });
    }

    fn text(&mut self, at: Point, text: &str, size: f64, color: Rgba) {
        self.ops.push(DrawOp::Text {
            at,
            text: text.to_string(),
            size,
            color,
        });
    }
}

/// One visualization strategy.
pub trait Renderer: Send + Sync {
    fn draw(&self, scene: &Scene, surface: &mut dyn Surface, now: Timestamp);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Pins,
    Heatmap,
    Radar,
    Graph,
}

impl RenderMode {
    pub const ALL: [RenderMode; 4] = [Self::Pins, Self::Heatmap, Self::Radar, Self::Graph];

    pub fn renderer(&self) -> &'static dyn Renderer {
        match self {
            Self::Pins => &PinsRenderer,
            Self::Heatmap => &HeatmapRenderer,
            Self::Radar => &RadarRenderer,
            Self::Graph => &GraphRenderer,
        }
    }

    /// Only radar depends on wall-clock time.
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Radar)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pins => "pins",
            Self::Heatmap => "heatmap",
            Self::Radar => "radar",
            Self::Graph => "graph",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim().to_lowercase())
    }
}

/// Soft halo around a glyph.
fn glow(surface: &mut dyn Surface, center: Point, radius: f64, color: Rgba) {
    surface.radial_gradient(
        center,
        radius,
        &[
            GradientStop {
                offset: 0.0,
                color: color.with_alpha(0.45),
            },
            GradientStop {
                offset: 1.0,
                color: color.with_alpha(0.0),
            },
        ],
    );
}
