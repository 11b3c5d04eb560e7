//! SVG drawing surface for `nexus render`.

use std::fmt::Write;

use nexus_core::render::GradientStop;
use nexus_core::{Point, Rgba, Surface};

pub struct SvgSurface {
    width: f64,
    height: f64,
    defs: String,
    body: String,
    next_gradient: usize,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            defs: String::new(),
            body: String::new(),
            next_gradient: 0,
        }
    }

    /// The current frame as a standalone document.
    pub fn document(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
            viewBox=\"0 0 {w} {h}\">\n<defs>\n{defs}</defs>\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            defs = self.defs,
            body = self.body,
        )
    }
}

fn rgb(c: Rgba) -> String {
    format!("rgb({},{},{})", c.r, c.g, c.b)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// Writing into a String cannot fail.
impl Surface for SvgSurface {
    fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self, color: Rgba) {
        self.defs.clear();
        self.body.clear();
        self.next_gradient = 0;
        let _ = writeln!(
            self.body,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\" fill-opacity=\"{:.3}\"/>",
            rgb(color),
            color.a
        );
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        let _ = writeln!(
            self.body,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.3}\"/>",
            center.x,
            center.y,
            radius,
            rgb(color),
            color.a
        );
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Rgba) {
        let _ = writeln!(
            self.body,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"none\" \
            stroke=\"{}\" stroke-opacity=\"{:.3}\" stroke-width=\"{:.2}\"/>",
            center.x,
            center.y,
            radius,
            rgb(color),
            color.a,
            width
        );
    }

    fn line(&mut self, from: Point, to: Point, width: f64, color: Rgba) {
        let _ = writeln!(
            self.body,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" \
            stroke=\"{}\" stroke-opacity=\"{:.3}\" stroke-width=\"{:.2}\"/>",
            from.x,
            from.y,
            to.x,
            to.y,
            rgb(color),
            color.a,
            width
        );
    }

    fn radial_gradient(&mut self, center: Point, radius: f64, stops: &[GradientStop]) {
        let id = format!("g{}", self.next_gradient);
        self.next_gradient += 1;

        let _ = writeln!(self.defs, "<radialGradient id=\"{id}\">");
        for stop in stops {
            let _ = writeln!(
                self.defs,
                "<stop offset=\"{:.3}\" stop-color=\"{}\" stop-opacity=\"{:.3}\"/>",
                stop.offset.clamp(0.0, 1.0),
                rgb(stop.color),
                stop.color.a
            );
        }
        let _ = writeln!(self.defs, "</radialGradient>");
        let _ = writeln!(
            self.body,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"url(#{id})\"/>",
            center.x, center.y, radius
        );
    }

    fn text(&mut self, at: Point, text: &str, size: f64, color: Rgba) {
        let _ = writeln!(
            self.body,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"monospace\" font-size=\"{:.1}\" \
            fill=\"{}\" fill-opacity=\"{:.3}\">{}</text>",
            at.x,
            at.y,
            size,
            rgb(color),
            color.a,
            escape(text)
        );
    }
}
