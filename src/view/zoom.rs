use serde::{Deserialize, Serialize};

use crate::ir::{Point, Size};

pub const MIN_SCALE: f32 = 0.01;
pub const MAX_SCALE: f32 = 10.0;

/// Pan/zoom applied to the rendered graph: screen = graph * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub x: f32,
    pub y: f32,
    pub k: f32,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ZoomTransform {
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }

    /// Scales about the origin.
    pub fn scale_by(self, factor: f32) -> Self {
        Self {
            k: (self.k * factor).clamp(MIN_SCALE, MAX_SCALE),
            ..self
        }
    }

    pub fn translate_by(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            k: self.k,
        }
    }

    /// Scales about a screen point, keeping the graph point under it fixed.
    pub fn zoom_at(self, screen: Point, factor: f32) -> Self {
        let k = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = k / self.k;
        Self {
            x: screen.x - (screen.x - self.x) * ratio,
            y: screen.y - (screen.y - self.y) * ratio,
            k,
        }
    }

    /// The transform with `k` clamped to the zoom range, or `None` when any component is not
    /// finite.
    pub fn clamped(self) -> Option<Self> {
        if !(self.x.is_finite() && self.y.is_finite() && self.k.is_finite()) {
            return None;
        }
        Some(Self {
            k: self.k.clamp(MIN_SCALE, MAX_SCALE),
            ..self
        })
    }

    pub fn screen_to_graph(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    pub fn graph_to_screen(&self, graph: Point) -> Point {
        Point::new(graph.x * self.k + self.x, graph.y * self.k + self.y)
    }

    /// Transform that centers `content` in `viewport`, shrinking it to fit but never
    /// enlarging past scale 1.
    pub fn fit(content: Size, viewport: Size) -> Self {
        let ratio = |view: f32, content: f32| {
            if content > 0.0 { view / content } else { f32::INFINITY }
        };
        let k = ratio(viewport.width, content.width)
            .min(ratio(viewport.height, content.height))
            .min(1.0)
            .max(MIN_SCALE);
        Self {
            x: (viewport.width - content.width * k) / 2.0,
            y: (viewport.height - content.height * k) / 2.0,
            k,
        }
    }
}
