use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-assigned vertex identity. Keys compare by value; `Str("1")` and `Int(1)` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VertexKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for VertexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexKey::Int(value) => write!(f, "{value}"),
            VertexKey::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for VertexKey {
    fn from(value: &str) -> Self {
        VertexKey::Str(value.to_string())
    }
}

impl From<String> for VertexKey {
    fn from(value: String) -> Self {
        VertexKey::Str(value)
    }
}

impl From<i64> for VertexKey {
    fn from(value: i64) -> Self {
        VertexKey::Int(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex<T> {
    pub key: VertexKey,
    pub label: Option<String>,
    pub size: Option<Size>,
    pub data: T,
}

impl<T> Vertex<T> {
    pub fn new(key: impl Into<VertexKey>, data: T) -> Self {
        Self {
            key: key.into(),
            label: None,
            size: None,
            data,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    /// Text used when sizing the vertex: the label, or the key when no label is set.
    pub fn display_text(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.key.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: VertexKey,
    pub to: VertexKey,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_bidirectional: bool,
}

impl Edge {
    pub fn new(from: impl Into<VertexKey>, to: impl Into<VertexKey>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            is_bidirectional: false,
        }
    }

    pub fn pair(&self) -> (VertexKey, VertexKey) {
        (self.from.clone(), self.to.clone())
    }
}

#[derive(Debug, Clone)]
pub struct SizedVertex<T> {
    pub vertex: Arc<Vertex<T>>,
    pub size: Size,
}

/// Raw vertex geometry as reported by a layout algorithm, keyed in its own output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutVertex {
    pub key: VertexKey,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutVertex {
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub from: VertexKey,
    pub to: VertexKey,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct MatchedLayoutVertex<T> {
    pub vertex: Arc<Vertex<T>>,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct MatchedLayoutEdge {
    pub edge: Arc<Edge>,
    pub points: Vec<Point>,
}

/// A completed, matched layout for one generation.
#[derive(Debug, Clone)]
pub struct LayoutSnapshot<T> {
    pub width: f32,
    pub height: f32,
    pub vertices: Vec<MatchedLayoutVertex<T>>,
    pub edges: Vec<MatchedLayoutEdge>,
}
