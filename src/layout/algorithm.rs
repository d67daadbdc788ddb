use serde::{Deserialize, Serialize};

use crate::config::{Direction, EdgeRouting, LayoutConfig, LayoutEngine};
use crate::ir::{LayoutEdge, LayoutVertex, VertexKey};

use super::Generation;
use super::error::AlgorithmError;
use super::graphviz::GraphvizProcess;
use super::layered::LayeredLayout;

/// Reply from a backend that may finish immediately or deliver its result later.
#[derive(Debug)]
pub enum Reply<R> {
    Ready(R),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub engine: LayoutEngine,
    pub edge_routing: EdgeRouting,
    pub direction: Direction,
    pub rank_separation: f32,
    pub node_separation: f32,
    pub order_passes: usize,
    pub margin: f32,
}

impl From<&LayoutConfig> for LayoutOptions {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            engine: config.engine,
            edge_routing: config.edge_routing,
            direction: config.direction,
            rank_separation: config.rank_separation,
            node_separation: config.node_separation,
            order_passes: config.order_passes,
            margin: config.margin,
        }
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputVertex {
    pub key: VertexKey,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEdge {
    pub from: VertexKey,
    pub to: VertexKey,
}

/// Structural graph description handed to a layout algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub vertices: Vec<InputVertex>,
    pub edges: Vec<InputEdge>,
    pub options: LayoutOptions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutResponse {
    pub width: f32,
    pub height: f32,
    pub vertices: Vec<LayoutVertex>,
    pub edges: Vec<LayoutEdge>,
}

/// External layout service. Implementations either answer inline with `Reply::Ready` or
/// return `Reply::Pending` and hand the result to `LayoutManager::complete_layout` later,
/// together with the same generation.
pub trait LayoutAlgorithm {
    fn name(&self) -> &str;

    fn request_layout(
        &mut self,
        generation: Generation,
        request: LayoutRequest,
    ) -> Reply<Result<LayoutResponse, AlgorithmError>>;
}

impl<A: LayoutAlgorithm + ?Sized> LayoutAlgorithm for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn request_layout(
        &mut self,
        generation: Generation,
        request: LayoutRequest,
    ) -> Reply<Result<LayoutResponse, AlgorithmError>> {
        (**self).request_layout(generation, request)
    }
}

/// Picks the backend named by `layoutEngine`.
pub fn algorithm_for(config: &LayoutConfig) -> Box<dyn LayoutAlgorithm> {
    match config.engine {
        LayoutEngine::Layered => Box::new(LayeredLayout::new()),
        LayoutEngine::Dot | LayoutEngine::Neato => {
            Box::new(GraphvizProcess::new(config.graphviz_bin.as_deref()))
        }
    }
}
