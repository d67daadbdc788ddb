use std::collections::HashSet;
use std::sync::Arc;

use crate::ir::{Edge, LayoutSnapshot, Size, SizedVertex, Vertex, VertexKey};

use super::algorithm::{InputEdge, InputVertex, LayoutAlgorithm, LayoutOptions, LayoutRequest, LayoutResponse, Reply};
use super::error::{AlgorithmError, GraphError, LayoutError, MeasureError};
use super::matching::{match_edges, match_vertices};
use super::{Generation, LayoutPhase};

/// Outcome of [`LayoutManager::request_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The graph matches the current generation; no backend call was made.
    Reused(Generation),
    /// A new generation was started. `phase` is where it stands once any synchronous replies
    /// have been applied.
    Issued {
        generation: Generation,
        cancelled: Option<Generation>,
        phase: LayoutPhase,
    },
}

impl Submission {
    pub fn generation(&self) -> Generation {
        match self {
            Submission::Reused(generation) => *generation,
            Submission::Issued { generation, .. } => *generation,
        }
    }
}

/// Outcome of delivering a backend reply.
#[derive(Debug)]
pub enum Delivery<T> {
    /// The reply belongs to a superseded generation, or arrived in the wrong phase.
    Stale,
    Advanced(LayoutPhase),
    Done(Arc<LayoutSnapshot<T>>),
}

/// Order-insensitive structural identity of a submitted graph.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GraphSignature {
    keys: Vec<VertexKey>,
    pairs: Vec<(VertexKey, VertexKey)>,
}

impl GraphSignature {
    fn of<T>(vertices: &[Arc<Vertex<T>>], edges: &[Arc<Edge>]) -> Self {
        let mut keys: Vec<VertexKey> = vertices.iter().map(|v| v.key.clone()).collect();
        keys.sort();
        let mut pairs: Vec<(VertexKey, VertexKey)> = edges.iter().map(|e| e.pair()).collect();
        pairs.sort();
        Self { keys, pairs }
    }
}

/// One generation of the measure → layout → match pipeline.
#[derive(Debug)]
pub struct LayoutGraph<T> {
    generation: Generation,
    phase: LayoutPhase,
    vertices: Vec<Arc<Vertex<T>>>,
    edges: Vec<Arc<Edge>>,
    sized: Vec<SizedVertex<T>>,
    layout: Option<Arc<LayoutSnapshot<T>>>,
    error: Option<LayoutError>,
    options: LayoutOptions,
    signature: GraphSignature,
}

impl<T> LayoutGraph<T> {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn vertices(&self) -> &[Arc<Vertex<T>>] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Arc<Edge>] {
        &self.edges
    }

    pub fn sized_vertices(&self) -> &[SizedVertex<T>] {
        &self.sized
    }

    pub fn layout(&self) -> Option<&Arc<LayoutSnapshot<T>>> {
        self.layout.as_ref()
    }

    pub fn error(&self) -> Option<&LayoutError> {
        self.error.as_ref()
    }

    fn advance(&mut self, next: LayoutPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        tracing::debug!(generation = %self.generation, from = %self.phase, to = %next, "layout phase");
        self.phase = next;
    }

    fn is_reusable_for(&self, signature: &GraphSignature, options: &LayoutOptions) -> bool {
        matches!(
            self.phase,
            LayoutPhase::MeasuringSizes | LayoutPhase::AwaitingLayout | LayoutPhase::Done
        ) && self.signature == *signature
            && self.options == *options
    }
}

/// Drives vertex measurement and layout for the most recently submitted graph.
///
/// Every outstanding request carries the generation that issued it. Replies for any other
/// generation are dropped on arrival, so a superseded graph can never overwrite the live one.
pub struct LayoutManager<T, M = Box<dyn super::SizeMeasurer<T>>, A = Box<dyn LayoutAlgorithm>> {
    measurer: M,
    algorithm: A,
    options: LayoutOptions,
    last_generation: Generation,
    current: Option<LayoutGraph<T>>,
}

impl<T, M, A> LayoutManager<T, M, A>
where
    M: super::SizeMeasurer<T>,
    A: LayoutAlgorithm,
{
    pub fn new(measurer: M, algorithm: A, options: LayoutOptions) -> Self {
        Self {
            measurer,
            algorithm,
            options,
            last_generation: Generation(0),
            current: None,
        }
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Replaces the options used for the next generation. The current generation is left as
    /// is; resubmitting the same graph afterwards starts a new generation.
    pub fn set_options(&mut self, options: LayoutOptions) {
        self.options = options;
    }

    pub fn graph(&self) -> Option<&LayoutGraph<T>> {
        self.current.as_ref()
    }

    /// Phase of the current generation; `Init` when nothing has been submitted.
    pub fn phase(&self) -> LayoutPhase {
        self.current
            .as_ref()
            .map_or(LayoutPhase::Init, |graph| graph.phase)
    }

    pub fn current_generation(&self) -> Option<Generation> {
        self.current.as_ref().map(|graph| graph.generation)
    }

    /// The completed layout of the current generation, if it reached `Done`.
    pub fn layout(&self) -> Option<Arc<LayoutSnapshot<T>>> {
        self.current.as_ref().and_then(|graph| graph.layout.clone())
    }

    pub fn error(&self) -> Option<&LayoutError> {
        self.current.as_ref().and_then(|graph| graph.error.as_ref())
    }

    /// Drops the current generation. Replies still in flight become stale.
    pub fn reset(&mut self) {
        if let Some(graph) = self.current.take() {
            tracing::debug!(generation = %graph.generation, phase = %graph.phase, "layout reset");
        }
    }

    pub fn request_layout(
        &mut self,
        vertices: Vec<Arc<Vertex<T>>>,
        edges: Vec<Arc<Edge>>,
    ) -> Result<Submission, LayoutError> {
        validate(&vertices, &edges)?;
        let signature = GraphSignature::of(&vertices, &edges);

        if let Some(graph) = &self.current
            && graph.is_reusable_for(&signature, &self.options)
        {
            tracing::debug!(generation = %graph.generation, phase = %graph.phase, "graph unchanged, reusing generation");
            return Ok(Submission::Reused(graph.generation));
        }

        let cancelled = match self.current.as_mut() {
            Some(graph) if graph.phase.is_in_flight() => {
                tracing::info!(generation = %graph.generation, phase = %graph.phase, "cancelling superseded layout");
                graph.advance(LayoutPhase::Cancelled);
                Some(graph.generation)
            }
            _ => None,
        };

        let generation = self.last_generation.next();
        self.last_generation = generation;
        tracing::info!(
            %generation,
            vertices = vertices.len(),
            edges = edges.len(),
            "starting layout generation"
        );

        let mut graph = LayoutGraph {
            generation,
            phase: LayoutPhase::Init,
            vertices,
            edges,
            sized: Vec::new(),
            layout: None,
            error: None,
            options: self.options.clone(),
            signature,
        };
        graph.advance(LayoutPhase::MeasuringSizes);
        let reply = self.measurer.request_sizes(generation, &graph.vertices);
        self.current = Some(graph);

        if let Reply::Ready(result) = reply {
            self.accept_sizes(generation, result)?;
        }
        Ok(Submission::Issued {
            generation,
            cancelled,
            phase: self.phase(),
        })
    }

    /// Delivers sizes for a measurement that replied `Pending`.
    pub fn complete_measurement(
        &mut self,
        generation: Generation,
        result: Result<Vec<Size>, MeasureError>,
    ) -> Result<Delivery<T>, LayoutError> {
        if !self.is_live(generation, LayoutPhase::MeasuringSizes) {
            tracing::debug!(%generation, current = ?self.current_generation(), "discarding stale measurement");
            return Ok(Delivery::Stale);
        }
        self.accept_sizes(generation, result)
    }

    /// Delivers the result of a layout request that replied `Pending`.
    pub fn complete_layout(
        &mut self,
        generation: Generation,
        result: Result<LayoutResponse, AlgorithmError>,
    ) -> Result<Delivery<T>, LayoutError> {
        if !self.is_live(generation, LayoutPhase::AwaitingLayout) {
            tracing::debug!(%generation, current = ?self.current_generation(), "discarding stale layout");
            return Ok(Delivery::Stale);
        }
        self.accept_layout(generation, result)
    }

    fn is_live(&self, generation: Generation, phase: LayoutPhase) -> bool {
        self.current
            .as_ref()
            .is_some_and(|graph| graph.generation == generation && graph.phase == phase)
    }

    fn accept_sizes(
        &mut self,
        generation: Generation,
        result: Result<Vec<Size>, MeasureError>,
    ) -> Result<Delivery<T>, LayoutError> {
        let Some(graph) = self.current.as_mut() else {
            return Ok(Delivery::Stale);
        };
        let sized = match result.and_then(|sizes| size_vertices(&graph.vertices, sizes)) {
            Ok(sized) => sized,
            Err(source) => return Err(self.fail(LayoutError::Measure { generation, source })),
        };

        let request = LayoutRequest {
            vertices: sized
                .iter()
                .map(|sv| InputVertex {
                    key: sv.vertex.key.clone(),
                    width: sv.size.width,
                    height: sv.size.height,
                })
                .collect(),
            edges: graph
                .edges
                .iter()
                .map(|edge| InputEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                })
                .collect(),
            options: graph.options.clone(),
        };
        graph.sized = sized;
        graph.advance(LayoutPhase::AwaitingLayout);
        tracing::debug!(%generation, algorithm = self.algorithm.name(), "requesting layout");

        match self.algorithm.request_layout(generation, request) {
            Reply::Ready(result) => self.accept_layout(generation, result),
            Reply::Pending => Ok(Delivery::Advanced(LayoutPhase::AwaitingLayout)),
        }
    }

    fn accept_layout(
        &mut self,
        generation: Generation,
        result: Result<LayoutResponse, AlgorithmError>,
    ) -> Result<Delivery<T>, LayoutError> {
        let response = match result {
            Ok(response) => response,
            Err(source) => return Err(self.fail(LayoutError::Algorithm { generation, source })),
        };
        let Some(graph) = self.current.as_mut() else {
            return Ok(Delivery::Stale);
        };

        let matched = match_vertices(&graph.sized, response.vertices).and_then(|vertices| {
            match_edges(&graph.edges, response.edges).map(|edges| (vertices, edges))
        });
        let (vertices, edges) = match matched {
            Ok(matched) => matched,
            Err(source) => return Err(self.fail(LayoutError::Match { generation, source })),
        };

        let snapshot = Arc::new(LayoutSnapshot {
            width: response.width,
            height: response.height,
            vertices,
            edges,
        });
        graph.layout = Some(snapshot.clone());
        graph.advance(LayoutPhase::Done);
        tracing::info!(
            %generation,
            width = snapshot.width,
            height = snapshot.height,
            "layout done"
        );
        Ok(Delivery::Done(snapshot))
    }

    fn fail(&mut self, error: LayoutError) -> LayoutError {
        if let Some(graph) = self.current.as_mut() {
            tracing::warn!(generation = %graph.generation, phase = %graph.phase, %error, "layout failed");
            graph.advance(LayoutPhase::Failed);
            graph.error = Some(error.clone());
        }
        error
    }
}

fn validate<T>(vertices: &[Arc<Vertex<T>>], edges: &[Arc<Edge>]) -> Result<(), GraphError> {
    let mut keys: HashSet<&VertexKey> = HashSet::with_capacity(vertices.len());
    for vertex in vertices {
        if !keys.insert(&vertex.key) {
            return Err(GraphError::DuplicateVertex(vertex.key.clone()));
        }
    }
    let mut pairs: HashSet<(&VertexKey, &VertexKey)> = HashSet::with_capacity(edges.len());
    for edge in edges {
        for endpoint in [&edge.from, &edge.to] {
            if !keys.contains(endpoint) {
                return Err(GraphError::MissingEndpoint {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if !pairs.insert((&edge.from, &edge.to)) {
            return Err(GraphError::DuplicateEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
            });
        }
    }
    Ok(())
}

fn size_vertices<T>(
    vertices: &[Arc<Vertex<T>>],
    sizes: Vec<Size>,
) -> Result<Vec<SizedVertex<T>>, MeasureError> {
    if sizes.len() != vertices.len() {
        return Err(MeasureError::Incomplete {
            expected: vertices.len(),
            actual: sizes.len(),
        });
    }
    vertices
        .iter()
        .zip(sizes)
        .map(|(vertex, size)| {
            if !size.is_valid() {
                return Err(MeasureError::InvalidSize {
                    key: vertex.key.clone(),
                    width: size.width,
                    height: size.height,
                });
            }
            Ok(SizedVertex {
                vertex: vertex.clone(),
                size,
            })
        })
        .collect()
}
