pub mod algorithm;
pub mod error;
pub mod graphviz;
pub mod layered;
pub mod manager;
pub mod matching;
pub mod measure;
mod phase;
mod ranking;
mod routing;

pub use algorithm::{
    InputEdge, InputVertex, LayoutAlgorithm, LayoutOptions, LayoutRequest, LayoutResponse, Reply,
    algorithm_for,
};
pub use error::{AlgorithmError, GraphError, LayoutError, MatchError, MeasureError};
pub use graphviz::GraphvizProcess;
pub use layered::LayeredLayout;
pub use manager::{Delivery, LayoutGraph, LayoutManager, Submission};
pub use matching::{match_edges, match_vertices};
pub use measure::{LabelMeasurer, SizeMeasurer};
pub use phase::{Generation, LayoutPhase};
pub use routing::edge_path_data;
