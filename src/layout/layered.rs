use std::collections::HashMap;

use crate::ir::{LayoutEdge, LayoutVertex, VertexKey};

use super::Generation;
use super::algorithm::{LayoutAlgorithm, LayoutRequest, LayoutResponse, Reply};
use super::error::AlgorithmError;
use super::ranking::{compute_ranks, order_rank_nodes};
use super::routing::{Axis, route_edge};

/// In-process layered layout: longest-path ranks, median ordering, centered ranks.
///
/// Vertices are reported rank by rank, so the output order generally differs from the
/// request order.
#[derive(Debug, Default)]
pub struct LayeredLayout {
    runs: usize,
}

impl LayeredLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> usize {
        self.runs
    }
}

impl LayoutAlgorithm for LayeredLayout {
    fn name(&self) -> &str {
        "layered"
    }

    fn request_layout(
        &mut self,
        generation: Generation,
        request: LayoutRequest,
    ) -> Reply<Result<LayoutResponse, AlgorithmError>> {
        self.runs += 1;
        tracing::debug!(
            %generation,
            vertices = request.vertices.len(),
            edges = request.edges.len(),
            "running layered layout"
        );
        Reply::Ready(compute_layered(&request))
    }
}

pub fn compute_layered(request: &LayoutRequest) -> Result<LayoutResponse, AlgorithmError> {
    let options = &request.options;
    let axis = Axis(options.direction);
    let count = request.vertices.len();

    let index: HashMap<&VertexKey, usize> = request
        .vertices
        .iter()
        .enumerate()
        .map(|(idx, vertex)| (&vertex.key, idx))
        .collect();
    let mut edges = Vec::with_capacity(request.edges.len());
    for edge in &request.edges {
        let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) else {
            return Err(AlgorithmError::Failed(format!(
                "edge {} -> {} references an unknown vertex",
                edge.from, edge.to
            )));
        };
        edges.push((from, to));
    }

    let ranks = compute_ranks(count, &edges);
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    let mut rank_nodes: Vec<Vec<usize>> = vec![Vec::new(); if count == 0 { 0 } else { max_rank + 1 }];
    for (idx, rank) in ranks.iter().enumerate() {
        rank_nodes[*rank].push(idx);
    }
    order_rank_nodes(&mut rank_nodes, &edges, count, options.order_passes);

    let extents: Vec<(f32, f32)> = request
        .vertices
        .iter()
        .map(|vertex| axis.extents(vertex.width, vertex.height))
        .collect();
    let rank_cross: Vec<f32> = rank_nodes
        .iter()
        .map(|bucket| {
            let total: f32 = bucket.iter().map(|idx| extents[*idx].0).sum();
            total + options.node_separation * bucket.len().saturating_sub(1) as f32
        })
        .collect();
    let widest = rank_cross.iter().copied().fold(0.0f32, f32::max);

    let mut placed: Vec<Option<LayoutVertex>> = vec![None; count];
    let mut main_cursor = options.margin;
    for (bucket, cross_total) in rank_nodes.iter().zip(&rank_cross) {
        let rank_main = bucket.iter().map(|idx| extents[*idx].1).fold(0.0f32, f32::max);
        let mut cross_cursor = options.margin + (widest - cross_total) / 2.0;
        for idx in bucket {
            let vertex = &request.vertices[*idx];
            let (cross_extent, _) = extents[*idx];
            let center = axis.point(
                cross_cursor + cross_extent / 2.0,
                main_cursor + rank_main / 2.0,
            );
            placed[*idx] = Some(LayoutVertex {
                key: vertex.key.clone(),
                left: center.x - vertex.width / 2.0,
                top: center.y - vertex.height / 2.0,
                width: vertex.width,
                height: vertex.height,
            });
            cross_cursor += cross_extent + options.node_separation;
        }
        main_cursor += rank_main + options.rank_separation;
    }

    let mut layout_edges = Vec::with_capacity(edges.len());
    for (edge, &(from, to)) in request.edges.iter().zip(&edges) {
        let (Some(from_box), Some(to_box)) = (placed[from].as_ref(), placed[to].as_ref()) else {
            continue;
        };
        layout_edges.push(LayoutEdge {
            from: edge.from.clone(),
            to: edge.to.clone(),
            points: route_edge(
                from_box,
                to_box,
                from == to,
                options.edge_routing,
                options.direction,
                options.rank_separation,
            ),
        });
    }

    let vertices: Vec<LayoutVertex> = rank_nodes
        .iter()
        .flatten()
        .filter_map(|idx| placed[*idx].clone())
        .collect();

    let mut width: f32 = 0.0;
    let mut height: f32 = 0.0;
    for vertex in &vertices {
        width = width.max(vertex.left + vertex.width);
        height = height.max(vertex.top + vertex.height);
    }
    for edge in &layout_edges {
        for point in &edge.points {
            width = width.max(point.x);
            height = height.max(point.y);
        }
    }

    Ok(LayoutResponse {
        width: width + options.margin,
        height: height + options.margin,
        vertices,
        edges: layout_edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::layout::algorithm::{InputEdge, InputVertex, LayoutOptions};

    fn request(keys: &[&str], edges: &[(&str, &str)], options: LayoutOptions) -> LayoutRequest {
        LayoutRequest {
            vertices: keys
                .iter()
                .map(|key| InputVertex {
                    key: (*key).into(),
                    width: 40.0,
                    height: 20.0,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(from, to)| InputEdge {
                    from: (*from).into(),
                    to: (*to).into(),
                })
                .collect(),
            options,
        }
    }

    fn find<'a>(response: &'a LayoutResponse, key: &str) -> &'a LayoutVertex {
        response
            .vertices
            .iter()
            .find(|v| v.key == key.into())
            .unwrap()
    }

    #[test]
    fn ranks_flow_top_down() {
        let response = compute_layered(&request(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c")],
            LayoutOptions::default(),
        ))
        .unwrap();
        let (a, b, c) = (find(&response, "a"), find(&response, "b"), find(&response, "c"));
        assert!(a.top < b.top && b.top < c.top);
        assert_eq!(b.top - (a.top + a.height), 50.0);
        assert_eq!(response.edges.len(), 2);
        assert!(response.width >= 40.0 && response.height >= 60.0);
    }

    #[test]
    fn left_right_flows_along_x() {
        let options = LayoutOptions {
            direction: Direction::LeftRight,
            ..LayoutOptions::default()
        };
        let response = compute_layered(&request(&["a", "b"], &[("a", "b")], options)).unwrap();
        assert!(find(&response, "a").left < find(&response, "b").left);
        assert_eq!(find(&response, "a").top, find(&response, "b").top);
    }

    #[test]
    fn output_is_in_rank_order() {
        let response = compute_layered(&request(
            &["leaf", "root"],
            &[("root", "leaf")],
            LayoutOptions::default(),
        ))
        .unwrap();
        let keys: Vec<String> = response.vertices.iter().map(|v| v.key.to_string()).collect();
        assert_eq!(keys, ["root", "leaf"]);
    }

    #[test]
    fn siblings_do_not_overlap() {
        let response = compute_layered(&request(
            &["r", "x", "y"],
            &[("r", "x"), ("r", "y")],
            LayoutOptions::default(),
        ))
        .unwrap();
        let (x, y) = (find(&response, "x"), find(&response, "y"));
        assert_eq!(x.top, y.top);
        assert!((x.left - y.left).abs() >= 40.0 + 50.0);
    }

    #[test]
    fn unknown_endpoint_is_an_algorithm_error() {
        let result = compute_layered(&request(&["a"], &[("a", "ghost")], LayoutOptions::default()));
        assert!(matches!(result, Err(AlgorithmError::Failed(_))));
    }

    #[test]
    fn empty_graph_lays_out_to_margins() {
        let response = compute_layered(&request(&[], &[], LayoutOptions::default())).unwrap();
        assert!(response.vertices.is_empty());
        assert_eq!(response.width, 8.0);
    }
}
