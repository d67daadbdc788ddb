use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ir::{
    Edge, LayoutEdge, LayoutVertex, MatchedLayoutEdge, MatchedLayoutVertex, SizedVertex, Vertex,
    VertexKey,
};

use super::error::MatchError;

/// Pairs each algorithm vertex with the submitted vertex carrying the same key.
///
/// The result follows `output` order. Every unmatched key is reported, not just the first.
/// The output must place each submitted vertex exactly once: keys repeated in `output` and
/// submitted keys absent from it are errors too, checked in that order after unknown keys.
pub fn match_vertices<T>(
    input: &[SizedVertex<T>],
    output: Vec<LayoutVertex>,
) -> Result<Vec<MatchedLayoutVertex<T>>, MatchError> {
    let by_key: HashMap<&VertexKey, &Arc<Vertex<T>>> = input
        .iter()
        .map(|sized| (&sized.vertex.key, &sized.vertex))
        .collect();

    let mut unknown = Vec::new();
    let mut repeated = Vec::new();
    let mut seen = HashSet::with_capacity(by_key.len());
    let mut matched = Vec::with_capacity(output.len());
    for lv in output {
        match by_key.get(&lv.key) {
            Some(vertex) if !seen.insert(&vertex.key) => repeated.push(lv.key),
            Some(vertex) => matched.push(MatchedLayoutVertex {
                vertex: Arc::clone(vertex),
                left: lv.left,
                top: lv.top,
                width: lv.width,
                height: lv.height,
            }),
            None => unknown.push(lv.key),
        }
    }
    if !unknown.is_empty() {
        return Err(MatchError::UnknownVertices { keys: unknown });
    }
    if !repeated.is_empty() {
        return Err(MatchError::RepeatedVertices { keys: repeated });
    }
    let missing: Vec<VertexKey> = input
        .iter()
        .map(|sized| &sized.vertex.key)
        .filter(|key| !seen.contains(key))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(MatchError::MissingVertices { keys: missing });
    }
    Ok(matched)
}

/// Pairs each algorithm edge with the submitted edge sharing its `(from, to)` pair.
///
/// Same contract as [`match_vertices`]: one output edge per submitted edge.
pub fn match_edges(
    input: &[Arc<Edge>],
    output: Vec<LayoutEdge>,
) -> Result<Vec<MatchedLayoutEdge>, MatchError> {
    let by_pair: HashMap<(&VertexKey, &VertexKey), &Arc<Edge>> = input
        .iter()
        .map(|edge| ((&edge.from, &edge.to), edge))
        .collect();

    let mut unknown = Vec::new();
    let mut repeated = Vec::new();
    let mut seen = HashSet::with_capacity(by_pair.len());
    let mut matched = Vec::with_capacity(output.len());
    for le in output {
        match by_pair.get(&(&le.from, &le.to)) {
            Some(edge) if !seen.insert((&edge.from, &edge.to)) => {
                repeated.push((le.from, le.to))
            }
            Some(edge) => matched.push(MatchedLayoutEdge {
                edge: Arc::clone(edge),
                points: le.points,
            }),
            None => unknown.push((le.from, le.to)),
        }
    }
    if !unknown.is_empty() {
        return Err(MatchError::UnknownEdges { edges: unknown });
    }
    if !repeated.is_empty() {
        return Err(MatchError::RepeatedEdges { edges: repeated });
    }
    let missing: Vec<(VertexKey, VertexKey)> = input
        .iter()
        .filter(|edge| !seen.contains(&(&edge.from, &edge.to)))
        .map(|edge| (edge.from.clone(), edge.to.clone()))
        .collect();
    if !missing.is_empty() {
        return Err(MatchError::MissingEdges { edges: missing });
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Point, Size};

    fn sized(key: &str) -> SizedVertex<u32> {
        SizedVertex {
            vertex: Arc::new(Vertex::new(key, 7)),
            size: Size::new(10.0, 10.0),
        }
    }

    fn placed(key: &str, left: f32) -> LayoutVertex {
        LayoutVertex {
            key: key.into(),
            left,
            top: 0.0,
            width: 10.0,
            height: 10.0,
        }
    }

    #[test]
    fn matches_permuted_output_by_key() {
        let input = vec![sized("a"), sized("b"), sized("c")];
        let output = vec![placed("c", 3.0), placed("a", 1.0), placed("b", 2.0)];
        let matched = match_vertices(&input, output).unwrap();
        assert_eq!(matched.len(), 3);
        let keys: Vec<_> = matched.iter().map(|m| m.vertex.key.to_string()).collect();
        assert_eq!(keys, ["c", "a", "b"]);
        assert!(Arc::ptr_eq(&matched[1].vertex, &input[0].vertex));
        assert_eq!(matched[0].left, 3.0);
    }

    #[test]
    fn names_unknown_vertex_key() {
        let input = vec![sized("a"), sized("b")];
        let output = vec![placed("a", 0.0), placed("c", 0.0)];
        let err = match_vertices(&input, output).unwrap_err();
        assert_eq!(
            err,
            MatchError::UnknownVertices {
                keys: vec!["c".into()]
            }
        );
        assert!(err.to_string().contains("'c'"));
    }

    #[test]
    fn repeated_vertex_fails() {
        let input = vec![sized("a"), sized("b")];
        let output = vec![placed("a", 0.0), placed("a", 5.0), placed("b", 0.0)];
        let err = match_vertices(&input, output).unwrap_err();
        assert_eq!(
            err,
            MatchError::RepeatedVertices {
                keys: vec!["a".into()]
            }
        );
    }

    #[test]
    fn dropped_vertex_fails() {
        let input = vec![sized("a"), sized("b"), sized("c")];
        let output = vec![placed("a", 0.0), placed("a", 0.0)];
        assert_eq!(
            match_vertices(&input, output).unwrap_err(),
            MatchError::RepeatedVertices {
                keys: vec!["a".into()]
            }
        );

        let output = vec![placed("b", 0.0)];
        let err = match_vertices(&input, output).unwrap_err();
        assert_eq!(
            err,
            MatchError::MissingVertices {
                keys: vec!["a".into(), "c".into()]
            }
        );
        assert!(err.to_string().contains("'a', 'c'"));
    }

    #[test]
    fn string_and_integer_keys_are_distinct() {
        let input = vec![SizedVertex {
            vertex: Arc::new(Vertex::new(VertexKey::Int(1), ())),
            size: Size::default(),
        }];
        let output = vec![LayoutVertex {
            key: "1".into(),
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
        }];
        assert!(match_vertices(&input, output).is_err());
    }

    #[test]
    fn matches_edges_by_pair() {
        let original = Arc::new(Edge::new("a", "b"));
        let input = vec![Arc::clone(&original)];
        let path = vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)];
        let output = vec![LayoutEdge {
            from: "a".into(),
            to: "b".into(),
            points: path.clone(),
        }];
        let matched = match_edges(&input, output).unwrap();
        assert_eq!(*matched[0].edge, *original);
        assert!(Arc::ptr_eq(&matched[0].edge, &original));
        assert_eq!(matched[0].points, path);
    }

    #[test]
    fn unknown_edge_pair_fails() {
        let input = vec![Arc::new(Edge::new("a", "b"))];
        let output = vec![LayoutEdge {
            from: "a".into(),
            to: "z".into(),
            points: Vec::new(),
        }];
        let err = match_edges(&input, output).unwrap_err();
        assert_eq!(
            err,
            MatchError::UnknownEdges {
                edges: vec![("a".into(), "z".into())]
            }
        );
    }

    #[test]
    fn repeated_and_dropped_edges_fail() {
        let input = vec![Arc::new(Edge::new("a", "b")), Arc::new(Edge::new("b", "c"))];
        let edge = |from: &str, to: &str| LayoutEdge {
            from: from.into(),
            to: to.into(),
            points: Vec::new(),
        };

        let err = match_edges(&input, vec![edge("a", "b"), edge("a", "b")]).unwrap_err();
        assert_eq!(
            err,
            MatchError::RepeatedEdges {
                edges: vec![("a".into(), "b".into())]
            }
        );

        let err = match_edges(&input, vec![edge("b", "c")]).unwrap_err();
        assert_eq!(
            err,
            MatchError::MissingEdges {
                edges: vec![("a".into(), "b".into())]
            }
        );
    }

    #[test]
    fn reversed_pair_is_a_different_edge() {
        let input = vec![Arc::new(Edge::new("a", "b"))];
        let output = vec![LayoutEdge {
            from: "b".into(),
            to: "a".into(),
            points: Vec::new(),
        }];
        assert!(match_edges(&input, output).is_err());
    }
}
