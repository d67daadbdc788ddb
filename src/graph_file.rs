use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::ir::{Edge, Size, Vertex, VertexKey};

/// JSON graph description read by the `plx` binary.
///
/// ```json
/// { "vertices": [{ "key": "a", "label": "Service A" }, { "key": 2, "size": { "width": 40, "height": 20 } }],
///   "edges": [{ "from": "a", "to": 2 }] }
/// ```
#[derive(Debug, Deserialize)]
pub struct GraphFile {
    pub vertices: Vec<VertexRecord>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
pub struct VertexRecord {
    pub key: VertexKey,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub data: Value,
}

pub type Graph = (Vec<Arc<Vertex<Value>>>, Vec<Arc<Edge>>);

pub fn parse_graph(input: &str) -> Result<Graph> {
    let file: GraphFile = serde_json::from_str(input).context("invalid graph file")?;
    let vertices = file
        .vertices
        .into_iter()
        .map(|record| {
            Arc::new(Vertex {
                key: record.key,
                label: record.label,
                size: record.size,
                data: record.data,
            })
        })
        .collect();
    let edges = file.edges.into_iter().map(Arc::new).collect();
    Ok((vertices, edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_keys_and_optional_fields() {
        let (vertices, edges) = parse_graph(
            r#"{
                "vertices": [
                    { "key": "a", "label": "Service A", "data": { "calls": 3 } },
                    { "key": 2, "size": { "width": 40, "height": 20 } }
                ],
                "edges": [{ "from": "a", "to": 2, "isBidirectional": true }]
            }"#,
        )
        .unwrap();
        assert_eq!(vertices[0].key, VertexKey::from("a"));
        assert_eq!(vertices[0].data["calls"], 3);
        assert_eq!(vertices[1].key, VertexKey::Int(2));
        assert_eq!(vertices[1].size, Some(Size::new(40.0, 20.0)));
        assert_eq!(edges[0].to, VertexKey::Int(2));
        assert!(edges[0].is_bidirectional);
    }

    #[test]
    fn rejects_missing_vertices() {
        assert!(parse_graph(r#"{ "edges": [] }"#).is_err());
    }
}
