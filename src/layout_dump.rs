use crate::config::EdgeRouting;
use crate::ir::VertexKey;
use crate::layout::edge_path_data;
use crate::view::{Props, RenderFrame, ZoomTransform};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub generation: Option<u64>,
    pub phase: String,
    pub width: f32,
    pub height: f32,
    pub transform: ZoomTransform,
    pub root: Props,
    pub nodes_container: Props,
    pub edges_container: Props,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub key: VertexKey,
    pub label: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub props: Props,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: VertexKey,
    pub to: VertexKey,
    pub label: Option<String>,
    pub bidirectional: bool,
    pub points: Vec<[f32; 2]>,
    pub path: String,
    pub props: Props,
}

impl LayoutDump {
    pub fn from_frame<T>(frame: &RenderFrame<T>, routing: EdgeRouting) -> Self {
        let (width, height, nodes, edges) = match &frame.layout {
            Some(layout) => {
                let nodes = layout
                    .vertices
                    .iter()
                    .zip(&frame.nodes)
                    .map(|(node, props)| NodeDump {
                        key: node.vertex.key.clone(),
                        label: node.vertex.label.clone(),
                        x: node.left,
                        y: node.top,
                        width: node.width,
                        height: node.height,
                        props: (**props).clone(),
                    })
                    .collect();
                let edges = layout
                    .edges
                    .iter()
                    .zip(&frame.edge_paths)
                    .map(|(edge, props)| EdgeDump {
                        from: edge.edge.from.clone(),
                        to: edge.edge.to.clone(),
                        label: edge.edge.label.clone(),
                        bidirectional: edge.edge.is_bidirectional,
                        points: edge.points.iter().map(|p| [p.x, p.y]).collect(),
                        path: edge_path_data(&edge.points, routing),
                        props: (**props).clone(),
                    })
                    .collect();
                (layout.width, layout.height, nodes, edges)
            }
            None => (0.0, 0.0, Vec::new(), Vec::new()),
        };

        LayoutDump {
            generation: frame.state.generation.map(|g| g.value()),
            phase: frame.state.phase.to_string(),
            width,
            height,
            transform: frame.state.zoom_transform,
            root: (*frame.root).clone(),
            nodes_container: (*frame.nodes_container).clone(),
            edges_container: (*frame.edges_container).clone(),
            nodes,
            edges,
            error: frame.latest_error.as_ref().map(|err| err.to_string()),
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or to stdout when no path is given.
pub fn write_layout_dump(path: Option<&Path>, dump: &LayoutDump) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
