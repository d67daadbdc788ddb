use crate::config::{Config, load_config};
use crate::graph_file::{Graph, parse_graph};
use crate::ir::{Edge, Size, Vertex};
use crate::layout::graphviz::{dot_names, to_dot};
use crate::layout::{
    InputEdge, InputVertex, LabelMeasurer, LayoutManager, LayoutOptions, LayoutRequest,
    algorithm_for,
};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::view::{GraphView, Props, ZoomTransform, prop_setter};
use anyhow::{Result, anyhow, ensure};
use clap::Parser;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "plx", version, about = "Lay out a directed graph and dump its geometry")]
pub struct Args {
    /// Input graph (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Zoom scale applied before computing per-element attributes
    #[arg(short = 'z', long = "zoom")]
    pub zoom: Option<f32>,

    /// Viewport width; with --height, fits the layout into the viewport
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Print the Graphviz DOT description instead of laying out
    #[arg(long = "emit-dot")]
    pub emit_dot: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let graph = parse_graph(&input)?;

    if args.emit_dot {
        let dot = render_dot(&graph, &config)?;
        return write_text(args.output.as_deref(), &dot);
    }

    let viewport = args.width.zip(args.height);
    let dump = lay_out(graph, &config, args.zoom, viewport)?;
    write_layout_dump(args.output.as_deref(), &dump)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Runs the full pipeline with the built-in measurer and the configured engine.
pub fn lay_out(
    (vertices, edges): Graph,
    config: &Config,
    zoom: Option<f32>,
    viewport: Option<(f32, f32)>,
) -> Result<LayoutDump> {
    let manager: LayoutManager<Value> = LayoutManager::new(
        Box::new(LabelMeasurer::new(config.measure.clone())),
        algorithm_for(&config.layout),
        LayoutOptions::from(&config.layout),
    );
    let mut view = GraphView::new(manager, config.view.clone());
    view.set_on_node(vec![prop_setter(|vertex: &Vertex<Value>| {
        Some(
            Props::new()
                .with_class("plx-node")
                .with_attr("data-key", vertex.key.to_string()),
        )
    })]);
    view.set_on_edge_path(vec![prop_setter(|edge: &Edge| {
        let class = if edge.is_bidirectional {
            "plx-edge is-bidirectional"
        } else {
            "plx-edge"
        };
        Some(Props::new().with_class(class))
    })]);

    view.set_graph(vertices, edges)?;
    if view.layout().is_none() {
        return Err(anyhow!("layout did not complete (phase {})", view.phase()));
    }

    if let Some(k) = zoom {
        ensure!(k.is_finite(), "zoom scale must be a finite number, got {k}");
        view.set_transform(ZoomTransform {
            k,
            ..ZoomTransform::identity()
        });
    } else if let Some((width, height)) = viewport {
        view.fit_to(Size::new(width, height));
    }

    Ok(LayoutDump::from_frame(&view.frame(), config.layout.edge_routing))
}

fn render_dot((vertices, edges): &Graph, config: &Config) -> Result<String> {
    let measurer = LabelMeasurer::new(config.measure.clone());
    let request = LayoutRequest {
        vertices: vertices
            .iter()
            .map(|vertex| {
                let size = measurer.measure(vertex);
                InputVertex {
                    key: vertex.key.clone(),
                    width: size.width,
                    height: size.height,
                }
            })
            .collect(),
        edges: edges
            .iter()
            .map(|edge| InputEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
            })
            .collect(),
        options: LayoutOptions::from(&config.layout),
    };
    let names = dot_names(&request)?;
    Ok(to_dot(&request, &names))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_text(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text)?,
        None => io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}
