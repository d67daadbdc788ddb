use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use plexus_layout::config::{EdgeRouting, MeasureConfig, StrokeConfig};
use plexus_layout::ir::{Edge, LayoutVertex, SizedVertex, Size, Vertex};
use plexus_layout::layout::layered::compute_layered;
use plexus_layout::layout::{
    InputEdge, InputVertex, LabelMeasurer, LayeredLayout, LayoutManager, LayoutOptions,
    LayoutRequest, match_vertices,
};
use plexus_layout::view::ScaledStrokeWidth;
use std::hint::black_box;
use std::sync::Arc;

fn dense_graph(nodes: usize, extra_edges: usize) -> (Vec<Arc<Vertex<()>>>, Vec<Arc<Edge>>) {
    let vertices = (0..nodes)
        .map(|i| Arc::new(Vertex::new(format!("N{i}"), ()).with_label(format!("Node {i}"))))
        .collect();
    let mut edges = Vec::new();
    for i in 0..nodes.saturating_sub(1) {
        edges.push(Arc::new(Edge::new(format!("N{i}"), format!("N{}", i + 1))));
    }
    let mut count = 0usize;
    'outer: for i in 0..nodes {
        for j in (i + 2)..nodes {
            if count >= extra_edges {
                break 'outer;
            }
            edges.push(Arc::new(Edge::new(format!("N{i}"), format!("N{j}"))));
            count += 1;
        }
    }
    (vertices, edges)
}

fn request_for(vertices: &[Arc<Vertex<()>>], edges: &[Arc<Edge>], routing: EdgeRouting) -> LayoutRequest {
    LayoutRequest {
        vertices: vertices
            .iter()
            .map(|v| InputVertex {
                key: v.key.clone(),
                width: 80.0,
                height: 36.0,
            })
            .collect(),
        edges: edges
            .iter()
            .map(|e| InputEdge {
                from: e.from.clone(),
                to: e.to.clone(),
            })
            .collect(),
        options: LayoutOptions {
            edge_routing: routing,
            ..LayoutOptions::default()
        },
    }
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_vertices");
    for nodes in [100usize, 1_000, 10_000] {
        let (vertices, _) = dense_graph(nodes, 0);
        let sized: Vec<SizedVertex<()>> = vertices
            .iter()
            .map(|v| SizedVertex {
                vertex: v.clone(),
                size: Size::new(80.0, 36.0),
            })
            .collect();
        let output: Vec<LayoutVertex> = vertices
            .iter()
            .rev()
            .enumerate()
            .map(|(idx, v)| LayoutVertex {
                key: v.key.clone(),
                left: idx as f32,
                top: 0.0,
                width: 80.0,
                height: 36.0,
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &output, |b, output| {
            b.iter(|| {
                let matched = match_vertices(black_box(&sized), output.clone()).expect("match failed");
                black_box(matched.len());
            });
        });
    }
    group.finish();
}

fn bench_layered(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered_layout");
    for (nodes, extra_edges) in [(40usize, 80usize), (60, 180), (80, 320)] {
        for routing in [EdgeRouting::Polyline, EdgeRouting::Spline] {
            let (vertices, edges) = dense_graph(nodes, extra_edges);
            let request = request_for(&vertices, &edges, routing);
            let name = format!("dense_{nodes}_{extra_edges}_{routing:?}");
            group.bench_with_input(BenchmarkId::from_parameter(name), &request, |b, request| {
                b.iter(|| {
                    let response = compute_layered(black_box(request)).expect("layout failed");
                    black_box(response.edges.len());
                });
            });
        }
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let measure = MeasureConfig {
        font_metrics: false,
        ..MeasureConfig::default()
    };
    for (nodes, extra_edges) in [(40usize, 80usize), (80, 320)] {
        let (vertices, edges) = dense_graph(nodes, extra_edges);
        let name = format!("dense_{nodes}_{extra_edges}");
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let mut manager: LayoutManager<(), _, _> = LayoutManager::new(
                    LabelMeasurer::new(measure.clone()),
                    LayeredLayout::new(),
                    LayoutOptions::default(),
                );
                manager
                    .request_layout(vertices.clone(), edges.clone())
                    .expect("pipeline failed");
                black_box(manager.layout().map(|l| l.vertices.len()));
            });
        });
    }
    group.finish();
}

fn bench_stroke_width(c: &mut Criterion) {
    c.bench_function("stroke_width_zoom_sweep", |b| {
        let mut cache = ScaledStrokeWidth::new(StrokeConfig::default());
        b.iter(|| {
            for step in 0..200 {
                let k = step as f32 / 200.0;
                black_box(cache.props_for(black_box(k)));
                black_box(cache.props_for(k));
            }
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_match, bench_layered, bench_pipeline, bench_stroke_width
);
criterion_main!(benches);
