pub mod props;
pub mod stroke;
pub mod zoom;

pub use props::{
    AttrValue, PropSetter, Props, class_name_is_small, merge_prop_setters, merge_props,
    prop_setter,
};
pub use stroke::{ScaledStrokeWidth, scaled_stroke_width};
pub use zoom::ZoomTransform;

use std::rc::Rc;
use std::sync::Arc;

use crate::config::ViewConfig;
use crate::ir::{Edge, LayoutSnapshot, Point, Size, Vertex};
use crate::layout::{
    AlgorithmError, Delivery, Generation, LayoutAlgorithm, LayoutError, LayoutManager,
    LayoutPhase, LayoutResponse, MeasureError, SizeMeasurer, Submission,
};

/// What root and container setters see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub zoom_transform: ZoomTransform,
    pub zoom_enabled: bool,
    pub phase: LayoutPhase,
    pub generation: Option<Generation>,
}

/// Everything a rendering surface needs for one render.
///
/// `nodes` and `edge_paths` run parallel to `layout.vertices` and `layout.edges`.
#[derive(Debug)]
pub struct RenderFrame<T> {
    pub layout: Option<Arc<LayoutSnapshot<T>>>,
    pub state: ViewState,
    /// Failure of the most recent request. `layout` still holds the last good layout.
    pub latest_error: Option<LayoutError>,
    pub root: Rc<Props>,
    pub nodes_container: Rc<Props>,
    pub edges_container: Rc<Props>,
    pub nodes: Vec<Rc<Props>>,
    pub edge_paths: Vec<Rc<Props>>,
}

/// Interactive graph view: submits graphs to a [`LayoutManager`], keeps the last completed
/// layout on screen and derives per-element attributes for each frame.
pub struct GraphView<T, M = Box<dyn SizeMeasurer<T>>, A = Box<dyn LayoutAlgorithm>> {
    manager: LayoutManager<T, M, A>,
    config: ViewConfig,
    transform: ZoomTransform,
    root_base: PropSetter<ViewState>,
    edges_base: PropSetter<ViewState>,
    root: PropSetter<ViewState>,
    nodes_container: Option<PropSetter<ViewState>>,
    node: Option<PropSetter<Vertex<T>>>,
    edges_container: PropSetter<ViewState>,
    edge_path: Option<PropSetter<Edge>>,
    layout: Option<Arc<LayoutSnapshot<T>>>,
    latest_error: Option<LayoutError>,
}

impl<T, M, A> GraphView<T, M, A>
where
    T: 'static,
    M: SizeMeasurer<T>,
    A: LayoutAlgorithm,
{
    pub fn new(manager: LayoutManager<T, M, A>, config: ViewConfig) -> Self {
        let root_base = class_name_is_small(config.small_scale_threshold);
        let edges_base = scaled_stroke_width(config.stroke);
        Self {
            manager,
            transform: ZoomTransform::identity(),
            root: root_base.clone(),
            edges_container: edges_base.clone(),
            root_base,
            edges_base,
            nodes_container: None,
            node: None,
            edge_path: None,
            layout: None,
            latest_error: None,
            config,
        }
    }

    pub fn manager(&self) -> &LayoutManager<T, M, A> {
        &self.manager
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn phase(&self) -> LayoutPhase {
        self.manager.phase()
    }

    /// Last completed layout, which may belong to an older generation than the current one.
    pub fn layout(&self) -> Option<&Arc<LayoutSnapshot<T>>> {
        self.layout.as_ref()
    }

    pub fn latest_error(&self) -> Option<&LayoutError> {
        self.latest_error.as_ref()
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            zoom_transform: self.transform,
            zoom_enabled: self.config.zoom_enabled,
            phase: self.manager.phase(),
            generation: self.manager.current_generation(),
        }
    }

    pub fn set_graph(
        &mut self,
        vertices: Vec<Arc<Vertex<T>>>,
        edges: Vec<Arc<Edge>>,
    ) -> Result<Submission, LayoutError> {
        match self.manager.request_layout(vertices, edges) {
            Ok(submission) => {
                if matches!(submission, Submission::Issued { .. }) {
                    self.latest_error = None;
                }
                if let Some(layout) = self.manager.layout() {
                    self.layout = Some(layout);
                }
                Ok(submission)
            }
            Err(err) => {
                self.latest_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn complete_measurement(
        &mut self,
        generation: Generation,
        result: Result<Vec<Size>, MeasureError>,
    ) -> Result<Delivery<T>, LayoutError> {
        let delivery = self.manager.complete_measurement(generation, result);
        self.observe(delivery)
    }

    pub fn complete_layout(
        &mut self,
        generation: Generation,
        result: Result<LayoutResponse, AlgorithmError>,
    ) -> Result<Delivery<T>, LayoutError> {
        let delivery = self.manager.complete_layout(generation, result);
        self.observe(delivery)
    }

    fn observe(
        &mut self,
        delivery: Result<Delivery<T>, LayoutError>,
    ) -> Result<Delivery<T>, LayoutError> {
        match &delivery {
            Ok(Delivery::Done(layout)) => {
                self.layout = Some(layout.clone());
                self.latest_error = None;
            }
            Err(err) => self.latest_error = Some(err.clone()),
            Ok(_) => {}
        }
        delivery
    }

    /// Turning zoom off resets the transform to identity.
    pub fn set_zoom_enabled(&mut self, enabled: bool) {
        self.config.zoom_enabled = enabled;
        if !enabled {
            self.transform = ZoomTransform::identity();
        }
    }

    /// Each zoom operation returns whether it was applied; all are ignored while zoom is off.
    /// The scale is clamped to the zoom range and non-finite transforms are rejected.
    pub fn set_transform(&mut self, transform: ZoomTransform) -> bool {
        if !self.config.zoom_enabled {
            return false;
        }
        let Some(transform) = transform.clamped() else {
            return false;
        };
        self.transform = transform;
        true
    }

    pub fn zoom_at(&mut self, screen: Point, factor: f32) -> bool {
        self.set_transform(self.transform.zoom_at(screen, factor))
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) -> bool {
        self.set_transform(self.transform.translate_by(dx, dy))
    }

    pub fn fit_to(&mut self, viewport: Size) -> bool {
        let Some(layout) = &self.layout else {
            return false;
        };
        let content = Size::new(layout.width, layout.height);
        self.set_transform(ZoomTransform::fit(content, viewport))
    }

    pub fn set_on_root(&mut self, setters: Vec<PropSetter<ViewState>>) {
        self.root = with_base(&self.root_base, setters);
    }

    pub fn set_on_nodes_container(&mut self, setters: Vec<PropSetter<ViewState>>) {
        self.nodes_container = composed(setters);
    }

    pub fn set_on_node(&mut self, setters: Vec<PropSetter<Vertex<T>>>) {
        self.node = composed(setters);
    }

    pub fn set_on_edges_container(&mut self, setters: Vec<PropSetter<ViewState>>) {
        self.edges_container = with_base(&self.edges_base, setters);
    }

    pub fn set_on_edge_path(&mut self, setters: Vec<PropSetter<Edge>>) {
        self.edge_path = composed(setters);
    }

    pub fn frame(&self) -> RenderFrame<T> {
        let state = self.view_state();
        let empty = Rc::new(Props::default());
        let apply = |setter: Option<&PropSetter<ViewState>>| {
            setter
                .and_then(|setter| setter(&state))
                .unwrap_or_else(|| empty.clone())
        };

        let (nodes, edge_paths) = match &self.layout {
            Some(layout) => (
                layout
                    .vertices
                    .iter()
                    .map(|v| {
                        self.node
                            .as_ref()
                            .and_then(|setter| setter(v.vertex.as_ref()))
                            .unwrap_or_else(|| empty.clone())
                    })
                    .collect(),
                layout
                    .edges
                    .iter()
                    .map(|e| {
                        self.edge_path
                            .as_ref()
                            .and_then(|setter| setter(e.edge.as_ref()))
                            .unwrap_or_else(|| empty.clone())
                    })
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        RenderFrame {
            layout: self.layout.clone(),
            state,
            latest_error: self.latest_error.clone(),
            root: apply(Some(&self.root)),
            nodes_container: apply(self.nodes_container.as_ref()),
            edges_container: apply(Some(&self.edges_container)),
            nodes,
            edge_paths,
        }
    }
}

fn with_base<C: ?Sized + 'static>(
    base: &PropSetter<C>,
    setters: Vec<PropSetter<C>>,
) -> PropSetter<C> {
    let mut all = Vec::with_capacity(setters.len() + 1);
    all.push(base.clone());
    all.extend(setters);
    merge_prop_setters(all)
}

fn composed<C: ?Sized + 'static>(setters: Vec<PropSetter<C>>) -> Option<PropSetter<C>> {
    (!setters.is_empty()).then(|| merge_prop_setters(setters))
}
