use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    /// In-process layered layout.
    #[default]
    Layered,
    /// Graphviz `dot`, run as a child process.
    Dot,
    /// Graphviz `neato`, run as a child process.
    Neato,
}

impl LayoutEngine {
    pub fn graphviz_name(self) -> Option<&'static str> {
        match self {
            LayoutEngine::Layered => None,
            LayoutEngine::Dot => Some("dot"),
            LayoutEngine::Neato => Some("neato"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRouting {
    Straight,
    #[default]
    Polyline,
    Spline,
}

impl EdgeRouting {
    pub fn dot_splines(self) -> &'static str {
        match self {
            EdgeRouting::Straight => "line",
            EdgeRouting::Polyline => "polyline",
            EdgeRouting::Spline => "true",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB", alias = "TD")]
    TopDown,
    #[serde(rename = "LR")]
    LeftRight,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" => Some(Self::TopDown),
            "LR" => Some(Self::LeftRight),
            _ => None,
        }
    }

    pub fn rankdir(self) -> &'static str {
        match self {
            Direction::TopDown => "TB",
            Direction::LeftRight => "LR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub engine: LayoutEngine,
    pub edge_routing: EdgeRouting,
    pub direction: Direction,
    pub rank_separation: f32,
    pub node_separation: f32,
    pub order_passes: usize,
    pub margin: f32,
    /// Graphviz executable directory; `None` searches `PATH`.
    pub graphviz_bin: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            engine: LayoutEngine::Layered,
            edge_routing: EdgeRouting::Polyline,
            direction: Direction::TopDown,
            rank_separation: 50.0,
            node_separation: 50.0,
            order_passes: 4,
            margin: 8.0,
            graphviz_bin: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrokeConfig {
    pub min_width: f32,
    pub max_width: f32,
    /// Scale above which the minimum width applies.
    pub threshold_min: f32,
    /// Scale below which the maximum width applies.
    pub threshold_max: f32,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            min_width: 2.0,
            max_width: 4.2,
            threshold_min: 0.6,
            threshold_max: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub zoom_enabled: bool,
    pub small_scale_threshold: f32,
    pub stroke: StrokeConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            zoom_enabled: true,
            small_scale_threshold: 0.33,
            stroke: StrokeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureConfig {
    pub font_family: String,
    pub font_size: f32,
    pub label_line_height: f32,
    pub max_label_width_chars: usize,
    pub padding_x: f32,
    pub padding_y: f32,
    /// Measure with installed font metrics; otherwise estimate from character counts.
    pub font_metrics: bool,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            label_line_height: 1.5,
            max_label_width_chars: 22,
            padding_x: 16.0,
            padding_y: 10.0,
            font_metrics: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub view: ViewConfig,
    pub measure: MeasureConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StrokeConfigFile {
    min_width: Option<f32>,
    max_width: Option<f32>,
    threshold_min: Option<f32>,
    threshold_max: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MeasureConfigFile {
    font_family: Option<String>,
    font_size: Option<f32>,
    label_line_height: Option<f32>,
    max_label_width_chars: Option<usize>,
    padding_x: Option<f32>,
    padding_y: Option<f32>,
    font_metrics: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout_engine: Option<LayoutEngine>,
    edge_routing: Option<EdgeRouting>,
    direction: Option<String>,
    rank_separation: Option<f32>,
    node_separation: Option<f32>,
    order_passes: Option<usize>,
    margin: Option<f32>,
    graphviz_bin: Option<String>,
    zoom_enabled: Option<bool>,
    small_scale_threshold: Option<f32>,
    stroke: Option<StrokeConfigFile>,
    measure: Option<MeasureConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(v) = parsed.layout_engine {
        config.layout.engine = v;
    }
    if let Some(v) = parsed.edge_routing {
        config.layout.edge_routing = v;
    }
    if let Some(token) = parsed.direction.as_deref() {
        config.layout.direction = Direction::from_token(token)
            .ok_or_else(|| anyhow::anyhow!("Unknown direction {token:?}, expected TB or LR"))?;
    }
    if let Some(v) = parsed.rank_separation {
        config.layout.rank_separation = v;
    }
    if let Some(v) = parsed.node_separation {
        config.layout.node_separation = v;
    }
    if let Some(v) = parsed.order_passes {
        config.layout.order_passes = v;
    }
    if let Some(v) = parsed.margin {
        config.layout.margin = v;
    }
    if parsed.graphviz_bin.is_some() {
        config.layout.graphviz_bin = parsed.graphviz_bin;
    }
    if let Some(v) = parsed.zoom_enabled {
        config.view.zoom_enabled = v;
    }
    if let Some(v) = parsed.small_scale_threshold {
        config.view.small_scale_threshold = v;
    }

    if let Some(stroke) = parsed.stroke {
        if let Some(v) = stroke.min_width {
            config.view.stroke.min_width = v;
        }
        if let Some(v) = stroke.max_width {
            config.view.stroke.max_width = v;
        }
        if let Some(v) = stroke.threshold_min {
            config.view.stroke.threshold_min = v;
        }
        if let Some(v) = stroke.threshold_max {
            config.view.stroke.threshold_max = v;
        }
        if config.view.stroke.threshold_max >= config.view.stroke.threshold_min {
            return Err(anyhow::anyhow!(
                "stroke.thresholdMax ({}) must be below stroke.thresholdMin ({})",
                config.view.stroke.threshold_max,
                config.view.stroke.threshold_min
            ));
        }
    }

    if let Some(measure) = parsed.measure {
        if let Some(v) = measure.font_family {
            config.measure.font_family = v;
        }
        if let Some(v) = measure.font_size {
            config.measure.font_size = v;
        }
        if let Some(v) = measure.label_line_height {
            config.measure.label_line_height = v;
        }
        if let Some(v) = measure.max_label_width_chars {
            config.measure.max_label_width_chars = v;
        }
        if let Some(v) = measure.padding_x {
            config.measure.padding_x = v;
        }
        if let Some(v) = measure.padding_y {
            config.measure.padding_y = v;
        }
        if let Some(v) = measure.font_metrics {
            config.measure.font_metrics = v;
        }
    }

    Ok(config)
}
