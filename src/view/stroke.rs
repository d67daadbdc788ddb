use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::StrokeConfig;

use super::ViewState;
use super::props::{PropSetter, Props};

pub const STROKE_WIDTH: &str = "stroke-width";

/// Edge stroke width as a function of zoom scale.
///
/// Zoomed in past `threshold_min` the width is `min_width`; zoomed out past `threshold_max`
/// it is `max_width`; in between it is interpolated and rounded to one decimal. Results are
/// shared: the same `k` twice in a row returns the same `Rc`, and scales that round to the
/// same width share one object.
#[derive(Debug)]
pub struct ScaledStrokeWidth {
    config: StrokeConfig,
    min: Rc<Props>,
    max: Rc<Props>,
    last: Option<(f32, Rc<Props>)>,
    by_width: HashMap<String, Rc<Props>>,
}

impl ScaledStrokeWidth {
    pub fn new(config: StrokeConfig) -> Self {
        let fixed = |width: f32| {
            Rc::new(Props::new().with_style(STROKE_WIDTH, one_decimal(f64::from(width))))
        };
        let min = fixed(config.min_width);
        let max = fixed(config.max_width);
        Self {
            config,
            min,
            max,
            last: None,
            by_width: HashMap::new(),
        }
    }

    pub fn props_for(&mut self, k: f32) -> Rc<Props> {
        if let Some((last_k, props)) = &self.last
            && *last_k == k
        {
            return props.clone();
        }
        let props = self.compute(k);
        self.last = Some((k, props.clone()));
        props
    }

    fn compute(&mut self, k: f32) -> Rc<Props> {
        let StrokeConfig {
            min_width,
            max_width,
            threshold_min,
            threshold_max,
        } = self.config;
        // A missing scale (NaN) renders like an unzoomed view.
        if k.is_nan() || k > threshold_min {
            return self.min.clone();
        }
        if k < threshold_max {
            return self.max.clone();
        }
        let (min_width, max_width) = (f64::from(min_width), f64::from(max_width));
        let (threshold_min, threshold_max) = (f64::from(threshold_min), f64::from(threshold_max));
        let width = min_width
            + (max_width - min_width) * (threshold_min - f64::from(k))
                / (threshold_min - threshold_max);
        let rounded = one_decimal(width);
        self.by_width
            .entry(format!("{rounded:.1}"))
            .or_insert_with(|| Rc::new(Props::new().with_style(STROKE_WIDTH, rounded)))
            .clone()
    }
}

// Rounds in f64 so the stored value serializes with one decimal.
fn one_decimal(width: f64) -> f64 {
    (width * 10.0).round() / 10.0
}

/// Edges-container setter backed by a [`ScaledStrokeWidth`] owned by the setter.
pub fn scaled_stroke_width(config: StrokeConfig) -> PropSetter<ViewState> {
    let cache = RefCell::new(ScaledStrokeWidth::new(config));
    Rc::new(move |state: &ViewState| Some(cache.borrow_mut().props_for(state.zoom_transform.k)))
}
