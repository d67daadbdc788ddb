use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::ViewState;

/// Value of a style entry or attribute.
#[derive(Clone)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Flag(bool),
    /// Callback attached by the caller, e.g. a click handler. Compared by pointer.
    Handler(Rc<dyn Fn()>),
}

impl AttrValue {
    pub fn handler(f: impl Fn() + 'static) -> Self {
        AttrValue::Handler(Rc::new(f))
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(value) => f.debug_tuple("Text").field(value).finish(),
            AttrValue::Number(value) => f.debug_tuple("Number").field(value).finish(),
            AttrValue::Flag(value) => f.debug_tuple("Flag").field(value).finish(),
            AttrValue::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Text(a), AttrValue::Text(b)) => a == b,
            (AttrValue::Number(a), AttrValue::Number(b)) => a == b,
            (AttrValue::Flag(a), AttrValue::Flag(b)) => a == b,
            (AttrValue::Handler(a), AttrValue::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Text(value) => serializer.serialize_str(value),
            AttrValue::Number(value) => serializer.serialize_f64(*value),
            AttrValue::Flag(value) => serializer.serialize_bool(*value),
            AttrValue::Handler(_) => serializer.serialize_none(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

/// Attribute object applied to one rendered element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Props {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, AttrValue>,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.class_name.is_none() && self.style.is_empty() && self.attrs.is_empty()
    }

    /// Layers `other` over `self`: class names are appended, style entries and attributes
    /// from `other` replace existing ones.
    pub fn merge(&mut self, other: &Props) {
        if let Some(extra) = other.class_name.as_deref().filter(|name| !name.is_empty()) {
            self.class_name = Some(match self.class_name.take() {
                Some(existing) if !existing.is_empty() => format!("{existing} {extra}"),
                _ => extra.to_string(),
            });
        }
        for (key, value) in &other.style {
            self.style.insert(key.clone(), value.clone());
        }
        for (key, value) in &other.attrs {
            self.attrs.insert(key.clone(), value.clone());
        }
    }
}

/// Maps a context (view state, vertex or edge) to attributes, or to nothing.
pub type PropSetter<C> = Rc<dyn Fn(&C) -> Option<Rc<Props>>>;

/// Wraps a closure producing owned props as a [`PropSetter`].
pub fn prop_setter<C: ?Sized + 'static>(f: impl Fn(&C) -> Option<Props> + 'static) -> PropSetter<C> {
    Rc::new(move |ctx: &C| f(ctx).map(Rc::new))
}

/// Merges attribute objects in order. A single object is returned as is; no objects yield
/// empty props.
pub fn merge_props(items: impl IntoIterator<Item = Rc<Props>>) -> Rc<Props> {
    let mut items = items.into_iter();
    let Some(first) = items.next() else {
        return Rc::new(Props::default());
    };
    let Some(second) = items.next() else {
        return first;
    };
    let mut merged = (*first).clone();
    merged.merge(&second);
    for item in items {
        merged.merge(&item);
    }
    Rc::new(merged)
}

/// Composes setters into one.
///
/// Setters run in the order given and later setters take precedence: `class_name` values are
/// space-joined in order, `style` entries are shallow-merged with later keys winning, and
/// every other attribute is last-write-wins. Setters returning `None` contribute nothing.
/// When exactly one setter produces props, that object is passed through unchanged so
/// downstream pointer comparisons still hold.
pub fn merge_prop_setters<C: ?Sized + 'static>(setters: Vec<PropSetter<C>>) -> PropSetter<C> {
    Rc::new(move |ctx: &C| Some(merge_props(setters.iter().filter_map(|setter| setter(ctx)))))
}

pub const IS_SMALL_CLASS: &str = "is-small";

/// Root setter adding the `is-small` class while the zoom scale is below `threshold`.
pub fn class_name_is_small(threshold: f32) -> PropSetter<ViewState> {
    let props = Rc::new(Props::new().with_class(IS_SMALL_CLASS));
    Rc::new(move |state: &ViewState| (state.zoom_transform.k < threshold).then(|| props.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(props: Option<Props>) -> PropSetter<()> {
        prop_setter(move |_: &()| props.clone())
    }

    #[test]
    fn class_names_join_and_styles_merge() {
        let merged = merge_prop_setters(vec![
            fixed(Some(Props::new().with_class("x"))),
            fixed(Some(Props::new().with_class("y").with_style("color", "red"))),
        ]);
        let props = merged(&()).unwrap();
        assert_eq!(*props, Props::new().with_class("x y").with_style("color", "red"));
    }

    #[test]
    fn empty_results_are_skipped() {
        let merged = merge_prop_setters(vec![
            fixed(None),
            fixed(Some(Props::new().with_style("color", "red"))),
            fixed(None),
        ]);
        let props = merged(&()).unwrap();
        assert_eq!(*props, Props::new().with_style("color", "red"));
        assert_eq!(props.class_name, None);
    }

    #[test]
    fn no_setters_yield_empty_props() {
        let merged = merge_prop_setters::<()>(Vec::new());
        assert!(merged(&()).unwrap().is_empty());
        let merged = merge_prop_setters(vec![fixed(None)]);
        assert!(merged(&()).unwrap().is_empty());
    }

    #[test]
    fn later_setters_win_for_style_and_attrs() {
        let first_click = AttrValue::handler(|| {});
        let second_click = AttrValue::handler(|| {});
        let merged = merge_prop_setters(vec![
            fixed(Some(
                Props::new()
                    .with_style("color", "red")
                    .with_style("opacity", 0.5)
                    .with_attr("onClick", first_click.clone()),
            )),
            fixed(Some(
                Props::new()
                    .with_style("color", "blue")
                    .with_attr("onClick", second_click.clone()),
            )),
        ]);
        let props = merged(&()).unwrap();
        assert_eq!(props.style["color"], AttrValue::from("blue"));
        assert_eq!(props.style["opacity"], AttrValue::Number(0.5));
        assert_eq!(props.attrs["onClick"], second_click);
        assert_ne!(props.attrs["onClick"], first_click);
    }

    #[test]
    fn single_result_passes_through_by_reference() {
        let shared = Rc::new(Props::new().with_class("only"));
        let inner = shared.clone();
        let merged = merge_prop_setters(vec![
            fixed(None),
            Rc::new(move |_: &()| Some(inner.clone())) as PropSetter<()>,
        ]);
        assert!(Rc::ptr_eq(&merged(&()).unwrap(), &shared));
    }

    #[test]
    fn serializes_like_element_attributes() {
        let props = Props::new()
            .with_class("node")
            .with_style("stroke-width", 2.0)
            .with_attr("data-key", "a")
            .with_attr("onClick", AttrValue::handler(|| {}));
        let json = serde_json::to_value(&*merge_props([Rc::new(props)])).unwrap();
        assert_eq!(json["className"], "node");
        assert_eq!(json["style"]["stroke-width"], 2.0);
        assert_eq!(json["data-key"], "a");
        assert!(json["onClick"].is_null());
    }
}
