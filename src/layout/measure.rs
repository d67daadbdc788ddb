use std::sync::Arc;

use crate::config::MeasureConfig;
use crate::ir::{Size, Vertex};
use crate::text_metrics::{estimate_text_width, measure_text_width};

use super::Generation;
use super::algorithm::Reply;
use super::error::MeasureError;

/// Sizes vertices before layout. Sizes are returned in the order the vertices were given.
///
/// A surface that measures asynchronously returns `Reply::Pending` and later passes the sizes
/// to `LayoutManager::complete_measurement` with the same generation.
pub trait SizeMeasurer<T> {
    fn request_sizes(
        &mut self,
        generation: Generation,
        vertices: &[Arc<Vertex<T>>],
    ) -> Reply<Result<Vec<Size>, MeasureError>>;
}

impl<T, M: SizeMeasurer<T> + ?Sized> SizeMeasurer<T> for Box<M> {
    fn request_sizes(
        &mut self,
        generation: Generation,
        vertices: &[Arc<Vertex<T>>],
    ) -> Reply<Result<Vec<Size>, MeasureError>> {
        (**self).request_sizes(generation, vertices)
    }
}

/// Sizes each vertex from its label text; a vertex with a size hint keeps the hint.
#[derive(Debug, Clone, Default)]
pub struct LabelMeasurer {
    config: MeasureConfig,
}

impl LabelMeasurer {
    pub fn new(config: MeasureConfig) -> Self {
        Self { config }
    }

    pub fn measure<T>(&self, vertex: &Vertex<T>) -> Size {
        if let Some(size) = vertex.size {
            return size;
        }
        let lines: Vec<String> = split_lines(&vertex.display_text())
            .iter()
            .flat_map(|line| wrap_line(line, self.config.max_label_width_chars.max(1)))
            .collect();
        let line_count = lines.len().max(1);
        let text_width = lines
            .iter()
            .map(|line| self.line_width(line))
            .fold(0.0f32, f32::max);
        let text_height =
            line_count as f32 * self.config.font_size * self.config.label_line_height;
        Size::new(
            text_width + self.config.padding_x * 2.0,
            text_height + self.config.padding_y * 2.0,
        )
    }

    fn line_width(&self, line: &str) -> f32 {
        let measured = if self.config.font_metrics {
            measure_text_width(line, self.config.font_size, &self.config.font_family)
        } else {
            None
        };
        measured.unwrap_or_else(|| estimate_text_width(line, self.config.font_size))
    }
}

impl<T> SizeMeasurer<T> for LabelMeasurer {
    fn request_sizes(
        &mut self,
        _generation: Generation,
        vertices: &[Arc<Vertex<T>>],
    ) -> Reply<Result<Vec<Size>, MeasureError>> {
        let mut sizes = Vec::with_capacity(vertices.len());
        for vertex in vertices {
            let size = self.measure(vertex);
            if !size.is_valid() {
                return Reply::Ready(Err(MeasureError::InvalidSize {
                    key: vertex.key.clone(),
                    width: size.width,
                    height: size.height,
                }));
            }
            sizes.push(size);
        }
        Reply::Ready(Ok(sizes))
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("\\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if candidate.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> LabelMeasurer {
        LabelMeasurer::new(MeasureConfig {
            font_metrics: false,
            ..MeasureConfig::default()
        })
    }

    #[test]
    fn size_hint_wins() {
        let vertex = Vertex::new("a", ()).with_label("ignored").with_size(40.0, 20.0);
        assert_eq!(estimator().measure(&vertex), Size::new(40.0, 20.0));
    }

    #[test]
    fn longer_labels_are_wider() {
        let measurer = estimator();
        let short = measurer.measure(&Vertex::new("a", ()));
        let long = measurer.measure(&Vertex::new("a", ()).with_label("a much longer label"));
        assert!(long.width > short.width);
        assert_eq!(long.height, short.height);
        assert!(short.width >= 32.0);
    }

    #[test]
    fn wrapped_labels_grow_taller() {
        let measurer = estimator();
        let one = measurer.measure(&Vertex::new("a", ()).with_label("one line"));
        let two = measurer.measure(&Vertex::new("a", ()).with_label("first<br>second"));
        assert!(two.height > one.height);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_line("alpha beta gamma", 11),
            vec!["alpha beta".to_string(), "gamma".to_string()]
        );
    }

    #[test]
    fn blank_label_still_gets_a_padded_size() {
        let vertices = vec![Arc::new(Vertex::new("blank", ()).with_label(""))];
        let mut measurer = estimator();
        match measurer.request_sizes(Generation(1), &vertices) {
            Reply::Ready(Ok(sizes)) => {
                assert_eq!(sizes.len(), 1);
                assert!(sizes[0].is_valid());
                assert!(sizes[0].width >= MeasureConfig::default().padding_x * 2.0);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_hint() {
        let vertices = vec![Arc::new(Vertex::new("bad", ()).with_size(f32::NAN, 1.0))];
        let mut measurer = estimator();
        match measurer.request_sizes(Generation(1), &vertices) {
            Reply::Ready(Err(MeasureError::InvalidSize { key, .. })) => {
                assert_eq!(key, "bad".into())
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
