use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::ir::{LayoutEdge, LayoutVertex, Point, VertexKey};

use super::Generation;
use super::algorithm::{LayoutAlgorithm, LayoutRequest, LayoutResponse, Reply};
use super::error::AlgorithmError;

const POINTS_PER_INCH: f32 = 72.0;

static BARE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static NUMERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(\.[0-9]+|[0-9]+(\.[0-9]*)?)$").unwrap());

/// Runs Graphviz (`dot` or `neato`) as a child process and reads back its `plain` output.
#[derive(Debug, Clone, Default)]
pub struct GraphvizProcess {
    bin_dir: Option<PathBuf>,
}

impl GraphvizProcess {
    pub fn new(bin_dir: Option<&str>) -> Self {
        Self {
            bin_dir: bin_dir.map(PathBuf::from),
        }
    }

    fn program(&self, engine: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(engine),
            None => PathBuf::from(engine),
        }
    }

    fn run(&self, request: &LayoutRequest) -> Result<LayoutResponse, AlgorithmError> {
        let engine = request.options.engine.graphviz_name().unwrap_or("dot");
        let names = dot_names(request)?;
        let dot = to_dot(request, &names);
        let program = self.program(engine);
        let program_name = program.display().to_string();

        let mut child = Command::new(&program)
            .arg("-Tplain")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| AlgorithmError::Spawn {
                program: program_name.clone(),
                message: err.to_string(),
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot.as_bytes())
                .map_err(|err| AlgorithmError::Spawn {
                    program: program_name.clone(),
                    message: err.to_string(),
                })?;
        }
        let output = child.wait_with_output().map_err(|err| AlgorithmError::Spawn {
            program: program_name.clone(),
            message: err.to_string(),
        })?;
        if !output.status.success() {
            return Err(AlgorithmError::Exit {
                program: program_name,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let by_name: HashMap<String, VertexKey> = names
            .into_iter()
            .map(|(key, name)| (name, key.clone()))
            .collect();
        parse_plain(&String::from_utf8_lossy(&output.stdout), &by_name)
    }
}

impl LayoutAlgorithm for GraphvizProcess {
    fn name(&self) -> &str {
        "graphviz"
    }

    fn request_layout(
        &mut self,
        generation: Generation,
        request: LayoutRequest,
    ) -> Reply<Result<LayoutResponse, AlgorithmError>> {
        tracing::debug!(%generation, engine = ?request.options.engine, "invoking graphviz");
        Reply::Ready(self.run(&request))
    }
}

/// DOT identifier for every vertex key. Keys whose text collides are rejected.
pub fn dot_names(request: &LayoutRequest) -> Result<HashMap<&VertexKey, String>, AlgorithmError> {
    let mut names = HashMap::with_capacity(request.vertices.len());
    let mut seen: HashMap<String, &VertexKey> = HashMap::with_capacity(request.vertices.len());
    for vertex in &request.vertices {
        let name = vertex.key.to_string();
        if let Some(other) = seen.insert(name.clone(), &vertex.key)
            && *other != vertex.key
        {
            return Err(AlgorithmError::Failed(format!(
                "vertex keys {other:?} and {:?} share the DOT id {name:?}",
                vertex.key
            )));
        }
        names.insert(&vertex.key, name);
    }
    Ok(names)
}

const DOT_KEYWORDS: [&str; 6] = ["node", "edge", "graph", "digraph", "subgraph", "strict"];

fn quote_id(name: &str) -> String {
    let keyword = DOT_KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(name));
    if !keyword && (BARE_ID_RE.is_match(name) || NUMERAL_RE.is_match(name)) {
        return name.to_string();
    }
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

pub fn to_dot(request: &LayoutRequest, names: &HashMap<&VertexKey, String>) -> String {
    let options = &request.options;
    let mut dot = String::from("digraph G {\n");
    dot.push_str(&format!(
        "  graph [rankdir={}, ranksep={:.4}, nodesep={:.4}, splines={}];\n",
        options.direction.rankdir(),
        options.rank_separation / POINTS_PER_INCH,
        options.node_separation / POINTS_PER_INCH,
        options.edge_routing.dot_splines(),
    ));
    dot.push_str("  node [shape=box, fixedsize=true, label=\"\"];\n");
    for vertex in &request.vertices {
        let name = names
            .get(&vertex.key)
            .cloned()
            .unwrap_or_else(|| vertex.key.to_string());
        dot.push_str(&format!(
            "  {} [width={:.4}, height={:.4}];\n",
            quote_id(&name),
            vertex.width / POINTS_PER_INCH,
            vertex.height / POINTS_PER_INCH,
        ));
    }
    for edge in &request.edges {
        let from = names.get(&edge.from).cloned().unwrap_or_else(|| edge.from.to_string());
        let to = names.get(&edge.to).cloned().unwrap_or_else(|| edge.to.to_string());
        dot.push_str(&format!("  {} -> {};\n", quote_id(&from), quote_id(&to)));
    }
    dot.push_str("}\n");
    dot
}

/// Parses Graphviz `plain` output. Coordinates are inches with y pointing up; the result is
/// in points with y pointing down. Names missing from `by_name` are kept as string keys so
/// identity matching can report them.
pub fn parse_plain(
    text: &str,
    by_name: &HashMap<String, VertexKey>,
) -> Result<LayoutResponse, AlgorithmError> {
    let resolve = |name: &str| {
        by_name
            .get(name)
            .cloned()
            .unwrap_or_else(|| VertexKey::Str(name.to_string()))
    };

    let mut graph_height: Option<f32> = None;
    let mut response = LayoutResponse::default();
    for (line_idx, line) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        let tokens = tokenize(line).map_err(|message| AlgorithmError::MalformedOutput {
            line: line_no,
            message,
        })?;
        let Some(kind) = tokens.first() else {
            continue;
        };
        let number = |idx: usize| -> Result<f32, AlgorithmError> {
            tokens
                .get(idx)
                .and_then(|token| token.parse::<f32>().ok())
                .ok_or_else(|| AlgorithmError::MalformedOutput {
                    line: line_no,
                    message: format!("expected a number at field {idx}"),
                })
        };
        match kind.as_str() {
            "graph" => {
                let scale = number(1)?;
                response.width = number(2)? * scale * POINTS_PER_INCH;
                let height = number(3)? * scale;
                response.height = height * POINTS_PER_INCH;
                graph_height = Some(height);
            }
            "node" => {
                let height_in = graph_height.ok_or_else(|| AlgorithmError::MalformedOutput {
                    line: line_no,
                    message: "node before graph header".to_string(),
                })?;
                let name = tokens.get(1).ok_or_else(|| AlgorithmError::MalformedOutput {
                    line: line_no,
                    message: "node without a name".to_string(),
                })?;
                let (x, y) = (number(2)?, number(3)?);
                let (width, height) = (number(4)? * POINTS_PER_INCH, number(5)? * POINTS_PER_INCH);
                response.vertices.push(LayoutVertex {
                    key: resolve(name),
                    left: x * POINTS_PER_INCH - width / 2.0,
                    top: (height_in - y) * POINTS_PER_INCH - height / 2.0,
                    width,
                    height,
                });
            }
            "edge" => {
                let height_in = graph_height.ok_or_else(|| AlgorithmError::MalformedOutput {
                    line: line_no,
                    message: "edge before graph header".to_string(),
                })?;
                if tokens.len() < 4 {
                    return Err(AlgorithmError::MalformedOutput {
                        line: line_no,
                        message: "truncated edge".to_string(),
                    });
                }
                let count = tokens[3]
                    .parse::<usize>()
                    .map_err(|_| AlgorithmError::MalformedOutput {
                        line: line_no,
                        message: "expected a point count".to_string(),
                    })?;
                let fields = count.checked_mul(2).and_then(|n| n.checked_add(4));
                if fields.is_none_or(|fields| tokens.len() < fields) {
                    return Err(AlgorithmError::MalformedOutput {
                        line: line_no,
                        message: format!("edge declares {count} points but lists fewer"),
                    });
                }
                let mut points = Vec::with_capacity(count);
                for idx in 0..count {
                    let x = number(4 + idx * 2)?;
                    let y = number(5 + idx * 2)?;
                    points.push(Point::new(
                        x * POINTS_PER_INCH,
                        (height_in - y) * POINTS_PER_INCH,
                    ));
                }
                response.edges.push(LayoutEdge {
                    from: resolve(&tokens[1]),
                    to: resolve(&tokens[2]),
                    points,
                });
            }
            "stop" => break,
            other => {
                return Err(AlgorithmError::MalformedOutput {
                    line: line_no,
                    message: format!("unexpected record {other:?}"),
                });
            }
        }
    }
    if graph_height.is_none() {
        return Err(AlgorithmError::MalformedOutput {
            line: 0,
            message: "missing graph header".to_string(),
        });
    }
    Ok(response)
}

fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if ch == '"' {
            chars.next();
            let mut token = String::new();
            let mut closed = false;
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => token.push(ch),
                }
            }
            if !closed {
                return Err("unterminated quoted string".to_string());
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
            tokens.push(token);
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::algorithm::{InputEdge, InputVertex, LayoutOptions};

    fn request() -> LayoutRequest {
        LayoutRequest {
            vertices: vec![
                InputVertex {
                    key: "a".into(),
                    width: 72.0,
                    height: 36.0,
                },
                InputVertex {
                    key: "svc b".into(),
                    width: 72.0,
                    height: 36.0,
                },
            ],
            edges: vec![InputEdge {
                from: "a".into(),
                to: "svc b".into(),
            }],
            options: LayoutOptions::default(),
        }
    }

    #[test]
    fn dot_carries_sizes_in_inches_and_quotes_ids() {
        let request = request();
        let names = dot_names(&request).unwrap();
        let dot = to_dot(&request, &names);
        assert!(dot.contains("a [width=1.0000, height=0.5000];"));
        assert!(dot.contains("\"svc b\" [width=1.0000"));
        assert!(dot.contains("a -> \"svc b\";"));
        assert!(dot.contains("splines=polyline"));
        assert!(dot.contains("rankdir=TB"));
    }

    #[test]
    fn keywords_are_quoted() {
        assert_eq!(quote_id("node"), "\"node\"");
        assert_eq!(quote_id("Graph"), "\"Graph\"");
        assert_eq!(quote_id("-1.5"), "-1.5");
        assert_eq!(quote_id("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn colliding_key_text_is_rejected() {
        let mut request = request();
        request.vertices.push(InputVertex {
            key: VertexKey::Int(7),
            width: 1.0,
            height: 1.0,
        });
        request.vertices.push(InputVertex {
            key: "7".into(),
            width: 1.0,
            height: 1.0,
        });
        assert!(matches!(dot_names(&request), Err(AlgorithmError::Failed(_))));
    }

    #[test]
    fn parses_plain_output_with_flipped_y() {
        let plain = "graph 1 2 3\n\
                     node a 1 2.5 1 0.5 \"\" solid box black lightgrey\n\
                     node \"svc b\" 1 0.5 1 0.5 \"\" solid box black lightgrey\n\
                     edge a \"svc b\" 4 1 2.25 1 1.75 1 1.25 1 0.75 solid black\n\
                     stop\n";
        let by_name: HashMap<String, VertexKey> = [
            ("a".to_string(), "a".into()),
            ("svc b".to_string(), "svc b".into()),
        ]
        .into_iter()
        .collect();
        let response = parse_plain(plain, &by_name).unwrap();
        assert_eq!(response.width, 144.0);
        assert_eq!(response.height, 216.0);
        let a = &response.vertices[0];
        assert_eq!(a.key, "a".into());
        assert_eq!((a.left, a.top, a.width, a.height), (36.0, 18.0, 72.0, 36.0));
        assert_eq!(response.vertices[1].key, "svc b".into());
        let edge = &response.edges[0];
        assert_eq!(edge.points.len(), 4);
        assert_eq!(edge.points[0], Point::new(72.0, 54.0));
    }

    #[test]
    fn unknown_names_survive_as_string_keys() {
        let plain = "graph 1 1 1\nnode ghost 0.5 0.5 1 1 \"\" solid box black lightgrey\nstop\n";
        let response = parse_plain(plain, &HashMap::new()).unwrap();
        assert_eq!(response.vertices[0].key, "ghost".into());
    }

    #[test]
    fn malformed_output_reports_line() {
        let err = parse_plain("graph 1 1 1\nnode a x 1 1 1\n", &HashMap::new()).unwrap_err();
        assert!(matches!(err, AlgorithmError::MalformedOutput { line: 2, .. }));
        assert!(parse_plain("stop\n", &HashMap::new()).is_err());
    }

    #[test]
    fn oversized_point_count_is_malformed() {
        let plain = "graph 1 1 1\nedge a b 18446744073709551615 0 0\nstop\n";
        let err = parse_plain(plain, &HashMap::new()).unwrap_err();
        assert!(matches!(err, AlgorithmError::MalformedOutput { line: 2, .. }));

        let short = "graph 1 1 1\nedge a b 3 0 0 1 1\nstop\n";
        let err = parse_plain(short, &HashMap::new()).unwrap_err();
        assert!(matches!(err, AlgorithmError::MalformedOutput { line: 2, .. }));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let mut process = GraphvizProcess::new(Some("/nonexistent/graphviz/bin"));
        match process.request_layout(Generation(1), request()) {
            Reply::Ready(Err(AlgorithmError::Spawn { program, .. })) => {
                assert!(program.ends_with("dot"))
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
