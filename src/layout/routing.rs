use crate::config::{Direction, EdgeRouting};
use crate::ir::{LayoutVertex, Point};

const SELF_LOOP_REACH: f32 = 20.0;

/// Maps between screen coordinates and (cross, main) coordinates, where main runs along
/// the rank direction.
#[derive(Debug, Clone, Copy)]
pub(super) struct Axis(pub(super) Direction);

impl Axis {
    pub(super) fn main(self, point: Point) -> f32 {
        match self.0 {
            Direction::TopDown => point.y,
            Direction::LeftRight => point.x,
        }
    }

    pub(super) fn cross(self, point: Point) -> f32 {
        match self.0 {
            Direction::TopDown => point.x,
            Direction::LeftRight => point.y,
        }
    }

    pub(super) fn point(self, cross: f32, main: f32) -> Point {
        match self.0 {
            Direction::TopDown => Point::new(cross, main),
            Direction::LeftRight => Point::new(main, cross),
        }
    }

    /// (cross extent, main extent) of a box.
    pub(super) fn extents(self, width: f32, height: f32) -> (f32, f32) {
        match self.0 {
            Direction::TopDown => (width, height),
            Direction::LeftRight => (height, width),
        }
    }
}

pub(super) fn route_edge(
    from: &LayoutVertex,
    to: &LayoutVertex,
    is_self_loop: bool,
    routing: EdgeRouting,
    direction: Direction,
    rank_separation: f32,
) -> Vec<Point> {
    let axis = Axis(direction);
    if is_self_loop {
        return route_self_loop(from, axis);
    }

    let from_center = from.center();
    let to_center = to.center();
    let delta_main = axis.main(to_center) - axis.main(from_center);
    if delta_main.abs() < f32::EPSILON {
        return vec![
            clip_to_border(from, to_center),
            clip_to_border(to, from_center),
        ];
    }

    let sign = delta_main.signum();
    let (_, from_main_extent) = axis.extents(from.width, from.height);
    let (_, to_main_extent) = axis.extents(to.width, to.height);
    let start = axis.point(
        axis.cross(from_center),
        axis.main(from_center) + sign * from_main_extent / 2.0,
    );
    let end = axis.point(
        axis.cross(to_center),
        axis.main(to_center) - sign * to_main_extent / 2.0,
    );

    match routing {
        EdgeRouting::Straight => vec![
            clip_to_border(from, to_center),
            clip_to_border(to, from_center),
        ],
        EdgeRouting::Polyline => {
            let span = (axis.main(end) - axis.main(start)).abs();
            let bend = (rank_separation / 2.0).min(span / 2.0);
            vec![
                start,
                axis.point(axis.cross(start), axis.main(start) + sign * bend),
                axis.point(axis.cross(end), axis.main(end) - sign * bend),
                end,
            ]
        }
        EdgeRouting::Spline => {
            let half = (axis.main(end) - axis.main(start)) / 2.0;
            vec![
                start,
                axis.point(axis.cross(start), axis.main(start) + half),
                axis.point(axis.cross(end), axis.main(end) - half),
                end,
            ]
        }
    }
}

fn route_self_loop(vertex: &LayoutVertex, axis: Axis) -> Vec<Point> {
    let center = vertex.center();
    let (cross_extent, main_extent) = axis.extents(vertex.width, vertex.height);
    let side = axis.cross(center) + cross_extent / 2.0;
    let quarter = main_extent / 4.0;
    let main = axis.main(center);
    vec![
        axis.point(side, main - quarter),
        axis.point(side + SELF_LOOP_REACH, main - quarter),
        axis.point(side + SELF_LOOP_REACH, main + quarter),
        axis.point(side, main + quarter),
    ]
}

/// Point where the segment from the box center toward `toward` leaves the box.
fn clip_to_border(vertex: &LayoutVertex, toward: Point) -> Point {
    let center = vertex.center();
    let dx = toward.x - center.x;
    let dy = toward.y - center.y;
    if dx == 0.0 && dy == 0.0 {
        return center;
    }
    let half_w = vertex.width / 2.0;
    let half_h = vertex.height / 2.0;
    let scale_x = if dx != 0.0 { half_w / dx.abs() } else { f32::INFINITY };
    let scale_y = if dy != 0.0 { half_h / dy.abs() } else { f32::INFINITY };
    let scale = scale_x.min(scale_y);
    Point::new(center.x + dx * scale, center.y + dy * scale)
}

/// SVG path data for an edge: straight segments for polyline/straight routing, cubic
/// Bézier segments (1 + 3n points) for spline routing.
pub fn edge_path_data(points: &[Point], routing: EdgeRouting) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let mut d = format!("M{:.2},{:.2}", first.x, first.y);
    let rest = &points[1..];
    let cubic = matches!(routing, EdgeRouting::Spline) && !rest.is_empty() && rest.len() % 3 == 0;
    if cubic {
        for chunk in rest.chunks(3) {
            d.push_str(&format!(
                " C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
                chunk[0].x, chunk[0].y, chunk[1].x, chunk[1].y, chunk[2].x, chunk[2].y
            ));
        }
    } else {
        for point in rest {
            d.push_str(&format!(" L{:.2},{:.2}", point.x, point.y));
        }
    }
    d
}
