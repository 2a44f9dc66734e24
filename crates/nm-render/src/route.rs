//! Connection routing.
//!
//! Every connection is drawn between the *borders* of its two note
//! rectangles: each endpoint is where the line joining the two centers
//! leaves that rectangle. The path between the endpoints depends on the
//! global [`ConnectionStyle`]. Label chips are anchored at the true midpoint
//! of the drawn path.

use kurbo::{BezPath, CubicBez, ParamCurve, ParamCurveNearest};
use nm_core::geometry::{Point, Rect, boundary_point};
use nm_core::{Board, ConnectionId, ConnectionStyle, NoteId};

/// A routed connection path in world space.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: BezPath,
    pub start: Point,
    pub end: Point,
    /// Where the label chip is centered.
    pub label_anchor: Point,
}

impl Route {
    /// SVG path data (`M … C …`) for DOM renderers.
    pub fn to_svg(&self) -> String {
        self.path.to_svg()
    }

    /// Shortest distance from `p` to the drawn path.
    pub fn distance_to(&self, p: Point) -> f32 {
        let kp = kpt(p);
        self.path
            .segments()
            .map(|seg| seg.nearest(kp, 1e-3).distance_sq)
            .fold(f64::INFINITY, f64::min)
            .sqrt() as f32
    }
}

/// Virtual translation of a set of notes, used to reroute connections while
/// a drag is in progress without touching the board.
#[derive(Debug, Clone, Copy)]
pub struct NoteOffset<'a> {
    pub ids: &'a [NoteId],
    pub dx: f32,
    pub dy: f32,
}

impl NoteOffset<'_> {
    pub fn applies_to(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    pub fn apply(&self, id: NoteId, rect: Rect) -> Rect {
        if self.applies_to(id) {
            rect.translate(self.dx, self.dy)
        } else {
            rect
        }
    }
}

/// Route between two note rectangles.
pub fn route_between(from: &Rect, to: &Rect, style: ConnectionStyle) -> Route {
    let start = boundary_point(from, to.center());
    let end = boundary_point(to, from.center());
    build(start, end, style)
}

/// Route the provisional edge from `from` toward a free cursor position.
pub fn route_to_point(from: &Rect, cursor: Point, style: ConnectionStyle) -> Route {
    let start = boundary_point(from, cursor);
    build(start, cursor, style)
}

/// Route every connection on the board. Connections whose endpoints are
/// missing are skipped.
pub fn route_board(
    board: &Board,
    style: ConnectionStyle,
    offset: Option<NoteOffset<'_>>,
) -> Vec<(ConnectionId, Route)> {
    let rect = |id: NoteId| {
        board.note(id).map(|n| match offset {
            Some(o) => o.apply(id, n.rect()),
            None => n.rect(),
        })
    };

    board
        .connections()
        .filter_map(|conn| {
            let (Some(from), Some(to)) = (rect(conn.from), rect(conn.to)) else {
                log::debug!("skipping dangling connection {}", conn.id);
                return None;
            };
            Some((conn.id, route_between(&from, &to, style)))
        })
        .collect()
}

fn build(start: Point, end: Point, style: ConnectionStyle) -> Route {
    let mut path = BezPath::new();
    path.move_to(kpt(start));

    let label_anchor = match style {
        ConnectionStyle::Straight => {
            path.line_to(kpt(end));
            start.midpoint(end)
        }
        ConnectionStyle::Curve => {
            let (c1, c2) = curve_controls(start, end);
            path.curve_to(kpt(c1), kpt(c2), kpt(end));
            // De Casteljau split at t = 0.5 lands on the drawn curve.
            let mid = CubicBez::new(kpt(start), kpt(c1), kpt(c2), kpt(end)).eval(0.5);
            Point::new(mid.x as f32, mid.y as f32)
        }
        ConnectionStyle::Step => {
            let mx = (start.x + end.x) / 2.0;
            path.line_to(kpt(Point::new(mx, start.y)));
            path.line_to(kpt(Point::new(mx, end.y)));
            path.line_to(kpt(end));
            Point::new(mx, (start.y + end.y) / 2.0)
        }
    };

    Route {
        path,
        start,
        end,
        label_anchor,
    }
}

/// Control points offset by half the span along the dominant axis.
fn curve_controls(start: Point, end: Point) -> (Point, Point) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx.abs() > dy.abs() {
        let off = dx / 2.0;
        (start.offset(off, 0.0), end.offset(-off, 0.0))
    } else {
        let off = dy / 2.0;
        (start.offset(0.0, off), end.offset(0.0, -off))
    }
}

fn kpt(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    fn pair() -> (Rect, Rect) {
        (
            Rect::new(0.0, 0.0, 280.0, 140.0),
            Rect::new(500.0, 0.0, 280.0, 140.0),
        )
    }

    #[test]
    fn endpoints_sit_on_facing_borders() {
        let (a, b) = pair();
        let route = route_between(&a, &b, ConnectionStyle::Straight);
        assert!(close(route.start, Point::new(280.0, 70.0)));
        assert!(close(route.end, Point::new(500.0, 70.0)));
        assert!(close(route.label_anchor, Point::new(390.0, 70.0)));
    }

    #[test]
    fn curve_label_is_on_the_curve() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(400.0, 200.0, 100.0, 100.0);
        let route = route_between(&a, &b, ConnectionStyle::Curve);
        assert!(route.distance_to(route.label_anchor) < 0.01);
        // Horizontal bias: first control point shares the start's y.
        let first = route.path.segments().next().unwrap();
        if let kurbo::PathSeg::Cubic(c) = first {
            assert!((c.p1.y - c.p0.y).abs() < 1e-6);
        } else {
            panic!("expected cubic segment");
        }
    }

    #[test]
    fn vertical_curve_uses_vertical_controls() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(20.0, 500.0, 100.0, 100.0);
        let route = route_between(&a, &b, ConnectionStyle::Curve);
        if let Some(kurbo::PathSeg::Cubic(c)) = route.path.segments().next() {
            assert!((c.p1.x - c.p0.x).abs() < 1e-6);
        } else {
            panic!("expected cubic segment");
        }
    }

    #[test]
    fn step_turns_at_horizontal_midpoint() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(400.0, 300.0, 100.0, 100.0);
        let route = route_between(&a, &b, ConnectionStyle::Step);
        assert_eq!(route.path.segments().count(), 3);
        let mx = (route.start.x + route.end.x) / 2.0;
        assert!((route.label_anchor.x - mx).abs() < 1e-3);
        assert!(route.distance_to(route.label_anchor) < 0.01);
    }

    #[test]
    fn offset_moves_only_listed_notes() {
        let ids = [NoteId::intern("ro_a")];
        let offset = NoteOffset {
            ids: &ids,
            dx: 10.0,
            dy: -5.0,
        };
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(offset.apply(ids[0], r), Rect::new(10.0, -5.0, 10.0, 10.0));
        assert_eq!(offset.apply(NoteId::intern("ro_b"), r), r);
    }

    #[test]
    fn svg_output_starts_with_move() {
        let (a, b) = pair();
        let svg = route_between(&a, &b, ConnectionStyle::Curve).to_svg();
        assert!(svg.starts_with('M'), "{svg}");
        assert!(svg.contains('C'), "{svg}");
    }
}
