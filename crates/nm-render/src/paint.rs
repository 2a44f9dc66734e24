//! Board → Vello drawing commands.
//!
//! Paints connections under notes, then note cards in paint order, then the
//! interaction overlays (provisional edge, marquee, delete zone). World-space
//! content is drawn through the camera transform; the delete zone is a
//! screen-space element.

use crate::route::{NoteOffset, route_board, route_between, route_to_point};
use kurbo::{Affine, BezPath, Circle, Rect as KurboRect, RoundedRect, Stroke};
use nm_core::geometry::{Point, Rect};
use nm_core::{Board, Camera, ConnectionStyle, NoteColor, NoteId, Selection};
use peniko::{Color, Fill};
use vello::Scene;

const EDGE: Color = Color::from_rgb8(0x6B, 0x70, 0x80);
const ACCENT: Color = Color::from_rgb8(0x25, 0x63, 0xEB);
const DANGER: Color = Color::from_rgb8(0xDC, 0x26, 0x26);
const CARD_RADIUS: f64 = 10.0;

/// Transient interaction state drawn on top of the committed board.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub selection: &'a Selection,
    /// Virtual drag translation of selected notes.
    pub offset: Option<NoteOffset<'a>>,
    /// World-space marquee rectangle.
    pub marquee: Option<Rect>,
    /// Notes that would be selected if the marquee were released now.
    pub candidates: &'a [NoteId],
    pub temp_edge: Option<TempEdge>,
    pub delete_zone: Option<DeleteZone>,
}

/// In-progress connection from `source` to the cursor or a hovered target.
#[derive(Debug, Clone, Copy)]
pub struct TempEdge {
    pub source: NoteId,
    pub cursor: Point,
    pub target: Option<NoteId>,
}

/// Screen-space delete zone shown while dragging notes.
#[derive(Debug, Clone, Copy)]
pub struct DeleteZone {
    pub center: Point,
    pub radius: f32,
    pub hot: bool,
}

impl<'a> Overlay<'a> {
    pub fn idle(selection: &'a Selection) -> Self {
        Self {
            selection,
            offset: None,
            marquee: None,
            candidates: &[],
            temp_edge: None,
            delete_zone: None,
        }
    }

    /// Rectangle of a note as it should appear this frame.
    pub fn note_rect(&self, id: NoteId, rect: Rect) -> Rect {
        match self.offset {
            Some(o) => o.apply(id, rect),
            None => rect,
        }
    }

    pub fn is_highlighted(&self, id: NoteId) -> bool {
        self.selection.contains(id) || self.candidates.contains(&id)
    }
}

/// Camera as an affine transform (world → screen).
pub fn view_transform(camera: &Camera) -> Affine {
    Affine::translate((camera.x as f64, camera.y as f64)) * Affine::scale(camera.z as f64)
}

/// Paint the whole board. Call once per frame with a freshly reset `Scene`.
pub fn paint_board(
    scene: &mut Scene,
    board: &Board,
    camera: &Camera,
    style: ConnectionStyle,
    overlay: &Overlay<'_>,
) {
    let view = view_transform(camera);

    for (id, route) in route_board(board, style, overlay.offset) {
        let selected = overlay.selection.connection() == Some(id);
        let (color, width) = if selected { (ACCENT, 2.5) } else { (EDGE, 1.5) };
        scene.stroke(&Stroke::new(width), view, color, None, &route.path);
        paint_arrowhead(scene, view, route.end, &route.path, color);
    }

    if let Some(edge) = overlay.temp_edge {
        paint_temp_edge(scene, board, view, style, overlay, edge);
    }

    for note in board.notes() {
        let rect = overlay.note_rect(note.id, note.rect());
        paint_card(scene, view, rect, note.color, note.pending, overlay.is_highlighted(note.id));
        log::trace!("CARD {} {:?} at ({}, {})", note.id, note.kind, rect.x, rect.y);
    }

    if let Some(m) = overlay.marquee {
        let shape = to_kurbo(m);
        scene.fill(Fill::NonZero, view, ACCENT.with_alpha(0.08), None, &shape);
        scene.stroke(&Stroke::new(1.0 / camera.z as f64), view, ACCENT, None, &shape);
    }

    if let Some(zone) = overlay.delete_zone {
        let circle = Circle::new((zone.center.x as f64, zone.center.y as f64), zone.radius as f64);
        let alpha = if zone.hot { 0.35 } else { 0.12 };
        scene.fill(Fill::NonZero, Affine::IDENTITY, DANGER.with_alpha(alpha), None, &circle);
    }
}

fn paint_card(scene: &mut Scene, view: Affine, rect: Rect, color: NoteColor, pending: bool, highlighted: bool) {
    let shape = RoundedRect::from_rect(to_kurbo(rect), CARD_RADIUS);
    let (r, g, b) = color.fill_rgb();
    let fill = Color::from_rgb8(r, g, b);
    let fill = if pending { fill.with_alpha(0.6) } else { fill };
    scene.fill(Fill::NonZero, view, fill, None, &shape);

    let (r, g, b) = color.border_rgb();
    let (border, width) = if highlighted {
        (ACCENT, 2.5)
    } else {
        (Color::from_rgb8(r, g, b), 1.0)
    };
    let stroke = if pending {
        Stroke::new(width).with_dashes(0.0, [6.0, 4.0])
    } else {
        Stroke::new(width)
    };
    scene.stroke(&stroke, view, border, None, &shape);
}

fn paint_temp_edge(
    scene: &mut Scene,
    board: &Board,
    view: Affine,
    style: ConnectionStyle,
    overlay: &Overlay<'_>,
    edge: TempEdge,
) {
    let Some(source) = board.note(edge.source) else {
        return;
    };
    let from = overlay.note_rect(source.id, source.rect());
    let route = match edge.target.and_then(|t| board.note(t)) {
        Some(target) => route_between(&from, &target.rect(), style),
        None => route_to_point(&from, edge.cursor, style),
    };
    let stroke = Stroke::new(2.0).with_dashes(0.0, [8.0, 6.0]);
    scene.stroke(&stroke, view, ACCENT, None, &route.path);
}

fn paint_arrowhead(scene: &mut Scene, view: Affine, tip: Point, path: &BezPath, color: Color) {
    // Direction of the final segment's tangent, approximated by its last two points.
    let Some(from) = path
        .segments()
        .last()
        .map(|seg| kurbo::ParamCurve::eval(&seg, 0.9))
    else {
        return;
    };
    let angle = (tip.y as f64 - from.y).atan2(tip.x as f64 - from.x);
    let size = 10.0;
    let (tx, ty) = (tip.x as f64, tip.y as f64);

    let mut head = BezPath::new();
    head.move_to((tx, ty));
    head.line_to((tx - size * (angle - 0.4).cos(), ty - size * (angle - 0.4).sin()));
    head.line_to((tx - size * (angle + 0.4).cos(), ty - size * (angle + 0.4).sin()));
    head.close_path();
    scene.fill(Fill::NonZero, view, color, None, &head);
}

fn to_kurbo(r: Rect) -> KurboRect {
    KurboRect::new(
        r.x as f64,
        r.y as f64,
        (r.x + r.width) as f64,
        (r.y + r.height) as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point as KPoint;

    #[test]
    fn view_transform_matches_camera() {
        let camera = Camera::new(100.0, 50.0, 2.0);
        let p = view_transform(&camera) * KPoint::new(10.0, 20.0);
        let expected = camera.world_to_screen(Point::new(10.0, 20.0));
        assert!((p.x as f32 - expected.x).abs() < 1e-4);
        assert!((p.y as f32 - expected.y).abs() < 1e-4);
    }

    #[test]
    fn overlay_offsets_only_dragged_notes() {
        let selection = Selection::default();
        let ids = [NoteId::intern("pt_a")];
        let overlay = Overlay {
            offset: Some(NoteOffset {
                ids: &ids,
                dx: 5.0,
                dy: 5.0,
            }),
            ..Overlay::idle(&selection)
        };
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(overlay.note_rect(ids[0], r), Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(overlay.note_rect(NoteId::intern("pt_b"), r), r);
    }

    #[test]
    fn painting_a_board_does_not_panic() {
        let mut board = Board::new();
        let a = NoteId::intern("pt_c");
        let b = NoteId::intern("pt_d");
        board.add_note(nm_core::Note::new(a, nm_core::NoteKind::Text, Point::ZERO));
        board.add_note(nm_core::Note::new(b, nm_core::NoteKind::Tag, Point::new(500.0, 300.0)));
        board.connect(a, b);
        let selection = Selection::default();
        let mut scene = Scene::new();
        for style in [ConnectionStyle::Straight, ConnectionStyle::Curve, ConnectionStyle::Step] {
            paint_board(&mut scene, &board, &Camera::IDENTITY, style, &Overlay::idle(&selection));
        }
    }
}
