//! Hit testing: point / box → note lookup.
//!
//! `SpatialIndex` is the seam between the interaction engine and whatever
//! answers geometric queries. The board answers them by a linear scan over
//! note rectangles in paint order (last painted = topmost).

use crate::route::route_board;
use nm_core::geometry::{Point, Rect};
use nm_core::{Board, ConnectionId, ConnectionStyle, NoteId};

/// Geometric queries over the current note rectangles (world space).
pub trait SpatialIndex {
    /// Topmost note whose rectangle contains `p`.
    fn note_at(&self, p: Point) -> Option<NoteId>;

    /// All notes whose rectangle overlaps `rect` (partial overlap counts).
    fn notes_in_rect(&self, rect: &Rect) -> Vec<NoteId>;

    /// Among notes whose rectangle inflated by `buffer` contains `p`, the one
    /// whose center is nearest to `p`. Ties keep the first found.
    fn nearest_note(&self, p: Point, buffer: f32, exclude: Option<NoteId>) -> Option<NoteId>;

    /// Current rectangle of a note.
    fn rect_of(&self, id: NoteId) -> Option<Rect>;

    /// Connection whose routed path passes within `tolerance` of `p`.
    fn connection_at(&self, p: Point, tolerance: f32, style: ConnectionStyle) -> Option<ConnectionId>;
}

impl SpatialIndex for Board {
    fn note_at(&self, p: Point) -> Option<NoteId> {
        self.notes().rev().find(|n| n.rect().contains(p)).map(|n| n.id)
    }

    fn notes_in_rect(&self, rect: &Rect) -> Vec<NoteId> {
        self.notes()
            .filter(|n| n.rect().intersects(rect))
            .map(|n| n.id)
            .collect()
    }

    fn nearest_note(&self, p: Point, buffer: f32, exclude: Option<NoteId>) -> Option<NoteId> {
        let mut best: Option<(f32, NoteId)> = None;
        for note in self.notes() {
            if Some(note.id) == exclude {
                continue;
            }
            let rect = note.rect();
            if !rect.inflate(buffer).contains(p) {
                continue;
            }
            let d = rect.center().distance(p);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, note.id));
            }
        }
        best.map(|(_, id)| id)
    }

    fn rect_of(&self, id: NoteId) -> Option<Rect> {
        self.note(id).map(|n| n.rect())
    }

    fn connection_at(&self, p: Point, tolerance: f32, style: ConnectionStyle) -> Option<ConnectionId> {
        let mut best: Option<(f32, ConnectionId)> = None;
        for (id, route) in route_board(self, style, None) {
            let d = route.distance_to(p);
            if d <= tolerance && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, id));
            }
        }
        best.map(|(_, id)| id)
    }
}
