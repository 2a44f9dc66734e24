//! Debounced note size measurement.
//!
//! Note cards grow with their content, and the DOM reports the measured
//! size after layout. Reports arrive in bursts while the user types, so they
//! are coalesced per note and flushed once the burst has been quiet for the
//! debounce window.

use crate::sync::BoardMutation;
use nm_core::geometry::Size;
use nm_core::{Board, NoteId, NotePatch, clamp_size};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureConfig {
    /// Quiet time before queued sizes are flushed.
    pub debounce_ms: u64,
    /// Changes at or below this many world units are ignored.
    pub tolerance: f32,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 120,
            tolerance: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeasureQueue {
    config: MeasureConfig,
    pending: HashMap<NoteId, Size>,
    last_report_ms: u64,
}

impl MeasureQueue {
    pub fn new(config: MeasureConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queue a measured size; later reports for the same note win.
    pub fn report(&mut self, id: NoteId, size: Size, now_ms: u64) {
        self.pending.insert(id, size);
        self.last_report_ms = now_ms;
    }

    /// Whether a flush at `now_ms` would emit.
    pub fn is_due(&self, now_ms: u64) -> bool {
        !self.pending.is_empty()
            && now_ms.saturating_sub(self.last_report_ms) >= self.config.debounce_ms
    }

    /// Emit size updates for notes whose measured size differs from the
    /// board. Returns nothing while reports are still arriving.
    pub fn flush(&mut self, board: &Board, now_ms: u64) -> Vec<BoardMutation> {
        if !self.is_due(now_ms) {
            return Vec::new();
        }
        let mut pending = std::mem::take(&mut self.pending);

        let mut updates = Vec::new();
        for note in board.notes() {
            let Some(measured) = pending.remove(&note.id) else {
                continue;
            };
            let size = clamp_size(note.kind, measured);
            let changed = (size.width - note.size.width).abs() > self.config.tolerance
                || (size.height - note.size.height).abs() > self.config.tolerance;
            if changed {
                updates.push(BoardMutation::UpdateNote {
                    id: note.id,
                    patch: NotePatch::size(size),
                });
            }
        }
        if !pending.is_empty() {
            log::debug!("dropped {} measurement(s) for unknown notes", pending.len());
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nm_core::geometry::Point;
    use nm_core::{Note, NoteKind};
    use pretty_assertions::assert_eq;

    fn board() -> (Board, NoteId) {
        let mut board = Board::new();
        let id = NoteId::intern("ms_a");
        board.add_note(Note::new(id, NoteKind::Text, Point::ZERO));
        (board, id)
    }

    #[test]
    fn waits_for_quiet_window() {
        let (board, id) = board();
        let mut queue = MeasureQueue::default();
        queue.report(id, Size::new(300.0, 180.0), 1_000);
        assert!(queue.flush(&board, 1_050).is_empty());
        queue.report(id, Size::new(300.0, 200.0), 1_100);
        assert!(queue.flush(&board, 1_200).is_empty());
        let updates = queue.flush(&board, 1_220);
        assert_eq!(
            updates,
            vec![BoardMutation::UpdateNote {
                id,
                patch: NotePatch::size(Size::new(300.0, 200.0)),
            }]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn sub_unit_changes_are_ignored() {
        let (board, id) = board();
        let mut queue = MeasureQueue::default();
        queue.report(id, Size::new(280.5, 140.8), 0);
        assert!(queue.flush(&board, 500).is_empty());
    }

    #[test]
    fn minimum_width_is_enforced() {
        let (board, id) = board();
        let mut queue = MeasureQueue::default();
        queue.report(id, Size::new(50.0, 300.0), 0);
        let updates = queue.flush(&board, 500);
        assert_eq!(
            updates,
            vec![BoardMutation::UpdateNote {
                id,
                patch: NotePatch::size(Size::new(NoteKind::Text.min_width(), 300.0)),
            }]
        );
    }

    #[test]
    fn unknown_notes_are_dropped() {
        let (board, _) = board();
        let mut queue = MeasureQueue::default();
        queue.report(NoteId::intern("ms_ghost"), Size::new(500.0, 500.0), 0);
        assert!(queue.flush(&board, 500).is_empty());
        assert!(queue.is_empty());
    }
}
