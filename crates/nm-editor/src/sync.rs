//! Board mutations and the reference host engine.
//!
//! The interaction engine never writes to the board directly: it emits
//! `BoardMutation`s, the collaborator calls the surrounding application
//! answers. `BoardEngine` is the in-process host that owns the canonical
//! board and applies them; the browser bridge and the tests both drive it.

use nm_core::geometry::Point;
use nm_core::layout::{LayoutConfig, LayoutDirection, LayoutResult, auto_layout};
use nm_core::{Board, ConnectionId, ConnectionStyle, Note, NoteId, NoteKind, NotePatch};

/// A requested change to the canonical board.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardMutation {
    /// Partial update of one note.
    UpdateNote { id: NoteId, patch: NotePatch },
    /// Translate several notes by the same world-space delta.
    MoveNotes { ids: Vec<NoteId>, dx: f32, dy: f32 },
    /// Delete notes and every connection touching them.
    DeleteNotes { ids: Vec<NoteId> },
    /// Create a note with a pre-allocated id. With a `parent`, the host also
    /// connects `parent → id`.
    CreateNote {
        id: NoteId,
        position: Point,
        content: String,
        parent: Option<NoteId>,
        kind: NoteKind,
        pending: bool,
    },
    /// Toggle / flip / insert the connection `from → to`.
    Connect { from: NoteId, to: NoteId },
    /// Remove one connection.
    DeleteConnection { id: ConnectionId },
    /// Set or clear a connection label.
    SetConnectionLabel { id: ConnectionId, label: Option<String> },
}

/// Owns the canonical board and applies mutations to it.
#[derive(Debug, Clone, Default)]
pub struct BoardEngine {
    /// The canonical note graph.
    pub board: Board,

    /// Global connection style.
    pub style: ConnectionStyle,

    /// Host clock (ms), stamped onto created notes.
    now_ms: u64,

    /// Bumped for every mutation that changed the board.
    revision: u64,
}

impl BoardEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(board: Board) -> Self {
        Self {
            board,
            ..Self::default()
        }
    }

    /// Create an engine from a JSON board snapshot.
    pub fn from_json(text: &str) -> Result<Self, String> {
        Ok(Self::with_board(Board::from_json(text)?))
    }

    pub fn to_json(&self) -> Result<String, String> {
        self.board.to_json()
    }

    pub fn set_time(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply one mutation. Returns `true` if the board changed.
    pub fn apply_mutation(&mut self, mutation: BoardMutation) -> bool {
        let changed = match mutation {
            BoardMutation::UpdateNote { id, patch } => self.board.update_note(id, patch),
            BoardMutation::MoveNotes { ids, dx, dy } => {
                self.board.move_notes(&ids, dx, dy) > 0 && (dx != 0.0 || dy != 0.0)
            }
            BoardMutation::DeleteNotes { ids } => {
                let removed = self.board.remove_notes(&ids);
                log::debug!("deleted {removed} note(s)");
                removed > 0
            }
            BoardMutation::CreateNote {
                id,
                position,
                content,
                parent,
                kind,
                pending,
            } => {
                if self.board.contains(id) {
                    log::warn!("refusing to create {id}: id already on the board");
                    return false;
                }
                let mut note = Note::new(id, kind, position).with_content(content);
                note.created_at = self.now_ms;
                note.pending = pending;
                self.board.add_note(note);
                if let Some(parent) = parent {
                    if self.board.connection_between(parent, id).is_none() {
                        self.board.connect(parent, id);
                    } else {
                        log::warn!("{parent} and {id} already connected");
                    }
                }
                true
            }
            BoardMutation::Connect { from, to } => {
                let outcome = self.board.connect(from, to);
                log::debug!("connect {from} -> {to}: {outcome:?}");
                !matches!(outcome, nm_core::ConnectOutcome::Rejected)
            }
            BoardMutation::DeleteConnection { id } => self.board.remove_connection(id).is_some(),
            BoardMutation::SetConnectionLabel { id, label } => {
                self.board.set_connection_label(id, label)
            }
        };
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Apply a batch; returns `true` if anything changed.
    pub fn apply_all(&mut self, mutations: impl IntoIterator<Item = BoardMutation>) -> bool {
        mutations
            .into_iter()
            .fold(false, |changed, m| self.apply_mutation(m) || changed)
    }

    /// Run auto-layout, commit the new positions, and switch the connection
    /// style to the direction's default.
    pub fn auto_layout(&mut self, direction: LayoutDirection, config: &LayoutConfig) -> LayoutResult {
        let result = auto_layout(&self.board, direction, config);
        let moves: Vec<BoardMutation> = result
            .positions
            .iter()
            .map(|(id, pos)| BoardMutation::UpdateNote {
                id: *id,
                patch: NotePatch::position(*pos),
            })
            .collect();
        self.apply_all(moves);
        self.style = result.style;
        result
    }
}
