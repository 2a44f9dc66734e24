//! JSON snapshot boundary.
//!
//! External data enters the board here. Optional fields take their defaults
//! (`type` → `text`, `color` → `yellow`), sizes are clamped to the kind's
//! minimum, and connections that reference missing notes or duplicate an
//! already-connected pair are skipped.

use crate::model::{Board, Connection, Note};
use serde::{Deserialize, Serialize};

/// Serializable form of a whole board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl BoardSnapshot {
    pub fn capture(board: &Board) -> Self {
        Self {
            notes: board.notes().cloned().collect(),
            connections: board.connections().cloned().collect(),
        }
    }

    pub fn into_board(self) -> Board {
        let mut board = Board::new();
        for note in self.notes {
            board.add_note(note);
        }
        for conn in self.connections {
            let id = conn.id;
            if !board.insert_connection(conn) {
                log::warn!("skipping connection {id}: dangling, self-loop, or duplicate pair");
            }
        }
        board
    }
}

impl Board {
    /// Parse a board from its JSON snapshot.
    pub fn from_json(text: &str) -> Result<Board, String> {
        let snapshot: BoardSnapshot =
            serde_json::from_str(text).map_err(|e| format!("invalid board JSON: {e}"))?;
        Ok(snapshot.into_board())
    }

    /// Serialize the board to its JSON snapshot.
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(&BoardSnapshot::capture(self))
            .map_err(|e| format!("failed to serialize board: {e}"))
    }
}
