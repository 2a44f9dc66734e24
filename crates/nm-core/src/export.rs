//! Mermaid flowchart export.
//!
//! Read-only consumer of a board snapshot. Note ids are not guaranteed to be
//! valid Mermaid identifiers, so notes are renamed `n0, n1, …` in paint order.

use crate::layout::LayoutDirection;
use crate::model::Board;
use std::collections::HashMap;
use std::fmt::Write;

/// Emit the board as a Mermaid `flowchart` description.
pub fn export_mermaid(board: &Board, direction: LayoutDirection) -> String {
    let mut out = String::with_capacity(64 + board.len() * 32);
    let dir = match direction {
        LayoutDirection::TopDown => "TD",
        LayoutDirection::LeftRight => "LR",
    };
    let _ = writeln!(out, "flowchart {dir}");

    let mut alias = HashMap::with_capacity(board.len());
    for (i, note) in board.notes().enumerate() {
        let name = format!("n{i}");
        let _ = writeln!(out, "    {name}[\"{}\"]", escape_label(&note.content));
        alias.insert(note.id, name);
    }

    for conn in board.connections() {
        let (Some(from), Some(to)) = (alias.get(&conn.from), alias.get(&conn.to)) else {
            continue;
        };
        match conn.label.as_deref() {
            Some(label) => {
                let _ = writeln!(out, "    {from} -- \"{}\" --> {to}", escape_label(label));
            }
            None => {
                let _ = writeln!(out, "    {from} --> {to}");
            }
        }
    }

    out
}

fn escape_label(text: &str) -> String {
    let trimmed = text.trim();
    let mut s = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        match ch {
            '"' => s.push_str("#quot;"),
            '\n' => s.push_str("<br/>"),
            '\r' => {}
            _ => s.push(ch),
        }
    }
    s
}
