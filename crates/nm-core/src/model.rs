//! Core note-graph data model.
//!
//! A board is a directed graph where nodes are note cards and edges are
//! connections between them. Notes and connections live in one
//! `StableDiGraph` so removing a note prunes every connection touching it,
//! and at most one edge exists per unordered pair of notes.

use crate::geometry::{Point, Rect, Size};
use crate::id::{ConnectionId, NoteId};
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Note kinds & palette ────────────────────────────────────────────────

/// The variant of a note card. Absent in legacy data means `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Free-form text card.
    #[default]
    Text,
    /// Compact single-line topic node.
    Topic,
    /// Small tag chip.
    Tag,
}

impl NoteKind {
    pub fn min_width(self) -> f32 {
        match self {
            NoteKind::Text => 200.0,
            NoteKind::Topic => 120.0,
            NoteKind::Tag => 80.0,
        }
    }

    pub fn min_height(self) -> f32 {
        40.0
    }

    /// Size given to a freshly created note of this kind.
    pub fn default_size(self) -> Size {
        match self {
            NoteKind::Text => Size::new(280.0, 140.0),
            NoteKind::Topic => Size::new(160.0, 56.0),
            NoteKind::Tag => Size::new(96.0, 40.0),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(NoteKind::Text),
            "topic" => Some(NoteKind::Topic),
            "tag" => Some(NoteKind::Tag),
            _ => None,
        }
    }
}

/// Fixed card palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
    Gray,
}

impl NoteColor {
    pub const ALL: [NoteColor; 6] = [
        NoteColor::Yellow,
        NoteColor::Blue,
        NoteColor::Green,
        NoteColor::Pink,
        NoteColor::Purple,
        NoteColor::Gray,
    ];

    /// Card fill as `#RRGGBB`.
    pub fn fill_hex(self) -> &'static str {
        match self {
            NoteColor::Yellow => "#FEF3C7",
            NoteColor::Blue => "#DBEAFE",
            NoteColor::Green => "#D1FAE5",
            NoteColor::Pink => "#FCE7F3",
            NoteColor::Purple => "#EDE9FE",
            NoteColor::Gray => "#F3F4F6",
        }
    }

    /// Card border as `#RRGGBB`.
    pub fn border_hex(self) -> &'static str {
        match self {
            NoteColor::Yellow => "#F59E0B",
            NoteColor::Blue => "#3B82F6",
            NoteColor::Green => "#10B981",
            NoteColor::Pink => "#EC4899",
            NoteColor::Purple => "#8B5CF6",
            NoteColor::Gray => "#6B7280",
        }
    }

    /// Fill as 8-bit RGB.
    pub fn fill_rgb(self) -> (u8, u8, u8) {
        hex_rgb(self.fill_hex())
    }

    /// Border as 8-bit RGB.
    pub fn border_rgb(self) -> (u8, u8, u8) {
        hex_rgb(self.border_hex())
    }
}

fn hex_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    (channel(0), channel(2), channel(4))
}

// ─── Notes & connections ─────────────────────────────────────────────────

/// A note card on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    #[serde(default, rename = "type")]
    pub kind: NoteKind,
    #[serde(default)]
    pub content: String,
    pub position: Point,
    pub size: Size,
    #[serde(default)]
    pub color: NoteColor,
    /// Creation timestamp in milliseconds, supplied by the host.
    #[serde(default, rename = "createdAt")]
    pub created_at: u64,
    /// Placeholder awaiting a text-generation result.
    #[serde(default)]
    pub pending: bool,
}

impl Note {
    pub fn new(id: NoteId, kind: NoteKind, position: Point) -> Self {
        Self {
            id,
            kind,
            content: String::new(),
            position,
            size: kind.default_size(),
            color: NoteColor::default(),
            created_at: 0,
            pending: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = clamp_size(self.kind, size);
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Enforce the kind's minimum dimensions.
pub fn clamp_size(kind: NoteKind, size: Size) -> Size {
    Size::new(
        size.width.max(kind.min_width()),
        size.height.max(kind.min_height()),
    )
}

/// A directed connection `from → to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    #[serde(rename = "fromId")]
    pub from: NoteId,
    #[serde(rename = "toId")]
    pub to: NoteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// How connection paths are drawn. Switched globally (auto-layout picks a
/// default per direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStyle {
    Straight,
    #[default]
    Curve,
    Step,
}

impl ConnectionStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "straight" => Some(ConnectionStyle::Straight),
            "curve" => Some(ConnectionStyle::Curve),
            "step" => Some(ConnectionStyle::Step),
            _ => None,
        }
    }
}

/// Partial update of a note's fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub content: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub color: Option<NoteColor>,
    pub kind: Option<NoteKind>,
    pub pending: Option<bool>,
}

impl NotePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }
}

/// Result of [`Board::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// No edge existed; `from → to` was inserted.
    Added(ConnectionId),
    /// `to → from` existed; it was replaced by `from → to`.
    Flipped(ConnectionId),
    /// `from → to` existed and was removed (toggle off).
    Removed,
    /// Self-connection or unknown endpoint; nothing changed.
    Rejected,
}

// ─── Selection ───────────────────────────────────────────────────────────

/// Selected notes (order-irrelevant) or one selected connection, never both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    notes: SmallVec<[NoteId; 4]>,
    connection: Option<ConnectionId>,
}

impl Selection {
    pub fn notes(&self) -> &[NoteId] {
        &self.notes
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.notes.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.connection.is_none()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.connection = None;
    }

    /// Replace the selection with `ids`; clears any selected connection.
    pub fn set_notes(&mut self, ids: impl IntoIterator<Item = NoteId>) {
        self.clear();
        for id in ids {
            self.insert(id);
        }
    }

    /// Add a note; clears any selected connection.
    pub fn insert(&mut self, id: NoteId) {
        self.connection = None;
        if !self.notes.contains(&id) {
            self.notes.push(id);
        }
    }

    pub fn remove(&mut self, id: NoteId) {
        self.notes.retain(|n| *n != id);
    }

    /// Select a single connection; clears note selection.
    pub fn select_connection(&mut self, id: ConnectionId) {
        self.notes.clear();
        self.connection = Some(id);
    }

    /// Drop ids that no longer exist on `board`.
    pub fn retain_existing(&mut self, board: &Board) {
        self.notes.retain(|id| board.contains(*id));
        if let Some(c) = self.connection
            && board.connection(c).is_none()
        {
            self.connection = None;
        }
    }
}

// ─── Board ───────────────────────────────────────────────────────────────

/// The note graph: notes as nodes, connections as edges.
#[derive(Debug, Clone, Default)]
pub struct Board {
    /// The underlying directed graph.
    pub graph: StableDiGraph<Note, Connection>,

    /// Index from NoteId → NodeIndex for fast lookup.
    id_index: HashMap<NoteId, NodeIndex>,

    /// Index from ConnectionId → EdgeIndex.
    edge_ids: HashMap<ConnectionId, EdgeIndex>,

    /// Paint order (last = topmost). Also the creation order.
    order: Vec<NoteId>,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn index_of(&self, id: NoteId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.index_of(id).map(|idx| &mut self.graph[idx])
    }

    /// Notes in paint order (bottom to top).
    pub fn notes(&self) -> impl DoubleEndedIterator<Item = &Note> + '_ {
        self.order.iter().filter_map(|id| self.note(*id))
    }

    /// Note ids in paint order.
    pub fn order(&self) -> &[NoteId] {
        &self.order
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.graph.edge_indices().map(|e| &self.graph[e])
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.edge_index(id).map(|e| &self.graph[e])
    }

    /// The connection between `a` and `b` in either direction.
    pub fn connection_between(&self, a: NoteId, b: NoteId) -> Option<&Connection> {
        let (ia, ib) = (self.index_of(a)?, self.index_of(b)?);
        self.graph
            .find_edge(ia, ib)
            .or_else(|| self.graph.find_edge(ib, ia))
            .map(|e| &self.graph[e])
    }

    /// Ids of the notes with an edge into `id`.
    pub fn parents(&self, id: NoteId) -> Vec<NoteId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Ids of the notes `id` has an edge to.
    pub fn children(&self, id: NoteId) -> Vec<NoteId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: NoteId, dir: Direction) -> Vec<NoteId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut out: Vec<(EdgeIndex, NoteId)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                (e.id(), self.graph[other].id)
            })
            .collect();
        // Edge insertion order keeps results deterministic across targets.
        out.sort_by_key(|(e, _)| *e);
        out.into_iter().map(|(_, id)| id).collect()
    }

    /// Insert a note on top of the paint order. A note with the same id is
    /// replaced in place (connections kept).
    pub fn add_note(&mut self, mut note: Note) -> NodeIndex {
        note.size = clamp_size(note.kind, note.size);
        if let Some(idx) = self.index_of(note.id) {
            self.graph[idx] = note;
            return idx;
        }
        let id = note.id;
        let idx = self.graph.add_node(note);
        self.id_index.insert(id, idx);
        self.order.push(id);
        idx
    }

    /// Remove a note and every connection touching it.
    pub fn remove_note(&mut self, id: NoteId) -> Option<Note> {
        let idx = self.id_index.remove(&id)?;
        self.order.retain(|n| *n != id);
        let touching: Vec<ConnectionId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();
        for conn in touching {
            self.edge_ids.remove(&conn);
        }
        self.graph.remove_node(idx)
    }

    /// Remove several notes; returns how many existed.
    pub fn remove_notes(&mut self, ids: &[NoteId]) -> usize {
        ids.iter()
            .filter(|id| self.remove_note(**id).is_some())
            .count()
    }

    /// Apply a partial update. Returns `false` if the note does not exist.
    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> bool {
        let Some(note) = self.note_mut(id) else {
            return false;
        };
        if let Some(kind) = patch.kind {
            note.kind = kind;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(position) = patch.position {
            note.position = position;
        }
        if let Some(size) = patch.size {
            note.size = size;
        }
        if let Some(color) = patch.color {
            note.color = color;
        }
        if let Some(pending) = patch.pending {
            note.pending = pending;
        }
        note.size = clamp_size(note.kind, note.size);
        true
    }

    /// Translate every listed note by `(dx, dy)`. Unknown ids are skipped.
    pub fn move_notes(&mut self, ids: &[NoteId], dx: f32, dy: f32) -> usize {
        let mut moved = 0;
        for id in ids {
            if let Some(note) = self.note_mut(*id) {
                note.position = note.position.offset(dx, dy);
                moved += 1;
            }
        }
        moved
    }

    /// Move a note to the top of the paint order.
    pub fn bring_to_front(&mut self, id: NoteId) {
        if let Some(pos) = self.order.iter().position(|n| *n == id) {
            let id = self.order.remove(pos);
            self.order.push(id);
        }
    }

    /// Toggle/flip/insert the edge `from → to`, keeping at most one edge per
    /// unordered pair.
    pub fn connect(&mut self, from: NoteId, to: NoteId) -> ConnectOutcome {
        if from == to {
            return ConnectOutcome::Rejected;
        }
        let (Some(a), Some(b)) = (self.index_of(from), self.index_of(to)) else {
            return ConnectOutcome::Rejected;
        };

        if let Some(existing) = self.graph.find_edge(a, b) {
            self.drop_edge(existing);
            return ConnectOutcome::Removed;
        }

        if let Some(reverse) = self.graph.find_edge(b, a) {
            let old = self.drop_edge(reverse);
            let id = ConnectionId::fresh();
            self.push_edge(
                a,
                b,
                Connection {
                    id,
                    from,
                    to,
                    label: old.and_then(|c| c.label),
                },
            );
            return ConnectOutcome::Flipped(id);
        }

        let id = ConnectionId::fresh();
        self.push_edge(
            a,
            b,
            Connection {
                id,
                from,
                to,
                label: None,
            },
        );
        ConnectOutcome::Added(id)
    }

    /// Insert a connection record as-is (used when loading snapshots).
    /// Refused if an endpoint is missing, it is a self-loop, the pair is
    /// already connected in either direction, or the id is taken.
    pub fn insert_connection(&mut self, conn: Connection) -> bool {
        if conn.from == conn.to
            || self.edge_ids.contains_key(&conn.id)
            || self.connection_between(conn.from, conn.to).is_some()
        {
            return false;
        }
        let (Some(a), Some(b)) = (self.index_of(conn.from), self.index_of(conn.to)) else {
            return false;
        };
        self.push_edge(a, b, conn);
        true
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let e = self.edge_index(id)?;
        self.drop_edge(e)
    }

    /// Set or clear a connection label. Empty text clears it.
    pub fn set_connection_label(&mut self, id: ConnectionId, label: Option<String>) -> bool {
        let Some(e) = self.edge_index(id) else {
            return false;
        };
        self.graph[e].label = label.filter(|l| !l.trim().is_empty());
        true
    }

    fn edge_index(&self, id: ConnectionId) -> Option<EdgeIndex> {
        self.edge_ids.get(&id).copied()
    }

    fn push_edge(&mut self, a: NodeIndex, b: NodeIndex, conn: Connection) {
        let id = conn.id;
        let e = self.graph.add_edge(a, b, conn);
        self.edge_ids.insert(id, e);
    }

    fn drop_edge(&mut self, e: EdgeIndex) -> Option<Connection> {
        let conn = self.graph.remove_edge(e)?;
        self.edge_ids.remove(&conn.id);
        Some(conn)
    }

    /// Rectangles of all notes in paint order.
    pub fn rects(&self) -> Vec<Rect> {
        self.notes().map(Note::rect).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn board_with(ids: &[&str]) -> Board {
        let mut board = Board::new();
        for (i, id) in ids.iter().enumerate() {
            board.add_note(Note::new(
                NoteId::intern(id),
                NoteKind::Text,
                Point::new(i as f32 * 400.0, 0.0),
            ));
        }
        board
    }

    #[test]
    fn connect_twice_toggles_off() {
        let mut board = board_with(&["m_a", "m_b"]);
        let (a, b) = (NoteId::intern("m_a"), NoteId::intern("m_b"));
        assert!(matches!(board.connect(a, b), ConnectOutcome::Added(_)));
        assert_eq!(board.connect(a, b), ConnectOutcome::Removed);
        assert_eq!(board.connection_count(), 0);
    }

    #[test]
    fn connect_reverse_flips_direction_and_keeps_label() {
        let mut board = board_with(&["f_a", "f_b"]);
        let (a, b) = (NoteId::intern("f_a"), NoteId::intern("f_b"));
        let ConnectOutcome::Added(id) = board.connect(a, b) else {
            panic!("expected Added");
        };
        board.set_connection_label(id, Some("because".into()));

        assert!(matches!(board.connect(b, a), ConnectOutcome::Flipped(_)));
        assert_eq!(board.connection_count(), 1);
        let conn = board.connections().next().unwrap();
        assert_eq!((conn.from, conn.to), (b, a));
        assert_eq!(conn.label.as_deref(), Some("because"));

        // flip-then-toggle
        assert_eq!(board.connect(b, a), ConnectOutcome::Removed);
        assert_eq!(board.connection_count(), 0);
    }

    #[test]
    fn connect_rejects_self_and_unknown() {
        let mut board = board_with(&["r_a"]);
        let a = NoteId::intern("r_a");
        assert_eq!(board.connect(a, a), ConnectOutcome::Rejected);
        assert_eq!(
            board.connect(a, NoteId::intern("r_missing")),
            ConnectOutcome::Rejected
        );
    }

    #[test]
    fn removing_note_prunes_connections() {
        let mut board = board_with(&["p_a", "p_b", "p_c"]);
        let (a, b, c) = (
            NoteId::intern("p_a"),
            NoteId::intern("p_b"),
            NoteId::intern("p_c"),
        );
        board.connect(a, b);
        board.connect(c, a);
        board.connect(b, c);
        board.remove_note(a);
        assert_eq!(board.connection_count(), 1);
        assert_eq!(board.order(), &[b, c]);
        assert!(board.parents(c).contains(&b));
    }

    #[test]
    fn size_respects_kind_minimum() {
        let mut board = board_with(&["s_a"]);
        let a = NoteId::intern("s_a");
        board.update_note(a, NotePatch::size(Size::new(50.0, 10.0)));
        assert_eq!(board.note(a).unwrap().size, Size::new(200.0, 40.0));
    }

    #[test]
    fn selection_is_exclusive() {
        let mut sel = Selection::default();
        sel.insert(NoteId::intern("x_a"));
        sel.select_connection(ConnectionId::intern("x_c"));
        assert!(sel.notes().is_empty());
        sel.insert(NoteId::intern("x_a"));
        assert_eq!(sel.connection(), None);
        assert_eq!(sel.notes(), &[NoteId::intern("x_a")]);
    }

    #[test]
    fn palette_hex_decodes() {
        assert_eq!(NoteColor::Blue.border_rgb(), (0x3B, 0x82, 0xF6));
    }
}
