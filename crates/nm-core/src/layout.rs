//! Longest-path layered auto-layout.
//!
//! Ranks every note by its longest chain of ancestors, groups notes into
//! layers by rank, orders each layer by the mean position of its already
//! placed parents, and spaces layers and slots at fixed distances. The new
//! arrangement is translated so its bounding-box center matches the old one.

use crate::geometry::{Point, Rect, bounding_box};
use crate::id::NoteId;
use crate::model::{Board, ConnectionStyle};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Flow direction of the layered layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDirection {
    /// Ranks grow downward (tree).
    #[default]
    TopDown,
    /// Ranks grow rightward (flow).
    LeftRight,
}

impl LayoutDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vertical" | "topdown" | "TD" => Some(LayoutDirection::TopDown),
            "horizontal" | "leftright" | "LR" => Some(LayoutDirection::LeftRight),
            _ => None,
        }
    }

    /// Connection style that reads best for this direction.
    pub fn preferred_style(self) -> ConnectionStyle {
        match self {
            LayoutDirection::TopDown => ConnectionStyle::Step,
            LayoutDirection::LeftRight => ConnectionStyle::Curve,
        }
    }
}

/// Spacing constants (world units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Distance between consecutive ranks in a top-down layout.
    pub vertical_rank_spacing: f32,
    /// Distance between slot centers within a top-down layer.
    pub vertical_node_gap: f32,
    /// Distance between consecutive ranks in a left-right layout.
    pub horizontal_rank_spacing: f32,
    /// Distance between slot centers within a left-right layer.
    pub horizontal_node_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            vertical_rank_spacing: 220.0,
            vertical_node_gap: 320.0,
            horizontal_rank_spacing: 400.0,
            horizontal_node_gap: 180.0,
        }
    }
}

/// Output of [`auto_layout`].
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    /// New top-left position per note, in board paint order.
    pub positions: Vec<(NoteId, Point)>,
    /// Rank assigned to each note.
    pub ranks: HashMap<NoteId, usize>,
    /// Suggested connection style for the chosen direction.
    pub style: ConnectionStyle,
    /// Parent edges ignored because they closed a cycle.
    pub cycles_broken: usize,
}

impl LayoutResult {
    pub fn position_of(&self, id: NoteId) -> Option<Point> {
        self.positions
            .iter()
            .find_map(|(n, p)| (*n == id).then_some(*p))
    }
}

/// Compute a layered layout for every note on the board.
pub fn auto_layout(board: &Board, direction: LayoutDirection, config: &LayoutConfig) -> LayoutResult {
    let mut result = LayoutResult {
        style: direction.preferred_style(),
        ..LayoutResult::default()
    };

    let nodes: Vec<NodeIndex> = board
        .order()
        .iter()
        .filter_map(|id| board.index_of(*id))
        .collect();
    if nodes.is_empty() {
        return result;
    }

    // ── Ranks ──
    let mut memo: HashMap<NodeIndex, usize> = HashMap::new();
    let mut on_stack: HashSet<NodeIndex> = HashSet::new();
    for &idx in &nodes {
        rank_of(board, idx, &mut memo, &mut on_stack, &mut result.cycles_broken);
    }
    if result.cycles_broken > 0 {
        log::debug!(
            "auto-layout: broke {} cycle edge(s); layering is best-effort",
            result.cycles_broken
        );
    }

    // ── Layers ──
    let max_rank = memo.values().copied().max().unwrap_or(0);
    let mut layers: Vec<Vec<NodeIndex>> = vec![Vec::new(); max_rank + 1];
    for &idx in &nodes {
        layers[memo[&idx]].push(idx);
    }

    let cross_of = |idx: NodeIndex| {
        let c = board.graph[idx].center();
        match direction {
            LayoutDirection::TopDown => c.x,
            LayoutDirection::LeftRight => c.y,
        }
    };
    let (rank_spacing, node_gap) = match direction {
        LayoutDirection::TopDown => (config.vertical_rank_spacing, config.vertical_node_gap),
        LayoutDirection::LeftRight => (config.horizontal_rank_spacing, config.horizontal_node_gap),
    };

    // ── Ordering + coordinates ──
    let mut placed: HashMap<NodeIndex, f32> = HashMap::new();
    let mut new_rects: HashMap<NodeIndex, Rect> = HashMap::new();

    for (rank, layer) in layers.iter_mut().enumerate() {
        // (has no placed parent, sort key)
        let mut keyed: Vec<(bool, f32, NodeIndex)> = layer
            .iter()
            .map(|&idx| {
                let parents: SmallVec<[f32; 4]> = board
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .filter_map(|p| placed.get(&p).copied())
                    .collect();
                if parents.is_empty() {
                    (true, cross_of(idx), idx)
                } else {
                    let mean = parents.iter().sum::<f32>() / parents.len() as f32;
                    (false, mean, idx)
                }
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let n = keyed.len() as f32;
        for (slot, (_, _, idx)) in keyed.iter().enumerate() {
            let cross = (slot as f32 - (n - 1.0) / 2.0) * node_gap;
            let main = rank as f32 * rank_spacing;
            let size = board.graph[*idx].size;
            let origin = match direction {
                LayoutDirection::TopDown => Point::new(cross - size.width / 2.0, main),
                LayoutDirection::LeftRight => Point::new(main, cross - size.height / 2.0),
            };
            placed.insert(*idx, cross);
            new_rects.insert(*idx, Rect::from_origin_size(origin, size));
        }
        *layer = keyed.into_iter().map(|(_, _, idx)| idx).collect();
    }

    // ── Preserve the visual center ──
    let old_rects: Vec<Rect> = nodes.iter().map(|idx| board.graph[*idx].rect()).collect();
    let fresh: Vec<Rect> = nodes.iter().filter_map(|idx| new_rects.get(idx).copied()).collect();
    let (dx, dy) = match (bounding_box(&old_rects), bounding_box(&fresh)) {
        (Some(old), Some(new)) => {
            let (oc, nc) = (old.center(), new.center());
            (oc.x - nc.x, oc.y - nc.y)
        }
        _ => (0.0, 0.0),
    };

    for idx in &nodes {
        let note = &board.graph[*idx];
        if let Some(rect) = new_rects.get(idx) {
            result
                .positions
                .push((note.id, rect.origin().offset(dx, dy)));
        }
        result.ranks.insert(note.id, memo[idx]);
    }

    log::debug!(
        "auto-layout {:?}: {} notes in {} layers",
        direction,
        nodes.len(),
        layers.len()
    );
    result
}

/// Memoized longest-path rank. A parent still on the recursion stack closes
/// a cycle and contributes as rank 0.
fn rank_of(
    board: &Board,
    idx: NodeIndex,
    memo: &mut HashMap<NodeIndex, usize>,
    on_stack: &mut HashSet<NodeIndex>,
    cycles_broken: &mut usize,
) -> usize {
    if let Some(rank) = memo.get(&idx) {
        return *rank;
    }
    on_stack.insert(idx);

    let parents: SmallVec<[NodeIndex; 4]> = board
        .graph
        .neighbors_directed(idx, Direction::Incoming)
        .filter(|p| *p != idx)
        .collect();

    let mut rank = 0;
    for parent in parents {
        let parent_rank = if on_stack.contains(&parent) {
            *cycles_broken += 1;
            0
        } else {
            rank_of(board, parent, memo, on_stack, cycles_broken)
        };
        rank = rank.max(parent_rank + 1);
    }

    on_stack.remove(&idx);
    memo.insert(idx, rank);
    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Note, NoteKind};
    use pretty_assertions::assert_eq;

    fn note(board: &mut Board, id: &str, x: f32, y: f32) -> NoteId {
        let id = NoteId::intern(id);
        board.add_note(Note::new(id, NoteKind::Text, Point::new(x, y)));
        id
    }

    #[test]
    fn empty_board_gives_empty_layout() {
        let result = auto_layout(&Board::new(), LayoutDirection::TopDown, &LayoutConfig::default());
        assert!(result.positions.is_empty());
    }

    #[test]
    fn chain_ranks_increase() {
        let mut board = Board::new();
        let a = note(&mut board, "lc_a", 0.0, 0.0);
        let b = note(&mut board, "lc_b", 900.0, 40.0);
        let c = note(&mut board, "lc_c", -300.0, 700.0);
        board.connect(b, c);
        board.connect(a, b);

        let result = auto_layout(&board, LayoutDirection::LeftRight, &LayoutConfig::default());
        assert_eq!(result.ranks[&a], 0);
        assert_eq!(result.ranks[&b], 1);
        assert_eq!(result.ranks[&c], 2);
        assert_eq!(result.style, ConnectionStyle::Curve);

        let (pa, pb, pc) = (
            result.position_of(a).unwrap(),
            result.position_of(b).unwrap(),
            result.position_of(c).unwrap(),
        );
        assert!((pb.x - pa.x - 400.0).abs() < 1e-3);
        assert!((pc.x - pb.x - 400.0).abs() < 1e-3);
    }

    #[test]
    fn cycle_terminates_and_is_counted() {
        let mut board = Board::new();
        let a = note(&mut board, "cy_a", 0.0, 0.0);
        let b = note(&mut board, "cy_b", 400.0, 0.0);
        let c = note(&mut board, "cy_c", 800.0, 0.0);
        board.connect(a, b);
        board.connect(b, c);
        board.connect(c, a);

        let result = auto_layout(&board, LayoutDirection::TopDown, &LayoutConfig::default());
        assert_eq!(result.positions.len(), 3);
        assert!(result.cycles_broken >= 1);
    }

    #[test]
    fn parentless_nodes_keep_relative_order() {
        let mut board = Board::new();
        let right = note(&mut board, "po_right", 1000.0, 0.0);
        let left = note(&mut board, "po_left", -1000.0, 0.0);
        let result = auto_layout(&board, LayoutDirection::TopDown, &LayoutConfig::default());
        assert!(result.position_of(left).unwrap().x < result.position_of(right).unwrap().x);
    }

    #[test]
    fn children_follow_parent_order() {
        let mut board = Board::new();
        let p1 = note(&mut board, "co_p1", 0.0, 0.0);
        let p2 = note(&mut board, "co_p2", 500.0, 0.0);
        // Children created in the opposite order of their parents.
        let c2 = note(&mut board, "co_c2", 0.0, 400.0);
        let c1 = note(&mut board, "co_c1", 500.0, 400.0);
        board.connect(p1, c1);
        board.connect(p2, c2);

        let result = auto_layout(&board, LayoutDirection::TopDown, &LayoutConfig::default());
        assert!(result.position_of(c1).unwrap().x < result.position_of(c2).unwrap().x);
    }
}
