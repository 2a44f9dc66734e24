//! Integration tests: auto-layout properties (nm-core).
//!
//! Rank monotonicity over acyclic inputs, bounding-box center preservation,
//! and the fan-out scenario from a single root.

use nm_core::geometry::bounding_box;
use nm_core::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn add(board: &mut Board, id: &str, x: f32, y: f32) -> NoteId {
    let id = NoteId::intern(id);
    board.add_note(Note::new(id, NoteKind::Text, Point::new(x, y)));
    id
}

fn apply(board: &mut Board, result: &LayoutResult) {
    for (id, pos) in &result.positions {
        board.update_note(*id, NotePatch::position(*pos));
    }
}

fn bbox_center(board: &Board) -> Point {
    bounding_box(&board.rects()).unwrap().center()
}

/// A small DAG with a diamond, a long chain, and a disconnected note.
fn sample_dag() -> (Board, Vec<(NoteId, NoteId)>) {
    let mut board = Board::new();
    let a = add(&mut board, "dag_a", 120.0, -40.0);
    let b = add(&mut board, "dag_b", -600.0, 300.0);
    let c = add(&mut board, "dag_c", 900.0, 220.0);
    let d = add(&mut board, "dag_d", 10.0, 900.0);
    let e = add(&mut board, "dag_e", 1500.0, 1500.0);
    let f = add(&mut board, "dag_f", -2000.0, 50.0);
    let g = add(&mut board, "dag_g", 333.0, 777.0);
    let edges = vec![(a, b), (a, c), (b, d), (c, d), (d, e), (a, e), (f, g)];
    for (from, to) in &edges {
        board.connect(*from, *to);
    }
    (board, edges)
}

// ─── Rank monotonicity ──────────────────────────────────────────────────

#[test]
fn every_edge_increases_rank() {
    init_logging();
    let (board, edges) = sample_dag();
    for direction in [LayoutDirection::TopDown, LayoutDirection::LeftRight] {
        let result = auto_layout(&board, direction, &LayoutConfig::default());
        assert_eq!(result.cycles_broken, 0);
        for (p, c) in &edges {
            assert!(
                result.ranks[c] >= result.ranks[p] + 1,
                "rank({c}) = {} should exceed rank({p}) = {}",
                result.ranks[c],
                result.ranks[p]
            );
        }
        // Longest path: a → b → d → e
        assert_eq!(result.ranks[&NoteId::intern("dag_e")], 3);
    }
}

// ─── Centroid preservation ──────────────────────────────────────────────

#[test]
fn layout_preserves_bounding_box_center() {
    init_logging();
    for direction in [LayoutDirection::TopDown, LayoutDirection::LeftRight] {
        let (mut board, _) = sample_dag();
        let before = bbox_center(&board);
        let result = auto_layout(&board, direction, &LayoutConfig::default());
        apply(&mut board, &result);
        let after = bbox_center(&board);
        assert!(
            (before.x - after.x).abs() < 1e-2 && (before.y - after.y).abs() < 1e-2,
            "{direction:?}: center moved from {before:?} to {after:?}"
        );
    }
}

// ─── Scenario: fan-out ──────────────────────────────────────────────────

#[test]
fn fan_out_siblings_share_a_row() {
    init_logging();
    let mut board = Board::new();
    let a = add(&mut board, "fan_a", 0.0, 0.0);
    let b = add(&mut board, "fan_b", 50.0, 600.0);
    let c = add(&mut board, "fan_c", -400.0, 100.0);
    board.connect(a, b);
    board.connect(a, c);

    let result = auto_layout(&board, LayoutDirection::TopDown, &LayoutConfig::default());
    assert_eq!(result.ranks[&a], 0);
    assert_eq!(result.ranks[&b], 1);
    assert_eq!(result.ranks[&c], 1);
    assert_eq!(result.style, ConnectionStyle::Step);

    let (pa, pb, pc) = (
        result.position_of(a).unwrap(),
        result.position_of(b).unwrap(),
        result.position_of(c).unwrap(),
    );
    assert!((pb.y - pc.y).abs() < 1e-3, "siblings on the same row");
    assert!((pb.x - pc.x).abs() > 1.0, "siblings in distinct columns");
    assert!(pa.y < pb.y, "parent above children");
}
