//! Integration tests: connection toggle semantics (nm-core).

use nm_core::*;
use pretty_assertions::assert_eq;

fn board_of(n: usize, prefix: &str) -> (Board, Vec<NoteId>) {
    let mut board = Board::new();
    let ids: Vec<NoteId> = (0..n)
        .map(|i| NoteId::intern(&format!("{prefix}_{i}")))
        .collect();
    for (i, id) in ids.iter().enumerate() {
        board.add_note(Note::new(*id, NoteKind::Text, Point::new(i as f32 * 500.0, 0.0)));
    }
    (board, ids)
}

fn edges_between(board: &Board, a: NoteId, b: NoteId) -> usize {
    board
        .connections()
        .filter(|c| (c.from == a && c.to == b) || (c.from == b && c.to == a))
        .count()
}

#[test]
fn scenario_connect_twice_leaves_no_connections() {
    let mut board = Board::new();
    let a = NoteId::intern("sc_a");
    let b = NoteId::intern("sc_b");
    board.add_note(
        Note::new(a, NoteKind::Text, Point::new(0.0, 0.0)).with_size(Size::new(280.0, 140.0)),
    );
    board.add_note(
        Note::new(b, NoteKind::Text, Point::new(500.0, 0.0)).with_size(Size::new(280.0, 140.0)),
    );

    board.connect(a, b);
    board.connect(a, b);
    assert_eq!(board.connections().count(), 0);
}

#[test]
fn connect_then_reverse_then_reverse_again_is_empty() {
    let (mut board, ids) = board_of(2, "flip");
    board.connect(ids[0], ids[1]);
    board.connect(ids[1], ids[0]);
    assert_eq!(edges_between(&board, ids[0], ids[1]), 1);
    board.connect(ids[1], ids[0]);
    assert_eq!(edges_between(&board, ids[0], ids[1]), 0);
}

#[test]
fn at_most_one_edge_per_pair_after_any_sequence() {
    let (mut board, ids) = board_of(5, "seq");
    // Deterministic pseudo-random walk over ordered pairs.
    let mut state: u32 = 0x2545_F491;
    for _ in 0..400 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let from = ids[(state % 5) as usize];
        let to = ids[((state >> 8) % 5) as usize];
        board.connect(from, to);

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                assert!(edges_between(&board, ids[i], ids[j]) <= 1);
            }
        }
    }
}

#[test]
fn deleting_notes_prunes_their_connections() {
    let (mut board, ids) = board_of(4, "prune");
    board.connect(ids[0], ids[1]);
    board.connect(ids[1], ids[2]);
    board.connect(ids[2], ids[3]);
    board.connect(ids[3], ids[0]);

    assert_eq!(board.remove_notes(&[ids[1], ids[3]]), 2);
    assert_eq!(board.connection_count(), 0);
    for conn in board.connections() {
        assert!(board.contains(conn.from) && board.contains(conn.to));
    }
}
