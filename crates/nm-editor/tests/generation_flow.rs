//! Integration tests: placeholder-driven idea and summary generation against
//! the reference board engine.

use nm_core::geometry::Point;
use nm_core::{Note, NoteId, NoteKind};
use nm_editor::ideas::{GenerationError, IdeaFlow, TextGenerator, run_ideas, run_summary};
use nm_editor::sync::{BoardEngine, BoardMutation};
use pretty_assertions::assert_eq;

/// Generator answering from canned results.
struct Canned {
    ideas: Result<Vec<String>, String>,
    summary: Result<String, String>,
}

impl Canned {
    fn ideas(list: &[&str]) -> Self {
        Self {
            ideas: Ok(list.iter().map(|s| s.to_string()).collect()),
            summary: Err("unused".into()),
        }
    }

    fn failing(msg: &str) -> Self {
        Self {
            ideas: Err(msg.into()),
            summary: Err(msg.into()),
        }
    }
}

impl TextGenerator for Canned {
    async fn request_ideas(&self, _source_text: &str) -> Result<Vec<String>, String> {
        tokio::task::yield_now().await;
        self.ideas.clone()
    }

    async fn request_summary(&self, _source_text: &str) -> Result<String, String> {
        tokio::task::yield_now().await;
        self.summary.clone()
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine_with_source(name: &str) -> (BoardEngine, NoteId) {
    let mut engine = BoardEngine::new();
    let id = NoteId::intern(name);
    engine.board.add_note(
        Note::new(id, NoteKind::Text, Point::ZERO).with_content("Plan the garden"),
    );
    (engine, id)
}

fn contents(engine: &BoardEngine, parent: NoteId) -> Vec<String> {
    engine
        .board
        .children(parent)
        .into_iter()
        .filter_map(|id| engine.board.note(id))
        .map(|n| n.content.clone())
        .collect()
}

// ─── Ideas ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn ideas_fill_placeholders_in_place() {
    init();
    let (mut engine, src) = engine_with_source("gf_fill");
    let mut flow = IdeaFlow::default();
    let generator = Canned::ideas(&["Tomatoes", "Compost", "Drip irrigation"]);

    let completion = run_ideas(&mut flow, &mut engine, &generator, src).await.unwrap();
    assert_eq!(completion.notice, None);
    assert!(!flow.is_busy());

    let mut got = contents(&engine, src);
    got.sort();
    assert_eq!(got, vec!["Compost", "Drip irrigation", "Tomatoes"]);
    assert!(engine.board.notes().all(|n| !n.pending));
}

#[tokio::test]
async fn extra_ideas_create_notes_and_missing_ones_trim_placeholders() {
    init();
    let (mut engine, src) = engine_with_source("gf_more");
    let mut flow = IdeaFlow::default();
    let generator = Canned::ideas(&["a", "b", "c", "d"]);
    run_ideas(&mut flow, &mut engine, &generator, src).await.unwrap();
    assert_eq!(engine.board.children(src).len(), 4);

    let (mut engine, src) = engine_with_source("gf_fewer");
    let generator = Canned::ideas(&["only one", "   "]);
    run_ideas(&mut flow, &mut engine, &generator, src).await.unwrap();
    assert_eq!(contents(&engine, src), vec!["only one"]);
    assert_eq!(engine.board.len(), 2);
}

#[tokio::test]
async fn failure_rolls_back_placeholders() {
    init();
    let (mut engine, src) = engine_with_source("gf_fail");
    let mut flow = IdeaFlow::default();
    let completion = run_ideas(&mut flow, &mut engine, &Canned::failing("rate limited"), src)
        .await
        .unwrap();

    assert_eq!(engine.board.len(), 1);
    assert_eq!(engine.board.connection_count(), 0);
    let notice = completion.notice.unwrap();
    assert!(notice.contains("rate limited"), "{notice}");
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn placeholders_deleted_by_the_user_are_skipped() {
    init();
    let (mut engine, src) = engine_with_source("gf_gone");
    let mut flow = IdeaFlow::default();

    let started = flow.begin_ideas(&engine.board, src).unwrap();
    engine.apply_all(started.mutations);
    let first = engine.board.children(src)[0];
    engine.apply_mutation(BoardMutation::DeleteNotes { ids: vec![first] });

    let generator = Canned::ideas(&["x", "y"]);
    let result = generator.request_ideas(&started.source_text).await;
    let completion = flow.finish_ideas(&engine.board, result).unwrap();
    engine.apply_all(completion.mutations);

    let mut got = contents(&engine, src);
    got.sort();
    assert_eq!(got, vec!["x", "y"]);
}

// ─── Summary ────────────────────────────────────────────────────────────

#[tokio::test]
async fn summary_creates_one_connected_note() {
    init();
    let (mut engine, src) = engine_with_source("gf_sum");
    let mut flow = IdeaFlow::default();
    let generator = Canned {
        ideas: Err("unused".into()),
        summary: Ok("Raised beds, drip lines, and compost.".into()),
    };
    run_summary(&mut flow, &mut engine, &generator, src).await.unwrap();
    assert_eq!(contents(&engine, src), vec!["Raised beds, drip lines, and compost."]);
}

// ─── Single flight ──────────────────────────────────────────────────────

#[tokio::test]
async fn only_one_request_at_a_time() {
    init();
    let (mut engine, src) = engine_with_source("gf_single");
    let mut flow = IdeaFlow::default();
    let started = flow.begin_summary(&engine.board, src).unwrap();
    engine.apply_all(started.mutations);

    let err = run_ideas(&mut flow, &mut engine, &Canned::ideas(&["z"]), src)
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::Busy);
    // The busy attempt left no extra placeholders behind.
    assert_eq!(engine.board.len(), 2);
}
