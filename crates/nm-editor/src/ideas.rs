//! Idea and summary generation.
//!
//! Generation is two-phase. `begin_*` synchronously lays out pending
//! placeholder notes next to the source note so the board reacts
//! immediately; the host then awaits its [`TextGenerator`] and hands the
//! result to `finish_*`, which fills the placeholders in place or rolls
//! them back. Only one request may be outstanding at a time.

use crate::sync::{BoardEngine, BoardMutation};
use nm_core::geometry::Point;
use nm_core::{Board, NoteId, NoteKind, NotePatch};
use std::fmt;
use std::future::Future;

/// The text-generation service. Implementations typically call a remote
/// model; failures are reported as plain messages.
pub trait TextGenerator {
    /// Related ideas for `source_text`, one per returned string.
    fn request_ideas(&self, source_text: &str) -> impl Future<Output = Result<Vec<String>, String>>;

    /// A summary of `source_text`.
    fn request_summary(&self, source_text: &str) -> impl Future<Output = Result<String, String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A request is already outstanding.
    Busy,
    /// The source note does not exist.
    UnknownNote(NoteId),
    /// `finish_*` called with no matching request in flight.
    NoRequest,
    /// The generator failed; placeholders were rolled back.
    Failed(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Busy => write!(f, "a generation request is already running"),
            GenerationError::UnknownNote(id) => write!(f, "note {id} does not exist"),
            GenerationError::NoRequest => write!(f, "no generation request in flight"),
            GenerationError::Failed(msg) => write!(f, "generation failed: {msg}"),
        }
    }
}

impl std::error::Error for GenerationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Ideas,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdeaConfig {
    /// Placeholders created for an ideas request.
    pub placeholder_count: usize,
    /// Horizontal gap between the source note and its generated notes.
    pub horizontal_gap: f32,
    /// Vertical gap between stacked generated notes.
    pub vertical_gap: f32,
}

impl Default for IdeaConfig {
    fn default() -> Self {
        Self {
            placeholder_count: 3,
            horizontal_gap: 120.0,
            vertical_gap: 40.0,
        }
    }
}

/// The outstanding request.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub kind: RequestKind,
    pub source: NoteId,
    pub placeholders: Vec<NoteId>,
}

/// Result of `begin_*`.
#[derive(Debug, Clone, PartialEq)]
pub struct Started {
    /// Text to send to the generator.
    pub source_text: String,
    /// Placeholder creation, to apply right away.
    pub mutations: Vec<BoardMutation>,
}

/// Result of `finish_*`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub mutations: Vec<BoardMutation>,
    /// Transient message for the user when the request did not succeed.
    pub notice: Option<String>,
}

/// Single-flight gate around placeholder creation and resolution.
#[derive(Debug, Clone, Default)]
pub struct IdeaFlow {
    config: IdeaConfig,
    in_flight: Option<PendingRequest>,
}

impl IdeaFlow {
    pub fn new(config: IdeaConfig) -> Self {
        Self {
            config,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.in_flight.as_ref()
    }

    pub fn begin_ideas(&mut self, board: &Board, source: NoteId) -> Result<Started, GenerationError> {
        self.begin(board, source, RequestKind::Ideas)
    }

    pub fn begin_summary(&mut self, board: &Board, source: NoteId) -> Result<Started, GenerationError> {
        self.begin(board, source, RequestKind::Summary)
    }

    pub fn finish_ideas(
        &mut self,
        board: &Board,
        result: Result<Vec<String>, String>,
    ) -> Result<Completion, GenerationError> {
        self.settle(board, RequestKind::Ideas, result)
    }

    pub fn finish_summary(
        &mut self,
        board: &Board,
        result: Result<String, String>,
    ) -> Result<Completion, GenerationError> {
        self.settle(board, RequestKind::Summary, result.map(|s| vec![s]))
    }

    fn begin(&mut self, board: &Board, source: NoteId, kind: RequestKind) -> Result<Started, GenerationError> {
        if self.in_flight.is_some() {
            return Err(GenerationError::Busy);
        }
        let note = board.note(source).ok_or(GenerationError::UnknownNote(source))?;

        let count = match kind {
            RequestKind::Ideas => self.config.placeholder_count.max(1),
            RequestKind::Summary => 1,
        };
        let placeholders: Vec<NoteId> = (0..count).map(|_| NoteId::fresh()).collect();
        let mutations = placeholders
            .iter()
            .enumerate()
            .map(|(i, id)| self.placeholder(board, source, kind, *id, i, count))
            .collect();

        log::debug!("{kind:?} requested for {source} with {count} placeholder(s)");
        self.in_flight = Some(PendingRequest {
            kind,
            source,
            placeholders,
        });
        Ok(Started {
            source_text: note.content.clone(),
            mutations,
        })
    }

    fn settle(
        &mut self,
        board: &Board,
        kind: RequestKind,
        result: Result<Vec<String>, String>,
    ) -> Result<Completion, GenerationError> {
        let request = match self.in_flight.take() {
            Some(r) if r.kind == kind => r,
            other => {
                self.in_flight = other;
                return Err(GenerationError::NoRequest);
            }
        };

        // The user may have deleted placeholders meanwhile.
        let live: Vec<NoteId> = request
            .placeholders
            .iter()
            .copied()
            .filter(|id| board.contains(*id))
            .collect();

        let texts: Vec<String> = match result {
            Ok(texts) => texts
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            Err(msg) => {
                log::warn!("{kind:?} for {} failed: {msg}", request.source);
                return Ok(rollback(live, format!("Couldn't generate {}: {msg}", noun(kind))));
            }
        };
        if texts.is_empty() {
            return Ok(rollback(live, format!("No {} came back", noun(kind))));
        }

        let mut mutations = Vec::new();
        let mut live_iter = live.iter();
        let total = texts.len().max(request.placeholders.len());
        for (i, text) in texts.into_iter().enumerate() {
            match live_iter.next() {
                Some(id) => mutations.push(BoardMutation::UpdateNote {
                    id: *id,
                    patch: NotePatch {
                        content: Some(text),
                        pending: Some(false),
                        ..NotePatch::default()
                    },
                }),
                None if board.contains(request.source) => {
                    let id = NoteId::fresh();
                    let mut create = self.placeholder(board, request.source, kind, id, i, total);
                    if let BoardMutation::CreateNote {
                        content, pending, ..
                    } = &mut create
                    {
                        *content = text;
                        *pending = false;
                    }
                    mutations.push(create);
                }
                None => log::debug!("source {} gone; dropping extra result", request.source),
            }
        }
        let surplus: Vec<NoteId> = live_iter.copied().collect();
        if !surplus.is_empty() {
            mutations.push(BoardMutation::DeleteNotes { ids: surplus });
        }

        log::debug!("{kind:?} for {} resolved with {} mutation(s)", request.source, mutations.len());
        Ok(Completion {
            mutations,
            notice: None,
        })
    }

    /// Placeholder `i` of `count`, stacked to the right of the source note.
    fn placeholder(
        &self,
        board: &Board,
        source: NoteId,
        kind: RequestKind,
        id: NoteId,
        i: usize,
        count: usize,
    ) -> BoardMutation {
        let note_kind = match kind {
            RequestKind::Ideas => NoteKind::Topic,
            RequestKind::Summary => NoteKind::Text,
        };
        let size = note_kind.default_size();
        let anchor = board.note(source).map(|n| n.rect());
        let position = match anchor {
            Some(r) => {
                let step = size.height + self.config.vertical_gap;
                let cy = r.center().y + (i as f32 - (count as f32 - 1.0) / 2.0) * step;
                Point::new(r.right() + self.config.horizontal_gap, cy - size.height / 2.0)
            }
            None => Point::ZERO,
        };
        BoardMutation::CreateNote {
            id,
            position,
            content: String::new(),
            parent: Some(source),
            kind: note_kind,
            pending: true,
        }
    }
}

fn noun(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Ideas => "ideas",
        RequestKind::Summary => "a summary",
    }
}

fn rollback(placeholders: Vec<NoteId>, notice: String) -> Completion {
    let mutations = if placeholders.is_empty() {
        Vec::new()
    } else {
        vec![BoardMutation::DeleteNotes { ids: placeholders }]
    };
    Completion {
        mutations,
        notice: Some(notice),
    }
}

// ─── Drivers ─────────────────────────────────────────────────────────────

/// Run a full ideas cycle against `engine`.
pub async fn run_ideas<G: TextGenerator>(
    flow: &mut IdeaFlow,
    engine: &mut BoardEngine,
    generator: &G,
    source: NoteId,
) -> Result<Completion, GenerationError> {
    let started = flow.begin_ideas(&engine.board, source)?;
    engine.apply_all(started.mutations);
    let result = generator.request_ideas(&started.source_text).await;
    let completion = flow.finish_ideas(&engine.board, result)?;
    engine.apply_all(completion.mutations.clone());
    Ok(completion)
}

/// Run a full summary cycle against `engine`.
pub async fn run_summary<G: TextGenerator>(
    flow: &mut IdeaFlow,
    engine: &mut BoardEngine,
    generator: &G,
    source: NoteId,
) -> Result<Completion, GenerationError> {
    let started = flow.begin_summary(&engine.board, source)?;
    engine.apply_all(started.mutations);
    let result = generator.request_summary(&started.source_text).await;
    let completion = flow.finish_summary(&engine.board, result)?;
    engine.apply_all(completion.mutations.clone());
    Ok(completion)
}
