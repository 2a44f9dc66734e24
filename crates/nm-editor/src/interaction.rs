//! Pointer interaction state machine.
//!
//! One gesture session is open at a time. Pointer-down opens it, pointer-move
//! updates it, pointer-up closes it and produces the committed outcome. The
//! session is taken out of the controller, advanced by value, and put back,
//! so every transition sees a complete state and nothing lingers after
//! release. The committed board is never touched here: outcomes carry
//! `BoardMutation`s for the host, and in-flight state is exposed through
//! [`InteractionController::preview`].

use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::sync::BoardMutation;
use nm_core::geometry::{Point, Rect, Size};
use nm_core::{Board, Camera, ConnectionId, ConnectionStyle, NoteId, NoteKind, Selection};
use nm_render::paint::{DeleteZone, Overlay, TempEdge};
use nm_render::{NoteOffset, SpatialIndex};

/// Gesture thresholds, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionConfig {
    /// Travel below which a secondary press on empty canvas is a click.
    pub click_threshold: f32,
    /// Travel a connect gesture needs before a drop on empty canvas creates a note.
    pub connect_threshold: f32,
    /// Slack around note rectangles when looking for a connect target.
    pub connect_hit_buffer: f32,
    /// Radius of the delete zone around the viewport's bottom-right corner.
    pub delete_zone_radius: f32,
    /// Distance within which a press selects a connection.
    pub connection_hit_tolerance: f32,
    /// Size of notes created by connect-drop and double-click (world units).
    pub new_note_size: Size,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_threshold: 5.0,
            connect_threshold: 30.0,
            connect_hit_buffer: 24.0,
            delete_zone_radius: 200.0,
            connection_hit_tolerance: 6.0,
            new_note_size: Size::new(280.0, 140.0),
        }
    }
}

/// Wheel delta → zoom factor sensitivity.
const WHEEL_ZOOM_RATE: f32 = 0.0015;

/// Public view of the open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Panning,
    BoxSelecting,
    DraggingNotes,
    Connecting,
}

/// Committed result of one input event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Mutations the host must apply, in order.
    pub mutations: Vec<BoardMutation>,
    /// Screen position where the host should open its context menu.
    pub context_menu: Option<Point>,
    /// Whether anything visible changed.
    pub redraw: bool,
}

impl Outcome {
    fn none() -> Self {
        Self::default()
    }

    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }

    fn commit(mutations: Vec<BoardMutation>) -> Self {
        Self {
            mutations,
            redraw: true,
            ..Self::default()
        }
    }
}

/// Per-frame visual state of the open session. Never committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preview<'a> {
    None,
    Marquee {
        rect: Rect,
        candidates: &'a [NoteId],
    },
    Drag {
        ids: &'a [NoteId],
        dx: f32,
        dy: f32,
        over_delete_zone: bool,
    },
    Edge {
        source: NoteId,
        cursor: Point,
        target: Option<NoteId>,
    },
}

// ─── Session ─────────────────────────────────────────────────────────────

/// Pointer bookkeeping shared by every gesture.
#[derive(Debug, Clone, Copy)]
struct Track {
    /// Last pointer position (screen).
    last: Point,
    /// Total screen distance travelled since the press.
    travelled: f32,
    /// Modifiers at press time.
    modifiers: Modifiers,
}

impl Track {
    fn new(p: Point, modifiers: Modifiers) -> Self {
        Self {
            last: p,
            travelled: 0.0,
            modifiers,
        }
    }

    /// Advance to `p`, returning the screen delta.
    fn step(&mut self, p: Point) -> (f32, f32) {
        let (dx, dy) = (p.x - self.last.x, p.y - self.last.y);
        self.travelled += dx.hypot(dy);
        self.last = p;
        (dx, dy)
    }
}

#[derive(Debug, Clone, Default)]
enum Session {
    #[default]
    Idle,
    Panning {
        track: Track,
    },
    BoxSelecting {
        track: Track,
        origin: Point,
        rect: Rect,
        candidates: Vec<NoteId>,
    },
    DraggingNotes {
        track: Track,
        ids: Vec<NoteId>,
        dx: f32,
        dy: f32,
        over_delete_zone: bool,
    },
    Connecting {
        track: Track,
        source: NoteId,
        cursor: Point,
        target: Option<NoteId>,
    },
}

impl Session {
    fn mode(&self) -> Mode {
        match self {
            Session::Idle => Mode::Idle,
            Session::Panning { .. } => Mode::Panning,
            Session::BoxSelecting { .. } => Mode::BoxSelecting,
            Session::DraggingNotes { .. } => Mode::DraggingNotes,
            Session::Connecting { .. } => Mode::Connecting,
        }
    }

    fn track(&self) -> Option<&Track> {
        match self {
            Session::Idle => None,
            Session::Panning { track }
            | Session::BoxSelecting { track, .. }
            | Session::DraggingNotes { track, .. }
            | Session::Connecting { track, .. } => Some(track),
        }
    }
}

// ─── Controller ──────────────────────────────────────────────────────────

/// Turns raw pointer input into camera changes, selection changes, and
/// board mutations.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    config: InteractionConfig,
    camera: Camera,
    viewport: Size,
    selection: Selection,
    style: ConnectionStyle,
    session: Session,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Canvas size in screen pixels; anchors the delete zone.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn style(&self) -> ConnectionStyle {
        self.style
    }

    /// Connection style used for connection hit-testing.
    pub fn set_style(&mut self, style: ConnectionStyle) {
        self.style = style;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    /// Dispatch one input event.
    pub fn handle<I: SpatialIndex + ?Sized>(&mut self, event: &InputEvent, index: &I) -> Outcome {
        match *event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(Point::new(x, y), button, modifiers, index),
            InputEvent::PointerMove { x, y, buttons, .. } => {
                self.pointer_move(Point::new(x, y), buttons != 0, index)
            }
            InputEvent::PointerUp { x, y, modifiers } => {
                self.pointer_up(Point::new(x, y), modifiers, index)
            }
            InputEvent::Wheel { x, y, delta } => self.wheel(Point::new(x, y), delta),
            InputEvent::DoubleClick { x, y } => self.double_click(Point::new(x, y), index),
        }
    }

    pub fn pointer_down<I: SpatialIndex + ?Sized>(
        &mut self,
        p: Point,
        button: PointerButton,
        modifiers: Modifiers,
        index: &I,
    ) -> Outcome {
        if !matches!(self.session, Session::Idle) {
            log::debug!("pointer-down ignored during {:?}", self.session.mode());
            return Outcome::none();
        }

        let world = self.camera.screen_to_world(p);
        let hit = index.note_at(world);
        let track = Track::new(p, modifiers);

        let session = match (button, hit) {
            (PointerButton::Middle, _) | (PointerButton::Secondary, None) => Session::Panning { track },
            (PointerButton::Primary, None) => {
                let tolerance = self
                    .camera
                    .screen_len_to_world(self.config.connection_hit_tolerance);
                if let Some(conn) = index.connection_at(world, tolerance, self.style) {
                    log::debug!("selected connection {conn}");
                    self.selection.select_connection(conn);
                    return Outcome::redraw();
                }
                if !modifiers.additive() {
                    self.selection.clear();
                }
                Session::BoxSelecting {
                    track,
                    origin: world,
                    rect: Rect::from_corners(world, world),
                    candidates: Vec::new(),
                }
            }
            (PointerButton::Secondary, Some(id)) => {
                self.selection.insert(id);
                Session::Connecting {
                    track,
                    source: id,
                    cursor: world,
                    target: None,
                }
            }
            (PointerButton::Primary, Some(id)) => {
                if !self.selection.contains(id) {
                    if modifiers.additive() {
                        self.selection.insert(id);
                    } else {
                        self.selection.set_notes([id]);
                    }
                }
                Session::DraggingNotes {
                    track,
                    ids: self.selection.notes().to_vec(),
                    dx: 0.0,
                    dy: 0.0,
                    over_delete_zone: false,
                }
            }
        };

        log::debug!("{:?} → {:?} at ({}, {})", button, session.mode(), p.x, p.y);
        self.session = session;
        Outcome::redraw()
    }

    pub fn pointer_move<I: SpatialIndex + ?Sized>(
        &mut self,
        p: Point,
        buttons_held: bool,
        index: &I,
    ) -> Outcome {
        let Some(track) = self.session.track().copied() else {
            return Outcome::none();
        };
        if !buttons_held {
            log::debug!(
                "no buttons held during {:?}; closing session at ({}, {})",
                self.session.mode(),
                track.last.x,
                track.last.y
            );
            return self.pointer_up(track.last, track.modifiers, index);
        }

        let session = std::mem::take(&mut self.session);
        self.session = self.advance(session, p, index);
        Outcome::redraw()
    }

    pub fn pointer_up<I: SpatialIndex + ?Sized>(
        &mut self,
        p: Point,
        modifiers: Modifiers,
        index: &I,
    ) -> Outcome {
        let session = std::mem::take(&mut self.session);
        if matches!(session, Session::Idle) {
            return Outcome::none();
        }
        let moved = session.track().is_some_and(|t| t.last != p);
        let session = if moved {
            self.advance(session, p, index)
        } else {
            session
        };
        let mode = session.mode();
        let outcome = self.release(session, p, modifiers);
        log::debug!("{mode:?} released with {} mutation(s)", outcome.mutations.len());
        outcome
    }

    pub fn wheel(&mut self, p: Point, delta: f32) -> Outcome {
        let factor = (-delta * WHEEL_ZOOM_RATE).exp();
        self.camera.zoom_at(p, factor);
        log::trace!("zoom {} at ({}, {})", self.camera.z, p.x, p.y);
        Outcome::redraw()
    }

    /// Double-click on empty canvas creates a note centred there.
    pub fn double_click<I: SpatialIndex + ?Sized>(&mut self, p: Point, index: &I) -> Outcome {
        let world = self.camera.screen_to_world(p);
        if index.note_at(world).is_some() {
            return Outcome::none();
        }
        let id = NoteId::fresh();
        self.selection.set_notes([id]);
        Outcome::commit(vec![self.create_note(id, world, NoteKind::Text, None)])
    }

    /// A palette item dropped on the canvas at screen point `p`.
    pub fn drop_item(&mut self, p: Point, kind: NoteKind, content: impl Into<String>) -> Outcome {
        let world = self.camera.screen_to_world(p);
        let id = NoteId::fresh();
        let mut create = self.create_note(id, world, kind, None);
        if let BoardMutation::CreateNote { content: c, .. } = &mut create {
            *c = content.into();
        }
        Outcome::commit(vec![create])
    }

    /// Delete whatever is selected.
    pub fn delete_selection(&mut self) -> Outcome {
        let mutation = if let Some(id) = self.selection.connection() {
            BoardMutation::DeleteConnection { id }
        } else if !self.selection.notes().is_empty() {
            BoardMutation::DeleteNotes {
                ids: self.selection.notes().to_vec(),
            }
        } else {
            return Outcome::none();
        };
        self.selection.clear();
        Outcome::commit(vec![mutation])
    }

    /// Frame every note in the viewport.
    pub fn fit_view(&mut self, board: &Board) {
        self.camera = Camera::fit(&board.rects(), self.viewport, 48.0);
    }

    pub fn select_notes(&mut self, ids: impl IntoIterator<Item = NoteId>) {
        self.selection.set_notes(ids);
    }

    pub fn select_connection(&mut self, id: ConnectionId) {
        self.selection.select_connection(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drop selected ids that no longer exist on `board`.
    pub fn prune_selection(&mut self, board: &Board) {
        self.selection.retain_existing(board);
    }

    pub fn preview(&self) -> Preview<'_> {
        match &self.session {
            Session::Idle | Session::Panning { .. } => Preview::None,
            Session::BoxSelecting {
                rect, candidates, ..
            } => Preview::Marquee {
                rect: *rect,
                candidates,
            },
            Session::DraggingNotes {
                ids,
                dx,
                dy,
                over_delete_zone,
                ..
            } => Preview::Drag {
                ids,
                dx: *dx,
                dy: *dy,
                over_delete_zone: *over_delete_zone,
            },
            Session::Connecting {
                source,
                cursor,
                target,
                ..
            } => Preview::Edge {
                source: *source,
                cursor: *cursor,
                target: *target,
            },
        }
    }

    /// Preview and selection as a paint overlay.
    pub fn overlay(&self) -> Overlay<'_> {
        let mut overlay = Overlay::idle(&self.selection);
        match self.preview() {
            Preview::None => {}
            Preview::Marquee { rect, candidates } => {
                overlay.marquee = Some(rect);
                overlay.candidates = candidates;
            }
            Preview::Drag {
                ids,
                dx,
                dy,
                over_delete_zone,
            } => {
                overlay.offset = Some(NoteOffset { ids, dx, dy });
                overlay.delete_zone = Some(DeleteZone {
                    center: self.delete_zone_center(),
                    radius: self.config.delete_zone_radius,
                    hot: over_delete_zone,
                });
            }
            Preview::Edge {
                source,
                cursor,
                target,
            } => {
                overlay.temp_edge = Some(TempEdge {
                    source,
                    cursor,
                    target,
                });
            }
        }
        overlay
    }
}

// ─── Transitions ─────────────────────────────────────────────────────────

impl InteractionController {
    fn advance<I: SpatialIndex + ?Sized>(&mut self, session: Session, p: Point, index: &I) -> Session {
        let world = self.camera.screen_to_world(p);
        match session {
            Session::Idle => Session::Idle,
            Session::Panning { mut track } => {
                let (dx, dy) = track.step(p);
                self.camera.pan(dx, dy);
                Session::Panning { track }
            }
            Session::BoxSelecting {
                mut track, origin, ..
            } => {
                track.step(p);
                let rect = Rect::from_corners(origin, world);
                let candidates = index.notes_in_rect(&rect);
                log::trace!("marquee {rect:?}: {} candidate(s)", candidates.len());
                Session::BoxSelecting {
                    track,
                    origin,
                    rect,
                    candidates,
                }
            }
            Session::DraggingNotes {
                mut track,
                ids,
                dx,
                dy,
                over_delete_zone,
            } => {
                let (sx, sy) = track.step(p);
                let hot = self.in_delete_zone(p);
                if hot != over_delete_zone {
                    log::debug!("{} delete zone", if hot { "entered" } else { "left" });
                }
                Session::DraggingNotes {
                    track,
                    ids,
                    dx: dx + self.camera.screen_len_to_world(sx),
                    dy: dy + self.camera.screen_len_to_world(sy),
                    over_delete_zone: hot,
                }
            }
            Session::Connecting {
                mut track, source, ..
            } => {
                track.step(p);
                let buffer = self.camera.screen_len_to_world(self.config.connect_hit_buffer);
                let target = index.nearest_note(world, buffer, Some(source));
                Session::Connecting {
                    track,
                    source,
                    cursor: world,
                    target,
                }
            }
        }
    }

    fn release(&mut self, session: Session, p: Point, modifiers: Modifiers) -> Outcome {
        match session {
            Session::Idle => Outcome::none(),
            Session::Panning { track } => {
                if track.travelled < self.config.click_threshold {
                    Outcome {
                        context_menu: Some(p),
                        ..Outcome::redraw()
                    }
                } else {
                    Outcome::redraw()
                }
            }
            Session::BoxSelecting {
                track, candidates, ..
            } => {
                if track.modifiers.additive() && modifiers.additive() {
                    for id in candidates {
                        self.selection.insert(id);
                    }
                } else {
                    self.selection.set_notes(candidates);
                }
                Outcome::redraw()
            }
            Session::DraggingNotes {
                ids,
                dx,
                dy,
                over_delete_zone,
                ..
            } => {
                if over_delete_zone {
                    self.selection.clear();
                    Outcome::commit(vec![BoardMutation::DeleteNotes { ids }])
                } else if dx != 0.0 || dy != 0.0 {
                    Outcome::commit(vec![BoardMutation::MoveNotes { ids, dx, dy }])
                } else {
                    Outcome::redraw()
                }
            }
            Session::Connecting {
                track,
                source,
                cursor,
                target,
            } => match target {
                Some(to) => Outcome::commit(vec![BoardMutation::Connect { from: source, to }]),
                None if track.travelled >= self.config.connect_threshold => {
                    let id = NoteId::fresh();
                    let create = self.create_note(id, cursor, NoteKind::Text, Some(source));
                    Outcome::commit(vec![create])
                }
                None => Outcome::redraw(),
            },
        }
    }

    fn create_note(&self, id: NoteId, center: Point, kind: NoteKind, parent: Option<NoteId>) -> BoardMutation {
        let size = match kind {
            NoteKind::Text => self.config.new_note_size,
            other => other.default_size(),
        };
        BoardMutation::CreateNote {
            id,
            position: center.offset(-size.width / 2.0, -size.height / 2.0),
            content: String::new(),
            parent,
            kind,
            pending: false,
        }
    }

    fn delete_zone_center(&self) -> Point {
        Point::new(self.viewport.width, self.viewport.height)
    }

    fn in_delete_zone(&self, p: Point) -> bool {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return false;
        }
        p.distance(self.delete_zone_center()) <= self.config.delete_zone_radius
    }
}
