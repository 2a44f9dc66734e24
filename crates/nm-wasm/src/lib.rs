//! WASM bridge for Notemap: exposes the board engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the `<canvas>`
//! and forwards DOM events here; every handler reports whether a redraw is
//! needed. Generation requests are two-phase: `begin_*` returns the text to
//! send to the model, and the page calls `resolve_*` or `fail_*` when the
//! request settles.

mod render2d;

use nm_core::geometry::{Point, Size};
use nm_core::{ConnectionId, ConnectionStyle, LayoutConfig, LayoutDirection, NoteColor, NoteId, NoteKind, NotePatch};
use nm_editor::ideas::{Completion, GenerationError, IdeaFlow};
use nm_editor::input::{InputEvent, Modifiers, PointerButton};
use nm_editor::interaction::{InteractionController, Outcome};
use nm_editor::measure::MeasureQueue;
use nm_editor::sync::{BoardEngine, BoardMutation};
use nm_render::route::route_board;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
#[wasm_bindgen]
pub struct NoteCanvas {
    engine: BoardEngine,
    controller: InteractionController,
    ideas: IdeaFlow,
    measure: MeasureQueue,
    width: f64,
    height: f64,
    /// `false` = light (default), `true` = dark.
    dark_mode: bool,
    /// Context-menu request from the last pointer-up.
    context_menu: Option<Point>,
    /// Transient message from the last generation request.
    notice: Option<String>,
}

#[wasm_bindgen]
impl NoteCanvas {
    /// Create a new canvas controller with the given dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();

        let mut controller = InteractionController::default();
        controller.set_viewport(Size::new(width as f32, height as f32));
        Self {
            engine: BoardEngine::new(),
            controller,
            ideas: IdeaFlow::default(),
            measure: MeasureQueue::default(),
            width,
            height,
            dark_mode: false,
            context_menu: None,
            notice: None,
        }
    }

    /// Replace the board from a JSON snapshot (`{notes, connections}`).
    pub fn set_board_json(&mut self, text: &str) -> Result<(), String> {
        let engine = BoardEngine::from_json(text)?;
        let style = self.engine.style;
        self.engine = engine;
        self.engine.style = style;
        self.controller.prune_selection(&self.engine.board);
        Ok(())
    }

    /// Current board as a JSON snapshot.
    pub fn get_board_json(&self) -> String {
        self.engine.to_json().unwrap_or_else(|e| {
            log::warn!("{e}");
            r#"{"notes":[],"connections":[]}"#.to_string()
        })
    }

    /// Monotonic counter bumped whenever the board changes. Exact up to
    /// 2^53, like every JS number.
    pub fn revision(&self) -> f64 {
        self.engine.revision() as f64
    }

    /// Render the board to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        render2d::render_board(
            ctx,
            &self.engine.board,
            self.controller.camera(),
            self.engine.style,
            &self.controller.overlay(),
            self.width,
            self.height,
            &theme,
        );
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.controller
            .set_viewport(Size::new(width as f32, height as f32));
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Handle pointer down. `button` is the DOM `MouseEvent.button`.
    /// Returns true if a redraw is needed.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let Some(button) = PointerButton::from_dom(button) else {
            return false;
        };
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.dispatch(InputEvent::pointer_down(x, y, button, modifiers))
    }

    /// Handle pointer move. `buttons` is the DOM `MouseEvent.buttons` mask.
    pub fn handle_pointer_move(&mut self, x: f32, y: f32, buttons: u16) -> bool {
        self.dispatch(InputEvent::PointerMove {
            x,
            y,
            buttons,
            modifiers: Modifiers::NONE,
        })
    }

    /// Handle pointer up. Returns JSON:
    /// `{"changed":bool,"contextMenu":{"x":..,"y":..}|null}`.
    pub fn handle_pointer_up(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let changed = self.dispatch(InputEvent::pointer_up(x, y, modifiers));
        let menu = match self.context_menu.take() {
            Some(p) => format!(r#"{{"x":{},"y":{}}}"#, p.x, p.y),
            None => "null".to_string(),
        };
        format!(r#"{{"changed":{changed},"contextMenu":{menu}}}"#)
    }

    pub fn handle_wheel(&mut self, x: f32, y: f32, delta: f32) -> bool {
        self.dispatch(InputEvent::Wheel { x, y, delta })
    }

    pub fn handle_double_click(&mut self, x: f32, y: f32) -> bool {
        self.dispatch(InputEvent::DoubleClick { x, y })
    }

    /// A palette item dropped at screen `(x, y)`. `kind` is `text`, `topic`
    /// or `tag`.
    pub fn drop_item(&mut self, x: f32, y: f32, kind: &str, content: &str) -> bool {
        let Some(kind) = NoteKind::parse(kind) else {
            log::warn!("unknown note kind {kind:?}");
            return false;
        };
        self.stamp_time();
        let outcome = self.controller.drop_item(Point::new(x, y), kind, content);
        self.apply_outcome(outcome)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Selected note ids as a JSON array.
    pub fn get_selected_ids(&self) -> String {
        let ids: Vec<&str> = self
            .controller
            .selection()
            .notes()
            .iter()
            .map(|id| id.as_str())
            .collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    /// Selected connection id, or empty string.
    pub fn get_selected_connection(&self) -> String {
        self.controller
            .selection()
            .connection()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn select_by_id(&mut self, note_id: &str) -> bool {
        let id = NoteId::intern(note_id);
        if !self.engine.board.contains(id) {
            return false;
        }
        self.controller.select_notes([id]);
        true
    }

    pub fn select_connection(&mut self, connection_id: &str) -> bool {
        let id = ConnectionId::intern(connection_id);
        if self.engine.board.connection(id).is_none() {
            return false;
        }
        self.controller.select_connection(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.controller.clear_selection();
    }

    /// Delete the selected notes or connection.
    pub fn delete_selected(&mut self) -> bool {
        let outcome = self.controller.delete_selection();
        self.apply_outcome(outcome)
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    pub fn set_note_content(&mut self, note_id: &str, content: &str) -> bool {
        self.apply(vec![BoardMutation::UpdateNote {
            id: NoteId::intern(note_id),
            patch: NotePatch::content(content),
        }])
    }

    /// Set a note's color by palette name (`yellow`, `blue`, ...).
    pub fn set_note_color(&mut self, note_id: &str, color: &str) -> bool {
        let Ok(color) = serde_json::from_value::<NoteColor>(serde_json::Value::String(color.to_lowercase()))
        else {
            log::warn!("unknown note color {color:?}");
            return false;
        };
        self.apply(vec![BoardMutation::UpdateNote {
            id: NoteId::intern(note_id),
            patch: NotePatch {
                color: Some(color),
                ..NotePatch::default()
            },
        }])
    }

    /// Set a connection label; an empty string clears it.
    pub fn set_connection_label(&mut self, connection_id: &str, label: &str) -> bool {
        let label = Some(label.trim().to_string()).filter(|l| !l.is_empty());
        self.apply(vec![BoardMutation::SetConnectionLabel {
            id: ConnectionId::intern(connection_id),
            label,
        }])
    }

    /// Queue a DOM-measured note size.
    pub fn report_note_size(&mut self, note_id: &str, width: f32, height: f32, now_ms: f64) {
        self.measure
            .report(NoteId::intern(note_id), Size::new(width, height), now_ms as u64);
    }

    /// Commit queued sizes once the debounce window has passed.
    pub fn flush_measurements(&mut self, now_ms: f64) -> bool {
        let updates = self.measure.flush(&self.engine.board, now_ms as u64);
        self.apply(updates)
    }

    // ─── Layout & view ───────────────────────────────────────────────────

    /// Arrange the board. `direction` is `vertical` or `horizontal`.
    pub fn auto_layout(&mut self, direction: &str) -> bool {
        let Some(direction) = LayoutDirection::parse(direction) else {
            log::warn!("unknown layout direction {direction:?}");
            return false;
        };
        let result = self.engine.auto_layout(direction, &LayoutConfig::default());
        self.controller.set_style(self.engine.style);
        if result.cycles_broken > 0 {
            log::debug!("layout broke {} cycle edge(s)", result.cycles_broken);
        }
        !result.positions.is_empty()
    }

    /// `straight`, `curve` or `step`.
    pub fn set_connection_style(&mut self, name: &str) -> bool {
        let Some(style) = ConnectionStyle::parse(name) else {
            return false;
        };
        self.engine.style = style;
        self.controller.set_style(style);
        true
    }

    pub fn get_connection_style(&self) -> String {
        match self.engine.style {
            ConnectionStyle::Straight => "straight",
            ConnectionStyle::Curve => "curve",
            ConnectionStyle::Step => "step",
        }
        .to_string()
    }

    pub fn fit_view(&mut self) -> bool {
        self.controller.fit_view(&self.engine.board);
        true
    }

    /// Camera as JSON `{"x":..,"y":..,"z":..}`.
    pub fn get_camera(&self) -> String {
        serde_json::to_string(self.controller.camera()).unwrap_or_else(|_| "null".to_string())
    }

    /// Routed connections for DOM overlays: JSON array of
    /// `{"id","path","labelX","labelY"}` in world space.
    pub fn get_connection_routes(&self) -> String {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct RouteJson {
            id: String,
            path: String,
            label_x: f32,
            label_y: f32,
        }
        let routes: Vec<RouteJson> = route_board(&self.engine.board, self.engine.style, None)
            .into_iter()
            .map(|(id, route)| RouteJson {
                id: id.as_str().to_string(),
                path: route.to_svg(),
                label_x: route.label_anchor.x,
                label_y: route.label_anchor.y,
            })
            .collect();
        serde_json::to_string(&routes).unwrap_or_else(|_| "[]".to_string())
    }

    /// Mermaid flowchart of the board.
    pub fn export_mermaid(&self, direction: &str) -> String {
        let direction = LayoutDirection::parse(direction).unwrap_or_default();
        nm_core::export_mermaid(&self.engine.board, direction)
    }

    // ─── Generation ──────────────────────────────────────────────────────

    /// Start an ideas request. Returns JSON `{"ok":true,"text":".."}` or
    /// `{"ok":false,"error":".."}`.
    pub fn begin_ideas(&mut self, note_id: &str) -> String {
        self.stamp_time();
        let started = self.ideas.begin_ideas(&self.engine.board, NoteId::intern(note_id));
        self.started_json(started)
    }

    /// Complete the ideas request with a JSON array of strings.
    pub fn resolve_ideas(&mut self, ideas_json: &str) -> bool {
        let result = serde_json::from_str::<Vec<String>>(ideas_json).map_err(|e| format!("invalid ideas JSON: {e}"));
        self.stamp_time();
        let completion = self.ideas.finish_ideas(&self.engine.board, result);
        self.apply_completion(completion)
    }

    pub fn fail_ideas(&mut self, message: &str) -> bool {
        let completion = self.ideas.finish_ideas(&self.engine.board, Err(message.to_string()));
        self.apply_completion(completion)
    }

    pub fn begin_summary(&mut self, note_id: &str) -> String {
        self.stamp_time();
        let started = self.ideas.begin_summary(&self.engine.board, NoteId::intern(note_id));
        self.started_json(started)
    }

    pub fn resolve_summary(&mut self, text: &str) -> bool {
        let completion = self.ideas.finish_summary(&self.engine.board, Ok(text.to_string()));
        self.apply_completion(completion)
    }

    pub fn fail_summary(&mut self, message: &str) -> bool {
        let completion = self.ideas.finish_summary(&self.engine.board, Err(message.to_string()));
        self.apply_completion(completion)
    }

    pub fn is_generating(&self) -> bool {
        self.ideas.is_busy()
    }

    /// Take the pending user notice, or empty string.
    pub fn take_notice(&mut self) -> String {
        self.notice.take().unwrap_or_default()
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

impl NoteCanvas {
    fn dispatch(&mut self, event: InputEvent) -> bool {
        self.stamp_time();
        let outcome = self.controller.handle(&event, &self.engine.board);
        self.apply_outcome(outcome)
    }

    fn apply_outcome(&mut self, outcome: Outcome) -> bool {
        if outcome.context_menu.is_some() {
            self.context_menu = outcome.context_menu;
        }
        let changed = self.apply(outcome.mutations);
        changed || outcome.redraw
    }

    fn apply(&mut self, mutations: Vec<BoardMutation>) -> bool {
        if mutations.is_empty() {
            return false;
        }
        let changed = self.engine.apply_all(mutations);
        if changed {
            self.controller.prune_selection(&self.engine.board);
        }
        changed
    }

    fn apply_completion(&mut self, completion: Result<Completion, GenerationError>) -> bool {
        match completion {
            Ok(c) => {
                self.notice = c.notice;
                self.apply(c.mutations)
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    fn started_json(&mut self, started: Result<nm_editor::ideas::Started, GenerationError>) -> String {
        match started {
            Ok(s) => {
                self.apply(s.mutations);
                serde_json::json!({ "ok": true, "text": s.source_text }).to_string()
            }
            Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    fn stamp_time(&mut self) {
        self.engine.set_time(now_ms());
    }
}

fn now_ms() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Notemap WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Validate a board snapshot. Returns JSON: `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_board(json: &str) -> String {
    match nm_core::Board::from_json(json) {
        Ok(_) => r#"{"ok":true}"#.to_string(),
        Err(e) => serde_json::json!({ "ok": false, "error": e }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BOARD: &str = r#"{
        "notes": [
            {"id": "w_a", "content": "Root", "position": {"x": 0, "y": 0},
             "size": {"width": 280, "height": 140}},
            {"id": "w_b", "type": "topic", "content": "Child", "position": {"x": 500, "y": 0},
             "size": {"width": 160, "height": 56}}
        ],
        "connections": [{"id": "w_c", "fromId": "w_a", "toId": "w_b"}]
    }"#;

    fn canvas() -> NoteCanvas {
        let mut canvas = NoteCanvas::new(1280.0, 800.0);
        canvas.set_board_json(BOARD).unwrap();
        canvas
    }

    #[test]
    fn board_json_round_trips() {
        let canvas = canvas();
        let again = nm_core::Board::from_json(&canvas.get_board_json()).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again.connection_count(), 1);
    }

    #[test]
    fn invalid_json_keeps_previous_board() {
        let mut canvas = canvas();
        assert!(canvas.set_board_json("{nope").is_err());
        assert_eq!(canvas.engine.board.len(), 2);
    }

    #[test]
    fn drag_moves_note_through_the_bridge() {
        let mut canvas = canvas();
        assert!(canvas.handle_pointer_down(10.0, 10.0, 0, false, false, false, false));
        assert!(canvas.handle_pointer_move(60.0, 10.0, 1));
        let reply = canvas.handle_pointer_up(60.0, 10.0, false, false, false, false);
        assert_eq!(reply, r#"{"changed":true,"contextMenu":null}"#);
        let a = canvas.engine.board.note(NoteId::intern("w_a")).unwrap();
        assert_eq!(a.position, Point::new(50.0, 0.0));
        assert_eq!(canvas.get_selected_ids(), r#"["w_a"]"#);
    }

    #[test]
    fn secondary_click_requests_context_menu() {
        let mut canvas = canvas();
        canvas.handle_pointer_down(900.0, 600.0, 2, false, false, false, false);
        let reply = canvas.handle_pointer_up(900.0, 600.0, false, false, false, false);
        assert_eq!(reply, r#"{"changed":true,"contextMenu":{"x":900,"y":600}}"#);
    }

    #[test]
    fn ideas_round_trip_through_json() {
        let mut canvas = canvas();
        let started: serde_json::Value = serde_json::from_str(&canvas.begin_ideas("w_b")).unwrap();
        assert_eq!(started["ok"], true);
        assert_eq!(started["text"], "Child");
        assert!(canvas.is_generating());
        assert_eq!(canvas.engine.board.len(), 5);

        assert!(canvas.resolve_ideas(r#"["one", "two"]"#));
        assert!(!canvas.is_generating());
        assert_eq!(canvas.engine.board.len(), 4);
        assert_eq!(canvas.take_notice(), "");
    }

    #[test]
    fn failed_ideas_leave_a_notice() {
        let mut canvas = canvas();
        canvas.begin_ideas("w_a");
        canvas.fail_ideas("offline");
        assert_eq!(canvas.engine.board.len(), 2);
        assert!(canvas.take_notice().contains("offline"));
    }

    #[test]
    fn busy_generation_reports_error() {
        let mut canvas = canvas();
        canvas.begin_summary("w_a");
        let reply: serde_json::Value = serde_json::from_str(&canvas.begin_ideas("w_a")).unwrap();
        assert_eq!(reply["ok"], false);
    }

    #[test]
    fn style_and_layout_switches() {
        let mut canvas = canvas();
        assert!(!canvas.set_connection_style("zigzag"));
        assert!(canvas.set_connection_style("straight"));
        assert_eq!(canvas.get_connection_style(), "straight");
        assert!(canvas.auto_layout("horizontal"));
        assert_eq!(canvas.get_connection_style(), "curve");
    }

    #[test]
    fn routes_and_mermaid_export() {
        let canvas = canvas();
        let routes: serde_json::Value = serde_json::from_str(&canvas.get_connection_routes()).unwrap();
        assert_eq!(routes[0]["id"], "w_c");
        assert!(routes[0]["path"].as_str().unwrap().starts_with('M'));
        let mermaid = canvas.export_mermaid("vertical");
        assert!(mermaid.starts_with("flowchart TD"), "{mermaid}");
    }

    #[test]
    fn revision_counts_board_changes() {
        let mut canvas = canvas();
        assert_eq!(canvas.revision(), 0.0);
        canvas.set_note_content("w_a", "Renamed");
        assert_eq!(canvas.revision(), 1.0);
    }

    #[test]
    fn double_click_after_reload_adds_a_note() {
        let mut canvas = NoteCanvas::new(1280.0, 800.0);
        let notes: Vec<String> = (0..4)
            .map(|i| {
                format!(
                    r#"{{"id": "note_{i}", "content": "kept {i}", "position": {{"x": {}, "y": 0}},
                        "size": {{"width": 280, "height": 140}}}}"#,
                    i * 300
                )
            })
            .collect();
        canvas
            .set_board_json(&format!(r#"{{"notes": [{}]}}"#, notes.join(",")))
            .unwrap();

        assert!(canvas.handle_double_click(600.0, 600.0));
        assert!(canvas.handle_double_click(900.0, 600.0));
        assert_eq!(canvas.engine.board.len(), 6);
        for i in 0..4 {
            let note = canvas.engine.board.note(NoteId::intern(&format!("note_{i}"))).unwrap();
            assert_eq!(note.content, format!("kept {i}"));
        }
    }

    #[test]
    fn note_color_by_name() {
        let mut canvas = canvas();
        assert!(canvas.set_note_color("w_a", "Blue"));
        assert!(!canvas.set_note_color("w_a", "teal"));
        let a = canvas.engine.board.note(NoteId::intern("w_a")).unwrap();
        assert_eq!(a.color, NoteColor::Blue);
    }
}
