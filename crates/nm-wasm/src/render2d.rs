//! Canvas2D renderer.
//!
//! Draws the board to an HTML `<canvas>` via `CanvasRenderingContext2d`.
//! World-space content goes through the camera transform; the grid and the
//! delete zone are drawn in screen space.

use kurbo::{BezPath, ParamCurve, PathEl};
use nm_core::geometry::{Point, Rect};
use nm_core::{Board, Camera, ConnectionStyle, Note, NoteKind};
use nm_render::paint::Overlay;
use nm_render::route::{route_between, route_board, route_to_point};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub text: &'static str,
    pub edge: &'static str,
    pub label_bg: &'static str,
    pub accent: &'static str,
    pub danger: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.05)",
            text: "#1F2937",
            edge: "#6B7080",
            label_bg: "#FFFFFF",
            accent: "#2563EB",
            danger: "#DC2626",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            grid: "rgba(255, 255, 255, 0.04)",
            text: "#1F2937",
            edge: "#98989D",
            label_bg: "#2C2C2E",
            accent: "#60A5FA",
            danger: "#F87171",
        }
    }
}

const CARD_RADIUS: f64 = 10.0;
const CARD_PADDING: f64 = 12.0;

/// Render one frame.
#[allow(clippy::too_many_arguments)]
pub fn render_board(
    ctx: &CanvasRenderingContext2d,
    board: &Board,
    camera: &Camera,
    style: ConnectionStyle,
    overlay: &Overlay<'_>,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    draw_grid(ctx, camera, canvas_width, canvas_height, theme);

    let z = camera.z as f64;
    let _ = ctx.set_transform(z, 0.0, 0.0, z, camera.x as f64, camera.y as f64);

    draw_connections(ctx, board, style, overlay, theme);
    if let Some(edge) = overlay.temp_edge
        && let Some(source) = board.note(edge.source)
    {
        let from = overlay.note_rect(source.id, source.rect());
        let route = match edge.target.and_then(|t| board.note(t)) {
            Some(target) => route_between(&from, &target.rect(), style),
            None => route_to_point(&from, edge.cursor, style),
        };
        ctx.save();
        ctx.set_stroke_style_str(theme.accent);
        ctx.set_line_width(2.0 / z);
        set_dash(ctx, &[8.0 / z, 6.0 / z]);
        trace_path(ctx, &route.path);
        ctx.stroke();
        ctx.restore();
    }

    for note in board.notes() {
        let rect = overlay.note_rect(note.id, note.rect());
        draw_card(ctx, note, rect, overlay.is_highlighted(note.id), theme);
    }

    if let Some(m) = overlay.marquee {
        draw_marquee_rect(ctx, m, z, theme);
    }

    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    if let Some(zone) = overlay.delete_zone {
        ctx.save();
        ctx.set_global_alpha(if zone.hot { 0.35 } else { 0.12 });
        ctx.set_fill_style_str(theme.danger);
        ctx.begin_path();
        let _ = ctx.arc(
            zone.center.x as f64,
            zone.center.y as f64,
            zone.radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        ctx.fill();
        ctx.restore();
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

fn draw_connections(
    ctx: &CanvasRenderingContext2d,
    board: &Board,
    style: ConnectionStyle,
    overlay: &Overlay<'_>,
    theme: &CanvasTheme,
) {
    for (id, route) in route_board(board, style, overlay.offset) {
        let selected = overlay.selection.connection() == Some(id);
        let (color, width) = if selected {
            (theme.accent, 2.5)
        } else {
            (theme.edge, 1.5)
        };

        ctx.save();
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(width);
        trace_path(ctx, &route.path);
        ctx.stroke();
        draw_arrowhead(ctx, &route.path, route.end, color, width);

        if let Some(label) = board.connection(id).and_then(|c| c.label.as_deref()) {
            draw_label_chip(ctx, route.label_anchor, label, theme);
        }
        ctx.restore();
    }
}

fn trace_path(ctx: &CanvasRenderingContext2d, path: &BezPath) {
    ctx.begin_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

fn draw_arrowhead(ctx: &CanvasRenderingContext2d, path: &BezPath, tip: Point, color: &str, line_width: f64) {
    let Some(from) = path.segments().last().map(|seg| seg.eval(0.9)) else {
        return;
    };
    let (tx, ty) = (tip.x as f64, tip.y as f64);
    let angle = (ty - from.y).atan2(tx - from.x);
    let size = 8.0 + line_width * 1.5;

    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(tx, ty);
    ctx.line_to(tx - size * (angle - 0.4).cos(), ty - size * (angle - 0.4).sin());
    ctx.line_to(tx - size * (angle + 0.4).cos(), ty - size * (angle + 0.4).sin());
    ctx.close_path();
    ctx.fill();
}

fn draw_label_chip(ctx: &CanvasRenderingContext2d, at: Point, label: &str, theme: &CanvasTheme) {
    ctx.set_font("11px Inter, system-ui, sans-serif");
    let width = ctx.measure_text(label).map(|m| m.width()).unwrap_or(label.len() as f64 * 6.0);
    let (w, h) = (width + 12.0, 18.0);
    let (x, y) = (at.x as f64 - w / 2.0, at.y as f64 - h / 2.0);

    ctx.set_fill_style_str(theme.label_bg);
    rounded_rect_path(ctx, x, y, w, h, h / 2.0);
    ctx.fill();
    ctx.set_fill_style_str(theme.edge);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(label, at.x as f64, at.y as f64);
}

// ─── Cards ───────────────────────────────────────────────────────────────

fn draw_card(ctx: &CanvasRenderingContext2d, note: &Note, rect: Rect, highlighted: bool, theme: &CanvasTheme) {
    let (x, y, w, h) = (rect.x as f64, rect.y as f64, rect.width as f64, rect.height as f64);
    let radius = match note.kind {
        NoteKind::Tag => h / 2.0,
        _ => CARD_RADIUS,
    };

    ctx.save();
    if note.pending {
        ctx.set_global_alpha(0.6);
    }
    ctx.set_shadow_color("rgba(0, 0, 0, 0.08)");
    ctx.set_shadow_blur(6.0);
    ctx.set_shadow_offset_y(2.0);
    rounded_rect_path(ctx, x, y, w, h, radius);
    ctx.set_fill_style_str(note.color.fill_hex());
    ctx.fill();
    ctx.set_shadow_color("transparent");

    ctx.set_stroke_style_str(note.color.border_hex());
    ctx.set_line_width(1.0);
    if note.pending {
        set_dash(ctx, &[6.0, 4.0]);
    }
    ctx.stroke();
    set_dash(ctx, &[]);

    if highlighted {
        ctx.set_stroke_style_str(theme.accent);
        ctx.set_line_width(2.0);
        rounded_rect_path(ctx, x - 1.0, y - 1.0, w + 2.0, h + 2.0, radius + 1.0);
        ctx.stroke();
    }

    draw_card_text(ctx, note, x, y, w, h, theme);
    ctx.restore();
}

fn draw_card_text(ctx: &CanvasRenderingContext2d, note: &Note, x: f64, y: f64, w: f64, h: f64, theme: &CanvasTheme) {
    let (font, line_height) = match note.kind {
        NoteKind::Topic => ("600 16px Inter, sans-serif", 20.0),
        NoteKind::Tag => ("500 12px Inter, sans-serif", 16.0),
        NoteKind::Text => ("400 14px Inter, sans-serif", 18.0),
    };
    ctx.set_font(font);
    ctx.set_fill_style_str(theme.text);

    let text = if note.pending && note.content.is_empty() {
        "…"
    } else {
        note.content.as_str()
    };
    let max_width = (w - CARD_PADDING * 2.0).max(0.0);

    if note.kind == NoteKind::Text {
        ctx.set_text_align("left");
        ctx.set_text_baseline("top");
        let max_lines = ((h - CARD_PADDING * 2.0) / line_height).floor().max(1.0) as usize;
        for (i, line) in text.lines().take(max_lines).enumerate() {
            let ly = y + CARD_PADDING + i as f64 * line_height;
            let _ = ctx.fill_text_with_max_width(line, x + CARD_PADDING, ly, max_width);
        }
    } else {
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let line = text.lines().next().unwrap_or_default();
        let _ = ctx.fill_text_with_max_width(line, x + w / 2.0, y + h / 2.0, max_width);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Screen-space dot grid that follows the camera.
fn draw_grid(ctx: &CanvasRenderingContext2d, camera: &Camera, width: f64, height: f64, theme: &CanvasTheme) {
    let spacing = 20.0 * camera.z as f64;
    if spacing < 6.0 {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let mut x = (camera.x as f64).rem_euclid(spacing);
    while x < width {
        let mut y = (camera.y as f64).rem_euclid(spacing);
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}

/// Draw the marquee (rubber-band) selection rectangle.
fn draw_marquee_rect(ctx: &CanvasRenderingContext2d, m: Rect, z: f64, theme: &CanvasTheme) {
    let (x, y, w, h) = (m.x as f64, m.y as f64, m.width as f64, m.height as f64);
    if w * z < 1.0 && h * z < 1.0 {
        return;
    }

    ctx.save();
    ctx.set_global_alpha(0.08);
    ctx.set_fill_style_str(theme.accent);
    ctx.fill_rect(x, y, w, h);
    ctx.set_global_alpha(1.0);

    ctx.set_stroke_style_str(theme.accent);
    ctx.set_line_width(1.0 / z);
    set_dash(ctx, &[4.0 / z, 4.0 / z]);
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let array = js_sys::Array::new();
    for s in segments {
        array.push(&JsValue::from_f64(*s));
    }
    let _ = ctx.set_line_dash(&array);
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
