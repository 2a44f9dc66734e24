//! Camera model: screen ↔ world transform with anchor-preserving zoom.

use crate::geometry::{Point, Rect, Size, bounding_box};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;

/// `x, y` are the screen-space translation, `z` the zoom factor.
///
/// `screen = world * z + offset`, `world = (screen - offset) / z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Camera {
    pub const IDENTITY: Camera = Camera {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z: clamp_zoom(z),
        }
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.z, (p.y - self.y) / self.z)
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.z + self.x, p.y * self.z + self.y)
    }

    /// Convert a screen-space length (pixels) into world units.
    pub fn screen_len_to_world(&self, len: f32) -> f32 {
        len / self.z
    }

    /// Translate by a raw screen-space delta. Independent of zoom.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Set the zoom to `z` (clamped) keeping the world point under `anchor`
    /// fixed on screen.
    pub fn zoom_to(&mut self, anchor: Point, z: f32) {
        let world = self.screen_to_world(anchor);
        self.z = clamp_zoom(z);
        self.x = anchor.x - world.x * self.z;
        self.y = anchor.y - world.y * self.z;
    }

    /// Multiply the zoom by `factor` about a screen-space anchor.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.zoom_to(anchor, self.z * factor);
    }

    /// Camera that frames all `rects` inside `viewport` with `padding` pixels
    /// of margin. Degenerate input yields the identity camera.
    pub fn fit(rects: &[Rect], viewport: Size, padding: f32) -> Camera {
        let Some(bounds) = bounding_box(rects) else {
            return Camera::IDENTITY;
        };
        let avail_w = viewport.width - 2.0 * padding;
        let avail_h = viewport.height - 2.0 * padding;
        if avail_w <= 0.0 || avail_h <= 0.0 {
            return Camera::IDENTITY;
        }

        let z = if bounds.is_empty() {
            1.0
        } else {
            (avail_w / bounds.width).min(avail_h / bounds.height)
        };
        let z = clamp_zoom(z);
        let c = bounds.center();
        Camera {
            x: viewport.width / 2.0 - c.x * z,
            y: viewport.height / 2.0 - c.y * z,
            z,
        }
    }
}

pub fn clamp_zoom(z: f32) -> f32 {
    if z.is_nan() {
        return 1.0;
    }
    z.clamp(MIN_ZOOM, MAX_ZOOM)
}
