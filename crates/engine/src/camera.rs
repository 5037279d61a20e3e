use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
        }
    }
}

/// Integer view origin. Follow is instant; only room transitions ease it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Camera {
    pub origin: Point,
    pub viewport: Viewport,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            origin: Point::default(),
            viewport,
        }
    }

    pub fn follow(&mut self, focus: Point, room: Rect) {
        self.origin = framed_origin(focus, room, self.viewport);
    }

    pub fn view_rect(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.viewport.width,
            self.viewport.height,
        )
    }
}

/// View origin centering `focus`, clamped so the view stays inside `room`.
/// An axis on which the room is no larger than the viewport pins to the
/// room origin.
pub fn framed_origin(focus: Point, room: Rect, viewport: Viewport) -> Point {
    Point::new(
        clamp_axis(focus.x - viewport.width / 2, room.x, room.w, viewport.width),
        clamp_axis(focus.y - viewport.height / 2, room.y, room.h, viewport.height),
    )
}

fn clamp_axis(desired: i32, room_start: i32, room_extent: i32, view_extent: i32) -> i32 {
    if room_extent <= view_extent {
        return room_start;
    }
    desired.clamp(room_start, room_start + room_extent - view_extent)
}
