use crate::geometry::{Rect, Vec2};

use super::collision::SolidGeometry;

/// Integer-positioned axis-aligned body with a sub-pixel remainder.
///
/// `x + remainder.x` is the true continuous position; `x` itself only ever
/// holds whole pixels that were verified free of solid geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Body {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub remainder: Vec2,
    pub velocity: Vec2,
}

impl Body {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            ..Self::default()
        }
    }

    pub fn hitbox(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn exact_position(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.remainder.x,
            self.y as f32 + self.remainder.y,
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.w as f32 * 0.5,
            self.y as f32 + self.h as f32 * 0.5,
        )
    }

    pub fn clear_remainder(&mut self) {
        self.remainder = Vec2::ZERO;
    }
}

/// Outcome of one axis move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisMove {
    /// Whole pixels actually travelled along the axis.
    pub moved: i32,
    /// Sign of the attempted step, 0 when no whole pixel was due.
    pub direction: i32,
    pub blocked: bool,
    /// Perpendicular nudge applied by corner correction.
    pub corrected: i32,
}

impl AxisMove {
    pub fn landed(&self) -> bool {
        self.blocked && self.direction > 0
    }
}

/// Splits off the whole-pixel part of `remainder`: floor when non-negative,
/// ceiling when negative, so the kept fraction always has the same sign as
/// the accumulated motion and nothing is rounded away.
pub fn take_whole_pixels(remainder: &mut f32) -> i32 {
    let whole = if *remainder >= 0.0 {
        remainder.floor()
    } else {
        remainder.ceil()
    };
    *remainder -= whole;
    whole as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Moves along x, one pixel per collision query. On the first blocked step
/// the x velocity and remainder are zeroed; the body never enters geometry.
pub fn move_x<G: SolidGeometry + ?Sized>(
    body: &mut Body,
    amount: f32,
    geometry: &G,
    corner_correction: i32,
) -> AxisMove {
    body.remainder.x += amount;
    let pixels = take_whole_pixels(&mut body.remainder.x);
    step_axis(body, Axis::X, pixels, geometry, corner_correction)
}

/// Moves along y. A blocked downward step is a landing and is never
/// corner-corrected.
pub fn move_y<G: SolidGeometry + ?Sized>(
    body: &mut Body,
    amount: f32,
    geometry: &G,
    corner_correction: i32,
) -> AxisMove {
    body.remainder.y += amount;
    let pixels = take_whole_pixels(&mut body.remainder.y);
    let correction = if pixels > 0 { 0 } else { corner_correction };
    step_axis(body, Axis::Y, pixels, geometry, correction)
}

fn step_axis<G: SolidGeometry + ?Sized>(
    body: &mut Body,
    axis: Axis,
    pixels: i32,
    geometry: &G,
    corner_correction: i32,
) -> AxisMove {
    let sign = pixels.signum();
    let mut remaining = pixels;
    let mut result = AxisMove {
        direction: sign,
        ..AxisMove::default()
    };

    while remaining != 0 {
        let (dx, dy) = match axis {
            Axis::X => (sign, 0),
            Axis::Y => (0, sign),
        };
        if !geometry.check_solid(body.hitbox().offset(dx, dy)) {
            body.x += dx;
            body.y += dy;
            remaining -= sign;
            result.moved += sign;
            continue;
        }

        if let Some(shift) = find_corner_nudge(body, axis, sign, geometry, corner_correction) {
            match axis {
                Axis::X => body.y += shift,
                Axis::Y => body.x += shift,
            }
            result.corrected += shift;
            continue;
        }

        match axis {
            Axis::X => {
                body.velocity.x = 0.0;
                body.remainder.x = 0.0;
            }
            Axis::Y => {
                body.velocity.y = 0.0;
                body.remainder.y = 0.0;
            }
        }
        result.blocked = true;
        break;
    }

    result
}

/// Looks for a perpendicular offset of at most `reach` pixels from which the
/// blocked step is free. Horizontal moves prefer lifting over dropping;
/// vertical moves prefer the direction the body is already drifting.
fn find_corner_nudge<G: SolidGeometry + ?Sized>(
    body: &Body,
    axis: Axis,
    sign: i32,
    geometry: &G,
    reach: i32,
) -> Option<i32> {
    let preferred = match axis {
        Axis::X => -1,
        Axis::Y => {
            if body.velocity.x > 0.0 {
                1
            } else {
                -1
            }
        }
    };
    let hitbox = body.hitbox();
    for distance in 1..=reach {
        for shift in [preferred * distance, -preferred * distance] {
            let (shifted, stepped) = match axis {
                Axis::X => (hitbox.offset(0, shift), hitbox.offset(sign, shift)),
                Axis::Y => (hitbox.offset(shift, 0), hitbox.offset(shift, sign)),
            };
            if !geometry.check_solid(shifted) && !geometry.check_solid(stepped) {
                return Some(shift);
            }
        }
    }
    None
}
