mod config;
mod step;

use crate::geometry::{Point, Rect, Vec2};
use crate::physics::Body;

pub use config::{ConfigError, PhysicsConfig};
pub use step::{step_player, IntegrateOutcome, JumpKind, VelocityOutcome};

/// Which side a wall is touching the player on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WallSide {
    Left,
    #[default]
    None,
    Right,
}

impl WallSide {
    pub fn sign(self) -> i8 {
        match self {
            Self::Left => -1,
            Self::None => 0,
            Self::Right => 1,
        }
    }
}

/// Mutually exclusive motion states, in priority order. Derived from the
/// flags each tick rather than stored, so two can never be active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Dead,
    Duck,
    Ground,
    WallClimb,
    WallSlide,
    Air,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub body: Body,
    pub grounded: bool,
    pub on_wall: WallSide,
    pub ducking: bool,
    pub climbing: bool,
    pub wall_sliding: bool,
    pub dead: bool,
    pub facing: i8,

    pub coyote_timer: f32,
    pub jump_buffer_timer: f32,
    pub wall_jump_lock_timer: f32,
    /// Set once the early-release cut has been applied to the current jump.
    pub variable_jump_applied: bool,
    /// Jump input level seen on the previous tick, for release-edge detection.
    pub jump_was_held: bool,

    pub stamina: f32,
}

impl PlayerState {
    /// A standing player at rest with its hitbox top-left at `position`.
    pub fn spawn_at(position: Point, config: &PhysicsConfig) -> Self {
        Self {
            body: Body::new(
                position.x,
                position.y,
                config.hitbox_width,
                config.stand_height,
            ),
            grounded: false,
            on_wall: WallSide::None,
            ducking: false,
            climbing: false,
            wall_sliding: false,
            dead: false,
            facing: 1,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            wall_jump_lock_timer: 0.0,
            variable_jump_applied: false,
            jump_was_held: false,
            stamina: config.stamina_max,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.body.x, self.body.y)
    }

    pub fn hitbox(&self) -> Rect {
        self.body.hitbox()
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    pub fn motion_state(&self) -> MotionState {
        if self.dead {
            MotionState::Dead
        } else if self.grounded {
            if self.ducking {
                MotionState::Duck
            } else {
                MotionState::Ground
            }
        } else if self.climbing {
            MotionState::WallClimb
        } else if self.wall_sliding {
            MotionState::WallSlide
        } else {
            MotionState::Air
        }
    }
}
