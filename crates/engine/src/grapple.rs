use tracing::debug;

use crate::geometry::Vec2;
use crate::player::{PhysicsConfig, PlayerState};
use crate::world::World;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GrappleState {
    #[default]
    Idle,
    Attached { anchor: Vec2, length: f32 },
}

/// Rope attachment. Acts on the player's velocity only; the mover still
/// resolves all collisions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Grapple {
    state: GrappleState,
}

impl Grapple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GrappleState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, GrappleState::Attached { .. })
    }

    /// Fires a rope from the player's center along `aim` (straight up when
    /// neutral). Returns true when it caught on solid geometry.
    pub fn try_attach(
        &mut self,
        player: &PlayerState,
        aim: (i8, i8),
        world: &World,
        config: &PhysicsConfig,
    ) -> bool {
        let origin = player_center(player);
        let direction = aim_direction(aim);
        let Some(anchor) = raycast_solid(world, origin, direction, config.grapple_max_length)
        else {
            return false;
        };
        let distance = Vec2::new(anchor.x - origin.x, anchor.y - origin.y).length();
        let length = distance.max(config.grapple_min_length);
        self.state = GrappleState::Attached { anchor, length };
        debug!(
            anchor_x = anchor.x,
            anchor_y = anchor.y,
            length,
            "grapple_attached"
        );
        true
    }

    pub fn release(&mut self) {
        if self.is_attached() {
            debug!("grapple_released");
        }
        self.state = GrappleState::Idle;
    }

    /// Swing steering plus the rope constraint. Runs after gravity and before
    /// the player integrates its velocity.
    pub fn apply(&self, player: &mut PlayerState, steer: i8, config: &PhysicsConfig, dt: f32) {
        let GrappleState::Attached { anchor, length } = self.state else {
            return;
        };
        let velocity = &mut player.body.velocity;
        velocity.x += f32::from(steer) * config.grapple_swing_accel * dt;

        let center = player_center(player);
        let offset = Vec2::new(center.x - anchor.x, center.y - anchor.y);
        let distance = offset.length();
        if distance <= length || distance <= f32::EPSILON {
            return;
        }
        let outward = Vec2::new(offset.x / distance, offset.y / distance);
        let velocity = &mut player.body.velocity;
        let radial = velocity.dot(outward);
        let pull = (distance - length) * config.grapple_stiffness + radial.max(0.0);
        velocity.x -= outward.x * pull;
        velocity.y -= outward.y * pull;
    }
}

fn player_center(player: &PlayerState) -> Vec2 {
    let exact = player.body.exact_position();
    Vec2::new(
        exact.x + player.body.w as f32 * 0.5,
        exact.y + player.body.h as f32 * 0.5,
    )
}

fn aim_direction((x, y): (i8, i8)) -> Vec2 {
    if x == 0 && y == 0 {
        return Vec2::new(0.0, -1.0);
    }
    let raw = Vec2::new(f32::from(x), f32::from(y));
    let length = raw.length();
    Vec2::new(raw.x / length, raw.y / length)
}

/// Walks 1 px at a time from `origin` and returns the last free point before
/// the first solid pixel, or `None` if nothing solid lies within `max_length`.
pub fn raycast_solid(world: &World, origin: Vec2, direction: Vec2, max_length: f32) -> Option<Vec2> {
    let steps = max_length.max(0.0).floor() as i32;
    let mut previous = origin;
    for step in 1..=steps {
        let point = Vec2::new(
            origin.x + direction.x * step as f32,
            origin.y + direction.y * step as f32,
        );
        if world.is_solid(point.x.floor() as i32, point.y.floor() as i32) {
            return Some(previous);
        }
        previous = point;
    }
    None
}
