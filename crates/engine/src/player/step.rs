use tracing::debug;

use super::{PhysicsConfig, PlayerState, WallSide};
use crate::geometry::{approach, Rect, Vec2};
use crate::input::{InputAction, InputSnapshot};
use crate::physics::{move_x, move_y, touches_hazard, SolidGeometry};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    Duck,
    Wall,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityOutcome {
    pub jumped: Option<JumpKind>,
    pub variable_jump_cut: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrateOutcome {
    pub landed: bool,
    pub died: bool,
}

/// One full tick of player physics on a copy of `state`.
pub fn step_player(
    state: &PlayerState,
    input: &InputSnapshot,
    world: &World,
    config: &PhysicsConfig,
    dt: f32,
) -> PlayerState {
    let mut next = *state;
    next.update_velocity(input, world, config, dt);
    next.integrate(world, config, dt);
    next
}

impl PlayerState {
    /// Everything up to and including gravity. Leaves the position untouched
    /// so external forces can adjust velocity before [`Self::integrate`].
    pub fn update_velocity<G: SolidGeometry + ?Sized>(
        &mut self,
        input: &InputSnapshot,
        world: &G,
        config: &PhysicsConfig,
        dt: f32,
    ) -> VelocityOutcome {
        let mut outcome = VelocityOutcome::default();
        if self.dead {
            return outcome;
        }

        let hitbox = self.body.hitbox();
        self.grounded = world.check_solid(Rect::new(hitbox.x, hitbox.bottom(), hitbox.w, 1));

        self.tick_timers(config, dt);
        if input.jump_pressed() {
            self.jump_buffer_timer = config.jump_buffer_time;
        }

        self.on_wall = probe_wall(world, hitbox);

        let (axis_x, axis_y) = input.axis();
        self.update_duck(axis_y > 0, world, config);

        let locked = self.wall_jump_lock_timer > 0.0;
        let steer = if locked || (self.ducking && self.grounded) {
            0
        } else {
            axis_x
        };
        let slipping = self.update_wall_grab(input, steer, axis_y, config, dt);

        if !locked && !self.climbing {
            self.update_horizontal(steer, config, dt);
        }

        outcome.jumped = self.try_jump(config);

        let jump_held = input.jump_held();
        let released = (self.jump_was_held || outcome.jumped.is_some()) && !jump_held;
        if released && self.body.velocity.y < 0.0 && !self.variable_jump_applied {
            self.body.velocity.y *= config.variable_jump_multiplier;
            self.variable_jump_applied = true;
            outcome.variable_jump_cut = true;
        }
        self.jump_was_held = jump_held;

        self.apply_gravity(jump_held, steer, slipping, config, dt);
        outcome
    }

    /// Moves the body by its velocity, x before y, then checks hazards.
    pub fn integrate(
        &mut self,
        world: &World,
        config: &PhysicsConfig,
        dt: f32,
    ) -> IntegrateOutcome {
        let mut outcome = IntegrateOutcome::default();
        if self.dead {
            return outcome;
        }

        let velocity = self.body.velocity;
        move_x(&mut self.body, velocity.x * dt, world, config.corner_correction);
        let vertical = move_y(&mut self.body, velocity.y * dt, world, config.corner_correction);
        if vertical.landed() {
            self.grounded = true;
            outcome.landed = true;
        } else if vertical.moved != 0 {
            self.grounded = false;
        }

        if touches_hazard(world, self.body.hitbox(), config.hazard_insets) {
            debug!(x = self.body.x, y = self.body.y, "player_hazard_contact");
            self.kill();
            outcome.died = true;
        }
        outcome
    }

    pub fn kill(&mut self) {
        self.dead = true;
        self.climbing = false;
        self.wall_sliding = false;
        self.body.velocity = Vec2::ZERO;
    }

    fn tick_timers(&mut self, config: &PhysicsConfig, dt: f32) {
        self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        self.jump_buffer_timer = (self.jump_buffer_timer - dt).max(0.0);
        self.wall_jump_lock_timer = (self.wall_jump_lock_timer - dt).max(0.0);

        if self.grounded {
            self.coyote_timer = config.coyote_time;
            self.variable_jump_applied = false;
            self.stamina = config.stamina_max;
        }
    }

    fn update_duck<G: SolidGeometry + ?Sized>(
        &mut self,
        crouch_held: bool,
        world: &G,
        config: &PhysicsConfig,
    ) {
        let shrink = config.stand_height - config.duck_height;
        if !self.ducking {
            if crouch_held && self.grounded {
                self.ducking = true;
                self.body.h = config.duck_height;
                self.body.y += shrink;
            }
            return;
        }

        if crouch_held && self.grounded {
            return;
        }
        let standing = Rect::new(
            self.body.x,
            self.body.y - shrink,
            self.body.w,
            config.stand_height,
        );
        if !world.check_solid(standing) {
            self.ducking = false;
            self.body.h = config.stand_height;
            self.body.y -= shrink;
        }
    }

    /// Returns true while the grip has run out and the player slips.
    fn update_wall_grab(
        &mut self,
        input: &InputSnapshot,
        steer: i8,
        axis_y: i8,
        config: &PhysicsConfig,
        dt: f32,
    ) -> bool {
        let wall = self.on_wall.sign();
        let gripping = !self.grounded
            && !self.ducking
            && wall != 0
            && input.is_down(InputAction::Grab)
            && steer == wall;
        if !gripping {
            self.climbing = false;
            return false;
        }
        if self.stamina <= 0.0 {
            self.climbing = false;
            self.body.velocity.y = config.slip_speed;
            return true;
        }

        self.climbing = true;
        self.body.velocity.x = 0.0;
        let drain = match axis_y {
            -1 => {
                self.body.velocity.y = -config.climb_up_speed;
                config.climb_up_drain
            }
            1 => {
                self.body.velocity.y = config.climb_down_speed;
                config.climb_hold_drain
            }
            _ => {
                self.body.velocity.y = 0.0;
                config.climb_hold_drain
            }
        };
        self.stamina = (self.stamina - drain * dt).clamp(0.0, config.stamina_max);
        if self.stamina <= 0.0 {
            self.climbing = false;
            self.body.velocity.y = config.slip_speed;
            return true;
        }
        false
    }

    fn update_horizontal(&mut self, steer: i8, config: &PhysicsConfig, dt: f32) {
        let vx = self.body.velocity.x;
        self.body.velocity.x = if steer != 0 {
            self.facing = steer;
            let accel = if self.grounded {
                config.ground_accel
            } else {
                config.air_accel
            };
            approach(vx, f32::from(steer) * config.max_run_speed, accel * dt)
        } else {
            let friction = if self.grounded {
                config.ground_friction
            } else {
                config.air_friction
            };
            approach(vx, 0.0, friction * dt)
        };
    }

    fn try_jump(&mut self, config: &PhysicsConfig) -> Option<JumpKind> {
        if self.jump_buffer_timer <= 0.0 {
            return None;
        }

        let kind = if self.coyote_timer > 0.0 {
            if self.ducking {
                self.body.velocity.y = config.duck_jump_velocity;
                JumpKind::Duck
            } else {
                self.body.velocity.y = config.jump_velocity;
                JumpKind::Ground
            }
        } else if self.on_wall != WallSide::None {
            let away = -f32::from(self.on_wall.sign());
            self.body.velocity.y = config.wall_jump_vy;
            self.body.velocity.x = away * config.wall_jump_vx;
            self.wall_jump_lock_timer = config.wall_jump_lock;
            self.facing = -self.on_wall.sign();
            self.climbing = false;
            JumpKind::Wall
        } else {
            return None;
        };

        self.jump_buffer_timer = 0.0;
        self.coyote_timer = 0.0;
        self.variable_jump_applied = false;
        self.grounded = false;
        self.wall_sliding = false;
        Some(kind)
    }

    fn apply_gravity(
        &mut self,
        jump_held: bool,
        steer: i8,
        slipping: bool,
        config: &PhysicsConfig,
        dt: f32,
    ) {
        self.wall_sliding = slipping;
        if self.grounded || self.climbing || slipping {
            return;
        }

        let vy = self.body.velocity.y;
        let mut gravity = config.gravity;
        if vy.abs() < config.apex_threshold && jump_held {
            gravity *= config.apex_gravity_multiplier;
        }
        let vy = vy + gravity * dt;

        let wall = self.on_wall.sign();
        let pressing_wall = wall != 0 && steer == wall;
        let cap = if pressing_wall && vy > 0.0 {
            self.wall_sliding = true;
            config.wall_slide_speed
        } else {
            config.max_fall_speed
        };
        self.body.velocity.y = vy.min(cap);
    }
}

fn probe_wall<G: SolidGeometry + ?Sized>(world: &G, hitbox: Rect) -> WallSide {
    if world.check_solid(Rect::new(hitbox.x - 1, hitbox.y, 1, hitbox.h)) {
        WallSide::Left
    } else if world.check_solid(Rect::new(hitbox.right(), hitbox.y, 1, hitbox.h)) {
        WallSide::Right
    } else {
        WallSide::None
    }
}
