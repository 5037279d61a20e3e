use thiserror::Error;
use tracing::{debug, info, warn};

use crate::camera::{Camera, Viewport};
use crate::geometry::{Point, Vec2};
use crate::grapple::{Grapple, GrappleState};
use crate::input::{InputAction, InputSnapshot};
use crate::physics::{checkpoint_touched, depenetrate, Depenetration, SolidGeometry};
use crate::player::{JumpKind, MotionState, PhysicsConfig, PlayerState};
use crate::transition::{BoundaryOutcome, RoomEdge, RoomTransitionController, TransitionDirection};
use crate::world::{RoomId, World};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("world has no rooms to start in")]
    EmptyWorld,
}

/// What happened during one tick, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickEvents {
    pub jumped: Option<JumpKind>,
    pub landed: bool,
    pub died: bool,
    pub respawned: bool,
    pub checkpoint: Option<Point>,
    pub grapple_attached: bool,
    pub transition_started: Option<RoomId>,
    pub transition_completed: Option<RoomId>,
    pub clamped: Option<RoomEdge>,
}

/// Committed state a renderer reads. Never fed back into the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSnapshot {
    pub tick: u64,
    pub player: Point,
    pub previous_player: Point,
    pub player_size: (i32, i32),
    pub motion: MotionState,
    pub facing: i8,
    pub room: RoomId,
    pub camera: Point,
    pub grapple_anchor: Option<Vec2>,
    pub transitioning: bool,
}

/// Owns everything one tick mutates. Single writer: either the simulation
/// steps it or an editor edits the world between steps.
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    config: PhysicsConfig,
    player: PlayerState,
    camera: Camera,
    transitions: RoomTransitionController,
    grapple: Grapple,
    current_room: RoomId,
    respawn_point: Point,
    previous_position: Point,
    tick: u64,
    deaths: u32,
}

impl Simulation {
    /// Starts in the lowest-order room, on its spawn point.
    pub fn new(
        world: World,
        config: PhysicsConfig,
        viewport: Viewport,
    ) -> Result<Self, SimulationError> {
        let (index, start) = world
            .rooms()
            .iter()
            .enumerate()
            .min_by_key(|(_, room)| room.order())
            .ok_or(SimulationError::EmptyWorld)?;
        let current_room = RoomId(index);
        let spawn = start.spawn();

        let mut simulation = Self {
            player: PlayerState::spawn_at(spawn, &config),
            world,
            config,
            camera: Camera::new(viewport),
            transitions: RoomTransitionController::new(),
            grapple: Grapple::new(),
            current_room,
            respawn_point: spawn,
            previous_position: spawn,
            tick: 0,
            deaths: 0,
        };
        simulation.settle_player();
        simulation.previous_position = simulation.player.position();
        simulation.follow_camera();
        info!(
            room = %simulation.room_name(),
            x = spawn.x,
            y = spawn.y,
            "simulation_started"
        );
        Ok(simulation)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Editor access to the same room records the simulation reads. Edits
    /// take effect on the next tick.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn grapple(&self) -> &Grapple {
        &self.grapple
    }

    pub fn transitions(&self) -> &RoomTransitionController {
        &self.transitions
    }

    pub fn current_room(&self) -> RoomId {
        self.current_room
    }

    pub fn respawn_point(&self) -> Point {
        self.respawn_point
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        let anchor = match self.grapple.state() {
            GrappleState::Attached { anchor, .. } => Some(anchor),
            GrappleState::Idle => None,
        };
        RenderSnapshot {
            tick: self.tick,
            player: self.player.position(),
            previous_player: self.previous_position,
            player_size: (self.player.body.w, self.player.body.h),
            motion: self.player.motion_state(),
            facing: self.player.facing,
            room: self.current_room,
            camera: self.camera.origin,
            grapple_anchor: anchor,
            transitioning: self.transitions.is_active(),
        }
    }

    /// Authoritative teleport. Stops the player, drops the rope, cancels any
    /// transition and resolves overlap with the geometry at the new spot.
    pub fn place_player(&mut self, position: Point) -> Depenetration {
        self.transitions.cancel();
        self.grapple.release();
        let body = &mut self.player.body;
        body.x = position.x;
        body.y = position.y;
        body.velocity = Vec2::ZERO;
        body.clear_remainder();
        let outcome = self.settle_player();
        if let Some(room) = self.room_at_player() {
            self.current_room = room;
        }
        self.previous_position = self.player.position();
        self.follow_camera();
        outcome
    }

    /// Advances the world by one fixed tick.
    pub fn step(&mut self, input: &InputSnapshot, dt: f32) -> TickEvents {
        let mut events = TickEvents::default();
        self.tick += 1;
        self.previous_position = self.player.position();

        if let Some(frame) = self.transitions.advance(dt, &mut self.player) {
            self.camera.origin = frame.camera;
            if let Some(done) = frame.completed {
                self.current_room = done.to;
                self.respawn_point = done.target_player;
                self.settle_player();
                events.transition_completed = Some(done.to);
                info!(
                    room = %self.room_name(),
                    forward = done.direction == TransitionDirection::Forward,
                    "room_transition_completed"
                );
            }
            return events;
        }
        self.transitions.tick_lock(dt);
        self.ensure_current_room();

        if self.player.dead {
            self.respawn();
            events.respawned = true;
            return events;
        }

        if self.world.check_solid(self.player.hitbox()) {
            self.settle_player();
        }

        let velocity = self
            .player
            .update_velocity(input, &self.world, &self.config, dt);
        events.jumped = velocity.jumped;
        self.update_grapple(input, velocity.jumped.is_some(), &mut events);
        self.grapple
            .apply(&mut self.player, input.axis().0, &self.config, dt);

        let moved = self.player.integrate(&self.world, &self.config, dt);
        events.landed = moved.landed;
        if moved.died {
            self.deaths += 1;
            self.grapple.release();
            events.died = true;
            info!(
                x = self.player.body.x,
                y = self.player.body.y,
                deaths = self.deaths,
                "player_died"
            );
            self.follow_camera();
            return events;
        }

        if let Some(point) = checkpoint_touched(&self.world, self.player.hitbox()) {
            if point != self.respawn_point {
                self.respawn_point = point;
                events.checkpoint = Some(point);
                info!(x = point.x, y = point.y, "checkpoint_reached");
            }
        }

        let outcome = self.transitions.check_boundary(
            &mut self.player,
            self.current_room,
            &self.world,
            self.camera.origin,
            self.camera.viewport,
            &self.config,
        );
        match outcome {
            BoundaryOutcome::Started(transition) => {
                self.grapple.release();
                events.transition_started = Some(transition.to);
                return events;
            }
            BoundaryOutcome::Clamped(edge) => events.clamped = Some(edge),
            BoundaryOutcome::Inside | BoundaryOutcome::Suppressed => {}
        }

        self.follow_camera();
        events
    }

    fn update_grapple(&mut self, input: &InputSnapshot, jumped: bool, events: &mut TickEvents) {
        if jumped || !input.is_down(InputAction::Grapple) {
            self.grapple.release();
            return;
        }
        if input.grapple_pressed() && !self.grapple.is_attached() {
            events.grapple_attached =
                self.grapple
                    .try_attach(&self.player, input.axis(), &self.world, &self.config);
        }
    }

    fn respawn(&mut self) {
        self.player = PlayerState::spawn_at(self.respawn_point, &self.config);
        self.grapple.release();
        self.transitions.cancel();
        self.settle_player();
        if let Some(room) = self.room_at_player() {
            self.current_room = room;
        }
        self.previous_position = self.player.position();
        self.follow_camera();
        info!(
            x = self.player.body.x,
            y = self.player.body.y,
            room = %self.room_name(),
            "player_respawned"
        );
    }

    /// Resolves any overlap left by a placement or an edit.
    fn settle_player(&mut self) -> Depenetration {
        let outcome = depenetrate(
            &mut self.player.body,
            &self.world,
            self.config.depenetration_radius,
        );
        if let Depenetration::Resolved { dx, dy } = outcome {
            debug!(dx, dy, "player_depenetrated");
        }
        outcome
    }

    /// Keeps `current_room` valid after an editor removed rooms.
    fn ensure_current_room(&mut self) {
        if self.world.room(self.current_room).is_some() {
            return;
        }
        match self.room_at_player().or_else(|| {
            (self.world.room_count() > 0).then_some(RoomId(0))
        }) {
            Some(room) => self.current_room = room,
            None => warn!("simulation_world_has_no_rooms"),
        }
    }

    fn room_at_player(&self) -> Option<RoomId> {
        let center = self.player.hitbox().center();
        self.world.room_at_point(center.x, center.y)
    }

    fn follow_camera(&mut self) {
        if let Some(room) = self.world.room(self.current_room) {
            self.camera
                .follow(self.player.hitbox().center(), room.bounds());
        }
    }

    fn room_name(&self) -> &str {
        self.world
            .room(self.current_room)
            .map_or("<none>", |room| room.name())
    }
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
