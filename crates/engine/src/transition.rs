use tracing::{debug, info};

use crate::camera::{framed_origin, Viewport};
use crate::geometry::{lerp, smoothstep, Point, Rect, Vec2};
use crate::player::{PhysicsConfig, PlayerState};
use crate::world::{RoomId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEdge {
    Left,
    Right,
    Top,
    Bottom,
}

impl RoomEdge {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDirection {
    /// Into a room of higher order: lands on its spawn at rest.
    Forward,
    /// Into a room of lower or equal order: lands just inside the entry
    /// edge and keeps moving along the crossing axis.
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: RoomId,
    pub to: RoomId,
    pub direction: TransitionDirection,
    pub exit_edge: RoomEdge,
    pub elapsed: f32,
    pub duration: f32,
    pub start_camera: Point,
    pub end_camera: Point,
    pub start_player: Point,
    pub target_player: Point,
    pub velocity_to_restore: Vec2,
    /// Seconds after completion during which no new transition may start.
    pub lock_after: f32,
}

impl Transition {
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TransitionState {
    #[default]
    Idle,
    Active(Transition),
}

/// Result of the once-per-tick boundary check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryOutcome {
    Inside,
    /// The hitbox left the room with a neighbor beyond, but the
    /// post-transition lock is still running.
    Suppressed,
    Started(Transition),
    /// No room beyond the edge; the player was pushed back inside.
    Clamped(RoomEdge),
}

/// One eased step of an active transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionFrame {
    pub camera: Point,
    /// Set on the step that completes the transition.
    pub completed: Option<Transition>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoomTransitionController {
    state: TransitionState,
    lock_timer: f32,
}

impl RoomTransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TransitionState::Active(_))
    }

    pub fn is_locked(&self) -> bool {
        self.lock_timer > 0.0
    }

    pub fn tick_lock(&mut self, dt: f32) {
        self.lock_timer = (self.lock_timer - dt).max(0.0);
    }

    /// Starts a transition once the whole hitbox is past an edge of
    /// `current` and another room lies beyond it, or clamps the player back
    /// in when nothing does.
    pub fn check_boundary(
        &mut self,
        player: &mut PlayerState,
        current: RoomId,
        world: &World,
        camera_origin: Point,
        viewport: Viewport,
        config: &PhysicsConfig,
    ) -> BoundaryOutcome {
        if self.is_active() {
            return BoundaryOutcome::Inside;
        }
        let Some(room) = world.room(current) else {
            return BoundaryOutcome::Inside;
        };
        let bounds = room.bounds();
        let hitbox = player.hitbox();
        let Some(edge) = exited_edge(hitbox, bounds) else {
            return BoundaryOutcome::Inside;
        };

        let Some(to) = world.neighbor_room_for(hitbox, current) else {
            clamp_inside(player, bounds, edge);
            debug!(
                room = %room.name(),
                edge = edge.as_str(),
                x = player.body.x,
                y = player.body.y,
                "world_boundary_clamp"
            );
            return BoundaryOutcome::Clamped(edge);
        };
        if self.is_locked() {
            return BoundaryOutcome::Suppressed;
        }
        let Some(destination) = world.room(to) else {
            return BoundaryOutcome::Inside;
        };

        let direction = if destination.order() > room.order() {
            TransitionDirection::Forward
        } else {
            TransitionDirection::Backward
        };
        let dest_bounds = destination.bounds();
        let (target_player, velocity_to_restore) = match direction {
            TransitionDirection::Forward => {
                let spawn = destination.spawn();
                let feet_offset = config.stand_height - player.body.h;
                (Point::new(spawn.x, spawn.y + feet_offset), Vec2::ZERO)
            }
            TransitionDirection::Backward => {
                let velocity = player.body.velocity;
                let kept = if edge.is_horizontal() {
                    Vec2::new(velocity.x, 0.0)
                } else {
                    Vec2::new(0.0, velocity.y)
                };
                (
                    edge_entry_point(hitbox, dest_bounds, edge, config.transition_edge_buffer),
                    kept,
                )
            }
        };

        let target_box = Rect::new(target_player.x, target_player.y, hitbox.w, hitbox.h);
        let transition = Transition {
            from: current,
            to,
            direction,
            exit_edge: edge,
            elapsed: 0.0,
            duration: config.transition_duration,
            start_camera: camera_origin,
            end_camera: framed_origin(target_box.center(), dest_bounds, viewport),
            start_player: player.position(),
            target_player,
            velocity_to_restore,
            lock_after: config.post_transition_lock,
        };

        player.body.velocity = Vec2::ZERO;
        player.body.clear_remainder();
        player.climbing = false;
        player.wall_sliding = false;
        self.state = TransitionState::Active(transition);
        info!(
            from = %room.name(),
            to = %destination.name(),
            edge = edge.as_str(),
            forward = direction == TransitionDirection::Forward,
            "room_transition_started"
        );
        BoundaryOutcome::Started(transition)
    }

    /// Advances an active transition by `dt`, moving the player along the
    /// eased path. Returns `None` when idle.
    pub fn advance(&mut self, dt: f32, player: &mut PlayerState) -> Option<TransitionFrame> {
        let TransitionState::Active(transition) = &mut self.state else {
            return None;
        };
        transition.elapsed += dt;
        let t = smoothstep(transition.progress());
        let eased = eased_point(transition.start_player, transition.target_player, t);
        player.body.x = eased.x;
        player.body.y = eased.y;
        player.body.velocity = Vec2::ZERO;
        player.body.clear_remainder();
        let camera = eased_point(transition.start_camera, transition.end_camera, t);

        if transition.progress() < 1.0 {
            return Some(TransitionFrame {
                camera,
                completed: None,
            });
        }

        let finished = *transition;
        player.body.x = finished.target_player.x;
        player.body.y = finished.target_player.y;
        player.body.velocity = finished.velocity_to_restore;
        self.state = TransitionState::Idle;
        self.lock_timer = finished.lock_after;
        Some(TransitionFrame {
            camera: finished.end_camera,
            completed: Some(finished),
        })
    }

    /// Drops any active transition without finishing it.
    pub fn cancel(&mut self) {
        self.state = TransitionState::Idle;
    }

    pub fn set_lock(&mut self, seconds: f32) {
        self.lock_timer = seconds.max(0.0);
    }
}

fn eased_point(from: Point, to: Point, t: f32) -> Point {
    Point::new(
        lerp(from.x as f32, to.x as f32, t).floor() as i32,
        lerp(from.y as f32, to.y as f32, t).floor() as i32,
    )
}

fn exited_edge(hitbox: Rect, bounds: Rect) -> Option<RoomEdge> {
    if hitbox.right() <= bounds.x {
        Some(RoomEdge::Left)
    } else if hitbox.x >= bounds.right() {
        Some(RoomEdge::Right)
    } else if hitbox.bottom() <= bounds.y {
        Some(RoomEdge::Top)
    } else if hitbox.y >= bounds.bottom() {
        Some(RoomEdge::Bottom)
    } else {
        None
    }
}

fn clamp_inside(player: &mut PlayerState, bounds: Rect, edge: RoomEdge) {
    let body = &mut player.body;
    match edge {
        RoomEdge::Left => body.x = bounds.x,
        RoomEdge::Right => body.x = bounds.right() - body.w,
        RoomEdge::Top => body.y = bounds.y,
        RoomEdge::Bottom => body.y = bounds.bottom() - body.h,
    }
    if edge.is_horizontal() {
        body.velocity.x = 0.0;
        body.remainder.x = 0.0;
    } else {
        body.velocity.y = 0.0;
        body.remainder.y = 0.0;
    }
}

/// Position just inside the edge of `dest` the player crossed into, keeping
/// the other coordinate clamped within the destination.
fn edge_entry_point(hitbox: Rect, dest: Rect, exit_edge: RoomEdge, buffer: i32) -> Point {
    let clamp_x = |x: i32| x.clamp(dest.x, (dest.right() - hitbox.w).max(dest.x));
    let clamp_y = |y: i32| y.clamp(dest.y, (dest.bottom() - hitbox.h).max(dest.y));
    match exit_edge {
        RoomEdge::Right => Point::new(dest.x + buffer, clamp_y(hitbox.y)),
        RoomEdge::Left => Point::new(dest.right() - hitbox.w - buffer, clamp_y(hitbox.y)),
        RoomEdge::Bottom => Point::new(clamp_x(hitbox.x), dest.y + buffer),
        RoomEdge::Top => Point::new(clamp_x(hitbox.x), dest.bottom() - hitbox.h - buffer),
    }
}
