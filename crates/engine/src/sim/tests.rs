use super::*;
use crate::geometry::Rect;
use crate::world::{Entity, HazardDirection, Room};

const DT: f32 = 1.0 / 60.0;

fn floored_room(name: &str, x: i32, order: i32) -> Room {
    let mut room = Room::new(
        name,
        Rect::new(x, 0, 320, 184),
        Point::new(x + 40, 148),
        order,
    )
    .expect("room");
    room.fill_rect(0, 20, 40, 3, 1).expect("floor");
    room
}

fn two_rooms() -> World {
    World::new(vec![floored_room("west", 0, 0), floored_room("east", 320, 1)]).expect("world")
}

fn single_room(setup: impl FnOnce(&mut Room)) -> World {
    let mut room = floored_room("solo", 0, 0);
    setup(&mut room);
    World::new(vec![room]).expect("world")
}

fn simulation(world: World) -> Simulation {
    Simulation::new(world, PhysicsConfig::default(), Viewport::default()).expect("simulation")
}

fn holding(actions: &[InputAction]) -> InputSnapshot {
    actions
        .iter()
        .fold(InputSnapshot::empty(), |snapshot, action| {
            snapshot.with_action_down(*action, true)
        })
}

fn step_until(
    sim: &mut Simulation,
    input: &InputSnapshot,
    max_ticks: usize,
    done: impl Fn(&TickEvents) -> bool,
) -> TickEvents {
    for _ in 0..max_ticks {
        let events = sim.step(input, DT);
        if done(&events) {
            return events;
        }
    }
    panic!("condition not reached within {max_ticks} ticks");
}

#[test]
fn starts_on_spawn_of_lowest_order_room() {
    let world = World::new(vec![floored_room("east", 320, 1), floored_room("west", 0, 0)])
        .expect("world");
    let mut sim = simulation(world);

    assert_eq!(sim.current_room(), RoomId(1));
    assert_eq!(sim.player().position(), Point::new(40, 148));
    assert_eq!(sim.camera().origin, Point::new(0, 4));

    sim.step(&InputSnapshot::empty(), DT);
    assert!(sim.player().grounded);
    assert_eq!(sim.tick_count(), 1);
}

#[test]
fn empty_world_cannot_start() {
    let result = Simulation::new(World::default(), PhysicsConfig::default(), Viewport::default());
    assert!(matches!(result, Err(SimulationError::EmptyWorld)));
}

#[test]
fn forward_transition_ignores_input_and_lands_on_spawn() {
    let mut sim = simulation(two_rooms());
    sim.place_player(Point::new(296, 148));
    let started = step_until(&mut sim, &holding(&[InputAction::Right]), 120, |events| {
        events.transition_started.is_some()
    });
    assert_eq!(started.transition_started, Some(RoomId(1)));
    assert!(sim.render_snapshot().transitioning);

    let mut steered = sim.clone();
    let mut idle = sim;
    let fight = InputSnapshot::empty()
        .with_jump_pressed(true)
        .with_action_down(InputAction::Left, true);
    let mut ticks = 0;
    loop {
        ticks += 1;
        let steered_events = steered.step(&fight, DT);
        let idle_events = idle.step(&InputSnapshot::empty(), DT);
        assert_eq!(steered.player().position(), idle.player().position());
        assert_eq!(steered.camera().origin, idle.camera().origin);
        if steered_events.transition_completed.is_some() {
            assert!(idle_events.transition_completed.is_some());
            break;
        }
        assert!(ticks < 30, "transition did not finish");
    }

    assert!((12..=13).contains(&ticks), "took {ticks} ticks");
    assert_eq!(steered.current_room(), RoomId(1));
    assert_eq!(steered.player().position(), Point::new(360, 148));
    assert_eq!(steered.player().velocity(), Vec2::ZERO);
    assert_eq!(steered.respawn_point(), Point::new(360, 148));
}

#[test]
fn backward_transition_keeps_running_momentum() {
    let mut sim = simulation(two_rooms());
    sim.place_player(Point::new(330, 148));
    assert_eq!(sim.current_room(), RoomId(1));

    let left = holding(&[InputAction::Left]);
    step_until(&mut sim, &left, 120, |events| events.transition_started.is_some());
    step_until(&mut sim, &left, 30, |events| events.transition_completed.is_some());

    assert_eq!(sim.current_room(), RoomId(0));
    assert_eq!(sim.player().position(), Point::new(310, 148));
    assert!(sim.player().velocity().x < 0.0);
    assert_eq!(sim.player().velocity().y, 0.0);

    let events = sim.step(&left, DT);
    assert!(events.transition_started.is_none());
    assert!(sim.player().position().x <= 310);
}

#[test]
fn hazard_death_respawns_at_spawn_next_tick() {
    let mut sim = simulation(single_room(|room| {
        room.add_entity(Entity::spike(96, 152, HazardDirection::Up))
            .expect("spike")
    }));
    sim.place_player(Point::new(96, 120));

    step_until(&mut sim, &InputSnapshot::empty(), 60, |events| events.died);
    assert_eq!(sim.player().motion_state(), MotionState::Dead);
    assert_eq!(sim.deaths(), 1);

    let events = sim.step(&holding(&[InputAction::Right]), DT);
    assert!(events.respawned);
    assert_eq!(sim.player().position(), Point::new(40, 148));
    assert_eq!(sim.player().velocity(), Vec2::ZERO);
    assert_eq!(sim.player().stamina, sim.config().stamina_max);
    assert_ne!(sim.player().motion_state(), MotionState::Dead);
}

#[test]
fn checkpoint_moves_respawn_point() {
    let mut sim = simulation(single_room(|room| {
        room.add_entity(Entity::checkpoint(120, 148))
            .expect("checkpoint");
        room.add_entity(Entity::spike(200, 152, HazardDirection::Up))
            .expect("spike");
    }));
    let right = holding(&[InputAction::Right]);

    let reached = step_until(&mut sim, &right, 120, |events| events.checkpoint.is_some());
    assert_eq!(reached.checkpoint, Some(Point::new(120, 148)));
    assert_eq!(sim.respawn_point(), Point::new(120, 148));

    step_until(&mut sim, &right, 120, |events| events.died);
    sim.step(&InputSnapshot::empty(), DT);
    assert_eq!(sim.player().position(), Point::new(120, 148));
}

#[test]
fn teleport_into_floor_is_pushed_out_upward() {
    let mut sim = simulation(single_room(|_| {}));

    let outcome = sim.place_player(Point::new(100, 150));

    assert_eq!(outcome, Depenetration::Resolved { dx: 0, dy: -2 });
    assert_eq!(sim.player().position(), Point::new(100, 148));
    assert_eq!(sim.render_snapshot().previous_player, Point::new(100, 148));
}

#[test]
fn editor_tile_over_player_is_resolved_next_tick() {
    let mut sim = simulation(single_room(|_| {}));
    sim.step(&InputSnapshot::empty(), DT);

    sim.world_mut()
        .set_tile(RoomId(0), 5, 18, 1)
        .expect("edit");
    assert!(sim.world().check_solid(sim.player().hitbox()));

    sim.step(&InputSnapshot::empty(), DT);

    assert!(!sim.world().check_solid(sim.player().hitbox()));
    assert_eq!(sim.player().position(), Point::new(32, 148));
}

#[test]
fn grapple_attaches_while_held_and_releases_on_let_go() {
    let mut sim = simulation(single_room(|room| {
        room.fill_rect(0, 0, 40, 3, 1).expect("ceiling")
    }));
    sim.place_player(Point::new(100, 60));

    let fire = InputSnapshot::empty().with_grapple_pressed(true);
    let events = sim.step(&fire, DT);
    assert!(events.grapple_attached);
    let Some(anchor) = sim.render_snapshot().grapple_anchor else {
        panic!("expected an anchor");
    };
    assert_eq!(anchor, Vec2::new(104.0, 24.0));

    let hold = holding(&[InputAction::Grapple]);
    for _ in 0..60 {
        sim.step(&hold, DT);
    }
    assert!(sim.grapple().is_attached());
    let GrappleState::Attached { length, .. } = sim.grapple().state() else {
        panic!("expected attachment");
    };
    let center = sim.player().body.center();
    let distance = Vec2::new(center.x - anchor.x, center.y - anchor.y).length();
    assert!(distance <= length + 3.0, "rope stretched to {distance}");

    sim.step(&InputSnapshot::empty(), DT);
    assert!(!sim.grapple().is_attached());
}

#[test]
fn camera_follows_player_center_within_room() {
    let world = World::new(vec![{
        let mut room = Room::new("wide", Rect::new(0, 0, 960, 184), Point::new(480, 148), 0)
            .expect("room");
        room.fill_rect(0, 20, 120, 3, 1).expect("floor");
        room
    }])
    .expect("world");
    let mut sim = simulation(world);
    sim.step(&InputSnapshot::empty(), DT);

    let center = sim.player().hitbox().center();
    assert_eq!(sim.camera().origin, Point::new(center.x - 160, 4));

    let snapshot = sim.render_snapshot();
    assert_eq!(snapshot.camera, sim.camera().origin);
    assert_eq!(snapshot.player_size, (8, 12));
}
