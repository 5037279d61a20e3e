use tracing::error;

use super::{Entity, HazardDirection, Room, World, WorldEditError, TILE_SIZE};
use crate::geometry::{Point, Rect};

const ROOM_WIDTH: i32 = 320;
const ROOM_HEIGHT: i32 = 184;
const COLS: usize = (ROOM_WIDTH / TILE_SIZE) as usize;
const ROWS: usize = (ROOM_HEIGHT / TILE_SIZE) as usize;
const FLOOR_ROW: usize = 20;
const GROUND: u16 = 1;
const STONE: u16 = 2;
const VINES: u16 = 70;
const GAP_START: usize = 30;
const GAP_END: usize = 38;

/// Built-in three-room world used whenever a world file cannot be loaded.
/// If the layout ever fails validation the error is logged and an empty
/// world is returned, which `Simulation::new` rejects as `EmptyWorld`.
pub fn default_world() -> World {
    build_default_world().unwrap_or_else(|error| {
        error!(error = %error, "default_world_invalid");
        World::default()
    })
}

fn standing_spawn(room_x: i32, room_y: i32, col: i32) -> Point {
    Point::new(room_x + col * TILE_SIZE, room_y + FLOOR_ROW as i32 * TILE_SIZE - 12)
}

fn build_default_world() -> Result<World, WorldEditError> {
    // start: flat run with a spike strip, open to the right.
    let mut start = Room::new(
        "start",
        Rect::new(0, 0, ROOM_WIDTH, ROOM_HEIGHT),
        standing_spawn(0, 0, 3),
        0,
    )?;
    start.fill_rect(0, FLOOR_ROW, COLS, ROWS - FLOOR_ROW, GROUND)?;
    start.fill_rect(0, 0, 2, FLOOR_ROW, STONE)?;
    start.fill_rect(0, 0, COLS, 2, STONE)?;
    start.fill_rect(18, FLOOR_ROW - 2, 4, 2, GROUND)?;
    for col in 12..16 {
        start.add_entity(Entity::spike(
            col * TILE_SIZE,
            (FLOOR_ROW as i32 - 1) * TILE_SIZE,
            HazardDirection::Up,
        ))?;
    }

    // climb: a pillar and a full-height right wall to climb up through the ceiling gap.
    let mut climb = Room::new(
        "climb",
        Rect::new(ROOM_WIDTH, 0, ROOM_WIDTH, ROOM_HEIGHT),
        standing_spawn(ROOM_WIDTH, 0, 3),
        1,
    )?;
    climb.fill_rect(0, FLOOR_ROW, COLS, ROWS - FLOOR_ROW, GROUND)?;
    climb.fill_rect(0, 0, GAP_START, 2, STONE)?;
    climb.fill_rect(0, 0, 2, 12, STONE)?;
    climb.fill_rect(GAP_END, 0, COLS - GAP_END, FLOOR_ROW, STONE)?;
    climb.fill_rect(24, 6, 2, FLOOR_ROW - 6, STONE)?;
    climb.fill_rect(26, 10, 1, 6, VINES)?;
    climb.fill_rect(28, 12, 4, 1, GROUND)?;
    climb.add_entity(Entity::checkpoint(
        ROOM_WIDTH + 10 * TILE_SIZE,
        (FLOOR_ROW as i32) * TILE_SIZE - 12,
    ))?;
    climb.add_entity(Entity::spike(
        ROOM_WIDTH + 23 * TILE_SIZE,
        10 * TILE_SIZE,
        HazardDirection::Left,
    ))?;

    // summit: sits above climb, entered through the floor gap beside the wall.
    let mut summit = Room::new(
        "summit",
        Rect::new(ROOM_WIDTH, -ROOM_HEIGHT, ROOM_WIDTH, ROOM_HEIGHT),
        standing_spawn(ROOM_WIDTH, -ROOM_HEIGHT, 6),
        2,
    )?;
    summit.fill_rect(0, FLOOR_ROW, GAP_START, ROWS - FLOOR_ROW, GROUND)?;
    summit.fill_rect(GAP_END, 0, COLS - GAP_END, ROWS, STONE)?;
    summit.fill_rect(0, 0, COLS, 2, STONE)?;
    summit.fill_rect(0, 0, 2, FLOOR_ROW, STONE)?;
    summit.add_entity(Entity::spike(
        ROOM_WIDTH + 16 * TILE_SIZE,
        -ROOM_HEIGHT + 2 * TILE_SIZE,
        HazardDirection::Down,
    ))?;

    World::new(vec![start, climb, summit])
}
