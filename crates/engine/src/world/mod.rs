mod atomic_io;
mod default_world;
mod persistence;

use thiserror::Error;

use crate::geometry::{Point, Rect};

pub use default_world::default_world;
pub use persistence::{
    load_world, load_world_or_default, save_world, WorldLoadError, WorldSaveError,
    WORLD_FORMAT_VERSION,
};

pub const TILE_SIZE: i32 = 8;
pub const TILE_EMPTY: u16 = 0;
/// Ids `1..=TILE_SOLID_MAX` are solid materials; anything above is decoration.
pub const TILE_SOLID_MAX: u16 = 63;

pub fn is_solid_tile(id: u16) -> bool {
    id != TILE_EMPTY && id <= TILE_SOLID_MAX
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId(pub usize);

/// The way a spike points. The tip edge faces this direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardDirection {
    Up,
    Down,
    Left,
    Right,
}

impl HazardDirection {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Spike(HazardDirection),
    Checkpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub x: i32,
    pub y: i32,
}

impl Entity {
    pub fn spike(x: i32, y: i32, direction: HazardDirection) -> Self {
        Self {
            kind: EntityKind::Spike(direction),
            x,
            y,
        }
    }

    pub fn checkpoint(x: i32, y: i32) -> Self {
        Self {
            kind: EntityKind::Checkpoint,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldEditError {
    #[error("room {0} does not exist")]
    UnknownRoom(usize),
    #[error("tile ({col}, {row}) is outside the {cols}x{rows} grid")]
    TileOutOfRange {
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    },
    #[error("point ({x}, {y}) lies outside room '{room}'")]
    PointOutOfRoom { room: String, x: i32, y: i32 },
    #[error("no entity at ({x}, {y}) in room '{room}'")]
    NoSuchEntity { room: String, x: i32, y: i32 },
    #[error("room '{room}' overlaps existing room '{existing}'")]
    RoomOverlap { room: String, existing: String },
    #[error("room name '{0}' is already in use")]
    DuplicateName(String),
    #[error("invalid room '{room}': {message}")]
    InvalidRoom { room: String, message: String },
}

/// Largest room edge, in tiles, accepted on either axis.
pub const MAX_ROOM_TILES: i32 = 1024;

/// Checks `bounds` and `spawn` and returns the grid size as `(cols, rows)`.
fn grid_shape(name: &str, bounds: Rect, spawn: Point) -> Result<(usize, usize), WorldEditError> {
    let invalid = |message: String| WorldEditError::InvalidRoom {
        room: name.to_string(),
        message,
    };
    if bounds.w <= 0 || bounds.h <= 0 {
        return Err(invalid(format!(
            "size {}x{} must be positive",
            bounds.w, bounds.h
        )));
    }
    if bounds.w % TILE_SIZE != 0 || bounds.h % TILE_SIZE != 0 {
        return Err(invalid(format!(
            "size {}x{} is not a multiple of tile size {TILE_SIZE}",
            bounds.w, bounds.h
        )));
    }
    let cols = bounds.w / TILE_SIZE;
    let rows = bounds.h / TILE_SIZE;
    if cols > MAX_ROOM_TILES || rows > MAX_ROOM_TILES {
        return Err(invalid(format!(
            "grid {cols}x{rows} exceeds the {MAX_ROOM_TILES}x{MAX_ROOM_TILES} tile limit"
        )));
    }
    if bounds.x.checked_add(bounds.w).is_none() || bounds.y.checked_add(bounds.h).is_none() {
        return Err(invalid(format!(
            "bounds at ({}, {}) extend past the coordinate range",
            bounds.x, bounds.y
        )));
    }
    if !bounds.contains_point(spawn.x, spawn.y) {
        return Err(WorldEditError::PointOutOfRoom {
            room: name.to_string(),
            x: spawn.x,
            y: spawn.y,
        });
    }
    Ok((cols as usize, rows as usize))
}

/// A rectangular region of the world with its own tile grid.
///
/// Grid dimensions are fixed at creation: `bounds.w / TILE_SIZE` columns by
/// `bounds.h / TILE_SIZE` rows, stored row-major. Names are only changed
/// through [`World::rename_room`], which keeps them unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    name: String,
    bounds: Rect,
    cols: usize,
    rows: usize,
    tiles: Vec<u16>,
    entities: Vec<Entity>,
    spawn: Point,
    order: i32,
}

impl Room {
    /// Creates an empty room. Bounds must be non-empty multiples of the tile size.
    pub fn new(
        name: impl Into<String>,
        bounds: Rect,
        spawn: Point,
        order: i32,
    ) -> Result<Self, WorldEditError> {
        let name = name.into();
        let (cols, rows) = grid_shape(&name, bounds, spawn)?;
        Ok(Self {
            name,
            bounds,
            cols,
            rows,
            tiles: vec![TILE_EMPTY; cols * rows],
            entities: Vec::new(),
            spawn,
            order,
        })
    }

    /// Creates a room from a row-major grid whose shape must match `bounds`.
    pub fn with_tiles(
        name: impl Into<String>,
        bounds: Rect,
        spawn: Point,
        order: i32,
        rows: &[Vec<u16>],
    ) -> Result<Self, WorldEditError> {
        let name = name.into();
        let (cols, row_count) = grid_shape(&name, bounds, spawn)?;
        if rows.len() != row_count {
            return Err(WorldEditError::InvalidRoom {
                room: name,
                message: format!("expected {row_count} tile rows, got {}", rows.len()),
            });
        }
        if let Some((row_index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols)
        {
            return Err(WorldEditError::InvalidRoom {
                room: name,
                message: format!(
                    "tile row {row_index}: expected {cols} columns, got {}",
                    row.len()
                ),
            });
        }
        Ok(Self {
            name,
            bounds,
            cols,
            rows: row_count,
            tiles: rows.concat(),
            entities: Vec::new(),
            spawn,
            order,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn spawn(&self) -> Point {
        self.spawn
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Progression rank; moving to a higher order is a forward transition.
    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    pub fn tile(&self, col: usize, row: usize) -> Option<u16> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.tiles.get(row * self.cols + col).copied()
    }

    /// Tile id under a world-space pixel, `None` outside the room.
    pub fn tile_at_point(&self, x: i32, y: i32) -> Option<u16> {
        if !self.bounds.contains_point(x, y) {
            return None;
        }
        let col = ((x - self.bounds.x) / TILE_SIZE) as usize;
        let row = ((y - self.bounds.y) / TILE_SIZE) as usize;
        self.tile(col, row)
    }

    pub fn set_tile(&mut self, col: usize, row: usize, id: u16) -> Result<(), WorldEditError> {
        if col >= self.cols || row >= self.rows {
            return Err(WorldEditError::TileOutOfRange {
                col,
                row,
                cols: self.cols,
                rows: self.rows,
            });
        }
        self.tiles[row * self.cols + col] = id;
        Ok(())
    }

    pub fn fill_rect(
        &mut self,
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
        id: u16,
    ) -> Result<(), WorldEditError> {
        for r in row..row + rows {
            for c in col..col + cols {
                self.set_tile(c, r, id)?;
            }
        }
        Ok(())
    }

    /// Row-major copy of the grid, one `Vec` per row.
    pub fn tile_rows(&self) -> Vec<Vec<u16>> {
        self.tiles
            .chunks(self.cols.max(1))
            .map(<[u16]>::to_vec)
            .collect()
    }

    pub fn add_entity(&mut self, entity: Entity) -> Result<(), WorldEditError> {
        if !self.bounds.contains_point(entity.x, entity.y) {
            return Err(WorldEditError::PointOutOfRoom {
                room: self.name.clone(),
                x: entity.x,
                y: entity.y,
            });
        }
        self.entities.push(entity);
        Ok(())
    }

    pub fn remove_entity_at(&mut self, x: i32, y: i32) -> Result<Entity, WorldEditError> {
        let index = self
            .entities
            .iter()
            .position(|entity| entity.x == x && entity.y == y)
            .ok_or_else(|| WorldEditError::NoSuchEntity {
                room: self.name.clone(),
                x,
                y,
            })?;
        Ok(self.entities.remove(index))
    }

    pub fn set_spawn(&mut self, spawn: Point) -> Result<(), WorldEditError> {
        if !self.bounds.contains_point(spawn.x, spawn.y) {
            return Err(WorldEditError::PointOutOfRoom {
                room: self.name.clone(),
                x: spawn.x,
                y: spawn.y,
            });
        }
        self.spawn = spawn;
        Ok(())
    }
}

/// Owns every room. Rooms never overlap and names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct World {
    rooms: Vec<Room>,
}

impl World {
    pub fn new(rooms: Vec<Room>) -> Result<Self, WorldEditError> {
        let mut world = Self::default();
        for room in rooms {
            world.add_room(room)?;
        }
        Ok(world)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id.0)
    }

    pub fn room_id_by_name(&self, name: &str) -> Option<RoomId> {
        self.rooms
            .iter()
            .position(|room| room.name == name)
            .map(RoomId)
    }

    pub fn room_at_point(&self, x: i32, y: i32) -> Option<RoomId> {
        self.rooms
            .iter()
            .position(|room| room.bounds.contains_point(x, y))
            .map(RoomId)
    }

    /// First room other than `exclude` that overlaps `rect`, preferring the
    /// one containing the rect's center.
    pub fn neighbor_room_for(&self, rect: Rect, exclude: RoomId) -> Option<RoomId> {
        let center = rect.center();
        if let Some(id) = self.room_at_point(center.x, center.y) {
            if id != exclude {
                return Some(id);
            }
        }
        self.rooms
            .iter()
            .enumerate()
            .find(|(index, room)| *index != exclude.0 && room.bounds.overlaps(&rect))
            .map(|(index, _)| RoomId(index))
    }

    /// Void (no room) is solid; otherwise the tile material decides.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.rooms
            .iter()
            .find_map(|room| room.tile_at_point(x, y))
            .map_or(true, is_solid_tile)
    }

    pub fn add_room(&mut self, room: Room) -> Result<RoomId, WorldEditError> {
        for existing in &self.rooms {
            if existing.name == room.name {
                return Err(WorldEditError::DuplicateName(room.name));
            }
            if existing.bounds.overlaps(&room.bounds) {
                return Err(WorldEditError::RoomOverlap {
                    room: room.name,
                    existing: existing.name.clone(),
                });
            }
        }
        self.rooms.push(room);
        Ok(RoomId(self.rooms.len() - 1))
    }

    pub fn rename_room(
        &mut self,
        id: RoomId,
        name: impl Into<String>,
    ) -> Result<(), WorldEditError> {
        let name = name.into();
        if id.0 >= self.rooms.len() {
            return Err(WorldEditError::UnknownRoom(id.0));
        }
        if self
            .rooms
            .iter()
            .enumerate()
            .any(|(index, room)| index != id.0 && room.name == name)
        {
            return Err(WorldEditError::DuplicateName(name));
        }
        self.rooms[id.0].name = name;
        Ok(())
    }

    pub fn set_room_order(&mut self, id: RoomId, order: i32) -> Result<(), WorldEditError> {
        self.room_mut(id)
            .ok_or(WorldEditError::UnknownRoom(id.0))?
            .set_order(order);
        Ok(())
    }

    /// Removes a room. Ids of later rooms shift down by one.
    pub fn remove_room(&mut self, id: RoomId) -> Result<Room, WorldEditError> {
        if id.0 >= self.rooms.len() {
            return Err(WorldEditError::UnknownRoom(id.0));
        }
        Ok(self.rooms.remove(id.0))
    }

    pub fn set_tile(
        &mut self,
        id: RoomId,
        col: usize,
        row: usize,
        tile: u16,
    ) -> Result<(), WorldEditError> {
        self.room_mut(id)
            .ok_or(WorldEditError::UnknownRoom(id.0))?
            .set_tile(col, row, tile)
    }

    pub fn add_entity(&mut self, id: RoomId, entity: Entity) -> Result<(), WorldEditError> {
        self.room_mut(id)
            .ok_or(WorldEditError::UnknownRoom(id.0))?
            .add_entity(entity)
    }

    pub fn remove_entity_at(
        &mut self,
        id: RoomId,
        x: i32,
        y: i32,
    ) -> Result<Entity, WorldEditError> {
        self.room_mut(id)
            .ok_or(WorldEditError::UnknownRoom(id.0))?
            .remove_entity_at(x, y)
    }

    pub fn set_spawn(&mut self, id: RoomId, spawn: Point) -> Result<(), WorldEditError> {
        self.room_mut(id)
            .ok_or(WorldEditError::UnknownRoom(id.0))?
            .set_spawn(spawn)
    }
}
