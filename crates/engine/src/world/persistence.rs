use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::atomic_io::write_text_replacing;
use super::{default_world, Entity, EntityKind, HazardDirection, Room, World, WorldEditError};
use crate::geometry::{Point, Rect};

pub const WORLD_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum WorldLoadError {
    #[error("failed to read world file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse world json at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("world validation failed at {path}: {message}")]
    Validation { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum WorldSaveError {
    #[error("refusing to save world that would not load back; {path}: {message}")]
    Invalid { path: String, message: String },
    #[error("failed to encode world json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write world file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WorldFile {
    version: u32,
    rooms: Vec<RoomRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RoomRecord {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    tiles: Vec<Vec<u16>>,
    entities: Vec<EntityRecord>,
    #[serde(rename = "spawnX")]
    spawn_x: i32,
    #[serde(rename = "spawnY")]
    spawn_y: i32,
    name: String,
    order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EntityRecord {
    #[serde(rename = "type")]
    kind: String,
    x: i32,
    y: i32,
    #[serde(default)]
    data: Value,
}

impl World {
    pub fn from_json_str(raw: &str) -> Result<World, WorldLoadError> {
        let file = parse_world_file(raw)?;
        world_from_file(file)
    }

    /// Encodes the world, first checking that the result passes [`load_world`].
    pub fn to_json_string(&self) -> Result<String, WorldSaveError> {
        let file = world_to_file(self);
        check_loadable(&file)?;
        serde_json::to_string_pretty(&file).map_err(WorldSaveError::Encode)
    }
}

pub fn load_world(path: &Path) -> Result<World, WorldLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| WorldLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    World::from_json_str(&raw)
}

/// Loads a world file, substituting the built-in world on any failure.
pub fn load_world_or_default(path: &Path) -> World {
    match load_world(path) {
        Ok(world) => {
            info!(
                path = %path.display(),
                room_count = world.room_count(),
                "world_loaded"
            );
            world
        }
        Err(error) => {
            warn!(
                path = %path.display(),
                error = %error,
                "world_load_failed; using built-in world"
            );
            default_world()
        }
    }
}

pub fn save_world(path: &Path, world: &World) -> Result<(), WorldSaveError> {
    let json = world.to_json_string()?;
    write_text_replacing(path, &json).map_err(|source| WorldSaveError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        room_count = world.room_count(),
        "world_saved"
    );
    Ok(())
}

fn parse_world_file(raw: &str) -> Result<WorldFile, WorldLoadError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, WorldFile>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let message = error.into_inner().to_string();
        WorldLoadError::Parse { path, message }
    })
}

fn validation_err(path: impl Into<String>, message: impl Into<String>) -> WorldLoadError {
    WorldLoadError::Validation {
        path: path.into(),
        message: message.into(),
    }
}

fn edit_err(path: impl Into<String>, error: WorldEditError) -> WorldLoadError {
    validation_err(path, error.to_string())
}

fn world_from_file(file: WorldFile) -> Result<World, WorldLoadError> {
    if file.version != WORLD_FORMAT_VERSION {
        return Err(validation_err(
            "version",
            format!("expected {WORLD_FORMAT_VERSION}, got {}", file.version),
        ));
    }

    if file.rooms.is_empty() {
        return Err(validation_err("rooms", "expected at least one room"));
    }

    let mut world = World::default();
    for (index, record) in file.rooms.into_iter().enumerate() {
        let room = room_from_record(index, record)?;
        world
            .add_room(room)
            .map_err(|error| edit_err(format!("rooms[{index}]"), error))?;
    }
    Ok(world)
}

fn check_loadable(file: &WorldFile) -> Result<(), WorldSaveError> {
    match world_from_file(file.clone()) {
        Ok(_) => Ok(()),
        Err(WorldLoadError::Validation { path, message }) => {
            Err(WorldSaveError::Invalid { path, message })
        }
        Err(other) => Err(WorldSaveError::Invalid {
            path: String::new(),
            message: other.to_string(),
        }),
    }
}

fn room_from_record(index: usize, record: RoomRecord) -> Result<Room, WorldLoadError> {
    let room_path = format!("rooms[{index}]");
    let mut room = Room::with_tiles(
        record.name,
        Rect::new(record.x, record.y, record.w, record.h),
        Point::new(record.spawn_x, record.spawn_y),
        record.order,
        &record.tiles,
    )
    .map_err(|error| edit_err(&room_path, error))?;

    for (entity_index, entity) in record.entities.into_iter().enumerate() {
        let entity_path = format!("{room_path}.entities[{entity_index}]");
        let entity = entity_from_record(&entity_path, entity)?;
        room.add_entity(entity)
            .map_err(|error| edit_err(&entity_path, error))?;
    }
    Ok(room)
}

fn entity_from_record(path: &str, record: EntityRecord) -> Result<Entity, WorldLoadError> {
    match record.kind.as_str() {
        "spike" => {
            let token = record
                .data
                .get("dir")
                .and_then(Value::as_str)
                .ok_or_else(|| validation_err(format!("{path}.data.dir"), "missing spike direction"))?;
            let direction = HazardDirection::from_token(token).ok_or_else(|| {
                validation_err(
                    format!("{path}.data.dir"),
                    format!("expected one of up/down/left/right, got '{token}'"),
                )
            })?;
            Ok(Entity::spike(record.x, record.y, direction))
        }
        "checkpoint" => {
            if !(record.data.is_null() || record.data.is_object()) {
                return Err(validation_err(
                    format!("{path}.data"),
                    "checkpoint data must be an object",
                ));
            }
            Ok(Entity::checkpoint(record.x, record.y))
        }
        other => Err(validation_err(
            format!("{path}.type"),
            format!("unknown entity type '{other}'"),
        )),
    }
}

fn world_to_file(world: &World) -> WorldFile {
    WorldFile {
        version: WORLD_FORMAT_VERSION,
        rooms: world.rooms().iter().map(room_to_record).collect(),
    }
}

fn room_to_record(room: &Room) -> RoomRecord {
    let bounds = room.bounds();
    RoomRecord {
        x: bounds.x,
        y: bounds.y,
        w: bounds.w,
        h: bounds.h,
        tiles: room.tile_rows(),
        entities: room.entities().iter().map(entity_to_record).collect(),
        spawn_x: room.spawn().x,
        spawn_y: room.spawn().y,
        name: room.name().to_string(),
        order: room.order(),
    }
}

fn entity_to_record(entity: &Entity) -> EntityRecord {
    let (kind, data) = match entity.kind {
        EntityKind::Spike(direction) => ("spike", json!({ "dir": direction.as_token() })),
        EntityKind::Checkpoint => ("checkpoint", json!({})),
    };
    EntityRecord {
        kind: kind.to_string(),
        x: entity.x,
        y: entity.y,
        data,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::world::RoomId;

    fn tiny_room_json(extra_entities: &str) -> String {
        format!(
            r#"{{
                "version": 1,
                "rooms": [{{
                    "x": 0, "y": 0, "w": 16, "h": 16,
                    "tiles": [[0, 0], [1, 1]],
                    "entities": [{extra_entities}],
                    "spawnX": 2, "spawnY": 2,
                    "name": "tiny", "order": 0
                }}]
            }}"#
        )
    }

    fn hazard_heavy_world() -> World {
        let mut world = default_world();
        let start = world.room_id_by_name("start").expect("start room");
        world
            .add_entity(start, Entity::spike(200, 152, HazardDirection::Left))
            .expect("spike");
        world
            .add_entity(start, Entity::spike(208, 8, HazardDirection::Down))
            .expect("spike");
        world
            .add_entity(start, Entity::checkpoint(240, 148))
            .expect("checkpoint");
        world
    }

    #[test]
    fn save_then_load_reproduces_room_set() {
        let world = hazard_heavy_world();
        assert!(world.room_count() >= 3);

        let json = world.to_json_string().expect("encode");
        let loaded = World::from_json_str(&json).expect("decode");

        assert_eq!(loaded, world);
    }

    #[test]
    fn save_then_load_through_disk_reproduces_room_set() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("worlds").join("world.json");
        let world = hazard_heavy_world();

        save_world(&path, &world).expect("save");
        let loaded = load_world(&path).expect("load");

        assert_eq!(loaded.rooms(), world.rooms());
    }

    #[test]
    fn persisted_field_names_match_world_format() {
        let json = default_world().to_json_string().expect("encode");
        let value: Value = serde_json::from_str(&json).expect("json");
        let room = &value["rooms"][0];

        assert_eq!(value["version"], json!(WORLD_FORMAT_VERSION));
        for key in ["x", "y", "w", "h", "tiles", "entities", "spawnX", "spawnY", "name", "order"] {
            assert!(room.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = tiny_room_json("").replace("[0, 0], [1, 1]", "[0, 0], [1, \"stone\"]");
        let error = World::from_json_str(&raw).expect_err("should fail");
        match error {
            WorldLoadError::Parse { path, .. } => assert_eq!(path, "rooms[0].tiles[1][1]"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        let raw = tiny_room_json(r#"{"type": "coin", "x": 1, "y": 1, "data": {}}"#);
        let error = World::from_json_str(&raw).expect_err("should fail");
        match error {
            WorldLoadError::Validation { path, .. } => {
                assert_eq!(path, "rooms[0].entities[0].type")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn spike_without_direction_is_rejected() {
        let raw = tiny_room_json(r#"{"type": "spike", "x": 1, "y": 1, "data": {"dir": "sideways"}}"#);
        let error = World::from_json_str(&raw).expect_err("should fail");
        assert!(matches!(error, WorldLoadError::Validation { ref path, .. } if path == "rooms[0].entities[0].data.dir"));
    }

    #[test]
    fn entity_outside_room_is_rejected() {
        let raw = tiny_room_json(r#"{"type": "checkpoint", "x": 40, "y": 1}"#);
        let error = World::from_json_str(&raw).expect_err("should fail");
        assert!(matches!(error, WorldLoadError::Validation { ref path, .. } if path == "rooms[0].entities[0]"));
    }

    #[test]
    fn grid_shape_mismatch_is_rejected() {
        let raw = tiny_room_json("").replace("[[0, 0], [1, 1]]", "[[0, 0]]");
        let error = World::from_json_str(&raw).expect_err("should fail");
        assert!(matches!(error, WorldLoadError::Validation { ref path, .. } if path == "rooms[0]"));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let raw = tiny_room_json("").replace("\"version\": 1", "\"version\": 7");
        let error = World::from_json_str(&raw).expect_err("should fail");
        assert!(matches!(error, WorldLoadError::Validation { ref path, .. } if path == "version"));
    }

    #[test]
    fn world_without_rooms_is_rejected() {
        let error = World::from_json_str(r#"{"version": 1, "rooms": []}"#).expect_err("should fail");
        assert!(matches!(error, WorldLoadError::Validation { ref path, .. } if path == "rooms"));
    }

    #[test]
    fn valid_tiny_world_loads() {
        let raw = tiny_room_json(r#"{"type": "spike", "x": 8, "y": 0, "data": {"dir": "up"}}"#);
        let world = World::from_json_str(&raw).expect("load");
        let room = world.room(RoomId(0)).expect("room");
        assert_eq!(room.tile(1, 1), Some(1));
        assert_eq!(room.entities(), &[Entity::spike(8, 0, HazardDirection::Up)]);
    }

    #[test]
    fn bounds_past_coordinate_range_are_rejected_without_panicking() {
        let raw = tiny_room_json("").replace(
            r#""x": 0, "y": 0, "w": 16, "h": 16"#,
            r#""x": 2147483000, "y": 0, "w": 8000, "h": 16"#,
        );
        let error = World::from_json_str(&raw).expect_err("should fail");
        assert!(matches!(error, WorldLoadError::Validation { ref path, .. } if path == "rooms[0]"));

        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("far.json");
        fs::write(&path, &raw).expect("write");
        assert_eq!(load_world_or_default(&path), default_world());
    }

    #[test]
    fn oversized_room_is_rejected_before_allocating_tiles() {
        let raw = tiny_room_json("").replace(
            r#""w": 16, "h": 16"#,
            r#""w": 2147483640, "h": 2147483640"#,
        );
        let error = World::from_json_str(&raw).expect_err("should fail");
        match error {
            WorldLoadError::Validation { path, message } => {
                assert_eq!(path, "rooms[0]");
                assert!(message.contains("tile limit"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn renamed_room_survives_save_and_reload() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("renamed.json");
        let mut world = default_world();
        let climb = world.room_id_by_name("climb").expect("climb room");
        assert!(world.rename_room(climb, "start").is_err());
        world.rename_room(climb, "ascent").expect("rename");
        world.set_room_order(climb, 5).expect("order");

        save_world(&path, &world).expect("save");
        let loaded = load_world(&path).expect("load");

        assert_eq!(loaded, world);
        assert_eq!(loaded.room(climb).expect("room").name(), "ascent");
    }

    #[test]
    fn save_refuses_world_that_would_not_load() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("empty.json");

        let error = save_world(&path, &World::default()).expect_err("should refuse");

        assert!(matches!(error, WorldSaveError::Invalid { ref path, .. } if path == "rooms"));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_falls_back_to_default_world() {
        let temp = TempDir::new().expect("temp dir");
        let world = load_world_or_default(&temp.path().join("missing.json"));
        assert_eq!(world, default_world());
    }

    #[test]
    fn corrupt_file_falls_back_to_default_world() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").expect("write");
        assert_eq!(load_world_or_default(&path), default_world());
    }
}
