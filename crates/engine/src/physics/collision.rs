use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::world::{EntityKind, HazardDirection, World, TILE_SIZE};

/// Solidity queries every mover runs against. Queries are total: any pixel
/// resolves to solid or empty, never an error.
pub trait SolidGeometry {
    fn is_solid(&self, x: i32, y: i32) -> bool;

    /// Samples the rect's perimeter at a stride of `TILE_SIZE - 1`, which
    /// cannot step over a whole tile, plus the far edges.
    fn check_solid(&self, rect: Rect) -> bool {
        if rect.is_empty() {
            return false;
        }
        let bottom = rect.bottom() - 1;
        let right = rect.right() - 1;
        let horizontal = perimeter_offsets(rect.w).any(|dx| {
            self.is_solid(rect.x + dx, rect.y) || self.is_solid(rect.x + dx, bottom)
        });
        horizontal
            || perimeter_offsets(rect.h)
                .any(|dy| self.is_solid(rect.x, rect.y + dy) || self.is_solid(right, rect.y + dy))
    }
}

impl SolidGeometry for World {
    fn is_solid(&self, x: i32, y: i32) -> bool {
        World::is_solid(self, x, y)
    }
}

fn perimeter_offsets(extent: i32) -> impl Iterator<Item = i32> {
    let stride = (TILE_SIZE - 1).max(1) as usize;
    (0..extent)
        .step_by(stride)
        .chain(std::iter::once(extent - 1))
}

/// How far each edge of a spike's tile is pulled in before it counts as
/// dangerous. `tip` is the pointed edge, `back` the mounted edge, `side` the
/// two edges perpendicular to the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardInsets {
    pub tip: i32,
    pub back: i32,
    pub side: i32,
}

impl Default for HazardInsets {
    fn default() -> Self {
        Self {
            tip: 0,
            back: 5,
            side: 1,
        }
    }
}

/// Dangerous region of a spike whose tile top-left is `origin`.
pub fn hazard_rect(origin: Point, direction: HazardDirection, insets: HazardInsets) -> Rect {
    let long = TILE_SIZE - 2 * insets.side;
    let short = TILE_SIZE - insets.tip - insets.back;
    match direction {
        HazardDirection::Up => Rect::new(origin.x + insets.side, origin.y + insets.tip, long, short),
        HazardDirection::Down => {
            Rect::new(origin.x + insets.side, origin.y + insets.back, long, short)
        }
        HazardDirection::Left => {
            Rect::new(origin.x + insets.tip, origin.y + insets.side, short, long)
        }
        HazardDirection::Right => {
            Rect::new(origin.x + insets.back, origin.y + insets.side, short, long)
        }
    }
}

/// True if the hitbox overlaps any spike's inset danger region in any room.
pub fn touches_hazard(world: &World, hitbox: Rect, insets: HazardInsets) -> bool {
    world
        .rooms()
        .iter()
        .filter(|room| room.bounds().overlaps(&hitbox))
        .flat_map(|room| room.entities().iter())
        .any(|entity| match entity.kind {
            EntityKind::Spike(direction) => {
                hazard_rect(Point::new(entity.x, entity.y), direction, insets).overlaps(&hitbox)
            }
            EntityKind::Checkpoint => false,
        })
}

/// Position of the first checkpoint whose tile the hitbox overlaps.
pub fn checkpoint_touched(world: &World, hitbox: Rect) -> Option<Point> {
    world
        .rooms()
        .iter()
        .filter(|room| room.bounds().overlaps(&hitbox))
        .flat_map(|room| room.entities().iter())
        .find(|entity| {
            entity.kind == EntityKind::Checkpoint
                && Rect::new(entity.x, entity.y, TILE_SIZE, TILE_SIZE).overlaps(&hitbox)
        })
        .map(|entity| Point::new(entity.x, entity.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Entity, Room};

    fn single_room_world(setup: impl FnOnce(&mut Room)) -> World {
        let mut room =
            Room::new("r", Rect::new(0, 0, 64, 64), Point::new(8, 8), 0).expect("room");
        setup(&mut room);
        World::new(vec![room]).expect("world")
    }

    #[test]
    fn check_solid_catches_single_tile_inside_perimeter_span() {
        let world = single_room_world(|room| room.set_tile(3, 3, 1).expect("tile"));
        // A 16px-wide probe whose top edge crosses the tile at x 24..32.
        assert!(world.check_solid(Rect::new(17, 30, 16, 4)));
        assert!(!world.check_solid(Rect::new(17, 32, 16, 4)));
        assert!(!world.check_solid(Rect::new(32, 24, 8, 8)));
        assert!(world.check_solid(Rect::new(31, 24, 8, 8)));
    }

    #[test]
    fn check_solid_treats_void_as_solid() {
        let world = single_room_world(|_| {});
        assert!(world.check_solid(Rect::new(60, 10, 8, 8)));
        assert!(!world.check_solid(Rect::new(56, 10, 8, 8)));
    }

    #[test]
    fn empty_rect_is_never_solid() {
        let world = single_room_world(|_| {});
        assert!(!world.check_solid(Rect::new(-50, -50, 0, 4)));
    }

    #[test]
    fn upward_spike_is_only_dangerous_near_its_tip() {
        let insets = HazardInsets::default();
        let danger = hazard_rect(Point::new(16, 16), HazardDirection::Up, insets);
        assert_eq!(danger, Rect::new(17, 16, 6, 3));

        let world = single_room_world(|room| {
            room.add_entity(Entity::spike(16, 16, HazardDirection::Up))
                .expect("spike")
        });
        assert!(!touches_hazard(&world, Rect::new(16, 4, 8, 12), insets));
        assert!(touches_hazard(&world, Rect::new(16, 5, 8, 12), insets));
        // Overlapping the spike's tile below the tip band is safe.
        assert!(!touches_hazard(&world, Rect::new(22, 19, 8, 12), insets));
        // Brushing the flank inside the side inset is safe.
        assert!(!touches_hazard(&world, Rect::new(9, 12, 8, 12), insets));
        assert!(touches_hazard(&world, Rect::new(10, 12, 8, 12), insets));
    }

    #[test]
    fn insets_follow_spike_direction() {
        let insets = HazardInsets::default();
        let origin = Point::new(0, 0);
        assert_eq!(
            hazard_rect(origin, HazardDirection::Down, insets),
            Rect::new(1, 5, 6, 3)
        );
        assert_eq!(
            hazard_rect(origin, HazardDirection::Left, insets),
            Rect::new(0, 1, 3, 6)
        );
        assert_eq!(
            hazard_rect(origin, HazardDirection::Right, insets),
            Rect::new(5, 1, 3, 6)
        );
    }

    #[test]
    fn checkpoint_lookup_returns_marker_position() {
        let world = single_room_world(|room| {
            room.add_entity(Entity::checkpoint(40, 40)).expect("checkpoint")
        });
        assert_eq!(
            checkpoint_touched(&world, Rect::new(36, 36, 8, 12)),
            Some(Point::new(40, 40))
        );
        assert_eq!(checkpoint_touched(&world, Rect::new(8, 8, 8, 12)), None);
    }
}
