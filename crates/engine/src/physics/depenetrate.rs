use tracing::warn;

use super::collision::SolidGeometry;
use super::mover::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depenetration {
    /// The body was not overlapping anything.
    Clear,
    Resolved { dx: i32, dy: i32 },
    /// Nothing within the radius was free; the body was left in place.
    Unresolved,
}

/// Probe order at each distance: up, left, right, down.
const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Snaps an overlapping body to the nearest free cardinal offset. Every
/// direction is tried at distance 1 before any is tried at distance 2.
pub fn depenetrate<G: SolidGeometry + ?Sized>(
    body: &mut Body,
    geometry: &G,
    radius: i32,
) -> Depenetration {
    let hitbox = body.hitbox();
    if !geometry.check_solid(hitbox) {
        return Depenetration::Clear;
    }

    for distance in 1..=radius {
        for (ux, uy) in DIRECTIONS {
            let (dx, dy) = (ux * distance, uy * distance);
            if !geometry.check_solid(hitbox.offset(dx, dy)) {
                body.x += dx;
                body.y += dy;
                body.clear_remainder();
                return Depenetration::Resolved { dx, dy };
            }
        }
    }

    warn!(
        x = body.x,
        y = body.y,
        radius,
        "depenetration_unresolved"
    );
    Depenetration::Unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};
    use crate::world::{Room, World};

    fn world_with(setup: impl FnOnce(&mut Room)) -> World {
        let mut room =
            Room::new("r", Rect::new(0, 0, 64, 64), Point::new(0, 0), 0).expect("room");
        setup(&mut room);
        World::new(vec![room]).expect("world")
    }

    #[test]
    fn clear_body_is_untouched() {
        let world = world_with(|_| {});
        let mut body = Body::new(16, 16, 8, 12);
        assert_eq!(depenetrate(&mut body, &world, 8), Depenetration::Clear);
        assert_eq!((body.x, body.y), (16, 16));
    }

    #[test]
    fn sunk_into_floor_resolves_upward_first() {
        // Floor at y >= 40; body bottom sunk 2px into it.
        let world = world_with(|room| room.fill_rect(0, 5, 8, 3, 1).expect("floor"));
        let mut body = Body::new(16, 30, 8, 12);
        body.remainder.x = 0.4;

        let outcome = depenetrate(&mut body, &world, 8);

        assert_eq!(outcome, Depenetration::Resolved { dx: 0, dy: -2 });
        assert_eq!((body.x, body.y), (16, 28));
        assert_eq!(body.remainder.x, 0.0);
    }

    #[test]
    fn shorter_sideways_escape_beats_longer_upward_one() {
        // Overlapping a wall at x 24..32 by 1px; the wall spans full height.
        let world = world_with(|room| room.fill_rect(3, 0, 1, 8, 1).expect("wall"));
        let mut body = Body::new(17, 20, 8, 12);

        let outcome = depenetrate(&mut body, &world, 8);

        assert_eq!(outcome, Depenetration::Resolved { dx: -1, dy: 0 });
        assert_eq!(body.x, 16);
    }

    #[test]
    fn buried_body_is_left_in_place() {
        let world = world_with(|room| room.fill_rect(0, 0, 8, 8, 1).expect("solid"));
        let mut body = Body::new(24, 24, 8, 12);

        assert_eq!(depenetrate(&mut body, &world, 8), Depenetration::Unresolved);
        assert_eq!((body.x, body.y), (24, 24));
    }
}
