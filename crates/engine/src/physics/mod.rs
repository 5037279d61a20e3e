mod collision;
mod depenetrate;
mod mover;

pub use collision::{checkpoint_touched, hazard_rect, touches_hazard, HazardInsets, SolidGeometry};
pub use depenetrate::{depenetrate, Depenetration};
pub use mover::{move_x, move_y, take_whole_pixels, AxisMove, Body};
