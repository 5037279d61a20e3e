use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::HazardInsets;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read physics config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse physics config at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid physics config field {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Every tuning constant of the movement model, in pixels and seconds.
///
/// Missing fields in a tuning file fall back to the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub max_run_speed: f32,
    pub ground_accel: f32,
    pub air_accel: f32,
    pub ground_friction: f32,
    pub air_friction: f32,

    pub gravity: f32,
    pub apex_threshold: f32,
    pub apex_gravity_multiplier: f32,
    pub max_fall_speed: f32,
    pub wall_slide_speed: f32,

    pub jump_velocity: f32,
    pub duck_jump_velocity: f32,
    pub variable_jump_multiplier: f32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,

    pub wall_jump_vy: f32,
    pub wall_jump_vx: f32,
    pub wall_jump_lock: f32,

    pub stamina_max: f32,
    pub climb_up_drain: f32,
    pub climb_hold_drain: f32,
    pub climb_up_speed: f32,
    pub climb_down_speed: f32,
    pub slip_speed: f32,

    pub hitbox_width: i32,
    pub stand_height: i32,
    pub duck_height: i32,
    pub corner_correction: i32,
    pub depenetration_radius: i32,
    pub hazard_insets: HazardInsets,

    pub transition_duration: f32,
    pub transition_edge_buffer: i32,
    pub post_transition_lock: f32,

    pub grapple_max_length: f32,
    pub grapple_min_length: f32,
    pub grapple_swing_accel: f32,
    pub grapple_stiffness: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_run_speed: 90.0,
            ground_accel: 1000.0,
            air_accel: 650.0,
            ground_friction: 1200.0,
            air_friction: 400.0,

            gravity: 900.0,
            apex_threshold: 40.0,
            apex_gravity_multiplier: 0.5,
            max_fall_speed: 240.0,
            wall_slide_speed: 60.0,

            jump_velocity: -230.0,
            duck_jump_velocity: -180.0,
            variable_jump_multiplier: 0.5,
            coyote_time: 0.1,
            jump_buffer_time: 0.1,

            wall_jump_vy: -210.0,
            wall_jump_vx: 130.0,
            wall_jump_lock: 0.15,

            stamina_max: 110.0,
            climb_up_drain: 45.45,
            climb_hold_drain: 10.0,
            climb_up_speed: 45.0,
            climb_down_speed: 80.0,
            slip_speed: 30.0,

            hitbox_width: 8,
            stand_height: 12,
            duck_height: 8,
            corner_correction: 3,
            depenetration_radius: 8,
            hazard_insets: HazardInsets::default(),

            transition_duration: 0.2,
            transition_edge_buffer: 2,
            post_transition_lock: 0.1,

            grapple_max_length: 96.0,
            grapple_min_length: 8.0,
            grapple_swing_accel: 220.0,
            grapple_stiffness: 12.0,
        }
    }
}

impl PhysicsConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: Self = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            ConfigError::Parse {
                path,
                message: error.into_inner().to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the step function cannot run with. Velocities that are
    /// upward by convention (jumps) must be negative; everything else must be
    /// finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("max_run_speed", self.max_run_speed),
            ("ground_accel", self.ground_accel),
            ("air_accel", self.air_accel),
            ("ground_friction", self.ground_friction),
            ("air_friction", self.air_friction),
            ("gravity", self.gravity),
            ("apex_threshold", self.apex_threshold),
            ("apex_gravity_multiplier", self.apex_gravity_multiplier),
            ("max_fall_speed", self.max_fall_speed),
            ("wall_slide_speed", self.wall_slide_speed),
            ("variable_jump_multiplier", self.variable_jump_multiplier),
            ("coyote_time", self.coyote_time),
            ("jump_buffer_time", self.jump_buffer_time),
            ("wall_jump_vx", self.wall_jump_vx),
            ("wall_jump_lock", self.wall_jump_lock),
            ("stamina_max", self.stamina_max),
            ("climb_up_drain", self.climb_up_drain),
            ("climb_hold_drain", self.climb_hold_drain),
            ("climb_up_speed", self.climb_up_speed),
            ("climb_down_speed", self.climb_down_speed),
            ("slip_speed", self.slip_speed),
            ("transition_duration", self.transition_duration),
            ("post_transition_lock", self.post_transition_lock),
            ("grapple_max_length", self.grapple_max_length),
            ("grapple_min_length", self.grapple_min_length),
            ("grapple_swing_accel", self.grapple_swing_accel),
            ("grapple_stiffness", self.grapple_stiffness),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("expected finite non-negative number, got {value}"),
                });
            }
        }

        for (field, value) in [
            ("jump_velocity", self.jump_velocity),
            ("duck_jump_velocity", self.duck_jump_velocity),
            ("wall_jump_vy", self.wall_jump_vy),
        ] {
            if !value.is_finite() || value >= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("expected finite negative (upward) velocity, got {value}"),
                });
            }
        }

        if self.variable_jump_multiplier > 1.0 {
            return Err(ConfigError::Invalid {
                field: "variable_jump_multiplier",
                message: format!("expected at most 1.0, got {}", self.variable_jump_multiplier),
            });
        }
        if self.hitbox_width <= 0 || self.stand_height <= 0 || self.duck_height <= 0 {
            return Err(ConfigError::Invalid {
                field: "hitbox",
                message: format!(
                    "expected positive sizes, got {}x{} standing / {} ducking",
                    self.hitbox_width, self.stand_height, self.duck_height
                ),
            });
        }
        if self.duck_height > self.stand_height {
            return Err(ConfigError::Invalid {
                field: "duck_height",
                message: format!(
                    "expected at most stand_height {}, got {}",
                    self.stand_height, self.duck_height
                ),
            });
        }
        for (field, value) in [
            ("corner_correction", self.corner_correction),
            ("depenetration_radius", self.depenetration_radius),
            ("transition_edge_buffer", self.transition_edge_buffer),
        ] {
            if value < 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("expected non-negative pixels, got {value}"),
                });
            }
        }
        let insets = self.hazard_insets;
        if insets.tip < 0
            || insets.back < 0
            || insets.side < 0
            || insets.tip + insets.back >= crate::world::TILE_SIZE
            || 2 * insets.side >= crate::world::TILE_SIZE
        {
            return Err(ConfigError::Invalid {
                field: "hazard_insets",
                message: format!("insets {insets:?} leave no dangerous area inside a tile"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PhysicsConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config =
            PhysicsConfig::from_json_str(r#"{ "gravity": 1200.0, "hazard_insets": { "tip": 1, "back": 4, "side": 2 } }"#)
                .expect("parse");
        assert_eq!(config.gravity, 1200.0);
        assert_eq!(config.max_run_speed, 90.0);
        assert_eq!(
            config.hazard_insets,
            HazardInsets {
                tip: 1,
                back: 4,
                side: 2
            }
        );
    }

    #[test]
    fn parse_error_names_the_field_path() {
        let error = PhysicsConfig::from_json_str(r#"{ "hazard_insets": { "tip": "wide" } }"#)
            .expect_err("should fail");
        match error {
            ConfigError::Parse { path, .. } => assert_eq!(path, "hazard_insets.tip"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validation_rejects_downward_jump_and_negative_gravity() {
        let error = PhysicsConfig::from_json_str(r#"{ "jump_velocity": 200.0 }"#)
            .expect_err("should fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "jump_velocity",
                ..
            }
        ));

        let config = PhysicsConfig {
            gravity: -1.0,
            ..PhysicsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "gravity", .. })
        ));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("physics.json");
        fs::write(&path, r#"{ "coyote_time": 0.2 }"#).expect("write");

        let config = PhysicsConfig::load(&path).expect("load");
        assert_eq!(config.coyote_time, 0.2);

        let missing = PhysicsConfig::load(&temp.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
