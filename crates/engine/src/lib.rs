use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod camera;
pub mod geometry;
pub mod grapple;
pub mod input;
pub mod physics;
pub mod player;
pub mod sim;
pub mod transition;
pub mod world;

pub use app::{FrameReport, HostLoop, InterpolatedFrame, LoopConfig, LoopMetricsSnapshot};
pub use camera::{Camera, Viewport};
pub use geometry::{Point, Rect, Vec2};
pub use grapple::{Grapple, GrappleState};
pub use input::{InputAction, InputSnapshot, InputState};
pub use player::{step_player, ConfigError, MotionState, PhysicsConfig, PlayerState, WallSide};
pub use sim::{RenderSnapshot, Simulation, SimulationError, TickEvents};
pub use transition::{RoomEdge, RoomTransitionController, TransitionDirection};
pub use world::{
    default_world, load_world, load_world_or_default, save_world, Entity, EntityKind,
    HazardDirection, Room, RoomId, World, WorldEditError, WorldLoadError, WorldSaveError,
    TILE_SIZE, WORLD_FORMAT_VERSION,
};

pub const ROOT_ENV_VAR: &str = "CLIFF_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub worlds_dir: PathBuf,
    pub saves_dir: PathBuf,
}

impl AppPaths {
    pub fn default_world_file(&self) -> PathBuf {
        self.worlds_dir.join("default.json")
    }

    pub fn default_physics_file(&self) -> PathBuf {
        self.root.join("physics.json")
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create saves directory at {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "CLIFF_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or worlds/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or worlds/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/cliff\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
    #[error("failed to load physics tuning: {0}")]
    Physics(#[from] ConfigError),
    #[error("failed to start simulation: {0}")]
    Simulation(#[from] SimulationError),
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    paths_under(root)
}

fn paths_under(root: PathBuf) -> Result<AppPaths, StartupError> {
    let worlds_dir = root.join("worlds");
    let saves_dir = root.join("saves");

    fs::create_dir_all(&saves_dir).map_err(|source| StartupError::CreateSavesDir {
        path: saves_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        worlds_dir,
        saves_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_worlds = path.join("worlds").is_dir();

    cargo_toml && (has_crates || has_worlds)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        fs::create_dir_all(temp.path().join("worlds")).expect("worlds dir");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        assert!(is_repo_marker(temp.path()));
        assert!(!is_repo_marker(&temp.path().join("definitely_not_a_marker")));
    }

    #[test]
    fn app_paths_create_saves_dir_under_root() {
        let temp = tempfile::TempDir::new().expect("temp dir");

        let paths = paths_under(temp.path().to_path_buf()).expect("paths");

        assert!(paths.saves_dir.is_dir());
        assert_eq!(
            paths.default_world_file(),
            temp.path().join("worlds").join("default.json")
        );
    }
}
