use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cliff_engine::{resolve_app_paths, AppPaths, LoopConfig, StartupError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) const WORLD_ENV_VAR: &str = "CLIFF_WORLD";
pub(crate) const PHYSICS_ENV_VAR: &str = "CLIFF_PHYSICS";
pub(crate) const INPUT_SCRIPT_ENV_VAR: &str = "CLIFF_INPUT_SCRIPT";
pub(crate) const SAVE_OUT_ENV_VAR: &str = "CLIFF_SAVE_OUT";
pub(crate) const FRAME_MS_ENV_VAR: &str = "CLIFF_FRAME_MS";

#[derive(Debug, Clone)]
pub(crate) struct AppWiring {
    pub(crate) paths: AppPaths,
    pub(crate) config: LoopConfig,
    pub(crate) world_file: PathBuf,
    pub(crate) physics_file: Option<PathBuf>,
    pub(crate) input_script: Option<PathBuf>,
    pub(crate) save_out: Option<PathBuf>,
    pub(crate) frame_dt: Duration,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Cliff Startup ===");

    let paths = resolve_app_paths()?;
    let wiring = wiring_from_env(paths);
    info!(
        root = %wiring.paths.root.display(),
        world = %wiring.world_file.display(),
        physics = %wiring
            .physics_file
            .as_deref()
            .map_or_else(|| "built-in".to_string(), |path| path.display().to_string()),
        frame_ms = wiring.frame_dt.as_secs_f64() * 1000.0,
        "startup"
    );
    Ok(wiring)
}

fn wiring_from_env(paths: AppPaths) -> AppWiring {
    let config = LoopConfig::default();
    let world_file = path_from_env(WORLD_ENV_VAR).unwrap_or_else(|| paths.default_world_file());
    let physics_file = path_from_env(PHYSICS_ENV_VAR).or_else(|| {
        let fallback = paths.default_physics_file();
        fallback.is_file().then_some(fallback)
    });
    let input_script = path_from_env(INPUT_SCRIPT_ENV_VAR);
    let save_out =
        path_from_env(SAVE_OUT_ENV_VAR).map(|path| resolve_save_path(&paths.saves_dir, path));
    let frame_dt = resolve_frame_delta(config.fixed_dt());

    AppWiring {
        paths,
        config,
        world_file,
        physics_file,
        input_script,
        save_out,
        frame_dt,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn path_from_env(env_var: &'static str) -> Option<PathBuf> {
    match env::var(env_var) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(PathBuf::from(value.trim())),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var,
                error = %err,
                "failed to read env var; ignoring"
            );
            None
        }
    }
}

/// Relative save targets land in the saves directory.
fn resolve_save_path(saves_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        saves_dir.join(path)
    }
}

fn resolve_frame_delta(fallback: Duration) -> Duration {
    match env::var(FRAME_MS_ENV_VAR) {
        Ok(value) => parse_frame_ms(&value).unwrap_or_else(|| {
            warn!(
                env_var = FRAME_MS_ENV_VAR,
                value = value.as_str(),
                "invalid frame-ms env var value; falling back to fixed tick"
            );
            fallback
        }),
        Err(env::VarError::NotPresent) => fallback,
        Err(err) => {
            warn!(
                env_var = FRAME_MS_ENV_VAR,
                error = %err,
                "failed to read frame-ms env var; falling back to fixed tick"
            );
            fallback
        }
    }
}

fn parse_frame_ms(raw: &str) -> Option<Duration> {
    let ms = raw.trim().parse::<f64>().ok()?;
    (ms.is_finite() && ms > 0.0).then(|| Duration::from_secs_f64(ms / 1000.0))
}
