use std::process::ExitCode;
use std::time::Duration;

use cliff_engine::{
    load_world_or_default, save_world, FrameReport, HostLoop, InputState, PhysicsConfig,
    Simulation, StartupError, WorldSaveError,
};
use thiserror::Error;
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::script::{InputScript, ScriptError};

#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("failed to save world: {0}")]
    Save(#[from] WorldSaveError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) frames: u64,
    pub(crate) ticks: u64,
    pub(crate) jumps: u32,
    pub(crate) landings: u32,
    pub(crate) deaths: u32,
    pub(crate) checkpoints: u32,
    pub(crate) transitions: u32,
    pub(crate) clamped_frames: u32,
    pub(crate) dropped_backlog: Duration,
}

impl RunSummary {
    fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.ticks += u64::from(report.ticks_run);
        if !report.dropped_backlog.is_zero() {
            self.clamped_frames += 1;
            self.dropped_backlog += report.dropped_backlog;
        }
        for events in &report.events {
            self.jumps += u32::from(events.jumped.is_some());
            self.landings += u32::from(events.landed);
            self.deaths += u32::from(events.died);
            self.checkpoints += u32::from(events.checkpoint.is_some());
            self.transitions += u32::from(events.transition_completed.is_some());
        }
    }
}

pub(crate) fn run(wiring: AppWiring) -> ExitCode {
    match run_headless(&wiring) {
        Ok(_) => ExitCode::SUCCESS,
        Err(RunError::Startup(err)) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn run_headless(wiring: &AppWiring) -> Result<RunSummary, RunError> {
    let physics = match &wiring.physics_file {
        Some(path) => PhysicsConfig::load(path).map_err(StartupError::from)?,
        None => PhysicsConfig::default(),
    };
    let mut script = match &wiring.input_script {
        Some(path) => InputScript::load(path)?,
        None => InputScript::demo(),
    };
    let world = load_world_or_default(&wiring.world_file);
    let simulation =
        Simulation::new(world, physics, wiring.config.viewport).map_err(StartupError::from)?;
    let mut host = HostLoop::new(simulation, &wiring.config);
    info!(
        frames = script.total_frames(),
        scripted = wiring.input_script.is_some(),
        "run_started"
    );

    let mut input = InputState::new();
    let mut summary = RunSummary::default();
    while script.apply_frame(&mut input) {
        let report = host.advance_frame(wiring.frame_dt, &mut input);
        summary.record(&report);
    }

    let simulation = host.simulation();
    let player = simulation.player().position();
    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        jumps = summary.jumps,
        landings = summary.landings,
        deaths = summary.deaths,
        checkpoints = summary.checkpoints,
        transitions = summary.transitions,
        clamped_frames = summary.clamped_frames,
        dropped_backlog_ms = summary.dropped_backlog.as_millis() as u64,
        room = %simulation
            .world()
            .room(simulation.current_room())
            .map_or("<none>", |room| room.name()),
        x = player.x,
        y = player.y,
        "run_summary"
    );

    if let Some(path) = &wiring.save_out {
        save_world(path, simulation.world())?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cliff_engine::{default_world, load_world, AppPaths, LoopConfig};

    use super::*;

    fn wiring_in(temp: &tempfile::TempDir) -> AppWiring {
        let root = temp.path().to_path_buf();
        let config = LoopConfig::default();
        AppWiring {
            paths: AppPaths {
                worlds_dir: root.join("worlds"),
                saves_dir: root.join("saves"),
                root: root.clone(),
            },
            frame_dt: config.fixed_dt(),
            config,
            world_file: root.join("worlds").join("default.json"),
            physics_file: None,
            input_script: None,
            save_out: None,
        }
    }

    #[test]
    fn missing_world_falls_back_and_runs_demo_script() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let wiring = wiring_in(&temp);

        let summary = run_headless(&wiring).expect("run");

        assert_eq!(summary.frames, InputScript::demo().total_frames());
        assert_eq!(summary.ticks, summary.frames);
        assert_eq!(summary.clamped_frames, 0);
        assert!(summary.jumps >= 1);
    }

    #[test]
    fn scripted_run_resaves_world_round_trip() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let script_path = temp.path().join("script.json");
        fs::write(&script_path, r#"[{"frames": 30, "hold": ["right"]}]"#).expect("script");
        let out = temp.path().join("out.json");
        let wiring = AppWiring {
            input_script: Some(script_path),
            save_out: Some(out.clone()),
            frame_dt: LoopConfig::default().fixed_dt() * 3,
            ..wiring_in(&temp)
        };

        let summary = run_headless(&wiring).expect("run");

        assert_eq!(summary.frames, 30);
        assert_eq!(summary.ticks, 90);
        assert_eq!(load_world(&out).expect("reload"), default_world());
    }

    #[test]
    fn stalled_frames_are_counted_as_clamped() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let script_path = temp.path().join("script.json");
        fs::write(&script_path, r#"[{"frames": 2}]"#).expect("script");
        let wiring = AppWiring {
            input_script: Some(script_path),
            frame_dt: Duration::from_millis(400),
            ..wiring_in(&temp)
        };

        let summary = run_headless(&wiring).expect("run");

        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.clamped_frames, 2);
        assert!(summary.dropped_backlog > Duration::ZERO);
    }

    #[test]
    fn invalid_physics_file_is_a_startup_error() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let physics = temp.path().join("physics.json");
        fs::write(&physics, r#"{"gravity": -5.0}"#).expect("physics");
        let wiring = AppWiring {
            physics_file: Some(physics),
            ..wiring_in(&temp)
        };

        assert!(matches!(
            run_headless(&wiring),
            Err(RunError::Startup(StartupError::Physics(_)))
        ));
    }
}
