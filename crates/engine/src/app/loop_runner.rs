use std::time::Duration;

use tracing::{info, warn};

use crate::camera::Viewport;
use crate::geometry::{lerp, Vec2};
use crate::input::InputState;
use crate::sim::{RenderSnapshot, Simulation, TickEvents};

use super::metrics::{FrameSample, LoopMetricsSnapshot, MetricsWindow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub viewport: Viewport,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            viewport: Viewport::default(),
        }
    }
}

impl LoopConfig {
    pub fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub ticks_run: u32,
    pub dropped_backlog: Duration,
    /// Fraction of a tick left in the accumulator, in `[0, 1)`.
    pub alpha: f32,
    pub events: Vec<TickEvents>,
}

/// What a renderer draws between two committed ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedFrame {
    pub player: Vec2,
    pub camera: Vec2,
    pub snapshot: RenderSnapshot,
}

/// Fixed-timestep driver around a [`Simulation`]. Frames feed wall-clock
/// deltas in; the simulation only ever sees whole ticks of `fixed_dt`.
#[derive(Debug)]
pub struct HostLoop {
    simulation: Simulation,
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    metrics_log_interval: Duration,
    accumulator: Duration,
    clock: Duration,
    previous: RenderSnapshot,
    current: RenderSnapshot,
    metrics: MetricsWindow,
    last_metrics: Option<LoopMetricsSnapshot>,
}

impl HostLoop {
    pub fn new(simulation: Simulation, config: &LoopConfig) -> Self {
        let target_tps = config.target_tps.max(1);
        let max_frame_delta =
            normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
        let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
        let metrics_log_interval =
            normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
        info!(
            target_tps,
            max_frame_delta_ms = max_frame_delta.as_millis() as u64,
            max_ticks_per_frame,
            metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
            viewport_width = config.viewport.width,
            viewport_height = config.viewport.height,
            "loop_config"
        );

        let committed = simulation.render_snapshot();
        Self {
            simulation,
            fixed_dt: config.fixed_dt(),
            max_frame_delta,
            max_ticks_per_frame,
            metrics_log_interval,
            accumulator: Duration::ZERO,
            clock: Duration::ZERO,
            previous: committed,
            current: committed,
            metrics: MetricsWindow::new(metrics_log_interval),
            last_metrics: None,
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Editor access between frames. The committed snapshots refresh on the
    /// next tick.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn into_simulation(self) -> Simulation {
        self.simulation
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn last_metrics(&self) -> Option<LoopMetricsSnapshot> {
        self.last_metrics
    }

    pub fn metrics_log_interval(&self) -> Duration {
        self.metrics_log_interval
    }

    pub fn advance_frame(&mut self, raw_dt: Duration, input: &mut InputState) -> FrameReport {
        let frame_dt = clamp_frame_delta(raw_dt, self.max_frame_delta);
        self.clock = self.clock.saturating_add(frame_dt);
        self.accumulator = self.accumulator.saturating_add(frame_dt);

        let plan = plan_sim_steps(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        self.accumulator = plan.remaining_accumulator;
        if !plan.dropped_backlog.is_zero() {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        let dt = self.fixed_dt.as_secs_f32();
        let mut events = Vec::with_capacity(plan.ticks_to_run as usize);
        for _ in 0..plan.ticks_to_run {
            let snapshot = input.snapshot_for_tick();
            self.previous = self.current;
            events.push(self.simulation.step(&snapshot, dt));
            self.current = self.simulation.render_snapshot();
        }

        let sample = FrameSample {
            raw_dt,
            ticks: plan.ticks_to_run,
            clamped: !plan.dropped_backlog.is_zero(),
        };
        if let Some(snapshot) = self.metrics.push(sample, self.clock) {
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                worst_frame_ms = snapshot.worst_frame_ms,
                clamped_frames = snapshot.clamped_frames,
                "loop_metrics"
            );
            self.last_metrics = Some(snapshot);
        }

        FrameReport {
            ticks_run: plan.ticks_to_run,
            dropped_backlog: plan.dropped_backlog,
            alpha: self.accumulator.as_secs_f32() / self.fixed_dt.as_secs_f32(),
            events,
        }
    }

    /// Blends the last two committed ticks. Never touches simulation state.
    pub fn interpolated(&self, alpha: f32) -> InterpolatedFrame {
        let alpha = alpha.clamp(0.0, 1.0);
        let current = self.current;
        let from = current.previous_player;
        let player = Vec2::new(
            lerp(from.x as f32, current.player.x as f32, alpha),
            lerp(from.y as f32, current.player.y as f32, alpha),
        );

        // A room change outside a transition is a respawn or teleport: snap.
        let camera_from = if self.previous.room == current.room || current.transitioning {
            self.previous.camera
        } else {
            current.camera
        };
        let camera = Vec2::new(
            lerp(camera_from.x as f32, current.camera.x as f32, alpha),
            lerp(camera_from.y as f32, current.camera.y as f32, alpha),
        );

        InterpolatedFrame {
            player,
            camera,
            snapshot: current,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
