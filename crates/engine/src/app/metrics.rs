use std::time::Duration;

/// Rates and frame statistics over one reporting window of the host clock.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    /// Frames in the window whose backlog was dropped.
    pub clamped_frames: u32,
}

/// What one `advance_frame` call did, as seen by the metrics window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameSample {
    pub(crate) raw_dt: Duration,
    pub(crate) ticks: u32,
    pub(crate) clamped: bool,
}

/// Folds frame samples into windows of the host clock. The clock is whatever
/// the host advances, so headless runs report the rates they simulate.
#[derive(Debug)]
pub(crate) struct MetricsWindow {
    length: Duration,
    opened_at: Duration,
    totals: WindowTotals,
}

#[derive(Debug, Default)]
struct WindowTotals {
    frames: u32,
    ticks: u32,
    clamped_frames: u32,
    frame_time: Duration,
    worst_frame: Duration,
}

impl WindowTotals {
    fn add(&mut self, sample: FrameSample) {
        self.frames = self.frames.saturating_add(1);
        self.ticks = self.ticks.saturating_add(sample.ticks);
        self.clamped_frames = self.clamped_frames.saturating_add(u32::from(sample.clamped));
        self.frame_time = self.frame_time.saturating_add(sample.raw_dt);
        self.worst_frame = self.worst_frame.max(sample.raw_dt);
    }

    fn summarize(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time.as_secs_f32() * 1000.0 / frames as f32,
        };
        LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            clamped_frames: self.clamped_frames,
        }
    }
}

impl MetricsWindow {
    pub(crate) fn new(length: Duration) -> Self {
        Self {
            length,
            opened_at: Duration::ZERO,
            totals: WindowTotals::default(),
        }
    }

    /// Adds a frame that ended at `clock`. Returns the window's snapshot when
    /// that frame closes it.
    pub(crate) fn push(
        &mut self,
        sample: FrameSample,
        clock: Duration,
    ) -> Option<LoopMetricsSnapshot> {
        self.totals.add(sample);
        let elapsed = clock.saturating_sub(self.opened_at);
        if elapsed < self.length {
            return None;
        }
        let snapshot = self.totals.summarize(elapsed);
        self.opened_at = clock;
        self.totals = WindowTotals::default();
        Some(snapshot)
    }
}
