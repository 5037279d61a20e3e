mod loop_runner;
mod metrics;

pub use loop_runner::{FrameReport, HostLoop, InterpolatedFrame, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
