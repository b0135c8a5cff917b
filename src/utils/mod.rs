pub mod perf;

pub use perf::{FrameRate, TimingTracker};
