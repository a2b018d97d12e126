//! Pipeline driver: wires the adaptation engine, transport multiplexer,
//! and playback buffer together into one per-segment loop, and records
//! the outcome of every fetch into an incrementally-persisted run report.

mod config;
mod driver;
mod error;
mod jump;
mod recorder;

pub use config::RunConfig;
pub use driver::PipelineDriver;
pub use error::PipelineError;
pub use jump::JumpScenario;
pub use recorder::{RunReport, SegmentRecord};
