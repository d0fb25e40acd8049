//! Instrumentation shared by the Tabula binaries: logging setup and
//! stage-level memory measurement.

pub mod logging;
pub mod memory;

pub use logging::{LogFormat, LoggingError, enable_logging};
pub use memory::{
    MeasurementRecorder, MemoryError, MemorySnapshot, StageMeasurement, StageStart,
    capture_rss_bytes, rss_delta,
};
