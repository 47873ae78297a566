//! monitor-core — telemetry acquisition and formatting for the `monitor` CLI.
//!
//! Provides:
//! - `metric` — normalized metric model (`MetricKind`, `MetricRecord`)
//! - `collector` — in-process CPU/memory collection and vendor-tool GPU providers
//! - `config` — validated sampling configuration
//! - `output` — plain and CSV line rendering
//! - `sampler` — the fixed-delay sampling loop
//! - `fmt` — shared formatting helpers (bytes, floats, timestamps)
//! - `error` — error taxonomy shared by all of the above

pub mod collector;
pub mod config;
pub mod error;
pub mod fmt;
pub mod metric;
pub mod output;
pub mod sampler;

pub use config::{CpuResource, DisplayMode, Resource, SampleConfig};
pub use error::{ConfigError, Error, ParseError};
pub use metric::{MetricKind, MetricRecord, Readings};
pub use output::{OutputFormat, OutputFormatter, Sample, Value};
pub use sampler::{GpuSource, HostSource, SampleSource, Sampler};
