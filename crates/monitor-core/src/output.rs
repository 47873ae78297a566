//! Plain and CSV line rendering.
//!
//! Every line starts with a local timestamp and the host name, followed by the
//! resource and either a scalar value or an `index, value` pair:
//!
//! ```text
//! plain: 2024-03-01 12:00:00.125 gpu01 monitor.gpu.temp [0] 45.0
//! csv:   2024-03-01 12:00:00.125,gpu01,gpu.temp,0,45.0
//! ```

use chrono::NaiveDateTime;
use sysinfo::System;

use crate::config::Resource;
use crate::fmt::{format_float, format_size, format_timestamp};

/// Prefix for the plain-format resource field.
pub const APP_NAME: &str = "monitor";

/// Line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Plain,
    Csv,
}

/// A single measured value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f64),
    /// Absolute byte count; eligible for human-readable scaling.
    Bytes(u64),
}

/// One output line's payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Scalar(Value),
    /// Per-core or per-GPU value.
    Indexed(u32, Value),
}

/// Renders samples for one resource into lines (without trailing newline).
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    format: OutputFormat,
    hostname: String,
    resource: String,
    human_readable: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, resource: Resource) -> Self {
        Self {
            format,
            hostname: local_hostname(),
            resource: resource.name(),
            human_readable: false,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Scale byte values with K/M/G/T suffixes.
    pub fn with_human_readable(mut self, human_readable: bool) -> Self {
        self.human_readable = human_readable;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// CSV header line, or `None` for plain output.
    pub fn header(&self, index_column: Option<&str>, value_column: &str) -> Option<String> {
        if self.format != OutputFormat::Csv {
            return None;
        }
        Some(match index_column {
            Some(index) => format!("timestamp,hostname,resource,{index},{value_column}"),
            None => format!("timestamp,hostname,resource,{value_column}"),
        })
    }

    pub fn render(&self, ts: &NaiveDateTime, sample: &Sample) -> String {
        let ts = format_timestamp(ts);
        match (self.format, sample) {
            (OutputFormat::Plain, Sample::Scalar(value)) => format!(
                "{ts} {} {APP_NAME}.{} {}",
                self.hostname,
                self.resource,
                self.value(value)
            ),
            (OutputFormat::Plain, Sample::Indexed(index, value)) => format!(
                "{ts} {} {APP_NAME}.{} [{index}] {}",
                self.hostname,
                self.resource,
                self.value(value)
            ),
            (OutputFormat::Csv, Sample::Scalar(value)) => format!(
                "{ts},{},{},{}",
                self.hostname,
                self.resource,
                self.value(value)
            ),
            (OutputFormat::Csv, Sample::Indexed(index, value)) => format!(
                "{ts},{},{},{index},{}",
                self.hostname,
                self.resource,
                self.value(value)
            ),
        }
    }

    fn value(&self, value: &Value) -> String {
        match *value {
            Value::Float(v) => format_float(v),
            Value::Bytes(b) if self.human_readable => format_size(b as f64),
            Value::Bytes(b) => b.to_string(),
        }
    }
}

/// Host name of this machine, or `localhost` if it cannot be determined.
pub fn local_hostname() -> String {
    System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CpuResource;
    use crate::metric::MetricKind;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 125)
            .unwrap()
    }

    fn formatter(format: OutputFormat, resource: Resource) -> OutputFormatter {
        OutputFormatter::new(format, resource).with_hostname("gpu01")
    }

    #[test]
    fn test_plain_scalar() {
        let f = formatter(OutputFormat::Plain, Resource::Cpu(CpuResource::Percent));
        assert_eq!(
            f.render(&ts(), &Sample::Scalar(Value::Float(12.5))),
            "2024-03-01 12:00:00.125 gpu01 monitor.cpu.percent 12.5"
        );
        assert_eq!(f.header(None, "cpu_percent"), None);
    }

    #[test]
    fn test_plain_indexed() {
        let f = formatter(OutputFormat::Plain, Resource::Gpu(MetricKind::Temp));
        assert_eq!(
            f.render(&ts(), &Sample::Indexed(1, Value::Float(45.0))),
            "2024-03-01 12:00:00.125 gpu01 monitor.gpu.temp [1] 45.0"
        );
    }

    #[test]
    fn test_csv_lines_and_header() {
        let f = formatter(OutputFormat::Csv, Resource::Gpu(MetricKind::Power));
        assert_eq!(
            f.header(Some("gpu_id"), "gpu_power").unwrap(),
            "timestamp,hostname,resource,gpu_id,gpu_power"
        );
        assert_eq!(
            f.render(&ts(), &Sample::Indexed(0, Value::Float(42.0))),
            "2024-03-01 12:00:00.125,gpu01,gpu.power,0,42.0"
        );

        let f = formatter(OutputFormat::Csv, Resource::Memory);
        assert_eq!(
            f.header(None, "memory_percent").unwrap(),
            "timestamp,hostname,resource,memory_percent"
        );
        assert_eq!(
            f.render(&ts(), &Sample::Scalar(Value::Float(50.0))),
            "2024-03-01 12:00:00.125,gpu01,memory,50.0"
        );
    }

    #[test]
    fn test_bytes_raw_and_human_readable() {
        let f = formatter(OutputFormat::Plain, Resource::Memory);
        let sample = Sample::Scalar(Value::Bytes(1536));
        assert!(f.render(&ts(), &sample).ends_with(" monitor.memory 1536"));

        let f = f.with_human_readable(true);
        assert!(f.render(&ts(), &sample).ends_with(" monitor.memory 1.50K"));
    }

    #[test]
    fn test_local_hostname_not_empty() {
        assert!(!local_hostname().is_empty());
    }
}
