//! GPU telemetry from vendor command-line tools (`nvidia-smi`, `rocm-smi`).
//!
//! Each [`ExternalProvider`] owns one command line and the rule that turns its
//! text output into a [`MetricRecord`] for a single metric kind. The
//! [`ProviderRegistry`] picks the vendor present on this machine and maps
//! `(vendor, kind)` to the right provider.

mod nvidia;
mod registry;
mod rocm;

pub use nvidia::NvidiaProvider;
pub use registry::ProviderRegistry;
pub use rocm::{RocmProvider, TempSensor};

use std::fmt;

use crate::collector::traits::CommandRunner;
use crate::error::{Error, ParseError};
use crate::metric::{MetricKind, MetricRecord, Readings};

/// GPU telemetry toolchain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Nvidia,
    Rocm,
}

impl Vendor {
    /// Probe order used by vendor detection.
    pub const ALL: [Vendor; 2] = [Vendor::Nvidia, Vendor::Rocm];

    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::Nvidia => "nvidia",
            Vendor::Rocm => "rocm",
        }
    }

    /// The binary whose presence identifies this vendor.
    pub fn program(self) -> &'static str {
        match self {
            Vendor::Nvidia => "nvidia-smi",
            Vendor::Rocm => "rocm-smi",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Vendor::Nvidia => 0,
            Vendor::Rocm => 1,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces one metric kind's readings from one vendor tool's output.
pub trait ExternalProvider {
    /// The metric kind this provider reports.
    fn kind(&self) -> MetricKind;

    /// The full shell command line to execute.
    fn command(&self) -> &str;

    /// Parses raw command output into readings; all-or-nothing.
    fn parse_text(&self, text: &str) -> Result<Readings, ParseError>;

    /// Parses command output into a record, naming the command on failure.
    fn parse(&self, text: &str) -> Result<MetricRecord, Error> {
        self.parse_text(text)
            .map(|readings| MetricRecord::new(self.kind(), readings))
            .map_err(|source| Error::Parse {
                command: self.command().to_string(),
                source,
            })
    }

    /// Runs the command to completion and parses its standard output.
    fn collect(&self, runner: &dyn CommandRunner) -> Result<MetricRecord, Error> {
        let stdout = runner.run(self.command())?;
        let text = String::from_utf8(stdout).map_err(|e| Error::Parse {
            command: self.command().to_string(),
            source: ParseError::new(format!("output is not valid UTF-8: {e}")),
        })?;
        self.parse(&text)
    }
}

/// Parses a numeric field the way the vendor tools print them.
fn parse_number(field: &str, line: usize) -> Result<f64, ParseError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|e| ParseError::new(format!("line {line}: invalid number '{field}': {e}")))
}

/// Parses a device index field, truncating fractional parts.
fn parse_index(field: &str, line: usize) -> Result<u32, ParseError> {
    let value = parse_number(field, line)?;
    if !value.is_finite() || value < 0.0 || value >= u32::MAX as f64 {
        return Err(ParseError::new(format!(
            "line {line}: invalid device index '{field}'"
        )));
    }
    Ok(value.trunc() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockResponse, MockRunner};

    #[test]
    fn test_parse_index_truncates() {
        assert_eq!(parse_index("1.9", 1), Ok(1));
        assert_eq!(parse_index("3", 1), Ok(3));
        assert!(parse_index("-1", 1).is_err());
        assert!(parse_index("gpu0", 1).is_err());
    }

    #[test]
    fn test_collect_rejects_non_utf8_output() {
        let provider = NvidiaProvider::new(MetricKind::Percent);
        let runner = MockRunner::new()
            .with_response(provider.command(), MockResponse::Bytes(vec![0x30, 0xff, 0xfe]));
        let err = provider.collect(&runner).unwrap_err();
        match err {
            Error::Parse { command, .. } => assert_eq!(command, provider.command()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_collect_propagates_missing_tool() {
        let provider = RocmProvider::new(MetricKind::Power);
        let runner = MockRunner::new();
        assert!(matches!(
            provider.collect(&runner),
            Err(Error::CommandNotFound { .. })
        ));
    }
}
