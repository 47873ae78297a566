//! `nvidia-smi` providers.
//!
//! Queries run in `csv,noheader,nounits` mode, so every output line is
//! `index, value[, value]` separated by comma-space.

use super::{ExternalProvider, parse_index, parse_number};
use crate::error::ParseError;
use crate::metric::{MetricKind, Readings};

/// `nvidia-smi` query for one metric kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NvidiaProvider {
    kind: MetricKind,
    command: String,
}

impl NvidiaProvider {
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            command: default_command(kind),
        }
    }

    /// Replaces the command line, keeping the parsing rule.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

/// `--query-gpu` fields, index first.
fn query_fields(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Percent => "index,utilization.gpu",
        MetricKind::Memory => "index,memory.used,memory.total",
        MetricKind::Power => "index,power.draw",
        MetricKind::Temp => "index,temperature.gpu",
    }
}

fn default_command(kind: MetricKind) -> String {
    format!(
        "nvidia-smi --format=csv,noheader,nounits --query-gpu={} -c1",
        query_fields(kind)
    )
}

impl ExternalProvider for NvidiaProvider {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn command(&self) -> &str {
        &self.command
    }

    fn parse_text(&self, text: &str) -> Result<Readings, ParseError> {
        let expected = match self.kind {
            MetricKind::Memory => 3,
            _ => 2,
        };

        let mut readings = Readings::new();
        for (i, line) in text.trim().split('\n').enumerate() {
            let lineno = i + 1;
            let fields: Vec<&str> = line.trim().split(", ").collect();
            if fields.len() != expected {
                return Err(ParseError::new(format!(
                    "line {lineno}: expected {expected} fields, found {}",
                    fields.len()
                )));
            }

            let index = parse_index(fields[0], lineno)?;
            let value = match self.kind {
                // Reported as a fraction of total, not a percentage.
                MetricKind::Memory => {
                    let used = parse_number(fields[1], lineno)?;
                    let total = parse_number(fields[2], lineno)?;
                    if total == 0.0 {
                        return Err(ParseError::new(format!(
                            "line {lineno}: memory total is zero"
                        )));
                    }
                    used / total
                }
                _ => parse_number(fields[1], lineno)?,
            };
            readings.insert(index, value);
        }
        Ok(readings)
    }
}
