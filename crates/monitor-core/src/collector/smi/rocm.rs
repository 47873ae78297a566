//! `rocm-smi` providers.
//!
//! Output is CSV with a `device,...` header line followed by one `cardN,...`
//! line per GPU.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::{ExternalProvider, parse_index, parse_number};
use crate::error::ParseError;
use crate::metric::{MetricKind, Readings};

static READING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^card(\d),(\d+(?:\.\d+)?)").unwrap());

static TEMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^card(\d),(\d+(?:\.\d+)?),(\d+(?:\.\d+)?),(\d+(?:\.\d+)?)").unwrap()
});

const HEADER_PREFIX: &str = "device,";

/// Which of the three `--showtemp` sensors to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TempSensor {
    Edge,
    #[default]
    Junction,
    Memory,
}

impl TempSensor {
    pub fn as_str(self) -> &'static str {
        match self {
            TempSensor::Edge => "edge",
            TempSensor::Junction => "junction",
            TempSensor::Memory => "memory",
        }
    }

    /// Capture group in [`TEMP_RE`] holding this sensor's reading.
    fn group(self) -> usize {
        match self {
            TempSensor::Edge => 2,
            TempSensor::Junction => 3,
            TempSensor::Memory => 4,
        }
    }
}

impl fmt::Display for TempSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TempSensor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edge" => Ok(TempSensor::Edge),
            "junction" => Ok(TempSensor::Junction),
            "memory" => Ok(TempSensor::Memory),
            _ => Err(format!("unknown temperature sensor '{s}'")),
        }
    }
}

/// `rocm-smi` query for one metric kind.
#[derive(Debug, Clone, PartialEq)]
pub struct RocmProvider {
    kind: MetricKind,
    command: String,
    sensor: TempSensor,
}

impl RocmProvider {
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            command: default_command(kind).to_string(),
            sensor: TempSensor::default(),
        }
    }

    /// Replaces the command line, keeping the parsing rule.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Selects the temperature sensor (only meaningful for [`MetricKind::Temp`]).
    pub fn with_sensor(mut self, sensor: TempSensor) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn sensor(&self) -> TempSensor {
        self.sensor
    }
}

fn default_command(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Percent => "rocm-smi --showuse --csv",
        MetricKind::Memory => "rocm-smi --showmemuse --csv",
        MetricKind::Power => "rocm-smi --showpower --csv",
        MetricKind::Temp => "rocm-smi --showtemp --csv",
    }
}

impl ExternalProvider for RocmProvider {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn command(&self) -> &str {
        &self.command
    }

    fn parse_text(&self, text: &str) -> Result<Readings, ParseError> {
        let mut lines = text.trim().split('\n');
        let header = lines.next().unwrap_or_default().trim();
        if !header.starts_with(HEADER_PREFIX) {
            return Err(ParseError::new(format!(
                "line 1: expected header starting with '{HEADER_PREFIX}', found '{header}'"
            )));
        }

        let (pattern, value_group) = match self.kind {
            MetricKind::Temp => (&*TEMP_RE, self.sensor.group()),
            _ => (&*READING_RE, 2),
        };

        let mut readings = Readings::new();
        for (i, line) in lines.enumerate() {
            let lineno = i + 2;
            let caps = pattern.captures(line).ok_or_else(|| {
                ParseError::new(format!("line {lineno}: unexpected format '{}'", line.trim()))
            })?;
            let index = parse_index(&caps[1], lineno)?;
            let value = parse_number(&caps[value_group], lineno)?;
            readings.insert(index, value);
        }
        Ok(readings)
    }
}
