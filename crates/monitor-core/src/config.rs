//! Sampling configuration.
//!
//! A `SampleConfig` is assembled once at startup from command-line options and
//! validated before any collector is built; nothing mutates it afterwards.

use std::time::Duration;

use crate::collector::TempSensor;
use crate::error::ConfigError;
use crate::metric::MetricKind;
use crate::output::OutputFormat;

/// How memory values are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Percent,
    /// Absolute byte counts.
    Actual,
}

/// CPU sub-resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuResource {
    Percent,
    Memory,
}

/// What to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Cpu(CpuResource),
    /// System-wide main memory.
    Memory,
    Gpu(MetricKind),
}

impl Resource {
    /// Dotted name used as the CSV `resource` column, e.g. `cpu.percent`.
    pub fn name(&self) -> String {
        match self {
            Resource::Cpu(CpuResource::Percent) => "cpu.percent".to_string(),
            Resource::Cpu(CpuResource::Memory) => "cpu.memory".to_string(),
            Resource::Memory => "memory".to_string(),
            Resource::Gpu(kind) => format!("gpu.{kind}"),
        }
    }
}

/// Validated sampling options.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub resource: Resource,
    /// Seconds between samples.
    pub interval_secs: f64,
    pub display: DisplayMode,
    pub format: OutputFormat,
    pub no_header: bool,
    pub human_readable: bool,
    /// Scope CPU/memory to this process tree instead of the whole system.
    pub pid: Option<u32>,
    pub all_cores: bool,
    pub total: bool,
    /// ROCm temperature sensor for `gpu temp`.
    pub sensor: TempSensor,
}

impl SampleConfig {
    /// Defaults: one-second interval, percent display, plain output.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            interval_secs: 1.0,
            display: DisplayMode::default(),
            format: OutputFormat::default(),
            no_header: false,
            human_readable: false,
            pid: None,
            all_cores: false,
            total: false,
            sensor: TempSensor::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    /// Whether readings are emitted per device/core with an index column.
    pub fn is_indexed(&self) -> bool {
        match self.resource {
            Resource::Gpu(_) => true,
            Resource::Cpu(CpuResource::Percent) => self.all_cores,
            _ => false,
        }
    }

    /// CSV columns after `timestamp,hostname,resource`: optional index column, value column.
    pub fn csv_columns(&self) -> (Option<&'static str>, String) {
        match self.resource {
            Resource::Cpu(CpuResource::Percent) => (
                self.all_cores.then_some("cpu_id"),
                "cpu_percent".to_string(),
            ),
            Resource::Cpu(CpuResource::Memory) => (
                None,
                match self.display {
                    DisplayMode::Percent => "memory_percent",
                    DisplayMode::Actual => "memory_actual",
                }
                .to_string(),
            ),
            Resource::Memory => (
                None,
                match self.display {
                    DisplayMode::Percent => "memory_percent",
                    DisplayMode::Actual => "memory_used",
                }
                .to_string(),
            ),
            Resource::Gpu(kind) => (Some("gpu_id"), format!("gpu_{kind}")),
        }
    }

    /// Rejects inapplicable or mutually exclusive option combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.interval_secs.is_finite() && self.interval_secs > 0.0) {
            return Err(ConfigError::InvalidInterval(self.interval_secs));
        }
        if self.no_header && self.format != OutputFormat::Csv {
            return Err(ConfigError::NoHeaderWithoutCsv);
        }
        if self.human_readable && self.display != DisplayMode::Actual {
            return Err(ConfigError::HumanReadableWithoutActual);
        }
        if self.all_cores && self.pid.is_some() {
            return Err(ConfigError::PerCoreWithPid);
        }
        if self.all_cores && self.total {
            return Err(ConfigError::PerCoreWithTotal);
        }

        let not_applicable = |option: &'static str| {
            Err(ConfigError::NotApplicable {
                option,
                resource: self.resource.name(),
            })
        };

        let is_cpu_percent = self.resource == Resource::Cpu(CpuResource::Percent);
        if !is_cpu_percent && self.all_cores {
            return not_applicable("--all-cores");
        }
        if !is_cpu_percent && self.total {
            return not_applicable("--total");
        }
        if self.sensor != TempSensor::default() && self.resource != Resource::Gpu(MetricKind::Temp)
        {
            return not_applicable("--sensor");
        }
        match self.resource {
            Resource::Cpu(CpuResource::Percent) if self.display == DisplayMode::Actual => {
                not_applicable("--actual")
            }
            Resource::Memory if self.pid.is_some() => not_applicable("PID"),
            Resource::Gpu(_) if self.pid.is_some() => not_applicable("PID"),
            Resource::Gpu(_) if self.display == DisplayMode::Actual => not_applicable("--actual"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_percent() -> SampleConfig {
        SampleConfig::new(Resource::Cpu(CpuResource::Percent))
    }

    #[test]
    fn test_defaults_are_valid() {
        for resource in [
            Resource::Cpu(CpuResource::Percent),
            Resource::Cpu(CpuResource::Memory),
            Resource::Memory,
            Resource::Gpu(MetricKind::Power),
        ] {
            assert_eq!(SampleConfig::new(resource).validate(), Ok(()));
        }
    }

    #[test]
    fn test_interval_must_be_positive() {
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = SampleConfig {
                interval_secs: secs,
                ..cpu_percent()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidInterval(_))
            ));
        }
        let config = SampleConfig {
            interval_secs: 0.25,
            ..cpu_percent()
        };
        assert_eq!(config.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_no_header_requires_csv() {
        let config = SampleConfig {
            no_header: true,
            ..cpu_percent()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoHeaderWithoutCsv));

        let config = SampleConfig {
            format: OutputFormat::Csv,
            ..config
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_human_readable_requires_actual() {
        let config = SampleConfig {
            human_readable: true,
            ..SampleConfig::new(Resource::Memory)
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::HumanReadableWithoutActual)
        );

        let config = SampleConfig {
            display: DisplayMode::Actual,
            ..config
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_all_cores_excludes_pid_and_total() {
        let config = SampleConfig {
            all_cores: true,
            pid: Some(1),
            ..cpu_percent()
        };
        assert_eq!(config.validate(), Err(ConfigError::PerCoreWithPid));

        let config = SampleConfig {
            all_cores: true,
            total: true,
            ..cpu_percent()
        };
        assert_eq!(config.validate(), Err(ConfigError::PerCoreWithTotal));
    }

    #[test]
    fn test_options_not_applicable_to_resource() {
        let config = SampleConfig {
            pid: Some(42),
            ..SampleConfig::new(Resource::Gpu(MetricKind::Temp))
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotApplicable { option: "PID", .. })
        ));

        let config = SampleConfig {
            all_cores: true,
            ..SampleConfig::new(Resource::Memory)
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotApplicable {
                option: "--all-cores",
                ..
            })
        ));

        let config = SampleConfig {
            sensor: TempSensor::Edge,
            ..SampleConfig::new(Resource::Gpu(MetricKind::Power))
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_csv_columns() {
        assert_eq!(cpu_percent().csv_columns(), (None, "cpu_percent".to_string()));
        let per_core = SampleConfig {
            all_cores: true,
            ..cpu_percent()
        };
        assert_eq!(
            per_core.csv_columns(),
            (Some("cpu_id"), "cpu_percent".to_string())
        );
        let actual = SampleConfig {
            display: DisplayMode::Actual,
            ..SampleConfig::new(Resource::Cpu(CpuResource::Memory))
        };
        assert_eq!(actual.csv_columns().1, "memory_actual");
        let used = SampleConfig {
            display: DisplayMode::Actual,
            ..SampleConfig::new(Resource::Memory)
        };
        assert_eq!(used.csv_columns().1, "memory_used");
        assert_eq!(
            SampleConfig::new(Resource::Gpu(MetricKind::Memory)).csv_columns(),
            (Some("gpu_id"), "gpu_memory".to_string())
        );
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(Resource::Cpu(CpuResource::Memory).name(), "cpu.memory");
        assert_eq!(Resource::Memory.name(), "memory");
        assert_eq!(Resource::Gpu(MetricKind::Temp).name(), "gpu.temp");
    }
}
