//! Command-line surface.
//!
//! ```text
//! monitor cpu percent [PID] [-t|-a]
//! monitor cpu memory [PID] [--percent|--actual] [-H]
//! monitor memory [--percent|--actual] [-H]
//! monitor gpu {percent|memory|power|temp}
//! ```
//!
//! Every leaf command also takes `-s/--sample-rate`, `--plain|--csv` and
//! `--no-header`. Flag pairs that exclude each other are clap conflicts; rules
//! spanning several options are left to [`SampleConfig::validate`].

use clap::{Args, Parser, Subcommand};

use monitor_core::collector::TempSensor;
use monitor_core::{CpuResource, DisplayMode, MetricKind, OutputFormat, Resource, SampleConfig};

/// Samples CPU, memory and GPU telemetry at a fixed interval.
#[derive(Parser, Debug)]
#[command(name = "monitor", about = "Cross-platform resource monitor", version)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// CPU usage, system-wide or for a process tree.
    Cpu {
        #[command(subcommand)]
        command: CpuCommand,
    },
    /// System-wide memory usage.
    Memory {
        #[command(flatten)]
        display: DisplayArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// GPU telemetry via nvidia-smi or rocm-smi.
    Gpu {
        #[command(subcommand)]
        command: GpuCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum CpuCommand {
    /// CPU utilisation percent.
    Percent {
        /// Report this process and its descendants instead of the whole system.
        pid: Option<u32>,
        /// Report a single system-wide total (default).
        #[arg(short, long, conflicts_with = "all_cores")]
        total: bool,
        /// Report one line per core.
        #[arg(short, long)]
        all_cores: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Memory used, system-wide or by a process tree.
    Memory {
        /// Report this process and its descendants instead of the whole system.
        pid: Option<u32>,
        #[command(flatten)]
        display: DisplayArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum GpuCommand {
    /// Utilisation percent per GPU.
    Percent {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Memory in use per GPU.
    Memory {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Power draw in watts per GPU.
    Power {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Temperature in degrees Celsius per GPU.
    Temp {
        /// rocm-smi sensor to report (edge, junction or memory).
        #[arg(long, default_value = "junction")]
        sensor: TempSensor,
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Percent vs. absolute memory display.
#[derive(Args, Debug)]
pub struct DisplayArgs {
    /// Show memory as a percentage of physical memory (default).
    #[arg(long, conflicts_with = "actual")]
    pub percent: bool,

    /// Show memory as a byte count.
    #[arg(long)]
    pub actual: bool,

    /// Scale byte counts with K/M/G/T suffixes (with --actual).
    #[arg(short = 'H', long)]
    pub human_readable: bool,
}

/// Options shared by every sampling command.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Seconds between samples.
    #[arg(
        short,
        long,
        default_value_t = 1.0,
        env = "MONITOR_SAMPLE_RATE",
        value_name = "SECONDS"
    )]
    pub sample_rate: f64,

    /// Log-style output lines (default).
    #[arg(long, conflicts_with = "csv")]
    pub plain: bool,

    /// Comma-separated output with a header row.
    #[arg(long)]
    pub csv: bool,

    /// Omit the CSV header row.
    #[arg(long)]
    pub no_header: bool,
}

impl Cli {
    /// Builds the (not yet validated) sampling configuration.
    pub fn sample_config(&self) -> SampleConfig {
        match &self.command {
            Command::Cpu {
                command:
                    CpuCommand::Percent {
                        pid,
                        total,
                        all_cores,
                        output,
                    },
            } => SampleConfig {
                pid: *pid,
                total: *total,
                all_cores: *all_cores,
                ..output.apply(SampleConfig::new(Resource::Cpu(CpuResource::Percent)))
            },
            Command::Cpu {
                command:
                    CpuCommand::Memory {
                        pid,
                        display,
                        output,
                    },
            } => SampleConfig {
                pid: *pid,
                ..display.apply(output.apply(SampleConfig::new(Resource::Cpu(
                    CpuResource::Memory,
                ))))
            },
            Command::Memory { display, output } => {
                display.apply(output.apply(SampleConfig::new(Resource::Memory)))
            }
            Command::Gpu { command } => match command {
                GpuCommand::Percent { output } => {
                    output.apply(SampleConfig::new(Resource::Gpu(MetricKind::Percent)))
                }
                GpuCommand::Memory { output } => {
                    output.apply(SampleConfig::new(Resource::Gpu(MetricKind::Memory)))
                }
                GpuCommand::Power { output } => {
                    output.apply(SampleConfig::new(Resource::Gpu(MetricKind::Power)))
                }
                GpuCommand::Temp { sensor, output } => SampleConfig {
                    sensor: *sensor,
                    ..output.apply(SampleConfig::new(Resource::Gpu(MetricKind::Temp)))
                },
            },
        }
    }
}

impl DisplayArgs {
    fn apply(&self, config: SampleConfig) -> SampleConfig {
        SampleConfig {
            display: if self.actual {
                DisplayMode::Actual
            } else {
                DisplayMode::Percent
            },
            human_readable: self.human_readable,
            ..config
        }
    }
}

impl OutputArgs {
    fn apply(&self, config: SampleConfig) -> SampleConfig {
        SampleConfig {
            interval_secs: self.sample_rate,
            format: if self.csv {
                OutputFormat::Csv
            } else {
                OutputFormat::Plain
            },
            no_header: self.no_header,
            ..config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use monitor_core::ConfigError;

    fn config(args: &[&str]) -> SampleConfig {
        Cli::try_parse_from(args.iter().copied())
            .unwrap()
            .sample_config()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cpu_percent_per_core_csv() {
        let c = config(&["monitor", "cpu", "percent", "-a", "--csv", "-s", "0.5"]);
        assert_eq!(c.resource, Resource::Cpu(CpuResource::Percent));
        assert!(c.all_cores);
        assert_eq!(c.format, OutputFormat::Csv);
        assert_eq!(c.interval_secs, 0.5);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn test_cpu_memory_for_pid() {
        let c = config(&["monitor", "cpu", "memory", "1234", "--actual", "-H"]);
        assert_eq!(c.resource, Resource::Cpu(CpuResource::Memory));
        assert_eq!(c.pid, Some(1234));
        assert_eq!(c.display, DisplayMode::Actual);
        assert!(c.human_readable);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn test_gpu_temp_sensor() {
        let c = config(&["monitor", "gpu", "temp", "--sensor", "edge"]);
        assert_eq!(c.resource, Resource::Gpu(MetricKind::Temp));
        assert_eq!(c.sensor, TempSensor::Edge);

        let c = config(&["monitor", "gpu", "temp"]);
        assert_eq!(c.sensor, TempSensor::Junction);
    }

    #[test]
    fn test_global_verbosity_after_subcommand() {
        let cli = Cli::try_parse_from(["monitor", "memory", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_exclusive_flags_rejected_by_parser() {
        assert!(Cli::try_parse_from(["monitor", "memory", "--percent", "--actual"]).is_err());
        assert!(Cli::try_parse_from(["monitor", "gpu", "power", "--plain", "--csv"]).is_err());
        assert!(Cli::try_parse_from(["monitor", "cpu", "percent", "-t", "-a"]).is_err());
    }

    #[test]
    fn test_cross_option_rules_left_to_validation() {
        let c = config(&["monitor", "memory", "--no-header"]);
        assert_eq!(c.validate(), Err(ConfigError::NoHeaderWithoutCsv));

        let c = config(&["monitor", "cpu", "percent", "42", "--all-cores"]);
        assert_eq!(c.validate(), Err(ConfigError::PerCoreWithPid));

        let c = config(&["monitor", "memory", "-H"]);
        assert_eq!(c.validate(), Err(ConfigError::HumanReadableWithoutActual));
    }
}
