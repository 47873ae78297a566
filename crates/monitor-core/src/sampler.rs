//! The fixed-delay sampling loop.
//!
//! ```text
//!   validate ─► prime ─► header? ─┬─► sleep ─► sample ─► write ─┐
//!                                 └─────────────────────────────┘
//! ```
//!
//! A tick blocks the start of the next sleep, so slow collection or output
//! delays the schedule rather than skipping ticks. The loop ends when the stop
//! flag is cleared, on the first collection or write error, or after an
//! optional tick limit.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info, trace};

use crate::collector::{CommandRunner, HostCollector, ProviderRegistry, SystemSource};
use crate::config::{CpuResource, DisplayMode, Resource, SampleConfig};
use crate::error::Error;
use crate::metric::MetricKind;
use crate::output::{OutputFormatter, Sample, Value};

/// Granularity of the interruptible sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Produces the samples for one tick.
pub trait SampleSource {
    /// Called once before the first sleep.
    fn prime(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn sample(&mut self) -> Result<Vec<Sample>, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostMetric {
    CpuTotal,
    CpuPerCore,
    MemoryPercent,
    MemoryUsed,
}

/// CPU and memory samples from a [`HostCollector`].
pub struct HostSource<S: SystemSource> {
    collector: HostCollector<S>,
    metric: HostMetric,
    pid: Option<u32>,
}

impl<S: SystemSource> HostSource<S> {
    /// CPU percent, system-wide or for a process tree.
    pub fn cpu_percent(system: S, pid: Option<u32>) -> Self {
        Self::new(system, HostMetric::CpuTotal, pid)
    }

    /// System-wide CPU percent, one sample per core.
    pub fn cpu_percent_per_core(system: S) -> Self {
        Self::new(system, HostMetric::CpuPerCore, None)
    }

    pub fn memory_percent(system: S, pid: Option<u32>) -> Self {
        Self::new(system, HostMetric::MemoryPercent, pid)
    }

    /// Memory in use as a byte count.
    pub fn memory_used(system: S, pid: Option<u32>) -> Self {
        Self::new(system, HostMetric::MemoryUsed, pid)
    }

    fn new(system: S, metric: HostMetric, pid: Option<u32>) -> Self {
        Self {
            collector: HostCollector::new(system),
            metric,
            pid,
        }
    }

    pub fn collector(&self) -> &HostCollector<S> {
        &self.collector
    }
}

impl<S: SystemSource> SampleSource for HostSource<S> {
    fn prime(&mut self) -> Result<(), Error> {
        let needs_baseline = matches!(self.metric, HostMetric::CpuTotal | HostMetric::CpuPerCore);
        if needs_baseline || self.pid.is_some() {
            self.collector.prime(self.pid)?;
        }
        Ok(())
    }

    fn sample(&mut self) -> Result<Vec<Sample>, Error> {
        let samples = match self.metric {
            HostMetric::CpuTotal => {
                vec![Sample::Scalar(Value::Float(self.collector.cpu_percent(self.pid)?))]
            }
            HostMetric::CpuPerCore => self
                .collector
                .cpu_percent_per_core()
                .into_iter()
                .enumerate()
                .map(|(core, percent)| Sample::Indexed(core as u32, Value::Float(percent)))
                .collect(),
            HostMetric::MemoryPercent => {
                vec![Sample::Scalar(Value::Float(self.collector.memory_percent(self.pid)?))]
            }
            HostMetric::MemoryUsed => {
                vec![Sample::Scalar(Value::Bytes(self.collector.memory_used(self.pid)?))]
            }
        };
        Ok(samples)
    }
}

/// Per-GPU samples of one metric kind from the detected vendor tool.
pub struct GpuSource<R: CommandRunner> {
    registry: ProviderRegistry<R>,
    kind: MetricKind,
}

impl<R: CommandRunner> GpuSource<R> {
    pub fn new(registry: ProviderRegistry<R>, kind: MetricKind) -> Self {
        Self { registry, kind }
    }

    pub fn registry(&self) -> &ProviderRegistry<R> {
        &self.registry
    }
}

impl<R: CommandRunner> SampleSource for GpuSource<R> {
    /// Detects the vendor up front so a missing tool fails before the first sleep.
    fn prime(&mut self) -> Result<(), Error> {
        self.registry.detect_vendor().map(drop)
    }

    fn sample(&mut self) -> Result<Vec<Sample>, Error> {
        let readings = self.registry.telemetry(self.kind)?;
        Ok(readings
            .into_iter()
            .map(|(index, value)| Sample::Indexed(index, Value::Float(value)))
            .collect())
    }
}

/// Drives a [`SampleSource`] at a fixed delay and writes formatted lines.
pub struct Sampler<W: Write> {
    source: Box<dyn SampleSource>,
    formatter: OutputFormatter,
    header: Option<String>,
    interval: Duration,
    out: W,
    tick_limit: Option<u64>,
}

impl<W: Write> Sampler<W> {
    /// Validates `config` and wraps an already-built source.
    pub fn new(
        config: &SampleConfig,
        source: Box<dyn SampleSource>,
        out: W,
    ) -> Result<Self, Error> {
        config.validate()?;

        let formatter = OutputFormatter::new(config.format, config.resource)
            .with_human_readable(config.human_readable);
        let header = if config.no_header {
            None
        } else {
            let (index_column, value_column) = config.csv_columns();
            formatter.header(index_column, &value_column)
        };

        Ok(Self {
            source,
            formatter,
            header,
            interval: config.interval(),
            out,
            tick_limit: None,
        })
    }

    /// Validates `config`, then builds the source it selects.
    ///
    /// Nothing is queried from `system` or `runner` here; an invalid
    /// configuration is rejected before either is touched.
    pub fn from_config<S, R>(
        config: &SampleConfig,
        system: S,
        runner: R,
        out: W,
    ) -> Result<Self, Error>
    where
        S: SystemSource + 'static,
        R: CommandRunner + 'static,
    {
        config.validate()?;

        let source: Box<dyn SampleSource> = match (config.resource, config.display) {
            (Resource::Cpu(CpuResource::Percent), _) if config.all_cores => {
                Box::new(HostSource::cpu_percent_per_core(system))
            }
            (Resource::Cpu(CpuResource::Percent), _) => {
                Box::new(HostSource::cpu_percent(system, config.pid))
            }
            (Resource::Cpu(CpuResource::Memory) | Resource::Memory, DisplayMode::Percent) => {
                Box::new(HostSource::memory_percent(system, config.pid))
            }
            (Resource::Cpu(CpuResource::Memory) | Resource::Memory, DisplayMode::Actual) => {
                Box::new(HostSource::memory_used(system, config.pid))
            }
            (Resource::Gpu(kind), _) => {
                let registry = ProviderRegistry::new(runner).with_temp_sensor(config.sensor);
                Box::new(GpuSource::new(registry, kind))
            }
        };
        debug!("sampling {} every {:?}", config.resource.name(), config.interval());
        Self::new(config, source, out)
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.formatter = self.formatter.with_hostname(hostname);
        self
    }

    /// Stops after `ticks` samples instead of running until interrupted.
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    /// Runs until `running` is cleared, an error occurs, or the tick limit is
    /// reached. Returns the number of completed ticks.
    pub fn run(&mut self, running: &AtomicBool) -> Result<u64, Error> {
        self.source.prime()?;

        if let Some(header) = &self.header {
            writeln!(self.out, "{header}")?;
            self.out.flush()?;
        }

        let mut ticks = 0u64;
        while self.tick_limit.is_none_or(|limit| ticks < limit) {
            if !sleep_while_running(self.interval, running) {
                break;
            }

            let samples = self.source.sample()?;
            let ts = Local::now().naive_local();
            for sample in &samples {
                writeln!(self.out, "{}", self.formatter.render(&ts, sample))?;
            }
            self.out.flush()?;

            ticks += 1;
            trace!("tick {}: {} lines", ticks, samples.len());
        }

        info!("sampling stopped after {} ticks", ticks);
        Ok(ticks)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Sleeps for `interval` in short slices; returns `false` if `running` was
/// cleared before the interval elapsed.
fn sleep_while_running(interval: Duration, running: &AtomicBool) -> bool {
    let mut remaining = interval;
    while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
        let sleep_time = remaining.min(SLEEP_SLICE);
        std::thread::sleep(sleep_time);
        remaining = remaining.saturating_sub(sleep_time);
    }
    running.load(Ordering::SeqCst)
}
