//! Abstractions over the operating system to enable testing and mocking.
//!
//! `CommandRunner` covers subprocess execution for vendor tools, `SystemSource`
//! covers in-process CPU, memory and process-table accounting. Both have a real
//! implementation here and a mock in [`crate::collector::mock`].

use std::io;
use std::process::{Command, Stdio};

use sysinfo::{ProcessesToUpdate, System};
use tracing::{debug, trace};

use crate::error::Error;

/// Shell exit status meaning "command not found".
#[cfg(not(windows))]
const NOT_FOUND_STATUS: i32 = 127;
#[cfg(windows)]
const NOT_FOUND_STATUS: i32 = 9009;

/// Abstraction for running external commands.
pub trait CommandRunner {
    /// Runs `command` through the platform shell and returns its standard output.
    ///
    /// The child is waited for and its pipes closed before returning, on every path.
    fn run(&self, command: &str) -> Result<Vec<u8>, Error>;

    /// Returns `true` if `program` can be started (its exit status is ignored).
    fn probe(&self, program: &str) -> Result<bool, Error>;
}

/// Real command runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<Vec<u8>, Error> {
        trace!("running: {}", command);
        let output = Self::shell(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let code = output.status.code();
        if code == Some(NOT_FOUND_STATUS) {
            return Err(Error::CommandNotFound {
                command: command.to_string(),
            });
        }
        Err(Error::CommandFailed {
            command: command.to_string(),
            code,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn probe(&self, program: &str) -> Result<bool, Error> {
        let status = Command::new(program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) => {
                debug!("probe {}: found (exit {:?})", program, status.code());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("probe {}: not found", program);
                Ok(false)
            }
            Err(source) => Err(Error::Spawn {
                command: program.to_string(),
                source,
            }),
        }
    }
}

/// CPU utilization since the previous refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuUsage {
    /// System-wide percent.
    pub total: f64,
    /// Per-core percent, in core order.
    pub per_core: Vec<f64>,
}

/// Physical memory counters in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

/// One row of the process table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent: Option<u32>,
    /// Resident memory in bytes.
    pub memory: u64,
    /// CPU percent since the previous refresh (may exceed 100 on multi-core).
    pub cpu_percent: f64,
}

/// Abstraction for OS process/system accounting.
///
/// Every call refreshes the data it returns.
pub trait SystemSource {
    fn cpu_usage(&mut self) -> CpuUsage;
    fn memory(&mut self) -> MemoryInfo;
    fn processes(&mut self) -> Vec<ProcessEntry>;
}

/// Real system source backed by `sysinfo`.
pub struct SysinfoSource {
    system: System,
}

impl SysinfoSource {
    /// Creates an empty source; nothing is queried until the first call.
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSource for SysinfoSource {
    fn cpu_usage(&mut self) -> CpuUsage {
        self.system.refresh_cpu_usage();
        CpuUsage {
            total: self.system.global_cpu_usage() as f64,
            per_core: self
                .system
                .cpus()
                .iter()
                .map(|cpu| cpu.cpu_usage() as f64)
                .collect(),
        }
    }

    fn memory(&mut self) -> MemoryInfo {
        self.system.refresh_memory();
        MemoryInfo {
            total: self.system.total_memory(),
            used: self.system.used_memory(),
            available: self.system.available_memory(),
        }
    }

    fn processes(&mut self) -> Vec<ProcessEntry> {
        // Per-process CPU percent is measured against the global CPU time
        // delta, which only a CPU refresh advances.
        self.system.refresh_cpu_usage();
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.system
            .processes()
            .iter()
            // Threads show up as tasks sharing their owner's memory.
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                parent: process.parent().map(|p| p.as_u32()),
                memory: process.memory(),
                cpu_percent: process.cpu_usage() as f64,
            })
            .collect()
    }
}
