//! Error types for configuration, collection and output.

use std::fmt;
use std::io;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

/// Invalid or inapplicable combination of sampling options.
///
/// Always detected before the sampling loop starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample interval is zero, negative or not a number.
    InvalidInterval(f64),
    /// `--no-header` given without `--csv`.
    NoHeaderWithoutCsv,
    /// `--human-readable` given without absolute-value display.
    HumanReadableWithoutActual,
    /// Per-core CPU breakdown requested for a single process tree.
    PerCoreWithPid,
    /// Per-core and total CPU views requested together.
    PerCoreWithTotal,
    /// Option has no meaning for the selected resource.
    NotApplicable {
        option: &'static str,
        resource: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidInterval(secs) => {
                write!(f, "sample rate must be a positive number of seconds (got {secs})")
            }
            ConfigError::NoHeaderWithoutCsv => write!(f, "--no-header only applies to --csv mode"),
            ConfigError::HumanReadableWithoutActual => {
                write!(f, "--human-readable only applies to --actual values")
            }
            ConfigError::PerCoreWithPid => {
                write!(f, "--all-cores cannot be combined with a process ID")
            }
            ConfigError::PerCoreWithTotal => write!(f, "--all-cores and --total are exclusive"),
            ConfigError::NotApplicable { option, resource } => {
                write!(f, "{option} does not apply to {resource}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error type for everything that can stop the monitor.
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    /// Vendor binary (or the command itself) is absent.
    CommandNotFound { command: String },
    /// Command ran but exited unsuccessfully.
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// Command could not be started for a reason other than absence.
    Spawn { command: String, source: io::Error },
    /// Command output did not have the expected shape.
    Parse { command: String, source: ParseError },
    /// Target process does not exist (or exited).
    ProcessNotFound(u32),
    /// Neither `nvidia-smi` nor `rocm-smi` is available.
    NoVendorFound,
    /// Writing samples failed.
    Io(io::Error),
}

impl Error {
    /// True when the output stream was closed by the reader (e.g. `monitor ... | head`).
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "{e}"),
            Error::CommandNotFound { command } => write!(f, "command not found: {command}"),
            Error::CommandFailed {
                command,
                code,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "command exited with status {code}: {command}")?,
                    None => write!(f, "command terminated by signal: {command}")?,
                }
                if !stderr.is_empty() {
                    write!(f, " ({stderr})")?;
                }
                Ok(())
            }
            Error::Spawn { command, source } => write!(f, "failed to run {command}: {source}"),
            Error::Parse { command, source } => {
                write!(f, "Failed to parse output ({command}): {source}")
            }
            Error::ProcessNotFound(pid) => write!(f, "process {pid} not found"),
            Error::NoVendorFound => write!(f, "Neither `nvidia-smi` nor `rocm-smi` found"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Spawn { source, .. } => Some(source),
            Error::Parse { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
