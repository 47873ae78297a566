//! Telemetry collectors.
//!
//! This module provides the two ways readings are acquired: in-process
//! queries against the operating system, and vendor command-line tools whose
//! text output is parsed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Collectors                           │
//! │  ┌─────────────────────┐   ┌──────────────────────────────┐  │
//! │  │   HostCollector     │   │      ProviderRegistry        │  │
//! │  │  - CPU percent      │   │  - vendor detection (once)   │  │
//! │  │  - memory percent   │   │  - (vendor, kind) → provider │  │
//! │  │  - process trees    │   │  - Nvidia/Rocm providers     │  │
//! │  └──────────┬──────────┘   └──────────────┬───────────────┘  │
//! │             │                             │                  │
//! │      ┌──────▼───────┐             ┌───────▼───────┐          │
//! │      │ SystemSource │ (trait)     │ CommandRunner │ (trait)  │
//! │      └──────┬───────┘             └───────┬───────┘          │
//! └─────────────┼─────────────────────────────┼──────────────────┘
//!               │                             │
//!       ┌───────┴───────┐             ┌───────┴───────┐
//!       │ SysinfoSource │ MockSystem  │  ShellRunner  │ MockRunner
//!       └───────────────┘             └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use monitor_core::collector::{HostCollector, MockSystem};
//!
//! let mut host = HostCollector::new(MockSystem::typical_system());
//! let percent = host.memory_percent(Some(100)).unwrap();
//! assert!(percent > 0.0);
//! ```

pub mod host;
pub mod mock;
pub mod smi;
pub mod traits;

pub use host::HostCollector;
pub use mock::{MockRunner, MockSystem};
pub use smi::{ExternalProvider, NvidiaProvider, ProviderRegistry, RocmProvider, TempSensor, Vendor};
pub use traits::{
    CommandRunner, CpuUsage, MemoryInfo, ProcessEntry, ShellRunner, SysinfoSource, SystemSource,
};
