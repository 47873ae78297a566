//! In-process CPU and memory collection (no subprocess).
//!
//! Metrics are system-wide unless a PID is given, in which case they cover
//! that process plus all of its descendants, summed.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::collector::traits::{ProcessEntry, SystemSource};
use crate::error::Error;

/// Collects CPU and memory metrics from a [`SystemSource`].
pub struct HostCollector<S: SystemSource> {
    source: S,
}

impl<S: SystemSource> HostCollector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Takes the baseline CPU reading that the next call is measured against.
    ///
    /// CPU percent is "since the previous refresh": without priming, the first
    /// sample of a run is a baseline of limited meaning. With a PID this also
    /// checks that the process exists.
    pub fn prime(&mut self, pid: Option<u32>) -> Result<(), Error> {
        match pid {
            Some(pid) => self.process_tree(pid).map(drop),
            None => {
                self.source.cpu_usage();
                Ok(())
            }
        }
    }

    /// CPU percent since the previous call, system-wide or for a process tree.
    pub fn cpu_percent(&mut self, pid: Option<u32>) -> Result<f64, Error> {
        match pid {
            None => Ok(self.source.cpu_usage().total),
            Some(pid) => Ok(self
                .process_tree(pid)?
                .iter()
                .map(|p| p.cpu_percent)
                .sum()),
        }
    }

    /// Per-core CPU percent since the previous call, indexed `0..N`.
    pub fn cpu_percent_per_core(&mut self) -> Vec<f64> {
        self.source.cpu_usage().per_core
    }

    /// Percent of physical memory in use.
    ///
    /// For a process tree this is the sum of each member's resident share of
    /// total memory, rounded to two decimals.
    pub fn memory_percent(&mut self, pid: Option<u32>) -> Result<f64, Error> {
        match pid {
            None => {
                let mem = self.source.memory();
                if mem.total == 0 {
                    return Ok(0.0);
                }
                let used = mem.total.saturating_sub(mem.available) as f64;
                Ok(round_to(used / mem.total as f64 * 100.0, 1))
            }
            Some(pid) => {
                let tree = self.process_tree(pid)?;
                let total = self.source.memory().total;
                if total == 0 {
                    return Ok(0.0);
                }
                let percent: f64 = tree
                    .iter()
                    .map(|p| p.memory as f64 / total as f64 * 100.0)
                    .sum();
                Ok(round_to(percent, 2))
            }
        }
    }

    /// Memory in use, in bytes.
    ///
    /// System-wide this is the OS "used" counter. For a process tree it is an
    /// approximation, `memory_percent / 100 * available`, not kernel accounting.
    pub fn memory_used(&mut self, pid: Option<u32>) -> Result<u64, Error> {
        match pid {
            None => Ok(self.source.memory().used),
            Some(pid) => {
                let percent = self.memory_percent(Some(pid))?;
                let available = self.source.memory().available;
                Ok((percent / 100.0 * available as f64) as u64)
            }
        }
    }

    /// Returns `pid` followed by all of its descendants.
    pub fn process_tree(&mut self, pid: u32) -> Result<Vec<ProcessEntry>, Error> {
        let processes = self.source.processes();
        let tree = descendants(&processes, pid).ok_or(Error::ProcessNotFound(pid))?;
        trace!("process tree of {}: {} processes", pid, tree.len());
        Ok(tree.into_iter().cloned().collect())
    }
}

/// Collects `root` and its recursive children from a flat process table.
///
/// Returns `None` when `root` is not in the table.
fn descendants(processes: &[ProcessEntry], root: u32) -> Option<Vec<&ProcessEntry>> {
    let by_pid: HashMap<u32, &ProcessEntry> = processes.iter().map(|p| (p.pid, p)).collect();
    let root_entry = *by_pid.get(&root)?;

    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for p in processes {
        if let Some(parent) = p.parent {
            if parent != p.pid {
                children.entry(parent).or_default().push(p.pid);
            }
        }
    }

    let mut tree = vec![root_entry];
    let mut seen = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(pid) = stack.pop() {
        for child in children.get(&pid).into_iter().flatten() {
            if seen.insert(*child) {
                if let Some(entry) = by_pid.get(child) {
                    tree.push(*entry);
                }
                stack.push(*child);
            }
        }
    }
    Some(tree)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
