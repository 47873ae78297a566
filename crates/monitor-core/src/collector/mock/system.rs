use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collector::traits::{CpuUsage, MemoryInfo, ProcessEntry, SystemSource};

/// Synthetic system for testing in-process collection.
#[derive(Debug, Clone, Default)]
pub struct MockSystem {
    cpu: CpuUsage,
    memory: MemoryInfo,
    processes: Vec<ProcessEntry>,
    queries: Arc<AtomicUsize>,
}

impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A 4-core machine with 16 GiB of memory and a small process tree:
    ///
    /// ```text
    /// 1 ─┬─ 100 ─┬─ 101 ── 103
    ///    │       └─ 102
    ///    └─ 200
    /// ```
    pub fn typical_system() -> Self {
        const GIB: u64 = 1024 * 1024 * 1024;
        let mut system = Self::new()
            .with_cpu(37.5, vec![50.0, 25.0, 75.0, 0.0])
            .with_memory(16 * GIB, 6 * GIB, 8 * GIB);
        system.add_process(1, None, GIB / 16, 0.1);
        system.add_process(100, Some(1), GIB, 12.0);
        system.add_process(101, Some(100), GIB / 2, 30.0);
        system.add_process(102, Some(100), GIB / 4, 5.5);
        system.add_process(103, Some(101), GIB / 8, 1.0);
        system.add_process(200, Some(1), 2 * GIB, 40.0);
        system
    }

    pub fn with_cpu(mut self, total: f64, per_core: Vec<f64>) -> Self {
        self.cpu = CpuUsage { total, per_core };
        self
    }

    pub fn with_memory(mut self, total: u64, used: u64, available: u64) -> Self {
        self.memory = MemoryInfo {
            total,
            used,
            available,
        };
        self
    }

    pub fn add_process(&mut self, pid: u32, parent: Option<u32>, memory: u64, cpu_percent: f64) {
        self.processes.push(ProcessEntry {
            pid,
            parent,
            memory,
            cpu_percent,
        });
    }

    /// Simulates a process exiting.
    pub fn remove_process(&mut self, pid: u32) {
        self.processes.retain(|p| p.pid != pid);
    }

    /// Handle counting every query made through [`SystemSource`].
    pub fn query_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.queries)
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

impl SystemSource for MockSystem {
    fn cpu_usage(&mut self) -> CpuUsage {
        self.record_query();
        self.cpu.clone()
    }

    fn memory(&mut self) -> MemoryInfo {
        self.record_query();
        self.memory
    }

    fn processes(&mut self) -> Vec<ProcessEntry> {
        self.record_query();
        self.processes.clone()
    }
}
