//! Memory-pressure probes
//!
//! The memory rule asks a [`MemoryProbe`] for the current usage. A probe
//! that cannot answer returns `None`, which the cache treats as "no pressure".

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

use crate::error::{CacheError, Result};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// == Memory Sample ==
/// One reading of memory usage, in megabytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySample {
    /// Memory currently used
    pub used_mb: f64,
    /// Memory available in total
    pub total_mb: f64,
}

impl MemorySample {
    pub fn new(used_mb: f64, total_mb: f64) -> Self {
        Self { used_mb, total_mb }
    }

    /// Fraction of the total in use, or 0.0 when the total is unknown.
    pub fn usage_ratio(&self) -> f64 {
        if self.total_mb > 0.0 {
            self.used_mb / self.total_mb
        } else {
            0.0
        }
    }

    /// A sample is usable only if both readings are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.used_mb.is_finite()
            && self.total_mb.is_finite()
            && self.used_mb >= 0.0
            && self.total_mb >= 0.0
    }
}

// == Memory Probe ==
/// Capability returning current memory usage.
pub trait MemoryProbe: Send + Sync {
    /// Returns the current usage, or `None` when unavailable.
    fn sample(&self) -> Option<MemorySample>;
}

// == System Memory Probe ==
/// Reads the resident memory of the current process and the host total.
pub struct SystemMemoryProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                debug!("Current pid unavailable, memory probe disabled: {}", err);
                None
            }
        };
        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }

    fn read(&self) -> Result<MemorySample> {
        let pid = self
            .pid
            .ok_or_else(|| CacheError::Probe("current pid unknown".to_string()))?;

        let mut system = self.system.lock();
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );

        let process = system
            .process(pid)
            .ok_or_else(|| CacheError::Probe(format!("process {} not found", pid)))?;

        Ok(MemorySample::new(
            process.memory() as f64 / BYTES_PER_MB,
            system.total_memory() as f64 / BYTES_PER_MB,
        ))
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn sample(&self) -> Option<MemorySample> {
        match self.read() {
            Ok(sample) => Some(sample),
            Err(err) => {
                debug!("{}", err);
                None
            }
        }
    }
}

// == Fixed Memory Probe ==
/// Probe returning a preset reading; the reading can be changed at runtime.
#[derive(Debug, Default)]
pub struct FixedMemoryProbe {
    sample: Mutex<Option<MemorySample>>,
}

impl FixedMemoryProbe {
    /// Reports `used_mb` out of `total_mb`.
    pub fn new(used_mb: f64, total_mb: f64) -> Self {
        Self {
            sample: Mutex::new(Some(MemorySample::new(used_mb, total_mb))),
        }
    }

    /// A probe that never answers.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Replaces the reported sample.
    pub fn set(&self, sample: Option<MemorySample>) {
        *self.sample.lock() = sample;
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn sample(&self) -> Option<MemorySample> {
        *self.sample.lock()
    }
}
