//! Memory and table ceilings for one interpreter store.

use wasmtime::{ResourceLimiter, Store};
use wasmtime_wasi::preview1::WasiP1Ctx;

use crate::error::PlaygroundError;

const MAX_TABLE_ELEMENTS: u64 = 10_000;

/// Refuses linear-memory and table growth past fixed ceilings, remembering
/// which kind of growth was refused.
pub struct StoreCeiling {
    max_memory: u64,
    peak_memory: u64,
    memory_refused: bool,
    table_refused: bool,
}

impl StoreCeiling {
    /// Create a limiter that allows at most `max_memory` bytes.
    pub fn new(max_memory: u64) -> Self {
        Self {
            max_memory,
            peak_memory: 0,
            memory_refused: false,
            table_refused: false,
        }
    }

    /// Whether a memory growth request was refused.
    pub fn memory_refused(&self) -> bool {
        self.memory_refused
    }

    /// Whether a table growth request was refused.
    pub fn table_refused(&self) -> bool {
        self.table_refused
    }

    /// Highest memory size granted so far.
    pub fn peak_memory(&self) -> u64 {
        self.peak_memory
    }

    /// The error to report for a run that failed during `phase`, if a ceiling was hit.
    pub fn violation(&self, phase: &str) -> Option<PlaygroundError> {
        if self.memory_refused {
            Some(PlaygroundError::MemoryLimitExceeded(format!(
                "memory limit of {} bytes exceeded during {phase}",
                self.max_memory
            )))
        } else if self.table_refused {
            Some(PlaygroundError::ResourceLimitExceeded(format!(
                "table limit of {MAX_TABLE_ELEMENTS} elements exceeded during {phase}"
            )))
        } else {
            None
        }
    }
}

impl ResourceLimiter for StoreCeiling {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        let desired = desired as u64;
        if desired > self.max_memory {
            self.memory_refused = true;
            return Ok(false);
        }
        self.peak_memory = self.peak_memory.max(desired);
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired as u64 > MAX_TABLE_ELEMENTS {
            self.table_refused = true;
            return Ok(false);
        }
        Ok(true)
    }
}

/// Host state of one interpreter store.
pub struct RunState {
    pub ceiling: StoreCeiling,
    pub wasi: WasiP1Ctx,
}

impl RunState {
    pub fn new(max_memory: u64, wasi: WasiP1Ctx) -> Self {
        Self {
            ceiling: StoreCeiling::new(max_memory),
            wasi,
        }
    }
}

/// Installs the [`StoreCeiling`] as the store's limiter.
pub trait ApplyCeiling {
    fn apply_ceiling(&mut self);
}

impl ApplyCeiling for Store<RunState> {
    fn apply_ceiling(&mut self) {
        self.limiter(|state| &mut state.ceiling);
    }
}
