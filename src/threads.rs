use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};
use crate::space::AddressSpace;

/// Per-thread start addresses, plus the active subset that subsequent
/// per-thread baking applies to. A single symbolic instruction stream can be
/// replicated across threads by re-selecting the subset between passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadLayout {
    count: usize,
    instr_start: Vec<u32>,
    private_start: Vec<u32>,
    active: Vec<usize>,
}

impl ThreadLayout {
    pub fn new(space: &AddressSpace, instr_depth: u32) -> Self {
        let count = space.runtime_offset.len();
        let slice = instr_depth.div_ceil(count as u32);
        let instr_start = (0..count as u32).map(|k| k * slice).collect();
        let private_start = (0..count as u32)
            .map(|k| space.shared.end + k * space.private_depth)
            .collect();
        Self {
            count,
            instr_start,
            private_start,
            active: (0..count).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn check(&self, thread: usize) -> Result<()> {
        if thread >= self.count {
            return Err(AsmError::ThreadRange {
                thread,
                count: self.count,
            });
        }
        Ok(())
    }

    /// Instruction-plane address where this thread's code begins.
    pub fn instr_start(&self, thread: usize) -> Result<u32> {
        self.check(thread)?;
        Ok(self.instr_start[thread])
    }

    /// Operand-plane address where this thread's private data physically
    /// begins (the zero-offset logical view shifted by the thread's slot).
    pub fn private_start(&self, thread: usize) -> Result<u32> {
        self.check(thread)?;
        Ok(self.private_start[thread])
    }

    pub fn all(&self) -> impl Iterator<Item = usize> {
        0..self.count
    }

    pub fn set_active(&mut self, threads: &[usize]) -> Result<()> {
        for &t in threads {
            self.check(t)?;
        }
        self.active = threads.to_vec();
        Ok(())
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }
}
