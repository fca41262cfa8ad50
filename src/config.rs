use serde::{Deserialize, Serialize};

/// Declared machine geometry. Any hardcoded value lives here; everything else
/// (region ranges, write banks, control-register addresses, field widths) is
/// derived from it by [`crate::space::AddressSpace`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MachineConfig {
    pub thread_count: usize,
    /// Word depth of each operand plane (also the instruction plane depth).
    pub memory_depth: u32,
    /// Word width in bits of the operand and instruction planes.
    pub word_bits: u32,
    /// Words at the bottom of each operand plane visible to every thread.
    pub shared_size: u32,
    /// Indirect-addressing window, must lie inside the shared region.
    pub indirect_base: u32,
    pub indirect_size: u32,
    /// Memory-mapped I/O window, must lie inside the shared region.
    pub io_base: u32,
    pub io_size: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            thread_count: 8,
            memory_depth: 1024,
            word_bits: 36,
            shared_size: 32,
            indirect_base: 24,
            indirect_size: 4,
            io_base: 28,
            io_size: 4,
        }
    }
}
