use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::MachineConfig;
use crate::error::{AsmError, Result};
use crate::image::Plane;

/// Hardware constants: the number of programmed-offset channels per port and
/// of branch detector units, fixed by the datapath.
pub const PO_CHANNELS: u32 = 4;
pub const BRANCH_UNITS: u32 = 4;

/// Bit layout of an instruction word, derived from the declared geometry.
/// Read addresses span one plane; write addresses span the four write banks,
/// so the destination field carries two extra bits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WordFormat {
    pub word_bits: u32,
    pub addr_bits: u32,
    pub waddr_bits: u32,
    pub opcode_bits: u32,
}

impl WordFormat {
    /// Numeric opcodes the decode table can hold.
    pub fn opcode_slots(&self) -> u32 {
        1 << self.opcode_bits
    }
}

/// Write addresses of one branch detector unit's configuration registers,
/// in the control bank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BranchRegs {
    pub sentinel_a: u32,
    pub mask_a: u32,
    pub sentinel_b: u32,
    pub mask_b: u32,
    pub counter: u32,
    pub descriptor: u32,
}

/// Write addresses of the per-thread configuration registers, all in the
/// write-only control bank. Derived from the bank base rather than hardcoded;
/// the hardware register file uses the same spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMap {
    /// S result register.
    pub s: u32,
    pub a_po: Vec<u32>,
    pub b_po: Vec<u32>,
    pub da_po: Vec<u32>,
    pub db_po: Vec<u32>,
    pub default_offset: u32,
    pub branch: Vec<BranchRegs>,
    pub opcode_decode: Vec<u32>,
}

impl ControlMap {
    fn new(base: u32, opcode_slots: u32) -> Self {
        let channels =
            |start: u32| -> Vec<u32> { (0..PO_CHANNELS).map(|c| base + start + c).collect() };
        let branch = (0..BRANCH_UNITS)
            .map(|u| {
                let b = base + 28 + 6 * u;
                BranchRegs {
                    sentinel_a: b,
                    mask_a: b + 1,
                    sentinel_b: b + 2,
                    mask_b: b + 3,
                    counter: b + 4,
                    descriptor: b + 5,
                }
            })
            .collect();
        Self {
            s: base,
            a_po: channels(4),
            b_po: channels(8),
            da_po: channels(12),
            db_po: channels(16),
            default_offset: base + 20,
            branch,
            opcode_decode: (0..opcode_slots).map(|i| base + 128 + i).collect(),
        }
    }
}

/// Static partition of one physical operand memory: shared, literal-pool,
/// indirect, and I/O windows at the bottom, one private region per thread
/// above. All ranges are zero-based; the CPU adds `runtime_offset[thread]`
/// to private accesses, so identical code runs on every thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSpace {
    pub shared: Range<u32>,
    /// Shared literal pool. Address zero is reserved as the zero register.
    pub pool: Range<u32>,
    pub indirect: Range<u32>,
    pub io: Range<u32>,
    /// Private range of one thread, zero-offset view.
    pub private: Range<u32>,
    pub private_depth: u32,
    pub runtime_offset: Vec<u32>,
    pub format: WordFormat,
    pub ctrl: ControlMap,
    depth: u32,
}

fn bits_for(depth: u32) -> u32 {
    u32::BITS - (depth - 1).leading_zeros()
}

impl AddressSpace {
    pub fn new(cfg: &MachineConfig) -> Result<Self> {
        if cfg.thread_count == 0 {
            return Err(AsmError::Configuration("thread count must be > 0".into()));
        }
        if cfg.shared_size == 0 || cfg.shared_size >= cfg.memory_depth {
            return Err(AsmError::Configuration(format!(
                "shared region {} must lie strictly inside depth {}",
                cfg.shared_size, cfg.memory_depth
            )));
        }
        if cfg.indirect_base < 1 || cfg.indirect_base + cfg.indirect_size > cfg.shared_size {
            return Err(AsmError::Configuration(format!(
                "indirect window {}+{} outside shared region {}",
                cfg.indirect_base, cfg.indirect_size, cfg.shared_size
            )));
        }
        if cfg.io_base + cfg.io_size > cfg.shared_size {
            return Err(AsmError::Configuration(format!(
                "io window {}+{} outside shared region {}",
                cfg.io_base, cfg.io_size, cfg.shared_size
            )));
        }
        let indirect = cfg.indirect_base..cfg.indirect_base + cfg.indirect_size;
        let io = cfg.io_base..cfg.io_base + cfg.io_size;
        if indirect.contains(&io.start) || io.contains(&indirect.start) {
            return Err(AsmError::Configuration(
                "indirect and io windows overlap".into(),
            ));
        }

        // Divide the memory above the shared region between the threads. A
        // remainder would push the last thread's region past the declared
        // depth, so such a geometry is rejected outright.
        let n = cfg.thread_count as u32;
        let private_depth = (cfg.memory_depth - cfg.shared_size).div_ceil(n);
        if cfg.shared_size + n * private_depth != cfg.memory_depth {
            return Err(AsmError::Configuration(format!(
                "private memory {} does not divide evenly between {} threads",
                cfg.memory_depth - cfg.shared_size,
                n
            )));
        }
        let runtime_offset = (0..n).map(|k| k * private_depth).collect();

        let addr_bits = bits_for(cfg.memory_depth);
        let waddr_bits = addr_bits + 2;
        let opcode_bits = cfg
            .word_bits
            .checked_sub(waddr_bits + 2 * addr_bits)
            .filter(|b| (1..=8).contains(b))
            .ok_or_else(|| {
                AsmError::Configuration(format!(
                    "word width {} leaves no usable opcode field above {} address bits",
                    cfg.word_bits, addr_bits
                ))
            })?;
        let format = WordFormat {
            word_bits: cfg.word_bits,
            addr_bits,
            waddr_bits,
            opcode_bits,
        };

        tracing::debug!(
            depth = cfg.memory_depth,
            shared = cfg.shared_size,
            threads = cfg.thread_count,
            private_depth,
            opcode_bits,
            "address space laid out"
        );

        Ok(Self {
            shared: 0..cfg.shared_size,
            pool: 1..cfg.indirect_base,
            indirect,
            io,
            private: cfg.shared_size..cfg.shared_size + private_depth,
            private_depth,
            runtime_offset,
            format,
            ctrl: ControlMap::new(3 * cfg.memory_depth, 1 << opcode_bits),
            depth: cfg.memory_depth,
        })
    }

    /// Base write addresses of the four banks. The write address space is
    /// four planes deep: A, B, instruction, control, in that order.
    pub fn write_base(&self, plane: Plane) -> Result<u32> {
        match plane {
            Plane::OperandA => Ok(0),
            Plane::OperandB => Ok(self.depth),
            Plane::Instruction => Ok(2 * self.depth),
            Plane::Control => Ok(3 * self.depth),
            Plane::Microcode => Err(AsmError::UnknownPlane { plane }),
        }
    }

    /// Convert a read address to the write address of the same cell. Only the
    /// operand planes are readable; the instruction plane is read by the
    /// program counter alone and the control bank not at all.
    pub fn read_to_write(&self, plane: Plane, read_addr: u32) -> Result<u32> {
        match plane {
            Plane::OperandA | Plane::OperandB => Ok(read_addr + self.write_base(plane)?),
            _ => Err(AsmError::UnknownPlane { plane }),
        }
    }
}
