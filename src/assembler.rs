use serde::{Deserialize, Serialize};

use crate::branch::{AFlag, BFlag, BranchResolver, Polarity};
use crate::config::MachineConfig;
use crate::error::{AsmError, Result};
use crate::image::{MemoryImage, Plane, PlaneDump};
use crate::offset::{self, PoPort};
use crate::opcode::{ControlWord, Dyadic, OpcodeTable, CONTROL_WORD_BITS};
use crate::space::AddressSpace;
use crate::threads::ThreadLayout;

/// An instruction operand: either a symbol in one of the operand planes or a
/// raw address (used for the write-only control registers, which have
/// addresses but no names in any plane's symbol table).
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Name(&'a str),
    Addr(u32),
}

impl<'a> From<&'a str> for Operand<'a> {
    fn from(name: &'a str) -> Self {
        Operand::Name(name)
    }
}

impl From<u32> for Operand<'_> {
    fn from(addr: u32) -> Self {
        Operand::Addr(addr)
    }
}

/// One dense word sequence per physical plane, ready for a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSet {
    pub operand_a: PlaneDump,
    pub operand_b: PlaneDump,
    pub instruction: PlaneDump,
    pub microcode: PlaneDump,
    pub control: PlaneDump,
}

/// Composes the address space, thread layout, per-plane images, opcode table
/// and branch resolver into one program-build pipeline. All mutable state is
/// owned here; building is a deterministic single-threaded batch.
#[derive(Debug, Clone)]
pub struct Assembler {
    pub config: MachineConfig,
    pub space: AddressSpace,
    pub threads: ThreadLayout,
    pub a: MemoryImage,
    pub b: MemoryImage,
    pub instr: MemoryImage,
    pub ucode: MemoryImage,
    pub control: MemoryImage,
    pub opcodes: OpcodeTable,
    pub branches: BranchResolver,
}

impl Assembler {
    pub fn new(config: MachineConfig) -> Result<Self> {
        let space = AddressSpace::new(&config)?;
        let threads = ThreadLayout::new(&space, config.memory_depth);
        let n = config.thread_count as u32;
        Ok(Self {
            a: MemoryImage::new(Plane::OperandA, config.memory_depth, config.word_bits),
            b: MemoryImage::new(Plane::OperandB, config.memory_depth, config.word_bits),
            instr: MemoryImage::new(Plane::Instruction, config.memory_depth, config.word_bits),
            ucode: MemoryImage::new(
                Plane::Microcode,
                space.format.opcode_slots(),
                CONTROL_WORD_BITS,
            ),
            // Per-thread PC, previous PC, and default offset, banked in that
            // order.
            control: MemoryImage::new(Plane::Control, 3 * n, space.format.addr_bits),
            opcodes: OpcodeTable::new(),
            branches: BranchResolver::new(),
            config,
            space,
            threads,
        })
    }

    pub fn define_opcode(&mut self, mnemonic: &str, word: ControlWord) -> Result<()> {
        self.opcodes.define(mnemonic, word)
    }

    pub fn load_opcode(&mut self, mnemonic: &str, code: u32) -> Result<()> {
        self.opcodes.load(mnemonic, code, &mut self.ucode)
    }

    /// Resolve a destination operand to a write-bank address. Named
    /// destinations must be bound in exactly one operand plane.
    fn dest_address(&self, dest: Operand<'_>) -> Result<u32> {
        match dest {
            Operand::Addr(addr) => Ok(addr),
            Operand::Name(name) => {
                match (self.a.symbols().get(name), self.b.symbols().get(name)) {
                    (Some(_), Some(_)) => Err(AsmError::AmbiguousDestination {
                        name: name.to_string(),
                    }),
                    (Some(addr), None) => self.space.read_to_write(Plane::OperandA, addr),
                    (None, Some(addr)) => self.space.read_to_write(Plane::OperandB, addr),
                    (None, None) => Err(AsmError::UnknownDestination {
                        name: name.to_string(),
                    }),
                }
            }
        }
    }

    fn source_address(image: &MemoryImage, src: Operand<'_>) -> Result<u32> {
        match src {
            Operand::Addr(addr) => Ok(addr),
            Operand::Name(name) => image.lookup(name),
        }
    }

    /// Emit one instruction at the instruction-plane cursor. Source operands
    /// resolve in their own plane's symbol table; an undefined name here is
    /// an immediate error, since only branch targets may be forward
    /// references.
    pub fn instruction<'a>(
        &mut self,
        thread: usize,
        mnemonic: &str,
        dest: impl Into<Operand<'a>>,
        src_a: impl Into<Operand<'a>>,
        src_b: impl Into<Operand<'a>>,
    ) -> Result<()> {
        self.threads.check(thread)?;
        let d = self.dest_address(dest.into())?;
        let a = Self::source_address(&self.a, src_a.into())?;
        let b = Self::source_address(&self.b, src_b.into())?;
        self.opcodes
            .emit(&self.space.format, mnemonic, d, a, b, &mut self.instr)
    }

    pub fn condition(
        &mut self,
        name: &str,
        flag_a: AFlag,
        flag_b: BFlag,
        combinator: Dyadic,
    ) -> Result<()> {
        self.branches.condition(name, flag_a, flag_b, combinator)
    }

    /// Bind the next emitted instruction's address as a branch target.
    pub fn mark_target(&mut self, name: &str) -> Result<()> {
        self.branches.mark_target(name, &mut self.instr)
    }

    /// Reference the next emitted instruction as a branch origin; see
    /// [`BranchResolver::branch`].
    pub fn branch(
        &mut self,
        condition: &str,
        target: &str,
        polarity: Polarity,
        cell: &str,
    ) -> Result<()> {
        self.branches
            .branch(condition, target, polarity, cell, &self.instr, &mut self.b)
    }

    /// Build a programmed-offset register value for one thread.
    pub fn programmed_offset(
        &self,
        port: PoPort,
        thread: usize,
        base_offset: u32,
        symbol: &str,
        stride: u32,
        capacity: u32,
    ) -> Result<u64> {
        let data = match port.plane() {
            Plane::OperandA => &self.a,
            _ => &self.b,
        };
        offset::encode(
            port,
            &self.space,
            &self.threads,
            thread,
            base_offset,
            symbol,
            stride,
            capacity,
            data,
        )
    }

    /// Bake the per-thread reset state into the control image: program
    /// counter, previous program counter, and the private-memory runtime
    /// offset, for every active thread. The hardware has no init code path,
    /// so these leave here or nowhere.
    pub fn init_defaults(&mut self) -> Result<()> {
        let n = self.threads.count() as u32;
        for &k in self.threads.active() {
            let start = self.threads.instr_start(k)?;
            let offset = self.space.runtime_offset[k];
            let k = k as u32;
            self.control.patch(k, u64::from(start))?;
            self.control.patch(n + k, u64::from(start))?;
            self.control.patch(2 * n + k, u64::from(offset))?;
        }
        tracing::debug!(threads = ?self.threads.active(), "reset state baked");
        Ok(())
    }

    /// Run the mandatory branch resolution barrier. Only valid once every
    /// instruction for every thread has been emitted.
    pub fn resolve_forward_branches(&mut self) -> Result<()> {
        self.branches
            .resolve_forward_branches(&self.instr, &mut self.b)
    }

    /// Freeze and export every plane. Fails if any branch reference is still
    /// pending; a partially patched image must never reach a loader.
    pub fn export(&self) -> Result<ExportSet> {
        if let Some(pb) = self.branches.pending().first() {
            return Err(AsmError::UnresolvedBranch {
                origin: pb.origin,
                target: pb.target.clone(),
            });
        }
        tracing::debug!("exporting plane images");
        Ok(ExportSet {
            operand_a: self.a.export(),
            operand_b: self.b.export(),
            instruction: self.instr.export(),
            microcode: self.ucode.export(),
            control: self.control.export(),
        })
    }
}
