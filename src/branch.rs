use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};
use crate::image::MemoryImage;
use crate::opcode::Dyadic;

/// Flag derived from the most recent operand-A result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AFlag {
    Negative = 0b00,
    /// Masked compare of the result against the unit's sentinel register.
    Sentinel = 0b01,
}

/// Flag derived from the most recent operand-B result, or from the unit's
/// iteration counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BFlag {
    LessThan = 0b00,
    /// Set while the unit's down-counter is still running.
    Counter = 0b01,
    Sentinel = 0b10,
}

/// Whether the branch fires on the condition being true, false, or always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Polarity {
    OnFalse = 0b00,
    OnTrue = 0b01,
    Always = 0b10,
}

/// Named two-input boolean combination of an A-side and a B-side flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub flag_a: AFlag,
    pub flag_b: BFlag,
    pub combinator: Dyadic,
}

/// A branch whose target label was not yet bound when the reference was
/// recorded. Consumed by the resolution pass.
#[derive(Debug, Clone)]
pub struct PendingBranch {
    pub origin: u32,
    pub condition: String,
    pub target: String,
    pub polarity: Polarity,
    /// Operand-B cell that receives the packed descriptor.
    pub cell: u32,
}

/// Descriptor layout: origin [29:20] | target [19:10] | combinator [9:6] |
/// B-flag [5:4] | A-flag [3:2] | polarity [1:0]. The program copies the cell
/// into a branch unit's descriptor register at run time.
fn pack_descriptor(origin: u32, target: u32, cond: Condition, polarity: Polarity) -> u64 {
    ((origin as u64) << 20)
        | ((target as u64) << 10)
        | ((cond.combinator as u64) << 6)
        | ((cond.flag_b as u64) << 4)
        | ((cond.flag_a as u64) << 2)
        | (polarity as u64)
}

/// Records branch-condition definitions and branch-target references, and
/// patches final target encodings once every label is in its frozen state.
#[derive(Debug, Clone, Default)]
pub struct BranchResolver {
    conditions: HashMap<String, Condition>,
    pending: Vec<PendingBranch>,
}

impl BranchResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(
        &mut self,
        name: &str,
        flag_a: AFlag,
        flag_b: BFlag,
        combinator: Dyadic,
    ) -> Result<()> {
        if self.conditions.contains_key(name) {
            return Err(AsmError::DuplicateCondition {
                name: name.to_string(),
            });
        }
        self.conditions.insert(
            name.to_string(),
            Condition {
                flag_a,
                flag_b,
                combinator,
            },
        );
        Ok(())
    }

    fn lookup_condition(&self, name: &str) -> Result<Condition> {
        self.conditions
            .get(name)
            .copied()
            .ok_or_else(|| AsmError::UndefinedCondition {
                name: name.to_string(),
            })
    }

    /// Bind the instruction address at the cursor (the next instruction to be
    /// emitted) as a branch target.
    pub fn mark_target(&mut self, name: &str, instr: &mut MemoryImage) -> Result<()> {
        instr.label(name)
    }

    /// Record a branch reference at the instruction address at the cursor.
    /// `cell` names an already-emitted operand-B word that will hold the
    /// packed descriptor; a bound target resolves immediately, an unbound one
    /// becomes a pending fixup.
    pub fn branch(
        &mut self,
        condition: &str,
        target: &str,
        polarity: Polarity,
        cell: &str,
        instr: &MemoryImage,
        data_b: &mut MemoryImage,
    ) -> Result<()> {
        let cond = self.lookup_condition(condition)?;
        let cell_addr = data_b.lookup(cell)?;
        let origin = instr.cursor();
        match instr.symbols().get(target) {
            Some(target_addr) => {
                data_b.patch(cell_addr, pack_descriptor(origin, target_addr, cond, polarity))
            }
            None => {
                self.pending.push(PendingBranch {
                    origin,
                    condition: condition.to_string(),
                    target: target.to_string(),
                    polarity,
                    cell: cell_addr,
                });
                Ok(())
            }
        }
    }

    pub fn pending(&self) -> &[PendingBranch] {
        &self.pending
    }

    /// Mandatory final pass, run after every instruction for every thread has
    /// been emitted. Each patch only reads frozen label addresses, so any
    /// resolution order yields identical images.
    pub fn resolve_forward_branches(
        &mut self,
        instr: &MemoryImage,
        data_b: &mut MemoryImage,
    ) -> Result<()> {
        let count = self.pending.len();
        for pb in std::mem::take(&mut self.pending) {
            let target_addr = instr.symbols().get(&pb.target).ok_or_else(|| {
                AsmError::UnresolvedBranch {
                    origin: pb.origin,
                    target: pb.target.clone(),
                }
            })?;
            let cond = self.lookup_condition(&pb.condition)?;
            data_b.patch(
                pb.cell,
                pack_descriptor(pb.origin, target_addr, cond, pb.polarity),
            )?;
        }
        tracing::debug!(count, "forward branches resolved");
        Ok(())
    }
}
