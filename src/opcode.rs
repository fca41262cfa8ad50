use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};
use crate::image::MemoryImage;
use crate::space::WordFormat;

/// Width of a packed control word, and so of the opcode-decode plane.
pub const CONTROL_WORD_BITS: u32 = 16;

/// Two-input boolean function as a 4-bit truth table. Bit 3 is the output
/// for inputs (1,1), bit 0 for (0,0). Shared between the ALU operand
/// selectors and the branch condition combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Dyadic {
    AlwaysZero = 0b0000,
    AAndB = 0b1000,
    NotA = 0b0011,
    A = 0b1100,
    NotB = 0b0101,
    B = 0b1010,
    AXorB = 0b0110,
    AXnorB = 0b1001,
    AOrB = 0b1110,
    AlwaysOne = 0b1111,
}

impl Dyadic {
    fn from_bits(bits: u64) -> Option<Self> {
        Some(match bits {
            0b0000 => Dyadic::AlwaysZero,
            0b1000 => Dyadic::AAndB,
            0b0011 => Dyadic::NotA,
            0b1100 => Dyadic::A,
            0b0101 => Dyadic::NotB,
            0b1010 => Dyadic::B,
            0b0110 => Dyadic::AXorB,
            0b1001 => Dyadic::AXnorB,
            0b1110 => Dyadic::AOrB,
            0b1111 => Dyadic::AlwaysOne,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Split {
    No = 0,
    Yes = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Shift {
    None = 0b00,
    Left = 0b01,
    Right = 0b10,
    RightSigned = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddSub {
    APlusB = 0b00,
    AMinusB = 0b01,
    BMinusA = 0b10,
    MinusAMinusB = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AluMode {
    Simple = 0,
    Dual = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResultSelect {
    R = 0b00,
    RZero = 0b01,
    RNeg = 0b10,
    /// Secondary result of the dual datapath.
    S = 0b11,
}

/// One opcode's full control-signal word, one named field per control
/// dimension. Constructed through [`ControlWord::new`] so an invalid
/// combination is rejected up front instead of silently decoded by hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlWord {
    pub split: Split,
    pub shift: Shift,
    pub select_a: Dyadic,
    pub select_b: Dyadic,
    pub addsub: AddSub,
    pub mode: AluMode,
    pub result: ResultSelect,
}

impl ControlWord {
    pub fn new(
        split: Split,
        shift: Shift,
        select_a: Dyadic,
        select_b: Dyadic,
        addsub: AddSub,
        mode: AluMode,
        result: ResultSelect,
    ) -> Result<Self> {
        if mode == AluMode::Simple && result == ResultSelect::S {
            return Err(AsmError::ControlWord(
                "S result requires the dual datapath",
            ));
        }
        if split == Split::Yes && shift != Shift::None {
            return Err(AsmError::ControlWord(
                "split halves cannot be shifted as one word",
            ));
        }
        Ok(Self {
            split,
            shift,
            select_a,
            select_b,
            addsub,
            mode,
            result,
        })
    }

    /// Layout: split [15] | shift [14:13] | select-A [12:9] | select-B [8:5]
    /// | add/sub [4:3] | mode [2] | result [1:0].
    pub fn pack(&self) -> u64 {
        ((self.split as u64) << 15)
            | ((self.shift as u64) << 13)
            | ((self.select_a as u64) << 9)
            | ((self.select_b as u64) << 5)
            | ((self.addsub as u64) << 3)
            | ((self.mode as u64) << 2)
            | (self.result as u64)
    }

    pub fn unpack(word: u64) -> Option<Self> {
        let split = if (word >> 15) & 1 == 0 { Split::No } else { Split::Yes };
        let shift = match (word >> 13) & 0b11 {
            0b00 => Shift::None,
            0b01 => Shift::Left,
            0b10 => Shift::Right,
            _ => Shift::RightSigned,
        };
        let select_a = Dyadic::from_bits((word >> 9) & 0xF)?;
        let select_b = Dyadic::from_bits((word >> 5) & 0xF)?;
        let addsub = match (word >> 3) & 0b11 {
            0b00 => AddSub::APlusB,
            0b01 => AddSub::AMinusB,
            0b10 => AddSub::BMinusA,
            _ => AddSub::MinusAMinusB,
        };
        let mode = if (word >> 2) & 1 == 0 { AluMode::Simple } else { AluMode::Dual };
        let result = match word & 0b11 {
            0b00 => ResultSelect::R,
            0b01 => ResultSelect::RZero,
            0b10 => ResultSelect::RNeg,
            _ => ResultSelect::S,
        };
        ControlWord::new(split, shift, select_a, select_b, addsub, mode, result).ok()
    }
}

/// Mnemonic -> control-word definitions and their numeric slot assignments.
/// The processor decodes opcodes through a loadable table, so semantics are
/// data: reloading a slot changes what an instruction stream means without
/// touching the instruction encoder.
#[derive(Debug, Clone, Default)]
pub struct OpcodeTable {
    defs: HashMap<String, ControlWord>,
    codes: HashMap<String, u32>,
    slots: HashMap<u32, String>,
}

impl OpcodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, mnemonic: &str, word: ControlWord) -> Result<()> {
        if self.defs.contains_key(mnemonic) {
            return Err(AsmError::DuplicateOpcode {
                mnemonic: mnemonic.to_string(),
            });
        }
        self.defs.insert(mnemonic.to_string(), word);
        Ok(())
    }

    pub fn definition(&self, mnemonic: &str) -> Result<ControlWord> {
        self.defs
            .get(mnemonic)
            .copied()
            .ok_or_else(|| AsmError::UndefinedOpcode {
                mnemonic: mnemonic.to_string(),
            })
    }

    /// Bind `mnemonic` to numeric opcode `code` and write its control word
    /// into the decode plane at address `code`.
    pub fn load(&mut self, mnemonic: &str, code: u32, ucode: &mut MemoryImage) -> Result<()> {
        let word = self.definition(mnemonic)?;
        if code >= ucode.depth() {
            return Err(AsmError::OpcodeOverflow {
                mnemonic: mnemonic.to_string(),
                code,
                depth: ucode.depth(),
            });
        }
        if let Some(existing) = self.slots.get(&code) {
            return Err(AsmError::OpcodeSlotTaken {
                code,
                existing: existing.clone(),
                mnemonic: mnemonic.to_string(),
            });
        }
        ucode.patch(code, word.pack())?;
        self.slots.insert(code, mnemonic.to_string());
        self.codes.insert(mnemonic.to_string(), code);
        Ok(())
    }

    /// The numeric opcode a mnemonic was loaded at.
    pub fn code(&self, mnemonic: &str) -> Result<u32> {
        self.codes
            .get(mnemonic)
            .copied()
            .ok_or_else(|| AsmError::UndefinedOpcode {
                mnemonic: mnemonic.to_string(),
            })
    }

    /// Encode one instruction word from already-resolved addresses and write
    /// it at the instruction-plane cursor.
    pub fn emit(
        &self,
        fmt: &WordFormat,
        mnemonic: &str,
        dest: u32,
        src_a: u32,
        src_b: u32,
        instr: &mut MemoryImage,
    ) -> Result<()> {
        let code = self.code(mnemonic)?;
        let word = encode_instruction(fmt, code, dest, src_a, src_b, instr.cursor(), instr.plane())?;
        instr.literal(word)
    }
}

/// Pack opcode | D | A | B. Fields that do not fit their widths are an
/// error, never truncated.
pub fn encode_instruction(
    fmt: &WordFormat,
    code: u32,
    dest: u32,
    src_a: u32,
    src_b: u32,
    addr: u32,
    plane: crate::image::Plane,
) -> Result<u64> {
    let field = |value: u32, bits: u32| -> Result<u64> {
        if value as u64 >> bits != 0 {
            return Err(AsmError::WordRange {
                plane,
                addr,
                value: value as u64,
                width: bits,
            });
        }
        Ok(value as u64)
    };
    let code = field(code, fmt.opcode_bits)?;
    let d = field(dest, fmt.waddr_bits)?;
    let a = field(src_a, fmt.addr_bits)?;
    let b = field(src_b, fmt.addr_bits)?;
    Ok((code << (fmt.waddr_bits + 2 * fmt.addr_bits))
        | (d << (2 * fmt.addr_bits))
        | (a << fmt.addr_bits)
        | b)
}
