use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};

/// Tag for one physical memory plane. Exactly one [`MemoryImage`] exists per
/// tag; symbol names in different planes are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plane {
    OperandA,
    OperandB,
    Instruction,
    Microcode,
    Control,
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Plane::OperandA => "operand-A",
            Plane::OperandB => "operand-B",
            Plane::Instruction => "instruction",
            Plane::Microcode => "microcode",
            Plane::Control => "control",
        };
        f.write_str(tag)
    }
}

/// Name -> address bindings for one plane. Rebinding a name is an error,
/// never a silent overwrite.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    map: HashMap<String, u32>,
}

impl SymbolTable {
    pub fn bind(&mut self, plane: Plane, name: &str, addr: u32) -> Result<()> {
        if let Some(&bound) = self.map.get(name) {
            return Err(AsmError::DuplicateLabel {
                plane,
                name: name.to_string(),
                bound,
            });
        }
        self.map.insert(name.to_string(), addr);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.map.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.map.iter().map(|(n, &a)| (n.as_str(), a))
    }
}

/// Dense dump of one plane: exactly `depth` words in ascending address order,
/// unwritten cells zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneDump {
    pub plane: Plane,
    pub width_bits: u32,
    pub words: Vec<u64>,
}

/// Cursor-driven emission buffer for one plane. The cursor may be re-aligned
/// forward (skipping cells that stay zero) or backward (revisiting cells);
/// the build sequence re-aligns to per-thread regions either way.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    plane: Plane,
    depth: u32,
    width_bits: u32,
    cursor: u32,
    words: Vec<u64>,
    symbols: SymbolTable,
}

impl MemoryImage {
    pub fn new(plane: Plane, depth: u32, width_bits: u32) -> Self {
        Self {
            plane,
            depth,
            width_bits,
            cursor: 0,
            words: vec![0; depth as usize],
            symbols: SymbolTable::default(),
        }
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn width_bits(&self) -> u32 {
        self.width_bits
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Move the write cursor to an absolute address.
    pub fn align(&mut self, addr: u32) -> Result<()> {
        if addr >= self.depth {
            return Err(AsmError::CursorOverflow {
                plane: self.plane,
                addr,
                depth: self.depth,
            });
        }
        self.cursor = addr;
        Ok(())
    }

    /// Write one word at the cursor and advance by one.
    pub fn literal(&mut self, value: u64) -> Result<()> {
        let addr = self.cursor;
        self.patch(addr, value)?;
        self.cursor += 1;
        Ok(())
    }

    /// Write a run of words starting at the cursor.
    pub fn array(&mut self, values: &[u64]) -> Result<()> {
        for &v in values {
            self.literal(v)?;
        }
        Ok(())
    }

    /// Write one word at an absolute address without moving the cursor.
    /// Used by the branch resolution pass and the default-state baking.
    pub fn patch(&mut self, addr: u32, value: u64) -> Result<()> {
        if addr >= self.depth {
            return Err(AsmError::CursorOverflow {
                plane: self.plane,
                addr,
                depth: self.depth,
            });
        }
        if self.width_bits < 64 && (value >> self.width_bits) != 0 {
            return Err(AsmError::WordRange {
                plane: self.plane,
                addr,
                value,
                width: self.width_bits,
            });
        }
        self.words[addr as usize] = value;
        Ok(())
    }

    pub fn word(&self, addr: u32) -> Option<u64> {
        self.words.get(addr as usize).copied()
    }

    /// Bind `name` to the current cursor address.
    pub fn label(&mut self, name: &str) -> Result<()> {
        let addr = self.cursor;
        self.symbols.bind(self.plane, name, addr)
    }

    pub fn lookup(&self, name: &str) -> Result<u32> {
        self.symbols.get(name).ok_or_else(|| AsmError::UndefinedSymbol {
            plane: self.plane,
            name: name.to_string(),
        })
    }

    pub fn export(&self) -> PlaneDump {
        PlaneDump {
            plane: self.plane,
            width_bits: self.width_bits,
            words: self.words.clone(),
        }
    }
}
