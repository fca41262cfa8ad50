//! Init-file writers: one hex text file per plane (one word per line, for
//! `$readmemh`-style loaders) and a JSON build report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use barrel_asm::{Assembler, ExportSet, MachineConfig, Plane, PlaneDump};

fn file_stem(plane: Plane) -> &'static str {
    match plane {
        Plane::OperandA => "A",
        Plane::OperandB => "B",
        Plane::Instruction => "I",
        Plane::Microcode => "OD",
        Plane::Control => "H",
    }
}

/// Write one plane as hex words, one per line, zero-padded to the plane
/// width.
pub fn write_mem(dir: &Path, dump: &PlaneDump) -> Result<PathBuf> {
    let path = dir.join(format!("{}.mem", file_stem(dump.plane)));
    let digits = dump.width_bits.div_ceil(4) as usize;
    let mut out = BufWriter::new(
        File::create(&path).with_context(|| format!("creating {}", path.display()))?,
    );
    for word in &dump.words {
        writeln!(out, "{word:0digits$X}")?;
    }
    out.flush()?;
    Ok(path)
}

pub fn write_all(dir: &Path, set: &ExportSet) -> Result<Vec<PathBuf>> {
    [
        &set.operand_a,
        &set.operand_b,
        &set.instruction,
        &set.microcode,
        &set.control,
    ]
    .into_iter()
    .map(|dump| write_mem(dir, dump))
    .collect()
}

#[derive(Debug, Serialize)]
pub struct SymbolEntry {
    pub plane: Plane,
    pub name: String,
    pub address: u32,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub config: MachineConfig,
    pub private_depth: u32,
    pub runtime_offset: Vec<u32>,
    pub symbols: Vec<SymbolEntry>,
}

/// Geometry and symbol summary of a finished build.
pub fn report(asm: &Assembler) -> Report {
    let mut symbols: Vec<SymbolEntry> = [&asm.a, &asm.b, &asm.instr]
        .into_iter()
        .flat_map(|img| {
            img.symbols().iter().map(|(name, address)| SymbolEntry {
                plane: img.plane(),
                name: name.to_string(),
                address,
            })
        })
        .collect();
    symbols.sort_by(|x, y| (x.plane as u8, x.address).cmp(&(y.plane as u8, y.address)));
    Report {
        config: asm.config,
        private_depth: asm.space.private_depth,
        runtime_offset: asm.space.runtime_offset.clone(),
        symbols,
    }
}
