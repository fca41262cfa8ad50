use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};
use crate::image::{MemoryImage, Plane};
use crate::space::AddressSpace;
use crate::threads::ThreadLayout;

/// Stride field width shared by all programmed-offset register variants.
pub const STRIDE_BITS: u32 = 4;

/// Which programmed-offset register a value is destined for. Read ports
/// address one plane; write ports address the four write banks, so their
/// offset field carries two extra bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoPort {
    ReadA,
    ReadB,
    WriteA,
    WriteB,
}

impl fmt::Display for PoPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PoPort::ReadA => "read-A",
            PoPort::ReadB => "read-B",
            PoPort::WriteA => "write-A",
            PoPort::WriteB => "write-B",
        };
        f.write_str(tag)
    }
}

impl PoPort {
    pub fn plane(&self) -> Plane {
        match self {
            PoPort::ReadA | PoPort::WriteA => Plane::OperandA,
            PoPort::ReadB | PoPort::WriteB => Plane::OperandB,
        }
    }

    pub fn offset_bits(&self, space: &AddressSpace) -> u32 {
        match self {
            PoPort::ReadA | PoPort::ReadB => space.format.addr_bits,
            PoPort::WriteA | PoPort::WriteB => space.format.waddr_bits,
        }
    }
}

/// Build the register value that redirects this port's accesses through
/// `base + stride * index` for one thread. The programmed-offset datapath
/// bypasses the default-offset adder, so the thread's runtime offset is
/// folded into the encoded base here.
///
/// `capacity` is the number of elements the stride will walk; the last
/// element must still land inside the offset field.
pub fn encode(
    port: PoPort,
    space: &AddressSpace,
    layout: &ThreadLayout,
    thread: usize,
    base_offset: u32,
    symbol: &str,
    stride: u32,
    capacity: u32,
    data: &MemoryImage,
) -> Result<u64> {
    layout.check(thread)?;
    let sym_addr = data.lookup(symbol)?;
    let offset = u64::from(sym_addr)
        + u64::from(base_offset)
        + u64::from(space.runtime_offset[thread]);
    let bits = port.offset_bits(space);
    let range_err = || AsmError::OffsetRange {
        port,
        offset,
        stride,
        bits,
    };
    if stride >> STRIDE_BITS != 0 {
        return Err(range_err());
    }
    let last = offset + u64::from(stride) * u64::from(capacity.saturating_sub(1));
    if offset >> bits != 0 || last >> bits != 0 {
        return Err(range_err());
    }
    Ok((u64::from(stride) << bits) | offset)
}

/// Inverse of [`encode`], for verifying baked register values.
pub fn decode(port: PoPort, space: &AddressSpace, value: u64) -> (u32, u32) {
    let bits = port.offset_bits(space);
    let offset = (value & ((1 << bits) - 1)) as u32;
    let stride = ((value >> bits) & ((1 << STRIDE_BITS) - 1)) as u32;
    (offset, stride)
}
