pub mod assembler;
pub mod branch;
pub mod config;
pub mod error;
pub mod image;
pub mod offset;
pub mod opcode;
pub mod space;
pub mod threads;

pub use assembler::{Assembler, ExportSet, Operand};
pub use branch::{AFlag, BFlag, Polarity};
pub use config::MachineConfig;
pub use error::{AsmError, Result};
pub use image::{MemoryImage, Plane, PlaneDump};
pub use offset::PoPort;
pub use opcode::{AddSub, AluMode, ControlWord, Dyadic, ResultSelect, Shift, Split};
