use crate::image::Plane;
use crate::offset::PoPort;

pub type Result<T> = std::result::Result<T, AsmError>;

/// Every failure aborts the current build; a partially patched image is never
/// exported. Variants carry the plane, address, and name needed to locate the
/// offending call in the program description.
#[derive(thiserror::Error, Debug)]
pub enum AsmError {
    #[error("invalid geometry: {0}")]
    Configuration(String),

    #[error("no address conversion exists for plane {plane}")]
    UnknownPlane { plane: Plane },

    #[error("label {name:?} already bound at {bound:#x} in plane {plane}")]
    DuplicateLabel { plane: Plane, name: String, bound: u32 },

    #[error("undefined symbol {name:?} in plane {plane}")]
    UndefinedSymbol { plane: Plane, name: String },

    #[error("destination {name:?} is bound in neither operand plane")]
    UnknownDestination { name: String },

    #[error("destination {name:?} is bound in both operand planes")]
    AmbiguousDestination { name: String },

    #[error("branch at {origin:#x} targets {target:?}, which was never bound")]
    UnresolvedBranch { origin: u32, target: String },

    #[error("write at {addr:#x} exceeds plane {plane} depth {depth:#x}")]
    CursorOverflow { plane: Plane, addr: u32, depth: u32 },

    #[error("value {value:#x} at {addr:#x} exceeds plane {plane} width of {width} bits")]
    WordRange { plane: Plane, addr: u32, value: u64, width: u32 },

    #[error("opcode {mnemonic:?} already defined")]
    DuplicateOpcode { mnemonic: String },

    #[error("opcode {mnemonic:?} used without a prior definition")]
    UndefinedOpcode { mnemonic: String },

    #[error("opcode {mnemonic:?} loaded at slot {code}, outside decode table depth {depth}")]
    OpcodeOverflow { mnemonic: String, code: u32, depth: u32 },

    #[error("opcode slot {code} already holds {existing:?}, cannot load {mnemonic:?}")]
    OpcodeSlotTaken { code: u32, existing: String, mnemonic: String },

    #[error("invalid control word: {0}")]
    ControlWord(&'static str),

    #[error("branch condition {name:?} already defined")]
    DuplicateCondition { name: String },

    #[error("branch condition {name:?} was never defined")]
    UndefinedCondition { name: String },

    #[error("programmed offset {offset:#x} (stride {stride}) does not fit {port} register of {bits} bits")]
    OffsetRange { port: PoPort, offset: u64, stride: u32, bits: u32 },

    #[error("thread {thread} out of range for {count} configured threads")]
    ThreadRange { thread: usize, count: usize },
}
