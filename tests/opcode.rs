use barrel_asm::{
    AddSub, AluMode, AsmError, Assembler, ControlWord, Dyadic, MachineConfig, ResultSelect,
    Shift, Split,
};

fn add_word() -> ControlWord {
    ControlWord::new(
        Split::No,
        Shift::None,
        Dyadic::A,
        Dyadic::B,
        AddSub::APlusB,
        AluMode::Simple,
        ResultSelect::R,
    )
    .unwrap()
}

fn asm() -> Assembler {
    Assembler::new(MachineConfig::default()).unwrap()
}

#[test]
fn control_word_round_trips_through_slot_six() {
    let mut asm = asm();
    let word = add_word();
    asm.define_opcode("ADD", word).unwrap();
    asm.load_opcode("ADD", 6).unwrap();
    let packed = asm.ucode.word(6).unwrap();
    assert_eq!(ControlWord::unpack(packed).unwrap(), word);
}

#[test]
fn invalid_control_combinations_are_rejected() {
    // The S result only exists on the dual datapath.
    assert!(matches!(
        ControlWord::new(
            Split::No,
            Shift::None,
            Dyadic::A,
            Dyadic::B,
            AddSub::APlusB,
            AluMode::Simple,
            ResultSelect::S,
        ),
        Err(AsmError::ControlWord(_))
    ));
    assert!(ControlWord::new(
        Split::Yes,
        Shift::Left,
        Dyadic::A,
        Dyadic::B,
        AddSub::APlusB,
        AluMode::Simple,
        ResultSelect::R,
    )
    .is_err());
}

#[test]
fn redefinition_and_missing_definitions_fail() {
    let mut asm = asm();
    asm.define_opcode("ADD", add_word()).unwrap();
    assert!(matches!(
        asm.define_opcode("ADD", add_word()),
        Err(AsmError::DuplicateOpcode { .. })
    ));
    assert!(matches!(
        asm.load_opcode("SUB", 1),
        Err(AsmError::UndefinedOpcode { .. })
    ));
}

#[test]
fn slots_are_bounded_and_exclusive() {
    let mut asm = asm();
    asm.define_opcode("ADD", add_word()).unwrap();
    asm.define_opcode("NOP", add_word()).unwrap();
    assert!(matches!(
        asm.load_opcode("ADD", 16),
        Err(AsmError::OpcodeOverflow { code: 16, depth: 16, .. })
    ));
    asm.load_opcode("ADD", 3).unwrap();
    assert!(matches!(
        asm.load_opcode("NOP", 3),
        Err(AsmError::OpcodeSlotTaken { code: 3, .. })
    ));
}

#[test]
fn emission_packs_opcode_and_address_fields() {
    let mut asm = asm();
    asm.define_opcode("ADD", add_word()).unwrap();
    asm.load_opcode("ADD", 1).unwrap();

    asm.a.label("zeroA").unwrap();
    asm.a.literal(0).unwrap();
    asm.b.align(2).unwrap();
    asm.b.label("sixB").unwrap();
    asm.b.literal(6).unwrap();

    let dest = asm.space.ctrl.default_offset; // raw control-bank address
    asm.instruction(0, "ADD", dest, "zeroA", "sixB").unwrap();

    let word = asm.instr.word(0).unwrap();
    assert_eq!(word, (1u64 << 32) | (u64::from(dest) << 20) | 2);
}

#[test]
fn named_destinations_resolve_through_write_banks() {
    let mut asm = asm();
    asm.define_opcode("ADD", add_word()).unwrap();
    asm.load_opcode("ADD", 1).unwrap();

    asm.a.align(5).unwrap();
    asm.a.label("x").unwrap();
    asm.a.literal(0).unwrap();
    asm.b.align(7).unwrap();
    asm.b.label("y").unwrap();
    asm.b.literal(0).unwrap();

    // Destination in B resolves through the B write bank at depth.
    asm.instruction(0, "ADD", "y", "x", "y").unwrap();
    let word = asm.instr.word(0).unwrap();
    assert_eq!(word >> 32, 1);
    assert_eq!((word >> 20) & 0xFFF, 1024 + 7);
    assert_eq!((word >> 10) & 0x3FF, 5);
    assert_eq!(word & 0x3FF, 7);
}

#[test]
fn undefined_operands_fail_at_emission() {
    let mut asm = asm();
    asm.define_opcode("ADD", add_word()).unwrap();
    asm.load_opcode("ADD", 1).unwrap();
    asm.a.label("zeroA").unwrap();
    asm.a.literal(0).unwrap();

    // Only branch targets may be forward references; data operands may not.
    assert!(matches!(
        asm.instruction(0, "ADD", 3092u32, "zeroA", "missing"),
        Err(AsmError::UndefinedSymbol { .. })
    ));
    assert!(matches!(
        asm.instruction(0, "ADD", "missing", "zeroA", "zeroA"),
        Err(AsmError::UnknownDestination { .. })
    ));
}

#[test]
fn ambiguous_destinations_are_rejected() {
    let mut asm = asm();
    asm.define_opcode("ADD", add_word()).unwrap();
    asm.load_opcode("ADD", 1).unwrap();
    asm.a.label("both").unwrap();
    asm.a.literal(0).unwrap();
    asm.b.label("both").unwrap();
    asm.b.literal(0).unwrap();
    assert!(matches!(
        asm.instruction(0, "ADD", "both", "both", "both"),
        Err(AsmError::AmbiguousDestination { .. })
    ));
}

#[test]
fn unknown_mnemonics_fail_at_emission() {
    let mut asm = asm();
    asm.a.label("zeroA").unwrap();
    asm.a.literal(0).unwrap();
    asm.b.label("zeroB").unwrap();
    asm.b.literal(0).unwrap();
    assert!(matches!(
        asm.instruction(0, "MUL", "zeroA", "zeroA", "zeroB"),
        Err(AsmError::UndefinedOpcode { .. })
    ));
}
