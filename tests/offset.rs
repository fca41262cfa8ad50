use barrel_asm::offset;
use barrel_asm::{AsmError, Assembler, MachineConfig, PoPort};

fn with_symbol(addr: u32) -> Assembler {
    let mut asm = Assembler::new(MachineConfig::default()).unwrap();
    asm.a.align(addr).unwrap();
    asm.a.label("slot").unwrap();
    asm.a.literal(0).unwrap();
    asm
}

#[test]
fn just_fitting_offset_round_trips() {
    let asm = with_symbol(1023);
    let value = asm
        .programmed_offset(PoPort::ReadA, 0, 0, "slot", 3, 1)
        .unwrap();
    let (offset, stride) = offset::decode(PoPort::ReadA, &asm.space, value);
    assert_eq!(offset, 1023);
    assert_eq!(stride, 3);
}

#[test]
fn thread_offset_is_folded_into_the_base() {
    let asm = with_symbol(100);
    let value = asm
        .programmed_offset(PoPort::ReadA, 3, 2, "slot", 1, 1)
        .unwrap();
    let (offset, _) = offset::decode(PoPort::ReadA, &asm.space, value);
    // 100 + base 2 + thread 3 * 124
    assert_eq!(offset, 474);
}

#[test]
fn offsets_past_the_field_width_are_rejected() {
    let asm = with_symbol(1000);
    // Thread 7's runtime offset pushes the base past the 10-bit read field.
    let err = asm
        .programmed_offset(PoPort::ReadA, 7, 0, "slot", 1, 1)
        .unwrap_err();
    assert!(matches!(
        err,
        AsmError::OffsetRange {
            port: PoPort::ReadA,
            bits: 10,
            ..
        }
    ));
    // The write-port field is two bits wider, so the same value fits.
    assert!(asm
        .programmed_offset(PoPort::WriteA, 7, 0, "slot", 1, 1)
        .is_ok());
}

#[test]
fn strided_walk_must_stay_inside_the_field() {
    let asm = with_symbol(1020);
    assert!(asm
        .programmed_offset(PoPort::ReadA, 0, 0, "slot", 1, 4)
        .is_ok());
    assert!(matches!(
        asm.programmed_offset(PoPort::ReadA, 0, 0, "slot", 1, 5),
        Err(AsmError::OffsetRange { .. })
    ));
}

#[test]
fn stride_field_is_bounded() {
    let asm = with_symbol(0);
    assert!(asm
        .programmed_offset(PoPort::ReadA, 0, 0, "slot", 15, 1)
        .is_ok());
    assert!(asm
        .programmed_offset(PoPort::ReadA, 0, 0, "slot", 16, 1)
        .is_err());
}

#[test]
fn symbols_resolve_in_the_ports_plane() {
    let asm = with_symbol(10);
    // "slot" lives in operand-A; the B read port cannot see it.
    assert!(matches!(
        asm.programmed_offset(PoPort::ReadB, 0, 0, "slot", 1, 1),
        Err(AsmError::UndefinedSymbol { .. })
    ));
}
