use barrel_asm::space::AddressSpace;
use barrel_asm::{AsmError, MachineConfig, Plane};

#[test]
fn private_memory_divides_between_threads() {
    // D=1024, S=32, N=8 -> 124 words each, offsets in steps of 124.
    let space = AddressSpace::new(&MachineConfig::default()).unwrap();
    assert_eq!(space.private_depth, 124);
    assert_eq!(
        space.runtime_offset,
        vec![0, 124, 248, 372, 496, 620, 744, 868]
    );
    assert_eq!(space.shared, 0..32);
    assert_eq!(space.pool, 1..24);
    assert_eq!(space.indirect, 24..28);
    assert_eq!(space.io, 28..32);
    assert_eq!(space.private, 32..156);
}

#[test]
fn uneven_private_partition_is_rejected() {
    // ceil((1024-32)/7) = 142, and 7*142 overshoots the declared depth.
    let cfg = MachineConfig {
        thread_count: 7,
        ..MachineConfig::default()
    };
    assert!(matches!(
        AddressSpace::new(&cfg),
        Err(AsmError::Configuration(_))
    ));
}

#[test]
fn regions_must_nest_inside_shared() {
    let cfg = MachineConfig {
        io_base: 30,
        io_size: 4,
        ..MachineConfig::default()
    };
    assert!(matches!(
        AddressSpace::new(&cfg),
        Err(AsmError::Configuration(_))
    ));

    let cfg = MachineConfig {
        indirect_base: 30,
        indirect_size: 4,
        ..MachineConfig::default()
    };
    assert!(AddressSpace::new(&cfg).is_err());

    let cfg = MachineConfig {
        thread_count: 0,
        ..MachineConfig::default()
    };
    assert!(AddressSpace::new(&cfg).is_err());
}

#[test]
fn word_format_fields_cover_the_word() {
    let space = AddressSpace::new(&MachineConfig::default()).unwrap();
    let fmt = space.format;
    assert_eq!(fmt.addr_bits, 10);
    assert_eq!(fmt.waddr_bits, 12);
    assert_eq!(fmt.opcode_bits, 4);
    assert_eq!(fmt.opcode_slots(), 16);
    assert_eq!(fmt.opcode_bits + fmt.waddr_bits + 2 * fmt.addr_bits, 36);
}

#[test]
fn read_to_write_conversion() {
    let space = AddressSpace::new(&MachineConfig::default()).unwrap();
    assert_eq!(space.read_to_write(Plane::OperandA, 5).unwrap(), 5);
    assert_eq!(space.read_to_write(Plane::OperandB, 5).unwrap(), 1029);
    // The instruction plane is readable only by the program counter and the
    // control bank not at all; conversion is a caller error, not a default.
    assert!(matches!(
        space.read_to_write(Plane::Instruction, 0),
        Err(AsmError::UnknownPlane {
            plane: Plane::Instruction
        })
    ));
    assert!(space.read_to_write(Plane::Control, 0).is_err());
}

#[test]
fn control_map_matches_hardware_register_file() {
    let space = AddressSpace::new(&MachineConfig::default()).unwrap();
    let ctrl = &space.ctrl;
    assert_eq!(ctrl.s, 3072);
    assert_eq!(ctrl.a_po, vec![3076, 3077, 3078, 3079]);
    assert_eq!(ctrl.b_po, vec![3080, 3081, 3082, 3083]);
    assert_eq!(ctrl.da_po, vec![3084, 3085, 3086, 3087]);
    assert_eq!(ctrl.db_po, vec![3088, 3089, 3090, 3091]);
    assert_eq!(ctrl.default_offset, 3092);

    assert_eq!(ctrl.branch.len(), 4);
    assert_eq!(ctrl.branch[0].sentinel_a, 3100);
    assert_eq!(ctrl.branch[0].mask_a, 3101);
    assert_eq!(ctrl.branch[0].sentinel_b, 3102);
    assert_eq!(ctrl.branch[0].mask_b, 3103);
    assert_eq!(ctrl.branch[0].counter, 3104);
    assert_eq!(ctrl.branch[0].descriptor, 3105);
    assert_eq!(ctrl.branch[3].sentinel_a, 3118);
    assert_eq!(ctrl.branch[3].descriptor, 3123);

    assert_eq!(ctrl.opcode_decode.len(), 16);
    assert_eq!(ctrl.opcode_decode[0], 3200);
    assert_eq!(ctrl.opcode_decode[15], 3215);
}
