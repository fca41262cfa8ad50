//! Hailstone (Collatz) benchmark: every thread walks its own seed array,
//! replacing each seed with the next term of its hailstone sequence. One
//! static instruction stream serves all eight threads through the private
//! memory offsets and programmed-offset pointers.

use barrel_asm::{
    AFlag, AddSub, AluMode, Assembler, BFlag, ControlWord, Dyadic, MachineConfig, PoPort,
    Polarity, ResultSelect, Result, Shift, Split,
};

const SEED: u64 = 11;
const SEED_COUNT: u32 = 6;

fn alu(shift: Shift, select_b: Dyadic, addsub: AddSub) -> Result<ControlWord> {
    ControlWord::new(
        Split::No,
        shift,
        Dyadic::A,
        select_b,
        addsub,
        AluMode::Simple,
        ResultSelect::R,
    )
}

fn define_isa(asm: &mut Assembler) -> Result<()> {
    let nop = ControlWord::new(
        Split::No,
        Shift::None,
        Dyadic::AlwaysZero,
        Dyadic::AlwaysZero,
        AddSub::APlusB,
        AluMode::Simple,
        ResultSelect::R,
    )?;
    // Pass the S register of the dual datapath through.
    let psr = ControlWord::new(
        Split::No,
        Shift::None,
        Dyadic::A,
        Dyadic::AlwaysZero,
        AddSub::APlusB,
        AluMode::Dual,
        ResultSelect::S,
    )?;
    asm.define_opcode("NOP", nop)?;
    asm.define_opcode("ADD", alu(Shift::None, Dyadic::B, AddSub::APlusB)?)?;
    asm.define_opcode("SUB", alu(Shift::None, Dyadic::B, AddSub::AMinusB)?)?;
    asm.define_opcode("PSR", psr)?;
    asm.define_opcode("ADD*2", alu(Shift::Left, Dyadic::B, AddSub::APlusB)?)?;
    asm.define_opcode("ADD/2", alu(Shift::RightSigned, Dyadic::B, AddSub::APlusB)?)?;
    asm.define_opcode("ADD/2U", alu(Shift::Right, Dyadic::B, AddSub::APlusB)?)?;

    asm.load_opcode("NOP", 0)?;
    asm.load_opcode("ADD", 1)?;
    asm.load_opcode("SUB", 2)?;
    asm.load_opcode("ADD*2", 3)?;
    asm.load_opcode("ADD/2", 4)?;
    asm.load_opcode("ADD/2U", 5)?;
    asm.load_opcode("PSR", 6)?;
    Ok(())
}

fn define_conditions(asm: &mut Assembler) -> Result<()> {
    // Jump always.
    asm.condition("JMP", AFlag::Negative, BFlag::LessThan, Dyadic::AlwaysOne)?;
    // Jump on branch sentinel A match.
    asm.condition("BSA", AFlag::Sentinel, BFlag::LessThan, Dyadic::A)?;
    // Jump once the iteration counter stops running.
    asm.condition("CTZ", AFlag::Negative, BFlag::Counter, Dyadic::NotB)?;
    Ok(())
}

fn init_a(asm: &mut Assembler) -> Result<()> {
    asm.a.align(0)?;
    asm.a.label("zeroA")?;
    asm.a.literal(0)?;

    asm.a.align(asm.space.pool.start)?;
    asm.a.label("oneA")?;
    asm.a.literal(1)?;

    asm.a.align(asm.space.indirect.start)?;
    asm.a.label("seed_ptrA")?;
    asm.a.literal(0)?;

    for k in asm.threads.all() {
        asm.a.align(asm.threads.private_start(k)?)?;
        if k == 0 {
            asm.a.label("seedA")?;
            asm.a.literal(0)?;
            asm.a.label("seeds")?;
        } else {
            asm.a.literal(0)?;
        }
        asm.a.array(&[SEED; SEED_COUNT as usize])?;
    }
    Ok(())
}

fn init_b(asm: &mut Assembler) -> Result<()> {
    asm.b.align(0)?;
    asm.b.label("zeroB")?;
    asm.b.literal(0)?;

    asm.b.align(asm.space.pool.start)?;
    asm.b.label("oneB")?;
    asm.b.literal(1)?;
    asm.b.label("sixB")?;
    asm.b.literal(u64::from(SEED_COUNT))?;
    asm.b.label("all_but_lsb_mask")?;
    asm.b.literal(0xF_FFFF_FFFE)?;
    // Branch descriptor cells, patched by the resolution pass.
    asm.b.label("restart_test")?;
    asm.b.literal(0)?;
    asm.b.label("next_test")?;
    asm.b.literal(0)?;
    asm.b.label("even_test")?;
    asm.b.literal(0)?;
    asm.b.label("output_test")?;
    asm.b.literal(0)?;

    for k in asm.threads.all() {
        // The seed pointer walks seedA plus the seed array.
        let read = asm.programmed_offset(PoPort::ReadA, k, 0, "seeds", 1, SEED_COUNT)?;
        let write = asm.programmed_offset(PoPort::WriteA, k, 0, "seeds", 1, SEED_COUNT)?;
        asm.b.align(asm.threads.private_start(k)?)?;
        if k == 0 {
            asm.b.label("nextseedB")?;
            asm.b.literal(0)?;
            asm.b.label("seed_ptrA_init_read")?;
            asm.b.literal(read)?;
            asm.b.label("seed_ptrA_init_write")?;
            asm.b.literal(write)?;
        } else {
            asm.b.literal(0)?;
            asm.b.literal(read)?;
            asm.b.literal(write)?;
        }
    }
    Ok(())
}

fn init_i(asm: &mut Assembler) -> Result<()> {
    asm.instr.align(asm.threads.instr_start(0)?)?;

    // Per-run setup: load the branch units and the seed pointer channels.
    let ctrl = asm.space.ctrl.clone();
    asm.mark_target("restart")?;
    asm.instruction(0, "ADD", ctrl.branch[0].descriptor, "zeroA", "restart_test")?;
    asm.instruction(0, "ADD", ctrl.branch[0].counter, "zeroA", "sixB")?;
    asm.instruction(0, "ADD", ctrl.branch[2].descriptor, "zeroA", "even_test")?;
    asm.instruction(0, "ADD", ctrl.branch[2].sentinel_a, "zeroA", "zeroB")?;
    asm.instruction(0, "ADD", ctrl.branch[2].mask_a, "zeroA", "all_but_lsb_mask")?;
    asm.instruction(0, "ADD", ctrl.branch[3].descriptor, "zeroA", "output_test")?;
    asm.instruction(0, "ADD", ctrl.a_po[0], "zeroA", "seed_ptrA_init_read")?;
    asm.instruction(0, "ADD", ctrl.da_po[0], "zeroA", "seed_ptrA_init_write")?;
    asm.instruction(0, "ADD", ctrl.branch[1].descriptor, "zeroA", "next_test")?;

    // Load x through the seed pointer.
    asm.mark_target("next_seed")?;
    asm.instruction(0, "ADD", "seedA", "seed_ptrA", "zeroB")?;

    // Odd case: y = (3x+1)/2.
    asm.branch("BSA", "even_case", Polarity::OnFalse, "even_test")?;
    asm.instruction(0, "ADD*2", "nextseedB", "seedA", "zeroB")?;
    asm.instruction(0, "ADD", "nextseedB", "seedA", "nextseedB")?;
    asm.branch("JMP", "output", Polarity::OnTrue, "output_test")?;
    asm.instruction(0, "ADD/2U", "nextseedB", "oneA", "nextseedB")?;

    // Even case: y = x/2.
    asm.mark_target("even_case")?;
    asm.instruction(0, "ADD/2U", "nextseedB", "seedA", "zeroB")?;
    asm.instruction(0, "NOP", "zeroA", "zeroA", "zeroB")?;
    asm.instruction(0, "NOP", "zeroA", "zeroA", "zeroB")?;

    // Store y over x, then restart or advance.
    asm.mark_target("output")?;
    asm.branch("CTZ", "restart", Polarity::Always, "restart_test")?;
    asm.branch("JMP", "next_seed", Polarity::Always, "next_test")?;
    asm.instruction(0, "ADD", "seed_ptrA", "zeroA", "nextseedB")?;

    for k in 1..asm.threads.count() {
        asm.instr.align(asm.threads.instr_start(k)?)?;
    }
    Ok(())
}

/// Build the complete benchmark and run the resolution barrier. The returned
/// assembler is ready to export.
pub fn build() -> Result<Assembler> {
    let mut asm = Assembler::new(MachineConfig::default())?;
    asm.init_defaults()?;
    define_isa(&mut asm)?;
    define_conditions(&mut asm)?;
    init_a(&mut asm)?;
    init_b(&mut asm)?;
    init_i(&mut asm)?;
    asm.resolve_forward_branches()?;
    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn demo_builds_and_exports() {
        let asm = build().unwrap();
        let set = asm.export().unwrap();
        assert_eq!(set.instruction.words.len(), 1024);
        // The descriptor cells were patched by resolution.
        let restart_test = asm.b.lookup("restart_test").unwrap();
        assert_ne!(set.operand_b.words[restart_test as usize], 0);
    }

    #[test]
    fn demo_is_deterministic() {
        let first = build().unwrap().export().unwrap();
        let second = build().unwrap().export().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn seed_arrays_land_in_private_regions() {
        let asm = build().unwrap();
        let set = asm.export().unwrap();
        for k in 0..asm.threads.count() {
            let base = asm.threads.private_start(k).unwrap() as usize;
            assert_eq!(set.operand_a.words[base], 0);
            assert_eq!(&set.operand_a.words[base + 1..base + 7], &[SEED; 6]);
        }
    }
}
