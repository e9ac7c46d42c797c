use cafe_ppc::{decode, Instruction, InstructionID};

fn id(word: u32) -> Option<InstructionID> {
    decode(Instruction(word))
}

#[test]
fn primary_opcode_forms() {
    assert_eq!(id(0x3864_fffe), Some(InstructionID::Addi)); // addi r3, r4, -2
    assert_eq!(id(0x3c60_8000), Some(InstructionID::Addis)); // addis r3, 0, 0x8000
    assert_eq!(id(0x1ca3_0005), Some(InstructionID::Mulli)); // mulli r5, r3, 5
    assert_eq!(id(0x8064_0010), Some(InstructionID::Lwz)); // lwz r3, 16(r4)
    assert_eq!(id(0x9464_fff0), Some(InstructionID::Stwu)); // stwu r3, -16(r4)
    assert_eq!(id(0xc023_0008), Some(InstructionID::Lfs)); // lfs f1, 8(r3)
    assert_eq!(id(0xdc23_0008), Some(InstructionID::Stfdu)); // stfdu f1, 8(r3)
    assert_eq!(id(0xe003_0000), Some(InstructionID::PsqL)); // psq_l f0, 0(r3), 0, 0
    assert_eq!(id(0x4800_0008), Some(InstructionID::B)); // b +8
    assert_eq!(id(0x4182_0008), Some(InstructionID::Bc)); // beq +8
}

#[test]
fn extended_opcode_forms() {
    assert_eq!(id(0x7ca6_3a14), Some(InstructionID::Add)); // add r5, r6, r7
    assert_eq!(id(0x7ca6_3e14), Some(InstructionID::Add)); // addo r5, r6, r7
    assert_eq!(id(0x7ca6_3a15), Some(InstructionID::Add)); // add. r5, r6, r7
    assert_eq!(id(0x7ca6_3810), Some(InstructionID::Subfc)); // subfc r5, r6, r7
    assert_eq!(id(0x7ca6_39d6), Some(InstructionID::Mullw)); // mullw r5, r6, r7
    assert_eq!(id(0x7ca6_3bd6), Some(InstructionID::Divw)); // divw r5, r6, r7
    assert_eq!(id(0x7c00_0026), Some(InstructionID::Mfcr)); // mfcr r0
    assert_eq!(id(0x7c66_3828), Some(InstructionID::Lwarx)); // lwarx r3, r6, r7
    assert_eq!(id(0x7c66_392d), Some(InstructionID::Stwcx)); // stwcx. r3, r6, r7
    assert_eq!(id(0x7c00_04ac), Some(InstructionID::Sync)); // sync
    assert_eq!(id(0x7c00_3fec), Some(InstructionID::Dcbz)); // dcbz 0, r7
    assert_eq!(id(0x7c61_02a6), Some(InstructionID::Mfspr)); // mfspr r3, XER
    assert_eq!(id(0x7c6c_42e6), Some(InstructionID::Mftb)); // mftb r3
}

#[test]
fn branch_unit_forms() {
    assert_eq!(id(0x4e80_0020), Some(InstructionID::Bclr)); // blr
    assert_eq!(id(0x4e80_0420), Some(InstructionID::Bcctr)); // bctr
    assert_eq!(id(0x4c00_0000), Some(InstructionID::Mcrf)); // mcrf cr0, cr0
    assert_eq!(id(0x4c42_1182), Some(InstructionID::Crxor)); // crxor 2, 2, 2
    assert_eq!(id(0x4c00_012c), Some(InstructionID::Isync)); // isync
}

#[test]
fn float_forms() {
    assert_eq!(id(0xfc22_182a), Some(InstructionID::Fadd)); // fadd f1, f2, f3
    assert_eq!(id(0xec22_182a), Some(InstructionID::Fadds)); // fadds f1, f2, f3
    assert_eq!(id(0xfc22_20fa), Some(InstructionID::Fmadd)); // fmadd f1, f2, f3, f4
    assert_eq!(id(0xfc20_1834), Some(InstructionID::Frsqrte)); // frsqrte f1, f3
    assert_eq!(id(0xec20_1830), Some(InstructionID::Fres)); // fres f1, f3
    assert_eq!(id(0xfc20_181e), Some(InstructionID::Fctiwz)); // fctiwz f1, f3
    assert_eq!(id(0xfc20_1818), Some(InstructionID::Frsp)); // frsp f1, f3
    assert_eq!(id(0xfc20_1a10), Some(InstructionID::Fabs)); // fabs f1, f3
    assert_eq!(id(0xfc01_1800), Some(InstructionID::Fcmpu)); // fcmpu cr0, f1, f3
    assert_eq!(id(0xfc01_1840), Some(InstructionID::Fcmpo)); // fcmpo cr0, f1, f3
    assert_eq!(id(0xfc20_048e), Some(InstructionID::Mffs)); // mffs f1
    assert_eq!(id(0xfdfe_058e), Some(InstructionID::Mtfsf)); // mtfsf 0xff, f0
}

#[test]
fn paired_single_forms() {
    assert_eq!(id(0x1022_182a), Some(InstructionID::PsAdd)); // ps_add f1, f2, f3
    assert_eq!(id(0x1022_1824), Some(InstructionID::PsDiv)); // ps_div f1, f2, f3
    assert_eq!(id(0x1022_0118), Some(InstructionID::PsMuls0)); // ps_muls0 f1, f2, f4
    assert_eq!(id(0x1022_18d4), Some(InstructionID::PsSum0)); // ps_sum0 f1, f2, f3, f3
    assert_eq!(id(0x1022_1c20), Some(InstructionID::PsMerge00)); // ps_merge00 f1, f2, f3
    assert_eq!(id(0x1022_1ce0), Some(InstructionID::PsMerge11)); // ps_merge11 f1, f2, f3
    assert_eq!(id(0x1020_1850), Some(InstructionID::PsNeg)); // ps_neg f1, f3
    assert_eq!(id(0x1003_200c), Some(InstructionID::PsqLx)); // psq_lx f0, r3, r4, 0, 0
    assert_eq!(id(0x1000_3fec), Some(InstructionID::DcbzL)); // dcbz_l 0, r7
}

#[test]
fn bridge_call_opcode() {
    let word = (1 << 26) | 0x2a;
    assert_eq!(id(word), Some(InstructionID::Kc));
    assert_eq!(Instruction(word).kcn(), 0x2a);
}

#[test]
fn invalid_words_do_not_decode() {
    assert_eq!(id(0x0000_0000), None);
    assert_eq!(id(0xfc00_0004), None); // opcd 63, xo10 = 2
    assert_eq!(id(0x4c00_0004), None); // opcd 19, xo10 = 2
    assert_eq!(id(0x7c00_0008), None); // tw (trap) is not modeled
    assert_eq!(id(0x4400_0002), None); // sc (syscall) is not modeled
}
