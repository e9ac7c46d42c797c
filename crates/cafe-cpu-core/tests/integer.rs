mod common;

use cafe_cpu_core::state::cr_flag;
use common::*;

#[test]
fn addc_carries_on_unsigned_overflow() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0xffff_ffff;
    core.gpr[4] = 1;

    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 10, false)); // addc r5, r3, r4

    assert_eq!(core.gpr[5], 0);
    assert!(core.xer.ca());
    assert!(!core.xer.ov());
}

#[test]
fn adde_consumes_carry() {
    let (interp, mut core, mem) = setup();

    // Low half: 0xffffffff + 1 carries out.
    core.gpr[3] = 0xffff_ffff;
    core.gpr[4] = 1;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 10, false)); // addc r5, r3, r4

    // High half: 2 + 3 + carry.
    core.gpr[6] = 2;
    core.gpr[7] = 3;
    exec(&interp, &mut core, &mem, xo_form(8, 6, 7, false, 138, false)); // adde r8, r6, r7

    assert_eq!(core.gpr[8], 6);
    assert!(!core.xer.ca());
}

#[test]
fn addi_treats_r0_as_zero() {
    let (interp, mut core, mem) = setup();

    core.gpr[0] = 0x1234_5678;
    exec(&interp, &mut core, &mem, d_form(14, 3, 0, 0x8000)); // addi r3, 0, -0x8000

    assert_eq!(core.gpr[3], 0xffff_8000);

    core.gpr[4] = 0x10;
    exec(&interp, &mut core, &mem, d_form(14, 3, 4, 0xfffe)); // addi r3, r4, -2
    assert_eq!(core.gpr[3], 0x0e);
}

#[test]
fn mullw_record_sets_overflow_and_cr0() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0x8000_0000;
    core.gpr[4] = 0xffff_ffff;

    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, true, 235, true)); // mullwo. r5, r3, r4

    assert_eq!(core.gpr[5], 0x8000_0000);
    assert!(core.xer.ov());
    assert!(core.xer.so());
    assert_eq!(
        core.cr.field(0),
        cr_flag::NEGATIVE | cr_flag::SUMMARY_OVERFLOW
    );
}

#[test]
fn xer_so_is_sticky_until_explicitly_cleared() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0x8000_0000;
    core.gpr[4] = 0xffff_ffff;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, true, 235, false)); // mullwo
    assert!(core.xer.so());

    // A non-overflowing op with OE clears OV but never SO.
    core.gpr[3] = 2;
    core.gpr[4] = 3;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, true, 235, false));
    assert!(!core.xer.ov());
    assert!(core.xer.so());

    // mtspr XER is the explicit clear.
    core.gpr[6] = 0;
    exec(
        &interp,
        &mut core,
        &mem,
        x_form(31, 6, spr_field(1) >> 5, spr_field(1) & 0x1f, 467, false),
    );
    assert!(!core.xer.so());
}

#[test]
fn mulhw_takes_high_word() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0x8000_0000;
    core.gpr[4] = 2;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 75, false)); // mulhw r5, r3, r4
    assert_eq!(core.gpr[5], 0xffff_ffff); // -2^31 * 2 >> 32

    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 11, false)); // mulhwu r5, r3, r4
    assert_eq!(core.gpr[5], 1);
}

#[test]
fn mulli_low_signed() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 10;
    exec(&interp, &mut core, &mem, d_form(7, 5, 3, 0xfffe)); // mulli r5, r3, -2
    assert_eq!(core.gpr[5], 0xffff_ffec); // -20
}

#[test]
fn divide_guards() {
    let (interp, mut core, mem) = setup();

    // Divide by zero, positive dividend.
    core.gpr[3] = 5;
    core.gpr[4] = 0;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, true, 491, false)); // divwo r5, r3, r4
    assert_eq!(core.gpr[5], 0);
    assert!(core.xer.ov());

    // Divide by zero, negative dividend.
    core.gpr[3] = 0x8000_0000;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 491, false));
    assert_eq!(core.gpr[5], 0xffff_ffff);

    // INT_MIN / -1 traps on hardware dividers; the result matches the
    // by-zero rule.
    core.gpr[4] = 0xffff_ffff;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 491, false));
    assert_eq!(core.gpr[5], 0xffff_ffff);

    // Unsigned: 0x80000000 / -1u is just a small quotient.
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 459, false)); // divwu
    assert_eq!(core.gpr[5], 0);

    core.gpr[3] = 100;
    core.gpr[4] = 7;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 491, false));
    assert_eq!(core.gpr[5], 14);
}

#[test]
fn subtract_family_carry_is_not_borrow() {
    let (interp, mut core, mem) = setup();

    // 5 - 1: no borrow, CA set.
    core.gpr[3] = 1;
    core.gpr[4] = 5;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 8, false)); // subfc r5, r3, r4
    assert_eq!(core.gpr[5], 4);
    assert!(core.xer.ca());

    // 0 - 1: borrow, CA clear.
    core.gpr[4] = 0;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 8, false));
    assert_eq!(core.gpr[5], 0xffff_ffff);
    assert!(!core.xer.ca());

    // subfic with immediate.
    core.gpr[3] = 3;
    exec(&interp, &mut core, &mem, d_form(8, 5, 3, 10)); // subfic r5, r3, 10
    assert_eq!(core.gpr[5], 7);
    assert!(core.xer.ca());
}

#[test]
fn neg_overflows_only_on_int_min() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0x8000_0000;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 0, true, 104, false)); // nego r5, r3
    assert_eq!(core.gpr[5], 0x8000_0000);
    assert!(core.xer.ov());

    core.gpr[3] = 7;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 0, true, 104, false));
    assert_eq!(core.gpr[5], 0xffff_fff9);
    assert!(!core.xer.ov());
}

#[test]
fn logical_ops_and_records() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0xf0f0_1234;

    exec(&interp, &mut core, &mem, d_form(28, 3, 4, 0xff00)); // andi. r4, r3, 0xff00
    assert_eq!(core.gpr[4], 0x1200);
    assert_eq!(core.cr.field(0), cr_flag::POSITIVE);

    exec(&interp, &mut core, &mem, d_form(29, 3, 4, 0x000f)); // andis. r4, r3, 0xf
    assert_eq!(core.gpr[4], 0x000f_0000 & 0xf0f0_1234);

    exec(&interp, &mut core, &mem, d_form(24, 3, 4, 0x00ff)); // ori r4, r3, 0xff
    assert_eq!(core.gpr[4], 0xf0f0_12ff);

    exec(&interp, &mut core, &mem, d_form(26, 3, 4, 0xffff)); // xori
    assert_eq!(core.gpr[4], 0xf0f0_1234 ^ 0xffff);

    core.gpr[5] = 0x0000_ffff;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 60, false)); // andc r4, r3, r5
    assert_eq!(core.gpr[4], 0xf0f0_0000);

    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 476, false)); // nand
    assert_eq!(core.gpr[4], !(0xf0f0_1234 & 0x0000_ffff));

    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 124, false)); // nor
    assert_eq!(core.gpr[4], !(0xf0f0_1234 | 0x0000_ffff));

    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 284, false)); // eqv
    assert_eq!(core.gpr[4], !(0xf0f0_1234 ^ 0x0000_ffff));
}

#[test]
fn record_forms_set_cr0_from_result_sign() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0;
    core.gpr[4] = 0;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 266, true)); // add. r5, r3, r4
    assert_eq!(core.cr.field(0), cr_flag::ZERO);

    core.gpr[4] = 0x8000_0000;
    exec(&interp, &mut core, &mem, xo_form(5, 3, 4, false, 266, true));
    assert_eq!(core.cr.field(0), cr_flag::NEGATIVE);
}

#[test]
fn sign_extension_and_count_leading_zeros() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0x80;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 0, 954, false)); // extsb r4, r3
    assert_eq!(core.gpr[4], 0xffff_ff80);

    core.gpr[3] = 0x7fff;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 0, 922, false)); // extsh r4, r3
    assert_eq!(core.gpr[4], 0x7fff);

    core.gpr[3] = 0;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 0, 26, false)); // cntlzw r4, r3
    assert_eq!(core.gpr[4], 32);

    core.gpr[3] = 0x0000_8000;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 0, 26, false));
    assert_eq!(core.gpr[4], 16);
}

#[test]
fn rotate_and_mask() {
    let (interp, mut core, mem) = setup();

    // rlwinm r4, r3, 8, 24, 31: rotate left 8, keep the low byte.
    core.gpr[3] = 0x1234_5678;
    exec(&interp, &mut core, &mem, m_form(21, 3, 4, 8, 24, 31, false));
    assert_eq!(core.gpr[4], 0x12);

    // Wrapping mask.
    exec(&interp, &mut core, &mem, m_form(21, 3, 4, 0, 24, 0, false));
    assert_eq!(core.gpr[4], 0x1234_5678 & 0x8000_00ff);

    // rlwimi keeps the unmasked destination bits.
    core.gpr[3] = 0x0000_00aa;
    core.gpr[4] = 0x1111_1111;
    exec(&interp, &mut core, &mem, m_form(20, 3, 4, 8, 16, 23, false));
    assert_eq!(core.gpr[4], 0x1111_aa11);

    // rlwnm takes the rotate count from rB.
    core.gpr[3] = 0x8000_0001;
    core.gpr[5] = 1;
    exec(&interp, &mut core, &mem, m_form(23, 3, 4, 5, 0, 31, false));
    assert_eq!(core.gpr[4], 0x0000_0003);
}

#[test]
fn shifts_and_arithmetic_shift_carry() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0x8000_0001;
    core.gpr[5] = 4;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 24, false)); // slw r4, r3, r5
    assert_eq!(core.gpr[4], 0x0000_0010);

    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 536, false)); // srw
    assert_eq!(core.gpr[4], 0x0800_0000);

    // Shift amounts with bit 5 set clear the result.
    core.gpr[5] = 32;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 24, false));
    assert_eq!(core.gpr[4], 0);

    // srawi: negative input shedding ones sets CA.
    core.gpr[3] = 0xffff_ffff;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 1, 824, false)); // srawi r4, r3, 1
    assert_eq!(core.gpr[4], 0xffff_ffff);
    assert!(core.xer.ca());

    // Negative input shedding only zeros does not.
    core.gpr[3] = 0xffff_fffe;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 1, 824, false));
    assert_eq!(core.gpr[4], 0xffff_ffff);
    assert!(!core.xer.ca());

    // sraw with an out-of-range count sign-fills.
    core.gpr[3] = 0x8000_0000;
    core.gpr[5] = 40;
    exec(&interp, &mut core, &mem, x_form(31, 3, 4, 5, 792, false)); // sraw r4, r3, r5
    assert_eq!(core.gpr[4], 0xffff_ffff);
    assert!(core.xer.ca());
}
