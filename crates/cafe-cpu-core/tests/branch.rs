mod common;

use cafe_cpu_core::state::cr_flag;
use common::*;

#[test]
fn unconditional_branch_relative_absolute_and_link() {
    let (interp, mut core, mem) = setup();

    exec(&interp, &mut core, &mem, i_form(2, false, false)); // b +8
    assert_eq!(core.nia, CODE_BASE + 8);
    assert_eq!(core.lr, 0);

    exec(&interp, &mut core, &mem, i_form(2, false, true)); // bl +8
    assert_eq!(core.nia, CODE_BASE + 8);
    assert_eq!(core.lr, CODE_BASE + 4);

    // Backward branch: li = -4 instructions.
    exec(&interp, &mut core, &mem, i_form(0x00ff_fffc, false, false));
    assert_eq!(core.nia, CODE_BASE - 16);

    // Absolute target ignores cia.
    exec(&interp, &mut core, &mem, i_form(0x2000 >> 2, true, false)); // ba 0x2000
    assert_eq!(core.nia, 0x2000);
}

#[test]
fn bdnz_decrements_and_falls_through_at_zero() {
    let (interp, mut core, mem) = setup();

    // bdnz: BO = 16 (decrement CTR, branch while nonzero), displacement +8.
    core.ctr = 2;
    exec(&interp, &mut core, &mem, b_form(16, 0, 2, false, false));
    assert_eq!(core.ctr, 1);
    assert_eq!(core.nia, CODE_BASE + 8);

    exec(&interp, &mut core, &mem, b_form(16, 0, 2, false, false));
    assert_eq!(core.ctr, 0);
    assert_eq!(core.nia, CODE_BASE + 4); // fell through

    // bdz: BO = 18 branches when the decremented CTR reaches zero.
    core.ctr = 1;
    exec(&interp, &mut core, &mem, b_form(18, 0, 2, false, false));
    assert_eq!(core.nia, CODE_BASE + 8);
}

#[test]
fn conditional_branch_on_cr_bit() {
    let (interp, mut core, mem) = setup();

    // beq: BO = 12 (branch if the CR bit is set), BI = 2 (cr0 EQ).
    core.cr.set_bit(2, 1);
    exec(&interp, &mut core, &mem, b_form(12, 2, 4, false, false));
    assert_eq!(core.nia, CODE_BASE + 16);

    core.cr.set_bit(2, 0);
    exec(&interp, &mut core, &mem, b_form(12, 2, 4, false, false));
    assert_eq!(core.nia, CODE_BASE + 4);

    // bne: BO = 4 (branch if clear).
    exec(&interp, &mut core, &mem, b_form(4, 2, 4, false, false));
    assert_eq!(core.nia, CODE_BASE + 16);
}

#[test]
fn branch_to_lr_and_ctr_mask_low_bits() {
    let (interp, mut core, mem) = setup();

    core.lr = 0x2003;
    core.cr.set_bit(0, 0);
    exec(&interp, &mut core, &mem, x_form(19, 20, 0, 0, 16, false)); // blr (BO = 20: always)
    assert_eq!(core.nia, 0x2000);

    core.ctr = 0x3002;
    exec(&interp, &mut core, &mem, x_form(19, 20, 0, 0, 528, false)); // bctr
    assert_eq!(core.nia, 0x3000);

    // bctrl links.
    exec(&interp, &mut core, &mem, x_form(19, 20, 0, 0, 528, true));
    assert_eq!(core.nia, 0x3000);
    assert_eq!(core.lr, CODE_BASE + 4);
}

#[test]
fn integer_compares_set_exactly_one_relation() {
    let (interp, mut core, mem) = setup();

    core.gpr[3] = 0xffff_ffff; // -1 signed, big unsigned
    core.gpr[4] = 1;

    exec(&interp, &mut core, &mem, x_form(31, 0, 3, 4, 0, false)); // cmp cr0, r3, r4
    assert_eq!(core.cr.field(0), cr_flag::LESS_THAN);

    exec(&interp, &mut core, &mem, x_form(31, 0, 3, 4, 32, false)); // cmpl cr0, r3, r4
    assert_eq!(core.cr.field(0), cr_flag::GREATER_THAN);

    exec(&interp, &mut core, &mem, d_form(11, 0, 3, 0xffff)); // cmpi cr0, r3, -1
    assert_eq!(core.cr.field(0), cr_flag::EQUAL);

    exec(&interp, &mut core, &mem, d_form(10, 0, 3, 0xffff)); // cmpli cr0, r3, 0xffff
    assert_eq!(core.cr.field(0), cr_flag::GREATER_THAN);

    // Into a different field, with SO mirrored from XER.
    core.xer.set_so(true);
    exec(
        &interp,
        &mut core,
        &mem,
        x_form(31, 7 << 2, 3, 4, 32, false), // cmpl cr7, r3, r4
    );
    assert_eq!(
        core.cr.field(7),
        cr_flag::GREATER_THAN | cr_flag::SUMMARY_OVERFLOW
    );
}

#[test]
fn cr_bit_logic() {
    let (interp, mut core, mem) = setup();

    core.cr.set_bit(4, 1);
    core.cr.set_bit(5, 0);

    exec(&interp, &mut core, &mem, x_form(19, 6, 4, 5, 449, false)); // cror 6, 4, 5
    assert_eq!(core.cr.bit(6), 1);

    exec(&interp, &mut core, &mem, x_form(19, 6, 4, 5, 257, false)); // crand 6, 4, 5
    assert_eq!(core.cr.bit(6), 0);

    exec(&interp, &mut core, &mem, x_form(19, 6, 4, 5, 129, false)); // crandc 6, 4, 5
    assert_eq!(core.cr.bit(6), 1);

    exec(&interp, &mut core, &mem, x_form(19, 6, 4, 4, 193, false)); // crxor 6, 4, 4
    assert_eq!(core.cr.bit(6), 0);

    exec(&interp, &mut core, &mem, x_form(19, 6, 4, 5, 289, false)); // creqv 6, 4, 5
    assert_eq!(core.cr.bit(6), 0);

    exec(&interp, &mut core, &mem, x_form(19, 6, 4, 5, 33, false)); // crnor 6, 4, 5
    assert_eq!(core.cr.bit(6), 0);

    exec(&interp, &mut core, &mem, x_form(19, 6, 4, 5, 225, false)); // crnand 6, 4, 5
    assert_eq!(core.cr.bit(6), 1);

    exec(&interp, &mut core, &mem, x_form(19, 6, 5, 4, 417, false)); // crorc 6, 5, 4
    assert_eq!(core.cr.bit(6), 0);
}

#[test]
fn cr_field_moves() {
    let (interp, mut core, mem) = setup();

    core.cr.set_field(3, 0xa);
    exec(
        &interp,
        &mut core,
        &mem,
        x_form(19, 0, 3 << 2, 0, 0, false), // mcrf cr0, cr3
    );
    assert_eq!(core.cr.field(0), 0xa);

    // mfcr reads the whole register.
    exec(&interp, &mut core, &mem, x_form(31, 5, 0, 0, 19, false)); // mfcr r5
    assert_eq!(core.gpr[5], core.cr.0);

    // mtcrf writes only the masked fields.
    core.gpr[6] = 0xffff_ffff;
    let crm = 0x80; // field 0 only
    let word = (31 << 26) | (6 << 21) | (crm << 12) | (144 << 1);
    let before = core.cr.0;
    exec(&interp, &mut core, &mem, word);
    assert_eq!(core.cr.0, (before & 0x0fff_ffff) | 0xf000_0000);

    // mcrxr moves XER[0..3] and clears it.
    core.xer.0 = 0xe000_0000;
    exec(&interp, &mut core, &mem, x_form(31, 2 << 2, 0, 0, 512, false)); // mcrxr cr2
    assert_eq!(core.cr.field(2), 0xe);
    assert_eq!(core.xer.0, 0);
    assert!(!core.xer.so());
}
