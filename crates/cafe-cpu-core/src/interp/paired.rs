//! Paired-single arithmetic.
//!
//! Lanes execute independently with their own exception classification;
//! FPSCR stickies merge across lanes, FPRF reflects lane 0 only, and an
//! enabled invalid/zero-divide on either lane suppresses the whole
//! register write.

use std::hint::black_box;

use cafe_mem::GuestMemory;
use cafe_ppc::{Instruction, InstructionID};

use super::float::{
    ppc_estimate_reciprocal, ppc_estimate_reciprocal_root, round_fma_result_to_single,
    round_for_multiply, update_float_condition_register, update_fprf32, update_fprf64,
    update_fpscr,
};
use super::Interpreter;
use crate::fpbits::{
    exponent64, extend_float, extend_float_nan_bits, is_signalling_nan64, make_nan32,
    make_quiet32, possible_underflow32, truncate_double, truncate_double_bits,
};
use crate::hostfpu::{self, FpExceptions};
use crate::state::{Core, RoundMode};

// Register move / sign-bit manipulation. Signaling NaN lanes keep their
// truncated bit pattern; anything else goes through a rounding
// conversion.
#[derive(Clone, Copy, PartialEq)]
enum MoveMode {
    Direct,
    Negate,
    Absolute,
    NegAbsolute,
}

fn move_generic(core: &mut Core, instr: Instruction, mode: MoveMode) {
    let src = core.fpr[instr.rb() as usize];
    let ps0_nan = is_signalling_nan64(src.paired0());
    let ps1_nan = is_signalling_nan64(src.paired1());

    let b0 = if ps0_nan {
        truncate_double_bits(src.idw())
    } else {
        // ps0 may carry excess precision and has to round.
        (src.paired0() as f32).to_bits()
    };
    // ps1 is always truncated, NaN or not.
    let b1 = truncate_double(src.paired1()).to_bits();

    let (d0, d1) = match mode {
        MoveMode::Direct => (b0, b1),
        MoveMode::Negate => (b0 ^ 0x8000_0000, b1 ^ 0x8000_0000),
        MoveMode::Absolute => (b0 & !0x8000_0000, b1 & !0x8000_0000),
        MoveMode::NegAbsolute => (b0 | 0x8000_0000, b1 | 0x8000_0000),
    };

    let fpr = &mut core.fpr[instr.rd() as usize];
    if ps0_nan {
        fpr.set_idw(extend_float_nan_bits(d0).to_bits());
    } else {
        fpr.set_paired0(f32::from_bits(d0) as f64);
    }
    if ps1_nan {
        fpr.set_idw_paired1(extend_float_nan_bits(d1).to_bits());
    } else {
        fpr.set_paired1(f32::from_bits(d1) as f64);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn ps_mr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    move_generic(core, instr, MoveMode::Direct)
}

fn ps_neg(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    move_generic(core, instr, MoveMode::Negate)
}

fn ps_abs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    move_generic(core, instr, MoveMode::Absolute)
}

fn ps_nabs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    move_generic(core, instr, MoveMode::NegAbsolute)
}

#[derive(Clone, Copy, PartialEq)]
enum PsOp {
    Add,
    Sub,
    Mul,
    Div,
}

fn ps_lane(core: &Core, reg: u32, slot: u32) -> f64 {
    if slot == 0 {
        core.fpr[reg as usize].paired0()
    } else {
        core.fpr[reg as usize].paired1()
    }
}

/// One lane of a paired arithmetic op. Returns the result, or `None` when
/// an enabled exception aborts the write.
fn ps_arith_single(
    core: &mut Core,
    instr: Instruction,
    op: PsOp,
    slot_a: u32,
    slot_b: u32,
) -> Option<f32> {
    let mut a = ps_lane(core, instr.ra(), slot_a);
    let b_reg = if op == PsOp::Mul {
        instr.frc()
    } else {
        instr.rb()
    };
    let mut b = ps_lane(core, b_reg, slot_b);

    let vxsnan = is_signalling_nan64(a) || is_signalling_nan64(b);
    let (vxisi, vximz, vxidi, vxzdz, zx) = match op {
        PsOp::Add => (
            a.is_infinite() && b.is_infinite() && a.is_sign_negative() != b.is_sign_negative(),
            false,
            false,
            false,
            false,
        ),
        PsOp::Sub => (
            a.is_infinite() && b.is_infinite() && a.is_sign_negative() == b.is_sign_negative(),
            false,
            false,
            false,
            false,
        ),
        PsOp::Mul => (
            false,
            (a.is_infinite() && b == 0.0) || (a == 0.0 && b.is_infinite()),
            false,
            false,
            false,
        ),
        PsOp::Div => {
            let vxzdz = a == 0.0 && b == 0.0;
            (
                false,
                false,
                a.is_infinite() && b.is_infinite(),
                vxzdz,
                !(vxzdz || vxsnan) && b == 0.0,
            )
        }
    };

    if vxsnan {
        core.fpscr.set_vxsnan(true);
    }
    if vxisi {
        core.fpscr.set_vxisi(true);
    }
    if vximz {
        core.fpscr.set_vximz(true);
    }
    if vxidi {
        core.fpscr.set_vxidi(true);
    }
    if vxzdz {
        core.fpscr.set_vxzdz(true);
    }
    if zx {
        core.fpscr.set_zx(true);
    }

    let vx_enabled = (vxsnan || vxisi || vximz || vxidi || vxzdz) && core.fpscr.ve();
    let zx_enabled = zx && core.fpscr.ze();
    if vx_enabled || zx_enabled {
        return None;
    }

    let d = if a.is_nan() {
        make_quiet32(truncate_double(a))
    } else if b.is_nan() {
        make_quiet32(truncate_double(b))
    } else if vxisi || vximz || vxidi || vxzdz {
        make_nan32()
    } else {
        if op == PsOp::Mul && slot_b == 0 {
            round_for_multiply(&mut a, &mut b); // Not needed for slot 1.
        }
        let d = match op {
            PsOp::Add => (a + b) as f32,
            PsOp::Sub => (a - b) as f32,
            PsOp::Mul => (a * b) as f32,
            PsOp::Div => (a / b) as f32,
        };

        if possible_underflow32(d) {
            let old_round = hostfpu::round_mode();
            hostfpu::set_round_mode(RoundMode::Zero);

            let bb = black_box(b);
            black_box(match op {
                PsOp::Add => (a + bb) as f32,
                PsOp::Sub => (a - bb) as f32,
                PsOp::Mul => (a * bb) as f32,
                PsOp::Div => (a / bb) as f32,
            });

            hostfpu::set_round_mode(old_round);
        }

        d
    };

    Some(d)
}

fn ps_arith_generic(core: &mut Core, instr: Instruction, op: PsOp, slot_b0: u32, slot_b1: u32) {
    let old_fpscr = core.fpscr.0;

    let d0 = ps_arith_single(core, instr, op, 0, slot_b0);
    let d1 = ps_arith_single(core, instr, op, 1, slot_b1);

    if let (Some(d0), Some(d1)) = (d0, d1) {
        core.fpr[instr.rd() as usize].set_paired0(extend_float(d0));
        core.fpr[instr.rd() as usize].set_paired1(extend_float(d1));
    }

    if let Some(d0) = d0 {
        update_fprf32(core, d0);
    }
    update_fpscr(core, old_fpscr);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn ps_add(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_arith_generic(core, instr, PsOp::Add, 0, 1)
}

fn ps_sub(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_arith_generic(core, instr, PsOp::Sub, 0, 1)
}

fn ps_mul(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_arith_generic(core, instr, PsOp::Mul, 0, 1)
}

fn ps_muls0(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_arith_generic(core, instr, PsOp::Mul, 0, 0)
}

fn ps_muls1(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_arith_generic(core, instr, PsOp::Mul, 1, 1)
}

fn ps_div(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_arith_generic(core, instr, PsOp::Div, 0, 1)
}

// ps_sum0/ps_sum1: one lane takes ps0 + frB.ps1, the other copies frC.
fn ps_sum_generic(core: &mut Core, instr: Instruction, slot: u32) {
    let old_fpscr = core.fpscr.0;

    if let Some(d) = ps_arith_single(core, instr, PsOp::Add, 0, 1) {
        update_fprf32(core, d);

        if slot == 0 {
            let c_ps1 = core.fpr[instr.frc() as usize].idw_paired1();
            let fpr = &mut core.fpr[instr.rd() as usize];
            fpr.set_paired0(extend_float(d));
            fpr.set_idw_paired1(c_ps1);
        } else {
            let c_ps0 = core.fpr[instr.frc() as usize].paired0();

            let ps0 = if c_ps0.is_nan() {
                truncate_double(c_ps0)
            } else {
                // The copy must not contribute inexact/overflow of its
                // own; scrub whatever the conversion raises.
                let inexact = !hostfpu::test(FpExceptions::INEXACT).is_empty();
                let overflow = !hostfpu::test(FpExceptions::OVERFLOW).is_empty();

                let ps0 = c_ps0 as f32;

                if !inexact {
                    hostfpu::clear(FpExceptions::INEXACT);
                }
                if !overflow {
                    hostfpu::clear(FpExceptions::OVERFLOW);
                }

                ps0
            };

            let fpr = &mut core.fpr[instr.rd() as usize];
            fpr.set_paired0(extend_float(ps0));
            fpr.set_paired1(extend_float(d));
        }
    }

    update_fpscr(core, old_fpscr);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn ps_sum0(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_sum_generic(core, instr, 0)
}

fn ps_sum1(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_sum_generic(core, instr, 1)
}

// Fused multiply-add lanes.
const FMA_SUBTRACT: u32 = 1 << 0;
const FMA_NEGATE: u32 = 1 << 1;

fn ps_fma_single<const FLAGS: u32>(
    core: &mut Core,
    instr: Instruction,
    slot_ab: u32,
    slot_c: u32,
) -> Option<f32> {
    let mut a = ps_lane(core, instr.ra(), slot_ab);
    let b = ps_lane(core, instr.rb(), slot_ab);
    let mut c = ps_lane(core, instr.frc(), slot_c);

    let addend = if FLAGS & FMA_SUBTRACT != 0 { -b } else { b };

    let vxsnan = is_signalling_nan64(a) || is_signalling_nan64(b) || is_signalling_nan64(c);
    let vximz = (a.is_infinite() && c == 0.0) || (a == 0.0 && c.is_infinite());
    let vxisi = !vximz
        && !a.is_nan()
        && !c.is_nan()
        && (a.is_infinite() || c.is_infinite())
        && b.is_infinite()
        && (a.is_sign_negative() ^ c.is_sign_negative()) != addend.is_sign_negative();

    if vxsnan {
        core.fpscr.set_vxsnan(true);
    }
    if vxisi {
        core.fpscr.set_vxisi(true);
    }
    if vximz {
        core.fpscr.set_vximz(true);
    }

    if (vxsnan || vxisi || vximz) && core.fpscr.ve() {
        return None;
    }

    let d = if a.is_nan() {
        make_quiet32(truncate_double(a))
    } else if b.is_nan() {
        make_quiet32(truncate_double(b))
    } else if c.is_nan() {
        make_quiet32(truncate_double(c))
    } else if vxisi || vximz {
        make_nan32()
    } else {
        if slot_c == 0 {
            round_for_multiply(&mut a, &mut c); // Not needed for slot 1.
        }

        let d64 = a.mul_add(c, addend);
        let mut d = if core.fpscr.rn() == RoundMode::Nearest {
            round_fma_result_to_single(d64, a, addend, c)
        } else {
            d64 as f32
        };

        if possible_underflow32(d) {
            let old_round = hostfpu::round_mode();
            hostfpu::set_round_mode(RoundMode::Zero);

            let addend_temp = black_box(addend);
            black_box(a.mul_add(c, addend_temp) as f32);

            hostfpu::set_round_mode(old_round);
        }

        if FLAGS & FMA_NEGATE != 0 {
            d = -d;
        }
        d
    };

    Some(d)
}

fn ps_fma_generic<const FLAGS: u32>(
    core: &mut Core,
    instr: Instruction,
    slot_c0: u32,
    slot_c1: u32,
) {
    let old_fpscr = core.fpscr.0;

    let d0 = ps_fma_single::<FLAGS>(core, instr, 0, slot_c0);
    let d1 = ps_fma_single::<FLAGS>(core, instr, 1, slot_c1);

    if let (Some(d0), Some(d1)) = (d0, d1) {
        core.fpr[instr.rd() as usize].set_paired0(extend_float(d0));
        core.fpr[instr.rd() as usize].set_paired1(extend_float(d1));
    }

    if let Some(d0) = d0 {
        update_fprf32(core, d0);
    }
    update_fpscr(core, old_fpscr);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn ps_madd(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_fma_generic::<0>(core, instr, 0, 1)
}

fn ps_madds0(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_fma_generic::<0>(core, instr, 0, 0)
}

fn ps_madds1(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_fma_generic::<0>(core, instr, 1, 1)
}

fn ps_msub(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_fma_generic::<FMA_SUBTRACT>(core, instr, 0, 1)
}

fn ps_nmadd(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_fma_generic::<FMA_NEGATE>(core, instr, 0, 1)
}

fn ps_nmsub(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    ps_fma_generic::<{ FMA_NEGATE | FMA_SUBTRACT }>(core, instr, 0, 1)
}

// Merges. Lane 0 rounds; a double inserted into lane 1 truncates, with
// out-of-single-range values pinned to f32::MAX.
const MERGE_VALUE0: u32 = 1 << 0; // lane 0 comes from frA.ps1
const MERGE_VALUE1: u32 = 1 << 1; // lane 1 comes from frB.ps1

fn merge_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let a = core.fpr[instr.ra() as usize];
    let b = core.fpr[instr.rb() as usize];

    let a_lane = if FLAGS & MERGE_VALUE0 != 0 {
        a.paired1()
    } else {
        a.paired0()
    };
    let d0 = if is_signalling_nan64(a_lane) {
        truncate_double(a_lane)
    } else {
        a_lane as f32
    };

    let d1_double = if FLAGS & MERGE_VALUE1 != 0 {
        b.paired1()
    } else {
        b.paired0()
    };
    let d1_exponent = exponent64(d1_double.to_bits());
    let d1 = if (1151..2047).contains(&d1_exponent) {
        f32::MAX
    } else {
        truncate_double(d1_double)
    };

    core.fpr[instr.rd() as usize].set_paired0(extend_float(d0));
    core.fpr[instr.rd() as usize].set_paired1(extend_float(d1));

    // The conversions above may have raised inexact/overflow on the host;
    // none of it may leak into later instructions.
    hostfpu::clear(FpExceptions::all());

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn ps_merge00(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    merge_generic::<0>(core, instr)
}

fn ps_merge01(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    merge_generic::<MERGE_VALUE1>(core, instr)
}

fn ps_merge10(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    merge_generic::<MERGE_VALUE0>(core, instr)
}

fn ps_merge11(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    merge_generic::<{ MERGE_VALUE0 | MERGE_VALUE1 }>(core, instr)
}

fn ps_res(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b0 = core.fpr[instr.rb() as usize].paired0();
    let b1 = core.fpr[instr.rb() as usize].paired1();

    let vxsnan0 = is_signalling_nan64(b0);
    let vxsnan1 = is_signalling_nan64(b1);
    let zx0 = b0 == 0.0;
    let zx1 = b1 == 0.0;

    let old_fpscr = core.fpscr.0;
    if vxsnan0 || vxsnan1 {
        core.fpscr.set_vxsnan(true);
    }
    if zx0 || zx1 {
        core.fpscr.set_zx(true);
    }

    let mut d0 = 0.0f32;
    let mut d1 = 0.0f32;
    let mut write = true;

    if (vxsnan0 && core.fpscr.ve()) || (zx0 && core.fpscr.ze()) {
        write = false;
    } else {
        d0 = ppc_estimate_reciprocal(truncate_double(b0));
        update_fprf32(core, d0);
    }

    if (vxsnan1 && core.fpscr.ve()) || (zx1 && core.fpscr.ze()) {
        write = false;
    } else {
        d1 = ppc_estimate_reciprocal(truncate_double(b1));
    }

    if write {
        core.fpr[instr.rd() as usize].set_paired0(extend_float(d0));
        core.fpr[instr.rd() as usize].set_paired1(extend_float(d1));
    }

    if !hostfpu::test(FpExceptions::INEXACT).is_empty() {
        // Like fres: FI without XX on an inexact estimate.
        hostfpu::clear(FpExceptions::INEXACT);
        update_fpscr(core, old_fpscr);
        core.fpscr.set_fi(true);
    } else {
        update_fpscr(core, old_fpscr);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn ps_rsqrte(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b0 = core.fpr[instr.rb() as usize].paired0();
    let b1 = core.fpr[instr.rb() as usize].paired1();

    let vxsnan0 = is_signalling_nan64(b0);
    let vxsnan1 = is_signalling_nan64(b1);
    let vxsqrt0 = !vxsnan0 && b0.is_sign_negative() && b0 != 0.0;
    let vxsqrt1 = !vxsnan1 && b1.is_sign_negative() && b1 != 0.0;
    let zx0 = b0 == 0.0;
    let zx1 = b1 == 0.0;

    let old_fpscr = core.fpscr.0;
    if vxsnan0 || vxsnan1 {
        core.fpscr.set_vxsnan(true);
    }
    if vxsqrt0 || vxsqrt1 {
        core.fpscr.set_vxsqrt(true);
    }
    if zx0 || zx1 {
        core.fpscr.set_zx(true);
    }

    let mut d0 = 0.0f64;
    let mut d1 = 0.0f64;
    let mut write = true;

    if ((vxsnan0 || vxsqrt0) && core.fpscr.ve()) || (zx0 && core.fpscr.ze()) {
        write = false;
    } else {
        d0 = ppc_estimate_reciprocal_root(b0);
        update_fprf64(core, d0);
    }
    if ((vxsnan1 || vxsqrt1) && core.fpscr.ve()) || (zx1 && core.fpscr.ze()) {
        write = false;
    } else {
        d1 = ppc_estimate_reciprocal_root(b1);
    }

    if write {
        // Out-of-range magnitudes behave strangely on the hardware: ps0
        // keeps its double-precision exponent while ps1 wraps through the
        // float circuitry. The wrap below matches the probed endpoints
        // (maximum normal and minimum denormal inputs); in-between inputs
        // are unverified. Both lanes keep only a single-precision worth of
        // mantissa.
        const EST_MANTISSA_MASK: u64 = 0x000f_ffff_e000_0000;

        let bits0 = d0.to_bits();
        core.fpr[instr.rd() as usize].set_paired0(f64::from_bits(
            (bits0 & !crate::fpbits::MANTISSA_MASK64) | (bits0 & EST_MANTISSA_MASK),
        ));

        let bits1 = d1.to_bits();
        let exponent = exponent64(bits1);
        let new_exponent = if exponent == 0 {
            // A reciprocal square root is never denormal; leave zero.
            0
        } else if exponent < 1151 {
            let exponent8 = ((exponent as i32 - 1023) & 0xff) as i8;
            (1023 + exponent8 as i32) as u32
        } else if exponent < 2047 {
            1022
        } else {
            exponent
        };
        core.fpr[instr.rd() as usize].set_paired1(f64::from_bits(
            (bits1 & crate::fpbits::SIGN64)
                | (u64::from(new_exponent) << 52)
                | (bits1 & EST_MANTISSA_MASK),
        ));
    }

    update_fpscr(core, old_fpscr);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn ps_sel(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.fpr[instr.ra() as usize];
    let b = core.fpr[instr.rb() as usize];
    let c = core.fpr[instr.frc() as usize];

    let d0 = if a.paired0() >= 0.0 {
        c.paired0()
    } else {
        b.paired0()
    };
    let d1 = if a.paired1() >= 0.0 {
        c.paired1()
    } else {
        b.paired1()
    };

    core.fpr[instr.rd() as usize].set_paired0(d0);
    core.fpr[instr.rd() as usize].set_paired1(d1);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

pub(super) fn register(interp: &mut Interpreter) {
    interp.register(InstructionID::PsAdd, ps_add);
    interp.register(InstructionID::PsDiv, ps_div);
    interp.register(InstructionID::PsMul, ps_mul);
    interp.register(InstructionID::PsSub, ps_sub);
    interp.register(InstructionID::PsAbs, ps_abs);
    interp.register(InstructionID::PsNabs, ps_nabs);
    interp.register(InstructionID::PsNeg, ps_neg);
    interp.register(InstructionID::PsSel, ps_sel);
    interp.register(InstructionID::PsRes, ps_res);
    interp.register(InstructionID::PsRsqrte, ps_rsqrte);
    interp.register(InstructionID::PsMsub, ps_msub);
    interp.register(InstructionID::PsMadd, ps_madd);
    interp.register(InstructionID::PsNmsub, ps_nmsub);
    interp.register(InstructionID::PsNmadd, ps_nmadd);
    interp.register(InstructionID::PsMr, ps_mr);
    interp.register(InstructionID::PsSum0, ps_sum0);
    interp.register(InstructionID::PsSum1, ps_sum1);
    interp.register(InstructionID::PsMuls0, ps_muls0);
    interp.register(InstructionID::PsMuls1, ps_muls1);
    interp.register(InstructionID::PsMadds0, ps_madds0);
    interp.register(InstructionID::PsMadds1, ps_madds1);
    interp.register(InstructionID::PsMerge00, ps_merge00);
    interp.register(InstructionID::PsMerge01, ps_merge01);
    interp.register(InstructionID::PsMerge10, ps_merge10);
    interp.register(InstructionID::PsMerge11, ps_merge11);
}
