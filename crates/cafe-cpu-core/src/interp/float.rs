//! Scalar floating point: arithmetic, estimates, conversions, and the
//! FPSCR bookkeeping shared with the paired-single unit.

use std::hint::black_box;
use std::num::FpCategory;

use cafe_mem::GuestMemory;
use cafe_ppc::{Instruction, InstructionID};

use super::Interpreter;
use crate::fpbits::{
    exponent64, is_signalling_nan64, make_nan32, make_nan64, make_quiet32, make_quiet64,
    mantissa32, mantissa64, possible_underflow32, possible_underflow64, EXP_MAX32, EXP_MAX64,
    MANTISSA_MASK64, SIGN64,
};
use crate::hostfpu::{self, FpExceptions};
use crate::state::{fprf, Core, Fpscr, RoundMode};

// Reciprocal estimate tables, reproduced bit-for-bit from the hardware.
const FRES_BASE: [u16; 32] = [
    0x3ffc, 0x3c1c, 0x3875, 0x3504, 0x31c4, 0x2eb1, 0x2bc8, 0x2904, 0x2664, 0x23e5, 0x2184,
    0x1f40, 0x1d16, 0x1b04, 0x190a, 0x1725, 0x1554, 0x1396, 0x11eb, 0x104f, 0x0ec4, 0x0d48,
    0x0bd7, 0x0a7c, 0x0922, 0x07df, 0x069c, 0x056f, 0x0442, 0x0328, 0x020e, 0x0106,
];

const FRES_DELTA: [u16; 32] = [
    0x3e1, 0x3a7, 0x371, 0x340, 0x313, 0x2ea, 0x2c4, 0x2a0, 0x27f, 0x261, 0x245, 0x22a, 0x212,
    0x1fb, 0x1e5, 0x1d1, 0x1be, 0x1ac, 0x19b, 0x18b, 0x17c, 0x16e, 0x15b, 0x15b, 0x143, 0x143,
    0x12d, 0x12d, 0x11a, 0x11a, 0x108, 0x106,
];

const FRSQRTE_BASE: [u16; 32] = [
    0x7ff4, 0x7852, 0x7154, 0x6ae4, 0x64f2, 0x5f6e, 0x5a4c, 0x5580, 0x5102, 0x4cca, 0x48d0,
    0x450e, 0x4182, 0x3e24, 0x3af2, 0x37e8, 0x34fd, 0x2f97, 0x2aa5, 0x2618, 0x21e4, 0x1dfe,
    0x1a5c, 0x16f8, 0x13ca, 0x10ce, 0x0dfe, 0x0b57, 0x08d4, 0x0673, 0x0431, 0x020b,
];

const FRSQRTE_DELTA: [u16; 32] = [
    0x7a4, 0x700, 0x670, 0x5f2, 0x584, 0x524, 0x4cc, 0x47e, 0x43a, 0x3fa, 0x3c2, 0x38e, 0x35e,
    0x332, 0x30a, 0x2e6, 0x568, 0x4f3, 0x48d, 0x435, 0x3e7, 0x3a2, 0x365, 0x32e, 0x2fc, 0x2d0,
    0x2a8, 0x283, 0x261, 0x243, 0x226, 0x20b,
];

/// Hardware `fres` estimate, including the denormal/zero/infinity/NaN case
/// analysis and the FI propagation through the host inexact flag.
pub(super) fn ppc_estimate_reciprocal(v: f32) -> f32 {
    let bits = v.to_bits();

    if crate::fpbits::exponent32(bits) == EXP_MAX32 {
        if mantissa32(bits) == 0 {
            return 0.0f32.copysign(v);
        }
        hostfpu::raise(FpExceptions::INVALID);
        return make_quiet32(v);
    }

    let mut exponent = crate::fpbits::exponent32(bits) as i32;
    let mut mantissa = mantissa32(bits);
    if exponent == 0 {
        if mantissa == 0 {
            hostfpu::raise(FpExceptions::DIVBYZERO);
            return f32::INFINITY.copysign(v);
        } else if mantissa < 0x20_0000 {
            hostfpu::raise(FpExceptions::OVERFLOW | FpExceptions::INEXACT);
            return f32::MAX.copysign(v);
        } else if mantissa < 0x40_0000 {
            exponent = -1;
            mantissa = (mantissa << 2) & 0x7f_ffff;
        } else {
            mantissa = (mantissa << 1) & 0x7f_ffff;
        }
    }

    // The lookup result has 24 bits; the high 23 go to the output mantissa
    // (denormals shift further), the lowest becomes FPSCR[FI].
    let mut new_exponent = 253 - exponent;
    let table_index = (mantissa >> 18) as usize;
    let delta_mult = (mantissa >> 8) & 0x3ff;
    let lookup = ((FRES_BASE[table_index] as u32) << 10) - FRES_DELTA[table_index] as u32 * delta_mult;
    let mut new_mantissa = lookup >> 1;
    let mut fi = lookup & 1 != 0;

    if new_exponent <= 0 {
        fi |= new_mantissa & 1 != 0;
        new_mantissa = (new_mantissa >> 1) | 0x40_0000;
        if new_exponent < 0 {
            fi |= new_mantissa & 1 != 0;
            new_mantissa >>= 1;
            new_exponent = 0;
        }
        if fi {
            hostfpu::raise(FpExceptions::UNDERFLOW);
        }
    }

    if fi {
        hostfpu::raise(FpExceptions::INEXACT);
    }

    f32::from_bits((bits & 0x8000_0000) | ((new_exponent as u32) << 23) | (new_mantissa & 0x7f_ffff))
}

/// Hardware `frsqrte` estimate (double form), with the odd/even exponent
/// table split.
pub(super) fn ppc_estimate_reciprocal_root(v: f64) -> f64 {
    let bits = v.to_bits();

    if exponent64(bits) == EXP_MAX64 {
        if mantissa64(bits) == 0 {
            if bits & SIGN64 != 0 {
                hostfpu::raise(FpExceptions::INVALID);
                return make_nan64();
            }
            return 0.0;
        }
        hostfpu::raise(FpExceptions::INVALID);
        return make_quiet64(v);
    }

    let mut exponent = exponent64(bits) as i32;
    let mut mantissa = mantissa64(bits);
    if exponent == 0 {
        if mantissa == 0 {
            hostfpu::raise(FpExceptions::DIVBYZERO);
            return f64::INFINITY.copysign(v);
        }
        let shift = mantissa.leading_zeros() as i32 - 11;
        mantissa = (mantissa << shift) & MANTISSA_MASK64;
        exponent -= shift - 1;
    }

    // Negative nonzero inputs are always invalid; zero and NaN are handled
    // above.
    if bits & SIGN64 != 0 {
        hostfpu::raise(FpExceptions::INVALID);
        return make_nan64();
    }

    let new_exponent = (3068 - exponent) / 2;
    let table_index = (((mantissa >> 48) & 15) | if exponent & 1 != 0 { 0 } else { 16 }) as usize;
    let delta_mult = (mantissa >> 37) & 0x7ff;
    let lookup = ((FRSQRTE_BASE[table_index] as u64) << 11) - FRSQRTE_DELTA[table_index] as u64 * delta_mult;
    let new_mantissa = (lookup << 26) & MANTISSA_MASK64;

    f64::from_bits(((new_exponent as u64) << 52) | new_mantissa)
}

/// Recompute the VX and FEX summaries from the individual bits.
pub(super) fn update_fex_vx(core: &mut Core) {
    let fpscr = &mut core.fpscr;

    fpscr.set_vx(fpscr.0 & Fpscr::ALL_VX != 0);

    let fex = (fpscr.vx() && fpscr.ve())
        || (fpscr.ox() && fpscr.oe())
        || (fpscr.ux() && fpscr.ue())
        || (fpscr.zx() && fpscr.ze())
        || (fpscr.xx() && fpscr.xe());
    fpscr.set_fex(fex);
}

/// Summaries plus FX: any exception bit that went 0 -> 1 since `old` sets
/// the sticky exception summary.
pub(super) fn update_fx_fex_vx(core: &mut Core, old: u32) {
    update_fex_vx(core);

    let new_bits = (old ^ core.fpscr.0) & core.fpscr.0;
    if new_bits & Fpscr::ALL_EXCEPTIONS != 0 {
        core.fpscr.set_fx(true);
    }
}

/// Fold the host sticky exceptions into FPSCR and clear them.
pub(super) fn update_fpscr(core: &mut Core, old: u32) {
    let except = hostfpu::test(FpExceptions::all());

    if except.contains(FpExceptions::UNDERFLOW) {
        core.fpscr.set_ux(true);
    }
    if except.contains(FpExceptions::OVERFLOW) {
        core.fpscr.set_ox(true);
    }
    if except.contains(FpExceptions::DIVBYZERO) {
        core.fpscr.set_zx(true);
    }

    let fi = except.contains(FpExceptions::INEXACT);
    core.fpscr.set_fi(fi);
    if fi {
        core.fpscr.set_xx(true);
    }

    core.fpscr.set_fr(hostfpu::round_mode() == RoundMode::Positive);

    update_fx_fex_vx(core, old);

    hostfpu::clear(FpExceptions::all());
}

fn fprf_bits(class: FpCategory, positive: bool, sign_negative: bool) -> u32 {
    match class {
        FpCategory::Nan => fprf::CLASS_DESCRIPTOR | fprf::UNORDERED,
        FpCategory::Infinite => {
            (if positive { fprf::POSITIVE } else { fprf::NEGATIVE }) | fprf::UNORDERED
        }
        FpCategory::Zero => {
            fprf::EQUAL
                | if sign_negative {
                    fprf::CLASS_DESCRIPTOR
                } else {
                    0
                }
        }
        FpCategory::Subnormal => {
            (if positive { fprf::POSITIVE } else { fprf::NEGATIVE }) | fprf::CLASS_DESCRIPTOR
        }
        FpCategory::Normal => {
            if positive {
                fprf::POSITIVE
            } else {
                fprf::NEGATIVE
            }
        }
    }
}

pub(super) fn update_fprf64(core: &mut Core, value: f64) {
    core.fpscr
        .set_fprf(fprf_bits(value.classify(), value > 0.0, value.is_sign_negative()));
}

pub(super) fn update_fprf32(core: &mut Core, value: f32) {
    core.fpscr
        .set_fprf(fprf_bits(value.classify(), value > 0.0, value.is_sign_negative()));
}

/// Floating record: copy FPSCR's high nibble into cr1.
pub(super) fn update_float_condition_register(core: &mut Core) {
    let cr1 = core.fpscr.cr1();
    core.cr.set_field(1, cr1);
}

/// Install `FPSCR[RN]` as the host rounding mode.
pub(super) fn update_rounding_mode(core: &Core) {
    hostfpu::set_round_mode(core.fpscr.rn());
}

/// Round the second operand of a single-precision multiply to 24 mantissa
/// bits, the way the hardware truncates frC. May also adjust the first
/// operand to preserve precision when the rounding overflows to infinity.
pub(super) fn round_for_multiply(a: &mut f64, c: &mut f64) {
    // Mantissa goes 52 -> 24 bits, so bit 27 from the LSB rounds.
    const ROUND_BIT: u64 = 1 << 27;
    const EXP_LSB: u64 = 1 << 52;

    let mut a_bits = a.to_bits();
    let mut c_bits = c.to_bits();

    // Nothing to round.
    if c_bits & ((ROUND_BIT << 1) - 1) == 0 {
        return;
    }

    // A zero or infinite first operand fixes the product regardless of the
    // rounding, and must not pick up spurious exceptions here.
    if *a == 0.0 || a.is_infinite() {
        return;
    }

    // Normalize a denormal frC before rounding, shifting scale onto frA.
    // If frA runs out of exponent the product rounds to zero anyway.
    if exponent64(c_bits) == 0 && mantissa64(c_bits) != 0 {
        let c_sign = c_bits & SIGN64;
        while exponent64(c_bits) == 0 {
            c_bits <<= 1;
            if exponent64(a_bits) == 0 {
                return;
            }
            a_bits -= EXP_LSB;
        }
        c_bits = (c_bits & !SIGN64) | c_sign;
    }

    // Round bit 27. This ignores FPSCR[RN]. If the mantissa carries out
    // into infinity, move a power of two onto frA where possible.
    c_bits &= !(ROUND_BIT - 1);
    c_bits = c_bits.wrapping_add(c_bits & ROUND_BIT);
    if f64::from_bits(c_bits).is_infinite() {
        c_bits -= EXP_LSB;
        if exponent64(a_bits) == 0 {
            let a_sign = a_bits & SIGN64;
            a_bits <<= 1;
            a_bits = (a_bits & !SIGN64) | a_sign;
        } else if exponent64(a_bits) < EXP_MAX64 - 1 {
            a_bits += EXP_LSB;
        }
        // Otherwise the product overflows anyway; leave frA alone and let
        // the host FPU raise what it raises.
    }

    *a = f64::from_bits(a_bits);
    *c = f64::from_bits(c_bits);
}

/// Single-precision result of an FMA, assuming round-to-nearest.
///
/// The hardware truncates its infinitely-precise intermediate, so a double
/// FMA result exactly halfway between two singles must be nudged toward
/// the true value before the final conversion; rerunning the FMA toward
/// zero tells us which way.
pub(super) fn round_fma_result_to_single(result: f64, a: f64, b: f64, c: f64) -> f32 {
    if a == 0.0 || b == 0.0 || c == 0.0 {
        return result as f32;
    }

    let mut result_bits = result.to_bits();
    let exponent = exponent64(result_bits) as i32;

    if !(874..=1150).contains(&exponent) {
        return result as f32; // Out of single range, or inf/NaN.
    }

    let mut center_value: u64 = 1 << 28;
    let mut center_mask: u64 = (center_value << 1) - 1;
    if exponent < 897 {
        center_value <<= 897 - exponent;
        center_mask <<= 897 - exponent;
    }
    if mantissa64(result_bits) & center_mask != center_value {
        return result as f32; // Not exactly between two singles.
    }

    let old_round = hostfpu::round_mode();
    hostfpu::set_round_mode(RoundMode::Zero);
    hostfpu::clear(FpExceptions::INEXACT);

    let test = black_box(a).mul_add(black_box(c), black_box(b));

    hostfpu::set_round_mode(old_round);

    // Dropped bits decide the direction: a truncated result equal to the
    // rounded one means the exact value lies above it, so bump one ulp up;
    // otherwise bump down. The mantissa is nonzero, so stepping the raw
    // bits is safe.
    if !hostfpu::test(FpExceptions::INEXACT).is_empty() {
        if test.to_bits() == result_bits {
            result_bits += 1;
        } else {
            result_bits -= 1;
        }
    }

    f64::from_bits(result_bits) as f32
}

#[derive(Clone, Copy, PartialEq)]
enum FpOp {
    Add,
    Sub,
    Mul,
    Div,
}

fn fp_arith_generic(core: &mut Core, instr: Instruction, op: FpOp, single: bool) {
    let mut a = core.fpr[instr.ra() as usize].value();
    let b_reg = if op == FpOp::Mul {
        instr.frc()
    } else {
        instr.rb()
    };
    let mut b = core.fpr[b_reg as usize].value();

    let vxsnan = is_signalling_nan64(a) || is_signalling_nan64(b);
    let (vxisi, vximz, vxidi, vxzdz, zx) = match op {
        FpOp::Add => (
            a.is_infinite() && b.is_infinite() && a.is_sign_negative() != b.is_sign_negative(),
            false,
            false,
            false,
            false,
        ),
        FpOp::Sub => (
            a.is_infinite() && b.is_infinite() && a.is_sign_negative() == b.is_sign_negative(),
            false,
            false,
            false,
            false,
        ),
        FpOp::Mul => (
            false,
            (a.is_infinite() && b == 0.0) || (a == 0.0 && b.is_infinite()),
            false,
            false,
            false,
        ),
        FpOp::Div => {
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

    let old_fpscr = core.fpscr.0;
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

    if (vxsnan || vxisi || vximz || vxidi || vxzdz) && core.fpscr.ve() {
        update_fx_fex_vx(core, old_fpscr);
    } else if zx && core.fpscr.ze() {
        core.fpscr.set_zx(true);
        update_fx_fex_vx(core, old_fpscr);
    } else if single {
        let d: f32 = if a.is_nan() {
            make_quiet64(a) as f32
        } else if b.is_nan() {
            make_quiet64(b) as f32
        } else if vxisi || vximz || vxidi || vxzdz {
            make_nan32()
        } else {
            // Arithmetic happens at double precision even for the single
            // forms; only the result narrows. The second multiply operand
            // is first rounded to 24 mantissa bits.
            if op == FpOp::Mul {
                round_for_multiply(&mut a, &mut b);
            }
            match op {
                FpOp::Add => (a + b) as f32,
                FpOp::Sub => (a - b) as f32,
                FpOp::Mul => (a * b) as f32,
                FpOp::Div => (a / b) as f32,
            }
        };

        if possible_underflow32(d) {
            underflow_replay_single(op, a, b);
        }

        let dd = crate::fpbits::extend_float(d);
        core.fpr[instr.rd() as usize].set_paired0(dd);
        core.fpr[instr.rd() as usize].set_paired1(dd);
        update_fprf32(core, d);
        update_fpscr(core, old_fpscr);
    } else {
        let d: f64 = if a.is_nan() {
            make_quiet64(a)
        } else if b.is_nan() {
            make_quiet64(b)
        } else if vxisi || vximz || vxidi || vxzdz {
            make_nan64()
        } else {
            match op {
                FpOp::Add => a + b,
                FpOp::Sub => a - b,
                FpOp::Mul => a * b,
                FpOp::Div => a / b,
            }
        };

        if possible_underflow64(d) {
            underflow_replay_double(op, a, b);
        }

        core.fpr[instr.rd() as usize].set_value(d);
        update_fprf64(core, d);
        update_fpscr(core, old_fpscr);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

// The hardware flags underflow when the result is tiny before rounding;
// the host flags it only when tiny after. When the rounded result sits
// exactly on the minimum normal, repeat the operation toward zero purely
// for its underflow flag (toward zero, tiny-before implies tiny-after).
fn underflow_replay_single(op: FpOp, a: f64, b: f64) {
    let old_round = hostfpu::round_mode();
    hostfpu::set_round_mode(RoundMode::Zero);

    let bb = black_box(b);
    black_box(match op {
        FpOp::Add => (a + bb) as f32,
        FpOp::Sub => (a - bb) as f32,
        FpOp::Mul => (a * bb) as f32,
        FpOp::Div => (a / bb) as f32,
    });

    hostfpu::set_round_mode(old_round);
}

fn underflow_replay_double(op: FpOp, a: f64, b: f64) {
    let old_round = hostfpu::round_mode();
    hostfpu::set_round_mode(RoundMode::Zero);

    let bb = black_box(b);
    black_box(match op {
        FpOp::Add => a + bb,
        FpOp::Sub => a - bb,
        FpOp::Mul => a * bb,
        FpOp::Div => a / bb,
    });

    hostfpu::set_round_mode(old_round);
}

fn fadd(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Add, false)
}

fn fadds(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Add, true)
}

fn fdiv(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Div, false)
}

fn fdivs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Div, true)
}

fn fmul(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Mul, false)
}

fn fmuls(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Mul, true)
}

fn fsub(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Sub, false)
}

fn fsubs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fp_arith_generic(core, instr, FpOp::Sub, true)
}

fn fres(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b = core.fpr[instr.rb() as usize].value();

    let vxsnan = is_signalling_nan64(b);
    let zx = b == 0.0;

    let old_fpscr = core.fpscr.0;
    if vxsnan {
        core.fpscr.set_vxsnan(true);
    }

    if vxsnan && core.fpscr.ve() {
        update_fx_fex_vx(core, old_fpscr);
    } else if zx && core.fpscr.ze() {
        core.fpscr.set_zx(true);
        update_fx_fex_vx(core, old_fpscr);
    } else {
        let d = ppc_estimate_reciprocal(b as f32);
        core.fpr[instr.rd() as usize].set_paired0(d as f64);
        core.fpr[instr.rd() as usize].set_paired1(d as f64);
        update_fprf32(core, d);
        if zx {
            core.fpscr.set_zx(true);
        }
        if !hostfpu::test(FpExceptions::INEXACT).is_empty() {
            // fres reports an inexact estimate through FI alone, without
            // the XX sticky.
            hostfpu::clear(FpExceptions::INEXACT);
            update_fpscr(core, old_fpscr);
            core.fpscr.set_fi(true);
        } else {
            update_fpscr(core, old_fpscr);
        }
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn frsqrte(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b = core.fpr[instr.rb() as usize].value();

    let vxsnan = is_signalling_nan64(b);
    let vxsqrt = !vxsnan && b < 0.0;
    let zx = b == 0.0;

    let old_fpscr = core.fpscr.0;
    if vxsnan {
        core.fpscr.set_vxsnan(true);
    }
    if vxsqrt {
        core.fpscr.set_vxsqrt(true);
    }

    if (vxsnan || vxsqrt) && core.fpscr.ve() {
        update_fx_fex_vx(core, old_fpscr);
    } else if zx && core.fpscr.ze() {
        core.fpscr.set_zx(true);
        update_fx_fex_vx(core, old_fpscr);
    } else {
        let d = ppc_estimate_reciprocal_root(b);
        core.fpr[instr.rd() as usize].set_value(d);
        update_fprf64(core, d);
        if zx {
            core.fpscr.set_zx(true);
        }
        update_fpscr(core, old_fpscr);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn fsel(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.fpr[instr.ra() as usize].value();
    let b = core.fpr[instr.rb() as usize].value();
    let c = core.fpr[instr.frc() as usize].value();

    // No exception accounting; -0.0 counts as >= 0.
    let d = if a >= 0.0 { c } else { b };
    core.fpr[instr.rd() as usize].set_value(d);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

// Fused multiply-add family.
const FMA_SUBTRACT: u32 = 1 << 0;
const FMA_NEGATE: u32 = 1 << 1;
const FMA_SINGLE: u32 = 1 << 2;

fn fma_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let mut a = core.fpr[instr.ra() as usize].value();
    let b = core.fpr[instr.rb() as usize].value();
    let mut c = core.fpr[instr.frc() as usize].value();

    let addend = if FLAGS & FMA_SUBTRACT != 0 { -b } else { b };

    let vxsnan = is_signalling_nan64(a) || is_signalling_nan64(b) || is_signalling_nan64(c);
    let vximz = (a.is_infinite() && c == 0.0) || (a == 0.0 && c.is_infinite());
    let vxisi = !vximz
        && !a.is_nan()
        && !c.is_nan()
        && (a.is_infinite() || c.is_infinite())
        && b.is_infinite()
        && (a.is_sign_negative() ^ c.is_sign_negative()) != addend.is_sign_negative();

    let old_fpscr = core.fpscr.0;
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
        update_fx_fex_vx(core, old_fpscr);
    } else {
        let d: f64 = if a.is_nan() {
            make_quiet64(a)
        } else if b.is_nan() {
            make_quiet64(b)
        } else if c.is_nan() {
            make_quiet64(c)
        } else if vxisi || vximz {
            make_nan64()
        } else {
            if FLAGS & FMA_SINGLE != 0 {
                round_for_multiply(&mut a, &mut c);
            }

            let mut d = a.mul_add(c, addend);

            let check_underflow = if FLAGS & FMA_SINGLE != 0 {
                possible_underflow32(d as f32)
            } else {
                possible_underflow64(d)
            };

            if check_underflow {
                let old_round = hostfpu::round_mode();
                hostfpu::set_round_mode(RoundMode::Zero);

                let addend_temp = black_box(addend);
                if FLAGS & FMA_SINGLE != 0 {
                    black_box(a.mul_add(c, addend_temp) as f32);
                } else {
                    black_box(a.mul_add(c, addend_temp));
                }

                hostfpu::set_round_mode(old_round);
            }

            if FLAGS & FMA_NEGATE != 0 {
                d = -d;
            }
            d
        };

        if FLAGS & FMA_SINGLE != 0 {
            let d_float = if core.fpscr.rn() == RoundMode::Nearest {
                round_fma_result_to_single(d, a, addend, c)
            } else {
                d as f32
            };
            let dd = crate::fpbits::extend_float(d_float);
            core.fpr[instr.rd() as usize].set_paired0(dd);
            core.fpr[instr.rd() as usize].set_paired1(dd);
            update_fprf32(core, d_float);
        } else {
            core.fpr[instr.rd() as usize].set_value(d);
            update_fprf64(core, d);
        }

        update_fpscr(core, old_fpscr);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn fmadd(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<0>(core, instr)
}

fn fmadds(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<FMA_SINGLE>(core, instr)
}

fn fmsub(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<FMA_SUBTRACT>(core, instr)
}

fn fmsubs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<{ FMA_SUBTRACT | FMA_SINGLE }>(core, instr)
}

fn fnmadd(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<FMA_NEGATE>(core, instr)
}

fn fnmadds(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<{ FMA_NEGATE | FMA_SINGLE }>(core, instr)
}

fn fnmsub(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<{ FMA_NEGATE | FMA_SUBTRACT }>(core, instr)
}

fn fnmsubs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fma_generic::<{ FMA_NEGATE | FMA_SUBTRACT | FMA_SINGLE }>(core, instr)
}

fn fctiw_generic(core: &mut Core, instr: Instruction, round_mode: RoundMode) {
    let b = core.fpr[instr.rb() as usize].value();

    let vxsnan = is_signalling_nan64(b);
    let vxcvi;
    let fi;
    let bi: i32;

    if b.is_nan() {
        vxcvi = true;
        fi = false;
        bi = i32::MIN;
    } else if b > i32::MAX as f64 {
        vxcvi = true;
        fi = false;
        bi = i32::MAX;
    } else if b < i32::MIN as f64 {
        vxcvi = true;
        fi = false;
        bi = i32::MIN;
    } else {
        vxcvi = false;
        let rounded = match round_mode {
            RoundMode::Nearest => b.round_ties_even(),
            RoundMode::Zero => b.trunc(),
            RoundMode::Positive => b.ceil(),
            RoundMode::Negative => b.floor(),
        };
        bi = rounded as i32;
        fi = exponent64(b.to_bits()) < 1075 && bi as f64 != b;
    }

    let old_fpscr = core.fpscr.0;
    if vxsnan {
        core.fpscr.set_vxsnan(true);
    }
    if vxcvi {
        core.fpscr.set_vxcvi(true);
    }

    if (vxsnan || vxcvi) && core.fpscr.ve() {
        core.fpscr.set_fr(false);
        core.fpscr.set_fi(false);
        update_fx_fex_vx(core, old_fpscr);
    } else {
        let fpr = &mut core.fpr[instr.rd() as usize];
        fpr.set_iw1(bi as u32);
        fpr.set_iw0(0xfff8_0000 | u32::from(crate::fpbits::is_negative_zero64(b)));
        update_fpscr(core, old_fpscr);
        // The rounding helpers do not reliably raise host inexact, so FI
        // and XX are set by hand.
        if fi {
            core.fpscr.set_fi(true);
            core.fpscr.set_xx(true);
            update_fx_fex_vx(core, old_fpscr);
        }
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn fctiw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let round_mode = core.fpscr.rn();
    fctiw_generic(core, instr, round_mode)
}

fn fctiwz(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fctiw_generic(core, instr, RoundMode::Zero)
}

fn frsp(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b = core.fpr[instr.rb() as usize].value();
    let vxsnan = is_signalling_nan64(b);

    let old_fpscr = core.fpscr.0;
    if vxsnan {
        core.fpscr.set_vxsnan(true);
    }

    if vxsnan && core.fpscr.ve() {
        update_fx_fex_vx(core, old_fpscr);
    } else {
        let d = b as f32;
        // The manual leaves frD(ps1) undefined, but the processor copies
        // the result there like the other single-precision instructions.
        core.fpr[instr.rd() as usize].set_paired0(d as f64);
        core.fpr[instr.rd() as usize].set_paired1(d as f64);
        update_fprf32(core, d);
        update_fpscr(core, old_fpscr);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn fabs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b = core.fpr[instr.rb() as usize].idw();
    core.fpr[instr.rd() as usize].set_idw(b & !SIGN64);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn fnabs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b = core.fpr[instr.rb() as usize].idw();
    core.fpr[instr.rd() as usize].set_idw(b | SIGN64);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn fmr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b = core.fpr[instr.rb() as usize].idw();
    core.fpr[instr.rd() as usize].set_idw(b);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn fneg(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let b = core.fpr[instr.rb() as usize].idw();
    core.fpr[instr.rd() as usize].set_idw(b ^ SIGN64);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn mffs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let fpscr = core.fpscr.0;
    core.fpr[instr.rd() as usize].set_iw1(fpscr);

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn mtfsb0(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    core.fpscr.0 &= !(1 << (31 - instr.crbd()));
    update_fex_vx(core);
    if instr.crbd() >= 30 {
        update_rounding_mode(core);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn mtfsb1(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let old_fpscr = core.fpscr.0;
    core.fpscr.0 |= 1 << (31 - instr.crbd());
    update_fx_fex_vx(core, old_fpscr);
    if instr.crbd() >= 30 {
        update_rounding_mode(core);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn mtfsf(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let value = core.fpr[instr.rb() as usize].iw1();

    // Field 0 is architecturally the high nibble, but as long as the mask
    // bit and the nibble line up the direction does not matter, so this
    // walks in host bit order.
    for field in 0..8 {
        if (instr.fm() >> field) & 1 != 0 {
            let mask = 0xf << (4 * field);
            core.fpscr.0 = (core.fpscr.0 & !mask) | (value & mask);
        }
    }
    update_fex_vx(core);
    if instr.fm() & 1 != 0 {
        update_rounding_mode(core);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

fn mtfsfi(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let shift = 4 * (7 - instr.crfd());
    core.fpscr.0 = (core.fpscr.0 & !(0xf << shift)) | (instr.imm() << shift);
    update_fex_vx(core);
    if instr.crfd() == 7 {
        update_rounding_mode(core);
    }

    if instr.rc() {
        update_float_condition_register(core);
    }
}

pub(super) fn register(interp: &mut Interpreter) {
    interp.register(InstructionID::Fadd, fadd);
    interp.register(InstructionID::Fadds, fadds);
    interp.register(InstructionID::Fdiv, fdiv);
    interp.register(InstructionID::Fdivs, fdivs);
    interp.register(InstructionID::Fmul, fmul);
    interp.register(InstructionID::Fmuls, fmuls);
    interp.register(InstructionID::Fsub, fsub);
    interp.register(InstructionID::Fsubs, fsubs);
    interp.register(InstructionID::Fres, fres);
    interp.register(InstructionID::Frsqrte, frsqrte);
    interp.register(InstructionID::Fsel, fsel);
    interp.register(InstructionID::Fmadd, fmadd);
    interp.register(InstructionID::Fmadds, fmadds);
    interp.register(InstructionID::Fmsub, fmsub);
    interp.register(InstructionID::Fmsubs, fmsubs);
    interp.register(InstructionID::Fnmadd, fnmadd);
    interp.register(InstructionID::Fnmadds, fnmadds);
    interp.register(InstructionID::Fnmsub, fnmsub);
    interp.register(InstructionID::Fnmsubs, fnmsubs);
    interp.register(InstructionID::Fctiw, fctiw);
    interp.register(InstructionID::Fctiwz, fctiwz);
    interp.register(InstructionID::Frsp, frsp);
    interp.register(InstructionID::Fabs, fabs);
    interp.register(InstructionID::Fnabs, fnabs);
    interp.register(InstructionID::Fmr, fmr);
    interp.register(InstructionID::Fneg, fneg);
    interp.register(InstructionID::Mffs, mffs);
    interp.register(InstructionID::Mtfsb0, mtfsb0);
    interp.register(InstructionID::Mtfsb1, mtfsb1);
    interp.register(InstructionID::Mtfsf, mtfsf);
    interp.register(InstructionID::Mtfsfi, mtfsfi);
}
