//! Compares, CR-bit logic, and CR field moves.

use cafe_mem::GuestMemory;
use cafe_ppc::{sign_extend, Instruction, InstructionID};

use super::float::{update_fex_vx, update_fx_fex_vx};
use super::Interpreter;
use crate::fpbits::is_signalling_nan64;
use crate::state::{cr_flag, Core, Fpscr};

// Integer compares widen both operands to i64 so one body covers the
// signed and unsigned variants.
fn cmp_record(core: &mut Core, crfd: u32, a: i64, b: i64) {
    let mut c = if a < b {
        cr_flag::LESS_THAN
    } else if a > b {
        cr_flag::GREATER_THAN
    } else {
        cr_flag::EQUAL
    };

    if core.xer.so() {
        c |= cr_flag::SUMMARY_OVERFLOW;
    }

    core.cr.set_field(crfd, c);
}

fn cmp(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize] as i32 as i64;
    let b = core.gpr[instr.rb() as usize] as i32 as i64;
    cmp_record(core, instr.crfd(), a, b);
}

fn cmpi(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize] as i32 as i64;
    let b = sign_extend(instr.simm(), 16) as i32 as i64;
    cmp_record(core, instr.crfd(), a, b);
}

fn cmpl(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize] as i64;
    let b = core.gpr[instr.rb() as usize] as i64;
    cmp_record(core, instr.crfd(), a, b);
}

fn cmpli(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize] as i64;
    let b = instr.uimm() as i64;
    cmp_record(core, instr.crfd(), a, b);
}

// Floating compares, shared with the paired-single compare forms.
const FCMP_ORDERED: u32 = 1 << 0;
const FCMP_PS1: u32 = 1 << 2;

fn fcmp_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let (a, b) = if FLAGS & FCMP_PS1 != 0 {
        (
            core.fpr[instr.ra() as usize].paired1(),
            core.fpr[instr.rb() as usize].paired1(),
        )
    } else {
        (
            core.fpr[instr.ra() as usize].value(),
            core.fpr[instr.rb() as usize].value(),
        )
    };

    let old_fpscr = core.fpscr.0;

    let c = if a.is_nan() || b.is_nan() {
        let vxsnan = is_signalling_nan64(a) || is_signalling_nan64(b);
        if vxsnan {
            core.fpscr.set_vxsnan(true);
        }
        if FLAGS & FCMP_ORDERED != 0 && !(vxsnan && core.fpscr.ve()) {
            core.fpscr.set_vxvc(true);
        }
        cr_flag::UNORDERED
    } else if a < b {
        cr_flag::LESS_THAN
    } else if a > b {
        cr_flag::GREATER_THAN
    } else {
        cr_flag::EQUAL
    };

    core.cr.set_field(instr.crfd(), c);
    core.fpscr.set_fpcc(c);
    update_fx_fex_vx(core, old_fpscr);
}

fn fcmpo(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fcmp_generic::<FCMP_ORDERED>(core, instr)
}

fn fcmpu(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fcmp_generic::<0>(core, instr)
}

fn ps_cmpo0(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fcmp_generic::<FCMP_ORDERED>(core, instr)
}

fn ps_cmpo1(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fcmp_generic::<{ FCMP_ORDERED | FCMP_PS1 }>(core, instr)
}

fn ps_cmpu0(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fcmp_generic::<0>(core, instr)
}

fn ps_cmpu1(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    fcmp_generic::<FCMP_PS1>(core, instr)
}

// CR-bit logicals.
macro_rules! cr_logical {
    ($name:ident, |$a:ident, $b:ident| $expr:expr) => {
        fn $name(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
            let $a = core.cr.bit(instr.crba());
            let $b = core.cr.bit(instr.crbb());
            core.cr.set_bit(instr.crbd(), $expr);
        }
    };
}

cr_logical!(crand, |a, b| a & b);
cr_logical!(crandc, |a, b| a & !b);
cr_logical!(creqv, |a, b| !(a ^ b));
cr_logical!(crnand, |a, b| !(a & b));
cr_logical!(crnor, |a, b| !(a | b));
cr_logical!(cror, |a, b| a | b);
cr_logical!(crorc, |a, b| a | !b);
cr_logical!(crxor, |a, b| a ^ b);

fn mcrf(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let value = core.cr.field(instr.crfs());
    core.cr.set_field(instr.crfd(), value);
}

fn mcrfs(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let shift = 4 * (7 - instr.crfs());

    let fpscr_bits = (core.fpscr.0 >> shift) & 0xf;
    core.cr.set_field(instr.crfd(), fpscr_bits);

    // The copied exception bits are cleared; FEX and VX re-summarize.
    let exception_bits = Fpscr::FX | Fpscr::ALL_EXCEPTIONS;
    core.fpscr.0 &= !(exception_bits & (0xf << shift));
    update_fex_vx(core);
}

fn mcrxr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    core.cr.set_field(instr.crfd(), core.xer.crxr());
    core.xer.clear_crxr();
}

fn mfcr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    core.gpr[instr.rd() as usize] = core.cr.0;
}

fn mtcrf(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let s = core.gpr[instr.rd() as usize];
    let crm = instr.crm();

    let mut mask = 0;
    for i in 0..8 {
        if crm & (1 << i) != 0 {
            mask |= 0xf << (i * 4);
        }
    }

    core.cr.0 = (s & mask) | (core.cr.0 & !mask);
}

pub(super) fn register(interp: &mut Interpreter) {
    interp.register(InstructionID::Cmp, cmp);
    interp.register(InstructionID::Cmpi, cmpi);
    interp.register(InstructionID::Cmpl, cmpl);
    interp.register(InstructionID::Cmpli, cmpli);
    interp.register(InstructionID::Fcmpo, fcmpo);
    interp.register(InstructionID::Fcmpu, fcmpu);
    interp.register(InstructionID::Crand, crand);
    interp.register(InstructionID::Crandc, crandc);
    interp.register(InstructionID::Creqv, creqv);
    interp.register(InstructionID::Crnand, crnand);
    interp.register(InstructionID::Crnor, crnor);
    interp.register(InstructionID::Cror, cror);
    interp.register(InstructionID::Crorc, crorc);
    interp.register(InstructionID::Crxor, crxor);
    interp.register(InstructionID::Mcrf, mcrf);
    interp.register(InstructionID::Mcrfs, mcrfs);
    interp.register(InstructionID::Mcrxr, mcrxr);
    interp.register(InstructionID::Mfcr, mfcr);
    interp.register(InstructionID::Mtcrf, mtcrf);
    interp.register(InstructionID::PsCmpu0, ps_cmpu0);
    interp.register(InstructionID::PsCmpo0, ps_cmpo0);
    interp.register(InstructionID::PsCmpu1, ps_cmpu1);
    interp.register(InstructionID::PsCmpo1, ps_cmpo1);
}
