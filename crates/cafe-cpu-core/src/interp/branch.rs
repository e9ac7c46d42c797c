//! Branch unit.

use cafe_mem::GuestMemory;
use cafe_ppc::{sign_extend, Instruction, InstructionID};

use super::Interpreter;
use crate::state::Core;

fn b(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let mut nia = sign_extend(instr.li() << 2, 26);

    if !instr.aa() {
        nia = nia.wrapping_add(core.cia);
    }

    core.nia = nia;

    if instr.lk() {
        core.lr = core.cia.wrapping_add(4);
    }
}

// BO field bit positions (counting from the least significant bit).
const BO_CTR_VALUE: u32 = 1;
const BO_NO_CHECK_CTR: u32 = 2;
const BO_COND_VALUE: u32 = 3;
const BO_NO_CHECK_COND: u32 = 4;

const BC_CHECK_CTR: u32 = 1 << 0;
const BC_CHECK_COND: u32 = 1 << 1;
const BC_BRANCH_LR: u32 = 1 << 2;
const BC_BRANCH_CTR: u32 = 1 << 3;

fn bc_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let bo = instr.bo();
    let mut ctr_ok = true;
    let mut cond_ok = true;

    if FLAGS & BC_CHECK_CTR != 0 && (bo >> BO_NO_CHECK_CTR) & 1 == 0 {
        core.ctr = core.ctr.wrapping_sub(1);

        let ctb = (core.ctr != 0) as u32;
        let ctv = (bo >> BO_CTR_VALUE) & 1;
        ctr_ok = ctb ^ ctv != 0;
    }

    if FLAGS & BC_CHECK_COND != 0 && (bo >> BO_NO_CHECK_COND) & 1 == 0 {
        let crb = core.cr.bit(instr.bi());
        let crv = (bo >> BO_COND_VALUE) & 1;
        cond_ok = crb == crv;
    }

    if ctr_ok && cond_ok {
        let nia = if FLAGS & BC_BRANCH_CTR != 0 {
            core.ctr & !0x3
        } else if FLAGS & BC_BRANCH_LR != 0 {
            core.lr & !0x3
        } else {
            let mut target = sign_extend(instr.bd() << 2, 16);
            if !instr.aa() {
                target = target.wrapping_add(core.cia);
            }
            target
        };

        core.nia = nia;

        if instr.lk() {
            core.lr = core.cia.wrapping_add(4);
        }
    }
}

fn bc(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    bc_generic::<{ BC_CHECK_CTR | BC_CHECK_COND }>(core, instr)
}

fn bcctr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    bc_generic::<{ BC_BRANCH_CTR | BC_CHECK_COND }>(core, instr)
}

fn bclr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    bc_generic::<{ BC_BRANCH_LR | BC_CHECK_CTR | BC_CHECK_COND }>(core, instr)
}

pub(super) fn register(interp: &mut Interpreter) {
    interp.register(InstructionID::B, b);
    interp.register(InstructionID::Bc, bc);
    interp.register(InstructionID::Bcctr, bcctr);
    interp.register(InstructionID::Bclr, bclr);
}
