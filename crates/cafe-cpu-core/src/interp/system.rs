//! System instructions: SPR moves, time base, segment/machine-state
//! storage moves, and the cache block ops.

use cafe_mem::GuestMemory;
use cafe_ppc::{decode_spr, Instruction, InstructionID, Spr};

use super::Interpreter;
use crate::state::Core;
use crate::time;

// The only architecturally visible cache op is dcbz's zero fill; the rest
// manage a cache this model does not have.
fn icbi(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn dcbf(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn dcbi(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn dcbst(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn dcbt(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn dcbtst(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn dcbz(core: &mut Core, mem: &GuestMemory, instr: Instruction) {
    let base = if instr.ra() == 0 {
        0
    } else {
        core.gpr[instr.ra() as usize]
    };

    let addr = base.wrapping_add(core.gpr[instr.rb() as usize]) & !31;
    mem.fill_zero(addr, 32);
}

fn dcbz_l(core: &mut Core, mem: &GuestMemory, instr: Instruction) {
    // Locked-cache variant; same zero fill.
    dcbz(core, mem, instr)
}

// The core is sequentially consistent by construction.
fn eieio(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn sync(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn isync(_core: &mut Core, _mem: &GuestMemory, _instr: Instruction) {}

fn mfspr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let spr = decode_spr(instr.spr());

    let value = match spr {
        Spr::Xer => core.xer.0,
        Spr::Lr => core.lr,
        Spr::Ctr => core.ctr,
        Spr::Ugqr(n) => core.gqr[n].0,
        _ => {
            tracing::error!(?spr, cia = core.cia, "invalid mfspr");
            0
        }
    };

    core.gpr[instr.rd() as usize] = value;
}

fn mtspr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let spr = decode_spr(instr.spr());
    let value = core.gpr[instr.rd() as usize];

    match spr {
        Spr::Xer => core.xer.0 = value,
        Spr::Lr => core.lr = value,
        Spr::Ctr => core.ctr = value,
        Spr::Ugqr(n) => core.gqr[n].0 = value,
        _ => tracing::error!(?spr, cia = core.cia, "invalid mtspr"),
    }
}

fn mftb(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let ticks = time::now();
    core.tbl = ticks as u32;
    core.tbu = (ticks >> 32) as u32;

    let value = match decode_spr(instr.spr()) {
        Spr::Utbl => core.tbl,
        Spr::Utbu => core.tbu,
        spr => {
            tracing::error!(?spr, cia = core.cia, "invalid mftb");
            0
        }
    };

    core.gpr[instr.rd() as usize] = value;
}

fn mfmsr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    core.gpr[instr.rd() as usize] = core.msr;
}

fn mtmsr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    core.msr = core.gpr[instr.rd() as usize];
}

fn mfsr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    core.gpr[instr.rd() as usize] = core.sr[instr.sr() as usize];
}

fn mfsrin(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let sr = core.gpr[instr.rb() as usize] & 0xf;
    core.gpr[instr.rd() as usize] = core.sr[sr as usize];
}

fn mtsr(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    core.sr[instr.sr() as usize] = core.gpr[instr.rd() as usize];
}

fn mtsrin(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let sr = core.gpr[instr.rb() as usize] & 0xf;
    core.sr[sr as usize] = core.gpr[instr.rd() as usize];
}

pub(super) fn register(interp: &mut Interpreter) {
    interp.register(InstructionID::Dcbf, dcbf);
    interp.register(InstructionID::Dcbi, dcbi);
    interp.register(InstructionID::Dcbst, dcbst);
    interp.register(InstructionID::Dcbt, dcbt);
    interp.register(InstructionID::Dcbtst, dcbtst);
    interp.register(InstructionID::Dcbz, dcbz);
    interp.register(InstructionID::DcbzL, dcbz_l);
    interp.register(InstructionID::Eieio, eieio);
    interp.register(InstructionID::Icbi, icbi);
    interp.register(InstructionID::Isync, isync);
    interp.register(InstructionID::Sync, sync);
    interp.register(InstructionID::Mfspr, mfspr);
    interp.register(InstructionID::Mtspr, mtspr);
    interp.register(InstructionID::Mftb, mftb);
    interp.register(InstructionID::Mfmsr, mfmsr);
    interp.register(InstructionID::Mtmsr, mtmsr);
    interp.register(InstructionID::Mfsr, mfsr);
    interp.register(InstructionID::Mfsrin, mfsrin);
    interp.register(InstructionID::Mtsr, mtsr);
    interp.register(InstructionID::Mtsrin, mtsrin);
    // The bridge-call opcode (Kc) is dispatched by step_one through the
    // kernel-call registry rather than this table.
}
