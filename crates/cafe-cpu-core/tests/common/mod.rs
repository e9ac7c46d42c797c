#![allow(dead_code)]

use cafe_cpu_core::hostfpu::{self, FpExceptions};
use cafe_cpu_core::state::RoundMode;
use cafe_cpu_core::{Core, GuestMemory, Interpreter};

pub const CODE_BASE: u32 = 0x1000;
pub const MEM_SIZE: u32 = 0x10_000;

pub fn setup() -> (Interpreter, Core, GuestMemory) {
    (Interpreter::new(), Core::new(), GuestMemory::new(MEM_SIZE))
}

/// Mirror what `resume` installs before the first step, so single-stepped
/// float tests see a clean host FPU.
pub fn reset_hostfpu() {
    hostfpu::set_round_mode(RoundMode::Nearest);
    hostfpu::clear(FpExceptions::all());
}

/// Execute one instruction word at `CODE_BASE`.
pub fn exec(interp: &Interpreter, core: &mut Core, mem: &GuestMemory, word: u32) {
    mem.write::<u32>(CODE_BASE, word);
    core.nia = CODE_BASE;
    interp.step_one(core, mem).unwrap();
}

// Instruction word builders, one per encoding form.

pub fn d_form(opcd: u32, d: u32, a: u32, imm: u32) -> u32 {
    (opcd << 26) | (d << 21) | (a << 16) | (imm & 0xffff)
}

pub fn x_form(opcd: u32, d: u32, a: u32, b: u32, xo: u32, rc: bool) -> u32 {
    (opcd << 26) | (d << 21) | (a << 16) | (b << 11) | (xo << 1) | rc as u32
}

pub fn xo_form(d: u32, a: u32, b: u32, oe: bool, xo: u32, rc: bool) -> u32 {
    (31 << 26) | (d << 21) | (a << 16) | (b << 11) | ((oe as u32) << 10) | (xo << 1) | rc as u32
}

pub fn a_form(opcd: u32, d: u32, a: u32, b: u32, c: u32, xo: u32, rc: bool) -> u32 {
    (opcd << 26) | (d << 21) | (a << 16) | (b << 11) | (c << 6) | (xo << 1) | rc as u32
}

pub fn m_form(opcd: u32, s: u32, a: u32, sh: u32, mb: u32, me: u32, rc: bool) -> u32 {
    (opcd << 26) | (s << 21) | (a << 16) | (sh << 11) | (mb << 6) | (me << 1) | rc as u32
}

pub fn b_form(bo: u32, bi: u32, bd: u32, aa: bool, lk: bool) -> u32 {
    (16 << 26) | (bo << 21) | (bi << 16) | ((bd & 0x3fff) << 2) | ((aa as u32) << 1) | lk as u32
}

pub fn i_form(li: u32, aa: bool, lk: bool) -> u32 {
    (18 << 26) | ((li & 0x00ff_ffff) << 2) | ((aa as u32) << 1) | lk as u32
}

pub fn psq_form(opcd: u32, d: u32, a: u32, w: u32, i: u32, disp: u32) -> u32 {
    (opcd << 26) | (d << 21) | (a << 16) | (w << 15) | (i << 12) | (disp & 0xfff)
}

/// mfspr/mtspr/mftb SPR field: the 10-bit number with its halves swapped.
pub fn spr_field(n: u32) -> u32 {
    ((n & 0x1f) << 5) | ((n >> 5) & 0x1f)
}
