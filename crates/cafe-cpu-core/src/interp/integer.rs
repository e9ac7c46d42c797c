//! Integer, logical, shift and rotate instructions.
//!
//! Each family is one flag-parameterized body; the per-opcode functions
//! just pick a flag set.

use cafe_mem::GuestMemory;
use cafe_ppc::{sign_extend, Instruction, InstructionID};

use super::Interpreter;
use crate::state::{cr_flag, Core};

/// Update cr0 from `value`, copying SO from XER.
pub(super) fn update_condition_register(core: &mut Core, value: u32) {
    let mut flags = if value == 0 {
        cr_flag::ZERO
    } else if value >> 31 != 0 {
        cr_flag::NEGATIVE
    } else {
        cr_flag::POSITIVE
    };

    if core.xer.so() {
        flags |= cr_flag::SUMMARY_OVERFLOW;
    }

    core.cr.set_field(0, flags);
}

fn update_carry(core: &mut Core, carry: bool) {
    core.xer.set_ca(carry);
}

fn update_overflow(core: &mut Core, overflow: bool) {
    core.xer.set_ov(overflow);
    if overflow {
        core.xer.set_so(true);
    }
}

/// PowerPC mask from `mb` to `me` (bit 0 is the MSB), wrapping when
/// `mb > me`.
fn ppc_mask(mb: u32, me: u32) -> u32 {
    let head = u32::MAX >> mb;
    let tail = u32::MAX << (31 - me);

    if mb <= me {
        head & tail
    } else {
        head | tail
    }
}

// Add family.
const ADD_CARRY: u32 = 1 << 0; // xer[ca] = carry out
const ADD_EXTENDED: u32 = 1 << 1; // d = a + b + xer[ca]
const ADD_IMMEDIATE: u32 = 1 << 2; // b = simm
const ADD_CHECK_RECORD: u32 = 1 << 3; // honor oe/rc
const ADD_ALWAYS_RECORD: u32 = 1 << 4; // update cr0 unconditionally
const ADD_SHIFTED: u32 = 1 << 5; // b <<= 16
const ADD_TO_ZERO: u32 = 1 << 6; // b = 0
const ADD_TO_MINUS_ONE: u32 = 1 << 7; // b = -1
const ADD_ZERO_RA: u32 = 1 << 8; // a = (rA == 0) ? 0 : gpr[rA]
const ADD_SUBTRACT: u32 = 1 << 9; // a = ~a, +1 instead of carry-in

fn add_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let mut a = if FLAGS & ADD_ZERO_RA != 0 && instr.ra() == 0 {
        0
    } else {
        core.gpr[instr.ra() as usize]
    };

    if FLAGS & ADD_SUBTRACT != 0 {
        a = !a;
    }

    let mut b = if FLAGS & ADD_IMMEDIATE != 0 {
        sign_extend(instr.simm(), 16)
    } else if FLAGS & ADD_TO_ZERO != 0 {
        0
    } else if FLAGS & ADD_TO_MINUS_ONE != 0 {
        u32::MAX
    } else {
        core.gpr[instr.rb() as usize]
    };

    if FLAGS & ADD_SHIFTED != 0 {
        b <<= 16;
    }

    let mut d = a.wrapping_add(b);

    if FLAGS & ADD_EXTENDED != 0 {
        d = d.wrapping_add(core.xer.ca() as u32);
    } else if FLAGS & ADD_SUBTRACT != 0 {
        d = d.wrapping_add(1);
    }

    core.gpr[instr.rd() as usize] = d;

    if FLAGS & ADD_CARRY != 0 {
        let carry = d < a || (d == a && b > 0);
        update_carry(core, carry);
    }

    if FLAGS & ADD_ALWAYS_RECORD != 0 {
        // Always-record only means cr0, never overflow.
        update_condition_register(core, d);
    } else if FLAGS & ADD_CHECK_RECORD != 0 {
        if instr.oe() {
            let overflow = ((a ^ d) & (b ^ d)) >> 31 != 0;
            update_overflow(core, overflow);
        }

        if instr.rc() {
            update_condition_register(core, d);
        }
    }
}

fn add(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<ADD_CHECK_RECORD>(core, instr)
}

fn addc(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_CARRY | ADD_CHECK_RECORD }>(core, instr)
}

fn adde(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_EXTENDED | ADD_CARRY | ADD_CHECK_RECORD }>(core, instr)
}

fn addi(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_IMMEDIATE | ADD_ZERO_RA }>(core, instr)
}

fn addic(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_IMMEDIATE | ADD_CARRY }>(core, instr)
}

fn addicx(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_IMMEDIATE | ADD_CARRY | ADD_ALWAYS_RECORD }>(core, instr)
}

fn addis(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_IMMEDIATE | ADD_SHIFTED | ADD_ZERO_RA }>(core, instr)
}

fn addme(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_CHECK_RECORD | ADD_CARRY | ADD_EXTENDED | ADD_TO_MINUS_ONE }>(core, instr)
}

fn addze(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_CHECK_RECORD | ADD_CARRY | ADD_EXTENDED | ADD_TO_ZERO }>(core, instr)
}

fn subf(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    // rD = ~rA + rB + 1, so the add body covers subtract too.
    add_generic::<{ ADD_SUBTRACT | ADD_CHECK_RECORD }>(core, instr)
}

fn subfc(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_CARRY | ADD_SUBTRACT | ADD_CHECK_RECORD }>(core, instr)
}

fn subfe(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_EXTENDED | ADD_CARRY | ADD_SUBTRACT | ADD_CHECK_RECORD }>(core, instr)
}

fn subfic(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_IMMEDIATE | ADD_CARRY | ADD_SUBTRACT }>(core, instr)
}

fn subfme(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_TO_MINUS_ONE | ADD_EXTENDED | ADD_CARRY | ADD_CHECK_RECORD | ADD_SUBTRACT }>(
        core, instr,
    )
}

fn subfze(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    add_generic::<{ ADD_TO_ZERO | ADD_EXTENDED | ADD_CARRY | ADD_CHECK_RECORD | ADD_SUBTRACT }>(
        core, instr,
    )
}

// Logical families: and/or/xor share the operand selection flags.
const LOGIC_COMPLEMENT: u32 = 1 << 0; // b = ~b
const LOGIC_CHECK_RECORD: u32 = 1 << 1; // honor rc
const LOGIC_IMMEDIATE: u32 = 1 << 2; // b = uimm
const LOGIC_SHIFTED: u32 = 1 << 3; // b <<= 16
const LOGIC_ALWAYS_RECORD: u32 = 1 << 4; // update cr0 unconditionally

#[derive(Clone, Copy, PartialEq)]
enum LogicOp {
    And,
    Or,
    Xor,
}

fn logic_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction, op: LogicOp) {
    let s = core.gpr[instr.rd() as usize];

    let mut b = if FLAGS & LOGIC_IMMEDIATE != 0 {
        instr.uimm()
    } else {
        core.gpr[instr.rb() as usize]
    };

    if FLAGS & LOGIC_SHIFTED != 0 {
        b <<= 16;
    }

    if FLAGS & LOGIC_COMPLEMENT != 0 {
        b = !b;
    }

    let a = match op {
        LogicOp::And => s & b,
        LogicOp::Or => s | b,
        LogicOp::Xor => s ^ b,
    };
    core.gpr[instr.ra() as usize] = a;

    if FLAGS & LOGIC_ALWAYS_RECORD != 0 {
        update_condition_register(core, a);
    } else if FLAGS & LOGIC_CHECK_RECORD != 0 && instr.rc() {
        update_condition_register(core, a);
    }
}

fn and(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<LOGIC_CHECK_RECORD>(core, instr, LogicOp::And)
}

fn andc(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<{ LOGIC_CHECK_RECORD | LOGIC_COMPLEMENT }>(core, instr, LogicOp::And)
}

fn andi(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<{ LOGIC_ALWAYS_RECORD | LOGIC_IMMEDIATE }>(core, instr, LogicOp::And)
}

fn andis(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<{ LOGIC_ALWAYS_RECORD | LOGIC_IMMEDIATE | LOGIC_SHIFTED }>(
        core,
        instr,
        LogicOp::And,
    )
}

fn or(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<LOGIC_CHECK_RECORD>(core, instr, LogicOp::Or)
}

fn orc(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<{ LOGIC_CHECK_RECORD | LOGIC_COMPLEMENT }>(core, instr, LogicOp::Or)
}

fn ori(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<LOGIC_IMMEDIATE>(core, instr, LogicOp::Or)
}

fn oris(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<{ LOGIC_IMMEDIATE | LOGIC_SHIFTED }>(core, instr, LogicOp::Or)
}

fn xor(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<LOGIC_CHECK_RECORD>(core, instr, LogicOp::Xor)
}

fn xori(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<LOGIC_IMMEDIATE>(core, instr, LogicOp::Xor)
}

fn xoris(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    logic_generic::<{ LOGIC_IMMEDIATE | LOGIC_SHIFTED }>(core, instr, LogicOp::Xor)
}

fn nand(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let s = core.gpr[instr.rd() as usize];
    let b = core.gpr[instr.rb() as usize];

    let a = !(s & b);
    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn nor(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let s = core.gpr[instr.rd() as usize];
    let b = core.gpr[instr.rb() as usize];

    let a = !(s | b);
    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn eqv(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let s = core.gpr[instr.rd() as usize];
    let b = core.gpr[instr.rb() as usize];

    let a = !(s ^ b);
    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn cntlzw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.rd() as usize].leading_zeros();
    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn extsb(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = sign_extend(core.gpr[instr.rd() as usize], 8);
    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn extsh(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = sign_extend(core.gpr[instr.rd() as usize], 16);
    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn neg(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize];

    let d = (!a).wrapping_add(1);
    core.gpr[instr.rd() as usize] = d;

    if instr.oe() {
        update_overflow(core, a == 0x8000_0000);
    }

    if instr.rc() {
        update_condition_register(core, d);
    }
}

// Multiply family. The product is widened to 64 bits first; mulhw* ignore
// OE.
const MUL_LOW: u32 = 1 << 0;
const MUL_HIGH: u32 = 1 << 1;
const MUL_IMMEDIATE: u32 = 1 << 2;
const MUL_CHECK_OVERFLOW: u32 = 1 << 3;
const MUL_CHECK_RECORD: u32 = 1 << 4;

fn mul_signed_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize] as i32 as i64;

    let b = if FLAGS & MUL_IMMEDIATE != 0 {
        sign_extend(instr.simm(), 16) as i32 as i64
    } else {
        core.gpr[instr.rb() as usize] as i32 as i64
    };

    let product = a * b;
    let d = if FLAGS & MUL_LOW != 0 {
        product as i32
    } else {
        (product >> 32) as i32
    };

    core.gpr[instr.rd() as usize] = d as u32;

    if FLAGS & MUL_CHECK_OVERFLOW != 0 && instr.oe() {
        let overflow = product < -0x8000_0000i64 || product > 0x7fff_ffff;
        update_overflow(core, overflow);
    }

    if FLAGS & MUL_CHECK_RECORD != 0 && instr.rc() {
        update_condition_register(core, d as u32);
    }
}

fn mul_unsigned_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize] as u64;
    let b = core.gpr[instr.rb() as usize] as u64;

    let product = a * b;
    let d = if FLAGS & MUL_LOW != 0 {
        product as u32
    } else {
        (product >> 32) as u32
    };

    core.gpr[instr.rd() as usize] = d;

    if FLAGS & MUL_CHECK_RECORD != 0 && instr.rc() {
        update_condition_register(core, d);
    }
}

fn mulhw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    mul_signed_generic::<{ MUL_HIGH | MUL_CHECK_RECORD }>(core, instr)
}

fn mulhwu(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    mul_unsigned_generic::<{ MUL_HIGH | MUL_CHECK_RECORD }>(core, instr)
}

fn mulli(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    mul_signed_generic::<{ MUL_IMMEDIATE | MUL_LOW }>(core, instr)
}

fn mullw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    mul_signed_generic::<{ MUL_LOW | MUL_CHECK_RECORD | MUL_CHECK_OVERFLOW }>(core, instr)
}

// Divide family: divide-by-zero and INT_MIN / -1 produce -1 or 0 by the
// sign of rA, with OV when OE is set.
fn divw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize] as i32;
    let b = core.gpr[instr.rb() as usize] as i32;

    let overflow = b == 0 || (a as u32 == 0x8000_0000 && b == -1);
    let d = if !overflow {
        (a / b) as u32
    } else if a < 0 {
        u32::MAX
    } else {
        0
    };

    core.gpr[instr.rd() as usize] = d;

    if instr.oe() {
        update_overflow(core, overflow);
    }

    if instr.rc() {
        update_condition_register(core, d);
    }
}

fn divwu(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    let a = core.gpr[instr.ra() as usize];
    let b = core.gpr[instr.rb() as usize];

    let overflow = b == 0;
    let d = if !overflow { a / b } else { 0 };

    core.gpr[instr.rd() as usize] = d;

    if instr.oe() {
        update_overflow(core, overflow);
    }

    if instr.rc() {
        update_condition_register(core, d);
    }
}

// Rotate-left-word family.
const RLW_IMMEDIATE: u32 = 1 << 0; // n = sh
const RLW_INSERT: u32 = 1 << 1; // a = (r & m) | (a & ~m)

fn rlw_generic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let s = core.gpr[instr.rd() as usize];

    let n = if FLAGS & RLW_IMMEDIATE != 0 {
        instr.sh()
    } else {
        core.gpr[instr.rb() as usize] & 0x1f
    };

    let r = s.rotate_left(n);
    let m = ppc_mask(instr.mb(), instr.me());

    let a = if FLAGS & RLW_INSERT != 0 {
        (r & m) | (core.gpr[instr.ra() as usize] & !m)
    } else {
        r & m
    };

    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn rlwimi(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    rlw_generic::<{ RLW_IMMEDIATE | RLW_INSERT }>(core, instr)
}

fn rlwinm(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    rlw_generic::<RLW_IMMEDIATE>(core, instr)
}

fn rlwnm(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    rlw_generic::<0>(core, instr)
}

// Shifts. A shift amount with bit 5 set clears (or sign-fills) the result.
const SHIFT_LEFT: u32 = 1 << 0;
const SHIFT_IMMEDIATE: u32 = 1 << 2;

fn shift_logical<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let s = core.gpr[instr.rd() as usize];

    let b = if FLAGS & SHIFT_IMMEDIATE != 0 {
        instr.sh()
    } else {
        core.gpr[instr.rb() as usize]
    };

    let n = b & 0x1f;
    let a = if b & 0x20 != 0 {
        0
    } else if FLAGS & SHIFT_LEFT != 0 {
        s << n
    } else {
        s >> n
    };

    core.gpr[instr.ra() as usize] = a;

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn slw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    shift_logical::<SHIFT_LEFT>(core, instr)
}

fn srw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    shift_logical::<0>(core, instr)
}

fn shift_arithmetic<const FLAGS: u32>(core: &mut Core, instr: Instruction) {
    let s = core.gpr[instr.rd() as usize] as i32;

    let b = if FLAGS & SHIFT_IMMEDIATE != 0 {
        instr.sh()
    } else {
        core.gpr[instr.rb() as usize]
    };

    let mut carry = false;
    let a = if b & 0x20 != 0 {
        if s >= 0 {
            0
        } else {
            carry = true;
            -1i32 as u32
        }
    } else {
        let n = b & 0x1f;
        if n == 0 {
            s as u32
        } else {
            // CA is set when a negative value sheds nonzero bits.
            if s < 0 && (s as u32) << (32 - n) != 0 {
                carry = true;
            }
            (s >> n) as u32
        }
    };

    core.gpr[instr.ra() as usize] = a;
    update_carry(core, carry);

    if instr.rc() {
        update_condition_register(core, a);
    }
}

fn sraw(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    shift_arithmetic::<0>(core, instr)
}

fn srawi(core: &mut Core, _mem: &GuestMemory, instr: Instruction) {
    shift_arithmetic::<SHIFT_IMMEDIATE>(core, instr)
}

pub(super) fn register(interp: &mut Interpreter) {
    interp.register(InstructionID::Add, add);
    interp.register(InstructionID::Addc, addc);
    interp.register(InstructionID::Adde, adde);
    interp.register(InstructionID::Addi, addi);
    interp.register(InstructionID::Addic, addic);
    interp.register(InstructionID::Addicx, addicx);
    interp.register(InstructionID::Addis, addis);
    interp.register(InstructionID::Addme, addme);
    interp.register(InstructionID::Addze, addze);
    interp.register(InstructionID::And, and);
    interp.register(InstructionID::Andc, andc);
    interp.register(InstructionID::Andi, andi);
    interp.register(InstructionID::Andis, andis);
    interp.register(InstructionID::Cntlzw, cntlzw);
    interp.register(InstructionID::Divw, divw);
    interp.register(InstructionID::Divwu, divwu);
    interp.register(InstructionID::Eqv, eqv);
    interp.register(InstructionID::Extsb, extsb);
    interp.register(InstructionID::Extsh, extsh);
    interp.register(InstructionID::Mulhw, mulhw);
    interp.register(InstructionID::Mulhwu, mulhwu);
    interp.register(InstructionID::Mulli, mulli);
    interp.register(InstructionID::Mullw, mullw);
    interp.register(InstructionID::Nand, nand);
    interp.register(InstructionID::Neg, neg);
    interp.register(InstructionID::Nor, nor);
    interp.register(InstructionID::Or, or);
    interp.register(InstructionID::Orc, orc);
    interp.register(InstructionID::Ori, ori);
    interp.register(InstructionID::Oris, oris);
    interp.register(InstructionID::Rlwimi, rlwimi);
    interp.register(InstructionID::Rlwinm, rlwinm);
    interp.register(InstructionID::Rlwnm, rlwnm);
    interp.register(InstructionID::Slw, slw);
    interp.register(InstructionID::Sraw, sraw);
    interp.register(InstructionID::Srawi, srawi);
    interp.register(InstructionID::Srw, srw);
    interp.register(InstructionID::Subf, subf);
    interp.register(InstructionID::Subfc, subfc);
    interp.register(InstructionID::Subfe, subfe);
    interp.register(InstructionID::Subfic, subfic);
    interp.register(InstructionID::Subfme, subfme);
    interp.register(InstructionID::Subfze, subfze);
    interp.register(InstructionID::Xor, xor);
    interp.register(InstructionID::Xori, xori);
    interp.register(InstructionID::Xoris, xoris);
}
