use crate::id::InstructionID;
use crate::instruction::Instruction;

/// Decode one instruction word to its logical opcode.
///
/// Returns `None` for anything outside the modeled set; the runtime has no
/// illegal-instruction trap, so the caller treats that as fatal.
pub fn decode(instr: Instruction) -> Option<InstructionID> {
    use InstructionID::*;

    Some(match instr.opcd() {
        1 => Kc,
        4 => return decode_paired(instr),
        7 => Mulli,
        8 => Subfic,
        10 => Cmpli,
        11 => Cmpi,
        12 => Addic,
        13 => Addicx,
        14 => Addi,
        15 => Addis,
        16 => Bc,
        18 => B,
        19 => return decode_19(instr),
        20 => Rlwimi,
        21 => Rlwinm,
        23 => Rlwnm,
        24 => Ori,
        25 => Oris,
        26 => Xori,
        27 => Xoris,
        28 => Andi,
        29 => Andis,
        31 => return decode_31(instr),
        32 => Lwz,
        33 => Lwzu,
        34 => Lbz,
        35 => Lbzu,
        36 => Stw,
        37 => Stwu,
        38 => Stb,
        39 => Stbu,
        40 => Lhz,
        41 => Lhzu,
        42 => Lha,
        43 => Lhau,
        44 => Sth,
        45 => Sthu,
        46 => Lmw,
        47 => Stmw,
        48 => Lfs,
        49 => Lfsu,
        50 => Lfd,
        51 => Lfdu,
        52 => Stfs,
        53 => Stfsu,
        54 => Stfd,
        55 => Stfdu,
        56 => PsqL,
        57 => PsqLu,
        59 => return decode_59(instr),
        60 => PsqSt,
        61 => PsqStu,
        63 => return decode_63(instr),
        _ => return None,
    })
}

fn decode_19(instr: Instruction) -> Option<InstructionID> {
    use InstructionID::*;

    Some(match instr.xo10() {
        0 => Mcrf,
        16 => Bclr,
        33 => Crnor,
        129 => Crandc,
        150 => Isync,
        193 => Crxor,
        225 => Crnand,
        257 => Crand,
        289 => Creqv,
        417 => Crorc,
        449 => Cror,
        528 => Bcctr,
        _ => return None,
    })
}

fn decode_31(instr: Instruction) -> Option<InstructionID> {
    use InstructionID::*;

    // X-forms carry the full 10-bit extended opcode; XO-form arithmetic
    // repeats at xo | 512 when OE is set, so it is matched on 9 bits below.
    Some(match instr.xo10() {
        0 => Cmp,
        19 => Mfcr,
        20 => Lwarx,
        23 => Lwzx,
        24 => Slw,
        26 => Cntlzw,
        28 => And,
        32 => Cmpl,
        54 => Dcbst,
        55 => Lwzux,
        60 => Andc,
        83 => Mfmsr,
        86 => Dcbf,
        87 => Lbzx,
        119 => Lbzux,
        124 => Nor,
        144 => Mtcrf,
        146 => Mtmsr,
        150 => Stwcx,
        151 => Stwx,
        183 => Stwux,
        210 => Mtsr,
        215 => Stbx,
        242 => Mtsrin,
        246 => Dcbtst,
        247 => Stbux,
        278 => Dcbt,
        279 => Lhzx,
        284 => Eqv,
        311 => Lhzux,
        316 => Xor,
        339 => Mfspr,
        343 => Lhax,
        371 => Mftb,
        375 => Lhaux,
        407 => Sthx,
        412 => Orc,
        439 => Sthux,
        444 => Or,
        467 => Mtspr,
        470 => Dcbi,
        476 => Nand,
        512 => Mcrxr,
        533 => Lswx,
        534 => Lwbrx,
        535 => Lfsx,
        536 => Srw,
        567 => Lfsux,
        595 => Mfsr,
        597 => Lswi,
        598 => Sync,
        599 => Lfdx,
        631 => Lfdux,
        659 => Mfsrin,
        661 => Stswx,
        662 => Stwbrx,
        663 => Stfsx,
        695 => Stfsux,
        725 => Stswi,
        727 => Stfdx,
        759 => Stfdux,
        790 => Lhbrx,
        792 => Sraw,
        824 => Srawi,
        854 => Eieio,
        918 => Sthbrx,
        922 => Extsh,
        954 => Extsb,
        982 => Icbi,
        983 => Stfiwx,
        1014 => Dcbz,
        xo => match xo & 0x1ff {
            8 => Subfc,
            10 => Addc,
            11 => Mulhwu,
            40 => Subf,
            75 => Mulhw,
            104 => Neg,
            136 => Subfe,
            138 => Adde,
            200 => Subfze,
            202 => Addze,
            232 => Subfme,
            234 => Addme,
            235 => Mullw,
            266 => Add,
            459 => Divwu,
            491 => Divw,
            _ => return None,
        },
    })
}

fn decode_59(instr: Instruction) -> Option<InstructionID> {
    use InstructionID::*;

    Some(match instr.xo5() {
        18 => Fdivs,
        20 => Fsubs,
        21 => Fadds,
        24 => Fres,
        25 => Fmuls,
        28 => Fmsubs,
        29 => Fmadds,
        30 => Fnmsubs,
        31 => Fnmadds,
        _ => return None,
    })
}

fn decode_63(instr: Instruction) -> Option<InstructionID> {
    use InstructionID::*;

    // A-forms first (5-bit extended opcode); the 10-bit X-forms of this
    // primary opcode never alias an A-form in their low five bits.
    Some(match instr.xo5() {
        18 => Fdiv,
        20 => Fsub,
        21 => Fadd,
        23 => Fsel,
        25 => Fmul,
        26 => Frsqrte,
        28 => Fmsub,
        29 => Fmadd,
        30 => Fnmsub,
        31 => Fnmadd,
        _ => match instr.xo10() {
            0 => Fcmpu,
            12 => Frsp,
            14 => Fctiw,
            15 => Fctiwz,
            32 => Fcmpo,
            38 => Mtfsb1,
            40 => Fneg,
            64 => Mcrfs,
            70 => Mtfsb0,
            72 => Fmr,
            134 => Mtfsfi,
            136 => Fnabs,
            264 => Fabs,
            583 => Mffs,
            711 => Mtfsf,
            _ => return None,
        },
    })
}

fn decode_paired(instr: Instruction) -> Option<InstructionID> {
    use InstructionID::*;

    Some(match instr.xo5() {
        10 => PsSum0,
        11 => PsSum1,
        12 => PsMuls0,
        13 => PsMuls1,
        14 => PsMadds0,
        15 => PsMadds1,
        18 => PsDiv,
        20 => PsSub,
        21 => PsAdd,
        23 => PsSel,
        24 => PsRes,
        25 => PsMul,
        26 => PsRsqrte,
        28 => PsMsub,
        29 => PsMadd,
        30 => PsNmsub,
        31 => PsNmadd,
        _ => match instr.xo10() {
            0 => PsCmpu0,
            6 => PsqLx,
            7 => PsqStx,
            32 => PsCmpo0,
            38 => PsqLux,
            39 => PsqStux,
            40 => PsNeg,
            64 => PsCmpu1,
            72 => PsMr,
            96 => PsCmpo1,
            136 => PsNabs,
            264 => PsAbs,
            528 => PsMerge00,
            560 => PsMerge01,
            592 => PsMerge10,
            624 => PsMerge11,
            1014 => DcbzL,
            _ => return None,
        },
    })
}
