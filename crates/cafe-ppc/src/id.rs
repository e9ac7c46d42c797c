/// Every instruction the interpreter models, one variant per logical opcode.
///
/// The discriminants are sequential so the enum can index the dense handler
/// table; `COUNT` is the table size. `Kc` is the synthesized bridge-call
/// encoding reserved for host upcalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum InstructionID {
    // Branch
    B,
    Bc,
    Bcctr,
    Bclr,

    // Condition register
    Cmp,
    Cmpi,
    Cmpl,
    Cmpli,
    Fcmpo,
    Fcmpu,
    Crand,
    Crandc,
    Creqv,
    Crnand,
    Crnor,
    Cror,
    Crorc,
    Crxor,
    Mcrf,
    Mcrfs,
    Mcrxr,
    Mfcr,
    Mtcrf,
    PsCmpu0,
    PsCmpo0,
    PsCmpu1,
    PsCmpo1,

    // Integer
    Add,
    Addc,
    Adde,
    Addi,
    Addic,
    Addicx,
    Addis,
    Addme,
    Addze,
    And,
    Andc,
    Andi,
    Andis,
    Cntlzw,
    Divw,
    Divwu,
    Eqv,
    Extsb,
    Extsh,
    Mulhw,
    Mulhwu,
    Mulli,
    Mullw,
    Nand,
    Neg,
    Nor,
    Or,
    Orc,
    Ori,
    Oris,
    Rlwimi,
    Rlwinm,
    Rlwnm,
    Slw,
    Sraw,
    Srawi,
    Srw,
    Subf,
    Subfc,
    Subfe,
    Subfic,
    Subfme,
    Subfze,
    Xor,
    Xori,
    Xoris,

    // Floating point
    Fadd,
    Fadds,
    Fdiv,
    Fdivs,
    Fmul,
    Fmuls,
    Fsub,
    Fsubs,
    Fres,
    Frsqrte,
    Fsel,
    Fmadd,
    Fmadds,
    Fmsub,
    Fmsubs,
    Fnmadd,
    Fnmadds,
    Fnmsub,
    Fnmsubs,
    Fctiw,
    Fctiwz,
    Frsp,
    Fabs,
    Fnabs,
    Fmr,
    Fneg,
    Mffs,
    Mtfsb0,
    Mtfsb1,
    Mtfsf,
    Mtfsfi,

    // Load/store
    Lbz,
    Lbzu,
    Lbzux,
    Lbzx,
    Lha,
    Lhau,
    Lhaux,
    Lhax,
    Lhbrx,
    Lhz,
    Lhzu,
    Lhzux,
    Lhzx,
    Lwarx,
    Lwbrx,
    Lwz,
    Lwzu,
    Lwzux,
    Lwzx,
    Lfs,
    Lfsu,
    Lfsux,
    Lfsx,
    Lfd,
    Lfdu,
    Lfdux,
    Lfdx,
    Lmw,
    Lswi,
    Lswx,
    Stb,
    Stbu,
    Stbux,
    Stbx,
    Sth,
    Sthbrx,
    Sthu,
    Sthux,
    Sthx,
    Stw,
    Stwbrx,
    Stwcx,
    Stwu,
    Stwux,
    Stwx,
    Stfd,
    Stfdu,
    Stfdux,
    Stfdx,
    Stfiwx,
    Stfs,
    Stfsu,
    Stfsux,
    Stfsx,
    Stmw,
    Stswi,
    Stswx,
    PsqL,
    PsqLu,
    PsqLux,
    PsqLx,
    PsqSt,
    PsqStu,
    PsqStux,
    PsqStx,

    // Paired single
    PsAbs,
    PsAdd,
    PsDiv,
    PsMadd,
    PsMadds0,
    PsMadds1,
    PsMerge00,
    PsMerge01,
    PsMerge10,
    PsMerge11,
    PsMr,
    PsMsub,
    PsMul,
    PsMuls0,
    PsMuls1,
    PsNabs,
    PsNeg,
    PsNmadd,
    PsNmsub,
    PsRes,
    PsRsqrte,
    PsSel,
    PsSub,
    PsSum0,
    PsSum1,

    // System
    Dcbf,
    Dcbi,
    Dcbst,
    Dcbt,
    Dcbtst,
    Dcbz,
    DcbzL,
    Eieio,
    Icbi,
    Isync,
    Sync,
    Mfspr,
    Mtspr,
    Mftb,
    Mfmsr,
    Mtmsr,
    Mfsr,
    Mfsrin,
    Mtsr,
    Mtsrin,
    Kc,
}

impl InstructionID {
    /// Number of opcodes; the size of the dense handler table.
    pub const COUNT: usize = InstructionID::Kc as usize + 1;
}
