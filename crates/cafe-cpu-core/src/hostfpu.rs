//! Host FPU control: rounding mode and sticky exception flags.
//!
//! The interpreter leans on the host FPU for IEEE accounting — it installs
//! the guest rounding mode, lets the hardware set sticky flags, and folds
//! them back into FPSCR after each float op. Host exceptions stay masked
//! throughout, so `raise` only sets sticky bits and can never trap.
//!
//! The control word is per host thread and owned by whichever core is
//! executing on it; `resume` re-installs it from `FPSCR[RN]` on entry.

use crate::state::RoundMode;

bitflags::bitflags! {
    /// Host sticky exception flags, independent of the backing register
    /// layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FpExceptions: u32 {
        const INVALID = 1 << 0;
        const DIVBYZERO = 1 << 1;
        const OVERFLOW = 1 << 2;
        const UNDERFLOW = 1 << 3;
        const INEXACT = 1 << 4;
    }
}

pub fn round_mode() -> RoundMode {
    imp::round_mode()
}

pub fn set_round_mode(mode: RoundMode) {
    imp::set_round_mode(mode)
}

/// Which of `mask` are currently set.
pub fn test(mask: FpExceptions) -> FpExceptions {
    imp::test(mask)
}

pub fn clear(mask: FpExceptions) {
    imp::clear(mask)
}

/// Sets sticky flags without computing anything (flags are masked, so no
/// trap results).
pub fn raise(mask: FpExceptions) {
    imp::raise(mask)
}

#[cfg(target_arch = "x86_64")]
mod imp {
    use super::FpExceptions;
    use crate::state::RoundMode;

    // MXCSR: exception flags in bits 0..5, rounding control in bits 13..14.
    const MXCSR_IE: u32 = 1 << 0;
    const MXCSR_ZE: u32 = 1 << 2;
    const MXCSR_OE: u32 = 1 << 3;
    const MXCSR_UE: u32 = 1 << 4;
    const MXCSR_PE: u32 = 1 << 5;
    const MXCSR_RC_SHIFT: u32 = 13;

    fn to_hw(mask: FpExceptions) -> u32 {
        let mut hw = 0;
        if mask.contains(FpExceptions::INVALID) {
            hw |= MXCSR_IE;
        }
        if mask.contains(FpExceptions::DIVBYZERO) {
            hw |= MXCSR_ZE;
        }
        if mask.contains(FpExceptions::OVERFLOW) {
            hw |= MXCSR_OE;
        }
        if mask.contains(FpExceptions::UNDERFLOW) {
            hw |= MXCSR_UE;
        }
        if mask.contains(FpExceptions::INEXACT) {
            hw |= MXCSR_PE;
        }
        hw
    }

    fn from_hw(csr: u32) -> FpExceptions {
        let mut mask = FpExceptions::empty();
        if csr & MXCSR_IE != 0 {
            mask |= FpExceptions::INVALID;
        }
        if csr & MXCSR_ZE != 0 {
            mask |= FpExceptions::DIVBYZERO;
        }
        if csr & MXCSR_OE != 0 {
            mask |= FpExceptions::OVERFLOW;
        }
        if csr & MXCSR_UE != 0 {
            mask |= FpExceptions::UNDERFLOW;
        }
        if csr & MXCSR_PE != 0 {
            mask |= FpExceptions::INEXACT;
        }
        mask
    }

    fn getcsr() -> u32 {
        let mut csr: u32 = 0;
        // SAFETY: stmxcsr stores the SSE control/status register to the
        // pointed-to word; always available on x86_64.
        unsafe {
            core::arch::asm!("stmxcsr [{}]", in(reg) &mut csr, options(nostack, preserves_flags));
        }
        csr
    }

    fn setcsr(csr: u32) {
        // SAFETY: the exception mask bits are never cleared here, so this
        // cannot enable host FP traps.
        unsafe {
            core::arch::asm!("ldmxcsr [{}]", in(reg) &csr, options(nostack, readonly, preserves_flags));
        }
    }

    pub(super) fn round_mode() -> RoundMode {
        match (getcsr() >> MXCSR_RC_SHIFT) & 3 {
            0 => RoundMode::Nearest,
            1 => RoundMode::Negative,
            2 => RoundMode::Positive,
            _ => RoundMode::Zero,
        }
    }

    pub(super) fn set_round_mode(mode: RoundMode) {
        let rc = match mode {
            RoundMode::Nearest => 0,
            RoundMode::Negative => 1,
            RoundMode::Positive => 2,
            RoundMode::Zero => 3,
        };
        setcsr((getcsr() & !(3 << MXCSR_RC_SHIFT)) | (rc << MXCSR_RC_SHIFT));
    }

    pub(super) fn test(mask: FpExceptions) -> FpExceptions {
        from_hw(getcsr()) & mask
    }

    pub(super) fn clear(mask: FpExceptions) {
        setcsr(getcsr() & !to_hw(mask));
    }

    pub(super) fn raise(mask: FpExceptions) {
        setcsr(getcsr() | to_hw(mask));
    }
}

#[cfg(target_arch = "aarch64")]
mod imp {
    use super::FpExceptions;
    use crate::state::RoundMode;

    // FPSR cumulative flags: IOC/DZC/OFC/UFC/IXC in bits 0..4.
    const FPSR_IOC: u64 = 1 << 0;
    const FPSR_DZC: u64 = 1 << 1;
    const FPSR_OFC: u64 = 1 << 2;
    const FPSR_UFC: u64 = 1 << 3;
    const FPSR_IXC: u64 = 1 << 4;
    // FPCR rounding mode in bits 22..23: RN, RP, RM, RZ.
    const FPCR_RMODE_SHIFT: u64 = 22;

    fn to_hw(mask: FpExceptions) -> u64 {
        let mut hw = 0;
        if mask.contains(FpExceptions::INVALID) {
            hw |= FPSR_IOC;
        }
        if mask.contains(FpExceptions::DIVBYZERO) {
            hw |= FPSR_DZC;
        }
        if mask.contains(FpExceptions::OVERFLOW) {
            hw |= FPSR_OFC;
        }
        if mask.contains(FpExceptions::UNDERFLOW) {
            hw |= FPSR_UFC;
        }
        if mask.contains(FpExceptions::INEXACT) {
            hw |= FPSR_IXC;
        }
        hw
    }

    fn from_hw(fpsr: u64) -> FpExceptions {
        let mut mask = FpExceptions::empty();
        if fpsr & FPSR_IOC != 0 {
            mask |= FpExceptions::INVALID;
        }
        if fpsr & FPSR_DZC != 0 {
            mask |= FpExceptions::DIVBYZERO;
        }
        if fpsr & FPSR_OFC != 0 {
            mask |= FpExceptions::OVERFLOW;
        }
        if fpsr & FPSR_UFC != 0 {
            mask |= FpExceptions::UNDERFLOW;
        }
        if fpsr & FPSR_IXC != 0 {
            mask |= FpExceptions::INEXACT;
        }
        mask
    }

    fn read_fpsr() -> u64 {
        let v: u64;
        // SAFETY: FPSR is always readable at EL0.
        unsafe { core::arch::asm!("mrs {}, fpsr", out(reg) v, options(nomem, nostack)) };
        v
    }

    fn write_fpsr(v: u64) {
        // SAFETY: writing cumulative flag bits only.
        unsafe { core::arch::asm!("msr fpsr, {}", in(reg) v, options(nomem, nostack)) };
    }

    fn read_fpcr() -> u64 {
        let v: u64;
        // SAFETY: FPCR is always readable at EL0.
        unsafe { core::arch::asm!("mrs {}, fpcr", out(reg) v, options(nomem, nostack)) };
        v
    }

    fn write_fpcr(v: u64) {
        // SAFETY: only the RMode field changes; trap-enable bits stay zero.
        unsafe { core::arch::asm!("msr fpcr, {}", in(reg) v, options(nomem, nostack)) };
    }

    pub(super) fn round_mode() -> RoundMode {
        match (read_fpcr() >> FPCR_RMODE_SHIFT) & 3 {
            0 => RoundMode::Nearest,
            1 => RoundMode::Positive,
            2 => RoundMode::Negative,
            _ => RoundMode::Zero,
        }
    }

    pub(super) fn set_round_mode(mode: RoundMode) {
        let rmode = match mode {
            RoundMode::Nearest => 0,
            RoundMode::Positive => 1,
            RoundMode::Negative => 2,
            RoundMode::Zero => 3,
        };
        write_fpcr((read_fpcr() & !(3 << FPCR_RMODE_SHIFT)) | (rmode << FPCR_RMODE_SHIFT));
    }

    pub(super) fn test(mask: FpExceptions) -> FpExceptions {
        from_hw(read_fpsr()) & mask
    }

    pub(super) fn clear(mask: FpExceptions) {
        write_fpsr(read_fpsr() & !to_hw(mask));
    }

    pub(super) fn raise(mask: FpExceptions) {
        write_fpsr(read_fpsr() | to_hw(mask));
    }
}

// Soft fallback: tracks mode and explicit raises only. Host arithmetic on
// such targets does not feed sticky flags back, so FPSCR exception
// accounting is incomplete there.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
mod imp {
    use super::FpExceptions;
    use crate::state::RoundMode;
    use std::cell::Cell;

    thread_local! {
        static FLAGS: Cell<u32> = const { Cell::new(0) };
        static MODE: Cell<u32> = const { Cell::new(0) };
    }

    pub(super) fn round_mode() -> RoundMode {
        RoundMode::from_bits(MODE.with(|m| m.get()))
    }

    pub(super) fn set_round_mode(mode: RoundMode) {
        MODE.with(|m| m.set(mode as u32));
    }

    pub(super) fn test(mask: FpExceptions) -> FpExceptions {
        FpExceptions::from_bits_truncate(FLAGS.with(|f| f.get())) & mask
    }

    pub(super) fn clear(mask: FpExceptions) {
        FLAGS.with(|f| f.set(f.get() & !mask.bits()));
    }

    pub(super) fn raise(mask: FpExceptions) {
        FLAGS.with(|f| f.set(f.get() | mask.bits()));
    }
}
