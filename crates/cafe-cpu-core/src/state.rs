//! Architectural state of one emulated hardware thread.

use std::sync::atomic::AtomicBool;

macro_rules! reg_bit {
    ($(#[$meta:meta])* $get:ident, $set:ident, $bit:expr) => {
        $(#[$meta])*
        #[inline]
        pub fn $get(self) -> bool {
            (self.0 >> $bit) & 1 != 0
        }

        #[inline]
        pub fn $set(&mut self, v: bool) {
            self.0 = (self.0 & !(1 << $bit)) | ((v as u32) << $bit);
        }
    };
}

/// Condition register: eight 4-bit fields, `cr0` in the top nibble.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cr(pub u32);

/// Flags within one CR field. The same four bits read as N/P/Z/SO after
/// integer records, LT/GT/EQ/UN after compares, and FX/FEX/VX/OX in `cr1`
/// after floating records.
pub mod cr_flag {
    pub const NEGATIVE: u32 = 1 << 3;
    pub const POSITIVE: u32 = 1 << 2;
    pub const ZERO: u32 = 1 << 1;
    pub const SUMMARY_OVERFLOW: u32 = 1 << 0;

    pub const LESS_THAN: u32 = NEGATIVE;
    pub const GREATER_THAN: u32 = POSITIVE;
    pub const EQUAL: u32 = ZERO;
    pub const UNORDERED: u32 = SUMMARY_OVERFLOW;
}

impl Cr {
    /// Reads 4-bit field `crN`; field 0 is the most significant nibble.
    #[inline]
    pub fn field(self, n: u32) -> u32 {
        (self.0 >> ((7 - n) * 4)) & 0xf
    }

    #[inline]
    pub fn set_field(&mut self, n: u32, value: u32) {
        let shift = (7 - n) * 4;
        self.0 = (self.0 & !(0xf << shift)) | ((value & 0xf) << shift);
    }

    /// Reads CR bit `n` in PowerPC numbering (bit 0 is the MSB).
    #[inline]
    pub fn bit(self, n: u32) -> u32 {
        (self.0 >> (31 - n)) & 1
    }

    #[inline]
    pub fn set_bit(&mut self, n: u32, value: u32) {
        let shift = 31 - n;
        self.0 = (self.0 & !(1 << shift)) | ((value & 1) << shift);
    }
}

/// XER: carry, overflow, sticky-overflow and the string-op byte count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Xer(pub u32);

impl Xer {
    reg_bit!(ca, set_ca, 29);
    reg_bit!(ov, set_ov, 30);
    reg_bit!(so, set_so, 31);

    /// Byte count for lswx/stswx, bits 0..6.
    #[inline]
    pub fn byte_count(self) -> u32 {
        self.0 & 0x7f
    }

    /// The four bits mcrxr moves into a CR field (SO, OV, CA, reserved).
    #[inline]
    pub fn crxr(self) -> u32 {
        self.0 >> 28
    }

    #[inline]
    pub fn clear_crxr(&mut self) {
        self.0 &= 0x0fff_ffff;
    }
}

/// Architectural rounding mode held in `FPSCR[RN]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    Nearest = 0,
    Zero = 1,
    Positive = 2,
    Negative = 3,
}

impl RoundMode {
    #[inline]
    pub fn from_bits(bits: u32) -> RoundMode {
        match bits & 3 {
            0 => RoundMode::Nearest,
            1 => RoundMode::Zero,
            2 => RoundMode::Positive,
            _ => RoundMode::Negative,
        }
    }
}

/// FPRF classification bits.
pub mod fprf {
    pub const CLASS_DESCRIPTOR: u32 = 1 << 4;
    pub const NEGATIVE: u32 = 1 << 3;
    pub const POSITIVE: u32 = 1 << 2;
    pub const ZERO: u32 = 1 << 1;
    pub const NAN: u32 = 1 << 0;

    pub const LESS_THAN: u32 = NEGATIVE;
    pub const GREATER_THAN: u32 = POSITIVE;
    pub const EQUAL: u32 = ZERO;
    pub const UNORDERED: u32 = NAN;
}

/// Floating-point status and control register.
///
/// Sticky exception bits only ever OR in through the setters here; the
/// explicit-write instructions (`mtfsf`, `mtfsb0`, ...) operate on the raw
/// word instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fpscr(pub u32);

impl Fpscr {
    pub const FX: u32 = 1 << 31;
    pub const FEX: u32 = 1 << 30;
    pub const VX: u32 = 1 << 29;
    pub const OX: u32 = 1 << 28;
    pub const UX: u32 = 1 << 27;
    pub const ZX: u32 = 1 << 26;
    pub const XX: u32 = 1 << 25;
    pub const VXSNAN: u32 = 1 << 24;
    pub const VXISI: u32 = 1 << 23;
    pub const VXIDI: u32 = 1 << 22;
    pub const VXZDZ: u32 = 1 << 21;
    pub const VXIMZ: u32 = 1 << 20;
    pub const VXVC: u32 = 1 << 19;
    pub const VXSOFT: u32 = 1 << 10;
    pub const VXSQRT: u32 = 1 << 9;
    pub const VXCVI: u32 = 1 << 8;

    pub const ALL_VX: u32 = Self::VXSNAN
        | Self::VXISI
        | Self::VXIDI
        | Self::VXZDZ
        | Self::VXIMZ
        | Self::VXVC
        | Self::VXSOFT
        | Self::VXSQRT
        | Self::VXCVI;
    pub const ALL_EXCEPTIONS: u32 = Self::OX | Self::UX | Self::ZX | Self::XX | Self::ALL_VX;

    #[inline]
    pub fn rn(self) -> RoundMode {
        RoundMode::from_bits(self.0)
    }

    reg_bit!(ni, set_ni, 2);
    reg_bit!(xe, set_xe, 3);
    reg_bit!(ze, set_ze, 4);
    reg_bit!(ue, set_ue, 5);
    reg_bit!(oe, set_oe, 6);
    reg_bit!(ve, set_ve, 7);
    reg_bit!(vxcvi, set_vxcvi, 8);
    reg_bit!(vxsqrt, set_vxsqrt, 9);
    reg_bit!(vxsoft, set_vxsoft, 10);
    reg_bit!(fi, set_fi, 17);
    reg_bit!(fr, set_fr, 18);
    reg_bit!(vxvc, set_vxvc, 19);
    reg_bit!(vximz, set_vximz, 20);
    reg_bit!(vxzdz, set_vxzdz, 21);
    reg_bit!(vxidi, set_vxidi, 22);
    reg_bit!(vxisi, set_vxisi, 23);
    reg_bit!(vxsnan, set_vxsnan, 24);
    reg_bit!(xx, set_xx, 25);
    reg_bit!(zx, set_zx, 26);
    reg_bit!(ux, set_ux, 27);
    reg_bit!(ox, set_ox, 28);
    reg_bit!(vx, set_vx, 29);
    reg_bit!(fex, set_fex, 30);
    reg_bit!(fx, set_fx, 31);

    /// FPRF classification, bits 12..16.
    #[inline]
    pub fn fprf(self) -> u32 {
        (self.0 >> 12) & 0x1f
    }

    #[inline]
    pub fn set_fprf(&mut self, value: u32) {
        self.0 = (self.0 & !(0x1f << 12)) | ((value & 0x1f) << 12);
    }

    /// Condition code nibble set by the compare instructions (low four
    /// bits of FPRF).
    #[inline]
    pub fn set_fpcc(&mut self, value: u32) {
        self.0 = (self.0 & !(0xf << 12)) | ((value & 0xf) << 12);
    }

    /// High nibble (FX, FEX, VX, OX), copied to `cr1` on floating records.
    #[inline]
    pub fn cr1(self) -> u32 {
        self.0 >> 28
    }
}

/// Data formats a GQR can quantize to.
///
/// The reserved encodings 1..3 behave as `Floating`, which is what the
/// hardware documents for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizedType {
    Floating,
    Unsigned8,
    Unsigned16,
    Signed8,
    Signed16,
}

impl QuantizedType {
    #[inline]
    pub fn from_bits(bits: u32) -> QuantizedType {
        match bits & 7 {
            4 => QuantizedType::Unsigned8,
            5 => QuantizedType::Unsigned16,
            6 => QuantizedType::Signed8,
            7 => QuantizedType::Signed16,
            _ => QuantizedType::Floating,
        }
    }

    /// Byte stride between the two lanes of a paired access.
    #[inline]
    pub fn lane_size(self) -> u32 {
        match self {
            QuantizedType::Unsigned8 | QuantizedType::Signed8 => 1,
            QuantizedType::Unsigned16 | QuantizedType::Signed16 => 2,
            QuantizedType::Floating => 4,
        }
    }
}

/// Graphics quantization register: independent load and store type/scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gqr(pub u32);

impl Gqr {
    #[inline]
    pub fn st_type(self) -> QuantizedType {
        QuantizedType::from_bits(self.0)
    }

    /// Store scale exponent, 6 bits, sign-extended by the consumer.
    #[inline]
    pub fn st_scale(self) -> u32 {
        (self.0 >> 8) & 0x3f
    }

    #[inline]
    pub fn ld_type(self) -> QuantizedType {
        QuantizedType::from_bits(self.0 >> 16)
    }

    #[inline]
    pub fn ld_scale(self) -> u32 {
        (self.0 >> 24) & 0x3f
    }
}

/// One floating-point register.
///
/// The register file keeps lane 0 (`value`, the double-precision slot,
/// which paired-single instructions address as `paired0`) and lane 1
/// (`paired1`). The integer views `idw`/`iw0`/`iw1` alias lane 0's 64
/// bits; `idw_paired1` aliases lane 1. Accessors are the only way in or
/// out. `set_value` leaves lane 1 alone, so a scalar double load does not
/// define lane 1 (the hardware pipeline hazard this mirrors is not
/// modeled further).
#[derive(Debug, Clone, Copy, Default)]
pub struct Fpr {
    ps0: f64,
    ps1: f64,
}

impl Fpr {
    /// Scalar double view of lane 0.
    #[inline]
    pub fn value(self) -> f64 {
        self.ps0
    }

    #[inline]
    pub fn set_value(&mut self, v: f64) {
        self.ps0 = v;
    }

    /// Lane 0 of the paired view; the same cell as `value`.
    #[inline]
    pub fn paired0(self) -> f64 {
        self.ps0
    }

    #[inline]
    pub fn set_paired0(&mut self, v: f64) {
        self.ps0 = v;
    }

    /// Lane 1 of the paired view.
    #[inline]
    pub fn paired1(self) -> f64 {
        self.ps1
    }

    #[inline]
    pub fn set_paired1(&mut self, v: f64) {
        self.ps1 = v;
    }

    /// 64-bit integer view of lane 0. Bit-exact operations (fmr, fneg,
    /// fabs, fnabs) go through this view only.
    #[inline]
    pub fn idw(self) -> u64 {
        self.ps0.to_bits()
    }

    #[inline]
    pub fn set_idw(&mut self, bits: u64) {
        self.ps0 = f64::from_bits(bits);
    }

    /// 64-bit integer view of lane 1.
    #[inline]
    pub fn idw_paired1(self) -> u64 {
        self.ps1.to_bits()
    }

    #[inline]
    pub fn set_idw_paired1(&mut self, bits: u64) {
        self.ps1 = f64::from_bits(bits);
    }

    /// High 32 bits of lane 0.
    #[inline]
    pub fn iw0(self) -> u32 {
        (self.idw() >> 32) as u32
    }

    #[inline]
    pub fn set_iw0(&mut self, bits: u32) {
        self.set_idw((self.idw() & 0x0000_0000_ffff_ffff) | ((bits as u64) << 32));
    }

    /// Low 32 bits of lane 0.
    #[inline]
    pub fn iw1(self) -> u32 {
        self.idw() as u32
    }

    #[inline]
    pub fn set_iw1(&mut self, bits: u32) {
        self.set_idw((self.idw() & 0xffff_ffff_0000_0000) | bits as u64);
    }
}

/// One emulated hardware thread's registers plus its reservation and
/// interrupt state.
#[derive(Debug, Default)]
pub struct Core {
    /// Current instruction address; handlers must not change it.
    pub cia: u32,
    /// Next instruction address.
    pub nia: u32,

    pub gpr: [u32; 32],
    pub fpr: [Fpr; 32],
    pub cr: Cr,
    pub xer: Xer,
    pub lr: u32,
    pub ctr: u32,

    pub fpscr: Fpscr,

    // Storage-only system registers; no behavior is keyed on them.
    pub pvr: u32,
    pub msr: u32,
    pub sr: [u32; 16],

    /// Time base halves, refreshed from the process clock by `mftb`.
    pub tbu: u32,
    pub tbl: u32,

    pub gqr: [Gqr; 8],

    /// lwarx/stwcx. reservation.
    pub reserve: bool,
    pub reserve_address: u32,
    pub reserve_data: u32,

    /// Set by an external producer; observed between steps with relaxed
    /// ordering.
    pub interrupt: AtomicBool,
}

impl Core {
    pub fn new() -> Core {
        Core::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cr_field_order() {
        let mut cr = Cr(0);
        cr.set_field(0, 0x8);
        assert_eq!(cr.0, 0x8000_0000);
        cr.set_field(7, 0x3);
        assert_eq!(cr.0, 0x8000_0003);
        assert_eq!(cr.field(0), 0x8);
        assert_eq!(cr.field(7), 0x3);

        cr.set_bit(0, 0);
        assert_eq!(cr.field(0), 0x0);
        cr.set_bit(3, 1);
        assert_eq!(cr.field(0), cr_flag::SUMMARY_OVERFLOW);
        assert_eq!(cr.bit(3), 1);
    }

    #[test]
    fn fpscr_fields() {
        let mut fpscr = Fpscr(0);
        fpscr.set_vxsnan(true);
        assert_eq!(fpscr.0, Fpscr::VXSNAN);
        fpscr.set_fprf(0x11);
        assert_eq!(fpscr.fprf(), 0x11);
        fpscr.0 |= 3; // round toward negative infinity
        assert_eq!(fpscr.rn(), RoundMode::Negative);

        fpscr.0 = Fpscr::FX | Fpscr::FEX | Fpscr::VX | Fpscr::OX;
        assert_eq!(fpscr.cr1(), 0xf);
    }

    #[test]
    fn gqr_fields() {
        // ld_type = s16, ld_scale = 4, st_type = u8, st_scale = 62 (-2).
        let gqr = Gqr((7 << 16) | (4 << 24) | 4 | (62 << 8));
        assert_eq!(gqr.ld_type(), QuantizedType::Signed16);
        assert_eq!(gqr.ld_scale(), 4);
        assert_eq!(gqr.st_type(), QuantizedType::Unsigned8);
        assert_eq!(gqr.st_scale(), 62);
        assert_eq!(gqr.ld_type().lane_size(), 2);
    }

    #[test]
    fn fpr_views_alias_lane0() {
        let mut fpr = Fpr::default();
        fpr.set_value(1.5);
        assert_eq!(fpr.idw(), 0x3ff8_0000_0000_0000);
        assert_eq!(fpr.iw0(), 0x3ff8_0000);
        assert_eq!(fpr.iw1(), 0);

        fpr.set_iw1(0xdead_beef);
        assert_eq!(fpr.idw(), 0x3ff8_0000_dead_beef);
        assert_eq!(fpr.paired0().to_bits(), fpr.idw());

        // Lane 1 is independent storage.
        fpr.set_paired1(2.0);
        assert_eq!(fpr.iw0(), 0x3ff8_0000);
        assert_eq!(fpr.idw_paired1(), 0x4000_0000_0000_0000);
    }
}
