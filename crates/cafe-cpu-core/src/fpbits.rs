//! Float bit-pattern helpers shared by the scalar and paired-single units.
//!
//! The interpreter frequently needs conversions the host FPU will not do
//! verbatim: widening a signaling NaN without quieting it, and the
//! hardware's truncating (not rounding) double-to-single bit rule.

pub(crate) const SIGN64: u64 = 1 << 63;
pub(crate) const EXP_MAX64: u32 = 0x7ff;
pub(crate) const MANTISSA_MASK64: u64 = (1 << 52) - 1;
pub(crate) const QUIET_BIT64: u64 = 1 << 51;

pub(crate) const EXP_MAX32: u32 = 0xff;
pub(crate) const QUIET_BIT32: u32 = 1 << 22;

#[inline]
pub(crate) fn exponent64(bits: u64) -> u32 {
    ((bits >> 52) & 0x7ff) as u32
}

#[inline]
pub(crate) fn mantissa64(bits: u64) -> u64 {
    bits & MANTISSA_MASK64
}

#[inline]
pub(crate) fn exponent32(bits: u32) -> u32 {
    (bits >> 23) & 0xff
}

#[inline]
pub(crate) fn mantissa32(bits: u32) -> u32 {
    bits & 0x007f_ffff
}

#[inline]
pub(crate) fn is_signalling_nan64(v: f64) -> bool {
    let bits = v.to_bits();
    exponent64(bits) == EXP_MAX64 && mantissa64(bits) != 0 && bits & QUIET_BIT64 == 0
}

#[inline]
pub(crate) fn is_signalling_nan32(v: f32) -> bool {
    let bits = v.to_bits();
    exponent32(bits) == EXP_MAX32 && mantissa32(bits) != 0 && bits & QUIET_BIT32 == 0
}

/// Quiet-NaN projection: set the top mantissa bit, keep the payload.
#[inline]
pub(crate) fn make_quiet64(v: f64) -> f64 {
    f64::from_bits(v.to_bits() | QUIET_BIT64)
}

#[inline]
pub(crate) fn make_quiet32(v: f32) -> f32 {
    f32::from_bits(v.to_bits() | QUIET_BIT32)
}

/// The generated (operand-free) quiet NaN.
#[inline]
pub(crate) fn make_nan64() -> f64 {
    f64::from_bits(0x7ff8_0000_0000_0000)
}

#[inline]
pub(crate) fn make_nan32() -> f32 {
    f32::from_bits(0x7fc0_0000)
}

#[inline]
pub(crate) fn is_negative_zero64(v: f64) -> bool {
    v.to_bits() == SIGN64
}

/// Widen a single to a double, keeping a signaling NaN signaling (the host
/// conversion would quiet it and raise INVALID).
#[inline]
pub(crate) fn extend_float(v: f32) -> f64 {
    if is_signalling_nan32(v) {
        extend_float_nan_bits(v.to_bits())
    } else {
        v as f64
    }
}

/// NaN bit pattern widened without going through the FPU.
#[inline]
pub(crate) fn extend_float_nan_bits(bits: u32) -> f64 {
    f64::from_bits(
        (((bits & 0x8000_0000) as u64) << 32)
            | ((EXP_MAX64 as u64) << 52)
            | ((mantissa32(bits) as u64) << 29),
    )
}

/// The hardware's store-float-single bit selection: sign, exponent MSB,
/// then bits 5..34 of the double (low exponent bits + top 23 mantissa
/// bits). Exact for every single-representable value; mantissa bits beyond
/// single precision are dropped, never rounded.
#[inline]
pub(crate) fn truncate_double_bits(bits: u64) -> u32 {
    (((bits >> 32) & 0xc000_0000) | ((bits >> 29) & 0x3fff_ffff)) as u32
}

/// Truncating double-to-single conversion (round toward zero in the last
/// place, NaN payloads preserved bit-for-bit).
#[inline]
pub(crate) fn truncate_double(v: f64) -> f32 {
    f32::from_bits(truncate_double_bits(v.to_bits()))
}

/// True when `v` is exactly the minimum normal magnitude for its type, in
/// which case the unrounded result may have been tiny and the underflow
/// replay in the arithmetic handlers is needed.
#[inline]
pub(crate) fn possible_underflow64(v: f64) -> bool {
    let bits = v.to_bits();
    exponent64(bits) == 1 && mantissa64(bits) == 0
}

#[inline]
pub(crate) fn possible_underflow32(v: f32) -> bool {
    let bits = v.to_bits();
    exponent32(bits) == 1 && mantissa32(bits) == 0
}
