//! Two's-complement conversion between integers and bit vectors.
//!
//! Bit vectors are little-endian: index 0 is the least significant bit.

use qreg_ir::BitWidth;

use crate::error::ArithResult;

/// Bits of `value` in `width`-bit two's complement.
///
/// Returns `ValueOutOfRange` if `value` does not fit.
///
/// # Example
///
/// ```
/// use qreg_arith::encode_twos_complement;
/// use qreg_ir::BitWidth;
///
/// let bits = encode_twos_complement(-2, BitWidth::new(4).unwrap()).unwrap();
/// assert_eq!(bits, vec![false, true, true, true]);
/// ```
pub fn encode_twos_complement(value: i64, width: BitWidth) -> ArithResult<Vec<bool>> {
    let pattern = width.encode(width.check(value)?);
    Ok((0..width.bits()).map(|i| (pattern >> i) & 1 == 1).collect())
}

/// Signed value of a little-endian two's-complement bit vector.
///
/// The last bit is the sign. An empty slice decodes to 0.
///
/// # Example
///
/// ```
/// use qreg_arith::decode_twos_complement;
///
/// assert_eq!(decode_twos_complement(&[true, false, false, true]), -7);
/// assert_eq!(decode_twos_complement(&[true, true, false]), 3);
/// ```
pub fn decode_twos_complement(bits: &[bool]) -> i64 {
    let magnitude = decode_unsigned(bits);
    match bits.last() {
        Some(true) if bits.len() < 64 => magnitude as i64 - (1i64 << bits.len()),
        _ => magnitude as i64,
    }
}

/// Unsigned value of a little-endian bit vector (bits beyond 64 are ignored).
pub fn decode_unsigned(bits: &[bool]) -> u64 {
    bits.iter()
        .take(64)
        .enumerate()
        .filter(|(_, b)| **b)
        .fold(0u64, |acc, (i, _)| acc | (1u64 << i))
}
