//! Register widths and two's-complement encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// Widest register a program may configure.
pub const MAX_BIT_WIDTH: u32 = 32;

/// Narrowest width an integer variable may use. Width 1 is reserved for
/// predicates, so a one-bit register is never mistaken for an integer.
pub const MIN_INTEGER_BIT_WIDTH: u32 = 2;

/// Width of a register in bits.
///
/// Integer registers hold `n`-bit two's-complement values in the range
/// `[-2^(n-1), 2^(n-1) - 1]`. Booleans use [`BitWidth::BOOL`].
///
/// # Example
///
/// ```
/// use qreg_ir::BitWidth;
///
/// let w = BitWidth::new(4).unwrap();
/// assert_eq!(w.min_value(), -8);
/// assert_eq!(w.max_value(), 7);
/// assert_eq!(w.encode(-2), 0b1110);
/// assert_eq!(w.decode(0b1110), -2);
/// assert_eq!(w.wrap(9), -7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BitWidth(u32);

impl BitWidth {
    /// Width of a boolean (predicate or control) register.
    pub const BOOL: BitWidth = BitWidth(1);

    /// Create a validated width.
    pub fn new(bits: u32) -> IrResult<Self> {
        if bits == 0 || bits > MAX_BIT_WIDTH {
            return Err(IrError::InvalidBitWidth(bits));
        }
        Ok(BitWidth(bits))
    }

    /// Number of bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether this is a single-bit register.
    #[inline]
    pub const fn is_bool(self) -> bool {
        self.0 == 1
    }

    /// Whether integer variables may use this width.
    #[inline]
    pub const fn is_integer_width(self) -> bool {
        self.0 >= MIN_INTEGER_BIT_WIDTH
    }

    /// Smallest representable signed value.
    pub fn min_value(self) -> i64 {
        -(1i64 << (self.0 - 1))
    }

    /// Largest representable signed value.
    pub fn max_value(self) -> i64 {
        (1i64 << (self.0 - 1)) - 1
    }

    /// `2^n - 1`.
    pub fn mask(self) -> u64 {
        (1u64 << self.0) - 1
    }

    /// Whether `value` is representable without wraparound.
    pub fn contains(self, value: i64) -> bool {
        (self.min_value()..=self.max_value()).contains(&value)
    }

    /// Return `value` unchanged if it fits, or `ValueOutOfRange`.
    pub fn check(self, value: i64) -> IrResult<i64> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(IrError::ValueOutOfRange {
                value,
                bit_width: self.0,
            })
        }
    }

    /// Two's-complement bit pattern of `value` (negative `v` becomes `2^n + v`).
    pub fn encode(self, value: i64) -> u64 {
        (value as u64) & self.mask()
    }

    /// Signed value of an `n`-bit pattern.
    pub fn decode(self, bits: u64) -> i64 {
        let bits = bits & self.mask();
        if (bits >> (self.0 - 1)) & 1 == 1 {
            bits as i64 - (1i64 << self.0)
        } else {
            bits as i64
        }
    }

    /// Reduce `value` modulo `2^n` and reinterpret as signed.
    pub fn wrap(self, value: i64) -> i64 {
        self.decode(self.encode(value))
    }
}

impl Default for BitWidth {
    fn default() -> Self {
        BitWidth(8)
    }
}

impl fmt::Display for BitWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

impl TryFrom<u32> for BitWidth {
    type Error = IrError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        BitWidth::new(bits)
    }
}

impl From<BitWidth> for u32 {
    fn from(width: BitWidth) -> Self {
        width.0
    }
}
