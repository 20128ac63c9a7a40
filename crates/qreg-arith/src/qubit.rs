//! Qubits, classical bits and the registers grouping them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Unique identifier for a qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Unique identifier for a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// A named group of qubits holding one little-endian integer.
///
/// Bit 0 is the least significant bit. A register is a view: slicing it or
/// cloning it never allocates qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumRegister {
    /// Register name, for display.
    pub name: String,
    /// Qubits from least to most significant.
    pub qubits: Vec<QubitId>,
}

impl QuantumRegister {
    /// Create a register over existing qubits.
    pub fn new(name: impl Into<String>, qubits: Vec<QubitId>) -> Self {
        Self {
            name: name.into(),
            qubits,
        }
    }

    /// Number of qubits.
    pub fn width(&self) -> usize {
        self.qubits.len()
    }

    /// Qubit holding bit `index`.
    pub fn bit(&self, index: usize) -> Option<QubitId> {
        self.qubits.get(index).copied()
    }

    /// The sign (most significant) qubit.
    pub fn msb(&self) -> Option<QubitId> {
        self.qubits.last().copied()
    }

    /// A view of bits `range`, named after this register.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            name: format!("{}[{}..{}]", self.name, range.start, range.end),
            qubits: self.qubits[range].to_vec(),
        }
    }

    /// Iterate over the qubits from least significant.
    pub fn iter(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.qubits.iter().copied()
    }
}

impl fmt::Display for QuantumRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.qubits.len())
    }
}

/// Classical bits receiving the measurement of a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegister {
    /// Register name, for display.
    pub name: String,
    /// Bits from least to most significant.
    pub clbits: Vec<ClbitId>,
}

impl ClassicalRegister {
    /// Number of bits.
    pub fn width(&self) -> usize {
        self.clbits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_views() {
        let reg = QuantumRegister::new("a", (0..4).map(QubitId).collect());
        assert_eq!(reg.width(), 4);
        assert_eq!(reg.msb(), Some(QubitId(3)));
        assert_eq!(reg.bit(4), None);

        let low = reg.slice(0..2);
        assert_eq!(low.qubits, vec![QubitId(0), QubitId(1)]);
        assert_eq!(low.to_string(), "a[0..2][2]");
    }
}
