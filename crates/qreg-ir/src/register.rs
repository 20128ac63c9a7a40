//! Register identifiers, versioned slots and values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::width::BitWidth;

/// Identifier of a logical register within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegisterId(pub u32);

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<u32> for RegisterId {
    fn from(id: u32) -> Self {
        RegisterId(id)
    }
}

/// One version of a register: its contents at one point in program order.
///
/// Each slot is produced by exactly one operation. Write-in-place updates
/// produce `version + 1` of the same register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    /// The register this slot belongs to.
    pub register: RegisterId,
    /// Version counter, starting at 0 for the producing `Init`.
    pub version: u32,
}

impl Slot {
    /// Create a slot.
    pub const fn new(register: RegisterId, version: u32) -> Self {
        Self { register, version }
    }

    /// The slot a write-in-place update of this slot produces.
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            register: self.register,
            version: self.version + 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.v{}", self.register, self.version)
    }
}

/// A value flowing between operations.
///
/// `path` numbers simultaneous readings of the same slot for tracing. It
/// carries no ownership meaning and is ignored by every constraint check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    /// The owning register version.
    pub slot: Slot,
    /// Reading index of this slot.
    pub path: u32,
    /// Register width.
    pub width: BitWidth,
}

impl Value {
    /// Create a value at path 0.
    pub const fn new(slot: Slot, width: BitWidth) -> Self {
        Self {
            slot,
            path: 0,
            width,
        }
    }

    /// Same value tagged with a different reading path.
    #[must_use]
    pub const fn with_path(self, path: u32) -> Self {
        Self { path, ..self }
    }

    /// The owning register.
    #[inline]
    pub const fn register(&self) -> RegisterId {
        self.slot.register
    }

    /// The owning version.
    #[inline]
    pub const fn version(&self) -> u32 {
        self.slot.version
    }

    /// The value produced by a write-in-place update of this one.
    #[must_use]
    pub const fn next_version(&self) -> Self {
        Self {
            slot: self.slot.next(),
            path: 0,
            width: self.width,
        }
    }

    /// Whether two values name the same register version.
    pub fn same_slot(&self, other: &Value) -> bool {
        self.slot == other.slot
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path == 0 {
            write!(f, "%{}:{}", self.slot, self.width)
        } else {
            write!(f, "%{}.p{}:{}", self.slot, self.path, self.width)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_next() {
        let s = Slot::new(RegisterId(3), 1);
        assert_eq!(s.next(), Slot::new(RegisterId(3), 2));
        assert_eq!(s.to_string(), "r3.v1");
    }

    #[test]
    fn test_path_ignored_by_same_slot() {
        let w = BitWidth::new(4).unwrap();
        let a = Value::new(Slot::new(RegisterId(0), 0), w);
        let b = a.with_path(2);
        assert!(a.same_slot(&b));
        assert_ne!(a, b);
        assert_eq!(b.to_string(), "%r0.v0.p2:i4");
    }
}
