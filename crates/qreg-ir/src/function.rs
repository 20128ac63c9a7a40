//! Register-versioned function bodies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::operation::{OpKind, Operation};
use crate::register::{RegisterId, Value};
use crate::width::BitWidth;

/// A straight-line, register-versioned function body.
///
/// Instruction order is program order. Passes never mutate a function in
/// place; they build a new instruction list and swap it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumFunction {
    name: String,
    bit_width: BitWidth,
    ops: Vec<Operation>,
}

impl QuantumFunction {
    /// Create an empty function.
    pub fn new(name: impl Into<String>, bit_width: BitWidth) -> Self {
        Self {
            name: name.into(),
            bit_width,
            ops: Vec::new(),
        }
    }

    /// Create a function from an existing instruction list.
    pub fn from_ops(name: impl Into<String>, bit_width: BitWidth, ops: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            bit_width,
            ops,
        }
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Integer register width.
    pub fn bit_width(&self) -> BitWidth {
        self.bit_width
    }

    /// Instructions in program order.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append an instruction.
    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    /// Replace the instruction list, returning the previous one.
    pub fn replace_ops(&mut self, ops: Vec<Operation>) -> Vec<Operation> {
        std::mem::replace(&mut self.ops, ops)
    }

    /// Consume the function, returning its instructions.
    pub fn into_ops(self) -> Vec<Operation> {
        self.ops
    }

    /// The value returned by the first `Return`, if any.
    pub fn returned_value(&self) -> Option<Value> {
        self.ops.iter().find_map(|op| match op.kind() {
            OpKind::Return { value } => *value,
            _ => None,
        })
    }

    /// Number of distinct registers written.
    pub fn num_registers(&self) -> usize {
        let mut seen = rustc_hash::FxHashSet::default();
        for op in &self.ops {
            if let Some(result) = op.result() {
                seen.insert(result.register());
            }
        }
        seen.len()
    }

    /// One past the largest register id in use.
    pub fn next_register_id(&self) -> RegisterId {
        let max = self
            .ops
            .iter()
            .flat_map(|op| op.operands().into_iter().chain(op.result()))
            .map(|v| v.register().0 + 1)
            .max()
            .unwrap_or(0);
        RegisterId(max)
    }
}

impl fmt::Display for QuantumFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "func @{}({}) {{", self.name, self.bit_width)?;
        for op in &self.ops {
            writeln!(f, "  {op}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::BinaryOpcode;
    use crate::register::Slot;

    #[test]
    fn test_registers_and_return() {
        let w = BitWidth::new(4).unwrap();
        let a = Value::new(Slot::new(RegisterId(0), 0), w);
        let b = Value::new(Slot::new(RegisterId(1), 0), w);
        let mut func = QuantumFunction::new("f", w);
        func.push(Operation::init(a, 3).unwrap());
        func.push(Operation::init(b, -2).unwrap());
        func.push(Operation::binary(BinaryOpcode::Add, a.next_version(), a, b, None).unwrap());
        func.push(Operation::ret(Some(a.next_version())));

        assert_eq!(func.len(), 4);
        assert_eq!(func.num_registers(), 2);
        assert_eq!(func.next_register_id(), RegisterId(2));
        assert_eq!(func.returned_value(), Some(a.next_version()));
        assert!(func.to_string().starts_with("func @f(i4) {"));
    }
}
