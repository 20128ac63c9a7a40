//! Control stack for predicated branch arms.

use std::rc::Rc;

use qreg_ir::{Expr, Value};

/// A predicate together with its defining expression.
#[derive(Debug, Clone)]
pub struct Predicated {
    /// The boolean register holding the predicate.
    pub value: Value,
    /// How it was computed.
    pub expr: Rc<Expr>,
}

/// Nested branch conditions.
///
/// Each frame stores the running conjunction of every condition up to and
/// including its own, so the active control is available without emitting
/// anything when it is read.
#[derive(Debug, Default)]
pub struct ControlStack {
    frames: Vec<Predicated>,
}

impl ControlStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no arm is active.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The conjunction of all active conditions.
    pub fn current(&self) -> Option<&Predicated> {
        self.frames.last()
    }

    /// Push an already-folded conjunction.
    pub fn push(&mut self, conjunction: Predicated) {
        self.frames.push(conjunction);
    }

    /// Leave the innermost arm.
    pub fn pop(&mut self) -> Option<Predicated> {
        self.frames.pop()
    }
}
