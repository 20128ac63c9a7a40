//! Register-versioned operations.
//!
//! Operations form a closed set. Every constructor checks the structural
//! rules an operation can check on its own (write-in-place, operand widths,
//! fresh result registers) and returns [`IrError::StructuralViolation`]
//! instead of building inconsistent IR.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::register::Value;
use crate::width::BitWidth;

/// Arithmetic opcodes with a register realisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOpcode {
    /// Addition modulo `2^n`.
    Add,
    /// Subtraction modulo `2^n`.
    Sub,
    /// Multiplication truncated to `n` bits.
    Mul,
    /// Signed division truncating toward zero.
    Div,
}

impl BinaryOpcode {
    /// Mnemonic of the register form.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOpcode::Add => "add",
            BinaryOpcode::Sub => "sub",
            BinaryOpcode::Mul => "mul",
            BinaryOpcode::Div => "div",
        }
    }

    /// Mnemonic of the immediate form.
    pub fn imm_name(self) -> &'static str {
        match self {
            BinaryOpcode::Add => "addi",
            BinaryOpcode::Sub => "subi",
            BinaryOpcode::Mul => "muli",
            BinaryOpcode::Div => "divi",
        }
    }

    /// Classical result of `lhs op rhs` at `width`, or `None` on division by zero.
    pub fn evaluate(self, lhs: i64, rhs: i64, width: BitWidth) -> Option<i64> {
        let raw = match self {
            BinaryOpcode::Add => lhs.wrapping_add(rhs),
            BinaryOpcode::Sub => lhs.wrapping_sub(rhs),
            BinaryOpcode::Mul => lhs.wrapping_mul(rhs),
            BinaryOpcode::Div => lhs.checked_div(rhs)?,
        };
        Some(width.wrap(raw))
    }
}

/// Comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// `a == b`
    Eq,
    /// `a != b`
    Ne,
    /// `a < b`
    Lt,
    /// `a <= b`
    Le,
    /// `a > b`
    Gt,
    /// `a >= b`
    Ge,
}

impl Predicate {
    /// Mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            Predicate::Eq => "eq",
            Predicate::Ne => "ne",
            Predicate::Lt => "lt",
            Predicate::Le => "le",
            Predicate::Gt => "gt",
            Predicate::Ge => "ge",
        }
    }

    /// The predicate that holds exactly when this one does not.
    #[must_use]
    pub fn negated(self) -> Self {
        match self {
            Predicate::Eq => Predicate::Ne,
            Predicate::Ne => Predicate::Eq,
            Predicate::Lt => Predicate::Ge,
            Predicate::Le => Predicate::Gt,
            Predicate::Gt => Predicate::Le,
            Predicate::Ge => Predicate::Lt,
        }
    }

    /// Classical result on signed operands.
    pub fn evaluate(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Predicate::Eq => lhs == rhs,
            Predicate::Ne => lhs != rhs,
            Predicate::Lt => lhs < rhs,
            Predicate::Le => lhs <= rhs,
            Predicate::Gt => lhs > rhs,
            Predicate::Ge => lhs >= rhs,
        }
    }
}

/// The operation variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpKind {
    /// Load a literal into a fresh register.
    Init {
        /// The literal.
        value: i64,
    },
    /// Copy a value into a fresh register.
    Duplicate {
        /// The value being copied.
        source: Value,
    },
    /// `lhs := lhs op rhs`, predicated on `control` when present.
    Binary {
        /// Opcode.
        op: BinaryOpcode,
        /// Overwritten operand.
        lhs: Value,
        /// Read-only operand.
        rhs: Value,
        /// Optional boolean predicate.
        control: Option<Value>,
    },
    /// `lhs := lhs op imm`, predicated on `control` when present.
    BinaryImm {
        /// Opcode.
        op: BinaryOpcode,
        /// Overwritten operand.
        lhs: Value,
        /// Classical immediate.
        imm: i64,
        /// Optional boolean predicate.
        control: Option<Value>,
    },
    /// Boolean comparison into a fresh register.
    Compare {
        /// Predicate.
        predicate: Predicate,
        /// Left operand.
        lhs: Value,
        /// Right operand.
        rhs: Value,
    },
    /// Conjunction of two control booleans.
    And {
        /// Left operand.
        lhs: Value,
        /// Right operand.
        rhs: Value,
    },
    /// Negation of a control boolean.
    Not {
        /// Operand.
        operand: Value,
    },
    /// Function result.
    Return {
        /// Returned value, if any.
        value: Option<Value>,
    },
}

/// An operation together with the value it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    kind: OpKind,
    result: Option<Value>,
}

impl Operation {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// `result = init value`.
    pub fn init(result: Value, value: i64) -> IrResult<Self> {
        Self::checked(OpKind::Init { value }, Some(result))
    }

    /// `result = dup source`.
    pub fn duplicate(result: Value, source: Value) -> IrResult<Self> {
        Self::checked(OpKind::Duplicate { source }, Some(result))
    }

    /// `result = lhs op rhs [if control]`, overwriting `lhs`.
    pub fn binary(
        op: BinaryOpcode,
        result: Value,
        lhs: Value,
        rhs: Value,
        control: Option<Value>,
    ) -> IrResult<Self> {
        Self::checked(
            OpKind::Binary {
                op,
                lhs,
                rhs,
                control,
            },
            Some(result),
        )
    }

    /// `result = lhs op imm [if control]`, overwriting `lhs`.
    pub fn binary_imm(
        op: BinaryOpcode,
        result: Value,
        lhs: Value,
        imm: i64,
        control: Option<Value>,
    ) -> IrResult<Self> {
        Self::checked(
            OpKind::BinaryImm {
                op,
                lhs,
                imm,
                control,
            },
            Some(result),
        )
    }

    /// `result = cmp.predicate lhs, rhs`.
    pub fn compare(predicate: Predicate, result: Value, lhs: Value, rhs: Value) -> IrResult<Self> {
        Self::checked(
            OpKind::Compare {
                predicate,
                lhs,
                rhs,
            },
            Some(result),
        )
    }

    /// `result = and lhs, rhs`.
    pub fn and(result: Value, lhs: Value, rhs: Value) -> IrResult<Self> {
        Self::checked(OpKind::And { lhs, rhs }, Some(result))
    }

    /// `result = not operand`.
    pub fn not(result: Value, operand: Value) -> IrResult<Self> {
        Self::checked(OpKind::Not { operand }, Some(result))
    }

    /// `return value`.
    pub fn ret(value: Option<Value>) -> Self {
        Self {
            kind: OpKind::Return { value },
            result: None,
        }
    }

    fn checked(kind: OpKind, result: Option<Value>) -> IrResult<Self> {
        let op = Self { kind, result };
        op.validate()?;
        Ok(op)
    }

    // =========================================================================
    // Structural checks
    // =========================================================================

    /// Re-check every rule an operation can verify on its own.
    ///
    /// Constructors call this; it is public so deserialized IR can be
    /// re-validated.
    pub fn validate(&self) -> IrResult<()> {
        let name = self.name();
        let result = match (&self.kind, &self.result) {
            (OpKind::Return { .. }, None) => return Ok(()),
            (OpKind::Return { .. }, Some(_)) => {
                return Err(IrError::structural(&name, "return produces no value"));
            }
            (_, None) => return Err(IrError::structural(&name, "missing result value")),
            (_, Some(result)) => result,
        };
        match &self.kind {
            OpKind::Init { value } => {
                fresh(&name, result)?;
                result.width.check(*value)?;
                Ok(())
            }
            OpKind::Duplicate { source } => {
                fresh(&name, result)?;
                same_width(&name, result.width, source.width)
            }
            OpKind::Binary {
                lhs, rhs, control, ..
            } => {
                in_place(&name, result, lhs)?;
                same_width(&name, lhs.width, rhs.width)?;
                boolean_control(&name, *control)
            }
            OpKind::BinaryImm { lhs, control, .. } => {
                in_place(&name, result, lhs)?;
                boolean_control(&name, *control)
            }
            OpKind::Compare { lhs, rhs, .. } => {
                fresh(&name, result)?;
                same_width(&name, BitWidth::BOOL, result.width)?;
                same_width(&name, lhs.width, rhs.width)
            }
            OpKind::And { lhs, rhs } => {
                fresh(&name, result)?;
                for v in [result, lhs, rhs] {
                    same_width(&name, BitWidth::BOOL, v.width)?;
                }
                Ok(())
            }
            OpKind::Not { operand } => {
                fresh(&name, result)?;
                same_width(&name, BitWidth::BOOL, result.width)?;
                same_width(&name, BitWidth::BOOL, operand.width)
            }
            OpKind::Return { .. } => Ok(()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The operation variant.
    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    /// The produced value (`None` only for `Return`).
    pub fn result(&self) -> Option<Value> {
        self.result
    }

    /// Mnemonic used in logs and errors.
    pub fn name(&self) -> String {
        match &self.kind {
            OpKind::Init { .. } => "init".into(),
            OpKind::Duplicate { .. } => "dup".into(),
            OpKind::Binary { op, control, .. } => with_control(op.name(), control.is_some()),
            OpKind::BinaryImm { op, control, .. } => {
                with_control(op.imm_name(), control.is_some())
            }
            OpKind::Compare { predicate, .. } => format!("cmp.{}", predicate.name()),
            OpKind::And { .. } => "and".into(),
            OpKind::Not { .. } => "not".into(),
            OpKind::Return { .. } => "return".into(),
        }
    }

    /// Operands subject to the no-cloning rule.
    pub fn principal_operands(&self) -> Vec<Value> {
        match &self.kind {
            OpKind::Init { .. } | OpKind::Return { value: None } => vec![],
            OpKind::Duplicate { source } => vec![*source],
            OpKind::Binary { lhs, rhs, .. }
            | OpKind::Compare { lhs, rhs, .. }
            | OpKind::And { lhs, rhs } => vec![*lhs, *rhs],
            OpKind::BinaryImm { lhs, .. } => vec![*lhs],
            OpKind::Not { operand } => vec![*operand],
            OpKind::Return { value: Some(v) } => vec![*v],
        }
    }

    /// The predicate operand, if this is a controlled operation.
    pub fn control(&self) -> Option<Value> {
        match &self.kind {
            OpKind::Binary { control, .. } | OpKind::BinaryImm { control, .. } => *control,
            _ => None,
        }
    }

    /// Every value this operation reads, principal operands first.
    pub fn operands(&self) -> Vec<Value> {
        let mut operands = self.principal_operands();
        operands.extend(self.control());
        operands
    }

    /// The operand whose register this operation overwrites.
    pub fn in_place_operand(&self) -> Option<Value> {
        match &self.kind {
            OpKind::Binary { lhs, .. } | OpKind::BinaryImm { lhs, .. } => Some(*lhs),
            _ => None,
        }
    }

    /// Whether this operation updates its left operand's register.
    pub fn is_write_in_place(&self) -> bool {
        self.in_place_operand().is_some()
    }

    /// Whether this operation is `Return`.
    pub fn is_return(&self) -> bool {
        matches!(self.kind, OpKind::Return { .. })
    }
}

fn with_control(name: &str, controlled: bool) -> String {
    if controlled {
        format!("c{name}")
    } else {
        name.to_string()
    }
}

fn fresh(name: &str, result: &Value) -> IrResult<()> {
    if result.version() != 0 {
        return Err(IrError::structural(
            name,
            format!("result {} must open a fresh register at version 0", result.slot),
        ));
    }
    Ok(())
}

fn in_place(name: &str, result: &Value, lhs: &Value) -> IrResult<()> {
    if result.register() != lhs.register() {
        return Err(IrError::structural(
            name,
            format!(
                "result register {} differs from lhs register {}",
                result.register(),
                lhs.register()
            ),
        ));
    }
    if result.version() != lhs.version() + 1 {
        return Err(IrError::structural(
            name,
            format!(
                "result version {} does not follow lhs version {}",
                result.version(),
                lhs.version()
            ),
        ));
    }
    same_width(name, lhs.width, result.width)
}

fn same_width(name: &str, expected: BitWidth, got: BitWidth) -> IrResult<()> {
    if expected != got {
        return Err(IrError::WidthMismatch {
            expected: expected.bits(),
            got: got.bits(),
            op_name: Some(name.to_string()),
        });
    }
    Ok(())
}

fn boolean_control(name: &str, control: Option<Value>) -> IrResult<()> {
    match control {
        Some(c) => same_width(name, BitWidth::BOOL, c.width),
        None => Ok(()),
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = &self.result {
            write!(f, "{result} = ")?;
        }
        write!(f, "{}", self.name())?;
        match &self.kind {
            OpKind::Init { value } => write!(f, " {value}")?,
            OpKind::BinaryImm { lhs, imm, .. } => write!(f, " {lhs}, {imm}")?,
            _ => {
                let operands: Vec<String> = self
                    .principal_operands()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                if !operands.is_empty() {
                    write!(f, " {}", operands.join(", "))?;
                }
            }
        }
        if let Some(control) = self.control() {
            write!(f, " if {control}")?;
        }
        Ok(())
    }
}
