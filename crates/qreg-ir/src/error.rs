//! Error types for the IR crate.

use crate::classical::BlockId;
use crate::register::Slot;
use thiserror::Error;

/// Errors that can occur while building or inspecting IR.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// An operation breaks write-in-place, single-producer or no-cloning.
    #[error("Structural violation{}: {detail}", format_op_context(.op_name))]
    StructuralViolation {
        /// Description of the broken invariant.
        detail: String,
        /// Optional operation name for context.
        op_name: Option<String>,
    },

    /// A literal does not fit the configured two's-complement width.
    #[error("Value {value} does not fit in a {bit_width}-bit two's-complement register")]
    ValueOutOfRange {
        /// The offending literal.
        value: i64,
        /// The register width.
        bit_width: u32,
    },

    /// Register width outside the supported range.
    #[error("Invalid bit width {0}: must be between 1 and {max}", max = crate::width::MAX_BIT_WIDTH)]
    InvalidBitWidth(u32),

    /// Operand widths disagree.
    #[error("Width mismatch{}: expected {expected} bits, got {got}", format_op_context(.op_name))]
    WidthMismatch {
        /// Expected width in bits.
        expected: u32,
        /// Actual width in bits.
        got: u32,
        /// Optional operation name for context.
        op_name: Option<String>,
    },

    /// A slot is read before any operation produced it.
    #[error("Slot {0} is read before it is produced")]
    UndefinedSlot(Slot),

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// Branch target does not exist in the function.
    #[error("Block {0} not found in function")]
    UnknownBlock(BlockId),
}

impl IrError {
    /// Shorthand for a structural violation attributed to an operation.
    pub fn structural(op_name: &str, detail: impl Into<String>) -> Self {
        IrError::StructuralViolation {
            detail: detail.into(),
            op_name: Some(op_name.to_string()),
        }
    }
}

/// Helper function to format optional operation context.
#[allow(clippy::ref_option)]
fn format_op_context(op_name: &Option<String>) -> String {
    match op_name {
        Some(name) => format!(" (op: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
