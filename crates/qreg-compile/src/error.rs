//! Error types for compilation.

use qreg_ir::{IrError, SsaValue};
use thiserror::Error;

/// Errors that abort compiling a function.
///
/// Every error is fatal for the function being compiled; nothing is retried
/// and no partial output is produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Opcode or construct with no register realisation.
    #[error("Unsupported operation '{op}': {reason}")]
    UnsupportedOperation {
        /// Operation mnemonic.
        op: String,
        /// Why it cannot be translated.
        reason: String,
    },

    /// Reference to an SSA value that was never defined.
    #[error("Use of undefined value {0}")]
    UseOfUndefinedValue(SsaValue),

    /// Immediate divisor is literally zero.
    #[error("Division by zero in '{op}'")]
    DivisionByZero {
        /// Operation mnemonic.
        op: String,
    },

    /// Literal does not fit the configured width.
    #[error("Value {value} does not fit in a {bit_width}-bit two's-complement register")]
    ValueOutOfRange {
        /// The literal.
        value: i64,
        /// Configured width.
        bit_width: u32,
    },

    /// Internal invariant broken by the translator or a pass.
    #[error("Structural violation in '{stage}': {detail}")]
    StructuralViolation {
        /// Translator or pass that produced the broken IR.
        stage: String,
        /// What was broken.
        detail: String,
    },

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Other IR error.
    #[error("IR error: {0}")]
    Ir(#[source] IrError),
}

impl From<IrError> for CompileError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::ValueOutOfRange { value, bit_width } => {
                CompileError::ValueOutOfRange { value, bit_width }
            }
            IrError::StructuralViolation { detail, op_name } => CompileError::StructuralViolation {
                stage: op_name.unwrap_or_else(|| "ir".into()),
                detail,
            },
            IrError::InvalidBitWidth(bits) => {
                CompileError::InvalidConfig(format!("bit width {bits} is outside 1..={}", qreg_ir::MAX_BIT_WIDTH))
            }
            other => CompileError::Ir(other),
        }
    }
}

impl CompileError {
    /// Shorthand for an unsupported-operation error.
    pub fn unsupported(op: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::UnsupportedOperation {
            op: op.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
