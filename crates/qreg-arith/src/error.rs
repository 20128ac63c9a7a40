//! Error types for circuit construction, lowering and simulation.

use qreg_ir::{IrError, Slot};
use thiserror::Error;

use crate::qubit::QubitId;

/// Errors that can occur while building or running circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArithError {
    /// Qubit index beyond the circuit's allocation.
    #[error("Qubit {qubit} not allocated (circuit has {num_qubits} qubits){}", format_gate_context(.gate_name))]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of allocated qubits.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Same qubit used twice by one gate.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate given the wrong number of target qubits.
    #[error("Gate '{gate_name}' acts on {expected} target qubits, got {got}")]
    TargetCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of targets.
        expected: usize,
        /// Actual number of targets.
        got: usize,
    },

    /// Operand registers of incompatible widths.
    #[error("Register width mismatch in '{op}': expected {expected}, got {got}")]
    WidthMismatch {
        /// Primitive name.
        op: String,
        /// Expected width.
        expected: usize,
        /// Actual width.
        got: usize,
    },

    /// Circuit too large for the simulator.
    #[error("Circuit needs {requested} qubits, simulator supports at most {max}")]
    TooManyQubits {
        /// Qubits in the circuit.
        requested: u32,
        /// Simulator capacity.
        max: u32,
    },

    /// Operation with no circuit realisation.
    #[error("Unsupported operation '{op}': {reason}")]
    UnsupportedOperation {
        /// Operation mnemonic.
        op: String,
        /// Why it cannot be lowered.
        reason: String,
    },

    /// Operand slot never produced, or overwritten before this read.
    #[error("Use of undefined or overwritten value {0}")]
    UseOfUndefinedValue(Slot),

    /// Immediate divisor of zero.
    #[error("Division by zero in '{op}'")]
    DivisionByZero {
        /// Operation mnemonic.
        op: String,
    },

    /// Literal does not fit the register width.
    #[error("Value {value} does not fit in a {bit_width}-bit two's-complement register")]
    ValueOutOfRange {
        /// The literal.
        value: i64,
        /// Register width.
        bit_width: u32,
    },

    /// Other IR error.
    #[error("IR error: {0}")]
    Ir(#[source] IrError),
}

impl From<IrError> for ArithError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::ValueOutOfRange { value, bit_width } => {
                ArithError::ValueOutOfRange { value, bit_width }
            }
            IrError::UndefinedSlot(slot) => ArithError::UseOfUndefinedValue(slot),
            other => ArithError::Ir(other),
        }
    }
}

#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for circuit operations.
pub type ArithResult<T> = Result<T, ArithError>;
