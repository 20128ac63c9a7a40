//! Gate set of the arithmetic circuits.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Target operation of an instruction.
///
/// Controls are attached by the instruction, so `X` with one control is a
/// CNOT, `Phase` with two controls a doubly controlled phase, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Pauli-X (bit flip).
    X,
    /// Hadamard.
    H,
    /// Phase rotation `diag(1, e^{iθ})`.
    Phase(f64),
    /// Exchange of two qubits.
    Swap,
}

impl Gate {
    /// Base mnemonic, without control prefixes.
    pub fn name(&self) -> &'static str {
        match self {
            Gate::X => "x",
            Gate::H => "h",
            Gate::Phase(_) => "p",
            Gate::Swap => "swap",
        }
    }

    /// Number of target qubits.
    pub fn num_targets(&self) -> usize {
        match self {
            Gate::X | Gate::H | Gate::Phase(_) => 1,
            Gate::Swap => 2,
        }
    }

    /// The inverse gate.
    #[must_use]
    pub fn inverse(&self) -> Gate {
        match *self {
            Gate::Phase(theta) => Gate::Phase(-theta),
            other => other,
        }
    }

    /// Rotation angle, for phase gates.
    pub fn angle(&self) -> Option<f64> {
        match self {
            Gate::Phase(theta) => Some(*theta),
            _ => None,
        }
    }

    /// Whether the gate acts as the identity (a phase that is a multiple of 2π).
    pub fn is_identity(&self) -> bool {
        match self {
            Gate::Phase(theta) => {
                let turns = theta / (2.0 * PI);
                (turns - turns.round()).abs() < 1e-12
            }
            _ => false,
        }
    }
}
