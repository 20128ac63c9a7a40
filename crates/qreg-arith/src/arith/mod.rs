//! Reversible arithmetic primitives.
//!
//! Registers are little-endian two's complement. Every primitive takes a
//! `controls` slice: with controls, phase rotations and bit flips carry the
//! controls as well, so the primitive acts as the identity on its in-place
//! operand when any control is `|0⟩`. Primitives producing a fresh register
//! (`multiply`, `divide`, ...) yield `control ? a ⊕ b : a` in that register,
//! matching the in-place adder.
//!
//! Helper registers are always freshly allocated and never released.

mod adder;
mod compare;
mod divider;
mod logic;
mod multiplier;

pub use adder::{add, add_imm, negate, sub, sub_imm};
pub use compare::{compare, equal, less_than};
pub use divider::{Division, divide, divide_imm};
pub use logic::{copy, logical_and, logical_not};
pub use multiplier::{multiply, multiply_imm};

use std::f64::consts::PI;

use crate::circuit::Circuit;
use crate::error::{ArithError, ArithResult};
use crate::qubit::{QuantumRegister, QubitId};

/// `controls` followed by `extra`.
fn joined(controls: &[QubitId], extra: &[QubitId]) -> Vec<QubitId> {
    controls.iter().chain(extra).copied().collect()
}

/// Reduce `controls` to at most one qubit, computing their conjunction into a
/// fresh qubit when there are several.
fn control_flag(circuit: &mut Circuit, controls: &[QubitId]) -> ArithResult<Option<QubitId>> {
    match controls {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        many => {
            let flag = circuit.allocate_qubit("ctrl");
            circuit.apply_mcx(many, flag)?;
            Ok(Some(flag))
        }
    }
}

fn expect_width(op: &str, register: &QuantumRegister, expected: usize) -> ArithResult<()> {
    if register.width() != expected || expected == 0 {
        return Err(ArithError::WidthMismatch {
            op: op.to_string(),
            expected,
            got: register.width(),
        });
    }
    Ok(())
}

/// `2π / 2^k`.
fn turn_fraction(k: usize) -> f64 {
    2.0 * PI / 2f64.powi(k as i32)
}

/// `2π · (value mod 2^k) / 2^k`.
fn residue_angle(value: i128, k: usize) -> f64 {
    let modulus = 1i128 << k;
    2.0 * PI * value.rem_euclid(modulus) as f64 / modulus as f64
}

/// Add `a` into the Fourier-transformed `out` only when `flag` is `|0⟩`.
fn add_phases_unless(
    circuit: &mut Circuit,
    out: &QuantumRegister,
    a: &QuantumRegister,
    flag: QubitId,
) -> ArithResult<()> {
    circuit.apply_x(flag)?;
    adder::add_phases(circuit, out, a, 1.0, &[flag])?;
    circuit.apply_x(flag)?;
    Ok(())
}
