//! Phase-rotation (Draper) addition and subtraction.

use crate::circuit::Circuit;
use crate::error::{ArithError, ArithResult};
use crate::qubit::{QuantumRegister, QubitId};

use super::{joined, residue_angle, turn_fraction};

/// Rotations adding `sign · src` into the Fourier-transformed `dst`.
///
/// Source bit `j` rotates destination bit `i ≥ j` by `2π / 2^(i-j+1)`.
/// A narrower `src` is zero-extended.
pub(crate) fn add_phases(
    circuit: &mut Circuit,
    dst: &QuantumRegister,
    src: &QuantumRegister,
    sign: f64,
    controls: &[QubitId],
) -> ArithResult<()> {
    for (i, target) in dst.iter().enumerate() {
        for (j, source) in src.iter().enumerate().take(i + 1) {
            let controls = joined(controls, &[source]);
            circuit.apply_controlled_phase(sign * turn_fraction(i - j + 1), &controls, target)?;
        }
    }
    Ok(())
}

/// Rotations adding the classical `value` into the Fourier-transformed `dst`.
pub(crate) fn add_imm_phases(
    circuit: &mut Circuit,
    dst: &QuantumRegister,
    value: i64,
    controls: &[QubitId],
) -> ArithResult<()> {
    for (j, target) in dst.iter().enumerate() {
        circuit.apply_controlled_phase(residue_angle(i128::from(value), j + 1), controls, target)?;
    }
    Ok(())
}

fn check_operands(op: &str, dst: &QuantumRegister, src: &QuantumRegister) -> ArithResult<()> {
    if dst.width() == 0 || src.width() > dst.width() {
        return Err(ArithError::WidthMismatch {
            op: op.to_string(),
            expected: dst.width(),
            got: src.width(),
        });
    }
    Ok(())
}

/// `dst += src (mod 2^n)`.
pub fn add(
    circuit: &mut Circuit,
    dst: &QuantumRegister,
    src: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<()> {
    check_operands("add", dst, src)?;
    circuit.qft(dst)?;
    add_phases(circuit, dst, src, 1.0, controls)?;
    circuit.iqft(dst)?;
    Ok(())
}

/// `dst -= src (mod 2^n)`.
pub fn sub(
    circuit: &mut Circuit,
    dst: &QuantumRegister,
    src: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<()> {
    check_operands("sub", dst, src)?;
    circuit.qft(dst)?;
    add_phases(circuit, dst, src, -1.0, controls)?;
    circuit.iqft(dst)?;
    Ok(())
}

/// `dst += value (mod 2^n)`.
pub fn add_imm(
    circuit: &mut Circuit,
    dst: &QuantumRegister,
    value: i64,
    controls: &[QubitId],
) -> ArithResult<()> {
    circuit.qft(dst)?;
    add_imm_phases(circuit, dst, value, controls)?;
    circuit.iqft(dst)?;
    Ok(())
}

/// `dst -= value (mod 2^n)`.
pub fn sub_imm(
    circuit: &mut Circuit,
    dst: &QuantumRegister,
    value: i64,
    controls: &[QubitId],
) -> ArithResult<()> {
    add_imm(circuit, dst, value.wrapping_neg(), controls)
}

/// `dst = -dst` in two's complement (invert, then add one).
pub fn negate(circuit: &mut Circuit, dst: &QuantumRegister, controls: &[QubitId]) -> ArithResult<()> {
    for qubit in dst.iter() {
        circuit.apply_mcx(controls, qubit)?;
    }
    add_imm(circuit, dst, 1, controls)
}
