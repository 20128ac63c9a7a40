//! Fourier-space multiplication into a fresh register.

use tracing::debug;

use crate::circuit::Circuit;
use crate::error::ArithResult;
use crate::qubit::{QuantumRegister, QubitId};

use super::{add_phases_unless, control_flag, expect_width, joined, residue_angle, turn_fraction};

/// `a · b (mod 2^n)` into a fresh register.
///
/// For every output bit `k` and operand bits `i`, `j` with `i + j ≤ k`, a
/// doubly controlled rotation by `2π / 2^(k+1-i-j)` is applied; terms with
/// `i + j > k` are whole turns and are omitted. The unsigned product of the
/// two's-complement encodings equals the signed product modulo `2^n`.
///
/// With controls the result is `control ? a·b : a`.
pub fn multiply(
    circuit: &mut Circuit,
    a: &QuantumRegister,
    b: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    let n = a.width();
    expect_width("mul", b, n)?;
    let flag = control_flag(circuit, controls)?;
    let out = circuit.allocate_register("mul", n);
    debug!("mul {} x {} -> {}", a, b, out);

    circuit.qft(&out)?;
    for (k, target) in out.iter().enumerate() {
        for (i, qa) in a.iter().enumerate().take(k + 1) {
            for (j, qb) in b.iter().enumerate().take(k + 1 - i) {
                let controls = joined(flag.as_slice(), &[qa, qb]);
                circuit.apply_controlled_phase(turn_fraction(k + 1 - i - j), &controls, target)?;
            }
        }
    }
    if let Some(flag) = flag {
        add_phases_unless(circuit, &out, a, flag)?;
    }
    circuit.iqft(&out)?;
    Ok(out)
}

/// `a · value (mod 2^n)` into a fresh register.
///
/// Bit `j` of `a` rotates output bit `k` by `2π · (value·2^j mod 2^(k+1)) / 2^(k+1)`.
pub fn multiply_imm(
    circuit: &mut Circuit,
    a: &QuantumRegister,
    value: i64,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    let n = a.width();
    expect_width("muli", a, n)?;
    let flag = control_flag(circuit, controls)?;
    let out = circuit.allocate_register("muli", n);

    circuit.qft(&out)?;
    for (k, target) in out.iter().enumerate() {
        for (j, qa) in a.iter().enumerate().take(k + 1) {
            let controls = joined(flag.as_slice(), &[qa]);
            let term = i128::from(value) << j;
            circuit.apply_controlled_phase(residue_angle(term, k + 1), &controls, target)?;
        }
    }
    if let Some(flag) = flag {
        add_phases_unless(circuit, &out, a, flag)?;
    }
    circuit.iqft(&out)?;
    Ok(out)
}
