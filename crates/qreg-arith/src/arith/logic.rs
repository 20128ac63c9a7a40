//! Boolean connectives and register copies.

use crate::circuit::Circuit;
use crate::error::ArithResult;
use crate::qubit::{QuantumRegister, QubitId};

use super::{expect_width, joined};

/// `p ∧ q` into a fresh qubit (a Toffoli when uncontrolled).
pub fn logical_and(
    circuit: &mut Circuit,
    p: &QuantumRegister,
    q: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    expect_width("and", p, 1)?;
    expect_width("and", q, 1)?;
    let out = circuit.allocate_register("and", 1);
    let inputs = joined(controls, &[p.qubits[0], q.qubits[0]]);
    circuit.apply_mcx(&inputs, out.qubits[0])?;
    Ok(out)
}

/// `¬p` into a fresh qubit: set it to 1, then flip it when `p` holds.
pub fn logical_not(
    circuit: &mut Circuit,
    p: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    expect_width("not", p, 1)?;
    let out = circuit.allocate_register("not", 1);
    let (source, target) = (p.qubits[0], out.qubits[0]);
    if controls.is_empty() {
        circuit.apply_x(target)?;
        circuit.apply_cx(source, target)?;
    } else {
        circuit.apply_x(source)?;
        circuit.apply_mcx(&joined(controls, &[source]), target)?;
        circuit.apply_x(source)?;
    }
    Ok(out)
}

/// Copy `src` into a fresh register with one CNOT per bit.
pub fn copy(
    circuit: &mut Circuit,
    src: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    let out = circuit.allocate_register(format!("{}.dup", src.name), src.width());
    for (qs, qo) in src.iter().zip(out.iter()) {
        circuit.apply_mcx(&joined(controls, &[qs]), qo)?;
    }
    Ok(out)
}
