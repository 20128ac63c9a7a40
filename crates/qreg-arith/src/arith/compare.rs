//! Comparison predicates.

use qreg_ir::Predicate;

use crate::circuit::Circuit;
use crate::error::ArithResult;
use crate::qubit::{QuantumRegister, QubitId};

use super::adder::sub;
use super::{expect_width, joined};

/// `a < b` into a fresh single-qubit register.
///
/// Both operands are sign-extended into `n+1`-qubit copies so that
/// `a - b` cannot overflow; the sign of the difference is the result.
pub fn less_than(
    circuit: &mut Circuit,
    a: &QuantumRegister,
    b: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    let n = a.width();
    expect_width("lt", b, n)?;
    let lhs = sign_extend(circuit, a, "lt.lhs")?;
    let rhs = sign_extend(circuit, b, "lt.rhs")?;
    sub(circuit, &lhs, &rhs, &[])?;

    let out = circuit.allocate_register("lt", 1);
    circuit.apply_mcx(&joined(controls, &[lhs.qubits[n]]), out.qubits[0])?;
    Ok(out)
}

/// `a == b` into a fresh single-qubit register.
pub fn equal(
    circuit: &mut Circuit,
    a: &QuantumRegister,
    b: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    let n = a.width();
    expect_width("eq", b, n)?;
    let diff = circuit.allocate_register("eq.diff", n);
    for ((qa, qb), qd) in a.iter().zip(b.iter()).zip(diff.iter()) {
        circuit.apply_cx(qa, qd)?;
        circuit.apply_cx(qb, qd)?;
        circuit.apply_x(qd)?;
    }
    let out = circuit.allocate_register("eq", 1);
    circuit.apply_mcx(&joined(controls, &diff.qubits), out.qubits[0])?;
    Ok(out)
}

/// Any predicate, reduced to `lt` and `eq`:
/// `gt(a,b) = lt(b,a)`, `le = ¬gt`, `ge = ¬lt`, `ne = ¬eq`.
pub fn compare(
    circuit: &mut Circuit,
    predicate: Predicate,
    a: &QuantumRegister,
    b: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<QuantumRegister> {
    let (base, negated) = match predicate {
        Predicate::Lt => (less_than(circuit, a, b, &[])?, false),
        Predicate::Gt => (less_than(circuit, b, a, &[])?, false),
        Predicate::Le => (less_than(circuit, b, a, &[])?, true),
        Predicate::Ge => (less_than(circuit, a, b, &[])?, true),
        Predicate::Eq => (equal(circuit, a, b, &[])?, false),
        Predicate::Ne => (equal(circuit, a, b, &[])?, true),
    };
    if negated {
        circuit.apply_x(base.qubits[0])?;
    }
    if controls.is_empty() {
        return Ok(base);
    }
    let out = circuit.allocate_register(predicate.name(), 1);
    circuit.apply_mcx(&joined(controls, &base.qubits), out.qubits[0])?;
    Ok(out)
}

fn sign_extend(
    circuit: &mut Circuit,
    src: &QuantumRegister,
    name: &str,
) -> ArithResult<QuantumRegister> {
    let n = src.width();
    let out = circuit.allocate_register(name, n + 1);
    for (qs, qo) in src.iter().zip(out.iter()) {
        circuit.apply_cx(qs, qo)?;
    }
    circuit.apply_cx(src.qubits[n - 1], out.qubits[n])?;
    Ok(out)
}
