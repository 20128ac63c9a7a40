//! Signed restoring division.

use qreg_ir::BitWidth;
use tracing::debug;

use crate::circuit::Circuit;
use crate::encoding::encode_twos_complement;
use crate::error::{ArithError, ArithResult};
use crate::qubit::{QuantumRegister, QubitId};

use super::adder::{add, add_phases, negate, sub};
use super::{add_phases_unless, control_flag, expect_width};

/// Registers produced by [`divide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    /// Quotient, truncated toward zero.
    pub quotient: QuantumRegister,
    /// Remainder, with the sign of the dividend.
    pub remainder: QuantumRegister,
}

/// Signed `a / b` and `a % b`.
///
/// Both operands are converted to sign and magnitude. The magnitude of `a`
/// sits in the low half of a `2n`-qubit work register; at step `i` (from the
/// most significant quotient bit down) the `n+1`-qubit window starting at
/// bit `i` holds the shifted partial remainder with dividend bit `i` brought
/// in. The divisor is subtracted from the window, the window's sign becomes
/// the complement of quotient bit `i`, and the divisor is added back when the
/// subtraction went negative. The quotient takes sign `sign(a) ⊕ sign(b)`
/// and the remainder sign `sign(a)`.
///
/// With controls the quotient register holds `control ? a / b : a`; the
/// remainder register is computed unconditionally. Division by a runtime
/// zero is not detected.
pub fn divide(
    circuit: &mut Circuit,
    a: &QuantumRegister,
    b: &QuantumRegister,
    controls: &[QubitId],
) -> ArithResult<Division> {
    let n = a.width();
    expect_width("div", b, n)?;
    let (Some(a_msb), Some(b_msb)) = (a.msb(), b.msb()) else {
        return Err(ArithError::WidthMismatch {
            op: "div".into(),
            expected: n,
            got: 0,
        });
    };
    debug!("div {} / {}", a, b);

    let sign_a = circuit.allocate_qubit("div.sign_a");
    circuit.apply_cx(a_msb, sign_a)?;
    let sign_b = circuit.allocate_qubit("div.sign_b");
    circuit.apply_cx(b_msb, sign_b)?;

    let work = circuit.allocate_register("div.work", 2 * n);
    let low = work.slice(0..n);
    for (src, dst) in a.iter().zip(low.iter()) {
        circuit.apply_cx(src, dst)?;
    }
    negate(circuit, &low, &[sign_a])?;

    let divisor = circuit.allocate_register("div.divisor", n);
    for (src, dst) in b.iter().zip(divisor.iter()) {
        circuit.apply_cx(src, dst)?;
    }
    negate(circuit, &divisor, &[sign_b])?;

    let quotient = circuit.allocate_register("div.quotient", n);
    for i in (0..n).rev() {
        let window = work.slice(i..i + n + 1);
        let went_negative = window.qubits[n];
        let bit = quotient.qubits[i];

        sub(circuit, &window, &divisor, &[])?;
        circuit.apply_cx(went_negative, bit)?;
        add(circuit, &window, &divisor, &[bit])?;
        // The restore clears the window sign; the quotient bit is its complement.
        circuit.apply_x(bit)?;
    }

    let sign_q = circuit.allocate_qubit("div.sign_q");
    circuit.apply_cx(sign_a, sign_q)?;
    circuit.apply_cx(sign_b, sign_q)?;
    negate(circuit, &quotient, &[sign_q])?;
    negate(circuit, &low, &[sign_a])?;

    let quotient = match control_flag(circuit, controls)? {
        None => quotient,
        Some(flag) => {
            let out = circuit.allocate_register("div.out", n);
            circuit.qft(&out)?;
            add_phases(circuit, &out, &quotient, 1.0, &[flag])?;
            add_phases_unless(circuit, &out, a, flag)?;
            circuit.iqft(&out)?;
            out
        }
    };

    Ok(Division {
        quotient,
        remainder: low,
    })
}

/// Signed division by a classical immediate.
///
/// The immediate is loaded into a fresh register and divided by the general
/// circuit. A zero divisor is rejected before any gate is emitted.
pub fn divide_imm(
    circuit: &mut Circuit,
    a: &QuantumRegister,
    value: i64,
    controls: &[QubitId],
) -> ArithResult<Division> {
    if value == 0 {
        return Err(ArithError::DivisionByZero { op: "divi".into() });
    }
    let width = BitWidth::new(a.width() as u32)?;
    let bits = encode_twos_complement(value, width)?;
    let divisor = circuit.allocate_register("divi.imm", a.width());
    circuit.load_bits(&divisor, &bits)?;
    divide(circuit, a, &divisor, controls)
}
