//! Lowering of register-versioned IR to an arithmetic circuit.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, instrument};

use qreg_ir::{BinaryOpcode, OpKind, Operation, QuantumFunction, Slot, Value};

use crate::arith;
use crate::circuit::Circuit;
use crate::encoding::encode_twos_complement;
use crate::error::{ArithError, ArithResult};
use crate::qubit::{ClassicalRegister, QuantumRegister, QubitId};
use crate::simulator::Simulator;

/// A lowered function.
#[derive(Debug, Clone)]
pub struct LoweredCircuit {
    /// The circuit.
    pub circuit: Circuit,
    /// Classical bits holding the returned value, if the function returns one.
    pub returned: Option<ClassicalRegister>,
    /// Whether the returned value is a predicate (a comparison or connective).
    pub returns_predicate: bool,
    /// Physical register of every slot still readable at the end.
    pub registers: FxHashMap<Slot, QuantumRegister>,
}

impl LoweredCircuit {
    /// Simulate the circuit and decode the returned value.
    ///
    /// Predicates decode as 0 or 1, integers as two's complement at their
    /// register width (so a one-bit integer reads -1 or 0).
    pub fn run(&self, simulator: &Simulator) -> ArithResult<Option<i64>> {
        let outcome = simulator.run(&self.circuit)?;
        Ok(self.returned.as_ref().map(|reg| {
            if self.returns_predicate {
                outcome.read(reg) as i64
            } else {
                outcome.read_signed(reg)
            }
        }))
    }
}

/// Maps every slot of a function to a physical register and emits the
/// arithmetic realising each operation.
///
/// `add`/`sub` (register or immediate) act in place on the left operand's
/// register. `mul`, `div`, comparisons, connectives, copies and literals
/// produce fresh registers. Either way the left operand's slot stops being
/// readable once the next version exists, so a stale read in the input is
/// reported as `UseOfUndefinedValue` instead of reading wrong data.
///
/// # Example
///
/// ```
/// use qreg_arith::{CircuitLowering, Simulator};
/// use qreg_ir::{BinaryOpcode, BitWidth, Operation, QuantumFunction, RegisterId, Slot, Value};
///
/// let w = BitWidth::new(4).unwrap();
/// let a = Value::new(Slot::new(RegisterId(0), 0), w);
/// let b = Value::new(Slot::new(RegisterId(1), 0), w);
/// let func = QuantumFunction::from_ops("f", w, vec![
///     Operation::init(a, 3).unwrap(),
///     Operation::init(b, -2).unwrap(),
///     Operation::binary(BinaryOpcode::Add, a.next_version(), a, b, None).unwrap(),
///     Operation::ret(Some(a.next_version())),
/// ]);
///
/// let lowered = CircuitLowering::lower(&func).unwrap();
/// assert_eq!(lowered.run(&Simulator::new()).unwrap(), Some(1));
/// ```
pub struct CircuitLowering {
    circuit: Circuit,
    slots: FxHashMap<Slot, QuantumRegister>,
    predicates: FxHashSet<Slot>,
    returned: Option<ClassicalRegister>,
    returns_predicate: bool,
}

impl CircuitLowering {
    /// Lower `function` to a circuit.
    #[instrument(skip_all, fields(function = %function.name()))]
    pub fn lower(function: &QuantumFunction) -> ArithResult<LoweredCircuit> {
        info!(
            "Lowering {} operations at {}",
            function.len(),
            function.bit_width()
        );
        let mut state = Self {
            circuit: Circuit::new(function.name()),
            slots: FxHashMap::default(),
            predicates: FxHashSet::default(),
            returned: None,
            returns_predicate: false,
        };
        for op in function.ops() {
            state.lower_op(op)?;
        }
        info!(
            "Lowered to {} qubits, {} instructions, depth {}",
            state.circuit.num_qubits(),
            state.circuit.len(),
            state.circuit.depth()
        );
        Ok(LoweredCircuit {
            circuit: state.circuit,
            returned: state.returned,
            returns_predicate: state.returns_predicate,
            registers: state.slots,
        })
    }

    fn fetch(&self, value: &Value) -> ArithResult<QuantumRegister> {
        self.slots
            .get(&value.slot)
            .cloned()
            .ok_or(ArithError::UseOfUndefinedValue(value.slot))
    }

    fn controls(&self, control: Option<&Value>) -> ArithResult<Vec<QubitId>> {
        match control {
            Some(c) => Ok(self.fetch(c)?.qubits),
            None => Ok(vec![]),
        }
    }

    fn lower_op(&mut self, op: &Operation) -> ArithResult<()> {
        debug!("lower {}", op);
        let produced = match op.kind() {
            OpKind::Init { value } => {
                let Some(result) = op.result() else {
                    return Ok(());
                };
                let bits = encode_twos_complement(*value, result.width)?;
                let reg = self
                    .circuit
                    .allocate_register(result.slot.to_string(), bits.len());
                self.circuit.load_bits(&reg, &bits)?;
                reg
            }
            OpKind::Duplicate { source } => {
                let src = self.fetch(source)?;
                arith::copy(&mut self.circuit, &src, &[])?
            }
            OpKind::Binary {
                op: opcode,
                lhs,
                rhs,
                control,
            } => {
                let l = self.fetch(lhs)?;
                let r = self.fetch(rhs)?;
                let controls = self.controls(control.as_ref())?;
                let c = &mut self.circuit;
                let out = match opcode {
                    BinaryOpcode::Add => {
                        arith::add(c, &l, &r, &controls)?;
                        l
                    }
                    BinaryOpcode::Sub => {
                        arith::sub(c, &l, &r, &controls)?;
                        l
                    }
                    BinaryOpcode::Mul => arith::multiply(c, &l, &r, &controls)?,
                    BinaryOpcode::Div => arith::divide(c, &l, &r, &controls)?.quotient,
                };
                self.slots.remove(&lhs.slot);
                out
            }
            OpKind::BinaryImm {
                op: opcode,
                lhs,
                imm,
                control,
            } => {
                let l = self.fetch(lhs)?;
                let controls = self.controls(control.as_ref())?;
                let c = &mut self.circuit;
                let out = match opcode {
                    BinaryOpcode::Add => {
                        arith::add_imm(c, &l, *imm, &controls)?;
                        l
                    }
                    BinaryOpcode::Sub => {
                        arith::sub_imm(c, &l, *imm, &controls)?;
                        l
                    }
                    BinaryOpcode::Mul => arith::multiply_imm(c, &l, *imm, &controls)?,
                    BinaryOpcode::Div => arith::divide_imm(c, &l, *imm, &controls)?.quotient,
                };
                self.slots.remove(&lhs.slot);
                out
            }
            OpKind::Compare {
                predicate,
                lhs,
                rhs,
            } => {
                let l = self.fetch(lhs)?;
                let r = self.fetch(rhs)?;
                arith::compare(&mut self.circuit, *predicate, &l, &r, &[])?
            }
            OpKind::And { lhs, rhs } => {
                let l = self.fetch(lhs)?;
                let r = self.fetch(rhs)?;
                arith::logical_and(&mut self.circuit, &l, &r, &[])?
            }
            OpKind::Not { operand } => {
                let p = self.fetch(operand)?;
                arith::logical_not(&mut self.circuit, &p, &[])?
            }
            OpKind::Return { value } => {
                if let Some(v) = value {
                    let reg = self.fetch(v)?;
                    self.returned = Some(self.circuit.measure(&reg)?);
                    self.returns_predicate = self.predicates.contains(&v.slot);
                }
                return Ok(());
            }
        };

        if let Some(result) = op.result() {
            let predicate = match op.kind() {
                OpKind::Compare { .. } | OpKind::And { .. } | OpKind::Not { .. } => true,
                OpKind::Duplicate { source } => self.predicates.contains(&source.slot),
                _ => false,
            };
            if predicate {
                self.predicates.insert(result.slot);
            }
            self.slots.insert(result.slot, produced);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qreg_ir::{BitWidth, Predicate, RegisterId};

    fn val(register: u32, version: u32, width: BitWidth) -> Value {
        Value::new(Slot::new(RegisterId(register), version), width)
    }

    #[test]
    fn test_in_place_ops_reuse_register() {
        let w = BitWidth::new(4).unwrap();
        let func = QuantumFunction::from_ops(
            "f",
            w,
            vec![
                Operation::init(val(0, 0, w), 2).unwrap(),
                Operation::binary_imm(BinaryOpcode::Add, val(0, 1, w), val(0, 0, w), 3, None)
                    .unwrap(),
                Operation::binary_imm(BinaryOpcode::Mul, val(0, 2, w), val(0, 1, w), 2, None)
                    .unwrap(),
                Operation::ret(Some(val(0, 2, w))),
            ],
        );
        let lowered = CircuitLowering::lower(&func).unwrap();
        // init register plus the fresh product register
        assert_eq!(lowered.circuit.num_qubits(), 8);
        assert!(!lowered.registers.contains_key(&Slot::new(RegisterId(0), 1)));
        assert_eq!(lowered.run(&Simulator::new()).unwrap(), Some(-6));
    }

    #[test]
    fn test_stale_slot_is_rejected() {
        let w = BitWidth::new(3).unwrap();
        let func = QuantumFunction::from_ops(
            "f",
            w,
            vec![
                Operation::init(val(0, 0, w), 1).unwrap(),
                Operation::binary_imm(BinaryOpcode::Add, val(0, 1, w), val(0, 0, w), 1, None)
                    .unwrap(),
                Operation::ret(Some(val(0, 0, w))),
            ],
        );
        assert!(matches!(
            CircuitLowering::lower(&func),
            Err(ArithError::UseOfUndefinedValue(slot)) if slot == Slot::new(RegisterId(0), 0)
        ));
    }

    #[test]
    fn test_immediate_division_by_zero() {
        let w = BitWidth::new(3).unwrap();
        let func = QuantumFunction::from_ops(
            "f",
            w,
            vec![
                Operation::init(val(0, 0, w), 1).unwrap(),
                Operation::binary_imm(BinaryOpcode::Div, val(0, 1, w), val(0, 0, w), 0, None)
                    .unwrap(),
            ],
        );
        assert!(matches!(
            CircuitLowering::lower(&func),
            Err(ArithError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_boolean_result_reads_as_zero_or_one() {
        let w = BitWidth::new(4).unwrap();
        let b = BitWidth::BOOL;
        let func = QuantumFunction::from_ops(
            "f",
            w,
            vec![
                Operation::init(val(0, 0, w), -3).unwrap(),
                Operation::init(val(1, 0, w), 2).unwrap(),
                Operation::compare(Predicate::Lt, val(2, 0, b), val(0, 0, w), val(1, 0, w))
                    .unwrap(),
                Operation::not(val(3, 0, b), val(2, 0, b)).unwrap(),
                Operation::and(val(4, 0, b), val(2, 0, b), val(3, 0, b)).unwrap(),
                Operation::ret(Some(val(2, 0, b))),
            ],
        );
        let lowered = CircuitLowering::lower(&func).unwrap();
        assert_eq!(lowered.run(&Simulator::new()).unwrap(), Some(1));
        assert_eq!(lowered.circuit.gate_counts().get("ccx"), Some(&1));
    }

    #[test]
    fn test_one_bit_integer_reads_signed() {
        let b = BitWidth::BOOL;
        let func = QuantumFunction::from_ops(
            "f",
            b,
            vec![
                Operation::init(val(0, 0, b), -1).unwrap(),
                Operation::init(val(1, 0, b), 0).unwrap(),
                Operation::binary(BinaryOpcode::Add, val(0, 1, b), val(0, 0, b), val(1, 0, b), None)
                    .unwrap(),
                Operation::ret(Some(val(0, 1, b))),
            ],
        );
        let lowered = CircuitLowering::lower(&func).unwrap();
        assert!(!lowered.returns_predicate);
        assert_eq!(lowered.run(&Simulator::new()).unwrap(), Some(-1));
    }

    #[test]
    fn test_copied_predicate_stays_boolean() {
        let w = BitWidth::new(3).unwrap();
        let b = BitWidth::BOOL;
        let func = QuantumFunction::from_ops(
            "f",
            w,
            vec![
                Operation::init(val(0, 0, w), 1).unwrap(),
                Operation::init(val(1, 0, w), 1).unwrap(),
                Operation::compare(Predicate::Eq, val(2, 0, b), val(0, 0, w), val(1, 0, w))
                    .unwrap(),
                Operation::duplicate(val(3, 0, b), val(2, 0, b)).unwrap(),
                Operation::ret(Some(val(3, 0, b))),
            ],
        );
        let lowered = CircuitLowering::lower(&func).unwrap();
        assert!(lowered.returns_predicate);
        assert_eq!(lowered.run(&Simulator::new()).unwrap(), Some(1));
    }
}
