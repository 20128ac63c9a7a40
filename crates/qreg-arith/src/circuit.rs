//! Circuit builder for register arithmetic.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{ArithError, ArithResult};
use crate::gate::Gate;
use crate::instruction::Instruction;
use crate::qubit::{ClassicalRegister, ClbitId, QuantumRegister, QubitId};

/// A quantum circuit over little-endian integer registers.
///
/// Qubits are only ever added, through [`allocate_register`](Self::allocate_register);
/// every qubit starts in `|0⟩`. Gate methods validate their operands and
/// return `&mut Self` for chaining.
///
/// # Example
///
/// ```
/// use qreg_arith::Circuit;
///
/// let mut c = Circuit::new("flip");
/// let a = c.allocate_register("a", 2);
/// c.apply_x(a.qubits[0]).unwrap().apply_cx(a.qubits[0], a.qubits[1]).unwrap();
/// let bits = c.measure(&a).unwrap();
/// assert_eq!(bits.width(), 2);
/// assert_eq!(c.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    num_qubits: u32,
    num_clbits: u32,
    registers: Vec<QuantumRegister>,
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: 0,
            num_clbits: 0,
            registers: vec![],
            instructions: vec![],
        }
    }

    /// Allocate `width` fresh qubits as a register.
    pub fn allocate_register(&mut self, name: impl Into<String>, width: usize) -> QuantumRegister {
        let qubits = (0..width)
            .map(|_| {
                let id = QubitId(self.num_qubits);
                self.num_qubits += 1;
                id
            })
            .collect();
        let register = QuantumRegister::new(name, qubits);
        self.registers.push(register.clone());
        register
    }

    /// Allocate a single fresh qubit.
    pub fn allocate_qubit(&mut self, name: impl Into<String>) -> QubitId {
        self.allocate_register(name, 1).qubits[0]
    }

    // =========================================================================
    // Gates
    // =========================================================================

    /// Append a gate after validating its qubits.
    pub fn apply_gate(
        &mut self,
        gate: Gate,
        controls: &[QubitId],
        targets: &[QubitId],
    ) -> ArithResult<&mut Self> {
        let instruction = Instruction::gate(gate, controls.iter().copied(), targets.iter().copied());
        if targets.len() != gate.num_targets() {
            return Err(ArithError::TargetCountMismatch {
                gate_name: instruction.name(),
                expected: gate.num_targets(),
                got: targets.len(),
            });
        }
        self.check_qubits(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    /// Apply Pauli-X.
    pub fn apply_x(&mut self, qubit: QubitId) -> ArithResult<&mut Self> {
        self.apply_gate(Gate::X, &[], &[qubit])
    }

    /// Apply Hadamard.
    pub fn apply_h(&mut self, qubit: QubitId) -> ArithResult<&mut Self> {
        self.apply_gate(Gate::H, &[], &[qubit])
    }

    /// Apply a phase rotation.
    pub fn apply_phase(&mut self, angle: f64, qubit: QubitId) -> ArithResult<&mut Self> {
        self.apply_gate(Gate::Phase(angle), &[], &[qubit])
    }

    /// Apply a phase rotation conditioned on every qubit in `controls`.
    ///
    /// Rotations by a multiple of 2π are dropped.
    pub fn apply_controlled_phase(
        &mut self,
        angle: f64,
        controls: &[QubitId],
        target: QubitId,
    ) -> ArithResult<&mut Self> {
        if Gate::Phase(angle).is_identity() {
            return Ok(self);
        }
        self.apply_gate(Gate::Phase(angle), controls, &[target])
    }

    /// Apply CNOT.
    pub fn apply_cx(&mut self, control: QubitId, target: QubitId) -> ArithResult<&mut Self> {
        self.apply_gate(Gate::X, &[control], &[target])
    }

    /// Apply a Toffoli gate.
    pub fn apply_ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> ArithResult<&mut Self> {
        self.apply_gate(Gate::X, &[c1, c2], &[target])
    }

    /// Apply X conditioned on every qubit in `controls`.
    pub fn apply_mcx(&mut self, controls: &[QubitId], target: QubitId) -> ArithResult<&mut Self> {
        self.apply_gate(Gate::X, controls, &[target])
    }

    /// Apply SWAP.
    pub fn apply_swap(&mut self, a: QubitId, b: QubitId) -> ArithResult<&mut Self> {
        self.apply_gate(Gate::Swap, &[], &[a, b])
    }

    /// Measure every qubit of `register` into fresh classical bits.
    pub fn measure(&mut self, register: &QuantumRegister) -> ArithResult<ClassicalRegister> {
        let mut clbits = Vec::with_capacity(register.width());
        for qubit in register.iter() {
            let clbit = ClbitId(self.num_clbits);
            let instruction = Instruction::measure(qubit, clbit);
            self.check_qubits(&instruction)?;
            self.num_clbits += 1;
            self.instructions.push(instruction);
            clbits.push(clbit);
        }
        Ok(ClassicalRegister {
            name: register.name.clone(),
            clbits,
        })
    }

    // =========================================================================
    // Fourier transforms
    // =========================================================================

    /// Quantum Fourier transform of `register`, without the final swaps.
    ///
    /// Afterwards qubit `j` carries the phase `2π·a / 2^(j+1)` of the
    /// register's value `a`, which is what the phase adders act on.
    pub fn qft(&mut self, register: &QuantumRegister) -> ArithResult<&mut Self> {
        for instruction in qft_sequence(register) {
            self.check_qubits(&instruction)?;
            self.instructions.push(instruction);
        }
        Ok(self)
    }

    /// Inverse of [`qft`](Self::qft).
    pub fn iqft(&mut self, register: &QuantumRegister) -> ArithResult<&mut Self> {
        for instruction in qft_sequence(register).iter().rev() {
            if let Some(inverse) = instruction.inverse() {
                self.check_qubits(&inverse)?;
                self.instructions.push(inverse);
            }
        }
        Ok(self)
    }

    /// Flip the bits of `register` so it holds `value` (assumed to start at 0).
    pub fn load_bits(&mut self, register: &QuantumRegister, bits: &[bool]) -> ArithResult<&mut Self> {
        for (qubit, _) in register.iter().zip(bits).filter(|(_, b)| **b) {
            self.apply_x(qubit)?;
        }
        Ok(self)
    }

    fn check_qubits(&self, instruction: &Instruction) -> ArithResult<()> {
        let mut seen = FxHashSet::default();
        for qubit in instruction.all_qubits() {
            if qubit.0 >= self.num_qubits {
                return Err(ArithError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                    gate_name: Some(instruction.name()),
                });
            }
            if !seen.insert(qubit) {
                return Err(ArithError::DuplicateQubit {
                    qubit,
                    gate_name: Some(instruction.name()),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Every register allocated so far, in allocation order.
    pub fn registers(&self) -> &[QuantumRegister] {
        &self.registers
    }

    /// The instruction list.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction counts by mnemonic.
    pub fn gate_counts(&self) -> FxHashMap<String, usize> {
        let mut counts = FxHashMap::default();
        for instruction in &self.instructions {
            *counts.entry(instruction.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of layers when every instruction waits for all of its qubits.
    pub fn depth(&self) -> usize {
        let mut level = vec![0usize; self.num_qubits as usize];
        let mut depth = 0;
        for instruction in &self.instructions {
            let qubits: Vec<usize> = instruction.all_qubits().map(|q| q.0 as usize).collect();
            let layer = qubits.iter().map(|&q| level[q]).max().unwrap_or(0) + 1;
            for q in qubits {
                level[q] = layer;
            }
            depth = depth.max(layer);
        }
        depth
    }
}

/// Gates of the swap-free QFT over `register`, most significant qubit first.
fn qft_sequence(register: &QuantumRegister) -> Vec<Instruction> {
    let mut out = Vec::new();
    for j in (0..register.width()).rev() {
        let target = register.qubits[j];
        out.push(Instruction::gate(Gate::H, [], [target]));
        for k in (0..j).rev() {
            let angle = PI / 2f64.powi((j - k) as i32);
            out.push(Instruction::gate(
                Gate::Phase(angle),
                [register.qubits[k]],
                [target],
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_sequential() {
        let mut c = Circuit::new("t");
        let a = c.allocate_register("a", 3);
        let b = c.allocate_register("b", 2);
        assert_eq!(a.qubits, vec![QubitId(0), QubitId(1), QubitId(2)]);
        assert_eq!(b.qubits, vec![QubitId(3), QubitId(4)]);
        assert_eq!(c.allocate_qubit("f"), QubitId(5));
        assert_eq!(c.num_qubits(), 6);
        assert_eq!(c.registers().len(), 3);
    }

    #[test]
    fn test_gate_validation() {
        let mut c = Circuit::new("t");
        let a = c.allocate_register("a", 2);
        assert!(matches!(
            c.apply_cx(a.qubits[0], a.qubits[0]),
            Err(ArithError::DuplicateQubit { .. })
        ));
        assert!(matches!(
            c.apply_x(QubitId(7)),
            Err(ArithError::QubitOutOfRange { .. })
        ));
        assert!(matches!(
            c.apply_gate(Gate::Swap, &[], &[a.qubits[0]]),
            Err(ArithError::TargetCountMismatch { .. })
        ));
        assert!(c.is_empty());
    }

    #[test]
    fn test_qft_gate_count_and_inverse() {
        let mut c = Circuit::new("t");
        let a = c.allocate_register("a", 4);
        c.qft(&a).unwrap();
        // n Hadamards and n(n-1)/2 controlled phases
        assert_eq!(c.len(), 4 + 6);
        c.iqft(&a).unwrap();
        assert_eq!(c.len(), 20);

        let forward = &c.instructions()[..10];
        let backward = &c.instructions()[10..];
        for (f, b) in forward.iter().zip(backward.iter().rev()) {
            assert_eq!(f.inverse().as_ref(), Some(b));
        }
        assert_eq!(c.gate_counts().get("cp"), Some(&12));
    }

    #[test]
    fn test_identity_phase_is_dropped() {
        let mut c = Circuit::new("t");
        let a = c.allocate_register("a", 2);
        c.apply_controlled_phase(2.0 * PI, &[a.qubits[0]], a.qubits[1])
            .unwrap();
        assert!(c.is_empty());
        c.apply_controlled_phase(PI, &[a.qubits[0]], a.qubits[1])
            .unwrap();
        assert_eq!(c.depth(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut c = Circuit::new("t");
        let a = c.allocate_register("a", 2);
        c.qft(&a).unwrap();
        c.measure(&a).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
