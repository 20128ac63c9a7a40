//! Sparse statevector simulation of arithmetic circuits.
//!
//! Arithmetic circuits keep almost every qubit in a basis state; only the
//! register inside a Fourier transform is in superposition. The state is
//! therefore stored as a map from basis index to amplitude, and amplitudes
//! that cancel are pruned after every gate.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::f64::consts::FRAC_1_SQRT_2;
use tracing::{debug, instrument, trace};

use crate::circuit::Circuit;
use crate::encoding::{decode_twos_complement, decode_unsigned};
use crate::error::{ArithError, ArithResult};
use crate::gate::Gate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClassicalRegister, QubitId};

/// Largest circuit the simulator accepts (one bit of a `u128` per qubit).
pub const MAX_SIMULATED_QUBITS: u32 = 128;

/// Amplitudes with a smaller squared norm are dropped.
const PRUNE_THRESHOLD: f64 = 1e-14;

fn mask(qubit: QubitId) -> u128 {
    1u128 << qubit.0
}

fn mask_of(qubits: &[QubitId]) -> u128 {
    qubits.iter().fold(0, |m, &q| m | mask(q))
}

/// A quantum state stored as its nonzero amplitudes.
#[derive(Debug, Clone)]
pub struct SparseStatevector {
    amplitudes: FxHashMap<u128, Complex64>,
    num_qubits: u32,
}

impl SparseStatevector {
    /// `|0…0⟩` over `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> ArithResult<Self> {
        if num_qubits > MAX_SIMULATED_QUBITS {
            return Err(ArithError::TooManyQubits {
                requested: num_qubits,
                max: MAX_SIMULATED_QUBITS,
            });
        }
        let mut amplitudes = FxHashMap::default();
        amplitudes.insert(0, Complex64::new(1.0, 0.0));
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of stored (nonzero) amplitudes.
    pub fn num_nonzero(&self) -> usize {
        self.amplitudes.len()
    }

    /// Amplitude of a basis state.
    pub fn amplitude(&self, basis: u128) -> Complex64 {
        self.amplitudes
            .get(&basis)
            .copied()
            .unwrap_or_else(|| Complex64::new(0.0, 0.0))
    }

    /// Total probability (1 up to rounding).
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.values().map(Complex64::norm_sqr).sum()
    }

    /// Probability of reading 1 on `qubit`.
    pub fn probability_of_one(&self, qubit: QubitId) -> f64 {
        let m = mask(qubit);
        self.amplitudes
            .iter()
            .filter(|(basis, _)| *basis & m != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// The basis state with the largest probability.
    pub fn most_likely(&self) -> Option<(u128, f64)> {
        self.amplitudes
            .iter()
            .map(|(&basis, a)| (basis, a.norm_sqr()))
            .max_by(|x, y| x.1.total_cmp(&y.1))
    }

    /// Apply a gate instruction. Measurements are ignored.
    pub fn apply(&mut self, instruction: &Instruction) -> ArithResult<()> {
        match &instruction.kind {
            InstructionKind::Gate { gate, controls } => {
                self.apply_gate(*gate, controls, &instruction.qubits)
            }
            InstructionKind::Measure => Ok(()),
        }
    }

    /// Apply `gate` to `targets` on every basis state where all `controls` are 1.
    ///
    /// # Errors
    ///
    /// `TargetCountMismatch` when `targets` does not match the gate's arity.
    pub fn apply_gate(
        &mut self,
        gate: Gate,
        controls: &[QubitId],
        targets: &[QubitId],
    ) -> ArithResult<()> {
        let cmask = mask_of(controls);
        let active = |basis: u128| basis & cmask == cmask;
        match (gate, targets) {
            (Gate::X, [t]) => {
                let m = mask(*t);
                self.permute(|b| if active(b) { b ^ m } else { b });
            }
            (Gate::Swap, [t1, t2]) => {
                let (m1, m2) = (mask(*t1), mask(*t2));
                self.permute(|b| {
                    if active(b) && ((b & m1 != 0) != (b & m2 != 0)) {
                        b ^ (m1 | m2)
                    } else {
                        b
                    }
                });
            }
            (Gate::Phase(theta), [t]) => {
                let m = cmask | mask(*t);
                let phase = Complex64::from_polar(1.0, theta);
                for (_, amp) in self.amplitudes.iter_mut().filter(|(b, _)| **b & m == m) {
                    *amp *= phase;
                }
            }
            (Gate::H, [t]) => {
                let m = mask(*t);
                let mut next: FxHashMap<u128, Complex64> = FxHashMap::default();
                for (&basis, &amp) in &self.amplitudes {
                    if !active(basis) {
                        *next.entry(basis).or_default() += amp;
                        continue;
                    }
                    let scaled = amp * FRAC_1_SQRT_2;
                    let upper = if basis & m == 0 { scaled } else { -scaled };
                    *next.entry(basis & !m).or_default() += scaled;
                    *next.entry(basis | m).or_default() += upper;
                }
                next.retain(|_, a| a.norm_sqr() >= PRUNE_THRESHOLD);
                self.amplitudes = next;
            }
            _ => {
                return Err(ArithError::TargetCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_targets(),
                    got: targets.len(),
                });
            }
        }
        Ok(())
    }

    /// Project `qubit` onto `outcome` and renormalise. Returns the
    /// probability the outcome had.
    pub fn collapse(&mut self, qubit: QubitId, outcome: bool) -> f64 {
        let m = mask(qubit);
        self.amplitudes.retain(|b, _| (*b & m != 0) == outcome);
        let p = self.norm_sqr();
        if p > 0.0 {
            let scale = 1.0 / p.sqrt();
            for amp in self.amplitudes.values_mut() {
                *amp *= scale;
            }
        }
        p
    }

    fn permute(&mut self, f: impl Fn(u128) -> u128) {
        self.amplitudes = self
            .amplitudes
            .drain()
            .map(|(basis, amp)| (f(basis), amp))
            .collect();
    }
}

/// How measurements pick an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementMode {
    /// Always take the more likely outcome. Arithmetic circuits end in basis
    /// states, so this reads the exact result without sampling noise.
    MostLikely,
    /// Sample from the Born distribution with a seeded generator.
    Sampled {
        /// Generator seed.
        seed: u64,
    },
}

/// Measured classical bits of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    clbits: Vec<bool>,
}

impl SimulationOutcome {
    /// All classical bits, indexed by `ClbitId`.
    pub fn clbits(&self) -> &[bool] {
        &self.clbits
    }

    /// Bits of `register`, least significant first.
    pub fn bits(&self, register: &ClassicalRegister) -> Vec<bool> {
        register
            .clbits
            .iter()
            .map(|c| self.clbits.get(c.0 as usize).copied().unwrap_or(false))
            .collect()
    }

    /// Unsigned value of `register`.
    pub fn read(&self, register: &ClassicalRegister) -> u64 {
        decode_unsigned(&self.bits(register))
    }

    /// Two's-complement value of `register`.
    pub fn read_signed(&self, register: &ClassicalRegister) -> i64 {
        decode_twos_complement(&self.bits(register))
    }
}

/// Runs circuits on a [`SparseStatevector`].
///
/// # Example
///
/// ```
/// use qreg_arith::{Circuit, Simulator, arith};
///
/// let mut c = Circuit::new("sum");
/// let a = c.allocate_register("a", 4);
/// let b = c.allocate_register("b", 4);
/// arith::add_imm(&mut c, &a, 3, &[]).unwrap();
/// arith::sub_imm(&mut c, &b, 2, &[]).unwrap();
/// arith::add(&mut c, &a, &b, &[]).unwrap();
/// let out = c.measure(&a).unwrap();
///
/// let outcome = Simulator::new().run(&c).unwrap();
/// assert_eq!(outcome.read_signed(&out), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    mode: MeasurementMode,
}

impl Simulator {
    /// Simulator reading the most likely outcome of every measurement.
    pub fn new() -> Self {
        Self {
            mode: MeasurementMode::MostLikely,
        }
    }

    /// Simulator sampling measurements with a seeded generator.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            mode: MeasurementMode::Sampled { seed },
        }
    }

    /// The measurement mode.
    pub fn mode(&self) -> MeasurementMode {
        self.mode
    }

    /// Run `circuit` from `|0…0⟩`.
    #[instrument(skip(self, circuit), fields(circuit = %circuit.name()))]
    pub fn run(&self, circuit: &Circuit) -> ArithResult<SimulationOutcome> {
        let (outcome, _) = self.run_with_state(circuit)?;
        Ok(outcome)
    }

    /// Run `circuit` and also return the final (post-measurement) state.
    pub fn run_with_state(
        &self,
        circuit: &Circuit,
    ) -> ArithResult<(SimulationOutcome, SparseStatevector)> {
        let mut state = SparseStatevector::new(circuit.num_qubits())?;
        let mut rng = match self.mode {
            MeasurementMode::Sampled { seed } => Some(StdRng::seed_from_u64(seed)),
            MeasurementMode::MostLikely => None,
        };
        let mut clbits = vec![false; circuit.num_clbits() as usize];
        let mut peak = 1;

        debug!(
            "Starting simulation: {} qubits, {} instructions",
            circuit.num_qubits(),
            circuit.len()
        );

        for instruction in circuit.instructions() {
            match &instruction.kind {
                InstructionKind::Gate { .. } => {
                    state.apply(instruction)?;
                    peak = peak.max(state.num_nonzero());
                }
                InstructionKind::Measure => {
                    for (qubit, clbit) in instruction.qubits.iter().zip(&instruction.clbits) {
                        let p1 = state.probability_of_one(*qubit);
                        let bit = match rng.as_mut() {
                            Some(rng) => rng.gen_bool(p1.clamp(0.0, 1.0)),
                            None => p1 > 0.5,
                        };
                        state.collapse(*qubit, bit);
                        trace!("measure {} -> {} (p1 = {:.6})", qubit, bit, p1);
                        if let Some(slot) = clbits.get_mut(clbit.0 as usize) {
                            *slot = bit;
                        }
                    }
                }
            }
        }

        debug!("Simulation completed, peak of {} amplitudes", peak);
        Ok((SimulationOutcome { clbits }, state))
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_hadamard_pair_cancels() {
        let mut sv = SparseStatevector::new(2).unwrap();
        sv.apply_gate(Gate::H, &[], &[QubitId(0)]).unwrap();
        assert_eq!(sv.num_nonzero(), 2);
        assert!((sv.probability_of_one(QubitId(0)) - 0.5).abs() < 1e-12);
        sv.apply_gate(Gate::H, &[], &[QubitId(0)]).unwrap();
        assert_eq!(sv.num_nonzero(), 1);
        assert!((sv.amplitude(0).re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_controlled_gates() {
        let mut sv = SparseStatevector::new(3).unwrap();
        sv.apply_gate(Gate::X, &[], &[QubitId(0)]).unwrap();
        sv.apply_gate(Gate::X, &[QubitId(0)], &[QubitId(1)]).unwrap();
        sv.apply_gate(Gate::X, &[QubitId(0), QubitId(2)], &[QubitId(1)]).unwrap();
        assert_eq!(sv.most_likely().map(|(b, _)| b), Some(0b011));

        sv.apply_gate(Gate::Swap, &[], &[QubitId(0), QubitId(2)]).unwrap();
        assert_eq!(sv.most_likely().map(|(b, _)| b), Some(0b110));

        sv.apply_gate(Gate::Phase(PI), &[QubitId(1)], &[QubitId(2)]).unwrap();
        assert!((sv.amplitude(0b110).re + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_target_count_is_an_error() {
        let mut sv = SparseStatevector::new(3).unwrap();
        let err = sv
            .apply_gate(Gate::Swap, &[], &[QubitId(0)])
            .unwrap_err();
        assert!(matches!(
            err,
            ArithError::TargetCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
        assert!(matches!(
            sv.apply_gate(Gate::X, &[QubitId(2)], &[QubitId(0), QubitId(1)]),
            Err(ArithError::TargetCountMismatch { expected: 1, got: 2, .. })
        ));
        assert_eq!(sv.most_likely().map(|(b, _)| b), Some(0));
    }

    #[test]
    fn test_too_many_qubits() {
        assert!(matches!(
            SparseStatevector::new(129),
            Err(ArithError::TooManyQubits { requested: 129, .. })
        ));
        assert!(SparseStatevector::new(128).is_ok());
    }

    #[test]
    fn test_sampled_measurement_is_reproducible() {
        let mut c = Circuit::new("coin");
        let q = c.allocate_register("q", 8);
        for qubit in q.iter() {
            c.apply_h(qubit).unwrap();
        }
        let bits = c.measure(&q).unwrap();

        let first = Simulator::with_seed(7).run(&c).unwrap();
        let second = Simulator::with_seed(7).run(&c).unwrap();
        assert_eq!(first.read(&bits), second.read(&bits));

        let (_, state) = Simulator::with_seed(7).run_with_state(&c).unwrap();
        assert_eq!(state.num_nonzero(), 1);
        assert!((state.norm_sqr() - 1.0).abs() < 1e-9);
    }
}
