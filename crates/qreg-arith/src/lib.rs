//! Qreg Arithmetic Circuit Backend
//!
//! This crate realises register-versioned IR as a gate-level circuit of
//! Fourier-space (phase rotation) arithmetic, and runs such circuits on a
//! sparse statevector simulator.
//!
//! # Overview
//!
//! Registers hold little-endian two's-complement integers. Addition and
//! subtraction act in place on the destination register between a QFT and
//! its inverse; multiplication and division write fresh registers. Every
//! primitive accepts control qubits.
//!
//! # Core Components
//!
//! - **Circuit**: [`Circuit`], [`Instruction`], [`Gate`] and register types
//! - **Primitives**: the [`arith`] module (add, sub, multiply, divide,
//!   compare, logical connectives, copy)
//! - **Lowering**: [`CircuitLowering`] from a `QuantumFunction`
//! - **Simulation**: [`Simulator`] over a [`SparseStatevector`]
//!
//! # Example: Controlled Addition
//!
//! ```rust
//! use qreg_arith::{Circuit, Simulator, arith};
//!
//! let mut circuit = Circuit::new("cadd");
//! let a = circuit.allocate_register("a", 4);
//! let b = circuit.allocate_register("b", 4);
//! let flag = circuit.allocate_qubit("flag");
//! circuit.load_bits(&a, &[true, false, true, false]).unwrap(); // 5
//! circuit.load_bits(&b, &[false, true, false, false]).unwrap(); // 2
//!
//! // flag is |0⟩, so a stays 5.
//! arith::add(&mut circuit, &a, &b, &[flag]).unwrap();
//! let out = circuit.measure(&a).unwrap();
//!
//! let outcome = Simulator::new().run(&circuit).unwrap();
//! assert_eq!(outcome.read_signed(&out), 5);
//! ```

pub mod arith;
pub mod circuit;
pub mod encoding;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod lower;
pub mod qubit;
pub mod simulator;

pub use arith::Division;
pub use circuit::Circuit;
pub use encoding::{decode_twos_complement, decode_unsigned, encode_twos_complement};
pub use error::{ArithError, ArithResult};
pub use gate::Gate;
pub use instruction::{Instruction, InstructionKind};
pub use lower::{CircuitLowering, LoweredCircuit};
pub use qubit::{ClassicalRegister, ClbitId, QuantumRegister, QubitId};
pub use simulator::{
    MAX_SIMULATED_QUBITS, MeasurementMode, SimulationOutcome, Simulator, SparseStatevector,
};
