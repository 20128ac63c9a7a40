//! Circuit instructions combining gates with operands.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::Gate;
use crate::qubit::{ClbitId, QubitId};

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A gate applied when every control qubit is `|1⟩`.
    Gate {
        /// The target operation.
        gate: Gate,
        /// Control qubits (empty for an uncontrolled gate).
        controls: Vec<QubitId>,
    },
    /// Measurement in the computational basis.
    Measure,
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Target qubits.
    pub qubits: Vec<QubitId>,
    /// Classical bits written (for measure).
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(
        gate: Gate,
        controls: impl IntoIterator<Item = QubitId>,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Self {
            kind: InstructionKind::Gate {
                gate,
                controls: controls.into_iter().collect(),
            },
            qubits: targets.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate { .. })
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Control qubits (empty for measurements).
    pub fn controls(&self) -> &[QubitId] {
        match &self.kind {
            InstructionKind::Gate { controls, .. } => controls,
            InstructionKind::Measure => &[],
        }
    }

    /// Controls followed by targets.
    pub fn all_qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.controls().iter().chain(&self.qubits).copied()
    }

    /// Mnemonic, with one `c` per control up to two and `mc` beyond
    /// (`x`, `cx`, `ccx`, `mcx`, `cp`, `mcp`, ...).
    pub fn name(&self) -> String {
        match &self.kind {
            InstructionKind::Gate { gate, controls } => match controls.len() {
                0 => gate.name().to_string(),
                1 => format!("c{}", gate.name()),
                2 => format!("cc{}", gate.name()),
                _ => format!("mc{}", gate.name()),
            },
            InstructionKind::Measure => "measure".to_string(),
        }
    }

    /// The instruction undoing this one, or `None` for a measurement.
    pub fn inverse(&self) -> Option<Instruction> {
        match &self.kind {
            InstructionKind::Gate { gate, controls } => Some(Instruction {
                kind: InstructionKind::Gate {
                    gate: gate.inverse(),
                    controls: controls.clone(),
                },
                qubits: self.qubits.clone(),
                clbits: vec![],
            }),
            InstructionKind::Measure => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        if let InstructionKind::Gate {
            gate: Gate::Phase(theta),
            ..
        } = self.kind
        {
            write!(f, "({theta:.6})")?;
        }
        let qubits: Vec<String> = self.all_qubits().map(|q| q.to_string()).collect();
        write!(f, " {}", qubits.join(", "))?;
        if let Some(c) = self.clbits.first() {
            write!(f, " -> {c}")?;
        }
        Ok(())
    }
}
