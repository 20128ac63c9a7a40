//! Qreg Register-Versioned Intermediate Representation
//!
//! This crate provides the data structures shared by the qreg compiler: the
//! classical arithmetic IR it consumes, and the register-versioned IR it
//! produces for reversible (quantum) arithmetic.
//!
//! # Overview
//!
//! In the register-versioned IR every value lives in a numbered register at
//! a specific version. Arithmetic overwrites its left operand in place and
//! bumps the version; literals, copies, comparisons and boolean connectives
//! open fresh registers. These rules model two physical constraints of
//! reversible hardware:
//!
//! - **Write-in-place**: a register's state is transformed, never copied out.
//! - **No-cloning**: a register version cannot be read as both operands of
//!   one operation without an explicit duplicate.
//!
//! # Core Components
//!
//! - **Widths and ids**: [`BitWidth`], [`RegisterId`], [`Slot`], [`Value`]
//! - **Operations**: [`Operation`] with its closed [`OpKind`] variants
//! - **Expressions**: [`Expr`], the defining expression of a value, used to
//!   regenerate it after its register has been overwritten
//! - **Functions**: [`QuantumFunction`], an ordered instruction list
//! - **DAG**: [`DependencyDag`], operand→consumer edges over a function
//! - **Classical input**: [`ClassicalFunction`] and [`FunctionBuilder`]
//!
//! # Example: An In-Place Addition
//!
//! ```rust
//! use qreg_ir::{BinaryOpcode, BitWidth, Operation, QuantumFunction, RegisterId, Slot, Value};
//!
//! let w = BitWidth::new(4).unwrap();
//! let a = Value::new(Slot::new(RegisterId(0), 0), w);
//! let b = Value::new(Slot::new(RegisterId(1), 0), w);
//!
//! let mut func = QuantumFunction::new("add", w);
//! func.push(Operation::init(a, 3).unwrap());
//! func.push(Operation::init(b, -2).unwrap());
//! func.push(Operation::binary(BinaryOpcode::Add, a.next_version(), a, b, None).unwrap());
//!
//! // Writing the sum into b's register breaks write-in-place.
//! assert!(Operation::binary(BinaryOpcode::Add, b.next_version(), a, b, None).is_err());
//! ```

pub mod classical;
pub mod dag;
pub mod error;
pub mod expr;
pub mod function;
pub mod operation;
pub mod register;
pub mod width;

pub use classical::{
    ArithOp, BlockId, ClassicalBlock, ClassicalFunction, ClassicalOp, FunctionBuilder, LogicalOp,
    SsaValue,
};
pub use dag::{DagEdge, DagNode, DependencyDag, NodeIndex};
pub use error::{IrError, IrResult};
pub use expr::Expr;
pub use function::QuantumFunction;
pub use operation::{BinaryOpcode, OpKind, Operation, Predicate};
pub use register::{RegisterId, Slot, Value};
pub use width::{BitWidth, MAX_BIT_WIDTH, MIN_INTEGER_BIT_WIDTH};
