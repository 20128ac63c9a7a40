//! Defining expressions.
//!
//! Every value the translator produces records how it was computed, so a
//! value whose register has since been overwritten can be regenerated into
//! fresh registers. Predicated operations record their control expression:
//! regenerating `x += y if c` must reproduce `c ? x + y : x`, not `x + y`.

use std::rc::Rc;

use crate::operation::{BinaryOpcode, Predicate};
use crate::width::BitWidth;

/// A closed recursive description of how a value is computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal.
    Const {
        /// The literal.
        value: i64,
        /// Register width.
        width: BitWidth,
    },
    /// `lhs op rhs`, or `lhs` when `control` is false.
    Binary {
        /// Opcode.
        op: BinaryOpcode,
        /// Left operand.
        lhs: Rc<Expr>,
        /// Right operand.
        rhs: Rc<Expr>,
        /// Optional predicate.
        control: Option<Rc<Expr>>,
    },
    /// `lhs op imm`, or `lhs` when `control` is false.
    BinaryImm {
        /// Opcode.
        op: BinaryOpcode,
        /// Left operand.
        lhs: Rc<Expr>,
        /// Immediate.
        imm: i64,
        /// Optional predicate.
        control: Option<Rc<Expr>>,
    },
    /// Boolean comparison.
    Compare {
        /// Predicate.
        predicate: Predicate,
        /// Left operand.
        lhs: Rc<Expr>,
        /// Right operand.
        rhs: Rc<Expr>,
    },
    /// Boolean conjunction.
    And(Rc<Expr>, Rc<Expr>),
    /// Boolean negation.
    Not(Rc<Expr>),
    /// `cond ? if_true : if_false`.
    Select {
        /// Boolean selector.
        cond: Rc<Expr>,
        /// Value when `cond` holds.
        if_true: Rc<Expr>,
        /// Value otherwise.
        if_false: Rc<Expr>,
    },
}

impl Expr {
    /// Shared literal node.
    pub fn constant(value: i64, width: BitWidth) -> Rc<Expr> {
        Rc::new(Expr::Const { value, width })
    }

    /// Width of the value this expression produces.
    pub fn width(&self) -> BitWidth {
        match self {
            Expr::Const { width, .. } => *width,
            Expr::Binary { lhs, .. } | Expr::BinaryImm { lhs, .. } => lhs.width(),
            Expr::Compare { .. } | Expr::And(..) | Expr::Not(_) => BitWidth::BOOL,
            Expr::Select { if_true, .. } => if_true.width(),
        }
    }

    /// Number of nodes, counting shared subtrees once per reference.
    pub fn size(&self) -> usize {
        match self {
            Expr::Const { .. } => 1,
            Expr::Binary {
                lhs, rhs, control, ..
            } => 1 + lhs.size() + rhs.size() + control.as_ref().map_or(0, |c| c.size()),
            Expr::BinaryImm { lhs, control, .. } => {
                1 + lhs.size() + control.as_ref().map_or(0, |c| c.size())
            }
            Expr::Compare { lhs, rhs, .. } | Expr::And(lhs, rhs) => 1 + lhs.size() + rhs.size(),
            Expr::Not(operand) => 1 + operand.size(),
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => 1 + cond.size() + if_true.size() + if_false.size(),
        }
    }

    /// Classical reference value.
    ///
    /// Integers wrap to their width; booleans evaluate to 0 or 1. Returns
    /// `None` if a division by zero occurs anywhere in the tree.
    pub fn evaluate(&self) -> Option<i64> {
        let truth = |e: &Expr| e.evaluate().map(|v| v != 0);
        match self {
            Expr::Const { value, width } => Some(width.wrap(*value)),
            Expr::Binary {
                op,
                lhs,
                rhs,
                control,
            } => {
                let l = lhs.evaluate()?;
                let r = rhs.evaluate()?;
                if let Some(c) = control {
                    if !truth(c)? {
                        return Some(l);
                    }
                }
                op.evaluate(l, r, lhs.width())
            }
            Expr::BinaryImm {
                op,
                lhs,
                imm,
                control,
            } => {
                let l = lhs.evaluate()?;
                if let Some(c) = control {
                    if !truth(c)? {
                        return Some(l);
                    }
                }
                op.evaluate(l, *imm, lhs.width())
            }
            Expr::Compare {
                predicate,
                lhs,
                rhs,
            } => Some(i64::from(predicate.evaluate(lhs.evaluate()?, rhs.evaluate()?))),
            Expr::And(lhs, rhs) => Some(i64::from(truth(lhs)? && truth(rhs)?)),
            Expr::Not(operand) => Some(i64::from(!truth(operand)?)),
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => {
                let t = if_true.evaluate()?;
                let f = if_false.evaluate()?;
                Some(if truth(cond)? { t } else { f })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w4() -> BitWidth {
        BitWidth::new(4).unwrap()
    }

    #[test]
    fn test_evaluate_arithmetic() {
        let e = Expr::Binary {
            op: BinaryOpcode::Add,
            lhs: Expr::constant(3, w4()),
            rhs: Expr::constant(-2, w4()),
            control: None,
        };
        assert_eq!(e.evaluate(), Some(1));
        assert_eq!(e.width(), w4());
        assert_eq!(e.size(), 3);
    }

    #[test]
    fn test_evaluate_controlled_keeps_lhs() {
        let never = Rc::new(Expr::Compare {
            predicate: Predicate::Lt,
            lhs: Expr::constant(5, w4()),
            rhs: Expr::constant(1, w4()),
        });
        let e = Expr::BinaryImm {
            op: BinaryOpcode::Mul,
            lhs: Expr::constant(3, w4()),
            imm: 2,
            control: Some(never.clone()),
        };
        assert_eq!(e.evaluate(), Some(3));

        let always = Rc::new(Expr::Not(never));
        let e = Expr::BinaryImm {
            op: BinaryOpcode::Mul,
            lhs: Expr::constant(3, w4()),
            imm: 2,
            control: Some(always),
        };
        assert_eq!(e.evaluate(), Some(6));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        let e = Expr::BinaryImm {
            op: BinaryOpcode::Div,
            lhs: Expr::constant(3, w4()),
            imm: 0,
            control: None,
        };
        assert_eq!(e.evaluate(), None);
    }

    #[test]
    fn test_select() {
        let cond = Rc::new(Expr::Compare {
            predicate: Predicate::Eq,
            lhs: Expr::constant(2, w4()),
            rhs: Expr::constant(2, w4()),
        });
        let e = Expr::Select {
            cond,
            if_true: Expr::constant(-4, w4()),
            if_false: Expr::constant(6, w4()),
        };
        assert_eq!(e.evaluate(), Some(-4));
        assert_eq!(e.width(), w4());
    }
}
