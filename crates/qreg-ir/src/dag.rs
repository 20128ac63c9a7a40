//! Dependency DAG over a register-versioned instruction list.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::error::{IrError, IrResult};
use crate::expr::Expr;
use crate::operation::{OpKind, Operation};
use crate::register::Slot;

/// Node index type for the DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the dependency DAG: one operation at one program position.
#[derive(Debug, Clone)]
pub struct DagNode {
    /// Position in the instruction list.
    pub position: usize,
    /// The operation.
    pub op: Operation,
}

/// An operand→consumer edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagEdge {
    /// The slot carried along the edge.
    pub slot: Slot,
    /// Index of the operand in the consumer's [`Operation::operands`].
    pub operand: usize,
}

/// Data-dependency DAG of one function body.
///
/// Each operand is linked to the most recent earlier operation producing
/// its slot. Operands with no such producer are recorded as dangling and
/// reported by [`DependencyDag::verify_integrity`].
///
/// The DAG is a read-only view: rewrites build a new instruction list and a
/// new DAG from it.
#[derive(Debug, Clone)]
pub struct DependencyDag {
    graph: DiGraph<DagNode, DagEdge>,
    nodes: Vec<NodeIndex>,
    producers: Vec<Vec<Option<usize>>>,
}

impl DependencyDag {
    /// Build the DAG for an instruction list.
    pub fn build(ops: &[Operation]) -> Self {
        let mut graph = DiGraph::with_capacity(ops.len(), ops.len() * 2);
        let mut nodes = Vec::with_capacity(ops.len());
        let mut producers = Vec::with_capacity(ops.len());
        let mut latest: FxHashMap<Slot, usize> = FxHashMap::default();

        for (position, op) in ops.iter().enumerate() {
            let node = graph.add_node(DagNode {
                position,
                op: op.clone(),
            });
            nodes.push(node);

            let mut operand_producers = Vec::new();
            for (operand, value) in op.operands().iter().enumerate() {
                let producer = latest.get(&value.slot).copied();
                if let Some(p) = producer {
                    graph.add_edge(
                        nodes[p],
                        node,
                        DagEdge {
                            slot: value.slot,
                            operand,
                        },
                    );
                }
                operand_producers.push(producer);
            }
            producers.push(operand_producers);

            if let Some(result) = op.result() {
                latest.insert(result.slot, position);
            }
        }

        Self {
            graph,
            nodes,
            producers,
        }
    }

    /// Number of operations.
    pub fn num_ops(&self) -> usize {
        self.nodes.len()
    }

    /// The operation at a program position.
    pub fn operation(&self, position: usize) -> Option<&Operation> {
        self.nodes.get(position).map(|&n| &self.graph[n].op)
    }

    /// Producer position of each operand of the operation at `position`.
    pub fn operand_producers(&self, position: usize) -> &[Option<usize>] {
        self.producers.get(position).map_or(&[], Vec::as_slice)
    }

    /// Positions of operations reading the value produced at `position`.
    pub fn consumers(&self, position: usize) -> Vec<usize> {
        let Some(&node) = self.nodes.get(position) else {
            return vec![];
        };
        let mut consumers: Vec<usize> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| self.graph[e.target()].position)
            .collect();
        consumers.sort_unstable();
        consumers.dedup();
        consumers
    }

    /// Operation positions in a topological order of the dependency graph.
    pub fn topological_order(&self) -> IrResult<Vec<usize>> {
        petgraph::algo::toposort(&self.graph, None)
            .map(|sorted| sorted.into_iter().map(|n| self.graph[n].position).collect())
            .map_err(|_| IrError::InvalidDag("dependency graph contains a cycle".into()))
    }

    /// Length of the longest dependency chain.
    pub fn depth(&self) -> usize {
        let mut level = vec![0usize; self.nodes.len()];
        for position in 0..self.nodes.len() {
            let below = self.producers[position]
                .iter()
                .flatten()
                .map(|&p| level[p])
                .max()
                .unwrap_or(0);
            level[position] = below + 1;
        }
        level.into_iter().max().unwrap_or(0)
    }

    /// Check the DAG is well formed.
    ///
    /// Every operand must have an earlier producer, every edge must point
    /// forward in program order, and the graph must be acyclic.
    pub fn verify_integrity(&self) -> IrResult<()> {
        for (position, producers) in self.producers.iter().enumerate() {
            let op = &self.graph[self.nodes[position]].op;
            for (value, producer) in op.operands().iter().zip(producers) {
                if producer.is_none() {
                    return Err(IrError::UndefinedSlot(value.slot));
                }
            }
        }

        for edge in self.graph.edge_references() {
            let from = self.graph[edge.source()].position;
            let to = self.graph[edge.target()].position;
            if from >= to {
                return Err(IrError::InvalidDag(format!(
                    "edge for {} runs backwards from position {from} to {to}",
                    edge.weight().slot
                )));
            }
        }

        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("dependency graph contains a cycle".into()));
        }
        Ok(())
    }

    /// Defining expression of the value produced at `position`.
    ///
    /// `Duplicate` is transparent: a copy has the defining expression of its
    /// source.
    pub fn defining_expr(&self, position: usize) -> IrResult<Rc<Expr>> {
        let mut memo = FxHashMap::default();
        self.expr_at(position, &mut memo)
    }

    fn expr_at(
        &self,
        position: usize,
        memo: &mut FxHashMap<usize, Rc<Expr>>,
    ) -> IrResult<Rc<Expr>> {
        if let Some(expr) = memo.get(&position) {
            return Ok(expr.clone());
        }
        let op = self
            .operation(position)
            .ok_or_else(|| IrError::InvalidDag(format!("no operation at position {position}")))?;

        let expr = match op.kind() {
            OpKind::Init { value } => {
                let result = op
                    .result()
                    .ok_or_else(|| IrError::structural("init", "missing result value"))?;
                Expr::constant(*value, result.width)
            }
            OpKind::Duplicate { .. } => self.operand_expr(position, 0, memo)?,
            OpKind::Binary { op, control, .. } => Rc::new(Expr::Binary {
                op: *op,
                lhs: self.operand_expr(position, 0, memo)?,
                rhs: self.operand_expr(position, 1, memo)?,
                control: match control {
                    Some(_) => Some(self.operand_expr(position, 2, memo)?),
                    None => None,
                },
            }),
            OpKind::BinaryImm {
                op, imm, control, ..
            } => Rc::new(Expr::BinaryImm {
                op: *op,
                lhs: self.operand_expr(position, 0, memo)?,
                imm: *imm,
                control: match control {
                    Some(_) => Some(self.operand_expr(position, 1, memo)?),
                    None => None,
                },
            }),
            OpKind::Compare { predicate, .. } => Rc::new(Expr::Compare {
                predicate: *predicate,
                lhs: self.operand_expr(position, 0, memo)?,
                rhs: self.operand_expr(position, 1, memo)?,
            }),
            OpKind::And { .. } => Rc::new(Expr::And(
                self.operand_expr(position, 0, memo)?,
                self.operand_expr(position, 1, memo)?,
            )),
            OpKind::Not { .. } => Rc::new(Expr::Not(self.operand_expr(position, 0, memo)?)),
            OpKind::Return { .. } => {
                return Err(IrError::InvalidDag(format!(
                    "return at position {position} defines no value"
                )));
            }
        };

        memo.insert(position, expr.clone());
        Ok(expr)
    }

    fn operand_expr(
        &self,
        position: usize,
        operand: usize,
        memo: &mut FxHashMap<usize, Rc<Expr>>,
    ) -> IrResult<Rc<Expr>> {
        match self.operand_producers(position).get(operand).copied().flatten() {
            Some(producer) => self.expr_at(producer, memo),
            None => {
                let slot = self
                    .operation(position)
                    .and_then(|op| op.operands().get(operand).map(|v| v.slot));
                Err(match slot {
                    Some(slot) => IrError::UndefinedSlot(slot),
                    None => IrError::InvalidDag(format!(
                        "operation at position {position} has no operand {operand}"
                    )),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{BinaryOpcode, Predicate};
    use crate::register::{RegisterId, Value};
    use crate::width::BitWidth;

    fn w4() -> BitWidth {
        BitWidth::new(4).unwrap()
    }

    fn val(reg: u32, ver: u32) -> Value {
        Value::new(Slot::new(RegisterId(reg), ver), w4())
    }

    fn sample() -> Vec<Operation> {
        vec![
            Operation::init(val(0, 0), 3).unwrap(),
            Operation::init(val(1, 0), -2).unwrap(),
            Operation::binary(BinaryOpcode::Add, val(0, 1), val(0, 0), val(1, 0), None).unwrap(),
            Operation::compare(
                Predicate::Lt,
                Value::new(Slot::new(RegisterId(2), 0), BitWidth::BOOL),
                val(0, 1),
                val(1, 0),
            )
            .unwrap(),
            Operation::ret(Some(val(0, 1))),
        ]
    }

    #[test]
    fn test_edges_follow_operands() {
        let dag = DependencyDag::build(&sample());
        assert_eq!(dag.num_ops(), 5);
        assert_eq!(dag.operand_producers(2), &[Some(0), Some(1)]);
        assert_eq!(dag.consumers(1), vec![2, 3]);
        assert_eq!(dag.consumers(2), vec![3, 4]);
        assert!(dag.verify_integrity().is_ok());
        assert_eq!(dag.depth(), 3);
    }

    #[test]
    fn test_topological_order_respects_dependencies() {
        let dag = DependencyDag::build(&sample());
        let order = dag.topological_order().unwrap();
        let pos = |p: usize| order.iter().position(|&x| x == p).unwrap();
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(2));
        assert!(pos(2) < pos(4));
    }

    #[test]
    fn test_dangling_operand() {
        let ops = vec![Operation::ret(Some(val(7, 0)))];
        let dag = DependencyDag::build(&ops);
        assert_eq!(dag.operand_producers(0), &[None]);
        assert!(matches!(
            dag.verify_integrity(),
            Err(IrError::UndefinedSlot(_))
        ));
    }

    #[test]
    fn test_defining_expr() {
        let dag = DependencyDag::build(&sample());
        let expr = dag.defining_expr(2).unwrap();
        assert_eq!(expr.evaluate(), Some(1));
        let cmp = dag.defining_expr(3).unwrap();
        assert_eq!(cmp.evaluate(), Some(0));
        assert!(dag.defining_expr(4).is_err());
    }
}
