//! Property-based tests for widths, operations and the dependency DAG.

use proptest::prelude::*;
use qreg_ir::{
    BinaryOpcode, BitWidth, DependencyDag, Operation, QuantumFunction, RegisterId, Slot, Value,
};

fn arb_width() -> impl Strategy<Value = BitWidth> {
    (1_u32..=16).prop_map(|bits| BitWidth::new(bits).unwrap())
}

fn arb_opcode() -> impl Strategy<Value = BinaryOpcode> {
    prop_oneof![
        Just(BinaryOpcode::Add),
        Just(BinaryOpcode::Sub),
        Just(BinaryOpcode::Mul),
    ]
}

/// A chain of in-place updates over `regs` registers, each reading a
/// different register as its right operand.
fn arb_chain() -> impl Strategy<Value = (BitWidth, Vec<(usize, usize, BinaryOpcode)>)> {
    (2_usize..=4).prop_flat_map(|regs| {
        (
            arb_width(),
            prop::collection::vec((0..regs, 1..regs, arb_opcode()), 1..=12).prop_map(
                move |steps| {
                    steps
                        .into_iter()
                        .map(|(dst, offset, op)| (dst, (dst + offset) % regs, op))
                        .collect()
                },
            ),
        )
    })
}

fn build_chain(width: BitWidth, steps: &[(usize, usize, BinaryOpcode)]) -> QuantumFunction {
    let regs = steps.iter().map(|&(d, s, _)| d.max(s)).max().unwrap_or(0) + 1;
    let mut func = QuantumFunction::new("chain", width);
    let mut current: Vec<Value> = (0..regs)
        .map(|r| Value::new(Slot::new(RegisterId(r as u32), 0), width))
        .collect();
    for v in &current {
        func.push(Operation::init(*v, 0).unwrap());
    }
    for &(dst, src, op) in steps {
        let lhs = current[dst];
        let next = lhs.next_version();
        func.push(Operation::binary(op, next, lhs, current[src], None).unwrap());
        current[dst] = next;
    }
    func
}

proptest! {
    #[test]
    fn wrap_matches_modular_arithmetic(width in arb_width(), value in any::<i32>()) {
        let value = i64::from(value);
        let wrapped = width.wrap(value);
        prop_assert!(width.contains(wrapped));
        let modulus = 1i64 << width.bits();
        prop_assert_eq!((wrapped - value).rem_euclid(modulus), 0);
    }

    #[test]
    fn in_range_values_encode_losslessly(width in arb_width(), seed in any::<i64>()) {
        let span = width.max_value() - width.min_value() + 1;
        let value = width.min_value() + seed.rem_euclid(span);
        prop_assert_eq!(width.decode(width.encode(value)), value);
        prop_assert!(width.encode(value) <= width.mask());
    }

    #[test]
    fn chain_dag_is_well_formed((width, steps) in arb_chain()) {
        let func = build_chain(width, &steps);
        let dag = DependencyDag::build(func.ops());
        prop_assert!(dag.verify_integrity().is_ok());
        let order = dag.topological_order().unwrap();
        prop_assert_eq!(order.len(), func.len());
        for position in 0..dag.num_ops() {
            for producer in dag.operand_producers(position).iter().flatten() {
                prop_assert!(*producer < position);
            }
        }
    }

    #[test]
    fn operations_survive_json((width, steps) in arb_chain()) {
        let func = build_chain(width, &steps);
        let json = serde_json::to_string(&func).unwrap();
        let back: QuantumFunction = serde_json::from_str(&json).unwrap();
        for op in back.ops() {
            prop_assert!(op.validate().is_ok());
        }
        prop_assert_eq!(back, func);
    }
}
