//! Checks properties 1 and 4 of the testable-properties list: every fixed
//! matrix in the gate library is unitary, and the generic kernel agrees
//! with the specialized fast paths on every gate that has one.

use crate::common::PropertyResult;
use qubi_core::core::gates::{self, GateKind, GATE_NAMES};
use qubi_core::core::kernel::{apply_generic, apply_specialized, specialized_shape_for};
use qubi_core::maths::complex::Complex;

const UNITARITY_TOLERANCE: f64 = 1e-9;
const KERNEL_AGREEMENT_TOLERANCE: f64 = 1e-8;

pub fn run(results: &mut Vec<PropertyResult>) {
    check_every_fixed_gate_is_unitary(results);
    check_parameterized_and_scalable_gates_are_unitary(results);
    check_generic_and_specialized_kernels_agree(results);
}

fn check_every_fixed_gate_is_unitary(results: &mut Vec<PropertyResult>) {
    for &name in GATE_NAMES {
        let def = gates::lookup(name).unwrap();
        if let GateKind::Fixed(build) = def.kind {
            let matrix = build();
            if matrix.is_unitary(UNITARITY_TOLERANCE) {
                results.push(PropertyResult::pass(format!("{name} is unitary")));
            } else {
                results.push(PropertyResult::fail(
                    format!("{name} is unitary"),
                    "U * U^dagger != I".to_string(),
                ));
            }
        }
    }
}

fn check_parameterized_and_scalable_gates_are_unitary(results: &mut Vec<PropertyResult>) {
    for &name in &["RX", "RY", "RZ"] {
        let def = gates::lookup(name).unwrap();
        let GateKind::Parameterized(build) = def.kind else {
            unreachable!()
        };
        for &theta in &[0.0, 0.37, core::f64::consts::PI, -1.9] {
            let matrix = build(theta);
            let label = format!("{name}(theta={theta:.2}) is unitary");
            if matrix.is_unitary(UNITARITY_TOLERANCE) {
                results.push(PropertyResult::pass(label));
            } else {
                results.push(PropertyResult::fail(label, "U * U^dagger != I".to_string()));
            }
        }
    }

    for &name in &["CNX", "CNY", "CNZ"] {
        let def = gates::lookup(name).unwrap();
        let GateKind::Scalable(build) = def.kind else {
            unreachable!()
        };
        for width in 2..=5 {
            let matrix = build(width);
            let label = format!("{name}(width={width}) is unitary");
            if matrix.is_unitary(UNITARITY_TOLERANCE) {
                results.push(PropertyResult::pass(label));
            } else {
                results.push(PropertyResult::fail(label, "U * U^dagger != I".to_string()));
            }
        }
    }
}

fn fresh(n: usize) -> Vec<Complex> {
    let mut v = vec![Complex::ZERO; 1 << n];
    v[0] = Complex::ONE;
    v
}

fn check_generic_and_specialized_kernels_agree(results: &mut Vec<PropertyResult>) {
    for &name in GATE_NAMES {
        let Some(shape) = specialized_shape_for(name) else {
            continue;
        };
        let def = gates::lookup(name).unwrap();
        let GateKind::Fixed(build) = def.kind else {
            continue;
        };
        let matrix = build();
        let k = (matrix.rows as f64).log2().round() as usize;
        let n = k.max(2) + 1;

        for target_offset in 0..n - k + 1 {
            let targets: Vec<usize> = (target_offset..target_offset + k).collect();
            let mut generic_state = fresh(n);
            let mut specialized_state = fresh(n);
            apply_generic(&mut generic_state, &matrix, &targets, &[]).unwrap();
            apply_specialized(&mut specialized_state, shape, &targets, &[]).unwrap();

            let label = format!("{name} generic/specialized agree (targets={targets:?})");
            let agree = generic_state
                .iter()
                .zip(specialized_state.iter())
                .all(|(a, b)| a.approx_eq(b, KERNEL_AGREEMENT_TOLERANCE));
            if agree {
                results.push(PropertyResult::pass(label));
            } else {
                results.push(PropertyResult::fail(
                    label,
                    "generic and specialized kernels diverged".to_string(),
                ));
            }
        }
    }
}
