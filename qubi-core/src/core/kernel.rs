//! Applies a small unitary to an arbitrary subset of qubits in a state
//! vector without ever materializing the full `2^n x 2^n` operator.
//!
//! Two code paths compute the same thing: [`apply_generic`] multiplies the
//! dense local matrix against every affected amplitude group, and
//! [`apply_specialized`] recognises a handful of common single- and
//! two-qubit shapes (X, Y, Z, H, SWAP) and applies closed-form updates
//! instead. Which path runs is controlled by `EngineConfig::use_optimized_gates`;
//! both must agree to within tolerance, which the test suite checks directly.

use crate::error::{QubiError, QubiResult};
use crate::maths::complex::Complex;
use crate::maths::matrix::Matrix;
use rayon::prelude::*;

fn controls_satisfied(index: usize, controls: &[usize]) -> bool {
    controls.iter().all(|&c| (index >> c) & 1 == 1)
}

/// Base indices of every disjoint amplitude group touched by `targets`,
/// restricted to the groups gated on by `controls`.
fn group_bases(dim: usize, targets: &[usize], controls: &[usize]) -> Vec<usize> {
    (0..dim)
        .filter(|&base| {
            targets.iter().all(|&t| (base >> t) & 1 == 0) && controls_satisfied(base, controls)
        })
        .collect()
}

fn group_indices(base: usize, targets: &[usize]) -> Vec<usize> {
    let k = targets.len();
    (0..(1usize << k))
        .map(|t| {
            let mut idx = base;
            for (j, &target) in targets.iter().enumerate() {
                if (t >> j) & 1 == 1 {
                    idx |= 1 << target;
                }
            }
            idx
        })
        .collect()
}

/// Applies a dense `2^k x 2^k` unitary `matrix` to the qubits named by
/// `targets` (local bit `j` of the matrix corresponds to `targets[j]`),
/// gated on `controls`: groups whose control qubits are not all 1 are left
/// untouched. `targets` and `controls` must be disjoint.
pub fn apply_generic(
    amplitudes: &mut [Complex],
    matrix: &Matrix,
    targets: &[usize],
    controls: &[usize],
) -> QubiResult<()> {
    let k = targets.len();
    let local_dim = 1usize << k;
    if matrix.rows != local_dim || matrix.cols != local_dim {
        return Err(QubiError::DimensionMismatch {
            left: (matrix.rows, matrix.cols),
            right: (local_dim, local_dim),
        });
    }

    for base in group_bases(amplitudes.len(), targets, controls) {
        let idxs = group_indices(base, targets);
        let mut next = vec![Complex::ZERO; local_dim];
        for row in 0..local_dim {
            let mut acc = Complex::ZERO;
            for col in 0..local_dim {
                acc = acc + matrix.get(row, col) * amplitudes[idxs[col]];
            }
            next[row] = acc;
        }
        for (row, &idx) in idxs.iter().enumerate() {
            amplitudes[idx] = next[row];
        }
    }
    Ok(())
}

/// Same contract as [`apply_generic`], computing each group's new
/// amplitudes concurrently before scattering them back. Worthwhile once
/// the state vector is large enough that per-group work dominates the
/// synchronization cost.
pub fn apply_generic_parallel(
    amplitudes: &mut [Complex],
    matrix: &Matrix,
    targets: &[usize],
    controls: &[usize],
) -> QubiResult<()> {
    let k = targets.len();
    let local_dim = 1usize << k;
    if matrix.rows != local_dim || matrix.cols != local_dim {
        return Err(QubiError::DimensionMismatch {
            left: (matrix.rows, matrix.cols),
            right: (local_dim, local_dim),
        });
    }

    let bases = group_bases(amplitudes.len(), targets, controls);
    let snapshot = amplitudes.to_vec();
    let updates: Vec<(Vec<usize>, Vec<Complex>)> = bases
        .into_par_iter()
        .map(|base| {
            let idxs = group_indices(base, targets);
            let mut next = vec![Complex::ZERO; local_dim];
            for row in 0..local_dim {
                let mut acc = Complex::ZERO;
                for col in 0..local_dim {
                    acc = acc + matrix.get(row, col) * snapshot[idxs[col]];
                }
                next[row] = acc;
            }
            (idxs, next)
        })
        .collect();

    for (idxs, next) in updates {
        for (row, idx) in idxs.into_iter().enumerate() {
            amplitudes[idx] = next[row];
        }
    }
    Ok(())
}

/// The handful of single- and two-qubit shapes the specialized path
/// recognises. Anything else always takes the generic path regardless of
/// `EngineConfig::use_optimized_gates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecializedShape {
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
    Swap,
}

pub fn specialized_shape_for(gate_name: &str) -> Option<SpecializedShape> {
    match gate_name {
        "X" => Some(SpecializedShape::PauliX),
        "Y" => Some(SpecializedShape::PauliY),
        "Z" => Some(SpecializedShape::PauliZ),
        "H" => Some(SpecializedShape::Hadamard),
        "SWAP" => Some(SpecializedShape::Swap),
        _ => None,
    }
}

/// Applies one of the recognised [`SpecializedShape`]s via closed-form
/// amplitude updates instead of a matrix multiply.
pub fn apply_specialized(
    amplitudes: &mut [Complex],
    shape: SpecializedShape,
    targets: &[usize],
    controls: &[usize],
) -> QubiResult<()> {
    match shape {
        SpecializedShape::PauliX | SpecializedShape::PauliY | SpecializedShape::PauliZ => {
            let target = *targets
                .first()
                .ok_or_else(|| QubiError::ShapeError("single-qubit gate needs a target".into()))?;
            apply_single_qubit_pauli(amplitudes, shape, target, controls);
            Ok(())
        }
        SpecializedShape::Hadamard => {
            let target = *targets
                .first()
                .ok_or_else(|| QubiError::ShapeError("Hadamard needs a target".into()))?;
            apply_hadamard(amplitudes, target, controls);
            Ok(())
        }
        SpecializedShape::Swap => {
            if targets.len() != 2 {
                return Err(QubiError::ShapeError("SWAP needs exactly two targets".into()));
            }
            apply_swap(amplitudes, targets[0], targets[1], controls);
            Ok(())
        }
    }
}

fn apply_single_qubit_pauli(
    amplitudes: &mut [Complex],
    shape: SpecializedShape,
    target: usize,
    controls: &[usize],
) {
    let bit = 1usize << target;
    for base in 0..amplitudes.len() {
        if base & bit != 0 || !controls_satisfied(base, controls) {
            continue;
        }
        let i0 = base;
        let i1 = base | bit;
        match shape {
            SpecializedShape::PauliX => amplitudes.swap(i0, i1),
            SpecializedShape::PauliY => {
                let a0 = amplitudes[i0];
                let a1 = amplitudes[i1];
                amplitudes[i0] = a1 * Complex::NEG_I;
                amplitudes[i1] = a0 * Complex::I;
            }
            SpecializedShape::PauliZ => {
                amplitudes[i1] = amplitudes[i1] * Complex::NEG_ONE;
            }
            _ => unreachable!(),
        }
    }
}

fn apply_hadamard(amplitudes: &mut [Complex], target: usize, controls: &[usize]) {
    let bit = 1usize << target;
    let s = core::f64::consts::FRAC_1_SQRT_2;
    for base in 0..amplitudes.len() {
        if base & bit != 0 || !controls_satisfied(base, controls) {
            continue;
        }
        let i0 = base;
        let i1 = base | bit;
        let a0 = amplitudes[i0];
        let a1 = amplitudes[i1];
        amplitudes[i0] = (a0 + a1) * s;
        amplitudes[i1] = (a0 - a1) * s;
    }
}

fn apply_swap(amplitudes: &mut [Complex], q0: usize, q1: usize, controls: &[usize]) {
    let bit0 = 1usize << q0;
    let bit1 = 1usize << q1;
    for base in 0..amplitudes.len() {
        let has0 = base & bit0 != 0;
        let has1 = base & bit1 != 0;
        if has0 || !has1 || !controls_satisfied(base, controls) {
            continue;
        }
        let i01 = base;
        let i10 = (base & !bit1) | bit0;
        amplitudes.swap(i01, i10);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gates;
    use crate::maths::complex::DEFAULT_TOLERANCE;

    fn fresh(n: usize) -> Vec<Complex> {
        let mut v = vec![Complex::ZERO; 1 << n];
        v[0] = Complex::ONE;
        v
    }

    #[test]
    fn generic_hadamard_produces_equal_superposition() {
        let mut state = fresh(1);
        let h = gates::lookup("H").unwrap();
        let matrix = h.kind;
        let crate::core::gates::GateKind::Fixed(f) = matrix else {
            panic!()
        };
        apply_generic(&mut state, &f(), &[0], &[]).unwrap();
        let s = core::f64::consts::FRAC_1_SQRT_2;
        assert!((state[0].real - s).abs() < 1e-10);
        assert!((state[1].real - s).abs() < 1e-10);
    }

    #[test]
    fn generic_and_specialized_pauli_x_agree() {
        for n in 1..=3 {
            for target in 0..n {
                let mut generic_state = fresh(n);
                let mut specialized_state = fresh(n);
                let x = gates::lookup("X").unwrap();
                let crate::core::gates::GateKind::Fixed(f) = x.kind else {
                    panic!()
                };
                apply_generic(&mut generic_state, &f(), &[target], &[]).unwrap();
                apply_specialized(
                    &mut specialized_state,
                    SpecializedShape::PauliX,
                    &[target],
                    &[],
                )
                .unwrap();
                for (a, b) in generic_state.iter().zip(specialized_state.iter()) {
                    assert!(a.approx_eq(b, DEFAULT_TOLERANCE));
                }
            }
        }
    }

    #[test]
    fn controlled_x_only_touches_rows_with_control_set() {
        // |10> with control=0, target=1: control bit is 0, so CX must act as identity.
        let mut state = vec![Complex::ZERO; 4];
        state[0b10] = Complex::ONE;
        apply_specialized(&mut state, SpecializedShape::PauliX, &[1], &[0]).unwrap();
        assert_eq!(state[0b10], Complex::ONE);
    }

    #[test]
    fn bell_pair_via_hadamard_then_controlled_x() {
        let mut state = fresh(2);
        apply_specialized(&mut state, SpecializedShape::Hadamard, &[0], &[]).unwrap();
        apply_specialized(&mut state, SpecializedShape::PauliX, &[1], &[0]).unwrap();
        let s = core::f64::consts::FRAC_1_SQRT_2;
        assert!((state[0b00].real - s).abs() < 1e-9);
        assert!((state[0b11].real - s).abs() < 1e-9);
        assert!(state[0b01].norm2() < 1e-18);
        assert!(state[0b10].norm2() < 1e-18);
    }

    #[test]
    fn swap_exchanges_amplitudes_of_differing_qubits() {
        let mut state = vec![Complex::ZERO; 4];
        state[0b01] = Complex::ONE;
        apply_specialized(&mut state, SpecializedShape::Swap, &[0, 1], &[]).unwrap();
        assert_eq!(state[0b10], Complex::ONE);
        assert_eq!(state[0b01], Complex::ZERO);
    }

    #[test]
    fn apply_generic_rejects_matrix_dimension_mismatch() {
        let mut state = fresh(2);
        let wrong = Matrix::identity(4);
        assert!(matches!(
            apply_generic(&mut state, &wrong, &[0], &[]),
            Err(QubiError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn parallel_and_sequential_generic_paths_agree() {
        let h = gates::lookup("H").unwrap();
        let crate::core::gates::GateKind::Fixed(f) = h.kind else {
            panic!()
        };
        let mut sequential = fresh(4);
        let mut parallel = fresh(4);
        for target in 0..4 {
            apply_generic(&mut sequential, &f(), &[target], &[]).unwrap();
            apply_generic_parallel(&mut parallel, &f(), &[target], &[]).unwrap();
        }
        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert!(a.approx_eq(b, DEFAULT_TOLERANCE));
        }
    }
}
