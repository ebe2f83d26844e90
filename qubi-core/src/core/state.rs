//! The state vector itself and the quantities derived from it: basis
//! probabilities, single-qubit reduced density matrices, and Bloch
//! coordinates. Qubit 0 is the least-significant bit of the basis index
//! throughout -- the one convention every other module must agree with.

use crate::error::{QubiError, QubiResult};
use crate::maths::complex::Complex;
use crate::maths::matrix::Matrix;

/// Looser than [`crate::maths::complex::DEFAULT_TOLERANCE`]: the pure-state
/// check squares a matrix product, doubling the relative floating-point
/// error of the comparison, so it is given its own contractual tolerance.
const PURITY_TOLERANCE: f64 = 1e-8;

#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    pub num_qubits: usize,
    pub amplitudes: Vec<Complex>,
}

impl StateVector {
    /// The fresh |0...0> state for `num_qubits` qubits.
    pub fn fresh(num_qubits: usize) -> StateVector {
        let dim = 1usize << num_qubits;
        let mut amplitudes = vec![Complex::ZERO; dim];
        amplitudes[0] = Complex::ONE;
        StateVector {
            num_qubits,
            amplitudes,
        }
    }

    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn from_amplitudes(num_qubits: usize, amplitudes: Vec<Complex>) -> QubiResult<StateVector> {
        if amplitudes.len() != 1usize << num_qubits {
            return Err(QubiError::ShapeError(format!(
                "expected {} amplitudes for {} qubits, got {}",
                1usize << num_qubits,
                num_qubits,
                amplitudes.len()
            )));
        }
        Ok(StateVector {
            num_qubits,
            amplitudes,
        })
    }

    fn require_qubit(&self, qubit: usize) -> QubiResult<()> {
        if qubit >= self.num_qubits {
            return Err(QubiError::QubitIndexOutOfRange {
                index: qubit,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// |amplitude|^2 of a single basis state.
    pub fn probability(&self, basis_index: usize) -> f64 {
        self.amplitudes[basis_index].norm2()
    }

    /// |amplitude|^2 for every basis state, in index order.
    pub fn all_probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm2()).collect()
    }

    pub fn norm(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(|a| a.norm2())
            .sum::<f64>()
            .sqrt()
    }

    /// The marginal probability that `qubit` reads 1.
    pub fn marginal_probability_one(&self, qubit: usize) -> QubiResult<f64> {
        self.require_qubit(qubit)?;
        let mut total = 0.0;
        for (i, a) in self.amplitudes.iter().enumerate() {
            if (i >> qubit) & 1 == 1 {
                total += a.norm2();
            }
        }
        Ok(total)
    }

    /// The 2x2 reduced density matrix for `qubit`, obtained by tracing out
    /// every other qubit: rho[a][b] = sum over the other qubits' basis
    /// states r of psi[r with qubit=a] * conj(psi[r with qubit=b]).
    pub fn reduced_density_single_qubit(&self, qubit: usize) -> QubiResult<Matrix> {
        self.require_qubit(qubit)?;
        let mut rho = Matrix::zero(2, 2);
        let bit = 1usize << qubit;

        for rest in 0..self.dim() {
            if rest & bit != 0 {
                continue;
            }
            let i0 = rest;
            let i1 = rest | bit;
            for a in 0..2 {
                let ia = if a == 0 { i0 } else { i1 };
                for b in 0..2 {
                    let ib = if b == 0 { i0 } else { i1 };
                    let contribution = self.amplitudes[ia] * self.amplitudes[ib].conj();
                    let existing = rho.get(a, b);
                    rho.set(a, b, existing + contribution);
                }
            }
        }
        Ok(rho)
    }

    /// (x, y, z) Bloch coordinates derived from the reduced density matrix:
    /// x = 2*Re(rho01), y = 2*Im(rho10) (equivalently -2*Im(rho01)),
    /// z = rho00 - rho11.
    pub fn bloch_coordinates(&self, qubit: usize) -> QubiResult<(f64, f64, f64)> {
        let rho = self.reduced_density_single_qubit(qubit)?;
        let x = 2.0 * rho.get(0, 1).real;
        let y = 2.0 * rho.get(1, 0).imaginary;
        let z = rho.get(0, 0).real - rho.get(1, 1).real;
        Ok((x, y, z))
    }

    /// True when the qubit's reduced state is pure, i.e. rho^2 ~= rho.
    pub fn is_single_qubit_pure(&self, qubit: usize) -> QubiResult<bool> {
        let rho = self.reduced_density_single_qubit(qubit)?;
        let rho2 = rho.product(&rho).map_err(|_| {
            QubiError::ShapeError("reduced density matrix must be square".to_string())
        })?;
        Ok(rho2.approx_eq(&rho, PURITY_TOLERANCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex;

    #[test]
    fn fresh_state_is_all_zero_basis_state() {
        let s = StateVector::fresh(3);
        assert_eq!(s.dim(), 8);
        assert_eq!(s.probability(0), 1.0);
        assert_eq!(s.probability(1), 0.0);
    }

    #[test]
    fn bell_pair_qubit_marginals_are_maximally_mixed() {
        let inv_sqrt2 = core::f64::consts::FRAC_1_SQRT_2;
        let amplitudes = vec![
            complex!(inv_sqrt2, 0.0),
            complex!(0.0, 0.0),
            complex!(0.0, 0.0),
            complex!(inv_sqrt2, 0.0),
        ];
        let s = StateVector::from_amplitudes(2, amplitudes).unwrap();
        assert!((s.marginal_probability_one(0).unwrap() - 0.5).abs() < 1e-10);
        assert!((s.marginal_probability_one(1).unwrap() - 0.5).abs() < 1e-10);
    }

    #[test]
    fn bell_pair_single_qubit_reduced_state_is_mixed_not_pure() {
        let inv_sqrt2 = core::f64::consts::FRAC_1_SQRT_2;
        let amplitudes = vec![
            complex!(inv_sqrt2, 0.0),
            complex!(0.0, 0.0),
            complex!(0.0, 0.0),
            complex!(inv_sqrt2, 0.0),
        ];
        let s = StateVector::from_amplitudes(2, amplitudes).unwrap();
        assert!(!s.is_single_qubit_pure(0).unwrap());
    }

    #[test]
    fn basis_state_is_pure_and_sits_at_bloch_pole() {
        let s = StateVector::fresh(1);
        assert!(s.is_single_qubit_pure(0).unwrap());
        let (x, y, z) = s.bloch_coordinates(0).unwrap();
        assert!((x * x + y * y + z * z - 1.0).abs() < 1e-10);
        assert!((z - 1.0).abs() < 1e-10);
    }

    #[test]
    fn plus_state_sits_on_equator() {
        let inv_sqrt2 = core::f64::consts::FRAC_1_SQRT_2;
        let s = StateVector::from_amplitudes(
            1,
            vec![complex!(inv_sqrt2, 0.0), complex!(inv_sqrt2, 0.0)],
        )
        .unwrap();
        let (x, y, z) = s.bloch_coordinates(0).unwrap();
        assert!((x - 1.0).abs() < 1e-10);
        assert!(y.abs() < 1e-10);
        assert!(z.abs() < 1e-10);
    }

    #[test]
    fn qubit_index_out_of_range_is_rejected() {
        let s = StateVector::fresh(2);
        assert!(matches!(
            s.marginal_probability_one(5),
            Err(QubiError::QubitIndexOutOfRange { .. })
        ));
    }
}
