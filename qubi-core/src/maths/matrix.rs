use super::complex::Complex;
use crate::error::{QubiError, QubiResult};
use core::fmt;

#[macro_export]
macro_rules! matrix {
    ( $( [ $( $elem:expr ),* $(,)? ] );* $(;)? ) => {
        {
            let rows: Vec<Vec<$crate::maths::complex::Complex>> = vec![ $( vec![ $( $elem ),* ] ),* ];
            let r = rows.len();
            let c = rows[0].len();
            let mut data = Vec::with_capacity(r * c);
            for row in rows {
                assert_eq!(row.len(), c, "matrix! rows must have equal width");
                data.extend(row);
            }
            $crate::maths::matrix::Matrix::new(r, c, data)
        }
    };
}

/// A dense, row-major r x c matrix of complex scalars.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Complex>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<Complex>) -> Matrix {
        assert_eq!(
            data.len(),
            rows * cols,
            "matrix data length must equal rows * cols"
        );
        Matrix { rows, cols, data }
    }

    pub fn zero(rows: usize, cols: usize) -> Matrix {
        Matrix::new(rows, cols, vec![Complex::ZERO; rows * cols])
    }

    pub fn identity(size: usize) -> Matrix {
        let mut m = Matrix::zero(size, size);
        for i in 0..size {
            m.set(i, i, Complex::ONE);
        }
        m
    }

    pub fn get(&self, row: usize, col: usize) -> Complex {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Complex) {
        self.data[row * self.cols + col] = value;
    }

    /// Classical O(r*c*k) matrix product; fails when inner dimensions disagree.
    pub fn product(&self, other: &Matrix) -> QubiResult<Matrix> {
        if self.cols != other.rows {
            return Err(QubiError::DimensionMismatch {
                left: (self.rows, self.cols),
                right: (other.rows, other.cols),
            });
        }

        let mut result = Matrix::zero(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == Complex::ZERO {
                    continue;
                }
                for j in 0..other.cols {
                    let existing = result.get(i, j);
                    result.set(i, j, existing + a * other.get(k, j));
                }
            }
        }
        Ok(result)
    }

    /// Kronecker (tensor) product: block (i*r2+bi, j*c2+bj) = self[i][j] * other[bi][bj].
    pub fn kronecker(&self, other: &Matrix) -> Matrix {
        let rows = self.rows * other.rows;
        let cols = self.cols * other.cols;
        let mut result = Matrix::zero(rows, cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                let a = self.get(i, j);
                if a == Complex::ZERO {
                    continue;
                }
                for bi in 0..other.rows {
                    for bj in 0..other.cols {
                        result.set(
                            i * other.rows + bi,
                            j * other.cols + bj,
                            a * other.get(bi, bj),
                        );
                    }
                }
            }
        }
        result
    }

    pub fn conjugate_transpose(&self) -> Matrix {
        let mut result = Matrix::zero(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                result.set(j, i, self.get(i, j).conj());
            }
        }
        result
    }

    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        if self.rows != other.rows || self.cols != other.cols {
            return false;
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| a.approx_eq(b, tolerance))
    }

    /// True when self * self^dagger == I within tolerance (a necessary
    /// unitarity check used by the gate-library test suite).
    pub fn is_unitary(&self, tolerance: f64) -> bool {
        if self.rows != self.cols {
            return false;
        }
        match self.product(&self.conjugate_transpose()) {
            Ok(product) => product.approx_eq(&Matrix::identity(self.rows), tolerance),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                write!(f, "{} ", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::complex::DEFAULT_TOLERANCE;
    use crate::complex;

    #[test]
    fn product_rejects_dimension_mismatch() {
        let a = Matrix::identity(2);
        let b = Matrix::identity(3);
        assert!(matches!(
            a.product(&b),
            Err(QubiError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn kronecker_shape_and_entries() {
        let a = matrix!([complex!(1.0, 0.0), complex!(2.0, 0.0)]; [complex!(3.0, 0.0), complex!(4.0, 0.0)]);
        let b = Matrix::identity(2);
        let k = a.kronecker(&b);
        assert_eq!((k.rows, k.cols), (4, 4));
        assert_eq!(k.get(0, 0), complex!(1.0, 0.0));
        assert_eq!(k.get(2, 2), complex!(4.0, 0.0));
        assert_eq!(k.get(0, 1), complex!(0.0, 0.0));
    }

    #[test]
    fn conjugate_transpose_swaps_and_conjugates() {
        let m = matrix!([complex!(1.0, 2.0), complex!(3.0, 0.0)]; [complex!(0.0, -1.0), complex!(5.0, 0.0)]);
        let t = m.conjugate_transpose();
        assert_eq!(t.get(0, 1), complex!(0.0, 1.0));
        assert_eq!(t.get(1, 0), complex!(3.0, 0.0));
    }

    #[test]
    fn identity_is_unitary() {
        assert!(Matrix::identity(4).is_unitary(DEFAULT_TOLERANCE));
    }
}
