use core::{fmt, ops};

/// Default tolerance used by amplitude/matrix equality predicates.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

#[macro_export]
macro_rules! complex {
    ($real:expr, $imaginary:expr) => {
        $crate::maths::complex::Complex::new($real, $imaginary)
    };
}

/// A complex scalar over `f64`, the sole numeric primitive the rest of the
/// engine builds on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Complex {
    pub real: f64,
    pub imaginary: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex::new(0.0, 0.0);
    pub const ONE: Complex = Complex::new(1.0, 0.0);
    pub const NEG_ONE: Complex = Complex::new(-1.0, 0.0);
    pub const I: Complex = Complex::new(0.0, 1.0);
    pub const NEG_I: Complex = Complex::new(0.0, -1.0);

    pub const fn new(real: f64, imaginary: f64) -> Complex {
        Complex { real, imaginary }
    }

    pub fn conj(&self) -> Complex {
        Complex::new(self.real, -self.imaginary)
    }

    /// |z|^2, also the Born-rule "probability" of an amplitude.
    pub fn norm2(&self) -> f64 {
        self.real * self.real + self.imaginary * self.imaginary
    }

    pub fn magnitude(&self) -> f64 {
        self.norm2().sqrt()
    }

    pub fn phase(&self) -> f64 {
        self.imaginary.atan2(self.real)
    }

    pub fn approx_eq(&self, other: &Complex, tolerance: f64) -> bool {
        (self.real - other.real).abs() <= tolerance && (self.imaginary - other.imaginary).abs() <= tolerance
    }
}

impl Default for Complex {
    fn default() -> Complex {
        Complex::ZERO
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.imaginary >= 0.0 {
            write!(f, "{}+{}i", self.real, self.imaginary)
        } else {
            write!(f, "{}{}i", self.real, self.imaginary)
        }
    }
}

impl ops::Add for Complex {
    type Output = Complex;
    fn add(self, other: Complex) -> Complex {
        Complex::new(self.real + other.real, self.imaginary + other.imaginary)
    }
}

impl ops::Sub for Complex {
    type Output = Complex;
    fn sub(self, other: Complex) -> Complex {
        Complex::new(self.real - other.real, self.imaginary - other.imaginary)
    }
}

impl ops::Mul for Complex {
    type Output = Complex;
    fn mul(self, other: Complex) -> Complex {
        Complex::new(
            self.real * other.real - self.imaginary * other.imaginary,
            self.real * other.imaginary + self.imaginary * other.real,
        )
    }
}

impl ops::Mul<f64> for Complex {
    type Output = Complex;
    fn mul(self, scalar: f64) -> Complex {
        Complex::new(self.real * scalar, self.imaginary * scalar)
    }
}

impl ops::Neg for Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex::new(-self.real, -self.imaginary)
    }
}

impl ops::AddAssign for Complex {
    fn add_assign(&mut self, other: Complex) {
        self.real += other.real;
        self.imaginary += other.imaginary;
    }
}

impl From<f64> for Complex {
    fn from(real: f64) -> Complex {
        Complex::new(real, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mul_matches_standard_formula() {
        let a = complex!(1.0, 2.0);
        let b = complex!(3.0, -1.0);
        let product = a * b;
        assert_eq!(product, complex!(5.0, 5.0));
    }

    #[test]
    fn conj_negates_imaginary_part() {
        let z = complex!(0.5, -0.25);
        assert_eq!(z.conj(), complex!(0.5, 0.25));
    }

    #[test]
    fn norm2_of_i_is_one() {
        assert_abs_diff_eq!(Complex::I.norm2(), 1.0, epsilon = DEFAULT_TOLERANCE);
    }

    #[test]
    fn approx_eq_respects_tolerance() {
        let a = complex!(1.0, 1.0);
        let b = complex!(1.0 + 1e-11, 1.0 - 1e-11);
        assert!(a.approx_eq(&b, DEFAULT_TOLERANCE));
        assert!(!a.approx_eq(&b, 1e-12));
    }
}
