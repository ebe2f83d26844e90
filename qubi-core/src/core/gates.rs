//! The gate library: named unitaries plus the fixed/parameterized/scalable
//! tagging the rest of the engine dispatches on, and the memoizing cache
//! that backs repeated lookups of rotation and multi-controlled matrices.

use crate::error::{QubiError, QubiResult};
use crate::maths::complex::Complex;
use crate::maths::matrix::Matrix;
use crate::{complex, matrix};
use std::collections::HashMap;
use std::sync::Mutex;

/// How many control lines a gate accepts when placed in a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlArity {
    Fixed(usize),
    Variadic,
}

/// The three closed shapes a gate's unitary can take. Kept as a sum type
/// rather than a tagged string so the parser can reject unknown kinds at
/// compile time instead of by string comparison.
#[derive(Clone, Copy)]
pub enum GateKind {
    Fixed(fn() -> Matrix),
    Parameterized(fn(f64) -> Matrix),
    Scalable(fn(usize) -> Matrix),
}

#[derive(Clone, Copy)]
pub struct GateDef {
    pub name: &'static str,
    pub kind: GateKind,
    pub num_controls: ControlArity,
    pub num_targets: usize,
}

fn identity_matrix() -> Matrix {
    matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)]; [complex!(0.0, 0.0), complex!(1.0, 0.0)])
}

fn hadamard_matrix() -> Matrix {
    let s = core::f64::consts::FRAC_1_SQRT_2;
    matrix!([complex!(s, 0.0), complex!(s, 0.0)]; [complex!(s, 0.0), complex!(-s, 0.0)])
}

fn pauli_x_matrix() -> Matrix {
    matrix!([complex!(0.0, 0.0), complex!(1.0, 0.0)]; [complex!(1.0, 0.0), complex!(0.0, 0.0)])
}

fn pauli_y_matrix() -> Matrix {
    matrix!([complex!(0.0, 0.0), complex!(0.0, -1.0)]; [complex!(0.0, 1.0), complex!(0.0, 0.0)])
}

fn pauli_z_matrix() -> Matrix {
    matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)]; [complex!(0.0, 0.0), complex!(-1.0, 0.0)])
}

fn s_matrix() -> Matrix {
    matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)]; [complex!(0.0, 0.0), complex!(0.0, 1.0)])
}

fn t_matrix() -> Matrix {
    let a = core::f64::consts::FRAC_PI_4;
    matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)]; [complex!(0.0, 0.0), complex!(a.cos(), a.sin())])
}

fn sdg_matrix() -> Matrix {
    matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)]; [complex!(0.0, 0.0), complex!(0.0, -1.0)])
}

fn tdg_matrix() -> Matrix {
    let a = core::f64::consts::FRAC_PI_4;
    matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)]; [complex!(0.0, 0.0), complex!(a.cos(), -a.sin())])
}

fn sqrt_x_matrix() -> Matrix {
    matrix!([complex!(0.5, 0.5), complex!(0.5, -0.5)]; [complex!(0.5, -0.5), complex!(0.5, 0.5)])
}

fn sqrt_y_matrix() -> Matrix {
    matrix!([complex!(0.5, 0.5), complex!(-0.5, -0.5)]; [complex!(0.5, 0.5), complex!(0.5, 0.5)])
}

fn sqrt_z_matrix() -> Matrix {
    // S and sqrt(Z) coincide; exposed under both names for Qubi source text.
    s_matrix()
}

/// RX(theta) = exp(-i theta X / 2).
pub fn rx_matrix(theta: f64) -> Matrix {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    matrix!(
        [complex!(cos, 0.0), complex!(0.0, -sin)];
        [complex!(0.0, -sin), complex!(cos, 0.0)]
    )
}

pub fn ry_matrix(theta: f64) -> Matrix {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    matrix!(
        [complex!(cos, 0.0), complex!(-sin, 0.0)];
        [complex!(sin, 0.0), complex!(cos, 0.0)]
    )
}

pub fn rz_matrix(theta: f64) -> Matrix {
    let half = theta / 2.0;
    matrix!(
        [complex!(half.cos(), -half.sin()), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(half.cos(), half.sin())]
    )
}

fn swap_matrix() -> Matrix {
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0)]
    )
}

fn iswap_matrix() -> Matrix {
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 1.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 1.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0)]
    )
}

fn sqrt_swap_matrix() -> Matrix {
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.5, 0.5), complex!(0.5, -0.5), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.5, -0.5), complex!(0.5, 0.5), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0)]
    )
}

/// Folds `num_controls` control lines and one base single-qubit unitary
/// into a dense `2^(num_controls+1)` matrix: identity everywhere except the
/// rows whose control bits are all 1, where `base` is applied to the target
/// bit (the matrix's most significant local bit, per the "control is the
/// higher axis" convention used throughout the kernel).
pub fn fold_controls(base: &Matrix, num_controls: usize) -> Matrix {
    let n = num_controls + 1;
    let dim = 1usize << n;
    let mut m = Matrix::identity(dim);
    let control_mask = (1usize << num_controls) - 1;

    for row in 0..dim {
        if row & control_mask != control_mask {
            continue;
        }
        let row_target_bit = (row >> num_controls) & 1;
        for col_target_bit in 0..2 {
            let col = control_mask | (col_target_bit << num_controls);
            m.set(row, col, base.get(row_target_bit, col_target_bit));
        }
    }
    m
}

fn cnx_matrix(n: usize) -> Matrix {
    fold_controls(&pauli_x_matrix(), n - 1)
}

fn cny_matrix(n: usize) -> Matrix {
    fold_controls(&pauli_y_matrix(), n - 1)
}

fn cnz_matrix(n: usize) -> Matrix {
    fold_controls(&pauli_z_matrix(), n - 1)
}

fn cx_matrix() -> Matrix {
    fold_controls(&pauli_x_matrix(), 1)
}

fn cy_matrix() -> Matrix {
    fold_controls(&pauli_y_matrix(), 1)
}

fn cz_matrix() -> Matrix {
    fold_controls(&pauli_z_matrix(), 1)
}

fn ch_matrix() -> Matrix {
    fold_controls(&hadamard_matrix(), 1)
}

fn toffoli_matrix() -> Matrix {
    fold_controls(&pauli_x_matrix(), 2)
}

fn fredkin_matrix() -> Matrix {
    fold_controls(&swap_matrix(), 1)
}

macro_rules! fixed_fn {
    ($name:ident, $builder:expr, $targets:expr) => {
        GateDef {
            name: stringify!($name),
            kind: GateKind::Fixed($builder),
            num_controls: ControlArity::Fixed(0),
            num_targets: $targets,
        }
    };
}

/// Returns the static definition for every gate named in the library, or
/// `None` for an identifier the engine does not recognise.
pub fn lookup(name: &str) -> Option<GateDef> {
    Some(match name {
        "I" => fixed_fn!(I, identity_matrix, 1),
        "H" => fixed_fn!(H, hadamard_matrix, 1),
        "X" => fixed_fn!(X, pauli_x_matrix, 1),
        "Y" => fixed_fn!(Y, pauli_y_matrix, 1),
        "Z" => fixed_fn!(Z, pauli_z_matrix, 1),
        "S" => fixed_fn!(S, s_matrix, 1),
        "T" => fixed_fn!(T, t_matrix, 1),
        "Sdg" => fixed_fn!(Sdg, sdg_matrix, 1),
        "Tdg" => fixed_fn!(Tdg, tdg_matrix, 1),
        "SqrtX" => fixed_fn!(SqrtX, sqrt_x_matrix, 1),
        "SqrtY" => fixed_fn!(SqrtY, sqrt_y_matrix, 1),
        "SqrtZ" => fixed_fn!(SqrtZ, sqrt_z_matrix, 1),
        "RX" => GateDef {
            name: "RX",
            kind: GateKind::Parameterized(rx_matrix),
            num_controls: ControlArity::Fixed(0),
            num_targets: 1,
        },
        "RY" => GateDef {
            name: "RY",
            kind: GateKind::Parameterized(ry_matrix),
            num_controls: ControlArity::Fixed(0),
            num_targets: 1,
        },
        "RZ" => GateDef {
            name: "RZ",
            kind: GateKind::Parameterized(rz_matrix),
            num_controls: ControlArity::Fixed(0),
            num_targets: 1,
        },
        "CX" => GateDef {
            name: "CX",
            kind: GateKind::Fixed(cx_matrix),
            num_controls: ControlArity::Fixed(1),
            num_targets: 1,
        },
        "CY" => GateDef {
            name: "CY",
            kind: GateKind::Fixed(cy_matrix),
            num_controls: ControlArity::Fixed(1),
            num_targets: 1,
        },
        "CZ" => GateDef {
            name: "CZ",
            kind: GateKind::Fixed(cz_matrix),
            num_controls: ControlArity::Fixed(1),
            num_targets: 1,
        },
        "CH" => GateDef {
            name: "CH",
            kind: GateKind::Fixed(ch_matrix),
            num_controls: ControlArity::Fixed(1),
            num_targets: 1,
        },
        "SWAP" => fixed_fn!(SWAP, swap_matrix, 2),
        "iSWAP" => fixed_fn!(iSWAP, iswap_matrix, 2),
        "SqrtSWAP" => fixed_fn!(SqrtSWAP, sqrt_swap_matrix, 2),
        "TF" => GateDef {
            name: "TF",
            kind: GateKind::Fixed(toffoli_matrix),
            num_controls: ControlArity::Fixed(2),
            num_targets: 1,
        },
        "FR" => GateDef {
            name: "FR",
            kind: GateKind::Fixed(fredkin_matrix),
            num_controls: ControlArity::Fixed(1),
            num_targets: 2,
        },
        "CNX" => GateDef {
            name: "CNX",
            kind: GateKind::Scalable(cnx_matrix),
            num_controls: ControlArity::Variadic,
            num_targets: 1,
        },
        "CNY" => GateDef {
            name: "CNY",
            kind: GateKind::Scalable(cny_matrix),
            num_controls: ControlArity::Variadic,
            num_targets: 1,
        },
        "CNZ" => GateDef {
            name: "CNZ",
            kind: GateKind::Scalable(cnz_matrix),
            num_controls: ControlArity::Variadic,
            num_targets: 1,
        },
        _ => return None,
    })
}

/// The kernel never folds controls into a matrix at execution time: a
/// controlled gate is always applied as its control-free base unitary plus
/// a separate controls list (see [`crate::core::kernel::apply_generic`]).
/// This maps a placed gate's name to the name of that base gate. The
/// folded matrices above (`CX`, `TF`, `CNX`, ...) exist for the library's
/// own unitarity tests and for display, not for execution.
pub fn base_unitary_name(gate_name: &str) -> &'static str {
    match gate_name {
        "CX" | "TF" | "CNX" => "X",
        "CY" | "CNY" => "Y",
        "CZ" | "CNZ" => "Z",
        "CH" => "H",
        "FR" => "SWAP",
        "I" => "I",
        "H" => "H",
        "X" => "X",
        "Y" => "Y",
        "Z" => "Z",
        "S" => "S",
        "T" => "T",
        "Sdg" => "Sdg",
        "Tdg" => "Tdg",
        "SqrtX" => "SqrtX",
        "SqrtY" => "SqrtY",
        "SqrtZ" => "SqrtZ",
        "RX" => "RX",
        "RY" => "RY",
        "RZ" => "RZ",
        "SWAP" => "SWAP",
        "iSWAP" => "iSWAP",
        "SqrtSWAP" => "SqrtSWAP",
        other => other,
    }
}

/// Every non-`MEASURE` gate token the Qubi parser accepts.
pub const GATE_NAMES: &[&str] = &[
    "I", "H", "X", "Y", "Z", "S", "T", "Sdg", "Tdg", "SqrtX", "SqrtY", "SqrtZ", "RX", "RY", "RZ",
    "CX", "CY", "CZ", "CH", "SWAP", "iSWAP", "SqrtSWAP", "TF", "FR", "CNX", "CNY", "CNZ",
];

#[derive(Hash, Eq, PartialEq, Clone)]
enum CacheKey {
    Parameterized(&'static str, u64),
    Scalable(&'static str, usize),
}

/// Memoizes the unitaries produced by parameterized and scalable gate
/// kinds, keyed on `(name, theta, width)`. Read-mostly, deterministic, and
/// owned by a single `GateLibrary`/`Engine` -- never shared across engines.
pub struct GateCache {
    entries: Mutex<HashMap<CacheKey, Matrix>>,
}

impl GateCache {
    pub fn new() -> Self {
        GateCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a gate's matrix, consulting the cache for parameterized and
    /// scalable kinds. `width` is the total qubit arity (targets + controls)
    /// for scalable gates and is ignored otherwise.
    pub fn resolve(&self, def: &GateDef, theta: Option<f64>, width: usize) -> QubiResult<Matrix> {
        match def.kind {
            GateKind::Fixed(f) => Ok(f()),
            GateKind::Parameterized(f) => {
                let theta = theta.ok_or_else(|| {
                    QubiError::ShapeError(format!("gate {} requires an angle parameter", def.name))
                })?;
                let key = CacheKey::Parameterized(def.name, theta.to_bits());
                let mut entries = self.entries.lock().unwrap();
                if let Some(m) = entries.get(&key) {
                    return Ok(m.clone());
                }
                let m = f(theta);
                entries.insert(key, m.clone());
                Ok(m)
            }
            GateKind::Scalable(f) => {
                let key = CacheKey::Scalable(def.name, width);
                let mut entries = self.entries.lock().unwrap();
                if let Some(m) = entries.get(&key) {
                    return Ok(m.clone());
                }
                let m = f(width);
                entries.insert(key, m.clone());
                Ok(m)
            }
        }
    }
}

impl Default for GateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maths::complex::DEFAULT_TOLERANCE;

    #[test]
    fn every_fixed_gate_is_unitary() {
        for &name in GATE_NAMES {
            let def = lookup(name).unwrap();
            let matrix = match def.kind {
                GateKind::Fixed(f) => f(),
                GateKind::Parameterized(f) => f(0.37),
                GateKind::Scalable(f) => f(3),
            };
            assert!(
                matrix.is_unitary(1e-9),
                "{} is not unitary: {:?}",
                name,
                matrix
            );
        }
    }

    #[test]
    fn cx_matches_fold_controls_of_pauli_x() {
        let cx = lookup("CX").unwrap();
        let GateKind::Fixed(f) = cx.kind else {
            panic!("CX should be fixed")
        };
        let folded = fold_controls(&pauli_x_matrix(), 1);
        assert!(f().approx_eq(&folded, DEFAULT_TOLERANCE));
    }

    #[test]
    fn toffoli_is_cnx_with_two_controls() {
        let tf = toffoli_matrix();
        let cnx3 = cnx_matrix(3);
        assert!(tf.approx_eq(&cnx3, DEFAULT_TOLERANCE));
    }

    #[test]
    fn cnz_flips_exactly_one_basis_state_relative_to_identity() {
        let m = cnz_matrix(3);
        let id = Matrix::identity(8);
        let mut differences = 0;
        for i in 0..8 {
            for j in 0..8 {
                if !m.get(i, j).approx_eq(&id.get(i, j), DEFAULT_TOLERANCE) {
                    differences += 1;
                }
            }
        }
        assert_eq!(differences, 1);
    }

    #[test]
    fn parameterized_cache_memoizes_by_angle() {
        let cache = GateCache::new();
        let def = lookup("RX").unwrap();
        cache.resolve(&def, Some(1.0), 1).unwrap();
        assert_eq!(cache.len(), 1);
        cache.resolve(&def, Some(1.0), 1).unwrap();
        assert_eq!(cache.len(), 1);
        cache.resolve(&def, Some(2.0), 1).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn scalable_cache_memoizes_by_width() {
        let cache = GateCache::new();
        let def = lookup("CNX").unwrap();
        cache.resolve(&def, None, 3).unwrap();
        cache.resolve(&def, None, 4).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
