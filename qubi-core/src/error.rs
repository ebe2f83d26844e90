use thiserror::Error;

pub type QubiResult<T> = std::result::Result<T, QubiError>;

/// Error taxonomy exposed across the engine boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QubiError {
    #[error("shape error: {0}")]
    ShapeError(String),

    #[error("dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("qubit index {index} out of range for a {num_qubits}-qubit circuit")]
    QubitIndexOutOfRange { index: usize, num_qubits: usize },

    #[error("slot already occupied at column {column}{}", qubit.map(|q| format!(" (qubit {q})")).unwrap_or_default())]
    SlotOccupied { column: usize, qubit: Option<usize> },

    #[error("unknown gate {0:?}")]
    UnknownGate(String),

    #[error("parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("END at column {column} has no matching REPEAT")]
    DanglingEnd { column: usize },

    #[error("REPEAT at column {column} has no matching END")]
    UnclosedRepeat { column: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_occupied_mentions_qubit_when_present() {
        let err = QubiError::SlotOccupied {
            column: 3,
            qubit: Some(2),
        };
        assert!(err.to_string().contains("qubit 2"));
    }

    #[test]
    fn slot_occupied_omits_qubit_when_absent() {
        let err = QubiError::SlotOccupied {
            column: 3,
            qubit: None,
        };
        assert_eq!(err.to_string(), "slot already occupied at column 3");
    }
}
