//! Line-oriented parser for the Qubi textual circuit language.
//!
//! A line is either blank, a `// comment`, a `REPEAT <n>` / `END` marker, or
//! a gate placement. Gate placements spell their operand one of three ways:
//! a bare qubit index (`H 0`), a parenthesized list that broadcasts a
//! single-qubit gate independently across every listed qubit in one column
//! (`H (0,1,2)` places three independent `H` gates, one per qubit), or a
//! bracketed control/target list where the last index is the target and the
//! rest are controls (`CX [0,1]`, `CNX [0,1,2,3]`, `CZ [0,1,2]` for a
//! doubly-controlled `Z`). `SWAP`/`iSWAP`/`SqrtSWAP` also use brackets, with
//! the leading index read as the other swap partner rather than a control.
//! `RX`/`RY`/`RZ` take a qubit index and an angle given as a multiple of pi.

use qubi_core::core::circuit::{ControlFlowBlock, ControlFlowKind, PlacedGate, QuantumCircuit};
use qubi_core::core::gates::GATE_NAMES;
use qubi_core::error::{QubiError, QubiResult};
use std::f64::consts::PI;

/// One line of Qubi source, remembering whether it occupies a circuit
/// column so [`crate::codegen::generate`] can play it back verbatim or
/// regenerate it from the (possibly edited) circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub column: Option<usize>,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub circuit: QuantumCircuit,
    pub lines: Vec<SourceLine>,
}

const SINGLE_QUBIT_GATES: &[&str] = &[
    "I", "H", "X", "Y", "Z", "S", "T", "Sdg", "Tdg", "SqrtX", "SqrtY", "SqrtZ", "RX", "RY", "RZ",
    "MEASURE",
];

fn is_blank_or_comment(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with("//")
}

fn parse_error(line: usize, message: impl Into<String>) -> QubiError {
    QubiError::ParseError {
        line,
        message: message.into(),
    }
}

fn parse_usize(line: usize, token: &str) -> QubiResult<usize> {
    token
        .parse::<usize>()
        .map_err(|_| parse_error(line, format!("expected a qubit index, found {token:?}")))
}

fn parse_f64(line: usize, token: &str) -> QubiResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| parse_error(line, format!("expected a number, found {token:?}")))
}

enum Operand {
    Single(usize),
    /// `(...)`: independent single-qubit broadcast, one gate per entry.
    Broadcast(Vec<usize>),
    /// `[...]`: control/target notation, last entry is the target.
    List(Vec<usize>),
}

fn parse_qubit_list(line: usize, inner: &str) -> QubiResult<Vec<usize>> {
    let parts: Vec<usize> = inner
        .split(',')
        .map(|p| parse_usize(line, p.trim()))
        .collect::<QubiResult<_>>()?;
    if parts.is_empty() {
        return Err(parse_error(line, "expected at least one qubit"));
    }
    Ok(parts)
}

fn parse_operand(line: usize, token: &str) -> QubiResult<Operand> {
    let token = token.trim();
    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return Ok(Operand::Broadcast(parse_qubit_list(line, inner)?));
    }
    if let Some(inner) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return Ok(Operand::List(parse_qubit_list(line, inner)?));
    }
    Ok(Operand::Single(parse_usize(line, token)?))
}

fn max_qubit_in_operand(operand: &Operand) -> usize {
    match operand {
        Operand::Single(q) => *q,
        Operand::Broadcast(qs) | Operand::List(qs) => qs.iter().copied().max().unwrap_or(0),
    }
}

fn single_qubit_gate(gate_name: &str, column: usize, target: usize, angle: Option<f64>) -> PlacedGate {
    PlacedGate {
        gate_name: gate_name.to_string(),
        column,
        target_qubit: target,
        other_qubit: None,
        control_qubits: Vec::new(),
        angle,
    }
}

/// Builds the one or more placed gates a single operand expands to. Most
/// gates produce exactly one; `(...)`-broadcast single-qubit gates produce
/// one per listed qubit, all sharing the same column.
fn build_placed_gates(
    line: usize,
    gate_name: &str,
    column: usize,
    operand: Operand,
    angle: Option<f64>,
) -> QubiResult<Vec<PlacedGate>> {
    if SINGLE_QUBIT_GATES.contains(&gate_name) {
        return match operand {
            Operand::Single(q) => Ok(vec![single_qubit_gate(gate_name, column, q, angle)]),
            Operand::Broadcast(qs) => Ok(qs
                .into_iter()
                .map(|q| single_qubit_gate(gate_name, column, q, angle))
                .collect()),
            Operand::List(_) => Err(parse_error(
                line,
                format!("{gate_name} takes a qubit or a (...) broadcast, not [...]"),
            )),
        };
    }

    match gate_name {
        "SWAP" | "iSWAP" | "SqrtSWAP" => match operand {
            Operand::List(qs) if qs.len() == 2 => Ok(vec![PlacedGate {
                gate_name: gate_name.to_string(),
                column,
                target_qubit: qs[1],
                other_qubit: Some(qs[0]),
                control_qubits: Vec::new(),
                angle,
            }]),
            _ => Err(parse_error(line, format!("{gate_name} expects [q0,q1]"))),
        },
        "FR" => match operand {
            Operand::List(qs) if qs.len() == 3 => Ok(vec![PlacedGate {
                gate_name: gate_name.to_string(),
                column,
                target_qubit: qs[1],
                other_qubit: Some(qs[2]),
                control_qubits: vec![qs[0]],
                angle,
            }]),
            _ => Err(parse_error(line, "FR expects [control,target0,target1]")),
        },
        "CX" | "CY" | "CZ" | "CH" | "TF" | "CNX" | "CNY" | "CNZ" => match operand {
            Operand::List(qs) if qs.len() >= 2 => {
                let (controls, target) = qs.split_at(qs.len() - 1);
                Ok(vec![PlacedGate {
                    gate_name: gate_name.to_string(),
                    column,
                    target_qubit: target[0],
                    other_qubit: None,
                    control_qubits: controls.to_vec(),
                    angle,
                }])
            }
            _ => Err(parse_error(
                line,
                format!("{gate_name} expects [control0,...,controlN,target]"),
            )),
        },
        other => Err(QubiError::UnknownGate(other.to_string())),
    }
}

fn is_known_gate(name: &str) -> bool {
    name == "MEASURE" || GATE_NAMES.contains(&name)
}

struct Statement<'a> {
    tokens: Vec<&'a str>,
}

fn tokenize(source: &str) -> Vec<(usize, String, bool)> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| {
            let line_number = i + 1;
            let trimmed = raw.trim();
            (line_number, raw.to_string(), is_blank_or_comment(trimmed))
        })
        .collect()
}

/// Parses Qubi source text into a [`ParseOutput`]: the resulting circuit
/// plus the original lines annotated with the column each occupies (or
/// `None` for blank/comment lines).
pub fn parse(source: &str) -> QubiResult<ParseOutput> {
    let raw_lines = tokenize(source);

    // First pass: find the highest qubit index referenced so the circuit
    // can be constructed with the right width up front.
    let mut max_qubit = 0usize;
    for (line_number, raw, skip) in &raw_lines {
        if *skip {
            continue;
        }
        let trimmed = raw.trim();
        let mut tokens = trimmed.split_whitespace();
        let head = tokens.next().unwrap();
        if head == "REPEAT" || head == "END" {
            continue;
        }
        let rest: Vec<&str> = tokens.collect();
        if rest.is_empty() {
            return Err(parse_error(*line_number, "expected an operand"));
        }
        let operand_token = rest[0];
        let operand = parse_operand(*line_number, operand_token)?;
        max_qubit = max_qubit.max(max_qubit_in_operand(&operand));
    }

    let mut circuit = QuantumCircuit::new(max_qubit + 1);
    let mut lines = Vec::with_capacity(raw_lines.len());
    let mut column = 0usize;

    for (line_number, raw, skip) in raw_lines {
        if skip {
            lines.push(SourceLine { column: None, raw });
            continue;
        }

        let trimmed = raw.trim();
        let statement = Statement {
            tokens: trimmed.split_whitespace().collect(),
        };

        match statement.tokens[0] {
            "REPEAT" => {
                let count = statement
                    .tokens
                    .get(1)
                    .ok_or_else(|| parse_error(line_number, "REPEAT expects a count"))?;
                let count = parse_usize(line_number, count)?;
                circuit.add_control_flow(ControlFlowBlock {
                    column,
                    kind: ControlFlowKind::Repeat(count),
                })?;
            }
            "END" => {
                circuit.add_control_flow(ControlFlowBlock {
                    column,
                    kind: ControlFlowKind::End,
                })?;
            }
            gate_name if is_known_gate(gate_name) => {
                let operand_token = statement.tokens.get(1).ok_or_else(|| {
                    parse_error(line_number, format!("{gate_name} expects an operand"))
                })?;
                let operand = parse_operand(line_number, operand_token)?;
                let angle = if matches!(gate_name, "RX" | "RY" | "RZ") {
                    let angle_pi_token = statement.tokens.get(2).ok_or_else(|| {
                        parse_error(line_number, format!("{gate_name} expects an angle"))
                    })?;
                    Some(parse_f64(line_number, angle_pi_token)? * PI)
                } else {
                    None
                };
                let gates = build_placed_gates(line_number, gate_name, column, operand, angle)?;
                for gate in gates {
                    circuit.add_gate(gate)?;
                }
            }
            other => return Err(QubiError::UnknownGate(other.to_string())),
        }

        lines.push(SourceLine {
            column: Some(column),
            raw,
        });
        column += 1;
    }

    Ok(ParseOutput { circuit, lines })
}
