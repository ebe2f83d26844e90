//! Regenerates canonical Qubi source text from a circuit, reusing the
//! original [`SourceLine`]s so comments and blank lines survive edits made
//! to the circuit after parsing.

use crate::parser::SourceLine;
use qubi_core::core::circuit::{ControlFlowBlock, ControlFlowKind, PlacedGate, QuantumCircuit};
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Single-qubit, parameter-free gates the `(...)`-broadcast syntax can
/// represent; `RX`/`RY`/`RZ` carry a per-placement angle and so each keeps
/// its own line even when several share a column.
const COALESCIBLE_SINGLE_QUBIT_GATES: &[&str] = &[
    "I", "H", "X", "Y", "Z", "S", "T", "Sdg", "Tdg", "SqrtX", "SqrtY", "SqrtZ", "MEASURE",
];

fn format_gate_line(gate: &PlacedGate) -> String {
    match gate.gate_name.as_str() {
        "SWAP" | "iSWAP" | "SqrtSWAP" => format!(
            "{} [{},{}]",
            gate.gate_name,
            gate.other_qubit.unwrap_or(gate.target_qubit),
            gate.target_qubit
        ),
        "CX" | "CY" | "CZ" | "CH" => {
            let mut qubits: Vec<String> =
                gate.control_qubits.iter().map(|q| q.to_string()).collect();
            qubits.push(gate.target_qubit.to_string());
            format!("{} [{}]", gate.gate_name, qubits.join(","))
        }
        "TF" => format!(
            "{} [{},{},{}]",
            gate.gate_name, gate.control_qubits[0], gate.control_qubits[1], gate.target_qubit
        ),
        "FR" => format!(
            "{} [{},{},{}]",
            gate.gate_name,
            gate.control_qubits[0],
            gate.target_qubit,
            gate.other_qubit.unwrap_or(gate.target_qubit)
        ),
        "CNX" | "CNY" | "CNZ" => {
            let mut qubits: Vec<String> =
                gate.control_qubits.iter().map(|q| q.to_string()).collect();
            qubits.push(gate.target_qubit.to_string());
            format!("{} [{}]", gate.gate_name, qubits.join(","))
        }
        "RX" | "RY" | "RZ" => {
            let angle_pi = gate.angle.unwrap_or(0.0) / PI;
            format!("{} {} {:.4}", gate.gate_name, gate.target_qubit, angle_pi)
        }
        _ => format!("{} {}", gate.gate_name, gate.target_qubit),
    }
}

fn format_control_flow_line(block: &ControlFlowBlock) -> String {
    match block.kind {
        ControlFlowKind::Repeat(count) => format!("REPEAT {count}"),
        ControlFlowKind::End => "END".to_string(),
    }
}

/// Groups a column's placed gates by gate name (preserving first-seen
/// order) and renders each group to one or more lines: a run of two or
/// more placements of the same coalescible single-qubit gate collapses
/// into one `(...)`-broadcast line, everything else gets one line per
/// placement.
fn format_gate_column(gates: &[&PlacedGate]) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: Vec<(&str, Vec<&PlacedGate>)> = Vec::new();
    for gate in gates {
        let name = gate.gate_name.as_str();
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, members)) => members.push(gate),
            None => {
                order.push(name);
                groups.push((name, vec![gate]));
            }
        }
    }

    let mut lines = Vec::new();
    for name in order {
        let members = &groups.iter().find(|(n, _)| *n == name).unwrap().1;
        if members.len() > 1 && COALESCIBLE_SINGLE_QUBIT_GATES.contains(&name) {
            let qubits: Vec<String> = members
                .iter()
                .map(|g| g.target_qubit.to_string())
                .collect();
            lines.push(format!("{} ({})", name, qubits.join(",")));
        } else {
            for gate in members {
                lines.push(format_gate_line(gate));
            }
        }
    }
    lines
}

/// Renders every line a column occupies at the given indent depth: one
/// line for a control-flow marker, zero or more for a gate column.
fn format_column_lines(circuit: &QuantumCircuit, column: usize, depth: usize) -> Vec<String> {
    let indent = "  ".repeat(depth);
    if let Some(block) = circuit.control_flow_at_column(column) {
        return vec![format!("{indent}{}", format_control_flow_line(block))];
    }
    format_gate_column(&circuit.gates_at_column(column))
        .into_iter()
        .map(|line| format!("{indent}{line}"))
        .collect()
}

/// Reconstructs Qubi source text for `circuit`, replaying `lines` for
/// layout and appending any columns the circuit has gained since parsing.
/// `REPEAT`/`END` bodies are indented one level per nesting depth.
pub fn generate(circuit: &QuantumCircuit, lines: &[SourceLine]) -> String {
    let mut depths = vec![0usize; circuit.depth()];
    let mut depth = 0usize;
    for (column, slot) in depths.iter_mut().enumerate() {
        match circuit.control_flow_at_column(column).map(|b| b.kind) {
            Some(ControlFlowKind::Repeat(_)) => {
                *slot = depth;
                depth += 1;
            }
            Some(ControlFlowKind::End) => {
                depth = depth.saturating_sub(1);
                *slot = depth;
            }
            None => *slot = depth,
        }
    }

    let mut output = Vec::with_capacity(lines.len());
    let mut covered: BTreeSet<usize> = BTreeSet::new();

    for line in lines {
        match line.column {
            None => output.push(line.raw.clone()),
            Some(column) => {
                covered.insert(column);
                output.extend(format_column_lines(circuit, column, depths[column]));
            }
        }
    }

    for column in 0..circuit.depth() {
        if !covered.contains(&column) {
            output.extend(format_column_lines(circuit, column, depths[column]));
        }
    }

    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn round_trips_a_bell_pair_program_verbatim() {
        let source = "// a bell pair\nH 0\nCX [0,1]\n";
        let parsed = parse(source).unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "// a bell pair\nH 0\nCX [0,1]");
    }

    #[test]
    fn preserves_blank_lines_between_gates() {
        let source = "H 0\n\nX 0\n";
        let parsed = parse(source).unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "H 0\n\nX 0");
    }

    #[test]
    fn round_trips_repeat_blocks_indenting_the_body() {
        let source = "REPEAT 3\nX 0\nEND\n";
        let parsed = parse(source).unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "REPEAT 3\n  X 0\nEND");
    }

    #[test]
    fn nested_repeat_blocks_indent_by_nesting_depth() {
        let source = "REPEAT 2\nREPEAT 2\nX 0\nEND\nEND\n";
        let parsed = parse(source).unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "REPEAT 2\n  REPEAT 2\n    X 0\n  END\nEND");
    }

    #[test]
    fn coalesces_same_column_single_qubit_gates_into_a_broadcast_line() {
        let source = "H (0,1,2)\n";
        let parsed = parse(source).unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "H (0,1,2)");
    }

    #[test]
    fn appends_gates_added_after_parsing() {
        let source = "H 0\n";
        let mut parsed = parse(source).unwrap();
        parsed
            .circuit
            .add_gate(PlacedGate {
                gate_name: "X".to_string(),
                column: 1,
                target_qubit: 0,
                other_qubit: None,
                control_qubits: Vec::new(),
                angle: None,
            })
            .unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "H 0\nX 0");
    }

    #[test]
    fn round_trips_rotation_angle() {
        let source = "RX 0 0.5\n";
        let parsed = parse(source).unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "RX 0 0.5000");
    }

    #[test]
    fn rounds_rotation_angle_to_four_decimals() {
        let source = "RY 0 0.333333\n";
        let parsed = parse(source).unwrap();
        let regenerated = generate(&parsed.circuit, &parsed.lines);
        assert_eq!(regenerated, "RY 0 0.3333");
    }
}
