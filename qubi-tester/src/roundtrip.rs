//! Parse/emit round-trip properties: re-emitting a parsed program must
//! reproduce it byte-for-byte (comments and blank lines included), and
//! re-parsing the emission must reproduce the same circuit structurally.

use crate::common::PropertyResult;
use qubi_engine::Engine;

pub fn run(results: &mut Vec<PropertyResult>) {
    for (label, source) in FIXTURES {
        verbatim_round_trip(results, label, source);
        structural_round_trip(results, label, source);
    }
    coalesces_broadcast_gates(results);
    indents_nested_repeat_bodies(results);
}

const FIXTURES: &[(&str, &str)] = &[
    ("bell pair", "H 0\nCX [0,1]"),
    (
        "commented ghz",
        "// build a GHZ state\nH 0\n\nCX [0,1]\nCX [1,2]",
    ),
    ("rotation", "RX 0 0.5000\nRY 0 -0.2500"),
    ("repeat block", "REPEAT 3\n  X 0\nEND"),
    (
        "multi-control",
        "H (0,1)\nCNX [0,1,2,3]\nCZ [0,1,2]",
    ),
];

fn verbatim_round_trip(results: &mut Vec<PropertyResult>, label: &str, source: &str) {
    let mut engine = Engine::new(0);
    let name = format!("{label}: emit() reproduces the source verbatim");
    match engine.parse(source) {
        Ok(()) => {
            let emitted = engine.emit();
            if emitted == source {
                results.push(PropertyResult::pass(name));
            } else {
                results.push(PropertyResult::fail(
                    name,
                    format!("expected {source:?}, got {emitted:?}"),
                ));
            }
        }
        Err(err) => results.push(PropertyResult::fail(name, err.to_string())),
    }
}

fn structural_round_trip(results: &mut Vec<PropertyResult>, label: &str, source: &str) {
    let name = format!("{label}: parse(emit(parse(source))) matches parse(source)");
    let mut first = Engine::new(0);
    let Ok(()) = first.parse(source) else {
        results.push(PropertyResult::fail(name, "initial parse failed".to_string()));
        return;
    };
    let mut second = Engine::new(0);
    match second.parse(&first.emit()) {
        Ok(()) => {
            if first.circuit().all_gates() == second.circuit().all_gates()
                && first.num_qubits() == second.num_qubits()
            {
                results.push(PropertyResult::pass(name));
            } else {
                results.push(PropertyResult::fail(
                    name,
                    "re-parsed circuit differs from the original".to_string(),
                ));
            }
        }
        Err(err) => results.push(PropertyResult::fail(name, err.to_string())),
    }
}

fn coalesces_broadcast_gates(results: &mut Vec<PropertyResult>) {
    let mut engine = Engine::new(0);
    engine.parse("H (0,1,2)").unwrap();
    let name = "same-column single-qubit gates coalesce into one broadcast line".to_string();
    if engine.emit() == "H (0,1,2)" {
        results.push(PropertyResult::pass(name));
    } else {
        results.push(PropertyResult::fail(
            name,
            format!("emitted {:?}", engine.emit()),
        ));
    }
}

fn indents_nested_repeat_bodies(results: &mut Vec<PropertyResult>) {
    let mut engine = Engine::new(0);
    engine.parse("REPEAT 2\n  REPEAT 2\n    X 0\n  END\nEND").unwrap();
    let name = "nested REPEAT/END bodies indent by nesting depth".to_string();
    let emitted = engine.emit();
    if emitted == "REPEAT 2\n  REPEAT 2\n    X 0\n  END\nEND" {
        results.push(PropertyResult::pass(name));
    } else {
        results.push(PropertyResult::fail(name, format!("emitted {emitted:?}")));
    }
}
