//! The concrete end-to-end scenarios and the normalization/Bloch-radius
//! invariants, run against [`qubi_engine::Engine`] exactly as a caller
//! would drive it.

use crate::common::PropertyResult;
use qubi_engine::Engine;

const TOLERANCE: f64 = 1e-8;

fn run_source(source: &str) -> Engine {
    let mut engine = Engine::new(0);
    engine.parse(source).expect("fixture source must parse");
    engine.run().expect("fixture circuit must run");
    engine
}

pub fn run(results: &mut Vec<PropertyResult>) {
    bell_pair(results);
    ghz_three(results);
    grover_two_qubit(results);
    parameterized_rotation(results);
    step_back_then_forward_symmetry(results);
    multi_control_diffusion(results);
    normalization_holds_after_every_scenario(results);
    bloch_radius_is_bounded(results);
}

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn bell_pair(results: &mut Vec<PropertyResult>) {
    let engine = run_source("H 0\nCX [0,1]\n");
    let probabilities = engine.probabilities();
    let ok = approx(probabilities[0b00].1, 0.5, TOLERANCE)
        && approx(probabilities[0b11].1, 0.5, TOLERANCE)
        && probabilities[0b01].1 < 1e-12
        && probabilities[0b10].1 < 1e-12;
    results.push(if ok {
        PropertyResult::pass("bell pair: amp[00]=amp[11]=1/sqrt2")
    } else {
        PropertyResult::fail(
            "bell pair: amp[00]=amp[11]=1/sqrt2",
            format!("probabilities were {probabilities:?}"),
        )
    });

    let marginal_ok = (0..2).all(|q| approx(engine.qubit_probability(q).unwrap(), 0.5, TOLERANCE));
    let bloch_ok = (0..2).all(|q| {
        let (x, y, z) = engine.bloch_coordinates(q).unwrap();
        x.abs() < TOLERANCE && y.abs() < TOLERANCE && z.abs() < TOLERANCE
    });
    results.push(if marginal_ok && bloch_ok {
        PropertyResult::pass("bell pair: each qubit maximally mixed at the Bloch origin")
    } else {
        PropertyResult::fail(
            "bell pair: each qubit maximally mixed at the Bloch origin",
            "marginal or Bloch coordinates were off".to_string(),
        )
    });
}

fn ghz_three(results: &mut Vec<PropertyResult>) {
    let engine = run_source("H 0\nCX [0,1]\nCX [1,2]\n");
    let probabilities = engine.probabilities();
    let others_zero = probabilities
        .iter()
        .all(|&(i, p)| i == 0 || i == 7 || p < 1e-12);
    let ok = approx(probabilities[0].1, 0.5, TOLERANCE)
        && approx(probabilities[7].1, 0.5, TOLERANCE)
        && others_zero;
    results.push(if ok {
        PropertyResult::pass("GHZ-3: weight only on |000> and |111>")
    } else {
        PropertyResult::fail(
            "GHZ-3: weight only on |000> and |111>",
            format!("probabilities were {probabilities:?}"),
        )
    });
}

fn grover_two_qubit(results: &mut Vec<PropertyResult>) {
    let engine = run_source(
        "H (0,1)\nREPEAT 1\nCZ [0,1]\nH (0,1)\nX (0,1)\nCZ [0,1]\nX (0,1)\nH (0,1)\nEND\n",
    );
    let probability_11 = engine.probabilities()[0b11].1;
    results.push(if approx(probability_11, 1.0, TOLERANCE) {
        PropertyResult::pass("grover(2 qubits, target=11): converges to |11>")
    } else {
        PropertyResult::fail(
            "grover(2 qubits, target=11): converges to |11>",
            format!("|amp[11]|^2 = {probability_11}"),
        )
    });
}

fn parameterized_rotation(results: &mut Vec<PropertyResult>) {
    let engine = run_source("RX 0 1.0\n");
    let state = engine.state_vector();
    let ok = state.amplitudes[0].norm2() < 1e-16
        && approx(state.amplitudes[1].real, 0.0, TOLERANCE)
        && approx(state.amplitudes[1].imaginary, -1.0, TOLERANCE);
    results.push(if ok {
        PropertyResult::pass("RX(pi) on |0>: lands on -i|1>")
    } else {
        PropertyResult::fail(
            "RX(pi) on |0>: lands on -i|1>",
            format!("amplitudes were {:?}", state.amplitudes),
        )
    });
}

fn step_back_then_forward_symmetry(results: &mut Vec<PropertyResult>) {
    let mut engine = Engine::new(0);
    engine.parse("H 0\nX 0\nH 0\n").unwrap();
    engine.run().unwrap();
    let final_state = engine.state_vector();

    engine.step_back().unwrap();
    engine.step_back().unwrap();
    engine.step_back().unwrap();
    let fresh_ok = engine.state_vector() == qubi_core::core::state::StateVector::fresh(1);

    engine.step_forward().unwrap();
    engine.step_forward().unwrap();
    engine.step_forward().unwrap();
    let forward_ok = engine.state_vector() == final_state;

    results.push(if fresh_ok && forward_ok {
        PropertyResult::pass("step-back/step-forward symmetry over a 3-gate circuit")
    } else {
        PropertyResult::fail(
            "step-back/step-forward symmetry over a 3-gate circuit",
            "stepping back three times did not reach |0>, or forward did not reach the run state"
                .to_string(),
        )
    });
}

fn multi_control_diffusion(results: &mut Vec<PropertyResult>) {
    let engine = run_source("H (0,1,2)\nCZ [0,1,2]\nH (0,1,2)\n");
    let probabilities = engine.probabilities();
    // H . CCZ . H is a reflection about |---> that concentrates weight onto
    // |000>: p(|000>) = 0.5625, the remaining seven basis states split the
    // rest evenly at 0.0625 each.
    let p000 = probabilities[0].1;
    let rest_ok = probabilities
        .iter()
        .all(|&(i, p)| i == 0 || approx(p, 0.0625, TOLERANCE));
    let ok = approx(p000, 0.5625, TOLERANCE) && rest_ok;
    results.push(if ok {
        PropertyResult::pass("multi-control CNZ: H-CCZ-H concentrates weight onto |000>")
    } else {
        PropertyResult::fail(
            "multi-control CNZ: H-CCZ-H concentrates weight onto |000>",
            format!("p(|000>) = {p000}, probabilities = {probabilities:?}"),
        )
    });
}

fn normalization_holds_after_every_scenario(results: &mut Vec<PropertyResult>) {
    let sources = [
        "H 0\nCX [0,1]\n",
        "H 0\nCX [0,1]\nCX [1,2]\n",
        "RX 0 0.73\nRY 0 -1.4\nRZ 0 2.2\n",
        "REPEAT 5\nH 0\nX 0\nEND\n",
    ];
    let all_normalized = sources.iter().all(|source| {
        let engine = run_source(source);
        let total: f64 = engine.probabilities().iter().map(|&(_, p)| p).sum();
        approx(total, 1.0, 1e-9)
    });
    results.push(if all_normalized {
        PropertyResult::pass("sum of probabilities is 1 after every unitary sequence")
    } else {
        PropertyResult::fail(
            "sum of probabilities is 1 after every unitary sequence",
            "a scenario's total probability drifted from 1".to_string(),
        )
    });
}

fn bloch_radius_is_bounded(results: &mut Vec<PropertyResult>) {
    let sources = ["H 0\n", "RX 0 0.37\nRY 0 1.1\n", "H 0\nCX [0,1]\n"];
    let mut ok = true;
    for source in sources {
        let engine = run_source(source);
        for qubit in 0..engine.num_qubits() {
            let (x, y, z) = engine.bloch_coordinates(qubit).unwrap();
            let radius = (x * x + y * y + z * z).sqrt();
            let pure = engine.is_qubit_pure(qubit).unwrap();
            if radius > 1.0 + 1e-9 {
                ok = false;
            }
            if pure && !approx(radius, 1.0, 1e-6) {
                ok = false;
            }
        }
    }
    results.push(if ok {
        PropertyResult::pass("Bloch radius <= 1, with equality iff the reduced state is pure")
    } else {
        PropertyResult::fail(
            "Bloch radius <= 1, with equality iff the reduced state is pure",
            "a qubit's Bloch radius exceeded 1 or disagreed with its purity".to_string(),
        )
    });
}
