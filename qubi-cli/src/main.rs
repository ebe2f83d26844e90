use qubi_core::core::engine::EngineConfig;
use qubi_core::maths::format::{format_amplitude, format_basis_ket, format_probability};
use qubi_engine::Engine;
use std::env;
use std::fs;
use std::process::ExitCode;

fn print_header() {
    println!("═══════════════════════════════════════════════════════════════");
    println!("                    Qubi Circuit Simulator");
    println!("═══════════════════════════════════════════════════════════════\n");
}

fn print_usage() {
    println!("Usage: qubi-cli <FILE.qubi> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --no-optimize   Use the generic kernel instead of the specialized fast paths");
    println!("  --steps         Print every intermediate snapshot instead of just the final one");
    println!("  --bloch         Also print Bloch coordinates for every qubit");
    println!("  --verbose       Enable debug-level tracing to stderr");
    println!("  help            Show this help message");
    println!();
    println!("Examples:");
    println!("  qubi-cli bell.qubi");
    println!("  qubi-cli grover.qubi --steps");
}

fn run(path: &str, use_optimized_gates: bool, print_steps: bool, print_bloch: bool) -> Result<(), String> {
    let source = fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;

    let config = EngineConfig {
        use_optimized_gates,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_config(0, config);
    engine.parse(&source).map_err(|e| e.to_string())?;
    let num_qubits = engine.num_qubits();
    engine.run().map_err(|e| e.to_string())?;

    if print_steps {
        for (step, snapshot) in engine.snapshots().iter().enumerate() {
            println!("-- step {step} --");
            print_state(&snapshot.state.amplitudes, num_qubits);
        }
    } else {
        print_state(&engine.state_vector().amplitudes, num_qubits);
    }

    if print_bloch {
        println!();
        for qubit in 0..num_qubits {
            let (x, y, z) = engine.bloch_coordinates(qubit).map_err(|e| e.to_string())?;
            let pure = engine.is_qubit_pure(qubit).map_err(|e| e.to_string())?;
            println!("  qubit {qubit}: bloch=({x:.4}, {y:.4}, {z:.4}) pure={pure}");
        }
    }
    Ok(())
}

fn print_state(amplitudes: &[qubi_core::maths::complex::Complex], num_qubits: usize) {
    for (index, amplitude) in amplitudes.iter().enumerate() {
        let probability = amplitude.norm2();
        if probability < 1e-12 {
            continue;
        }
        println!(
            "  {} amplitude={}  probability={}",
            format_basis_ket(index, num_qubits),
            format_amplitude(amplitude),
            format_probability(probability)
        );
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "help" || a == "--help" || a == "-h") {
        print_header();
        print_usage();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--verbose") {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    print_header();

    let path = &args[0];
    let use_optimized_gates = !args.iter().any(|a| a == "--no-optimize");
    let print_steps = args.iter().any(|a| a == "--steps");
    let print_bloch = args.iter().any(|a| a == "--bloch");

    match run(path, use_optimized_gates, print_steps, print_bloch) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
