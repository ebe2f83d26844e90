mod common;
mod gates;
mod roundtrip;
mod scenarios;

use common::{print_results_table, print_section, print_summary, PropertyResult};
use std::env;
use std::process::ExitCode;

fn print_header() {
    println!("═══════════════════════════════════════════════════════════════");
    println!("                 Qubi Conformance Checker");
    println!("═══════════════════════════════════════════════════════════════\n");
}

fn print_usage() {
    println!("Usage: qubi-tester [OPTIONS]");
    println!();
    println!("Options:");
    println!("  all         Run every property check (default)");
    println!("  gates       Check gate-library unitarity and kernel agreement");
    println!("  scenarios   Run the end-to-end circuit scenarios");
    println!("  roundtrip   Check parse/emit round-trip properties");
    println!("  help        Show this help message");
    println!();
    println!("Examples:");
    println!("  qubi-tester                  # Run every property check");
    println!("  qubi-tester gates            # Only the gate-library checks");
    println!("  qubi-tester scenarios roundtrip");
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args
        .iter()
        .any(|a| a == "help" || a == "--help" || a == "-h")
    {
        print_usage();
        return ExitCode::SUCCESS;
    }

    print_header();

    let mut results: Vec<PropertyResult> = Vec::new();

    let run_all = args.is_empty() || args.iter().any(|a| a == "all");
    let run_gates = run_all || args.iter().any(|a| a == "gates");
    let run_scenarios = run_all || args.iter().any(|a| a == "scenarios");
    let run_roundtrip = run_all || args.iter().any(|a| a == "roundtrip");

    if run_gates {
        print_section("Gate library");
        let mut section = Vec::new();
        gates::run(&mut section);
        print_results_table(&section);
        results.extend(section);
    }

    if run_scenarios {
        print_section("End-to-end scenarios");
        let mut section = Vec::new();
        scenarios::run(&mut section);
        print_results_table(&section);
        results.extend(section);
    }

    if run_roundtrip {
        print_section("Parse/emit round-trip");
        let mut section = Vec::new();
        roundtrip::run(&mut section);
        print_results_table(&section);
        results.extend(section);
    }

    if results.is_empty() {
        return ExitCode::SUCCESS;
    }

    if print_summary(&results) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
