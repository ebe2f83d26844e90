//! Shared result type and table printer for the property checks in
//! `gates`, `scenarios`, and `roundtrip`. Mirrors the box-drawn benchmark
//! table the original runtime comparison tool used, applied to pass/fail
//! properties instead of timings.

pub struct PropertyResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl PropertyResult {
    pub fn pass(name: impl Into<String>) -> PropertyResult {
        PropertyResult {
            name: name.into(),
            passed: true,
            detail: String::new(),
        }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> PropertyResult {
        PropertyResult {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

pub fn print_section(title: &str) {
    let width = 61;
    let padding = width.saturating_sub(title.len() + 2);
    println!("┌{}┐", "─".repeat(width));
    println!("│ {}{} │", title, " ".repeat(padding));
    println!("└{}┘\n", "─".repeat(width));
}

pub fn print_results_table(results: &[PropertyResult]) {
    const C1: usize = 48;
    const C2: usize = 6;

    let top = format!("╔{}═{}╗", "═".repeat(C1 + 2), "═".repeat(C2 + 2));
    let header_sep = format!("╠{}╪{}╣", "═".repeat(C1 + 2), "═".repeat(C2 + 2));
    let bottom = format!("╚{}╧{}╝", "═".repeat(C1 + 2), "═".repeat(C2 + 2));

    println!("{top}");
    println!("║ {:<C1$} │ {:^C2$} ║", "Property", "Result");
    println!("{header_sep}");
    for result in results {
        let mark = if result.passed { "✓" } else { "✗" };
        println!("║ {:<C1$} │ {:^C2$} ║", result.name, mark);
        if !result.passed {
            println!("║   {:<width$} ║", result.detail, width = C1 + C2 + 1);
        }
    }
    println!("{bottom}");
}

pub fn print_summary(results: &[PropertyResult]) -> bool {
    let failed: Vec<&PropertyResult> = results.iter().filter(|r| !r.passed).collect();
    println!();
    if failed.is_empty() {
        println!("✓ All {} properties held.", results.len());
    } else {
        println!(
            "✗ {} of {} properties failed:",
            failed.len(),
            results.len()
        );
        for result in &failed {
            println!("  - {}: {}", result.name, result.detail);
        }
    }
    failed.is_empty()
}
