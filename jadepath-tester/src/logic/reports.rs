//! Report rendering for scenario sweeps.

use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

use super::scenarios::ScenarioResult;

pub fn generate_console_report(results: &[ScenarioResult], total_duration: Duration) {
    println!();
    println!("{}", "📊 Jadepath Logic Test Results".bright_cyan().bold());
    println!("{}", "==============================".cyan());

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    println!("Total scenarios: {total_tests}");
    println!("Passed: {}", passed_tests.to_string().green());
    println!("Failed: {}", failed_tests.to_string().red());
    println!("Total time: {total_duration:?}");
    println!();

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        println!("{} {}", status, result.scenario_name.bold());
        println!(
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        );
        println!("   Average time: {:?}", result.average_duration);

        if !result.failures.is_empty() {
            println!("   Failures:");
            for failure in &result.failures {
                println!("     • {}", failure.red());
            }
        }
        println!();
    }
}

pub fn generate_json_report(results: &[ScenarioResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

pub fn generate_markdown_report(results: &[ScenarioResult]) -> String {
    let mut out = String::from("# Jadepath Logic Test Results\n\n## Summary\n\n");
    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    out.push_str(&format!("- **Total scenarios**: {total_tests}\n"));
    out.push_str(&format!("- **Passed**: {passed_tests}\n"));
    out.push_str(&format!("- **Failed**: {}\n\n", total_tests - passed_tests));

    out.push_str("## Scenarios\n\n");
    for result in results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!(
            "- **{}** — {} ({}/{} iterations)\n",
            result.scenario_name, status, result.successful_iterations, result.iterations_run
        ));
        for failure in &result.failures {
            out.push_str(&format!("  - {failure}\n"));
        }
    }
    out
}
