//! Human-readable output for boot test runs.

use colored::Colorize;
use std::path::Path;
use std::time::Duration;

use crate::orchestrator::{BootOutcome, BootReport};

pub fn header(name: &str, description: &str) {
    println!("{}", name.bold());
    println!("  {}", description);
    println!();
}

pub fn step_started(ordinal: usize, name: &str) {
    println!("{} {:2}. {}...", "▶".cyan(), ordinal, name);
}

pub fn step_finished(passed: bool, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    if passed {
        println!("      {} ({:.1}s)", "PASS".green().bold(), secs);
    } else {
        println!("      {} ({:.1}s)", "FAIL".red().bold(), secs);
    }
}

/// Print the captured output and the verdict.
pub fn print(report: &BootReport) {
    println!();
    println!("{}", "━".repeat(60));

    match &report.outcome {
        BootOutcome::Passed => {
            println!("{}", "Output:".bold());
            for line in &report.output {
                println!("  {}", line);
            }
            println!("{}", "━".repeat(60));
            println!();
            println!(
                "{} {} passed ({} steps, {:.1}s)",
                "✓".green().bold(),
                report.test_name,
                report.subtests.len(),
                report.duration_secs
            );
        }
        BootOutcome::Failed {
            subtest,
            ordinal,
            kind,
            reason,
            captured,
        } => {
            println!("{} (last {} lines)", "Output:".bold(), captured.len());
            for line in captured {
                println!("  {}", escape_control(line));
            }
            println!("{}", "━".repeat(60));
            println!();
            if *ordinal == 0 {
                println!("{} {} could not start", "✗".red().bold(), report.test_name);
            } else {
                println!(
                    "{} {} failed at step {}: {}",
                    "✗".red().bold(),
                    report.test_name,
                    ordinal,
                    subtest
                );
            }
            println!("    {} {}", format!("{kind}:").yellow(), reason);
        }
    }
}

/// Make control characters (`\r` above all) visible without touching any
/// other text the target printed.
fn escape_control(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

/// Write the report as pretty JSON.
pub fn write_json(report: &BootReport, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("Writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::SubtestRecord;

    #[test]
    fn escapes_only_control_characters() {
        assert_eq!(
            escape_control("12%\r100% \"done\" in C:\\boot 'ok'"),
            "12%\\r100% \"done\" in C:\\boot 'ok'"
        );
        assert_eq!(escape_control("\x1b[0mtab\there"), "\\u{1b}[0mtab\\there");
        assert_eq!(escape_control("plain line"), "plain line");
    }

    #[test]
    fn json_report_is_written_to_disk() {
        let report = BootReport {
            test_name: "json".to_string(),
            description: "socket pair".to_string(),
            outcome: BootOutcome::Failed {
                subtest: "Checking for the string: 'x'".to_string(),
                ordinal: 1,
                kind: "TimeoutError".to_string(),
                reason: "timed out after 1s waiting for 'x'".to_string(),
                captured: vec!["boot".to_string()],
            },
            subtests: vec![SubtestRecord {
                ordinal: 1,
                name: "Checking for the string: 'x'".to_string(),
                passed: false,
                duration_secs: 1.0,
            }],
            output: vec!["boot".to_string()],
            duration_secs: 1.0,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json(&report, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["kind"], "TimeoutError");
        assert_eq!(json["outcome"]["captured"][0], "boot");
    }
}
