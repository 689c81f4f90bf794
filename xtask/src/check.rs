use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// One cargo invocation of the check pipeline
struct Step {
    name: &'static str,
    args: &'static [&'static str],
    /// A failing fatal step aborts the run; others only warn
    fatal: bool,
}

const STEPS: &[Step] = &[
    Step {
        name: "Host build (std, tracing, serde)",
        args: &["check", "-p", "frame-diff", "--all-targets", "--features", "tracing,serde"],
        fatal: true,
    },
    Step {
        name: "Embedded build (no_std, defmt)",
        args: &[
            "check",
            "-p",
            "frame-diff",
            "--target",
            "thumbv7em-none-eabihf",
            "--no-default-features",
            "--features",
            "defmt,serde",
        ],
        fatal: true,
    },
    Step {
        name: "Clippy",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        fatal: false,
    },
    Step {
        name: "Formatting",
        args: &["fmt", "--all", "--check"],
        fatal: false,
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking frame-diff...".cyan().bold());
    println!();

    let total_start = Instant::now();
    for step in STEPS {
        run_step(step)?;
    }

    println!(
        "{}",
        format!("✓ All checks completed in {:.2}s", total_start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();

    Ok(())
}

fn run_step(step: &Step) -> Result<()> {
    println!("{}", format!("  {}...", step.name).cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(step.args)
        .output()
        .with_context(|| format!("Failed to run cargo {}", step.args.join(" ")))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {} passed in {:.2}s", step.name, start.elapsed().as_secs_f64()).green()
        );
        println!();
        return Ok(());
    }

    if step.fatal {
        eprintln!("{}", format!("  ✗ {} failed", step.name).red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{} failed", step.name);
    }

    eprintln!("{}", format!("  ⚠ {} reported issues", step.name).yellow().bold());
    if step.args.first() == Some(&"fmt") {
        eprintln!("     Run 'cargo fmt --all' to fix");
    } else {
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
    }
    println!();
    Ok(())
}
