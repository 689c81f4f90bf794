use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

/// Build the `frame-diff` API docs, failing on broken intra-doc links
pub fn run(open: bool) -> Result<()> {
    println!("{}", "Building frame-diff docs...".cyan().bold());

    let mut cmd = Command::new("cargo");
    cmd.args(["doc", "-p", "frame-diff", "--no-deps", "--features", "serde,tracing"])
        .env("RUSTDOCFLAGS", "-D rustdoc::broken_intra_doc_links");
    if open {
        cmd.arg("--open");
    }

    let status = cmd.status().context("Failed to run cargo doc")?;
    if !status.success() {
        anyhow::bail!("cargo doc failed");
    }

    println!("{} target/doc/frame_diff/index.html", "✓".green());
    Ok(())
}
