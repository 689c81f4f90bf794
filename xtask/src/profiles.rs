use anyhow::Result;
use colored::Colorize;
use frame_diff::{DiffConfig, LinkProfile};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "Link profiles".cyan().bold());
    println!();
    println!(
        "  {:<10} {:>16} {:>16}",
        "name".bold(),
        "restart bytes".bold(),
        "merge threshold".bold()
    );
    for profile in LinkProfile::ALL {
        println!(
            "  {:<10} {:>16} {:>16}",
            profile.name().green(),
            profile.restart_overhead_bytes(),
            profile.merge_threshold()
        );
    }
    println!();
    println!(
        "   {}",
        format!(
            "Default config uses '{}' (threshold {})",
            LinkProfile::Spi8Bit.name(),
            DiffConfig::DEFAULT.merge_threshold
        )
        .dimmed()
    );
    println!(
        "   {}",
        "Select one with 'cargo xtask diff --profile <name> ...'".dimmed()
    );
    println!();
    Ok(())
}
