//! Terminal styling utilities

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::ScoringConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static RULES: Emoji<'_, '_> = Emoji("🧩 ", "");
pub static RANK: Emoji<'_, '_> = Emoji("🔢 ", "");

/// Print the application banner with ASCII art
pub fn print_banner(version: &str) {
    let banner = r#"
    ██████╗ ███████╗███╗   ███╗███████╗███████╗ ██████╗
    ██╔══██╗██╔════╝████╗ ████║██╔════╝██╔════╝██╔════╝
    ██████╔╝█████╗  ██╔████╔██║███████╗█████╗  ██║  ███╗
    ██╔══██╗██╔══╝  ██║╚██╔╝██║╚════██║██╔══╝  ██║   ██║
    ██║  ██║██║     ██║ ╚═╝ ██║███████║███████╗╚██████╔╝
    ╚═╝  ╚═╝╚═╝     ╚═╝     ╚═╝╚══════╝╚══════╝ ╚═════╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("◆").magenta().bold(),
        style("Recency · Frequency · Monetary customer segmentation").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(input: &Path, output: &Path, scoring: &ScoringConfig, rules_source: &str) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:  {:<39}│", FOLDER, truncate_path(input, 38));
    println!("    │  {} Output: {:<39}│", SAVE, truncate_path(output, 38));
    println!("    │  {} Rules:  {:<39}│", RULES, truncate_string(rules_source, 38));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Bins per metric:       {:<24}│",
        CHART,
        style(scoring.bins).yellow()
    );
    println!(
        "    │  {} Binning (R / F / M):   {:<24}│",
        RANK,
        style(format!(
            "{} / {} / {}",
            scoring.recency, scoring.frequency, scoring.monetary
        ))
        .yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print the elapsed time of a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("RFM segmentation complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_short() {
        assert_eq!(truncate_string("orders.csv", 38), "orders.csv");
    }

    #[test]
    fn test_truncate_string_keeps_tail() {
        let truncated = truncate_string("/very/long/path/to/some/orders.csv", 15);
        assert_eq!(truncated.chars().count(), 15);
        assert!(truncated.starts_with("..."));
        assert!(truncated.ends_with("orders.csv"));
    }

    #[test]
    fn test_truncate_multibyte_does_not_panic() {
        let truncated = truncate_string("ééééééééééééééééééééé", 10);
        assert_eq!(truncated.chars().count(), 10);
    }
}
