//! Terminal summary of a segmentation run

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{SegmentationResult, SegmentationSummary};

/// Score rows shown in the distribution table
const TOP_SCORES: usize = 10;

/// Print the metric cards, segment populations and score distribution
pub fn display_summary(result: &SegmentationResult, summary: &SegmentationSummary) {
    print_section("📋", "RFM SUMMARY");

    let mut table = new_table(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("👥 Customers"),
        Cell::new(summary.customer_count)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("🧾 Transactions"),
        Cell::new(result.transaction_count),
    ]);
    table.add_row(vec![
        Cell::new("🗑️  Dropped (no customer)"),
        Cell::new(result.dropped_missing_customer).fg(if result.dropped_missing_customer == 0 {
            Color::White
        } else {
            Color::Yellow
        }),
    ]);
    table.add_row(vec![
        Cell::new("📅 Snapshot"),
        Cell::new(result.snapshot.format("%Y-%m-%d %H:%M:%S")),
    ]);
    table.add_row(vec![
        Cell::new("🏆 Best score"),
        score_cell(summary.best_score.map(|s| s.to_string()), Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("🔻 Worst score"),
        score_cell(summary.worst_score.map(|s| s.to_string()), Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("⏱️  Avg recency"),
        Cell::new(format!("{:.1} days", summary.recency_days.mean)),
    ]);
    table.add_row(vec![
        Cell::new("💰 Avg monetary"),
        Cell::new(format!("{:.2}", summary.monetary.mean)),
    ]);
    print_indented(&table);

    print_section("📈", "METRIC RANGES");
    let mut table = new_table(vec!["Metric", "Min", "Max", "Mean"]);
    for (name, stats, decimals) in [
        ("Recency (days)", &summary.recency_days, 0),
        ("Frequency", &summary.frequency, 0),
        ("Monetary", &summary.monetary, 2),
        ("Composite", &summary.composite_score, 0),
    ] {
        table.add_row(vec![
            Cell::new(name),
            number_cell(stats.min, decimals),
            number_cell(stats.max, decimals),
            number_cell(stats.mean, 2),
        ]);
    }
    print_indented(&table);

    print_section("🧩", "SEGMENTS");
    let mut table = new_table(vec!["Segment", "Customers", "Share"]);
    for entry in &summary.segment_counts {
        let share = if summary.customer_count > 0 {
            entry.count as f64 / summary.customer_count as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(&entry.segment).add_attribute(Attribute::Bold),
            Cell::new(entry.count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", share))
                .fg(share_color(share))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);

    if !summary.score_distribution.is_empty() {
        print_section("🔢", "TOP COMPOSITE SCORES");
        let mut table = new_table(vec!["Score", "Customers"]);
        for entry in summary.score_distribution.iter().take(TOP_SCORES) {
            table.add_row(vec![
                Cell::new(entry.score).fg(Color::Cyan),
                Cell::new(entry.count).set_alignment(CellAlignment::Right),
            ]);
        }
        print_indented(&table);

        let hidden = summary.score_distribution.len().saturating_sub(TOP_SCORES);
        if hidden > 0 {
            println!(
                "    {}",
                style(format!("... and {} more score(s)", hidden)).dim()
            );
        }
    }
}

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn score_cell(score: Option<String>, color: Color) -> Cell {
    match score {
        Some(s) => Cell::new(s).fg(color).add_attribute(Attribute::Bold),
        None => Cell::new("-"),
    }
}

fn number_cell(value: f64, decimals: usize) -> Cell {
    Cell::new(format!("{:.*}", decimals, value)).set_alignment(CellAlignment::Right)
}

fn share_color(share: f64) -> Color {
    if share >= 40.0 {
        Color::Green
    } else if share >= 10.0 {
        Color::Yellow
    } else {
        Color::White
    }
}
