//! rfmseg: RFM Customer Segmentation CLI Tool
//!
//! Loads transactional order data, scores every customer on Recency,
//! Frequency and Monetary value, and assigns named segments.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use rfmseg::cli::{confirm_overwrite, load_rules, run_rules, Cli, Commands};
use rfmseg::pipeline::{
    compute_segmentation, read_raw_transactions, SegmentTable, SegmentationConfig,
};
use rfmseg::report::{display_summary, export_summary_json, package_bundle, save_table};
use rfmseg::utils::{
    create_spinner, finish_with_error, finish_with_success, init_logging, print_banner,
    print_completion, print_config, print_count, print_info, print_step_header, print_step_time,
    print_success, print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Rules { output } => run_rules(output.as_deref()),
        };
    }

    // Main segmentation pipeline - require input
    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;
    let output_path = cli
        .output_path()
        .context("Could not derive an output path from the input file")?;
    let report_path = cli.report_path();
    let bundle_path = cli.bundle_path();

    let (segments, rules_source) = match &cli.rules {
        Some(path) => (load_rules(path)?, path.display().to_string()),
        None => (SegmentTable::default(), "built-in".to_string()),
    };
    let config = SegmentationConfig {
        scoring: cli.scoring_config(),
        segments,
    };

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(input, &output_path, &config.scoring, &rules_source);

    if !cli.no_confirm {
        let targets: Vec<&Path> = [
            Some(output_path.as_path()),
            report_path.as_deref(),
            bundle_path.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !confirm_overwrite(&targets)? {
            println!("Cancelled by user.");
            return Ok(());
        }
    }

    // Step 1: Load order rows
    print_step_header(1, "Load Orders");

    let step_start = Instant::now();
    let spinner = create_spinner("Reading order file...");
    let rows = match read_raw_transactions(input, &cli.column_mapping()) {
        Ok(rows) => rows,
        Err(e) => {
            finish_with_error(&spinner, "Failed to read order file");
            return Err(e);
        }
    };
    finish_with_success(&spinner, "Order file loaded");
    print_count("order row(s)", rows.len(), None);
    print_step_time(step_start.elapsed());

    // Step 2: Aggregate, score and classify
    print_step_header(2, "Score & Segment Customers");

    let step_start = Instant::now();
    let spinner = create_spinner("Computing RFM scores...");
    let result = match compute_segmentation(&rows, &config) {
        Ok(result) => result,
        Err(e) => {
            finish_with_error(&spinner, "Segmentation failed");
            return Err(e).context("Failed to compute RFM segmentation");
        }
    };
    finish_with_success(&spinner, "Segmentation complete");

    if result.dropped_missing_customer > 0 {
        print_warning(&format!(
            "Skipped {} row(s) without a customer id",
            result.dropped_missing_customer
        ));
    }
    print_count(
        "customer(s)",
        result.customer_count(),
        Some(&format!("(from {} transactions)", result.transaction_count)),
    );
    print_info(&format!(
        "Snapshot date: {}",
        style(result.snapshot.format("%Y-%m-%d %H:%M:%S")).cyan()
    ));
    print_step_time(step_start.elapsed());

    let summary = result.summary(&config.segments);

    // Step 3: Write outputs
    print_step_header(3, "Save Results");

    let step_start = Instant::now();
    let spinner = create_spinner("Writing result table...");
    if let Err(e) = save_table(&result, &output_path) {
        finish_with_error(&spinner, "Failed to write result table");
        return Err(e);
    }
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));

    if let Some(report_path) = &report_path {
        export_summary_json(
            &result,
            &summary,
            &config.scoring,
            &config.segments,
            input,
            report_path,
        )?;
        print_success(&format!("Summary report: {}", report_path.display()));
    }

    if let Some(bundle_path) = &bundle_path {
        let mut files = vec![output_path.as_path()];
        files.extend(report_path.as_deref());
        package_bundle(&files, bundle_path)?;
        print_success(&format!("Bundle: {}", bundle_path.display()));
    }
    print_step_time(step_start.elapsed());

    display_summary(&result, &summary);

    print_completion();

    Ok(())
}
