//! cohortstats: descriptive statistics CLI
//!
//! `cohortstats preop` and `cohortstats intraop` each write a tree of
//! `Analyzed_data_*.csv` reports plus a `run_report.json` at the output root.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use cohortstats::cli::{log_filter, Cli, Commands};
use cohortstats::pipeline::{run_intraop_analysis, run_preop_analysis, RunReport};
use cohortstats::report::{export_run_report, ExportParams, RunSummary};
use cohortstats::utils::{
    print_banner, print_completion, print_count, print_info, print_intraop_config,
    print_preop_config, print_step_header, print_success,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(cli.verbose)))
        .format_timestamp(None)
        .init();

    print_banner(env!("CARGO_PKG_VERSION"));

    let (phase, input_dir, output_dir, report) = match &cli.command {
        Commands::Preop(args) => {
            let config = args.to_config().map_err(anyhow::Error::msg)?;
            print_preop_config(&config);
            let report = run_batch("Preop analysis", || {
                run_preop_analysis(&config)
            })?;
            ("preop", config.input_dir, config.output_dir, report)
        }
        Commands::Intraop(args) => {
            let config = args.to_config();
            print_intraop_config(&config);
            let report = run_batch("Intraop analysis", || {
                run_intraop_analysis(&config)
            })?;
            ("intraop", config.input_dir, config.output_dir, report)
        }
    };

    RunSummary::new(&format!("{} summary", phase), &report).display();

    print_step_header(2, "Run Report");
    let path = export_run_report(
        &report,
        &ExportParams {
            phase,
            input_dir: &input_dir,
            output_dir: &output_dir,
        },
    )?;
    print_success(&format!("Run report saved to {}", path.display()));

    print_completion(Path::new(&output_dir));
    Ok(())
}

/// Run one batch and report its timing
fn run_batch(title: &str, run: impl FnOnce() -> Result<RunReport>) -> Result<RunReport> {
    print_step_header(1, title);
    let started = Instant::now();

    let report = run()?;
    if report.skipped.is_empty() {
        print_success("All combinations written");
    }

    print_count("report(s) written", report.written.len());
    if !report.skipped.is_empty() {
        print_count("combination(s) skipped", report.skipped.len());
    }
    print_info(&format!("Finished in {:.2}s", started.elapsed().as_secs_f64()));
    Ok(report)
}
