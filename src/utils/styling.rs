//! Terminal styling utilities for the batch runs

use console::{style, Emoji};
use std::path::Path;

use crate::pipeline::{IntraopConfig, PreopConfig};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static CALENDAR: Emoji<'_, '_> = Emoji("📅 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");

const BOX_WIDTH: usize = 64;

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("cohortstats").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Descriptive statistics for surgical cohorts").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the configuration card of a preop run
pub fn print_preop_config(config: &PreopConfig) {
    let mut lines = vec![
        format!("{} Input:      {}", FOLDER, truncate_path(&config.input_dir, 44)),
        format!("{} Dictionary: {}", CHART, truncate_path(&config.dictionary_path, 44)),
        format!("{} Output:     {}", SAVE, truncate_path(&config.output_dir, 44)),
    ];
    for window in &config.cohorts {
        lines.push(format!("{} {}", CALENDAR, truncate_string(&window.to_string(), 56)));
    }
    lines.push(format!(
        "{} Outcomes: {}",
        GEAR,
        truncate_string(&config.complications().join(", "), 46)
    ));
    print_card("Preop Configuration", &lines);
}

/// Print the configuration card of an intraop run
pub fn print_intraop_config(config: &IntraopConfig) {
    let lines = vec![
        format!("{} Input:    {}", FOLDER, truncate_path(&config.input_dir, 46)),
        format!("{} Output:   {}", SAVE, truncate_path(&config.output_dir, 46)),
        format!("{} Files:    {}", CHART, truncate_string(&config.filenames.join(", "), 46)),
        format!("{} Cohorts:  {}", CALENDAR, truncate_string(&config.cohorts.join(", "), 46)),
    ];
    print_card("Intraop Configuration", &lines);
}

fn print_card(title: &str, lines: &[String]) {
    let line = "─".repeat(BOX_WIDTH - 2);
    println!("    ┌{}┐", line);
    println!("    │ {}", style(title).cyan().bold());
    println!("    ├{}┤", line);
    for text in lines {
        println!("    │  {}", text);
    }
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

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print the final completion message
pub fn print_completion(output: &Path) {
    println!();
    println!(
        "    {} {} {}",
        ROCKET,
        style("Reports written to").green().bold(),
        style(output.display()).green()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize) {
    println!("      Found {} {}", style(count).yellow().bold(), description);
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
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
