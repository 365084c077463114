//! Run summary table printed at the end of a batch

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::RunReport;

/// Console summary of a finished batch
#[derive(Debug)]
pub struct RunSummary<'a> {
    pub title: &'a str,
    pub report: &'a RunReport,
}

impl<'a> RunSummary<'a> {
    pub fn new(title: &'a str, report: &'a RunReport) -> Self {
        Self { title, report }
    }

    /// Share of planned combinations that produced a report, in percent
    pub fn success_rate(&self) -> f64 {
        let total = self.report.total();
        if total == 0 {
            0.0
        } else {
            self.report.written.len() as f64 / total as f64 * 100.0
        }
    }

    /// Summary table, without indentation
    pub fn table(&self) -> Table {
        let report = self.report;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📋 Planned Reports"), Cell::new(report.total())]);

        table.add_row(vec![
            Cell::new("✅ Written"),
            Cell::new(report.written.len())
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("⏭️  Skipped"),
            Cell::new(report.skipped.len()).fg(if report.skipped.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);

        table.add_row(vec![
            Cell::new("❓ Missing Columns"),
            Cell::new(report.missing_columns.len()).fg(if report.missing_columns.is_empty() {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);

        let rate = self.success_rate();
        let color = if rate >= 99.99 {
            Color::Green
        } else if rate >= 50.0 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("📈 Success Rate"),
            Cell::new(format!("{:.1}%", rate))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style(self.title.to_uppercase()).white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.table().to_string().lines() {
            println!("    {}", line);
        }

        if !self.report.skipped.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("SKIPPED COMBINATIONS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            for skipped in &self.report.skipped {
                println!(
                    "        {} {} {}",
                    style("•").dim(),
                    skipped.combination,
                    style(format!("[{}] {}", skipped.kind, skipped.message)).dim()
                );
            }
        }

        if !self.report.missing_columns.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Requested but absent").yellow(),
                style(format!("({})", self.report.missing_columns.len())).dim()
            );
            for column in &self.report.missing_columns {
                println!("        {} {}", style("•").dim(), column);
            }
        }
    }
}
