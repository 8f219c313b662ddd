use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{FlatDependencyRecord, LicenseRisk};

use super::Report;

/// Render a colored terminal report.
///
/// Copyleft and unknown-license dependencies are always listed; `verbose`
/// adds the permissive ones. `quiet` prints only the summary line.
pub fn render(report: &Report, verbose: bool, quiet: bool) -> Result<()> {
    let summary = report.summary();

    if quiet {
        println!(
            "Total: {}  Copyleft: {}  Permissive: {}  Unknown: {}  Unresolved: {}",
            summary.total,
            summary.copyleft.to_string().red(),
            summary.permissive.to_string().green(),
            summary.unknown.to_string().yellow(),
            report.unresolved,
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "license-tree".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Scanning: {}\n", report.project.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Total dependencies : {}", summary.total)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Copyleft        : {:>4}", "✗".red(), summary.copyleft)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Permissive      : {:>4}", "✓".green(), summary.permissive)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Unknown         : {:>4}", "?".yellow(), summary.unknown)
    );
    println!(
        " │  {:<48} │",
        format!("   Unresolved      : {:>4}", report.unresolved)
    );
    println!(" └────────────────────────────────────────────────────┘\n");
    println!(" {}\n", report.headline());

    if summary.copyleft > 0 {
        println!(" {} Copyleft dependencies:\n", "[COPYLEFT]".red().bold());
        render_table(&report.records, LicenseRisk::Copyleft);
        println!();
    }

    if summary.unknown > 0 {
        println!(" {} Dependencies without a detected license:\n", "[UNKNOWN]".yellow().bold());
        render_table(&report.records, LicenseRisk::Unknown);
        println!();
    }

    if verbose && summary.permissive > 0 {
        println!(" {} Permissive dependencies:\n", "[PERMISSIVE]".green().bold());
        render_table(&report.records, LicenseRisk::Permissive);
        println!();
    }

    Ok(())
}

fn render_table(records: &[FlatDependencyRecord], risk_filter: LicenseRisk) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Ecosystem").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Parent").add_attribute(Attribute::Bold),
            Cell::new("Details").add_attribute(Attribute::Bold),
        ]);

    for record in records.iter().filter(|r| r.risk() == risk_filter) {
        let license_color = match risk_filter {
            LicenseRisk::Copyleft => Color::Red,
            LicenseRisk::Permissive => Color::Green,
            LicenseRisk::Unknown => Color::Yellow,
        };

        table.add_row(vec![
            Cell::new(&record.name),
            Cell::new(&record.version),
            Cell::new(record.ecosystem.to_string()),
            Cell::new(&record.license).fg(license_color),
            Cell::new(&record.parent),
            Cell::new(&record.details_url).fg(Color::DarkGrey),
        ]);
    }

    println!("{}", table);
}
