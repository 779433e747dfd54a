use super::compare::print_failures;
use super::ui;
use crate::core::analyzer::{Analyzer, Subject};
use crate::core::correlation::{Alignment, CorrelationMatrix};
use anyhow::Result;
use comfy_table::{Attribute, Cell, Table};

pub async fn run(
    analyzer: &Analyzer,
    subject: &Subject,
    symbols: &[String],
    force_refresh: bool,
) -> Result<()> {
    if symbols.len() < 2 {
        println!("At least two symbols are needed to correlate.");
        return Ok(());
    }

    let pb = ui::new_spinner(&format!("Fetching {} symbols", symbols.len()));
    let report = analyzer.compare(subject, symbols, force_refresh).await;
    pb.finish_and_clear();

    if report.correlation.len() >= 2 {
        println!(
            "\n{} {}",
            ui::style_text("Correlation of daily returns", ui::StyleType::Title),
            ui::style_text(alignment_note(report.correlation.alignment), ui::StyleType::Subtle)
        );
        println!("{}", matrix_table(&report.correlation));
        print_stats(&report.correlation);
    }
    print_failures(&report);
    Ok(())
}

fn alignment_note(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::ByDate => "(paired by date)",
        Alignment::Positional => "(paired by position)",
    }
}

pub(crate) fn matrix_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("")];
    for symbol in &matrix.symbols {
        header.push(ui::header_cell(symbol));
    }
    table.set_header(header);

    for (i, symbol) in matrix.symbols.iter().enumerate() {
        let mut row = vec![Cell::new(symbol).add_attribute(Attribute::Bold)];
        for j in 0..matrix.len() {
            row.push(ui::correlation_cell(matrix.get(i, j)));
        }
        table.add_row(row);
    }
    table
}

fn print_stats(matrix: &CorrelationMatrix) {
    match matrix.stats() {
        Some(stats) => println!(
            "{} {:.2}  {} {:.2}  {} {:.2}  {}",
            ui::style_text("Average:", ui::StyleType::Label),
            stats.average,
            ui::style_text("Min:", ui::StyleType::Label),
            stats.min,
            ui::style_text("Max:", ui::StyleType::Label),
            stats.max,
            ui::style_text(&format!("over {} pairs", stats.pairs), ui::StyleType::Subtle),
        ),
        None => println!(
            "{}",
            ui::style_text("Not enough overlapping history to correlate.", ui::StyleType::Subtle)
        ),
    }
}
