use super::ui;
use crate::core::analyzer::{Analyzer, ComparisonReport, Subject};
use crate::core::error::LimitError;
use crate::core::metrics::{AssetReport, IndicatorCategory};
use crate::core::radar::RadarScores;
use crate::core::returns::Period;
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn run(
    analyzer: &Analyzer,
    subject: &Subject,
    symbols: &[String],
    force_refresh: bool,
) -> Result<()> {
    if symbols.is_empty() {
        println!("No symbols given and no watchlist symbols configured.");
        return Ok(());
    }

    let pb = ui::new_spinner(&format!("Analyzing {} symbols", symbols.len()));
    let report = analyzer.compare(subject, symbols, force_refresh).await;
    pb.finish_and_clear();

    display_report(&report);
    Ok(())
}

fn display_report(report: &ComparisonReport) {
    let reports: Vec<&AssetReport> = report.reports().collect();
    if !reports.is_empty() {
        println!("\n{}", ui::style_text("Performance", ui::StyleType::Title));
        println!("{}", metrics_table(&reports));
        if reports.iter().any(|r| has_fundamentals(r)) {
            println!("\n{}", ui::style_text("Fundamentals", ui::StyleType::Title));
            println!("{}", fundamentals_table(&reports));
        }
        println!("\n{}", ui::style_text("Comparison scores", ui::StyleType::Title));
        println!("{}", radar_table(&report.radar));
    }
    print_failures(report);
}

pub(crate) fn print_failures(report: &ComparisonReport) {
    for (symbol, error) in report.failures() {
        let hint = match error.downcast_ref::<LimitError>() {
            Some(LimitError::QuotaExhausted { .. }) => " (try again tomorrow)",
            Some(LimitError::RateLimited { .. }) => " (try again shortly)",
            None => "",
        };
        eprintln!(
            "{} {}: {:#}{}",
            ui::style_text("✗", ui::StyleType::Error),
            ui::style_text(symbol, ui::StyleType::Label),
            error,
            ui::style_text(hint, ui::StyleType::Subtle)
        );
    }
}

pub(crate) fn metrics_table(reports: &[&AssetReport]) -> Table {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("Symbol"), ui::header_cell("Price")];
    for period in Period::ALL {
        header.push(ui::header_cell(&period.to_string()));
    }
    for label in ["Vol 30D", "Sharpe", "RSI 14", "SMA 50>200", "From 52W High", "CAGR"] {
        header.push(ui::header_cell(label));
    }
    table.set_header(header);

    for report in reports {
        let metrics = &report.metrics;
        let mut row = vec![
            symbol_cell(report),
            ui::format_optional_cell(report.price, |p| match &report.currency {
                Some(currency) => format!("{p:.2} {currency}"),
                None => format!("{p:.2}"),
            }),
        ];
        for period in Period::ALL {
            row.push(ui::optional_change_cell(metrics.changes.get(period)));
        }
        row.push(ui::format_optional_cell(metrics.std_dev_30, |v| format!("{v:.2}%")));
        row.push(ui::format_optional_cell(metrics.sharpe, |v| format!("{v:.2}")));
        row.push(ui::format_optional_cell(metrics.rsi_14, |v| format!("{v:.1}")));
        row.push(ui::format_optional_cell(metrics.sma_signal, |up| {
            if up { "▲".to_string() } else { "▼".to_string() }
        }));
        row.push(ui::format_optional_cell(metrics.dist_52w_high, |v| format!("{v:.2}%")));
        row.push(ui::optional_change_cell(metrics.annualized_return));
        table.add_row(row);
    }
    table
}

fn symbol_cell(report: &AssetReport) -> Cell {
    Cell::new(format!(
        "{}\n{}",
        report.symbol,
        ui::style_text(report.display_name(), ui::StyleType::Subtle)
    ))
}

const FUNDAMENTAL_CATEGORIES: [IndicatorCategory; 3] = [
    IndicatorCategory::Valuation,
    IndicatorCategory::Profitability,
    IndicatorCategory::Leverage,
];

fn has_fundamentals(report: &AssetReport) -> bool {
    FUNDAMENTAL_CATEGORIES.iter().any(|category| {
        report
            .indicators
            .get(category)
            .is_some_and(|values| values.values().any(Option::is_some))
    })
}

pub(crate) fn fundamentals_table(reports: &[&AssetReport]) -> Table {
    let mut table = ui::new_styled_table();
    let columns = [
        ("P/E", "pe_ratio"),
        ("Fwd P/E", "forward_pe"),
        ("P/B", "price_to_book"),
        ("ROE", "return_on_equity"),
        ("Margin", "profit_margin"),
        ("D/E", "debt_to_equity"),
    ];

    let mut header = vec![ui::header_cell("Symbol")];
    for (label, _) in columns {
        header.push(ui::header_cell(label));
    }
    header.push(ui::header_cell("Target"));
    header.push(ui::header_cell("Upside"));
    table.set_header(header);

    for report in reports {
        let value = |name: &str| {
            FUNDAMENTAL_CATEGORIES
                .iter()
                .find_map(|category| report.indicators.get(category)?.get(name).copied())
                .flatten()
        };
        let mut row = vec![symbol_cell(report)];
        for (_, name) in columns {
            let percent = matches!(name, "return_on_equity" | "profit_margin");
            row.push(ui::format_optional_cell(value(name), |v| {
                if percent {
                    format!("{v:.1}%")
                } else {
                    format!("{v:.2}")
                }
            }));
        }
        let target = &report.price_target;
        row.push(ui::format_optional_cell(target.mean, |mean| {
            match target.analyst_count {
                Some(count) => format!("{mean:.2} ({count})"),
                None => format!("{mean:.2}"),
            }
        }));
        row.push(ui::optional_change_cell(value("target_upside")));
        table.add_row(row);
    }
    table
}

pub(crate) fn radar_table(radar: &RadarScores) -> Table {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("Symbol")];
    for metric in &radar.metrics {
        header.push(ui::header_cell(metric));
    }
    header.push(ui::header_cell("Average"));
    table.set_header(header);

    for (symbol, _) in &radar.assets {
        let mut row = vec![Cell::new(symbol)];
        for metric in &radar.metrics {
            row.push(ui::score_cell(radar.score(symbol, metric)));
        }
        row.push(ui::score_cell(radar.average(symbol)));
        table.add_row(row);
    }
    table
}
