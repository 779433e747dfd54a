use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(na_cell(false).set_alignment(CellAlignment::Right), |v| {
        Cell::new(format_fn(v)).set_alignment(CellAlignment::Right)
    })
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: f64) -> Cell {
    let text = format!("{change:.2}%");
    let color = if change >= 0.0 { Color::Green } else { Color::Red };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

/// Percentage change cell, or "N/A" when unavailable.
pub fn optional_change_cell(change: Option<f64>) -> Cell {
    change.map_or(na_cell(false).set_alignment(CellAlignment::Right), change_cell)
}

/// Correlation coefficient colored by sign and strength.
pub fn correlation_cell(value: Option<f64>) -> Cell {
    let Some(value) = value else {
        return na_cell(false).set_alignment(CellAlignment::Right);
    };
    let color = match value {
        v if v >= 0.7 => Color::Green,
        v if v <= -0.3 => Color::Red,
        _ => Color::Reset,
    };
    Cell::new(format!("{value:.2}"))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Radar score in `[0, 1]` rendered as a short bar plus the value.
pub fn score_cell(score: Option<f64>) -> Cell {
    let Some(score) = score else {
        return na_cell(false);
    };
    let filled = ((score * 10.0).round() as usize).min(10);
    Cell::new(format!(
        "{}{} {score:.2}",
        "█".repeat(filled),
        "░".repeat(10 - filled)
    ))
}

/// Creates a cell for "N/A" values, with error-specific styling.
pub fn na_cell(has_error: bool) -> Cell {
    let color = if has_error {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new("N/A").fg(color)
}

/// Creates a spinner shown while requests are in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_cell_bar() {
        assert_eq!(score_cell(Some(0.5)).content(), "█████░░░░░ 0.50");
        assert_eq!(score_cell(Some(1.0)).content(), "██████████ 1.00");
        assert_eq!(score_cell(None).content(), "N/A");
    }

    #[test]
    fn test_optional_cells() {
        assert_eq!(optional_change_cell(Some(-1.234)).content(), "-1.23%");
        assert_eq!(optional_change_cell(None).content(), "N/A");
        assert_eq!(format_optional_cell(Some(1.5), |v| format!("{v:.1}")).content(), "1.5");
        assert_eq!(correlation_cell(Some(0.8765)).content(), "0.88");
    }
}
