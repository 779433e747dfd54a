use super::ui;
use crate::core::price::SymbolMatch;
use crate::core::search::SearchSession;
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn run(session: &SearchSession, query: &str) -> Result<()> {
    let pb = ui::new_spinner(&format!("Searching for \"{}\"", query.trim()));
    let outcome = session.search(query).await;
    pb.finish_and_clear();

    match outcome? {
        Some(matches) if matches.is_empty() => println!("No symbols found."),
        Some(matches) => println!("{}", matches_table(&matches)),
        None => println!("Search was superseded."),
    }
    Ok(())
}

pub(crate) fn matches_table(matches: &[SymbolMatch]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Exchange"),
        ui::header_cell("Type"),
    ]);
    let text_cell = |value: &Option<String>| {
        value
            .as_deref()
            .map_or_else(|| ui::na_cell(false), Cell::new)
    };
    for m in matches {
        table.add_row(vec![
            Cell::new(&m.symbol),
            text_cell(&m.name),
            text_cell(&m.exchange),
            text_cell(&m.quote_type),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_table() {
        let matches = vec![SymbolMatch {
            symbol: "SPY".to_string(),
            name: Some("SPDR S&P 500 ETF Trust".to_string()),
            exchange: None,
            quote_type: Some("ETF".to_string()),
        }];
        let rendered = matches_table(&matches).to_string();
        assert!(rendered.contains("SPY"));
        assert!(rendered.contains("ETF"));
        assert!(rendered.contains("N/A"));
    }
}
