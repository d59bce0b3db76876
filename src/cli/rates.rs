use super::ui;
use crate::core::config::AppConfig;
use crate::core::rate::RateRecord;
use crate::store::open_rate_store;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, Table};

/// Builds the table of stored rates, one row per directed pair.
pub fn rates_table(records: &[RateRecord]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("From"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.from_currency),
            Cell::new(&record.to_currency),
            ui::rate_cell(record.rate),
        ]);
    }
    table
}

pub fn show_rates(config: &AppConfig, date: NaiveDate) -> Result<()> {
    let store = open_rate_store(config)?;
    let records = store.list_for_date(date)?;

    println!(
        "{}",
        ui::style_text(&format!("Exchange rates for {date}"), ui::StyleType::Title)
    );
    if records.is_empty() {
        println!(
            "{}",
            ui::style_text("No rates stored for this date.", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", rates_table(&records));
    Ok(())
}
