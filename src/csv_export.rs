//! CSV export for cards and sales.
//!
//! The column layout and quoting follow the established interchange format:
//! text fields are always quoted (doubled-quote escaping), numeric fields are
//! bare, dates are `yyyy-mm-dd` or blank. Lines are written by hand so the
//! quoting stays exactly as importers expect it.

use crate::error::AppResult;
use crate::store::{cards, sales};
use rusqlite::Connection;
use std::path::Path;

pub const CARDS_HEADER: &str = "Id,Nome,Set,Numero,Rarità,Lingua,Condizione,PrezzoAcquisto,\
DataAcquisto,Fonte,PrezzoAttuale,Quantità,ValoreTotale,ProfittoStimato,ROI";

pub const SALES_HEADER: &str =
    "Id,CardId,NomeCarta,Set,DataVendita,PrezzoVendita,Fee,CostoSpedizione,Quantità,ProfittoNetto";

/// Doubles embedded quotes for a quoted CSV field.
fn escape_csv(value: &str) -> String {
    value.replace('"', "\"\"")
}

/// Exports all cards to `path`; returns the number of rows written.
pub fn export_cards_csv(conn: &Connection, path: &Path) -> AppResult<usize> {
    let cards = cards::get_all_cards(conn)?;

    let mut out = String::with_capacity(1024);
    out.push_str(CARDS_HEADER);
    out.push('\n');
    for card in &cards {
        let date = card
            .purchase_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",{},{},\"{}\",{},{},{},{},{}\n",
            card.id,
            escape_csv(&card.name),
            escape_csv(&card.set_name),
            escape_csv(&card.number),
            escape_csv(&card.rarity),
            escape_csv(&card.language),
            escape_csv(&card.condition),
            card.purchase_price,
            date,
            escape_csv(&card.source),
            card.current_price,
            card.quantity,
            card.total_value(),
            card.estimated_profit(),
            card.roi(),
        ));
    }
    std::fs::write(path, &out)?;

    log::info!("Exported {} cards to {}", cards.len(), path.display());
    Ok(cards.len())
}

/// Exports all sales (joined with their card) to `path`.
pub fn export_sales_csv(conn: &Connection, path: &Path) -> AppResult<usize> {
    let records = sales::get_all_sales(conn)?;

    let mut out = String::with_capacity(1024);
    out.push_str(SALES_HEADER);
    out.push('\n');
    for record in &records {
        out.push_str(&format!(
            "{},{},\"{}\",\"{}\",{},{},{},{},{},{}\n",
            record.sale.id,
            record.sale.card_id,
            escape_csv(&record.card_name),
            escape_csv(&record.card_set),
            record.sale.sale_date.format("%Y-%m-%d"),
            record.sale.sale_price,
            record.sale.fee,
            record.sale.shipping_cost,
            record.sale.quantity,
            record.net_profit(),
        ));
    }
    std::fs::write(path, &out)?;

    log::info!("Exported {} sales to {}", records.len(), path.display());
    Ok(records.len())
}
