//! Bulk card import from CSV.
//!
//! Row failures are collected, not fatal: a malformed row is reported with
//! its line number and processing continues. Only the successfully parsed
//! batch is committed, in a single transaction.

use crate::error::{AppError, AppResult};
use crate::models::Card;
use crate::store::cards;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

/// Minimum fields a data row must carry (through the Quantità column)
const MIN_FIELDS: usize = 12;

/// Outcome of a bulk import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Number of data rows seen (header excluded)
    pub total_rows: usize,
    /// Number of cards inserted
    pub imported: usize,
    /// Per-row error messages, with 1-based file line numbers
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Imports cards from a CSV file with the layout written by the card export
/// (the Id and derived columns are ignored on the way in).
pub fn import_cards_csv(conn: &mut Connection, path: &Path) -> AppResult<ImportReport> {
    log::info!("Starting bulk import from {}", path.display());

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut report = ImportReport::default();
    let mut parsed = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        // 1-based file line, accounting for the header row
        let line = i + 2;
        report.total_rows += 1;
        match result {
            Ok(record) => match parse_card_record(&record) {
                Ok(card) => parsed.push(card),
                Err(msg) => report.errors.push(format!("Row {}: {}", line, msg)),
            },
            Err(e) => report.errors.push(format!("Row {}: {}", line, e)),
        }
    }

    if !parsed.is_empty() {
        let tx = conn.transaction()?;
        for card in &parsed {
            cards::add_card(&tx, card)?;
        }
        tx.commit()?;
        report.imported = parsed.len();
    }

    log::info!(
        "Imported {} of {} rows ({} errors)",
        report.imported,
        report.total_rows,
        report.error_count()
    );
    Ok(report)
}

fn parse_card_record(record: &csv::StringRecord) -> Result<Card, String> {
    if record.len() < MIN_FIELDS {
        return Err(format!(
            "expected at least {} columns, found {}",
            MIN_FIELDS,
            record.len()
        ));
    }

    let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

    let card = Card {
        id: 0,
        name: field(1),
        set_name: field(2),
        number: field(3),
        rarity: field(4),
        language: field(5),
        condition: field(6),
        // Unparsable prices default to 0
        purchase_price: field(7).parse::<f64>().unwrap_or(0.0),
        purchase_date: NaiveDate::parse_from_str(&field(8), "%Y-%m-%d").ok(),
        source: field(9),
        current_price: field(10).parse::<f64>().unwrap_or(0.0),
        // Missing or invalid quantity defaults to 1
        quantity: match field(11).parse::<i64>() {
            Ok(q) if q > 0 => q,
            _ => 1,
        },
        version: 0,
    };

    card.validate().map_err(|e| match e {
        AppError::Validation(msg) => msg,
        other => other.to_string(),
    })?;
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_export::export_cards_csv;
    use crate::db::open_in_memory;
    use crate::store::cards::{count_cards, get_all_cards};
    use std::io::Write;

    fn import_str(conn: &mut Connection, content: &str) -> ImportReport {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{}", content).unwrap();
        import_cards_csv(conn, tmp.path()).unwrap()
    }

    const HEADER: &str = "Id,Nome,Set,Numero,Rarità,Lingua,Condizione,PrezzoAcquisto,DataAcquisto,Fonte,PrezzoAttuale,Quantità,ValoreTotale,ProfittoStimato,ROI\n";

    #[test]
    fn imports_well_formed_rows() {
        let mut conn = open_in_memory().unwrap();
        let report = import_str(
            &mut conn,
            &format!(
                "{}1,\"Pikachu\",\"Base Set\",\"58\",\"Common\",\"English\",\"NM\",10.5,2025-06-01,\"eBay\",15,4,60,18,42.8\n\
                 2,\"Charizard\",\"Base Set\",\"4\",\"Holo Rare\",\"English\",\"LP\",200,,\"Local shop\",350,1,350,150,75\n",
                HEADER
            ),
        );

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.imported, 2);
        assert!(report.is_success());

        let all = get_all_cards(&conn).unwrap();
        assert_eq!(all.len(), 2);
        let pikachu = all.iter().find(|c| c.name == "Pikachu").unwrap();
        assert_eq!(pikachu.set_name, "Base Set");
        assert!((pikachu.purchase_price - 10.5).abs() < 1e-9);
        assert_eq!(
            pikachu.purchase_date,
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(pikachu.quantity, 4);

        let zard = all.iter().find(|c| c.name == "Charizard").unwrap();
        assert_eq!(zard.purchase_date, None);
    }

    #[test]
    fn rejects_rows_missing_required_fields() {
        let mut conn = open_in_memory().unwrap();
        let report = import_str(
            &mut conn,
            &format!(
                "{}1,\"\",\"Base Set\",\"58\",,,,10,,,15,1,,,\n\
                 2,\"Pikachu\",\"Base Set\",\"58\",,,,10,,,15,1,,,\n",
                HEADER
            ),
        );

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.imported, 1);
        assert_eq!(report.error_count(), 1);
        assert!(report.errors[0].starts_with("Row 2:"), "{:?}", report.errors);
        assert_eq!(count_cards(&conn, None).unwrap(), 1);
    }

    #[test]
    fn rejects_rows_with_too_few_columns() {
        let mut conn = open_in_memory().unwrap();
        let report = import_str(
            &mut conn,
            &format!("{}1,\"Pikachu\",\"Base Set\"\n", HEADER),
        );

        assert_eq!(report.imported, 0);
        assert_eq!(report.error_count(), 1);
        assert!(report.errors[0].contains("columns"));
    }

    #[test]
    fn defaults_bad_price_to_zero_and_bad_quantity_to_one() {
        let mut conn = open_in_memory().unwrap();
        let report = import_str(
            &mut conn,
            &format!(
                "{}1,\"Pikachu\",\"Base Set\",\"58\",,,,abc,,,xyz,notanumber,,,\n",
                HEADER
            ),
        );
        assert_eq!(report.imported, 1);

        let card = &get_all_cards(&conn).unwrap()[0];
        assert_eq!(card.purchase_price, 0.0);
        assert_eq!(card.current_price, 0.0);
        assert_eq!(card.quantity, 1);
    }

    #[test]
    fn handles_quoted_fields_with_embedded_commas_and_quotes() {
        let mut conn = open_in_memory().unwrap();
        let report = import_str(
            &mut conn,
            &format!(
                "{}1,\"Mr. Mime, the \"\"Great\"\"\",\"Jungle\",\"6\",,,,1,,,2,1,,,\n",
                HEADER
            ),
        );
        assert_eq!(report.imported, 1);

        let card = &get_all_cards(&conn).unwrap()[0];
        assert_eq!(card.name, "Mr. Mime, the \"Great\"");
    }

    #[test]
    fn export_then_import_round_trips_card_fields() {
        let mut conn = open_in_memory().unwrap();
        import_str(
            &mut conn,
            &format!(
                "{}1,\"Pikachu\",\"Base Set\",\"58\",\"Common\",\"English\",\"NM\",10.5,2025-06-01,\"eBay\",15,4,,,\n\
                 2,\"Charizard\",\"Base Set\",\"4\",\"Holo Rare\",\"Italian\",\"LP\",200,,\"Local shop\",350,1,,,\n",
                HEADER
            ),
        );
        let originals = get_all_cards(&conn).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.csv");
        export_cards_csv(&conn, &path).unwrap();

        let mut reimported_db = open_in_memory().unwrap();
        let report = import_cards_csv(&mut reimported_db, &path).unwrap();
        assert_eq!(report.imported, 2);

        let mut reimported = get_all_cards(&reimported_db).unwrap();
        // Compare ignoring ids and tokens
        reimported.sort_by(|a, b| a.name.cmp(&b.name));
        let mut originals = originals;
        originals.sort_by(|a, b| a.name.cmp(&b.name));
        for (orig, copy) in originals.iter().zip(&reimported) {
            assert_eq!(orig.name, copy.name);
            assert_eq!(orig.set_name, copy.set_name);
            assert_eq!(orig.number, copy.number);
            assert_eq!(orig.rarity, copy.rarity);
            assert_eq!(orig.language, copy.language);
            assert_eq!(orig.condition, copy.condition);
            assert_eq!(orig.purchase_price, copy.purchase_price);
            assert_eq!(orig.purchase_date, copy.purchase_date);
            assert_eq!(orig.source, copy.source);
            assert_eq!(orig.current_price, copy.current_price);
            assert_eq!(orig.quantity, copy.quantity);
        }
    }

    #[test]
    fn empty_file_reports_no_rows() {
        let mut conn = open_in_memory().unwrap();
        let report = import_str(&mut conn, HEADER);
        assert_eq!(report.total_rows, 0);
        assert_eq!(report.imported, 0);
        assert!(report.is_success());
    }
}
