//! SQLite connection handling, schema and database backup.
//!
//! Uses parameterized queries exclusively; foreign keys are enforced so a
//! card referenced by sales cannot be hard-deleted.

use crate::error::{AppError, AppResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Returns the default database path: ~/.local/share/card_manager/cards.db
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("card_manager")
        .join("cards.db")
}

/// Opens (or creates) the database at `path` and initialises the schema.
pub fn open(path: &Path) -> AppResult<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    configure(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, for tests.
pub fn open_in_memory() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// Creates the `cards` and `sales` tables if they do not already exist.
///
/// Both tables carry a `version` column used purely for optimistic-concurrency
/// comparison. `sales.card_id` is restrict-on-delete.
pub fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cards (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            name           TEXT NOT NULL,
            set_name       TEXT NOT NULL,
            number         TEXT NOT NULL,
            rarity         TEXT NOT NULL DEFAULT '',
            language       TEXT NOT NULL DEFAULT '',
            condition      TEXT NOT NULL DEFAULT '',
            purchase_price REAL NOT NULL DEFAULT 0,
            purchase_date  TEXT,
            source         TEXT NOT NULL DEFAULT '',
            current_price  REAL NOT NULL DEFAULT 0,
            quantity       INTEGER NOT NULL DEFAULT 1,
            version        INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS sales (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            card_id       INTEGER NOT NULL REFERENCES cards(id) ON DELETE RESTRICT,
            sale_date     TEXT NOT NULL,
            sale_price    REAL NOT NULL,
            fee           REAL NOT NULL DEFAULT 0,
            shipping_cost REAL NOT NULL DEFAULT 0,
            quantity      INTEGER NOT NULL,
            version       INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_sales_card ON sales(card_id);
        CREATE INDEX IF NOT EXISTS idx_sales_date ON sales(sale_date);
        ",
    )?;
    log::debug!("Database schema initialised");
    Ok(())
}

/// Copies the live database file byte-for-byte to `dest`.
///
/// The active connection is closed first so the copy sees a consistent file,
/// then reopened and returned.
pub fn backup_database(conn: Connection, db_path: &Path, dest: &Path) -> AppResult<Connection> {
    conn.close().map_err(|(_, e)| AppError::Database(e))?;
    std::fs::copy(db_path, dest)?;
    log::info!("Database backed up to {}", dest.display());
    open(db_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Card;
    use crate::store::cards;

    fn test_card(name: &str) -> Card {
        Card {
            id: 0,
            name: name.to_string(),
            set_name: "Base Set".to_string(),
            number: "1".to_string(),
            rarity: String::new(),
            language: String::new(),
            condition: String::new(),
            purchase_price: 1.0,
            purchase_date: None,
            source: String::new(),
            current_price: 2.0,
            quantity: 1,
            version: 0,
        }
    }

    #[test]
    fn schema_creates_tables() {
        let conn = open_in_memory().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('cards', 'sales')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_in_memory().unwrap();
        let on: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(on, 1);
    }

    #[test]
    fn backup_copies_the_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("cards.db");
        let dest = dir.path().join("backup.db");

        let conn = open(&db_path).unwrap();
        cards::add_card(&conn, &test_card("Charizard")).unwrap();

        let conn = backup_database(conn, &db_path, &dest).unwrap();
        // Original connection still usable after reopen
        assert_eq!(cards::count_cards(&conn, None).unwrap(), 1);

        let backup = Connection::open(&dest).unwrap();
        let count: i64 = backup
            .query_row("SELECT COUNT(*) FROM cards", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
