//! Card repository: CRUD and paged search with optimistic concurrency.

use crate::error::{AppError, AppResult};
use crate::models::Card;
use crate::store::page_window;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const CARD_COLUMNS: &str = "id, name, set_name, number, rarity, language, condition, \
     purchase_price, purchase_date, source, current_price, quantity, version";

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let date: Option<String> = row.get(8)?;
    Ok(Card {
        id: row.get(0)?,
        name: row.get(1)?,
        set_name: row.get(2)?,
        number: row.get(3)?,
        rarity: row.get(4)?,
        language: row.get(5)?,
        condition: row.get(6)?,
        purchase_price: row.get(7)?,
        purchase_date: date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        source: row.get(9)?,
        current_price: row.get(10)?,
        quantity: row.get(11)?,
        version: row.get(12)?,
    })
}

fn date_to_sql(date: &Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn is_fk_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}

/// Inserts a card and returns it with its assigned id and a fresh token.
///
/// When `card.id` is nonzero the id is preserved; the undo log uses this to
/// restore a deleted card under its original identity.
pub fn add_card(conn: &Connection, card: &Card) -> AppResult<Card> {
    card.validate()?;

    let id = if card.id == 0 {
        conn.execute(
            "INSERT INTO cards (name, set_name, number, rarity, language, condition,
                 purchase_price, purchase_date, source, current_price, quantity, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1)",
            params![
                card.name,
                card.set_name,
                card.number,
                card.rarity,
                card.language,
                card.condition,
                card.purchase_price,
                date_to_sql(&card.purchase_date),
                card.source,
                card.current_price,
                card.quantity,
            ],
        )?;
        conn.last_insert_rowid()
    } else {
        conn.execute(
            "INSERT INTO cards (id, name, set_name, number, rarity, language, condition,
                 purchase_price, purchase_date, source, current_price, quantity, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1)",
            params![
                card.id,
                card.name,
                card.set_name,
                card.number,
                card.rarity,
                card.language,
                card.condition,
                card.purchase_price,
                date_to_sql(&card.purchase_date),
                card.source,
                card.current_price,
                card.quantity,
            ],
        )?;
        card.id
    };

    log::debug!("Added card {} ({})", id, card.name);
    Ok(Card {
        id,
        version: 1,
        ..card.clone()
    })
}

pub fn get_card(conn: &Connection, id: i64) -> AppResult<Option<Card>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM cards WHERE id = ?1",
        CARD_COLUMNS
    ))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(card_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn get_all_cards(conn: &Connection) -> AppResult<Vec<Card>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM cards ORDER BY id DESC",
        CARD_COLUMNS
    ))?;
    let cards = stmt
        .query_map([], card_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

/// Returns one page of cards, most-recently-created first.
///
/// `search` matches a case-insensitive substring against name, set and
/// number. Page numbers below 1 clamp to 1; page sizes below 1 default to 50.
pub fn get_cards_paged(
    conn: &Connection,
    page: i64,
    page_size: i64,
    search: Option<&str>,
) -> AppResult<Vec<Card>> {
    let (limit, offset) = page_window(page, page_size);

    let cards = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => {
            let pattern = format!("%{}%", text);
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM cards
                 WHERE name LIKE ?1 COLLATE NOCASE
                    OR set_name LIKE ?1 COLLATE NOCASE
                    OR number LIKE ?1 COLLATE NOCASE
                 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
                CARD_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![pattern, limit, offset], card_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM cards ORDER BY id DESC LIMIT ?1 OFFSET ?2",
                CARD_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![limit, offset], card_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };
    Ok(cards)
}

/// Counts cards matching the same filter as [`get_cards_paged`].
pub fn count_cards(conn: &Connection, search: Option<&str>) -> AppResult<i64> {
    let count = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => {
            let pattern = format!("%{}%", text);
            conn.query_row(
                "SELECT COUNT(*) FROM cards
                 WHERE name LIKE ?1 COLLATE NOCASE
                    OR set_name LIKE ?1 COLLATE NOCASE
                    OR number LIKE ?1 COLLATE NOCASE",
                params![pattern],
                |r| r.get(0),
            )?
        }
        None => conn.query_row("SELECT COUNT(*) FROM cards", [], |r| r.get(0))?,
    };
    Ok(count)
}

/// Updates all mutable fields of a card under its version token.
///
/// Fails with `NotFound` when the row is absent and with `Conflict` when the
/// caller's token does not match the stored one; the token itself is never
/// copied from the caller, the store advances it on commit.
pub fn update_card(conn: &Connection, card: &Card) -> AppResult<Card> {
    card.validate()?;

    let stored = get_card(conn, card.id)?.ok_or(AppError::NotFound {
        entity: "card",
        id: card.id,
    })?;
    if stored.version != card.version {
        return Err(AppError::Conflict {
            entity: "card",
            id: card.id,
        });
    }

    let changed = conn.execute(
        "UPDATE cards SET name = ?1, set_name = ?2, number = ?3, rarity = ?4,
             language = ?5, condition = ?6, purchase_price = ?7, purchase_date = ?8,
             source = ?9, current_price = ?10, quantity = ?11, version = version + 1
         WHERE id = ?12 AND version = ?13",
        params![
            card.name,
            card.set_name,
            card.number,
            card.rarity,
            card.language,
            card.condition,
            card.purchase_price,
            date_to_sql(&card.purchase_date),
            card.source,
            card.current_price,
            card.quantity,
            card.id,
            card.version,
        ],
    )?;
    if changed == 0 {
        // Lost the race between the load above and the guarded write
        return Err(AppError::Conflict {
            entity: "card",
            id: card.id,
        });
    }

    log::debug!("Updated card {} ({})", card.id, card.name);
    Ok(Card {
        version: card.version + 1,
        ..card.clone()
    })
}

/// Deletes a card; returns false when it was already absent.
///
/// A card still referenced by sales fails with `ReferentialIntegrity`,
/// surfaced from the restrict-on-delete foreign key.
pub fn delete_card(conn: &Connection, id: i64) -> AppResult<bool> {
    match conn.execute("DELETE FROM cards WHERE id = ?1", params![id]) {
        Ok(n) => {
            if n > 0 {
                log::debug!("Deleted card {}", id);
            }
            Ok(n > 0)
        }
        Err(e) if is_fk_violation(&e) => Err(AppError::ReferentialIntegrity(format!(
            "card {} has recorded sales",
            id
        ))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn make_card(name: &str, set: &str, number: &str) -> Card {
        Card {
            id: 0,
            name: name.to_string(),
            set_name: set.to_string(),
            number: number.to_string(),
            rarity: "Rare".to_string(),
            language: "English".to_string(),
            condition: "NM".to_string(),
            purchase_price: 10.0,
            purchase_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            source: "eBay".to_string(),
            current_price: 15.0,
            quantity: 3,
            version: 0,
        }
    }

    #[test]
    fn add_assigns_id_and_initial_version() {
        let conn = open_in_memory().unwrap();
        let card = add_card(&conn, &make_card("Pikachu", "Base Set", "58")).unwrap();
        assert!(card.id > 0);
        assert_eq!(card.version, 1);

        let stored = get_card(&conn, card.id).unwrap().unwrap();
        assert_eq!(stored, card);
    }

    #[test]
    fn add_preserves_explicit_id() {
        let conn = open_in_memory().unwrap();
        let mut card = make_card("Mewtwo", "Base Set", "10");
        card.id = 42;
        let restored = add_card(&conn, &card).unwrap();
        assert_eq!(restored.id, 42);
        assert!(get_card(&conn, 42).unwrap().is_some());
    }

    #[test]
    fn add_rejects_blank_required_fields() {
        let conn = open_in_memory().unwrap();
        let result = add_card(&conn, &make_card(" ", "Base Set", "1"));
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(count_cards(&conn, None).unwrap(), 0);
    }

    #[test]
    fn round_trips_purchase_date() {
        let conn = open_in_memory().unwrap();
        let card = add_card(&conn, &make_card("Eevee", "Jungle", "51")).unwrap();
        let stored = get_card(&conn, card.id).unwrap().unwrap();
        assert_eq!(stored.purchase_date, NaiveDate::from_ymd_opt(2025, 6, 1));

        let mut dateless = make_card("Ditto", "Fossil", "3");
        dateless.purchase_date = None;
        let card = add_card(&conn, &dateless).unwrap();
        let stored = get_card(&conn, card.id).unwrap().unwrap();
        assert_eq!(stored.purchase_date, None);
    }

    #[test]
    fn paging_orders_newest_first_and_clamps() {
        let conn = open_in_memory().unwrap();
        for i in 1..=5 {
            add_card(&conn, &make_card(&format!("Card {}", i), "Set", "1")).unwrap();
        }

        let page = get_cards_paged(&conn, 1, 2, None).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Card 5");
        assert_eq!(page[1].name, "Card 4");

        // Page below 1 clamps to the first page
        let clamped = get_cards_paged(&conn, 0, 2, None).unwrap();
        assert_eq!(clamped[0].name, "Card 5");

        // Page size below 1 falls back to the default
        let all = get_cards_paged(&conn, 1, 0, None).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let conn = open_in_memory().unwrap();
        add_card(&conn, &make_card("Charizard", "Base Set", "4")).unwrap();
        add_card(&conn, &make_card("Charmander", "Base Set", "46")).unwrap();
        add_card(&conn, &make_card("Squirtle", "Jungle", "63")).unwrap();

        let hits = get_cards_paged(&conn, 1, 50, Some("char")).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(count_cards(&conn, Some("CHAR")).unwrap(), 2);

        // Matches set and number too
        assert_eq!(count_cards(&conn, Some("jungle")).unwrap(), 1);
        assert_eq!(count_cards(&conn, Some("46")).unwrap(), 1);

        // Blank search behaves like no filter
        assert_eq!(count_cards(&conn, Some("  ")).unwrap(), 3);
    }

    #[test]
    fn update_advances_version_and_keeps_fields() {
        let conn = open_in_memory().unwrap();
        let mut card = add_card(&conn, &make_card("Pikachu", "Base Set", "58")).unwrap();
        card.current_price = 99.0;

        let updated = update_card(&conn, &card).unwrap();
        assert_eq!(updated.version, 2);

        let stored = get_card(&conn, card.id).unwrap().unwrap();
        assert_eq!(stored.current_price, 99.0);
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn update_missing_card_is_not_found() {
        let conn = open_in_memory().unwrap();
        let mut card = make_card("Ghost", "None", "0");
        card.id = 999;
        card.version = 1;
        assert!(matches!(
            update_card(&conn, &card),
            Err(AppError::NotFound { entity: "card", .. })
        ));
    }

    #[test]
    fn stale_token_conflicts_and_leaves_row_unchanged() {
        let conn = open_in_memory().unwrap();
        let card = add_card(&conn, &make_card("Pikachu", "Base Set", "58")).unwrap();

        // First writer commits
        let mut first = card.clone();
        first.current_price = 20.0;
        update_card(&conn, &first).unwrap();

        // Second writer still holds the original token
        let mut second = card.clone();
        second.current_price = 77.0;
        assert!(matches!(
            update_card(&conn, &second),
            Err(AppError::Conflict { entity: "card", .. })
        ));

        let stored = get_card(&conn, card.id).unwrap().unwrap();
        assert_eq!(stored.current_price, 20.0);
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn delete_missing_card_is_noop() {
        let conn = open_in_memory().unwrap();
        assert!(!delete_card(&conn, 123).unwrap());
    }

    #[test]
    fn delete_removes_card() {
        let conn = open_in_memory().unwrap();
        let card = add_card(&conn, &make_card("Pikachu", "Base Set", "58")).unwrap();
        assert!(delete_card(&conn, card.id).unwrap());
        assert!(get_card(&conn, card.id).unwrap().is_none());
    }
}
