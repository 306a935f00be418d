//! Sale repository: transactional quantity adjustment and paged search.
//!
//! Creating a sale decrements the card's stock, deleting one restores it;
//! both run in a single transaction so the card mutation and the sale row are
//! committed together or not at all. A version-guarded card update makes a
//! concurrent writer abort the whole transaction instead of losing an update.

use crate::error::{AppError, AppResult};
use crate::models::{Sale, SaleRecord};
use crate::store::cards::get_card;
use crate::store::page_window;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction};

const SALE_COLUMNS: &str = "s.id, s.card_id, s.sale_date, s.sale_price, s.fee, \
     s.shipping_cost, s.quantity, s.version, c.name, c.set_name, c.purchase_price";

fn sale_from_row(row: &Row<'_>) -> rusqlite::Result<Sale> {
    let date: String = row.get(2)?;
    Ok(Sale {
        id: row.get(0)?,
        card_id: row.get(1)?,
        sale_date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap_or_default(),
        sale_price: row.get(3)?,
        fee: row.get(4)?,
        shipping_cost: row.get(5)?,
        quantity: row.get(6)?,
        version: row.get(7)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SaleRecord> {
    Ok(SaleRecord {
        sale: sale_from_row(row)?,
        card_name: row.get(8)?,
        card_set: row.get(9)?,
        card_purchase_price: row.get(10)?,
    })
}

/// Decrements the card's quantity under its version token; 0 rows changed
/// means another writer got there first and the transaction must abort.
fn adjust_card_quantity(tx: &Transaction<'_>, card_id: i64, new_quantity: i64, version: i64) -> AppResult<()> {
    let changed = tx.execute(
        "UPDATE cards SET quantity = ?1, version = version + 1
         WHERE id = ?2 AND version = ?3",
        params![new_quantity, card_id, version],
    )?;
    if changed == 0 {
        return Err(AppError::Conflict {
            entity: "card",
            id: card_id,
        });
    }
    Ok(())
}

/// Records a sale and decrements the card's stock in one transaction.
///
/// Fails with `NotFound` when the card is missing, `InsufficientQuantity`
/// when the card holds fewer units than the sale asks for, and `Conflict`
/// when the card changed under us; in every failure case nothing is
/// persisted. A nonzero `sale.id` is preserved (undo/redo restore path).
pub fn add_sale(conn: &mut Connection, sale: &Sale) -> AppResult<Sale> {
    sale.validate()?;

    let tx = conn.transaction()?;
    let card = get_card(&tx, sale.card_id)?.ok_or(AppError::NotFound {
        entity: "card",
        id: sale.card_id,
    })?;
    if card.quantity < sale.quantity {
        return Err(AppError::InsufficientQuantity {
            available: card.quantity,
            requested: sale.quantity,
        });
    }

    // Floor at zero: the check above makes this a no-op, it stays as a
    // second line of defense for the never-negative stock invariant.
    let remaining = (card.quantity - sale.quantity).max(0);
    adjust_card_quantity(&tx, card.id, remaining, card.version)?;

    let id = if sale.id == 0 {
        tx.execute(
            "INSERT INTO sales (card_id, sale_date, sale_price, fee, shipping_cost, quantity, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
            params![
                sale.card_id,
                sale.sale_date.format("%Y-%m-%d").to_string(),
                sale.sale_price,
                sale.fee,
                sale.shipping_cost,
                sale.quantity,
            ],
        )?;
        tx.last_insert_rowid()
    } else {
        tx.execute(
            "INSERT INTO sales (id, card_id, sale_date, sale_price, fee, shipping_cost, quantity, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
            params![
                sale.id,
                sale.card_id,
                sale.sale_date.format("%Y-%m-%d").to_string(),
                sale.sale_price,
                sale.fee,
                sale.shipping_cost,
                sale.quantity,
            ],
        )?;
        sale.id
    };
    tx.commit()?;

    log::debug!(
        "Recorded sale {} of card {} (qty {})",
        id,
        sale.card_id,
        sale.quantity
    );
    Ok(Sale {
        id,
        version: 1,
        ..sale.clone()
    })
}

/// Deletes a sale and restores the card's stock in one transaction.
///
/// Returns the deleted sale snapshot so callers can record it for undo.
pub fn delete_sale(conn: &mut Connection, id: i64) -> AppResult<Sale> {
    let tx = conn.transaction()?;
    let sale = get_sale_row(&tx, id)?.ok_or(AppError::NotFound {
        entity: "sale",
        id,
    })?;
    let card = get_card(&tx, sale.card_id)?.ok_or(AppError::NotFound {
        entity: "card",
        id: sale.card_id,
    })?;

    adjust_card_quantity(&tx, card.id, card.quantity + sale.quantity, card.version)?;
    tx.execute("DELETE FROM sales WHERE id = ?1", params![id])?;
    tx.commit()?;

    log::debug!("Deleted sale {}, restored {} units to card {}", id, sale.quantity, sale.card_id);
    Ok(sale)
}

/// Plain optimistic-concurrency update of the sale fields.
///
/// Never recomputes card quantity and never reassigns `card_id`: quantity
/// changes flow only through delete + re-add.
pub fn update_sale(conn: &Connection, sale: &Sale) -> AppResult<Sale> {
    sale.validate()?;

    let stored = get_sale_row(conn, sale.id)?.ok_or(AppError::NotFound {
        entity: "sale",
        id: sale.id,
    })?;
    if stored.version != sale.version {
        return Err(AppError::Conflict {
            entity: "sale",
            id: sale.id,
        });
    }

    let changed = conn.execute(
        "UPDATE sales SET sale_date = ?1, sale_price = ?2, fee = ?3,
             shipping_cost = ?4, quantity = ?5, version = version + 1
         WHERE id = ?6 AND version = ?7",
        params![
            sale.sale_date.format("%Y-%m-%d").to_string(),
            sale.sale_price,
            sale.fee,
            sale.shipping_cost,
            sale.quantity,
            sale.id,
            sale.version,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::Conflict {
            entity: "sale",
            id: sale.id,
        });
    }

    log::debug!("Updated sale {}", sale.id);
    Ok(Sale {
        card_id: stored.card_id,
        version: sale.version + 1,
        ..sale.clone()
    })
}

fn get_sale_row(conn: &Connection, id: i64) -> AppResult<Option<Sale>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, card_id, sale_date, sale_price, fee, shipping_cost, quantity, version
         FROM sales WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => {
            let date: String = row.get(2)?;
            Ok(Some(Sale {
                id: row.get(0)?,
                card_id: row.get(1)?,
                sale_date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap_or_default(),
                sale_price: row.get(3)?,
                fee: row.get(4)?,
                shipping_cost: row.get(5)?,
                quantity: row.get(6)?,
                version: row.get(7)?,
            }))
        }
        None => Ok(None),
    }
}

pub fn get_sale(conn: &Connection, id: i64) -> AppResult<Option<SaleRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM sales s JOIN cards c ON c.id = s.card_id WHERE s.id = ?1",
        SALE_COLUMNS
    ))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(record_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn get_all_sales(conn: &Connection) -> AppResult<Vec<SaleRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM sales s JOIN cards c ON c.id = s.card_id
         ORDER BY s.sale_date DESC, s.id DESC",
        SALE_COLUMNS
    ))?;
    let sales = stmt
        .query_map([], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sales)
}

/// Returns one page of sales, newest sale date first with id as a stable
/// tie-break. `search` matches card name/set; `date` filters on the exact
/// sale date.
pub fn get_sales_paged(
    conn: &Connection,
    page: i64,
    page_size: i64,
    search: Option<&str>,
    date: Option<NaiveDate>,
) -> AppResult<Vec<SaleRecord>> {
    let (limit, offset) = page_window(page, page_size);
    let pattern = search_pattern(search);
    let date = date.map(|d| d.format("%Y-%m-%d").to_string());

    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM sales s JOIN cards c ON c.id = s.card_id
         WHERE (?1 IS NULL OR c.name LIKE ?1 COLLATE NOCASE OR c.set_name LIKE ?1 COLLATE NOCASE)
           AND (?2 IS NULL OR s.sale_date = ?2)
         ORDER BY s.sale_date DESC, s.id DESC LIMIT ?3 OFFSET ?4",
        SALE_COLUMNS
    ))?;
    let sales = stmt
        .query_map(params![pattern, date, limit, offset], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sales)
}

/// Counts sales matching the same filter as [`get_sales_paged`].
pub fn count_sales(
    conn: &Connection,
    search: Option<&str>,
    date: Option<NaiveDate>,
) -> AppResult<i64> {
    let pattern = search_pattern(search);
    let date = date.map(|d| d.format("%Y-%m-%d").to_string());
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sales s JOIN cards c ON c.id = s.card_id
         WHERE (?1 IS NULL OR c.name LIKE ?1 COLLATE NOCASE OR c.set_name LIKE ?1 COLLATE NOCASE)
           AND (?2 IS NULL OR s.sale_date = ?2)",
        params![pattern, date],
        |r| r.get(0),
    )?;
    Ok(count)
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s))
}

/// Sum of all sale prices, computed at query time.
pub fn total_revenue(conn: &Connection) -> AppResult<f64> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(sale_price), 0) FROM sales",
        [],
        |r| r.get(0),
    )?;
    Ok(total)
}

/// Sum of net profits across all sales, computed at query time.
pub fn total_profit(conn: &Connection) -> AppResult<f64> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(s.sale_price - s.fee - s.shipping_cost
                              - c.purchase_price * s.quantity), 0)
         FROM sales s JOIN cards c ON c.id = s.card_id",
        [],
        |r| r.get(0),
    )?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::Card;
    use crate::store::cards::{add_card, delete_card};

    fn seed_card(conn: &Connection, name: &str, quantity: i64, purchase: f64) -> Card {
        add_card(
            conn,
            &Card {
                id: 0,
                name: name.to_string(),
                set_name: "Base Set".to_string(),
                number: "1".to_string(),
                rarity: String::new(),
                language: String::new(),
                condition: String::new(),
                purchase_price: purchase,
                purchase_date: None,
                source: String::new(),
                current_price: purchase * 2.0,
                quantity,
                version: 0,
            },
        )
        .unwrap()
    }

    fn make_sale(card_id: i64, quantity: i64, price: f64, date: &str) -> Sale {
        Sale {
            id: 0,
            card_id,
            sale_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            sale_price: price,
            fee: 1.0,
            shipping_cost: 2.0,
            quantity,
            version: 0,
        }
    }

    fn card_quantity(conn: &Connection, id: i64) -> i64 {
        get_card(conn, id).unwrap().unwrap().quantity
    }

    #[test]
    fn add_decrements_card_quantity() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 5, 10.0);

        let sale = add_sale(&mut conn, &make_sale(card.id, 3, 50.0, "2026-03-01")).unwrap();
        assert!(sale.id > 0);
        assert_eq!(sale.version, 1);
        assert_eq!(card_quantity(&conn, card.id), 2);
        assert_eq!(count_sales(&conn, None, None).unwrap(), 1);

        // Card token advanced with the quantity change
        assert_eq!(get_card(&conn, card.id).unwrap().unwrap().version, 2);
    }

    #[test]
    fn add_fails_on_insufficient_quantity_without_side_effects() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 2, 10.0);

        let result = add_sale(&mut conn, &make_sale(card.id, 3, 50.0, "2026-03-01"));
        assert!(matches!(
            result,
            Err(AppError::InsufficientQuantity {
                available: 2,
                requested: 3
            })
        ));
        assert_eq!(card_quantity(&conn, card.id), 2);
        assert_eq!(count_sales(&conn, None, None).unwrap(), 0);
    }

    #[test]
    fn add_fails_when_card_missing() {
        let mut conn = open_in_memory().unwrap();
        let result = add_sale(&mut conn, &make_sale(99, 1, 10.0, "2026-03-01"));
        assert!(matches!(
            result,
            Err(AppError::NotFound { entity: "card", .. })
        ));
    }

    #[test]
    fn delete_restores_card_quantity() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 5, 10.0);
        let sale = add_sale(&mut conn, &make_sale(card.id, 3, 50.0, "2026-03-01")).unwrap();

        let deleted = delete_sale(&mut conn, sale.id).unwrap();
        assert_eq!(deleted.id, sale.id);
        assert_eq!(card_quantity(&conn, card.id), 5);
        assert_eq!(count_sales(&conn, None, None).unwrap(), 0);
    }

    #[test]
    fn delete_missing_sale_is_not_found() {
        let mut conn = open_in_memory().unwrap();
        assert!(matches!(
            delete_sale(&mut conn, 7),
            Err(AppError::NotFound { entity: "sale", .. })
        ));
    }

    #[test]
    fn sell_then_oversell_then_restore() {
        // Scenario: card {quantity:5}; sell 3 -> 2; sell 3 again -> fails,
        // still 2; delete the first sale -> back to 5, no sales remain.
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Charizard", 5, 100.0);

        let first = add_sale(&mut conn, &make_sale(card.id, 3, 500.0, "2026-03-01")).unwrap();
        assert_eq!(card_quantity(&conn, card.id), 2);

        assert!(add_sale(&mut conn, &make_sale(card.id, 3, 500.0, "2026-03-02")).is_err());
        assert_eq!(card_quantity(&conn, card.id), 2);

        delete_sale(&mut conn, first.id).unwrap();
        assert_eq!(card_quantity(&conn, card.id), 5);
        assert_eq!(count_sales(&conn, None, None).unwrap(), 0);
    }

    #[test]
    fn update_never_touches_card_quantity() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 5, 10.0);
        let mut sale = add_sale(&mut conn, &make_sale(card.id, 2, 50.0, "2026-03-01")).unwrap();

        sale.quantity = 4;
        sale.sale_price = 80.0;
        let updated = update_sale(&conn, &sale).unwrap();
        assert_eq!(updated.version, 2);

        // Quantity on the card is untouched even though the sale quantity changed
        assert_eq!(card_quantity(&conn, card.id), 3);
        let stored = get_sale(&conn, sale.id).unwrap().unwrap();
        assert_eq!(stored.sale.quantity, 4);
        assert_eq!(stored.sale.sale_price, 80.0);
    }

    #[test]
    fn update_with_stale_token_conflicts() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 5, 10.0);
        let sale = add_sale(&mut conn, &make_sale(card.id, 1, 50.0, "2026-03-01")).unwrap();

        let mut first = sale.clone();
        first.fee = 9.0;
        update_sale(&conn, &first).unwrap();

        let mut second = sale.clone();
        second.fee = 0.5;
        assert!(matches!(
            update_sale(&conn, &second),
            Err(AppError::Conflict { entity: "sale", .. })
        ));

        let stored = get_sale(&conn, sale.id).unwrap().unwrap();
        assert_eq!(stored.sale.fee, 9.0);
    }

    #[test]
    fn card_with_sales_cannot_be_deleted() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 5, 10.0);
        add_sale(&mut conn, &make_sale(card.id, 1, 50.0, "2026-03-01")).unwrap();

        assert!(matches!(
            delete_card(&conn, card.id),
            Err(AppError::ReferentialIntegrity(_))
        ));
        assert!(get_card(&conn, card.id).unwrap().is_some());
    }

    #[test]
    fn paging_orders_by_date_then_id_desc() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 10, 10.0);

        let a = add_sale(&mut conn, &make_sale(card.id, 1, 10.0, "2026-03-01")).unwrap();
        let b = add_sale(&mut conn, &make_sale(card.id, 1, 20.0, "2026-03-02")).unwrap();
        let c = add_sale(&mut conn, &make_sale(card.id, 1, 30.0, "2026-03-02")).unwrap();

        let page = get_sales_paged(&conn, 1, 50, None, None).unwrap();
        let ids: Vec<i64> = page.iter().map(|r| r.sale.id).collect();
        // Same-date sales tie-break on id descending
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn search_and_date_filters() {
        let mut conn = open_in_memory().unwrap();
        let pika = seed_card(&conn, "Pikachu", 10, 10.0);
        let zard = seed_card(&conn, "Charizard", 10, 100.0);

        add_sale(&mut conn, &make_sale(pika.id, 1, 10.0, "2026-03-01")).unwrap();
        add_sale(&mut conn, &make_sale(zard.id, 1, 200.0, "2026-03-02")).unwrap();

        assert_eq!(count_sales(&conn, Some("pika"), None).unwrap(), 1);
        let date = NaiveDate::from_ymd_opt(2026, 3, 2);
        assert_eq!(count_sales(&conn, None, date).unwrap(), 1);
        assert_eq!(count_sales(&conn, Some("char"), date).unwrap(), 1);
        assert_eq!(
            count_sales(&conn, Some("pika"), date).unwrap(),
            0,
            "filters are conjunctive"
        );

        let hits = get_sales_paged(&conn, 1, 50, Some("char"), None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].card_name, "Charizard");
    }

    #[test]
    fn revenue_and_profit_aggregates() {
        let mut conn = open_in_memory().unwrap();
        let card = seed_card(&conn, "Pikachu", 10, 10.0);

        // net profit per sale: price - 1 - 2 - 10*qty
        add_sale(&mut conn, &make_sale(card.id, 1, 50.0, "2026-03-01")).unwrap();
        add_sale(&mut conn, &make_sale(card.id, 2, 80.0, "2026-03-02")).unwrap();

        assert!((total_revenue(&conn).unwrap() - 130.0).abs() < 1e-9);
        // (50-1-2-10) + (80-1-2-20) = 37 + 57
        assert!((total_profit(&conn).unwrap() - 94.0).abs() < 1e-9);
    }

    #[test]
    fn empty_store_aggregates_are_zero() {
        let conn = open_in_memory().unwrap();
        assert_eq!(total_revenue(&conn).unwrap(), 0.0);
        assert_eq!(total_profit(&conn).unwrap(), 0.0);
    }
}
