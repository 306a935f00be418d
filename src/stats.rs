//! Dashboard aggregates, computed in SQL at query time.

use crate::error::AppResult;
use rusqlite::{params, Connection};

/// Headline numbers for the collection and its sales history.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    /// Current market value of the whole collection
    pub collection_value: f64,
    /// Acquisition cost of everything currently held
    pub total_spent: f64,
    /// Sum of all sale prices
    pub total_earned: f64,
    /// (earned - spent) / spent, in percent; 0 when nothing was spent
    pub average_roi: f64,
}

pub fn collection_stats(conn: &Connection) -> AppResult<CollectionStats> {
    let (collection_value, total_spent): (f64, f64) = conn.query_row(
        "SELECT COALESCE(SUM(current_price * quantity), 0),
                COALESCE(SUM(purchase_price * quantity), 0)
         FROM cards",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let total_earned: f64 = conn.query_row(
        "SELECT COALESCE(SUM(sale_price), 0) FROM sales",
        [],
        |r| r.get(0),
    )?;

    let average_roi = if total_spent > 0.0 {
        (total_earned - total_spent) / total_spent * 100.0
    } else {
        0.0
    };

    Ok(CollectionStats {
        collection_value,
        total_spent,
        total_earned,
        average_roi,
    })
}

/// Estimated profit aggregated per set, for the "most profitable sets" view.
#[derive(Debug, Clone, PartialEq)]
pub struct SetProfit {
    pub set_name: String,
    pub profit: f64,
}

pub fn profit_by_set(conn: &Connection, limit: usize) -> AppResult<Vec<SetProfit>> {
    let mut stmt = conn.prepare_cached(
        "SELECT set_name, SUM((current_price - purchase_price) * quantity) AS profit
         FROM cards
         GROUP BY set_name
         ORDER BY profit DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |r| {
            Ok(SetProfit {
                set_name: r.get(0)?,
                profit: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Revenue and net profit per calendar month, chronological.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: f64,
    pub profit: f64,
}

pub fn sales_by_month(conn: &Connection) -> AppResult<Vec<MonthlySales>> {
    let mut stmt = conn.prepare_cached(
        "SELECT strftime('%Y-%m', s.sale_date) AS month,
                SUM(s.sale_price),
                SUM(s.sale_price - s.fee - s.shipping_cost - c.purchase_price * s.quantity)
         FROM sales s JOIN cards c ON c.id = s.card_id
         GROUP BY month
         ORDER BY month",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(MonthlySales {
                month: r.get(0)?,
                revenue: r.get(1)?,
                profit: r.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
