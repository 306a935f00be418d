//! Card and sale entities with their derived valuation metrics.
//!
//! Both entities carry a `version` token used for optimistic concurrency:
//! the store bumps it on every committed mutation and rejects writes whose
//! token no longer matches the stored one.

use crate::error::{AppError, AppResult};
use chrono::NaiveDate;

/// A single catalogued card with acquisition and current valuation data.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Surrogate id; 0 means "not yet persisted" (the store assigns one)
    pub id: i64,
    pub name: String,
    pub set_name: String,
    pub number: String,
    pub rarity: String,
    pub language: String,
    pub condition: String,
    pub purchase_price: f64,
    pub purchase_date: Option<NaiveDate>,
    pub source: String,
    pub current_price: f64,
    pub quantity: i64,
    /// Optimistic-concurrency token, advanced by the store on every commit
    pub version: i64,
}

impl Card {
    /// Current market value of the whole holding
    pub fn total_value(&self) -> f64 {
        self.current_price * self.quantity as f64
    }

    /// Estimated unrealised profit at the current price
    pub fn estimated_profit(&self) -> f64 {
        self.total_value() - self.purchase_price * self.quantity as f64
    }

    /// Return on investment in percent; 0 when the card was free
    pub fn roi(&self) -> f64 {
        if self.purchase_price > 0.0 {
            (self.current_price - self.purchase_price) / self.purchase_price * 100.0
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty()
            || self.set_name.trim().is_empty()
            || self.number.trim().is_empty()
        {
            return Err(AppError::Validation(
                "name, set and number are required".to_string(),
            ));
        }
        if self.purchase_price < 0.0 {
            return Err(AppError::Validation(
                "purchase price cannot be negative".to_string(),
            ));
        }
        if self.current_price < 0.0 {
            return Err(AppError::Validation(
                "current price cannot be negative".to_string(),
            ));
        }
        if self.quantity < 1 {
            return Err(AppError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A disposal event against a card's available quantity.
///
/// `card_id` is immutable after creation: quantity adjustments flow only
/// through sale add/delete, never through update.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub id: i64,
    pub card_id: i64,
    pub sale_date: NaiveDate,
    pub sale_price: f64,
    pub fee: f64,
    pub shipping_cost: f64,
    pub quantity: i64,
    pub version: i64,
}

impl Sale {
    /// Net profit given the card's purchase price per unit
    pub fn net_profit(&self, purchase_price: f64) -> f64 {
        self.sale_price - self.fee - self.shipping_cost - purchase_price * self.quantity as f64
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.sale_price <= 0.0 {
            return Err(AppError::Validation(
                "sale price must be greater than zero".to_string(),
            ));
        }
        if self.fee < 0.0 {
            return Err(AppError::Validation("fee cannot be negative".to_string()));
        }
        if self.shipping_cost < 0.0 {
            return Err(AppError::Validation(
                "shipping cost cannot be negative".to_string(),
            ));
        }
        if self.quantity < 1 {
            return Err(AppError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A sale joined with the card fields listings and exports need.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub sale: Sale,
    pub card_name: String,
    pub card_set: String,
    pub card_purchase_price: f64,
}

impl SaleRecord {
    pub fn net_profit(&self) -> f64 {
        self.sale.net_profit(self.card_purchase_price)
    }
}
