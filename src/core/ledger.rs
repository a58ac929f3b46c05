//! Stock ledger - the single source of truth for quantity on hand.
//!
//! Every read meant to guard a stock change goes through [`lock_product`], which selects
//! the product row `FOR UPDATE` so the check and the subsequent [`adjust_stock`] happen
//! under the same lock. Both take the caller's transaction; nothing here commits.
//!
//! Stock arithmetic happens in `Decimal` on the Rust side. `SQLite` stores these columns as
//! REAL, so an in-database `current_stock + delta` would drift on fractional quantities.

use crate::{
    entities::{InventoryMovement, Product, inventory_movement, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, QuerySelect, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// Reads a product under an exclusive row lock held until the transaction ends.
///
/// # Errors
/// Returns `Error::NotFound` if no product has this id.
pub async fn lock_product(txn: &DatabaseTransaction, product_id: i64) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))
}

/// Current stock of a product, read under row lock.
pub async fn get_stock(txn: &DatabaseTransaction, product_id: i64) -> Result<Decimal> {
    Ok(lock_product(txn, product_id).await?.current_stock)
}

/// Applies a signed delta to `current_stock`.
///
/// The new value is computed in `Decimal` from the row read under lock and written back as
/// an absolute value, so the database never does arithmetic on the stored representation.
/// Must run in the same transaction as the movement that justifies it.
///
/// # Errors
/// * `Error::NotFound` if the product does not exist
/// * `Error::InsufficientStock` if the delta would take the stock below zero
///
/// # Returns
/// The updated product
#[instrument(skip(txn))]
pub async fn adjust_stock(
    txn: &DatabaseTransaction,
    product_id: i64,
    delta: Decimal,
) -> Result<product::Model> {
    let locked = lock_product(txn, product_id).await?;
    let new_stock = locked.current_stock + delta;
    if new_stock < Decimal::ZERO {
        return Err(Error::InsufficientStock {
            product_id,
            available: locked.current_stock,
            requested: -delta,
        });
    }

    let mut product: product::ActiveModel = locked.into();
    product.current_stock = Set(new_stock);
    product.updated_at = Set(chrono::Utc::now());
    let updated = product.update(txn).await?;

    debug!(
        "Stock of product {} adjusted by {} to {}",
        product_id, delta, updated.current_stock
    );
    Ok(updated)
}

/// Signed sum of all movements recorded for a product.
pub async fn movement_total<C>(db: &C, product_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let quantities: Vec<Decimal> = InventoryMovement::find()
        .select_only()
        .column(inventory_movement::Column::Quantity)
        .filter(inventory_movement::Column::ProductId.eq(product_id))
        .into_tuple()
        .all(db)
        .await?;

    Ok(quantities.into_iter().sum())
}

/// Result of comparing a product's stock counter with its movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReconciliation {
    pub product_id: i64,
    /// Value of the denormalized `current_stock` counter
    pub recorded_stock: Decimal,
    /// Signed sum of the product's movements
    pub movement_total: Decimal,
}

impl StockReconciliation {
    /// Whether the counter matches the movement history.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.recorded_stock == self.movement_total
    }
}

/// Compares `current_stock` with the signed movement sum for one product.
pub async fn reconcile<C>(db: &C, product_id: i64) -> Result<StockReconciliation>
where
    C: ConnectionTrait,
{
    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;
    let movement_total = movement_total(db, product_id).await?;

    Ok(StockReconciliation {
        product_id,
        recorded_stock: product.current_stock,
        movement_total,
    })
}

/// Reconciles every product, returning only the inconsistent ones.
pub async fn find_inconsistencies<C>(db: &C) -> Result<Vec<StockReconciliation>>
where
    C: ConnectionTrait,
{
    let product_ids: Vec<i64> = Product::find()
        .select_only()
        .column(product::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut inconsistent = Vec::new();
    for product_id in product_ids {
        let reconciliation = reconcile(db, product_id).await?;
        if !reconciliation.is_consistent() {
            inconsistent.push(reconciliation);
        }
    }
    Ok(inconsistent)
}
