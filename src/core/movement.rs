//! Movement recorder - enforces stock rules at the moment of change and writes the audit trail.
//!
//! Each call appends exactly one immutable movement row and applies the matching delta to the
//! product's stock counter, both inside the caller's transaction. Exits re-read the stock under
//! the product row lock before deciding, so two concurrent exits cannot both pass the check.

use crate::{
    core::ledger,
    entities::{InventoryMovement, MovementType, inventory_movement},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, QueryOrder, Set, prelude::*};
use tracing::{info, instrument, warn};

/// Input for a single stock movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub product_id: i64,
    /// Always positive; the direction comes from the operation
    pub quantity: Decimal,
    /// User performing the movement
    pub user_id: i64,
    /// Document justifying the movement
    pub reference_document: String,
    pub notes: Option<String>,
    pub batch: Option<String>,
}

impl MovementRequest {
    #[must_use]
    pub fn new(
        product_id: i64,
        quantity: Decimal,
        user_id: i64,
        reference_document: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            user_id,
            reference_document: reference_document.into(),
            notes: None,
            batch: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }
}

fn ensure_positive(quantity: Decimal) -> Result<()> {
    if quantity <= Decimal::ZERO {
        return Err(Error::InvalidQuantity { quantity });
    }
    Ok(())
}

async fn insert_movement(
    txn: &DatabaseTransaction,
    request: &MovementRequest,
    movement_type: MovementType,
    signed_quantity: Decimal,
) -> Result<inventory_movement::Model> {
    let movement = inventory_movement::ActiveModel {
        product_id: Set(request.product_id),
        movement_type: Set(movement_type),
        quantity: Set(signed_quantity),
        user_id: Set(request.user_id),
        reference_document: Set(request.reference_document.clone()),
        notes: Set(request.notes.clone()),
        batch: Set(request.batch.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    movement.insert(txn).await.map_err(Into::into)
}

/// Records an ENTRY movement and adds `quantity` to the product's stock.
///
/// # Errors
/// * `Error::InvalidQuantity` if the quantity is not positive
/// * `Error::NotFound` if the product does not exist
#[instrument(skip(txn, request), fields(product_id = request.product_id, quantity = %request.quantity))]
pub async fn record_entry(
    txn: &DatabaseTransaction,
    request: &MovementRequest,
) -> Result<inventory_movement::Model> {
    ensure_positive(request.quantity)?;

    ledger::lock_product(txn, request.product_id).await?;
    let movement = insert_movement(txn, request, MovementType::Entry, request.quantity).await?;
    let product = ledger::adjust_stock(txn, request.product_id, request.quantity).await?;

    info!(
        "Recorded entry of {} for product {} ({}), stock now {}",
        request.quantity, product.sku, request.reference_document, product.current_stock
    );
    Ok(movement)
}

/// Records an EXIT movement (persisted as `-quantity`) and subtracts it from stock.
///
/// # Errors
/// * `Error::InvalidQuantity` if the quantity is not positive
/// * `Error::NotFound` if the product does not exist
/// * `Error::InsufficientStock` if the locked stock is below `quantity`; nothing is written
#[instrument(skip(txn, request), fields(product_id = request.product_id, quantity = %request.quantity))]
pub async fn record_exit(
    txn: &DatabaseTransaction,
    request: &MovementRequest,
) -> Result<inventory_movement::Model> {
    ensure_positive(request.quantity)?;

    let available = ledger::get_stock(txn, request.product_id).await?;
    if available < request.quantity {
        warn!(
            "Rejected exit of {} for product {}: only {} available",
            request.quantity, request.product_id, available
        );
        return Err(Error::InsufficientStock {
            product_id: request.product_id,
            available,
            requested: request.quantity,
        });
    }

    let movement = insert_movement(txn, request, MovementType::Exit, -request.quantity).await?;
    let product = ledger::adjust_stock(txn, request.product_id, -request.quantity).await?;

    info!(
        "Recorded exit of {} for product {} ({}), stock now {}",
        request.quantity, product.sku, request.reference_document, product.current_stock
    );
    Ok(movement)
}

/// Retrieves the movement history of a product, newest first.
pub async fn movements_for_product<C>(
    db: &C,
    product_id: i64,
) -> Result<Vec<inventory_movement::Model>>
where
    C: ConnectionTrait,
{
    InventoryMovement::find()
        .filter(inventory_movement::Column::ProductId.eq(product_id))
        .order_by_desc(inventory_movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
