//! Production orders - raw material consumption, finished-goods batches and waste.
//!
//! Consumption and batch registration move stock through the movement recorder inside the
//! caller's transaction, so a production step and its stock effect are never split.
//! Waste is bookkeeping only and leaves stock alone.

use crate::{
    core::{
        movement::{self, MovementRequest},
        page::{self, Page, PageRequest},
        sequence,
    },
    entities::{
        BatchQuality, Priority, Product, ProductionBatch, ProductionConsumption, ProductionOrder,
        ProductionOrderStatus, Waste, product, production_batch, production_consumption,
        production_order, waste,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{Condition, DatabaseTransaction, QueryOrder, Set, SqlErr, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument};

const ORDER_PREFIX: &str = "OP";

/// Flat cost charged per kilogram of recorded waste.
pub const WASTE_COST_PER_KG: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Input for [`create_production_order`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionOrderRequest {
    /// Finished product to manufacture
    pub product_id: i64,
    pub quantity: Decimal,
    pub user_id: i64,
    pub planned_start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub priority: Priority,
    pub gauge: Option<String>,
    pub measures: Option<String>,
    pub machine: Option<String>,
}

impl ProductionOrderRequest {
    #[must_use]
    pub fn new(product_id: i64, quantity: Decimal, user_id: i64) -> Self {
        Self {
            product_id,
            quantity,
            user_id,
            ..Default::default()
        }
    }
}

/// Raw material drawn for a production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionRequest {
    pub material_id: i64,
    pub quantity: Decimal,
    pub user_id: i64,
}

/// Finished goods lot produced by a production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Globally unique lot number
    pub batch_number: String,
    pub quantity_produced: Decimal,
    pub production_date: NaiveDate,
    pub quality: BatchQuality,
    pub user_id: i64,
}

/// Scrap reported for a production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasteRequest {
    pub process: String,
    pub quantity: Decimal,
    pub reason: Option<String>,
}

fn ensure_positive(quantity: Decimal) -> Result<()> {
    if quantity <= Decimal::ZERO {
        return Err(Error::InvalidQuantity { quantity });
    }
    Ok(())
}

async fn find_order<C>(db: &C, order_id: i64) -> Result<production_order::Model>
where
    C: ConnectionTrait,
{
    ProductionOrder::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Production order", order_id))
}

/// Creates a PENDING production order numbered `OP-YYYYMMDD-<seq>`.
///
/// # Errors
/// * `Error::InvalidQuantity` if the quantity is not positive
/// * `Error::NotFound` if the product does not exist or is inactive
#[instrument(skip(txn, request), fields(product_id = request.product_id))]
pub async fn create_production_order(
    txn: &DatabaseTransaction,
    request: &ProductionOrderRequest,
    today: NaiveDate,
) -> Result<production_order::Model> {
    ensure_positive(request.quantity)?;

    let product = Product::find_by_id(request.product_id)
        .filter(product::Column::IsActive.eq(true))
        .one(txn)
        .await?
        .ok_or_else(|| Error::not_found("Product", request.product_id))?;

    let value = sequence::next_value(txn, sequence::PRODUCTION_ORDERS).await?;
    let now = Utc::now();
    let order = production_order::ActiveModel {
        order_number: Set(sequence::document_number(ORDER_PREFIX, today, value)),
        product_id: Set(product.id),
        quantity: Set(request.quantity),
        planned_start_date: Set(request.planned_start_date),
        planned_end_date: Set(request.planned_end_date),
        notes: Set(request.notes.clone()),
        created_by: Set(request.user_id),
        status: Set(ProductionOrderStatus::Pending),
        priority: Set(request.priority),
        gauge: Set(request.gauge.clone()),
        measures: Set(request.measures.clone()),
        machine: Set(request.machine.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    info!(
        "Created production order {} for {} x {}",
        order.order_number, order.quantity, product.sku
    );
    Ok(order)
}

/// Sets the status of a production order. Transitions are not validated.
///
/// # Errors
/// Returns `Error::NotFound` if the order does not exist.
pub async fn update_production_order_status<C>(
    db: &C,
    order_id: i64,
    status: ProductionOrderStatus,
) -> Result<production_order::Model>
where
    C: ConnectionTrait,
{
    let existing = find_order(db, order_id).await?;
    let mut order: production_order::ActiveModel = existing.into();
    order.status = Set(status);
    order.updated_at = Set(Utc::now());
    let order = order.update(db).await?;

    info!("Production order {} is now {:?}", order.order_number, order.status);
    Ok(order)
}

/// Records raw material consumed by an order and books the matching EXIT.
///
/// # Errors
/// * `Error::InvalidQuantity` if the quantity is not positive
/// * `Error::NotFound` if the order or the material does not exist
/// * `Error::InsufficientStock` if the material is short
#[instrument(skip(txn, request), fields(material_id = request.material_id))]
pub async fn register_consumption(
    txn: &DatabaseTransaction,
    order_id: i64,
    request: &ConsumptionRequest,
) -> Result<production_consumption::Model> {
    ensure_positive(request.quantity)?;
    let order = find_order(txn, order_id).await?;

    let exit = MovementRequest::new(
        request.material_id,
        request.quantity,
        request.user_id,
        format!("Consumption PO: {}", order.order_number),
    );
    movement::record_exit(txn, &exit).await?;

    production_consumption::ActiveModel {
        order_id: Set(order.id),
        material_id: Set(request.material_id),
        consumed_quantity: Set(request.quantity),
        consumed_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(Into::into)
}

/// Records a finished-goods batch and books the matching ENTRY tagged with the batch number.
///
/// # Errors
/// * `Error::Validation` if the batch number is empty
/// * `Error::InvalidQuantity` if the produced quantity is not positive
/// * `Error::NotFound` if the order does not exist
/// * `Error::DuplicateBatch` if the batch number was used before
#[instrument(skip(txn, request), fields(batch_number = %request.batch_number))]
pub async fn register_production_batch(
    txn: &DatabaseTransaction,
    order_id: i64,
    request: &BatchRequest,
) -> Result<production_batch::Model> {
    let batch_number = request.batch_number.trim();
    if batch_number.is_empty() {
        return Err(Error::Validation {
            message: "Batch number cannot be empty".to_string(),
        });
    }
    ensure_positive(request.quantity_produced)?;
    let order = find_order(txn, order_id).await?;

    let duplicate = ProductionBatch::find()
        .filter(production_batch::Column::BatchNumber.eq(batch_number))
        .one(txn)
        .await?;
    if duplicate.is_some() {
        return Err(Error::DuplicateBatch {
            batch_number: batch_number.to_string(),
        });
    }

    let batch = production_batch::ActiveModel {
        batch_number: Set(batch_number.to_string()),
        order_id: Set(order.id),
        quantity_produced: Set(request.quantity_produced),
        production_date: Set(request.production_date),
        quality: Set(request.quality),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateBatch {
            batch_number: batch_number.to_string(),
        },
        _ => Error::Database(err),
    })?;

    let entry = MovementRequest::new(
        order.product_id,
        request.quantity_produced,
        request.user_id,
        format!(
            "Production PO: {} / Batch: {}",
            order.order_number, batch.batch_number
        ),
    )
    .with_batch(batch.batch_number.as_str());
    movement::record_entry(txn, &entry).await?;

    Ok(batch)
}

/// Everything booked by [`complete_production_order`].
#[derive(Debug, Clone, Serialize)]
pub struct CompletedProduction {
    pub order: production_order::Model,
    pub consumptions: Vec<production_consumption::Model>,
    pub batch: production_batch::Model,
}

/// Books all consumptions and the output batch of an order, then marks it COMPLETED.
///
/// Every step joins the caller's transaction; a failing step leaves nothing behind once
/// the scope rolls back.
pub async fn complete_production_order(
    txn: &DatabaseTransaction,
    order_id: i64,
    consumptions: &[ConsumptionRequest],
    batch: &BatchRequest,
) -> Result<CompletedProduction> {
    let mut booked = Vec::with_capacity(consumptions.len());
    for consumption in consumptions {
        booked.push(register_consumption(txn, order_id, consumption).await?);
    }
    let batch = register_production_batch(txn, order_id, batch).await?;
    let order =
        update_production_order_status(txn, order_id, ProductionOrderStatus::Completed).await?;

    Ok(CompletedProduction {
        order,
        consumptions: booked,
        batch,
    })
}

/// Records waste for an order. Stock is not touched.
///
/// # Errors
/// * `Error::Validation` if the process name is empty
/// * `Error::InvalidQuantity` if the quantity is not positive
/// * `Error::NotFound` if the order does not exist
pub async fn register_waste<C>(db: &C, order_id: i64, request: &WasteRequest) -> Result<waste::Model>
where
    C: ConnectionTrait,
{
    if request.process.trim().is_empty() {
        return Err(Error::Validation {
            message: "Waste process cannot be empty".to_string(),
        });
    }
    ensure_positive(request.quantity)?;
    let order = find_order(db, order_id).await?;

    let waste = waste::ActiveModel {
        order_id: Set(order.id),
        process: Set(request.process.trim().to_string()),
        quantity: Set(request.quantity),
        reason: Set(request.reason.clone()),
        recorded_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Recorded {} of waste in {} for order {}",
        waste.quantity, waste.process, order.order_number
    );
    Ok(waste)
}

/// Filters for [`find_wastes`] and [`waste_totals_by_process`]. Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WasteFilter {
    pub order_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl WasteFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(order_id) = self.order_id {
            condition = condition.add(waste::Column::OrderId.eq(order_id));
        }
        if let Some(from) = self.from {
            condition = condition.add(waste::Column::RecordedAt.gte(from));
        }
        if let Some(to) = self.to {
            condition = condition.add(waste::Column::RecordedAt.lte(to));
        }
        condition
    }
}

/// Waste records with their order, newest first.
pub async fn find_wastes<C>(
    db: &C,
    filter: &WasteFilter,
) -> Result<Vec<(waste::Model, Option<production_order::Model>)>>
where
    C: ConnectionTrait,
{
    Waste::find()
        .find_also_related(ProductionOrder)
        .filter(filter.condition())
        .order_by_desc(waste::Column::RecordedAt)
        .order_by_desc(waste::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Total waste of one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessWaste {
    pub process: String,
    pub total_waste: Decimal,
}

/// Waste summed per process, largest first.
pub async fn waste_totals_by_process<C>(db: &C, filter: &WasteFilter) -> Result<Vec<ProcessWaste>>
where
    C: ConnectionTrait,
{
    let wastes = Waste::find().filter(filter.condition()).all(db).await?;

    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for waste in wastes {
        *totals.entry(waste.process).or_insert(Decimal::ZERO) += waste.quantity;
    }

    let mut totals: Vec<ProcessWaste> = totals
        .into_iter()
        .map(|(process, total_waste)| ProcessWaste {
            process,
            total_waste,
        })
        .collect();
    totals.sort_by(|a, b| b.total_waste.cmp(&a.total_waste));
    Ok(totals)
}

/// Actual cost of a production order. Amounts are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostAnalysis {
    pub order_id: i64,
    pub order_number: String,
    pub product_id: i64,
    pub quantity: Decimal,
    pub material_cost: Decimal,
    pub labor_cost: Decimal,
    pub waste_cost: Decimal,
    pub total_cost: Decimal,
    pub cost_per_unit: Decimal,
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Material cost (consumed quantity x current material cost price) plus waste at
/// [`WASTE_COST_PER_KG`]. Labor is not tracked and reported as zero.
///
/// # Errors
/// Returns `Error::NotFound` if the order does not exist.
pub async fn cost_analysis<C>(db: &C, order_id: i64) -> Result<CostAnalysis>
where
    C: ConnectionTrait,
{
    let order = find_order(db, order_id).await?;

    let consumptions = ProductionConsumption::find()
        .find_also_related(Product)
        .filter(production_consumption::Column::OrderId.eq(order.id))
        .all(db)
        .await?;
    let material_cost: Decimal = consumptions
        .iter()
        .filter_map(|(consumption, material)| {
            material
                .as_ref()
                .map(|m| consumption.consumed_quantity * m.cost_price)
        })
        .sum();

    let waste_quantity: Decimal = Waste::find()
        .filter(waste::Column::OrderId.eq(order.id))
        .all(db)
        .await?
        .iter()
        .map(|w| w.quantity)
        .sum();
    let waste_cost = waste_quantity * WASTE_COST_PER_KG;
    let labor_cost = Decimal::ZERO;

    let total_cost = material_cost + labor_cost + waste_cost;
    let cost_per_unit = if order.quantity.is_zero() {
        Decimal::ZERO
    } else {
        total_cost / order.quantity
    };

    Ok(CostAnalysis {
        order_id: order.id,
        order_number: order.order_number,
        product_id: order.product_id,
        quantity: order.quantity,
        material_cost: cents(material_cost),
        labor_cost: cents(labor_cost),
        waste_cost: cents(waste_cost),
        total_cost: cents(total_cost),
        cost_per_unit: cents(cost_per_unit),
    })
}

/// Filters for [`find_production_orders`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionOrderFilter {
    pub status: Option<ProductionOrderStatus>,
    /// Matches the order number or the product description
    pub search: Option<String>,
    pub product_id: Option<i64>,
}

/// Pages through production orders with their product, latest planned start first.
pub async fn find_production_orders<C>(
    db: &C,
    filter: &ProductionOrderFilter,
    request: PageRequest,
) -> Result<Page<(production_order::Model, Option<product::Model>)>>
where
    C: ConnectionTrait,
{
    let mut query = ProductionOrder::find().find_also_related(Product);
    if let Some(status) = filter.status {
        query = query.filter(production_order::Column::Status.eq(status));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(production_order::Column::OrderNumber.contains(term))
                .add(product::Column::Description.contains(term)),
        );
    }
    if let Some(product_id) = filter.product_id {
        query = query.filter(production_order::Column::ProductId.eq(product_id));
    }

    let paginator = query
        .order_by_desc(production_order::Column::PlannedStartDate)
        .order_by_desc(production_order::Column::Id)
        .paginate(db, request.page_size());
    page::fetch(paginator, request).await
}

/// A production order with everything recorded against it.
#[derive(Debug, Clone, Serialize)]
pub struct ProductionOrderDetails {
    pub order: production_order::Model,
    pub product: Option<product::Model>,
    pub consumptions: Vec<(production_consumption::Model, Option<product::Model>)>,
    pub batches: Vec<production_batch::Model>,
    pub wastes: Vec<waste::Model>,
}

/// Loads a production order with its product, consumptions, batches and wastes,
/// or `None` if it does not exist.
pub async fn find_production_order_details<C>(
    db: &C,
    order_id: i64,
) -> Result<Option<ProductionOrderDetails>>
where
    C: ConnectionTrait,
{
    let Some((order, product)) = ProductionOrder::find_by_id(order_id)
        .find_also_related(Product)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let consumptions = ProductionConsumption::find()
        .find_also_related(Product)
        .filter(production_consumption::Column::OrderId.eq(order.id))
        .order_by_asc(production_consumption::Column::Id)
        .all(db)
        .await?;
    let batches = order
        .find_related(ProductionBatch)
        .order_by_asc(production_batch::Column::Id)
        .all(db)
        .await?;
    let wastes = order
        .find_related(Waste)
        .order_by_asc(waste::Column::Id)
        .all(db)
        .await?;

    Ok(Some(ProductionOrderDetails {
        order,
        product,
        consumptions,
        batches,
        wastes,
    }))
}
