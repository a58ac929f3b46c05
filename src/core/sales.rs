//! Sales orders - the credit check, stock reservation and stock exits of an order
//! in one transaction.
//!
//! Status flow is QUOTE -> CONFIRMED -> IN_PROGRESS -> COMPLETED, or CANCELLED at any point.
//! Transitions are written as requested and not validated.

use crate::{
    core::{
        invoice, ledger,
        movement::{self, MovementRequest},
        page::{self, Page, PageRequest},
        sequence,
    },
    entities::{
        Client, OrderLine, Product, SalesOrder, SalesOrderStatus, client, order_line, product,
        sales_order,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{Condition, DatabaseTransaction, QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Sales tax applied to every order subtotal.
pub const TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

const ORDER_PREFIX: &str = "SO";

/// One product line of a sales order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesLine {
    pub product_id: i64,
    pub quantity: Decimal,
    /// Unit price
    pub price: Decimal,
}

impl SalesLine {
    #[must_use]
    pub const fn new(product_id: i64, quantity: Decimal, price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            price,
        }
    }
}

/// Input for [`create_sales_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrderRequest {
    pub client_id: i64,
    /// User creating the order; also recorded on its stock exits
    pub user_id: i64,
    pub lines: Vec<SalesLine>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Money totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// subtotal = sum of quantity x price, tax = subtotal x [`TAX_RATE`].
    #[must_use]
    pub fn from_lines(lines: &[SalesLine]) -> Self {
        let subtotal: Decimal = lines.iter().map(|line| line.quantity * line.price).sum();
        let tax_amount = subtotal * TAX_RATE;
        Self {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}

fn validate_lines(lines: &[SalesLine]) -> Result<()> {
    if lines.is_empty() {
        return Err(Error::Validation {
            message: "A sales order needs at least one line".to_string(),
        });
    }
    for line in lines {
        if line.quantity <= Decimal::ZERO {
            return Err(Error::InvalidQuantity {
                quantity: line.quantity,
            });
        }
        if line.price < Decimal::ZERO {
            return Err(Error::Validation {
                message: format!("Price for product {} cannot be negative", line.product_id),
            });
        }
    }
    Ok(())
}

/// Requested quantity per product, in ascending product id. Lines naming the same
/// product are summed so the stock check covers the whole order.
fn requested_per_product(lines: &[SalesLine]) -> BTreeMap<i64, Decimal> {
    let mut requested = BTreeMap::new();
    for line in lines {
        *requested.entry(line.product_id).or_insert(Decimal::ZERO) += line.quantity;
    }
    requested
}

/// Creates a sales order in status QUOTE and books one EXIT per line.
///
/// Runs inside the caller's transaction: the credit check, the product locks, the
/// header, its lines and all exits commit or roll back together.
///
/// # Errors
/// * `Error::Validation` / `Error::InvalidQuantity` for an empty order or a bad line
/// * `Error::NotFound` if the client is missing or inactive, or a product does not exist
/// * `Error::CreditLimitExceeded` if outstanding balance plus this order exceeds the limit
/// * `Error::InsufficientStock` naming the first product short of stock
#[instrument(skip(txn, request), fields(client_id = request.client_id, lines = request.lines.len()))]
pub async fn create_sales_order(
    txn: &DatabaseTransaction,
    request: &SalesOrderRequest,
    today: NaiveDate,
) -> Result<sales_order::Model> {
    validate_lines(&request.lines)?;

    let client = Client::find_by_id(request.client_id)
        .filter(client::Column::IsActive.eq(true))
        .one(txn)
        .await?
        .ok_or_else(|| Error::not_found("Client", request.client_id))?;
    let outstanding = invoice::outstanding_balance(txn, client.id).await?;

    let totals = OrderTotals::from_lines(&request.lines);
    if outstanding + totals.total > client.credit_limit {
        warn!(
            "Credit limit exceeded for client {}: limit {}, outstanding {}, order {}",
            client.code, client.credit_limit, outstanding, totals.total
        );
        return Err(Error::CreditLimitExceeded {
            client_id: client.id,
            limit: client.credit_limit,
            outstanding,
            requested: totals.total,
        });
    }

    for (&product_id, &requested) in &requested_per_product(&request.lines) {
        let available = ledger::get_stock(txn, product_id).await?;
        if available < requested {
            return Err(Error::InsufficientStock {
                product_id,
                available,
                requested,
            });
        }
    }

    let value = sequence::next_value(txn, sequence::SALES_ORDERS).await?;
    let order_number = sequence::document_number(ORDER_PREFIX, today, value);
    let now = chrono::Utc::now();

    let order = sales_order::ActiveModel {
        order_number: Set(order_number.clone()),
        client_id: Set(client.id),
        order_date: Set(today),
        delivery_date: Set(request.delivery_date),
        status: Set(SalesOrderStatus::Quote),
        subtotal: Set(totals.subtotal),
        tax_amount: Set(totals.tax_amount),
        total: Set(totals.total),
        notes: Set(request.notes.clone()),
        created_by: Set(request.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for line in &request.lines {
        order_line::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let exit = MovementRequest::new(
            line.product_id,
            line.quantity,
            request.user_id,
            order_number.as_str(),
        );
        movement::record_exit(txn, &exit).await?;
    }

    info!(
        "Created sales order {} for client {} with total {}",
        order.order_number, client.code, order.total
    );
    Ok(order)
}

/// Sets the status of a sales order. Any status may follow any other.
///
/// # Errors
/// Returns `Error::NotFound` if the order does not exist.
pub async fn update_order_status<C>(
    db: &C,
    order_id: i64,
    status: SalesOrderStatus,
) -> Result<sales_order::Model>
where
    C: ConnectionTrait,
{
    let existing = SalesOrder::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Sales order", order_id))?;

    let previous = existing.status;
    let mut order: sales_order::ActiveModel = existing.into();
    order.status = Set(status);
    order.updated_at = Set(chrono::Utc::now());
    let order = order.update(db).await?;

    info!(
        "Sales order {} moved from {:?} to {:?}",
        order.order_number, previous, order.status
    );
    Ok(order)
}

/// Filters for [`find_sales_orders`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesOrderFilter {
    /// Matches the order number or the client name
    pub search: Option<String>,
    pub status: Option<SalesOrderStatus>,
    pub client_id: Option<i64>,
}

/// Pages through sales orders with their client, newest first.
pub async fn find_sales_orders<C>(
    db: &C,
    filter: &SalesOrderFilter,
    request: PageRequest,
) -> Result<Page<(sales_order::Model, Option<client::Model>)>>
where
    C: ConnectionTrait,
{
    let mut query = SalesOrder::find().find_also_related(Client);
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(sales_order::Column::OrderNumber.contains(term))
                .add(client::Column::Name.contains(term)),
        );
    }
    if let Some(status) = filter.status {
        query = query.filter(sales_order::Column::Status.eq(status));
    }
    if let Some(client_id) = filter.client_id {
        query = query.filter(sales_order::Column::ClientId.eq(client_id));
    }

    let paginator = query
        .order_by_desc(sales_order::Column::OrderDate)
        .order_by_desc(sales_order::Column::Id)
        .paginate(db, request.page_size());
    page::fetch(paginator, request).await
}

/// A sales order with its client and its lines.
#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderDetails {
    pub order: sales_order::Model,
    pub client: Option<client::Model>,
    pub lines: Vec<(order_line::Model, Option<product::Model>)>,
}

/// Loads a sales order with its client and lines, or `None` if it does not exist.
pub async fn find_sales_order_details<C>(db: &C, order_id: i64) -> Result<Option<SalesOrderDetails>>
where
    C: ConnectionTrait,
{
    let Some((order, client)) = SalesOrder::find_by_id(order_id)
        .find_also_related(Client)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let lines = OrderLine::find()
        .find_also_related(Product)
        .filter(order_line::Column::OrderId.eq(order.id))
        .order_by_asc(order_line::Column::Id)
        .all(db)
        .await?;

    Ok(Some(SalesOrderDetails {
        order,
        client,
        lines,
    }))
}

/// Completed sales of one client over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSales {
    pub client_id: i64,
    pub client_name: String,
    pub total_orders: u64,
    pub total_sales: Decimal,
}

/// COMPLETED orders grouped by client, highest sales first.
///
/// `from` and `to` are inclusive and each may be left open.
pub async fn sales_report_by_client<C>(
    db: &C,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<ClientSales>>
where
    C: ConnectionTrait,
{
    let mut query = SalesOrder::find()
        .find_also_related(Client)
        .filter(sales_order::Column::Status.eq(SalesOrderStatus::Completed));
    if let Some(from) = from {
        query = query.filter(sales_order::Column::OrderDate.gte(from));
    }
    if let Some(to) = to {
        query = query.filter(sales_order::Column::OrderDate.lte(to));
    }

    let mut by_client: BTreeMap<i64, ClientSales> = BTreeMap::new();
    for (order, client) in query.all(db).await? {
        let entry = by_client.entry(order.client_id).or_insert_with(|| ClientSales {
            client_id: order.client_id,
            client_name: client.map(|c| c.name).unwrap_or_default(),
            total_orders: 0,
            total_sales: Decimal::ZERO,
        });
        entry.total_orders += 1;
        entry.total_sales += order.total;
    }

    let mut report: Vec<ClientSales> = by_client.into_values().collect();
    report.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
    Ok(report)
}
