//! Invoicing for sales orders and the client outstanding balance used by the credit check.

use crate::{
    entities::{Client, Invoice, InvoiceStatus, SalesOrder, invoice, sales_order},
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{JoinType, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::info;

/// Invoice statuses that count toward a client's outstanding balance.
const UNPAID: [InvoiceStatus; 2] = [InvoiceStatus::Pending, InvoiceStatus::Overdue];

/// Issues a PENDING invoice for the full order total, due after the client's payment terms.
///
/// # Errors
/// * `Error::NotFound` if the order or its client does not exist
pub async fn issue_invoice<C>(db: &C, order_id: i64, issue_date: NaiveDate) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    let (order, client) = SalesOrder::find_by_id(order_id)
        .find_also_related(Client)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Sales order", order_id))?;
    let client = client.ok_or_else(|| Error::not_found("Client", order.client_id))?;

    let terms = u64::try_from(client.payment_terms).unwrap_or_default();
    let due_date = issue_date
        .checked_add_days(Days::new(terms))
        .ok_or_else(|| Error::Validation {
            message: format!("Payment terms of {terms} days overflow the due date"),
        })?;

    let invoice = invoice::ActiveModel {
        order_id: Set(order.id),
        amount: Set(order.total),
        status: Set(InvoiceStatus::Pending),
        issue_date: Set(issue_date),
        due_date: Set(due_date),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Issued invoice {} for order {} ({}), due {}",
        invoice.id, order.order_number, invoice.amount, invoice.due_date
    );
    Ok(invoice)
}

/// Sets the status of an invoice.
///
/// # Errors
/// Returns `Error::NotFound` if the invoice does not exist.
pub async fn update_invoice_status<C>(
    db: &C,
    invoice_id: i64,
    status: InvoiceStatus,
) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    let existing = Invoice::find_by_id(invoice_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;

    let mut invoice: invoice::ActiveModel = existing.into();
    invoice.status = Set(status);
    invoice.update(db).await.map_err(Into::into)
}

/// Invoices of an order, oldest first.
pub async fn invoices_for_order<C>(db: &C, order_id: i64) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::OrderId.eq(order_id))
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of the totals of the client's orders that carry a PENDING or OVERDUE invoice.
///
/// An order with several unpaid invoices is counted once.
pub async fn outstanding_balance<C>(db: &C, client_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let orders: Vec<(i64, Decimal)> = SalesOrder::find()
        .select_only()
        .column(sales_order::Column::Id)
        .column(sales_order::Column::Total)
        .distinct()
        .join(JoinType::InnerJoin, sales_order::Relation::Invoices.def())
        .filter(sales_order::Column::ClientId.eq(client_id))
        .filter(invoice::Column::Status.is_in(UNPAID))
        .into_tuple()
        .all(db)
        .await?;

    Ok(orders.into_iter().map(|(_, total)| total).sum())
}
