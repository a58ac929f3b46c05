/// Audit trail of user actions
pub mod audit;
/// Client directory with credit terms
pub mod client;
/// Invoices and client outstanding balance
pub mod invoice;
/// Stock ledger - locked reads and stock adjustments
pub mod ledger;
/// Movement recorder - validated ENTRY/EXIT movements
pub mod movement;
/// Counts of pending work and low stock
pub mod notifications;
/// Offset pagination
pub mod page;
/// Product catalog
pub mod product;
/// Production orders, consumption, batches and waste
pub mod production;
/// Sales orders
pub mod sales;
/// Transaction scopes
pub mod scope;
/// Document number sequences
pub mod sequence;
/// Supplier directory
pub mod supplier;
