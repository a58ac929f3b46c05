//! Shared test utilities for the ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        client::{self, NewClient},
        movement::{self, MovementRequest},
        product::{self, NewProduct},
        production::{self, ProductionOrderRequest},
        sales::{self, SalesLine, SalesOrderRequest},
        scope,
    },
    entities::{self, ProductType},
    errors::{Error, Result},
    service::ErpService,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};

/// User id used as the actor of test operations.
pub const TEST_USER: i64 = 1;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sets up a service over a fresh in-memory database.
pub async fn setup_service() -> Result<ErpService> {
    Ok(ErpService::new(setup_test_db().await?))
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * `product_type`: raw material, unit "kg"
/// * `description`: "Test product <sku>"
/// * `cost_price`: 20
/// * `min_stock`: 5
/// * stock: 0
pub async fn create_test_product(
    db: &DatabaseConnection,
    sku: &str,
) -> Result<entities::product::Model> {
    let mut new_product = NewProduct::new(
        sku,
        format!("Test product {sku}"),
        ProductType::RawMaterial,
        "kg",
    );
    new_product.cost_price = Decimal::from(20);
    new_product.min_stock = Decimal::from(5);
    product::create_product(db, new_product).await
}

/// Creates a test product and books `stock` as an opening ENTRY.
pub async fn create_stocked_product(
    db: &DatabaseConnection,
    sku: &str,
    stock: Decimal,
) -> Result<entities::product::Model> {
    let product = create_test_product(db, sku).await?;

    let txn = scope::begin(db).await?;
    let outcome = movement::record_entry(&txn, &entry_request(product.id, stock)).await;
    scope::finish(txn, outcome).await?;

    entities::Product::find_by_id(product.id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Product", product.id))
}

/// Entry request by [`TEST_USER`] with a fixed reference.
pub fn entry_request(product_id: i64, quantity: Decimal) -> MovementRequest {
    MovementRequest::new(product_id, quantity, TEST_USER, "TEST-ENTRY")
}

/// Exit request by [`TEST_USER`] with a fixed reference.
pub fn exit_request(product_id: i64, quantity: Decimal) -> MovementRequest {
    MovementRequest::new(product_id, quantity, TEST_USER, "TEST-EXIT")
}

/// Reads the stored stock counter of a product.
pub async fn current_stock(db: &DatabaseConnection, product_id: i64) -> Result<Decimal> {
    entities::Product::find_by_id(product_id)
        .one(db)
        .await?
        .map(|p| p.current_stock)
        .ok_or_else(|| Error::not_found("Product", product_id))
}

/// Creates a test client named "Client <code>" with default payment terms.
pub async fn create_test_client(
    db: &DatabaseConnection,
    code: &str,
    credit_limit: Decimal,
) -> Result<entities::client::Model> {
    client::create_client(
        db,
        NewClient {
            code: code.to_string(),
            name: format!("Client {code}"),
            credit_limit,
            ..Default::default()
        },
    )
    .await
}

/// Places a single-line sales order dated today in its own scope.
pub async fn create_test_sales_order(
    db: &DatabaseConnection,
    client_id: i64,
    product_id: i64,
    quantity: Decimal,
    price: Decimal,
) -> Result<entities::sales_order::Model> {
    let request = SalesOrderRequest {
        client_id,
        user_id: TEST_USER,
        lines: vec![SalesLine::new(product_id, quantity, price)],
        delivery_date: None,
        notes: None,
    };

    let txn = scope::begin(db).await?;
    let outcome = sales::create_sales_order(&txn, &request, chrono::Utc::now().date_naive()).await;
    scope::finish(txn, outcome).await
}

/// Creates a PENDING production order dated today in its own scope.
pub async fn create_test_production_order(
    db: &DatabaseConnection,
    product_id: i64,
    quantity: Decimal,
) -> Result<entities::production_order::Model> {
    let request = ProductionOrderRequest::new(product_id, quantity, TEST_USER);

    let txn = scope::begin(db).await?;
    let outcome =
        production::create_production_order(&txn, &request, chrono::Utc::now().date_naive())
            .await;
    scope::finish(txn, outcome).await
}
