//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation is idempotent (`IF NOT EXISTS`),
//! which lets the binary run against an existing database file.

use crate::entities::{
    AuditLog, Client, InventoryMovement, Invoice, OrderLine, Product, ProductionBatch,
    ProductionConsumption, ProductionOrder, SalesOrder, Sequence, Supplier, Waste,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::TableCreateStatement,
};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/mfg_ledger.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    statement
}

/// Creates all tables that do not exist yet.
///
/// Parents are created before children so foreign keys resolve on every backend.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, Supplier),
        table_for(&schema, Product),
        table_for(&schema, Client),
        table_for(&schema, Sequence),
        table_for(&schema, SalesOrder),
        table_for(&schema, OrderLine),
        table_for(&schema, Invoice),
        table_for(&schema, ProductionOrder),
        table_for(&schema, ProductionConsumption),
        table_for(&schema, ProductionBatch),
        table_for(&schema, Waste),
        table_for(&schema, InventoryMovement),
        table_for(&schema, AuditLog),
    ];

    for table in &tables {
        db.execute(builder.build(table)).await?;
    }
    debug!("Ensured {} tables exist", tables.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        inventory_movement::Model as MovementModel, product::Model as ProductModel,
        sales_order::Model as SalesOrderModel, sequence::Model as SequenceModel,
        supplier::Model as SupplierModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<MovementModel> = InventoryMovement::find().limit(1).all(&db).await?;
        let _: Vec<SalesOrderModel> = SalesOrder::find().limit(1).all(&db).await?;
        let _: Vec<SequenceModel> = Sequence::find().limit(1).all(&db).await?;
        let _: Vec<SupplierModel> = Supplier::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_database_url_has_default() {
        assert!(!get_database_url().is_empty());
    }
}
