//! Service facade - one transactional scope per business operation, audited after commit.
//!
//! Every mutating operation opens a scope on the pool, runs the ledger or composer function
//! inside it and finishes the scope. The audit record is written only after a successful
//! commit, on the pool, and its failure never reaches the caller.

use crate::{
    config::settings::Config,
    core::{
        audit,
        movement::{self, MovementRequest},
        product::{self, NewProduct},
        production::{
            self, BatchRequest, CompletedProduction, ConsumptionRequest, ProductionOrderRequest,
            WasteRequest,
        },
        sales::{self, SalesOrderRequest},
        scope,
    },
    entities::{
        ProductionOrderStatus, SalesOrderStatus, inventory_movement, production_batch,
        production_consumption, production_order, sales_order, waste,
    },
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::{debug, info};

const OPENING_STOCK_REFERENCE: &str = "Opening stock";

/// Entry point for callers that mutate the ledger.
///
/// The caller is trusted and supplies the acting user id.
pub struct ErpService {
    /// Database connection pool
    pub database: DatabaseConnection,
}

impl ErpService {
    #[must_use]
    pub const fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    fn today() -> chrono::NaiveDate {
        chrono::Utc::now().date_naive()
    }

    /// Creates configured products whose SKU is not taken yet and books their opening stock.
    ///
    /// SKUs already in the catalog are left untouched, soft-deleted ones included.
    ///
    /// # Returns
    /// The number of products created
    pub async fn seed_catalog(&self, config: &Config) -> Result<usize> {
        let mut seeded = 0;
        for seed in &config.products {
            if product::sku_exists(&self.database, &seed.sku).await? {
                debug!("Product '{}' already exists, skipping seed", seed.sku);
                continue;
            }

            let mut new_product = NewProduct::new(
                seed.sku.as_str(),
                seed.description.as_str(),
                seed.product_type,
                seed.unit.as_str(),
            );
            new_product.cost_price = seed.cost_price;
            new_product.min_stock = seed.min_stock;
            let created = product::create_product(&self.database, new_product).await?;

            if seed.opening_stock > Decimal::ZERO {
                let entry = MovementRequest::new(
                    created.id,
                    seed.opening_stock,
                    config.system_user_id,
                    OPENING_STOCK_REFERENCE,
                );
                self.register_entry(&entry).await?;
            }
            info!("Seeded product '{}'", created.sku);
            seeded += 1;
        }
        Ok(seeded)
    }

    /// Books a stock ENTRY.
    pub async fn register_entry(
        &self,
        request: &MovementRequest,
    ) -> Result<inventory_movement::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = movement::record_entry(&txn, request).await;
        let movement = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            request.user_id,
            audit::INVENTORY_ENTRY,
            json!({
                "movement_id": movement.id,
                "product_id": movement.product_id,
                "quantity": movement.quantity,
                "reference_document": movement.reference_document,
            }),
        )
        .await;
        Ok(movement)
    }

    /// Books a stock EXIT, refused when stock is insufficient.
    pub async fn register_exit(
        &self,
        request: &MovementRequest,
    ) -> Result<inventory_movement::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = movement::record_exit(&txn, request).await;
        let movement = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            request.user_id,
            audit::INVENTORY_EXIT,
            json!({
                "movement_id": movement.id,
                "product_id": movement.product_id,
                "quantity": movement.quantity,
                "reference_document": movement.reference_document,
            }),
        )
        .await;
        Ok(movement)
    }

    /// Creates a sales order dated today, with its stock exits.
    pub async fn create_sales_order(
        &self,
        request: &SalesOrderRequest,
    ) -> Result<sales_order::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = sales::create_sales_order(&txn, request, Self::today()).await;
        let order = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            request.user_id,
            audit::CREATE_SALES_ORDER,
            json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "client_id": order.client_id,
                "total": order.total,
            }),
        )
        .await;
        Ok(order)
    }

    pub async fn update_sales_order_status(
        &self,
        user_id: i64,
        order_id: i64,
        status: SalesOrderStatus,
    ) -> Result<sales_order::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = sales::update_order_status(&txn, order_id, status).await;
        let order = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            user_id,
            audit::UPDATE_SALES_ORDER_STATUS,
            json!({ "order_id": order.id, "status": order.status }),
        )
        .await;
        Ok(order)
    }

    /// Creates a production order dated today.
    pub async fn create_production_order(
        &self,
        request: &ProductionOrderRequest,
    ) -> Result<production_order::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = production::create_production_order(&txn, request, Self::today()).await;
        let order = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            request.user_id,
            audit::CREATE_PRODUCTION_ORDER,
            json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "product_id": order.product_id,
                "quantity": order.quantity,
            }),
        )
        .await;
        Ok(order)
    }

    pub async fn update_production_order_status(
        &self,
        user_id: i64,
        order_id: i64,
        status: ProductionOrderStatus,
    ) -> Result<production_order::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = production::update_production_order_status(&txn, order_id, status).await;
        let order = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            user_id,
            audit::UPDATE_PRODUCTION_ORDER_STATUS,
            json!({ "order_id": order.id, "status": order.status }),
        )
        .await;
        Ok(order)
    }

    pub async fn register_consumption(
        &self,
        order_id: i64,
        request: &ConsumptionRequest,
    ) -> Result<production_consumption::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = production::register_consumption(&txn, order_id, request).await;
        let consumption = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            request.user_id,
            audit::REGISTER_CONSUMPTION,
            json!({
                "order_id": order_id,
                "material_id": consumption.material_id,
                "quantity": consumption.consumed_quantity,
            }),
        )
        .await;
        Ok(consumption)
    }

    pub async fn register_production_batch(
        &self,
        order_id: i64,
        request: &BatchRequest,
    ) -> Result<production_batch::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = production::register_production_batch(&txn, order_id, request).await;
        let batch = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            request.user_id,
            audit::REGISTER_PRODUCTION_BATCH,
            json!({
                "order_id": order_id,
                "batch_number": batch.batch_number,
                "quantity": batch.quantity_produced,
            }),
        )
        .await;
        Ok(batch)
    }

    /// Books consumptions and the output batch in one scope and completes the order.
    pub async fn complete_production_order(
        &self,
        user_id: i64,
        order_id: i64,
        consumptions: &[ConsumptionRequest],
        batch: &BatchRequest,
    ) -> Result<CompletedProduction> {
        let txn = scope::begin(&self.database).await?;
        let outcome =
            production::complete_production_order(&txn, order_id, consumptions, batch).await;
        let completed = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            user_id,
            audit::COMPLETE_PRODUCTION_ORDER,
            json!({
                "order_id": completed.order.id,
                "order_number": completed.order.order_number,
                "consumptions": completed.consumptions.len(),
                "batch_number": completed.batch.batch_number,
            }),
        )
        .await;
        Ok(completed)
    }

    pub async fn register_waste(
        &self,
        user_id: i64,
        order_id: i64,
        request: &WasteRequest,
    ) -> Result<waste::Model> {
        let txn = scope::begin(&self.database).await?;
        let outcome = production::register_waste(&txn, order_id, request).await;
        let waste = scope::finish(txn, outcome).await?;

        audit::log_action(
            &self.database,
            user_id,
            audit::REGISTER_WASTE,
            json!({
                "order_id": order_id,
                "process": waste.process,
                "quantity": waste.quantity,
            }),
        )
        .await;
        Ok(waste)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{audit::AuditFilter, ledger, page::PageRequest, sales::SalesLine},
        entities::{AuditLog, BatchQuality},
        errors::Error,
        test_utils::*,
    };
    use rust_decimal_macros::dec;
    use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Statement};

    #[tokio::test]
    async fn test_seed_catalog_skips_existing_skus() -> Result<()> {
        let service = setup_service().await?;
        let config: Config = toml::from_str(
            r#"
            [[products]]
            sku = "SEED-RESIN"
            description = "Resin"
            product_type = "RAW_MATERIAL"
            unit = "kg"
            opening_stock = 12.5

            [[products]]
            sku = "SEED-BAG"
            description = "Bag"
            product_type = "FINISHED_PRODUCT"
            unit = "pcs"
            "#,
        )
        .unwrap();

        assert_eq!(service.seed_catalog(&config).await?, 2);
        let resin = product::get_product_by_sku(&service.database, "SEED-RESIN")
            .await?
            .unwrap();
        assert_eq!(resin.current_stock, dec!(12.5));

        let bag = product::get_product_by_sku(&service.database, "SEED-BAG")
            .await?
            .unwrap();
        product::delete_product(&service.database, bag.id).await?;

        // A second start with a soft-deleted seed SKU neither fails nor re-books stock
        assert_eq!(service.seed_catalog(&config).await?, 0);
        assert_eq!(current_stock(&service.database, resin.id).await?, dec!(12.5));
        assert!(
            product::get_product_by_sku(&service.database, "SEED-BAG")
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_exits_never_both_succeed() -> Result<()> {
        let service = setup_service().await?;
        let product = create_stocked_product(&service.database, "CONC-01", dec!(10)).await?;

        let first = exit_request(product.id, dec!(7));
        let second = exit_request(product.id, dec!(6));
        let (a, b) = tokio::join!(service.register_exit(&first), service.register_exit(&second));

        assert!(a.is_ok() != b.is_ok());
        let failure = a.err().or(b.err()).unwrap();
        assert!(matches!(failure, Error::InsufficientStock { .. }));

        let remaining = current_stock(&service.database, product.id).await?;
        assert!(remaining == dec!(3) || remaining == dec!(4));
        assert!(ledger::reconcile(&service.database, product.id).await?.is_consistent());
        Ok(())
    }

    #[tokio::test]
    async fn test_operations_are_audited_after_commit() -> Result<()> {
        let service = setup_service().await?;
        let product = create_test_product(&service.database, "AUD-01").await?;

        service.register_entry(&entry_request(product.id, dec!(4))).await?;
        let result = service.register_exit(&exit_request(product.id, dec!(9))).await;
        assert!(result.is_err());

        let audits = audit::find_audits(
            &service.database,
            &AuditFilter::default(),
            PageRequest::default(),
        )
        .await?;
        assert_eq!(audits.total_items, 1);
        assert_eq!(audits.items[0].action, audit::INVENTORY_ENTRY);
        assert_eq!(audits.items[0].details["product_id"], product.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_operation() -> Result<()> {
        let service = setup_service().await?;
        let product = create_test_product(&service.database, "AUD-02").await?;
        service
            .database
            .execute(Statement::from_string(
                service.database.get_database_backend(),
                "DROP TABLE audit_logs",
            ))
            .await?;

        let movement = service.register_entry(&entry_request(product.id, dec!(2))).await?;
        assert_eq!(movement.quantity, dec!(2));
        assert_eq!(current_stock(&service.database, product.id).await?, dec!(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_sales_and_production_flow() -> Result<()> {
        let service = setup_service().await?;
        let db = &service.database;
        let client = create_test_client(db, "FLOW-CL", dec!(10000)).await?;
        let resin = create_stocked_product(db, "FLOW-RESIN", dec!(100)).await?;
        let film = create_test_product(db, "FLOW-FILM").await?;

        let order = service
            .create_production_order(&production::ProductionOrderRequest::new(film.id, dec!(50), 1))
            .await?;
        let order = service
            .update_production_order_status(1, order.id, ProductionOrderStatus::InProgress)
            .await?;
        assert_eq!(order.status, ProductionOrderStatus::InProgress);

        service
            .register_consumption(
                order.id,
                &ConsumptionRequest {
                    material_id: resin.id,
                    quantity: dec!(30),
                    user_id: 1,
                },
            )
            .await?;
        service
            .register_waste(
                1,
                order.id,
                &WasteRequest {
                    process: "Extrusion".to_string(),
                    quantity: dec!(1),
                    reason: None,
                },
            )
            .await?;
        let completed = service
            .complete_production_order(
                1,
                order.id,
                &[],
                &BatchRequest {
                    batch_number: "FLOW-L1".to_string(),
                    quantity_produced: dec!(50),
                    production_date: chrono::Utc::now().date_naive(),
                    quality: BatchQuality::Released,
                    user_id: 1,
                },
            )
            .await?;
        assert_eq!(completed.order.status, ProductionOrderStatus::Completed);

        let duplicate = service
            .register_production_batch(
                order.id,
                &BatchRequest {
                    batch_number: "FLOW-L1".to_string(),
                    quantity_produced: dec!(5),
                    production_date: chrono::Utc::now().date_naive(),
                    quality: BatchQuality::Quarantine,
                    user_id: 1,
                },
            )
            .await;
        assert!(matches!(duplicate, Err(Error::DuplicateBatch { .. })));

        let sale = service
            .create_sales_order(&SalesOrderRequest {
                client_id: client.id,
                user_id: 2,
                lines: vec![SalesLine::new(film.id, dec!(20), dec!(10))],
                delivery_date: None,
                notes: Some("Rush".to_string()),
            })
            .await?;
        let sale = service
            .update_sales_order_status(2, sale.id, SalesOrderStatus::Confirmed)
            .await?;
        assert_eq!(sale.status, SalesOrderStatus::Confirmed);

        assert_eq!(current_stock(db, resin.id).await?, dec!(70));
        assert_eq!(current_stock(db, film.id).await?, dec!(30));
        assert!(ledger::find_inconsistencies(db).await?.is_empty());
        // production order, status, consumption, waste, completion, sale, sale status
        assert_eq!(AuditLog::find().count(db).await?, 7);
        Ok(())
    }
}
