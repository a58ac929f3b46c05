//! Product catalog - creation, lookup, typed updates, soft deletion and low-stock alerts.
//!
//! No write in this module touches `current_stock`: a product starts at zero and its stock
//! only changes through the movement recorder.

use crate::{
    core::{
        page::{self, Page, PageRequest},
        supplier,
    },
    entities::{Product, ProductType, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Condition, QueryOrder, Set, SqlErr, prelude::*, sea_query::Expr};
use tracing::info;

/// Fields required to create a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: String,
    pub description: String,
    pub product_type: ProductType,
    pub unit: String,
    pub cost_price: Decimal,
    pub min_stock: Decimal,
    pub supplier_id: Option<i64>,
}

impl NewProduct {
    #[must_use]
    pub fn new(
        sku: impl Into<String>,
        description: impl Into<String>,
        product_type: ProductType,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            sku: sku.into(),
            description: description.into(),
            product_type,
            unit: unit.into(),
            cost_price: Decimal::ZERO,
            min_stock: Decimal::ZERO,
            supplier_id: None,
        }
    }
}

/// Catalog fields that may be changed after creation. `None` leaves a field untouched.
///
/// `supplier_id` is doubly optional: `Some(None)` clears the supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductUpdate {
    pub description: Option<String>,
    pub product_type: Option<ProductType>,
    pub unit: Option<String>,
    pub cost_price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub supplier_id: Option<Option<i64>>,
}

fn validate_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(Error::Validation {
            message: format!("{field} cannot be negative"),
        });
    }
    Ok(())
}

async fn ensure_supplier<C>(db: &C, supplier_id: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    if let Some(id) = supplier_id {
        supplier::get_supplier_by_id(db, id)
            .await?
            .ok_or_else(|| Error::not_found("Supplier", id))?;
    }
    Ok(())
}

/// Creates a product with zero stock.
///
/// # Errors
/// * `Error::Validation` if the SKU or description is empty, a price/threshold is negative,
///   or the SKU is already taken
/// * `Error::NotFound` if the supplier does not exist or is inactive
pub async fn create_product<C>(db: &C, new_product: NewProduct) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let sku = new_product.sku.trim().to_string();
    if sku.is_empty() {
        return Err(Error::Validation {
            message: "Product SKU cannot be empty".to_string(),
        });
    }
    if new_product.description.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product description cannot be empty".to_string(),
        });
    }
    validate_non_negative("Cost price", new_product.cost_price)?;
    validate_non_negative("Minimum stock", new_product.min_stock)?;

    if sku_exists(db, &sku).await? {
        return Err(Error::Validation {
            message: format!("SKU '{sku}' already exists"),
        });
    }
    ensure_supplier(db, new_product.supplier_id).await?;

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        sku: Set(sku.clone()),
        description: Set(new_product.description.trim().to_string()),
        product_type: Set(new_product.product_type),
        unit: Set(new_product.unit),
        cost_price: Set(new_product.cost_price),
        min_stock: Set(new_product.min_stock),
        current_stock: Set(Decimal::ZERO),
        supplier_id: Set(new_product.supplier_id),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = product.insert(db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::Validation {
            message: format!("SKU '{sku}' already exists"),
        },
        _ => Error::Database(err),
    })?;
    info!("Created product '{}' (ID: {})", created.sku, created.id);
    Ok(created)
}

/// Finds an active product by id.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .filter(product::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active product by SKU.
pub async fn get_product_by_sku<C>(db: &C, sku: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Sku.eq(sku))
        .filter(product::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether any product, active or soft-deleted, already uses this SKU.
pub async fn sku_exists<C>(db: &C, sku: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let existing = Product::find()
        .filter(product::Column::Sku.eq(sku.trim()))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

/// Pages through active products ordered by SKU, optionally matching `search`
/// against SKU or description.
pub async fn find_products<C>(
    db: &C,
    search: Option<&str>,
    request: PageRequest,
) -> Result<Page<product::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Product::find().filter(product::Column::IsActive.eq(true));
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(product::Column::Sku.contains(term))
                .add(product::Column::Description.contains(term)),
        );
    }

    let paginator = query
        .order_by_asc(product::Column::Sku)
        .paginate(db, request.page_size());
    page::fetch(paginator, request).await
}

/// Applies a typed update to an active product.
///
/// # Errors
/// * `Error::NotFound` if the product or the new supplier does not exist or is inactive
/// * `Error::Validation` if a new price or threshold is negative
pub async fn update_product<C>(
    db: &C,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let existing = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    let mut product: product::ActiveModel = existing.into();
    if let Some(description) = update.description {
        product.description = Set(description);
    }
    if let Some(product_type) = update.product_type {
        product.product_type = Set(product_type);
    }
    if let Some(unit) = update.unit {
        product.unit = Set(unit);
    }
    if let Some(cost_price) = update.cost_price {
        validate_non_negative("Cost price", cost_price)?;
        product.cost_price = Set(cost_price);
    }
    if let Some(min_stock) = update.min_stock {
        validate_non_negative("Minimum stock", min_stock)?;
        product.min_stock = Set(min_stock);
    }
    if let Some(supplier_id) = update.supplier_id {
        ensure_supplier(db, supplier_id).await?;
        product.supplier_id = Set(supplier_id);
    }
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Soft-deletes a product. Its movements stay untouched.
///
/// # Errors
/// Returns `Error::NotFound` if the product does not exist or is already inactive.
pub async fn delete_product<C>(db: &C, product_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Product::update_many()
        .col_expr(product::Column::IsActive, Expr::value(false))
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::IsActive.eq(true))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("Product", product_id));
    }
    info!("Soft-deleted product {}", product_id);
    Ok(())
}

/// Active products whose stock is at or below their minimum, ordered by SKU.
pub async fn get_low_stock_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::IsActive.eq(true))
        .filter(Expr::col(product::Column::CurrentStock).lte(Expr::col(product::Column::MinStock)))
        .order_by_asc(product::Column::Sku)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_product(
            &db,
            NewProduct::new("  ", "Resin", ProductType::RawMaterial, "kg"),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut negative = NewProduct::new("RES", "Resin", ProductType::RawMaterial, "kg");
        negative.cost_price = dec!(-1);
        let result = create_product(&db, negative).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_starts_with_zero_stock() -> Result<()> {
        let db = setup_test_db().await?;

        let mut new_product =
            NewProduct::new(" PE-01 ", "Polyethylene", ProductType::RawMaterial, "kg");
        new_product.cost_price = dec!(25);
        new_product.min_stock = dec!(100);
        let product = create_product(&db, new_product).await?;

        assert_eq!(product.sku, "PE-01");
        assert_eq!(product.current_stock, dec!(0));
        assert_eq!(product.cost_price, dec!(25));
        assert!(product.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "DUP-01").await?;

        let result = create_product(
            &db,
            NewProduct::new("DUP-01", "Again", ProductType::RawMaterial, "kg"),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { message }) if message.contains("DUP-01")));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_only_touches_given_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_stocked_product(&db, "UPD-01", dec!(8)).await?;
        let vendor = supplier::create_supplier(&db, "Acme Resins").await?;

        let updated = update_product(
            &db,
            product.id,
            ProductUpdate {
                description: Some("Renamed".to_string()),
                min_stock: Some(dec!(2)),
                supplier_id: Some(Some(vendor.id)),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.description, "Renamed");
        assert_eq!(updated.min_stock, dec!(2));
        assert_eq!(updated.supplier_id, Some(vendor.id));
        assert_eq!(updated.unit, product.unit);
        assert_eq!(updated.current_stock, dec!(8));
        Ok(())
    }

    #[tokio::test]
    async fn test_supplier_must_be_active() -> Result<()> {
        let db = setup_test_db().await?;
        let vendor = supplier::create_supplier(&db, "Acme Resins").await?;

        let mut new_product = NewProduct::new("SUP-01", "Resin", ProductType::RawMaterial, "kg");
        new_product.supplier_id = Some(vendor.id);
        let product = create_product(&db, new_product.clone()).await?;
        assert_eq!(product.supplier_id, Some(vendor.id));

        supplier::deactivate_supplier(&db, vendor.id).await?;
        new_product.sku = "SUP-02".to_string();
        let result = create_product(&db, new_product).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Supplier", .. })));

        let result = update_product(
            &db,
            product.id,
            ProductUpdate {
                supplier_id: Some(Some(999)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Supplier", .. })));

        let cleared = update_product(
            &db,
            product.id,
            ProductUpdate {
                supplier_id: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(cleared.supplier_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_hides_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "DEL-01").await?;

        delete_product(&db, product.id).await?;
        assert!(get_product_by_id(&db, product.id).await?.is_none());
        assert!(Product::find_by_id(product.id).one(&db).await?.is_some());

        let result = delete_product(&db, product.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let result = update_product(&db, product.id, ProductUpdate::default()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_deleted_sku_still_exists() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "GONE-01").await?;
        delete_product(&db, product.id).await?;

        assert!(get_product_by_sku(&db, "GONE-01").await?.is_none());
        assert!(sku_exists(&db, "GONE-01").await?);
        assert!(!sku_exists(&db, "NEVER-01").await?);

        let result = create_product(
            &db,
            NewProduct::new("GONE-01", "Reused", ProductType::RawMaterial, "kg"),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_find_products_searches_and_paginates() -> Result<()> {
        let db = setup_test_db().await?;
        for sku in ["FILM-01", "FILM-02", "FILM-03", "BAG-01"] {
            create_test_product(&db, sku).await?;
        }
        let hidden = create_test_product(&db, "FILM-04").await?;
        delete_product(&db, hidden.id).await?;

        let page = find_products(&db, Some("FILM"), PageRequest::new(1, 2)).await?;
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].sku, "FILM-01");

        let page = find_products(&db, Some("FILM"), PageRequest::new(2, 2)).await?;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].sku, "FILM-03");

        let page = find_products(&db, None, PageRequest::default()).await?;
        assert_eq!(page.total_items, 4);
        assert_eq!(page.items[0].sku, "BAG-01");
        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_products() -> Result<()> {
        let db = setup_test_db().await?;
        // test products have min_stock 5
        let low = create_stocked_product(&db, "LOW-01", dec!(5)).await?;
        create_stocked_product(&db, "OK-01", dec!(6)).await?;
        let empty = create_test_product(&db, "LOW-02").await?;

        let low_stock = get_low_stock_products(&db).await?;
        let ids: Vec<i64> = low_stock.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![low.id, empty.id]);
        Ok(())
    }
}
