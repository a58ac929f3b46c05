//! Supplier directory - the vendors a product's `supplier_id` may point at.

use crate::{
    entities::{Supplier, supplier},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::info;

/// Registers an active supplier.
///
/// # Errors
/// Returns `Error::Validation` if the name is empty.
pub async fn create_supplier<C>(db: &C, name: &str) -> Result<supplier::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Supplier name cannot be empty".to_string(),
        });
    }

    let supplier = supplier::ActiveModel {
        name: Set(name.to_string()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created supplier '{}' (ID: {})", supplier.name, supplier.id);
    Ok(supplier)
}

/// Finds an active supplier by id.
pub async fn get_supplier_by_id<C>(db: &C, supplier_id: i64) -> Result<Option<supplier::Model>>
where
    C: ConnectionTrait,
{
    Supplier::find_by_id(supplier_id)
        .filter(supplier::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Active suppliers ordered by name.
pub async fn find_active_suppliers<C>(db: &C) -> Result<Vec<supplier::Model>>
where
    C: ConnectionTrait,
{
    Supplier::find()
        .filter(supplier::Column::IsActive.eq(true))
        .order_by_asc(supplier::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a supplier. Products already pointing at it keep the reference.
///
/// # Errors
/// Returns `Error::NotFound` if the supplier does not exist or is already inactive.
pub async fn deactivate_supplier<C>(db: &C, supplier_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Supplier::update_many()
        .col_expr(supplier::Column::IsActive, Expr::value(false))
        .filter(supplier::Column::Id.eq(supplier_id))
        .filter(supplier::Column::IsActive.eq(true))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("Supplier", supplier_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_active_suppliers_sorted_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        let zeta = create_supplier(&db, "Zeta Polymers").await?;
        let acme = create_supplier(&db, " Acme Resins ").await?;
        let gone = create_supplier(&db, "Bolsas del Norte").await?;
        deactivate_supplier(&db, gone.id).await?;

        let suppliers = find_active_suppliers(&db).await?;
        let ids: Vec<i64> = suppliers.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![acme.id, zeta.id]);
        assert_eq!(suppliers[0].name, "Acme Resins");

        assert!(get_supplier_by_id(&db, gone.id).await?.is_none());
        let result = deactivate_supplier(&db, gone.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Supplier", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_supplier(&db, "   ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}
