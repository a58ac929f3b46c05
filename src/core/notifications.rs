//! Counts of things waiting for someone's attention.

use crate::{
    entities::{
        Product, ProductionOrder, ProductionOrderStatus, SalesOrder, SalesOrderStatus, product,
        production_order, sales_order,
    },
    errors::Result,
};
use sea_orm::{prelude::*, sea_query::Expr};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationSummary {
    /// Active products at or below their minimum stock
    pub low_stock_count: u64,
    /// Sales orders still in QUOTE
    pub pending_quotes_count: u64,
    /// Production orders not yet started
    pub pending_production_count: u64,
}

pub async fn summary<C>(db: &C) -> Result<NotificationSummary>
where
    C: ConnectionTrait,
{
    let low_stock_count = Product::find()
        .filter(product::Column::IsActive.eq(true))
        .filter(Expr::col(product::Column::CurrentStock).lte(Expr::col(product::Column::MinStock)))
        .count(db)
        .await?;
    let pending_quotes_count = SalesOrder::find()
        .filter(sales_order::Column::Status.eq(SalesOrderStatus::Quote))
        .count(db)
        .await?;
    let pending_production_count = ProductionOrder::find()
        .filter(production_order::Column::Status.eq(ProductionOrderStatus::Pending))
        .count(db)
        .await?;

    Ok(NotificationSummary {
        low_stock_count,
        pending_quotes_count,
        pending_production_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sales;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_summary_counts() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(summary(&db).await?, NotificationSummary::default());

        let client = create_test_client(&db, "N-CL", dec!(1000)).await?;
        // min stock 5: low until restocked
        let resin = create_stocked_product(&db, "N-RESIN", dec!(8)).await?;
        create_test_product(&db, "N-FILM").await?;
        let quote = create_test_sales_order(&db, client.id, resin.id, dec!(1), dec!(10)).await?;
        create_test_sales_order(&db, client.id, resin.id, dec!(1), dec!(10)).await?;
        sales::update_order_status(&db, quote.id, SalesOrderStatus::Confirmed).await?;
        create_test_production_order(&db, resin.id, dec!(5)).await?;

        let counts = summary(&db).await?;
        assert_eq!(counts.low_stock_count, 1);
        assert_eq!(counts.pending_quotes_count, 1);
        assert_eq!(counts.pending_production_count, 1);
        Ok(())
    }
}
