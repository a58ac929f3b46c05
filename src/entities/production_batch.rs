//! Production batch entity - A lot of finished goods that entered stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Quality disposition of a batch
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchQuality {
    #[default]
    #[sea_orm(string_value = "RELEASED")]
    Released,
    #[sea_orm(string_value = "QUARANTINE")]
    Quarantine,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Lot number, unique across all orders
    #[sea_orm(unique)]
    pub batch_number: String,
    pub order_id: i64,
    pub quantity_produced: Decimal,
    pub production_date: Date,
    pub quality: BatchQuality,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_order::Entity",
        from = "Column::OrderId",
        to = "super::production_order::Column::Id"
    )]
    ProductionOrder,
}

impl Related<super::production_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
