//! Waste entity - Scrap reported against a production order. Does not move stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wastes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    /// Process step where the waste happened (e.g. "extrusion", "cutting")
    pub process: String,
    /// Wasted quantity in kg
    pub quantity: Decimal,
    pub reason: Option<String>,
    pub recorded_at: DateTimeUtc,
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
