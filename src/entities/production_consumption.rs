//! Production consumption entity - Raw material drawn from stock for a production order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_consumptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    /// Raw material product that left stock
    pub material_id: i64,
    pub consumed_quantity: Decimal,
    pub consumed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_order::Entity",
        from = "Column::OrderId",
        to = "super::production_order::Column::Id"
    )]
    ProductionOrder,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::MaterialId",
        to = "super::product::Column::Id"
    )]
    Material,
}

impl Related<super::production_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrder.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
