//! Production order entity - A request to manufacture a quantity of a finished product.
//!
//! Consumptions, batches and wastes are recorded against it in their own tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a production order. Transitions are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionOrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[sea_orm(string_value = "LOW")]
    Low,
    #[default]
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[sea_orm(string_value = "HIGH")]
    High,
}

/// Production order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `OP-YYYYMMDD-<sequence>`
    #[sea_orm(unique)]
    pub order_number: String,
    /// Finished product being manufactured
    pub product_id: i64,
    /// Planned quantity to produce
    pub quantity: Decimal,
    pub planned_start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    pub notes: Option<String>,
    pub created_by: i64,
    pub status: ProductionOrderStatus,
    pub priority: Priority,
    /// Film gauge, machine-specific
    pub gauge: Option<String>,
    pub measures: Option<String>,
    pub machine: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order manufactures one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::production_consumption::Entity")]
    Consumptions,
    #[sea_orm(has_many = "super::production_batch::Entity")]
    Batches,
    #[sea_orm(has_many = "super::waste::Entity")]
    Wastes,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::production_consumption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumptions.def()
    }
}

impl Related<super::production_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::waste::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wastes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
