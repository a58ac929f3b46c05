//! Inventory movement entity - Immutable, append-only record of a single stock change.
//!
//! Entries carry a positive quantity and exits a negative one, so the signed sum of a
//! product's movements is its stock on hand.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Stock received
    #[sea_orm(string_value = "ENTRY")]
    Entry,
    /// Stock issued
    #[sea_orm(string_value = "EXIT")]
    Exit,
}

/// Inventory movement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    /// Unique identifier for the movement
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product whose stock changed
    pub product_id: i64,
    /// Entry or exit
    pub movement_type: MovementType,
    /// Signed quantity: positive for entries, negative for exits
    pub quantity: Decimal,
    /// User who performed the movement
    pub user_id: i64,
    /// Document justifying the movement (order number, delivery note, ...)
    pub reference_document: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Production batch number, when the movement relates to one
    pub batch: Option<String>,
    /// When the movement was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `InventoryMovement` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each movement belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
