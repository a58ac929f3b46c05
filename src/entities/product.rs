//! Product entity - Catalog items whose stock is tracked by the ledger.
//!
//! `current_stock` is a denormalized counter: it always equals the signed sum of the
//! product's inventory movements and is only written by the movement recorder.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a product is consumed by production or sold as finished goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Input material consumed by production orders
    #[sea_orm(string_value = "RAW_MATERIAL")]
    RawMaterial,
    /// Manufactured item that enters stock through production batches
    #[sea_orm(string_value = "FINISHED_PRODUCT")]
    FinishedProduct,
}

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stock keeping unit, unique across the catalog
    #[sea_orm(unique)]
    pub sku: String,
    /// Human-readable description
    pub description: String,
    /// Raw material or finished product
    pub product_type: ProductType,
    /// Unit of measure (e.g. "kg", "pcs")
    pub unit: String,
    /// Unit cost used by production cost analysis
    pub cost_price: Decimal,
    /// Threshold at or below which the product is reported as low stock
    pub min_stock: Decimal,
    /// Quantity on hand, maintained by the movement recorder
    pub current_stock: Decimal,
    /// Supplier the product is sourced from, if any
    pub supplier_id: Option<i64>,
    /// Soft delete flag - inactive products are hidden from the catalog
    pub is_active: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many inventory movements
    #[sea_orm(has_many = "super::inventory_movement::Entity")]
    InventoryMovements,
    /// A product may be sourced from one supplier
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::inventory_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryMovements.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
