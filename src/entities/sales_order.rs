//! Sales order entity - Header of a customer order; lines live in `order_line`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a sales order. Transitions are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesOrderStatus {
    #[sea_orm(string_value = "QUOTE")]
    Quote,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// Sales order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `SO-YYYYMMDD-<sequence>`
    #[sea_orm(unique)]
    pub order_number: String,
    pub client_id: i64,
    pub order_date: Date,
    pub delivery_date: Option<Date>,
    pub status: SalesOrderStatus,
    /// Sum of quantity x price over all lines
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    /// Subtotal plus tax
    pub total: Decimal,
    pub notes: Option<String>,
    /// User who created the order
    pub created_by: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `SalesOrder` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// One order has many lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
    /// One order may have invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
