//! Client entity - Customers placing sales orders, with their credit terms.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business code, unique across clients
    #[sea_orm(unique)]
    pub code: String,
    /// Legal or trading name
    pub name: String,
    pub tax_id: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Maximum outstanding amount (unpaid orders plus a new order) the client may carry
    pub credit_limit: Decimal,
    /// Days between invoice issue and due date
    pub payment_terms: i32,
    /// Soft delete flag
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One client has many sales orders
    #[sea_orm(has_many = "super::sales_order::Entity")]
    SalesOrders,
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
