//! Audit log entity - Best-effort trail of user actions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who performed the action
    pub user_id: i64,
    /// Action name, e.g. `"INVENTORY_EXIT"`
    pub action: String,
    /// Structured details of the action
    pub details: Json,
    pub recorded_at: DateTimeUtc,
}

/// `AuditLog` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
