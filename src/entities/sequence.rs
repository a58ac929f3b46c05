//! Sequence entity - Named counters used to number documents.
//! Stores one row per document kind (e.g. `"sales_orders"`), incremented
//! inside the transaction that creates the document.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sequence database model - stores the last value handed out per name
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sequences")]
pub struct Model {
    /// Sequence name
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    /// Last value handed out
    pub value: i64,
}

/// `Sequence` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
