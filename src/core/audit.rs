//! Audit trail of user actions.
//!
//! Writing an audit record never fails the action being audited: [`log_action`] logs its own
//! failures and returns nothing. Call it after the action's transaction has committed.

use crate::{
    core::page::{self, Page, PageRequest},
    entities::{AuditLog, audit_log},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, error};

pub const INVENTORY_ENTRY: &str = "INVENTORY_ENTRY";
pub const INVENTORY_EXIT: &str = "INVENTORY_EXIT";
pub const CREATE_SALES_ORDER: &str = "CREATE_SALES_ORDER";
pub const UPDATE_SALES_ORDER_STATUS: &str = "UPDATE_SALES_ORDER_STATUS";
pub const CREATE_PRODUCTION_ORDER: &str = "CREATE_PRODUCTION_ORDER";
pub const UPDATE_PRODUCTION_ORDER_STATUS: &str = "UPDATE_PRODUCTION_ORDER_STATUS";
pub const REGISTER_CONSUMPTION: &str = "REGISTER_CONSUMPTION";
pub const REGISTER_PRODUCTION_BATCH: &str = "REGISTER_PRODUCTION_BATCH";
pub const COMPLETE_PRODUCTION_ORDER: &str = "COMPLETE_PRODUCTION_ORDER";
pub const REGISTER_WASTE: &str = "REGISTER_WASTE";

/// Appends an audit record. Failures are logged and swallowed.
pub async fn log_action<C>(db: &C, user_id: i64, action: &str, details: Json)
where
    C: ConnectionTrait,
{
    let record = audit_log::ActiveModel {
        user_id: Set(user_id),
        action: Set(action.to_string()),
        details: Set(details),
        recorded_at: Set(Utc::now()),
        ..Default::default()
    };

    match record.insert(db).await {
        Ok(record) => debug!("Audited {} by user {} (ID: {})", action, user_id, record.id),
        Err(err) => error!("Failed to write audit record {} for user {}: {}", action, user_id, err),
    }
}

/// Filters for [`find_audits`]. Time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub user_id: Option<i64>,
    /// Substring of the action name
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Pages through audit records, newest first.
pub async fn find_audits<C>(
    db: &C,
    filter: &AuditFilter,
    request: PageRequest,
) -> Result<Page<audit_log::Model>>
where
    C: ConnectionTrait,
{
    let mut query = AuditLog::find();
    if let Some(user_id) = filter.user_id {
        query = query.filter(audit_log::Column::UserId.eq(user_id));
    }
    if let Some(action) = filter.action.as_deref().filter(|a| !a.is_empty()) {
        query = query.filter(audit_log::Column::Action.contains(action));
    }
    if let Some(from) = filter.from {
        query = query.filter(audit_log::Column::RecordedAt.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(audit_log::Column::RecordedAt.lte(to));
    }

    let paginator = query
        .order_by_desc(audit_log::Column::RecordedAt)
        .order_by_desc(audit_log::Column::Id)
        .paginate(db, request.page_size());
    page::fetch(paginator, request).await
}
