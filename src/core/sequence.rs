//! Document numbering.
//!
//! Order numbers are `<PREFIX>-<YYYYMMDD>-<sequence>`. The sequence value is drawn inside
//! the transaction that creates the document, with the counter row locked, so concurrent
//! creations never share a number and a rolled-back creation gives its value back.

use crate::{
    entities::{Sequence, sequence},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, QuerySelect, Set, prelude::*, sea_query::OnConflict};

/// Sequence backing sales order numbers
pub const SALES_ORDERS: &str = "sales_orders";
/// Sequence backing production order numbers
pub const PRODUCTION_ORDERS: &str = "production_orders";

/// Makes sure the counter row exists, starting at 0.
///
/// Uses `INSERT ... ON CONFLICT DO NOTHING` so two transactions creating the first document
/// of a kind both succeed: the loser waits on the winner's key and then inserts nothing.
pub(crate) async fn ensure_counter(txn: &DatabaseTransaction, name: &str) -> Result<()> {
    let counter = sequence::ActiveModel {
        name: Set(name.to_string()),
        value: Set(0),
    };
    Sequence::insert(counter)
        .on_conflict(
            OnConflict::column(sequence::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;
    Ok(())
}

/// Returns the next value of the named sequence, starting at 1.
pub async fn next_value(txn: &DatabaseTransaction, name: &str) -> Result<i64> {
    ensure_counter(txn, name).await?;

    let row = Sequence::find_by_id(name.to_string())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| Error::UnknownFailure {
            message: format!("Sequence '{name}' missing right after it was ensured"),
        })?;

    let next = row.value + 1;
    let mut counter: sequence::ActiveModel = row.into();
    counter.value = Set(next);
    counter.update(txn).await?;

    Ok(next)
}

/// Formats a document number from its prefix, creation date and sequence value.
#[must_use]
pub fn document_number(prefix: &str, date: NaiveDate, value: i64) -> String {
    format!("{prefix}-{}-{value}", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::scope;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_document_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(document_number("SO", date, 42), "SO-20250307-42");
        assert_eq!(document_number("OP", date, 1), "OP-20250307-1");
    }

    #[tokio::test]
    async fn test_sequences_increment_independently() -> Result<()> {
        let db = setup_test_db().await?;

        let txn = scope::begin(&db).await?;
        assert_eq!(next_value(&txn, SALES_ORDERS).await?, 1);
        assert_eq!(next_value(&txn, SALES_ORDERS).await?, 2);
        assert_eq!(next_value(&txn, PRODUCTION_ORDERS).await?, 1);
        txn.commit().await?;

        let txn = scope::begin(&db).await?;
        assert_eq!(next_value(&txn, SALES_ORDERS).await?, 3);
        txn.commit().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_rolled_back_value_is_reused() -> Result<()> {
        let db = setup_test_db().await?;

        let txn = scope::begin(&db).await?;
        assert_eq!(next_value(&txn, SALES_ORDERS).await?, 1);
        txn.rollback().await?;

        let txn = scope::begin(&db).await?;
        assert_eq!(next_value(&txn, SALES_ORDERS).await?, 1);
        txn.commit().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_counter_keeps_existing_value() -> Result<()> {
        let db = setup_test_db().await?;

        let txn = scope::begin(&db).await?;
        ensure_counter(&txn, SALES_ORDERS).await?;
        ensure_counter(&txn, SALES_ORDERS).await?;
        let row = Sequence::find_by_id(SALES_ORDERS.to_string()).one(&txn).await?.unwrap();
        assert_eq!(row.value, 0);
        txn.commit().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_created_elsewhere_is_continued() -> Result<()> {
        let db = setup_test_db().await?;

        // Another transaction created the counter and handed out values first
        sequence::ActiveModel {
            name: Set(PRODUCTION_ORDERS.to_string()),
            value: Set(41),
        }
        .insert(&db)
        .await?;

        let txn = scope::begin(&db).await?;
        assert_eq!(next_value(&txn, PRODUCTION_ORDERS).await?, 42);
        txn.commit().await?;

        let row = Sequence::find_by_id(PRODUCTION_ORDERS.to_string()).one(&db).await?.unwrap();
        assert_eq!(row.value, 42);
        Ok(())
    }
}
