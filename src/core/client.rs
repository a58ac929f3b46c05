//! Client directory - customers with their credit limit and payment terms.

use crate::{
    core::page::{self, Page, PageRequest},
    entities::{Client, client},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Condition, QueryOrder, Set, SqlErr, prelude::*, sea_query::Expr};
use tracing::info;

/// Payment terms in days when none are negotiated.
pub const DEFAULT_PAYMENT_TERMS: i32 = 30;

/// Fields required to register a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub code: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Zero when not negotiated, which blocks any order with a positive total
    pub credit_limit: Decimal,
    pub payment_terms: i32,
}

impl Default for NewClient {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            tax_id: None,
            contact: None,
            phone: None,
            email: None,
            address: None,
            credit_limit: Decimal::ZERO,
            payment_terms: DEFAULT_PAYMENT_TERMS,
        }
    }
}

/// Client fields that may be changed. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub tax_id: Option<Option<String>>,
    pub contact: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub credit_limit: Option<Decimal>,
    pub payment_terms: Option<i32>,
}

fn validate_terms(credit_limit: Decimal, payment_terms: i32) -> Result<()> {
    if credit_limit < Decimal::ZERO {
        return Err(Error::Validation {
            message: "Credit limit cannot be negative".to_string(),
        });
    }
    if payment_terms < 0 {
        return Err(Error::Validation {
            message: "Payment terms cannot be negative".to_string(),
        });
    }
    Ok(())
}

/// Registers a new client.
///
/// # Errors
/// * `Error::Validation` if code or name is empty, terms are negative, or the code is taken
pub async fn create_client<C>(db: &C, new_client: NewClient) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    let code = new_client.code.trim().to_string();
    if code.is_empty() || new_client.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Client code and name are required".to_string(),
        });
    }
    validate_terms(new_client.credit_limit, new_client.payment_terms)?;

    let existing = Client::find()
        .filter(client::Column::Code.eq(code.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Validation {
            message: format!("Client code '{code}' already exists"),
        });
    }

    let now = chrono::Utc::now();
    let client = client::ActiveModel {
        code: Set(code.clone()),
        name: Set(new_client.name.trim().to_string()),
        tax_id: Set(new_client.tax_id),
        contact: Set(new_client.contact),
        phone: Set(new_client.phone),
        email: Set(new_client.email),
        address: Set(new_client.address),
        credit_limit: Set(new_client.credit_limit),
        payment_terms: Set(new_client.payment_terms),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = client.insert(db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::Validation {
            message: format!("Client code '{code}' already exists"),
        },
        _ => Error::Database(err),
    })?;
    info!("Created client '{}' (ID: {})", created.code, created.id);
    Ok(created)
}

/// Finds an active client by id.
pub async fn get_client_by_id<C>(db: &C, client_id: i64) -> Result<Option<client::Model>>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .filter(client::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Pages through active clients ordered by name, optionally matching code or name.
pub async fn find_clients<C>(
    db: &C,
    search: Option<&str>,
    request: PageRequest,
) -> Result<Page<client::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Client::find().filter(client::Column::IsActive.eq(true));
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(client::Column::Code.contains(term))
                .add(client::Column::Name.contains(term)),
        );
    }

    let paginator = query
        .order_by_asc(client::Column::Name)
        .paginate(db, request.page_size());
    page::fetch(paginator, request).await
}

/// Applies a typed update to an active client.
///
/// # Errors
/// * `Error::NotFound` if the client does not exist or is inactive
/// * `Error::Validation` if the new name is empty or terms are negative
pub async fn update_client<C>(db: &C, client_id: i64, update: ClientUpdate) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    let existing = get_client_by_id(db, client_id)
        .await?
        .ok_or_else(|| Error::not_found("Client", client_id))?;
    validate_terms(
        update.credit_limit.unwrap_or(existing.credit_limit),
        update.payment_terms.unwrap_or(existing.payment_terms),
    )?;

    let mut client: client::ActiveModel = existing.into();
    if let Some(name) = update.name {
        if name.trim().is_empty() {
            return Err(Error::Validation {
                message: "Client name cannot be empty".to_string(),
            });
        }
        client.name = Set(name.trim().to_string());
    }
    if let Some(tax_id) = update.tax_id {
        client.tax_id = Set(tax_id);
    }
    if let Some(contact) = update.contact {
        client.contact = Set(contact);
    }
    if let Some(phone) = update.phone {
        client.phone = Set(phone);
    }
    if let Some(email) = update.email {
        client.email = Set(email);
    }
    if let Some(address) = update.address {
        client.address = Set(address);
    }
    if let Some(credit_limit) = update.credit_limit {
        client.credit_limit = Set(credit_limit);
    }
    if let Some(payment_terms) = update.payment_terms {
        client.payment_terms = Set(payment_terms);
    }
    client.updated_at = Set(chrono::Utc::now());

    client.update(db).await.map_err(Into::into)
}

/// Soft-deletes a client. Existing orders keep referencing it.
///
/// # Errors
/// Returns `Error::NotFound` if the client does not exist or is already inactive.
pub async fn delete_client<C>(db: &C, client_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Client::update_many()
        .col_expr(client::Column::IsActive, Expr::value(false))
        .col_expr(client::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(client::Column::Id.eq(client_id))
        .filter(client::Column::IsActive.eq(true))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("Client", client_id));
    }
    info!("Soft-deleted client {}", client_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_client_and_duplicate_code() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "CL-001", dec!(5000)).await?;
        assert_eq!(client.credit_limit, dec!(5000));
        assert_eq!(client.payment_terms, DEFAULT_PAYMENT_TERMS);
        assert!(client.is_active);

        let result = create_client(
            &db,
            NewClient {
                code: "CL-001".to_string(),
                name: "Other".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_client_requires_name() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_client(
            &db,
            NewClient {
                code: "CL-002".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_client() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "CL-010", dec!(100)).await?;

        let updated = update_client(
            &db,
            client.id,
            ClientUpdate {
                credit_limit: Some(dec!(900)),
                email: Some(Some("buyer@example.com".to_string())),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.credit_limit, dec!(900));
        assert_eq!(updated.email.as_deref(), Some("buyer@example.com"));
        assert_eq!(updated.name, client.name);

        let result = update_client(
            &db,
            client.id,
            ClientUpdate {
                payment_terms: Some(-1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        delete_client(&db, client.id).await?;
        assert!(get_client_by_id(&db, client.id).await?.is_none());
        let result = delete_client(&db, client.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_find_clients_matches_code_or_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_client(&db, "ACME-1", dec!(0)).await?;
        create_test_client(&db, "BETA-1", dec!(0)).await?;
        create_test_client(&db, "ACME-2", dec!(0)).await?;

        let page = find_clients(&db, Some("ACME"), PageRequest::default()).await?;
        assert_eq!(page.total_items, 2);

        let page = find_clients(&db, None, PageRequest::new(1, 2)).await?;
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        Ok(())
    }
}
