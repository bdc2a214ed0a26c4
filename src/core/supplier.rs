//! Supplier and account management.
//!
//! Purchase requests are addressed to accounts with the `Supplier` role. This
//! module creates those accounts together with their profile, resolves accounts
//! by id, username or email, and soft-deletes suppliers. Credentials are handled
//! elsewhere; accounts created here carry no password.

use crate::{
    config::settings::{NotificationSettings, SupplierSeed},
    core::notify::{Notification, Notifier},
    entities::{
        Account, AccountRole, SoftDelete, SupplierProfile, account, supplier_profile,
    },
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Input for [`create_supplier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    /// Unique supplier code
    pub code: String,
    /// Company name
    pub title: String,
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Postal address
    pub address: String,
}

impl From<SupplierSeed> for NewSupplier {
    fn from(seed: SupplierSeed) -> Self {
        Self {
            code: seed.code,
            title: seed.title,
            username: seed.username,
            email: seed.email,
            phone: seed.phone,
            address: seed.address,
        }
    }
}

/// A supplier account joined with its profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierView {
    /// Account id; this is the `supplier_id` used on purchase requests
    pub id: i64,
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Whether the account is enabled
    pub is_active: bool,
    /// Supplier code
    pub code: String,
    /// Company name
    pub title: String,
    /// Contact phone
    pub phone: String,
    /// Postal address
    pub address: String,
}

impl SupplierView {
    fn new(account: &account::Model, profile: Option<&supplier_profile::Model>) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            is_active: account.is_active,
            code: profile.map(|p| p.code.clone()).unwrap_or_default(),
            title: profile.map(|p| p.title.clone()).unwrap_or_default(),
            phone: profile.map(|p| p.phone.clone()).unwrap_or_default(),
            address: profile.map(|p| p.address.clone()).unwrap_or_default(),
        }
    }
}

fn require(field: &'static str, value: &str, label: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, format!("{label} is required")));
    }
    limit(field, value, label, max_len)
}

fn limit(field: &'static str, value: &str, label: &str, max_len: usize) -> Result<()> {
    if value.trim().chars().count() > max_len {
        return Err(Error::validation(
            field,
            format!("{label} cannot exceed {max_len} characters"),
        ));
    }
    Ok(())
}

fn validate_new_supplier(new: &NewSupplier) -> Result<()> {
    require("code", &new.code, "Supplier code", 50)?;
    require("title", &new.title, "Supplier title", 200)?;
    require("username", &new.username, "Username", 50)?;
    if new.username.trim().chars().count() < 4 {
        return Err(Error::validation(
            "username",
            "Username must be at least 4 characters",
        ));
    }
    require("email", &new.email, "Email", 100)?;
    if !new.email.contains('@') {
        return Err(Error::validation(
            "email",
            format!("Invalid email format: {}", new.email),
        ));
    }
    limit("phone", &new.phone, "Phone", 20)?;
    limit("address", &new.address, "Address", 500)
}

/// Finds a live account by id.
pub async fn get_account_by_id<C>(db: &C, account_id: i64) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_active_by_id(account_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a live account by username.
pub async fn get_account_by_username<C>(db: &C, username: &str) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_active()
        .filter(account::Column::Username.eq(username.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a live account by email.
pub async fn get_account_by_email<C>(db: &C, email: &str) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_active()
        .filter(account::Column::Email.eq(email.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves a live account holding the `Supplier` role.
pub async fn find_supplier_account<C>(db: &C, supplier_id: i64) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_active_by_id(supplier_id)
        .filter(account::Column::Role.eq(AccountRole::Supplier))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads live profiles for the given accounts, keyed by account id.
pub async fn profiles_by_account<C>(
    db: &C,
    account_ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, supplier_profile::Model>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = account_ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let profiles = SupplierProfile::find_active()
        .filter(supplier_profile::Column::AccountId.is_in(ids))
        .all(db)
        .await?;
    Ok(profiles.into_iter().map(|p| (p.account_id, p)).collect())
}

/// Creates a supplier account and its profile in one transaction, then sends
/// the onboarding notification.
///
/// A failed notification is logged and does not undo the account.
///
/// # Errors
/// - [`Error::Validation`] for missing or oversized fields
/// - [`Error::Conflict`] if the code, username or email is already taken
#[instrument(skip(db, notifier, settings), fields(code = %new.code, username = %new.username))]
pub async fn create_supplier<N>(
    db: &DatabaseConnection,
    new: NewSupplier,
    notifier: &N,
    settings: &NotificationSettings,
) -> Result<SupplierView>
where
    N: Notifier,
{
    validate_new_supplier(&new)?;
    let code = new.code.trim().to_string();
    let username = new.username.trim().to_string();
    let email = new.email.trim().to_string();

    // Uniqueness is checked against deleted rows too; the unique indexes cover them.
    if SupplierProfile::find()
        .filter(supplier_profile::Column::Code.eq(code.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::conflict(format!(
            "Supplier with code '{code}' already exists"
        )));
    }
    if Account::find()
        .filter(account::Column::Username.eq(username.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::conflict(format!(
            "Username '{username}' is already taken"
        )));
    }
    if Account::find()
        .filter(account::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::conflict(format!("Email '{email}' is already in use")));
    }

    let now = chrono::Utc::now();
    let txn = db.begin().await?;

    let account = account::ActiveModel {
        username: Set(username.clone()),
        email: Set(email.clone()),
        full_name: Set(Some(new.title.trim().to_string())),
        role: Set(AccountRole::Supplier),
        is_active: Set(true),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| Error::from_insert(e, &username))?;

    let profile = supplier_profile::ActiveModel {
        account_id: Set(account.id),
        code: Set(code.clone()),
        title: Set(new.title.trim().to_string()),
        phone: Set(new.phone.trim().to_string()),
        address: Set(new.address.trim().to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| Error::from_insert(e, &code))?;

    txn.commit().await?;
    info!("Supplier profile and account created: {} / {}", code, username);

    let message =
        Notification::supplier_onboarding(settings, &email, &profile.title, &username, &code);
    if let Err(e) = notifier.notify(&message).await {
        warn!("Failed to send onboarding notification to {}: {}", email, e);
    }

    Ok(SupplierView::new(&account, Some(&profile)))
}

/// Retrieves a live supplier by account id.
pub async fn get_supplier(db: &DatabaseConnection, supplier_id: i64) -> Result<Option<SupplierView>> {
    let Some(account) = find_supplier_account(db, supplier_id).await? else {
        return Ok(None);
    };
    let profiles = profiles_by_account(db, [account.id]).await?;
    Ok(Some(SupplierView::new(&account, profiles.get(&account.id))))
}

/// Lists all live suppliers ordered by username.
pub async fn list_suppliers(db: &DatabaseConnection) -> Result<Vec<SupplierView>> {
    let accounts = Account::find_active()
        .filter(account::Column::Role.eq(AccountRole::Supplier))
        .order_by_asc(account::Column::Username)
        .all(db)
        .await?;
    let profiles = profiles_by_account(db, accounts.iter().map(|a| a.id)).await?;
    Ok(accounts
        .iter()
        .map(|a| SupplierView::new(a, profiles.get(&a.id)))
        .collect())
}

/// Enables or disables a supplier account.
pub async fn set_supplier_active(
    db: &DatabaseConnection,
    supplier_id: i64,
    is_active: bool,
) -> Result<account::Model> {
    let mut account: account::ActiveModel = find_supplier_account(db, supplier_id)
        .await?
        .ok_or_else(|| Error::not_found("Supplier", supplier_id))?
        .into();
    account.is_active = Set(is_active);
    account.updated_at = Set(chrono::Utc::now());
    let updated = account.update(db).await?;
    info!("Supplier {} active = {}", supplier_id, is_active);
    Ok(updated)
}

/// Soft-deletes a supplier account and its profile.
///
/// Existing purchase requests keep their `supplier_id`.
pub async fn delete_supplier(db: &DatabaseConnection, supplier_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let now = chrono::Utc::now();

    let mut account: account::ActiveModel = find_supplier_account(&txn, supplier_id)
        .await?
        .ok_or_else(|| Error::not_found("Supplier", supplier_id))?
        .into();
    account.is_deleted = Set(true);
    account.updated_at = Set(now);
    account.update(&txn).await?;

    if let Some(profile) = profiles_by_account(&txn, [supplier_id])
        .await?
        .remove(&supplier_id)
    {
        let mut profile: supplier_profile::ActiveModel = profile.into();
        profile.is_deleted = Set(true);
        profile.updated_at = Set(now);
        profile.update(&txn).await?;
    }

    txn.commit().await?;
    info!("Supplier {} deleted", supplier_id);
    Ok(())
}

/// Creates every configured supplier whose username is not taken yet.
///
/// Returns the number of suppliers created.
pub async fn seed_suppliers<N>(
    db: &DatabaseConnection,
    seeds: &[SupplierSeed],
    notifier: &N,
    settings: &NotificationSettings,
) -> Result<usize>
where
    N: Notifier,
{
    let mut created = 0;
    for seed in seeds {
        if Account::find()
            .filter(account::Column::Username.eq(seed.username.trim()))
            .one(db)
            .await?
            .is_some()
        {
            continue;
        }
        create_supplier(db, seed.clone().into(), notifier, settings).await?;
        created += 1;
    }
    info!("Seeded {} supplier(s)", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::notify::TracingNotifier;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<()> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        async fn notify(&self, _notification: &Notification) -> Result<()> {
            Err(Error::Config {
                message: "smtp unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_create_supplier_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let notifier = TracingNotifier::default();
        let settings = NotificationSettings::default();

        let mut missing_code = new_supplier("ACME", "acme");
        missing_code.code = "  ".to_string();
        let result = create_supplier(&db, missing_code, &notifier, &settings).await;
        assert!(matches!(result, Err(Error::Validation { field: "code", .. })));

        let short_username = new_supplier("ACME", "abc");
        let result = create_supplier(&db, short_username, &notifier, &settings).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "username",
                ..
            })
        ));

        let mut bad_email = new_supplier("ACME", "acme");
        bad_email.email = "not-an-email".to_string();
        let result = create_supplier(&db, bad_email, &notifier, &settings).await;
        assert!(matches!(result, Err(Error::Validation { field: "email", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_supplier_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();

        let supplier = create_supplier(
            &db,
            new_supplier("ACME", "acme"),
            &notifier,
            &NotificationSettings::default(),
        )
        .await?;

        assert_eq!(supplier.code, "ACME");
        assert_eq!(supplier.username, "acme");
        assert!(supplier.is_active);

        let account = get_account_by_id(&db, supplier.id).await?.unwrap();
        assert_eq!(account.role, AccountRole::Supplier);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "acme@suppliers.test");
        assert!(sent[0].body.contains("ACME"));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_code_and_username_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_supplier(&db, "ACME", "acme").await?;
        let notifier = TracingNotifier::default();
        let settings = NotificationSettings::default();

        let result = create_supplier(&db, new_supplier("ACME", "other"), &notifier, &settings).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        let result = create_supplier(&db, new_supplier("OTHER", "acme"), &notifier, &settings).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_creation() -> Result<()> {
        let db = setup_test_db().await?;

        let supplier = create_supplier(
            &db,
            new_supplier("ACME", "acme"),
            &FailingNotifier,
            &NotificationSettings::default(),
        )
        .await?;

        assert!(get_supplier(&db, supplier.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_account_lookups() -> Result<()> {
        let db = setup_test_db().await?;
        let supplier = create_test_supplier(&db, "ACME", "acme").await?;

        let by_name = get_account_by_username(&db, "acme").await?.unwrap();
        assert_eq!(by_name.id, supplier.id);
        let by_email = get_account_by_email(&db, "acme@suppliers.test").await?.unwrap();
        assert_eq!(by_email.id, supplier.id);
        assert!(get_account_by_username(&db, "nobody").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_supplier_is_hidden() -> Result<()> {
        let db = setup_test_db().await?;
        let kept = create_test_supplier(&db, "KEEP", "keeper").await?;
        let gone = create_test_supplier(&db, "GONE", "goner").await?;

        delete_supplier(&db, gone.id).await?;

        assert!(get_supplier(&db, gone.id).await?.is_none());
        assert!(get_account_by_username(&db, "goner").await?.is_none());
        let suppliers = list_suppliers(&db).await?;
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].id, kept.id);

        let result = delete_supplier(&db, gone.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_supplier_active() -> Result<()> {
        let db = setup_test_db().await?;
        let supplier = create_test_supplier(&db, "ACME", "acme").await?;

        let account = set_supplier_active(&db, supplier.id, false).await?;
        assert!(!account.is_active);
        assert!(!get_supplier(&db, supplier.id).await?.unwrap().is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_suppliers_skips_existing() -> Result<()> {
        let db = setup_test_db().await?;
        let seeds = vec![
            SupplierSeed {
                code: "S1".to_string(),
                title: "Seed One".to_string(),
                username: "seed_one".to_string(),
                email: "one@seed.test".to_string(),
                phone: "555-0001".to_string(),
                address: "1 Seed Rd".to_string(),
            },
            SupplierSeed {
                code: "S2".to_string(),
                title: "Seed Two".to_string(),
                username: "seed_two".to_string(),
                email: "two@seed.test".to_string(),
                phone: "555-0002".to_string(),
                address: "2 Seed Rd".to_string(),
            },
        ];
        let notifier = TracingNotifier::default();
        let settings = NotificationSettings::default();

        assert_eq!(seed_suppliers(&db, &seeds, &notifier, &settings).await?, 2);
        assert_eq!(seed_suppliers(&db, &seeds, &notifier, &settings).await?, 0);
        assert_eq!(list_suppliers(&db).await?.len(), 2);
        Ok(())
    }
}
