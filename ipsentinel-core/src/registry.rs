//! The shared IP registry.
//!
//! Address uniqueness is enforced by the unique index on `ip_records.address`:
//! every insert is attempted directly and a unique-constraint violation is
//! what classifies an address as a duplicate.

use std::net::Ipv4Addr;

use chrono::Utc;
use ipsentinel_common::{validate_ipv4, IpSentinelError};
use ipsentinel_db_entities::AccessLog::CheckResult;
use ipsentinel_db_entities::IpRecord;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, SqlErr, TransactionTrait,
};
use tracing::*;
use uuid::Uuid;

use crate::db::contains_literal;
use crate::{access_log, users};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Fresh(IpRecord::Model),
    Duplicate(IpRecord::Model),
}

impl CheckOutcome {
    pub fn result(&self) -> CheckResult {
        match self {
            Self::Fresh(_) => CheckResult::Fresh,
            Self::Duplicate(_) => CheckResult::Duplicate,
        }
    }

    pub fn record(&self) -> &IpRecord::Model {
        match self {
            Self::Fresh(record) | Self::Duplicate(record) => record,
        }
    }

    pub fn into_record(self) -> IpRecord::Model {
        match self {
            Self::Fresh(record) | Self::Duplicate(record) => record,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub added: u64,
    pub existing: u64,
    pub errors: u64,
}

/// Checks an address on behalf of a known user, registering it if it is fresh.
/// Every check is recorded in the access log. The registration and its log
/// entry are committed together.
pub async fn check_and_register<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    address: &str,
    username: &str,
) -> Result<CheckOutcome, IpSentinelError> {
    let address = validate_ipv4(address)?;
    if username.trim().is_empty() {
        return Err(IpSentinelError::EmptyUsername);
    }
    let Some(user) = users::find_by_username(db, username).await? else {
        return Err(IpSentinelError::UnknownUser(username.trim().to_owned()));
    };

    let txn = db.begin().await?;
    let outcome = insert(&txn, address, &user.username).await?;
    access_log::record(&txn, &user, &outcome.record().address, outcome.result()).await?;
    txn.commit().await?;

    match outcome {
        CheckOutcome::Fresh(_) => {
            info!(%address, username=%user.username, "Registered fresh address")
        }
        CheckOutcome::Duplicate(_) => {
            info!(%address, username=%user.username, "Duplicate address detected")
        }
    }
    Ok(outcome)
}

/// Admin insert: duplicates are an error instead of an outcome.
pub async fn add<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    address: &str,
    added_by: &str,
) -> Result<IpRecord::Model, IpSentinelError> {
    let address = validate_ipv4(address)?;
    match insert(db, address, added_by).await? {
        CheckOutcome::Fresh(record) => {
            info!(%address, %added_by, "Address added to the registry");
            Ok(record)
        }
        CheckOutcome::Duplicate(record) => Err(IpSentinelError::DuplicateAddress(record.address)),
    }
}

pub async fn get_by_address<C: ConnectionTrait>(
    db: &C,
    address: Ipv4Addr,
) -> Result<Option<IpRecord::Model>, IpSentinelError> {
    Ok(IpRecord::Entity::find()
        .filter(IpRecord::Column::Address.eq(address.to_string()))
        .one(db)
        .await?)
}

/// Newest first, optionally narrowed to addresses containing `search`.
pub fn query(search: Option<&str>) -> Select<IpRecord::Entity> {
    let mut q = IpRecord::Entity::find()
        .order_by_desc(IpRecord::Column::CreatedAt)
        .order_by_asc(IpRecord::Column::Address);
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        q = q.filter(contains_literal(IpRecord::Column::Address, search));
    }
    q
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    search: Option<&str>,
) -> Result<Vec<IpRecord::Model>, IpSentinelError> {
    Ok(query(search).all(db).await?)
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, IpSentinelError> {
    Ok(IpRecord::Entity::find().count(db).await?)
}

/// Returns `false` if no record with this id exists.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, IpSentinelError> {
    let Some(record) = IpRecord::Entity::find_by_id(id).one(db).await? else {
        return Ok(false);
    };
    let address = record.address.clone();
    record.delete(db).await?;
    info!(%address, "Address removed from the registry");
    Ok(true)
}

/// Imports one address per line. Blank lines are skipped; lines that are not
/// valid addresses are counted as errors, already registered ones as existing.
pub async fn import<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    text: &str,
    added_by: &str,
) -> Result<ImportStats, IpSentinelError> {
    let mut stats = ImportStats::default();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Ok(address) = validate_ipv4(line) else {
            debug!(line, "Skipping invalid import line");
            stats.errors += 1;
            continue;
        };
        match insert(db, address, added_by).await? {
            CheckOutcome::Fresh(_) => stats.added += 1,
            CheckOutcome::Duplicate(_) => stats.existing += 1,
        }
    }
    info!(
        added = stats.added,
        existing = stats.existing,
        errors = stats.errors,
        %added_by,
        "Bulk import finished"
    );
    Ok(stats)
}

/// Inserts `addresses` only if the registry is empty. Returns the number added.
pub async fn seed<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    addresses: &[String],
    added_by: &str,
) -> Result<u64, IpSentinelError> {
    if count(db).await? > 0 {
        return Ok(0);
    }
    let mut added = 0;
    for address in addresses {
        let Ok(address) = validate_ipv4(address) else {
            continue;
        };
        if let CheckOutcome::Fresh(_) = insert(db, address, added_by).await? {
            added += 1;
        }
    }
    Ok(added)
}

/// The insert runs in its own (nested) transaction so that a unique violation
/// leaves an enclosing transaction usable on backends that abort on error.
async fn insert<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    address: Ipv4Addr,
    added_by: &str,
) -> Result<CheckOutcome, IpSentinelError> {
    let values = IpRecord::ActiveModel {
        id: Set(Uuid::new_v4()),
        address: Set(address.to_string()),
        created_at: Set(Utc::now()),
        added_by: Set(added_by.to_owned()),
    };

    let savepoint = db.begin().await?;
    match values.insert(&savepoint).await {
        Ok(record) => {
            savepoint.commit().await?;
            Ok(CheckOutcome::Fresh(record))
        }
        Err(error) if matches!(error.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            savepoint.rollback().await?;
            let existing = get_by_address(db, address)
                .await?
                .ok_or_else(|| IpSentinelError::from(error))?;
            Ok(CheckOutcome::Duplicate(existing))
        }
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use ipsentinel_db_entities::AccessLog;

    use super::*;
    use crate::db::connect_to_test_db;

    #[tokio::test]
    async fn test_first_check_is_fresh_then_duplicate() {
        let db = connect_to_test_db().await;
        users::create(&db, "alice").await.unwrap();
        users::create(&db, "bob").await.unwrap();

        let first = check_and_register(&db, "192.168.1.10", "alice").await.unwrap();
        assert_eq!(first.result(), CheckResult::Fresh);
        assert_eq!(first.record().address, "192.168.1.10");
        assert_eq!(first.record().added_by, "alice");

        let second = check_and_register(&db, " 192.168.1.10 ", "bob").await.unwrap();
        assert_eq!(second.result(), CheckResult::Duplicate);
        assert_eq!(second.record().id, first.record().id);
        assert_eq!(second.record().added_by, "alice");

        assert_eq!(count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_checks_are_logged() {
        let db = connect_to_test_db().await;
        users::create(&db, "alice").await.unwrap();

        check_and_register(&db, "10.1.1.1", "alice").await.unwrap();
        check_and_register(&db, "10.1.1.1", "alice").await.unwrap();

        let entries = AccessLog::Entity::find().all(&db).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries
                .iter()
                .filter(|e| e.result == CheckResult::Fresh)
                .count(),
            1
        );
        assert_eq!(
            entries
                .iter()
                .filter(|e| e.result == CheckResult::Duplicate)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_check_rejects_invalid_address_and_unknown_user() {
        let db = connect_to_test_db().await;
        users::create(&db, "alice").await.unwrap();

        assert!(matches!(
            check_and_register(&db, "300.1.1.1", "alice").await,
            Err(IpSentinelError::InvalidAddress(_))
        ));
        assert!(matches!(
            check_and_register(&db, "1.1.1.1", "mallory").await,
            Err(IpSentinelError::UnknownUser(ref name)) if name == "mallory"
        ));
        assert!(matches!(
            check_and_register(&db, "1.1.1.1", "  ").await,
            Err(IpSentinelError::EmptyUsername)
        ));

        assert_eq!(count(&db).await.unwrap(), 0);
        assert!(AccessLog::Entity::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registration_rolls_back_without_log_entry() {
        let db = connect_to_test_db().await;
        users::create(&db, "alice").await.unwrap();
        db.execute_unprepared("DROP TABLE access_log").await.unwrap();

        assert!(check_and_register(&db, "10.2.2.2", "alice").await.is_err());
        assert_eq!(count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_inside_transaction() {
        let db = connect_to_test_db().await;
        add(&db, "10.3.3.3", "admin").await.unwrap();

        let txn = db.begin().await.unwrap();
        let outcome = insert(&txn, "10.3.3.3".parse().unwrap(), "bob")
            .await
            .unwrap();
        assert_eq!(outcome.result(), CheckResult::Duplicate);
        let fresh = insert(&txn, "10.3.3.4".parse().unwrap(), "bob")
            .await
            .unwrap();
        assert_eq!(fresh.result(), CheckResult::Fresh);
        txn.commit().await.unwrap();

        assert_eq!(count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_admin_add_reports_duplicates() {
        let db = connect_to_test_db().await;

        let record = add(&db, "8.8.8.8", "admin").await.unwrap();
        assert_eq!(record.added_by, "admin");

        let error = add(&db, "8.8.8.8", "admin").await.unwrap_err();
        assert!(matches!(error, IpSentinelError::DuplicateAddress(ref a) if a == "8.8.8.8"));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = connect_to_test_db().await;
        let record = add(&db, "1.2.3.4", "admin").await.unwrap();

        assert!(delete(&db, record.id).await.unwrap());
        assert!(!delete(&db, record.id).await.unwrap());
        assert_eq!(count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_counts() {
        let db = connect_to_test_db().await;
        add(&db, "10.0.0.1", "admin").await.unwrap();

        let text = "10.0.0.1\r\n10.0.0.2\n\n   \n10.0.0.3\nnot-an-ip\n10.0.0.2\n999.0.0.1\n";
        let stats = import(&db, text, "admin").await.unwrap();

        assert_eq!(
            stats,
            ImportStats {
                added: 2,
                existing: 2,
                errors: 2,
            }
        );
        assert_eq!(count(&db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let db = connect_to_test_db().await;
        let seed_list = vec![
            "192.168.1.1".to_string(),
            "10.0.0.1".to_string(),
            "bogus".to_string(),
        ];

        assert_eq!(seed(&db, &seed_list, "admin").await.unwrap(), 2);
        assert_eq!(seed(&db, &seed_list, "admin").await.unwrap(), 0);
        assert_eq!(count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_query_search() {
        let db = connect_to_test_db().await;
        add(&db, "192.168.0.1", "admin").await.unwrap();
        add(&db, "10.0.0.1", "admin").await.unwrap();

        let found = list(&db, Some("192.168")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address, "192.168.0.1");

        assert_eq!(list(&db, Some("  ")).await.unwrap().len(), 2);
        assert_eq!(list(&db, None).await.unwrap().len(), 2);
        assert!(list(&db, Some("_")).await.unwrap().is_empty());
    }
}
