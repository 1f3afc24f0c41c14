use chrono::Utc;
use ipsentinel_common::IpSentinelError;
use ipsentinel_db_entities::{AccessLog, User};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::*;
use uuid::Uuid;

use crate::db::contains_literal;

pub async fn list<C: ConnectionTrait>(
    db: &C,
    search: Option<&str>,
) -> Result<Vec<User::Model>, IpSentinelError> {
    let mut users = User::Entity::find().order_by_asc(User::Column::Username);

    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        users = users.filter(contains_literal(User::Column::Username, search));
    }

    Ok(users.all(db).await?)
}

pub async fn get<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<User::Model>, IpSentinelError> {
    Ok(User::Entity::find_by_id(id).one(db).await?)
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<User::Model>, IpSentinelError> {
    let username = username.trim();
    if username.is_empty() {
        return Ok(None);
    }
    Ok(User::Entity::find()
        .filter(User::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<User::Model, IpSentinelError> {
    let username = normalize_username(username)?;

    let values = User::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.clone()),
        created_at: Set(Utc::now()),
    };

    let user = values
        .insert(db)
        .await
        .map_err(|e| map_unique_violation(e, &username))?;
    info!(username = %user.username, "User created");
    Ok(user)
}

/// Returns `None` if the user does not exist.
pub async fn rename<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    username: &str,
) -> Result<Option<User::Model>, IpSentinelError> {
    let username = normalize_username(username)?;

    let Some(user) = User::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    if user.username == username {
        return Ok(Some(user));
    }

    let old_username = user.username.clone();
    let mut model: User::ActiveModel = user.into();
    model.username = Set(username.clone());
    let user = model
        .update(db)
        .await
        .map_err(|e| map_unique_violation(e, &username))?;
    info!(%old_username, username = %user.username, "User renamed");
    Ok(Some(user))
}

/// Deletes the user together with their access log entries.
/// Returns `false` if the user does not exist.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, IpSentinelError> {
    let txn = db.begin().await?;

    let Some(user) = User::Entity::find_by_id(id).one(&txn).await? else {
        return Ok(false);
    };

    let removed = AccessLog::Entity::delete_many()
        .filter(AccessLog::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?
        .rows_affected;

    let username = user.username.clone();
    user.delete(&txn).await?;
    txn.commit().await?;

    info!(%username, access_log_entries = removed, "User deleted");
    Ok(true)
}

fn normalize_username(username: &str) -> Result<String, IpSentinelError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(IpSentinelError::EmptyUsername);
    }
    Ok(username.to_owned())
}

fn map_unique_violation(error: sea_orm::DbErr, username: &str) -> IpSentinelError {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            IpSentinelError::UsernameTaken(username.to_owned())
        }
        _ => error.into(),
    }
}
