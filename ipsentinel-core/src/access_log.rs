use std::time::Duration;

use chrono::{DateTime, Utc};
use ipsentinel_common::IpSentinelError;
use ipsentinel_db_entities::AccessLog::CheckResult;
use ipsentinel_db_entities::{AccessLog, User};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::db::contains_literal;

pub const DEFAULT_QUERY_LIMIT: u64 = 100;

#[derive(Debug, Clone, Default)]
pub struct AccessLogFilter {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub username: Option<String>,
    pub address: Option<String>,
    pub result: Option<CheckResult>,
    pub limit: Option<u64>,
}

/// An access log entry joined with the user it is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogItem {
    pub entry: AccessLog::Model,
    pub username: Option<String>,
}

pub async fn record<C: ConnectionTrait>(
    db: &C,
    user: &User::Model,
    address: &str,
    result: CheckResult,
) -> Result<AccessLog::Model, IpSentinelError> {
    let values = AccessLog::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        address: Set(address.to_owned()),
        result: Set(result),
        timestamp: Set(Utc::now()),
    };
    Ok(values.insert(db).await?)
}

/// Newest entries first.
pub async fn query<C: ConnectionTrait>(
    db: &C,
    filter: &AccessLogFilter,
) -> Result<Vec<AccessLogItem>, IpSentinelError> {
    let mut q = AccessLog::Entity::find()
        .find_also_related(User::Entity)
        .order_by_desc(AccessLog::Column::Timestamp)
        .limit(filter.limit.unwrap_or(DEFAULT_QUERY_LIMIT));

    if let Some(before) = filter.before {
        q = q.filter(AccessLog::Column::Timestamp.lt(before));
    }
    if let Some(after) = filter.after {
        q = q.filter(AccessLog::Column::Timestamp.gt(after));
    }
    if let Some(ref username) = filter.username {
        q = q.filter(User::Column::Username.eq(username.trim()));
    }
    if let Some(ref address) = filter.address {
        q = q.filter(contains_literal(AccessLog::Column::Address, address.trim()));
    }
    if let Some(result) = filter.result {
        q = q.filter(AccessLog::Column::Result.eq(result));
    }

    Ok(q.all(db)
        .await?
        .into_iter()
        .map(|(entry, user)| AccessLogItem {
            entry,
            username: user.map(|u| u.username),
        })
        .collect())
}

/// Deletes entries older than `retention`. Returns the number removed.
pub async fn cleanup<C: ConnectionTrait>(
    db: &C,
    retention: &Duration,
) -> Result<u64, IpSentinelError> {
    let retention = chrono::Duration::from_std(*retention).map_err(IpSentinelError::other)?;
    let cutoff = Utc::now() - retention;
    let result = AccessLog::Entity::delete_many()
        .filter(AccessLog::Column::Timestamp.lt(cutoff))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
