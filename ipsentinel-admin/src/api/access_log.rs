use std::sync::Arc;

use chrono::{DateTime, Utc};
use ipsentinel_common::api::CookieSecurityScheme;
use ipsentinel_common::IpSentinelError;
use ipsentinel_core::access_log::{self, AccessLogFilter, AccessLogItem};
use ipsentinel_db_entities::AccessLog::CheckResult;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct Api;

#[derive(Object)]
struct AccessLogEntry {
    id: Uuid,
    user_id: Uuid,
    username: Option<String>,
    address: String,
    result: CheckResult,
    timestamp: DateTime<Utc>,
}

impl From<AccessLogItem> for AccessLogEntry {
    fn from(item: AccessLogItem) -> Self {
        Self {
            id: item.entry.id,
            user_id: item.entry.user_id,
            username: item.username,
            address: item.entry.address,
            result: item.entry.result,
            timestamp: item.entry.timestamp,
        }
    }
}

#[derive(ApiResponse)]
enum GetAccessLogResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<AccessLogEntry>>),
}

#[derive(Object)]
struct GetAccessLogRequest {
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
    limit: Option<u64>,
    username: Option<String>,
    address: Option<String>,
    result: Option<CheckResult>,
}

#[OpenApi]
impl Api {
    #[oai(path = "/access-log", method = "post", operation_id = "get_access_log")]
    async fn api_get_access_log(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        body: Json<GetAccessLogRequest>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<GetAccessLogResponse, IpSentinelError> {
        let db = db.lock().await;

        let body = body.0;
        let filter = AccessLogFilter {
            before: body.before,
            after: body.after,
            username: body.username,
            address: body.address,
            result: body.result,
            limit: body.limit,
        };

        let entries = access_log::query(&*db, &filter).await?;
        Ok(GetAccessLogResponse::Ok(Json(
            entries.into_iter().map(Into::into).collect(),
        )))
    }
}
