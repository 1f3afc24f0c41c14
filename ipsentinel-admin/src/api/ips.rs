use std::sync::Arc;

use ipsentinel_common::api::{AdminAuthorization, CookieSecurityScheme};
use ipsentinel_common::IpSentinelError;
use ipsentinel_core::registry::{self, ImportStats};
use ipsentinel_db_entities::IpRecord;
use poem::web::Data;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::{Json, PlainText};
use poem_openapi::{ApiResponse, Object, OpenApi};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::pagination::{PaginatedResponse, PaginationParams};

pub struct ListApi;

#[derive(ApiResponse)]
enum GetIpRecordsResponse {
    #[oai(status = 200)]
    Ok(Json<PaginatedResponse<IpRecord::Model>>),
}

#[derive(Object)]
struct AddIpRecordRequest {
    address: String,
}

#[derive(ApiResponse)]
enum AddIpRecordResponse {
    #[oai(status = 201)]
    Created(Json<IpRecord::Model>),

    #[oai(status = 400)]
    BadRequest(Json<String>),

    #[oai(status = 409)]
    Conflict(Json<String>),
}

#[OpenApi]
impl ListApi {
    #[oai(path = "/ips", method = "get", operation_id = "get_ip_records")]
    async fn api_get_all_ip_records(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        offset: Query<Option<u64>>,
        limit: Query<Option<u64>>,
        search: Query<Option<String>>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<GetIpRecordsResponse, IpSentinelError> {
        let db = db.lock().await;

        let query = registry::query(search.as_deref());

        Ok(GetIpRecordsResponse::Ok(Json(
            PaginatedResponse::new(
                query,
                PaginationParams {
                    offset: *offset,
                    limit: *limit,
                },
                &*db,
                Into::into,
            )
            .await?,
        )))
    }

    #[oai(path = "/ips", method = "post", operation_id = "add_ip_record")]
    async fn api_add_ip_record(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        auth: Data<&AdminAuthorization>,
        body: Json<AddIpRecordRequest>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<AddIpRecordResponse, IpSentinelError> {
        let db = db.lock().await;

        match registry::add(&*db, &body.address, &auth.username).await {
            Ok(record) => Ok(AddIpRecordResponse::Created(Json(record))),
            Err(error @ IpSentinelError::InvalidAddress(_)) => {
                Ok(AddIpRecordResponse::BadRequest(Json(error.to_string())))
            }
            Err(error @ IpSentinelError::DuplicateAddress(_)) => {
                Ok(AddIpRecordResponse::Conflict(Json(error.to_string())))
            }
            Err(error) => Err(error),
        }
    }
}

pub struct DetailApi;

#[derive(ApiResponse)]
enum DeleteIpRecordResponse {
    #[oai(status = 204)]
    Deleted,

    #[oai(status = 404)]
    NotFound,
}

#[OpenApi]
impl DetailApi {
    #[oai(path = "/ips/:id", method = "delete", operation_id = "delete_ip_record")]
    async fn api_delete_ip_record(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        id: Path<Uuid>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<DeleteIpRecordResponse, IpSentinelError> {
        let db = db.lock().await;

        if registry::delete(&*db, id.0).await? {
            Ok(DeleteIpRecordResponse::Deleted)
        } else {
            Ok(DeleteIpRecordResponse::NotFound)
        }
    }
}

pub struct ImportApi;

#[derive(Object)]
struct ImportResult {
    added: u64,
    existing: u64,
    errors: u64,
}

impl From<ImportStats> for ImportResult {
    fn from(stats: ImportStats) -> Self {
        Self {
            added: stats.added,
            existing: stats.existing,
            errors: stats.errors,
        }
    }
}

#[derive(ApiResponse)]
enum ImportIpRecordsResponse {
    #[oai(status = 200)]
    Ok(Json<ImportResult>),
}

#[OpenApi]
impl ImportApi {
    /// Registers one address per line of the request body.
    #[oai(path = "/ips/import", method = "post", operation_id = "import_ip_records")]
    async fn api_import_ip_records(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        auth: Data<&AdminAuthorization>,
        body: PlainText<String>,
        _sec_scheme: CookieSecurityScheme,
    ) -> Result<ImportIpRecordsResponse, IpSentinelError> {
        let db = db.lock().await;

        let stats = registry::import(&*db, &body.0, &auth.username).await?;
        Ok(ImportIpRecordsResponse::Ok(Json(stats.into())))
    }
}
