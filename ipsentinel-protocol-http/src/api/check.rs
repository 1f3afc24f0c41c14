use std::sync::Arc;

use ipsentinel_common::IpSentinelError;
use ipsentinel_core::registry;
use ipsentinel_db_entities::AccessLog::CheckResult;
use ipsentinel_db_entities::IpRecord;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

pub struct Api;

#[derive(Object)]
struct CheckRequest {
    address: String,
    /// Name of the user the check is attributed to
    username: String,
}

#[derive(Object)]
struct CheckReport {
    status: CheckResult,
    record: IpRecord::Model,
}

#[derive(ApiResponse)]
enum CheckResponse {
    #[oai(status = 200)]
    Ok(Json<CheckReport>),

    #[oai(status = 400)]
    BadRequest(Json<String>),
}

#[OpenApi]
impl Api {
    /// Looks the address up and registers it if it has not been seen before.
    #[oai(path = "/check", method = "post", operation_id = "check_address")]
    async fn api_check_address(
        &self,
        db: Data<&Arc<Mutex<DatabaseConnection>>>,
        body: Json<CheckRequest>,
    ) -> Result<CheckResponse, IpSentinelError> {
        let db = db.lock().await;

        match registry::check_and_register(&*db, &body.address, &body.username).await {
            Ok(outcome) => Ok(CheckResponse::Ok(Json(CheckReport {
                status: outcome.result(),
                record: outcome.into_record(),
            }))),
            Err(
                error @ (IpSentinelError::InvalidAddress(_)
                | IpSentinelError::UnknownUser(_)
                | IpSentinelError::EmptyUsername),
            ) => Ok(CheckResponse::BadRequest(Json(error.to_string()))),
            Err(error) => Err(error),
        }
    }
}
