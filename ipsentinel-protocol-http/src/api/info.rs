use ipsentinel_common::version::ipsentinel_version;
use ipsentinel_core::Services;
use poem::session::Session;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use serde::Serialize;

use crate::common::{is_current_admin, SessionExt};

pub struct Api;

#[derive(Serialize, Object)]
pub struct Info {
    version: String,
    /// Logged-in admin, if any
    username: Option<String>,
}

#[derive(ApiResponse)]
enum InstanceInfoResponse {
    #[oai(status = 200)]
    Ok(Json<Info>),
}

#[OpenApi]
impl Api {
    #[oai(path = "/info", method = "get", operation_id = "get_info")]
    async fn api_get_info(
        &self,
        session: &Session,
        services: Data<&Services>,
    ) -> poem::Result<InstanceInfoResponse> {
        let mut username = None;
        if let Some(auth) = session.get_auth() {
            if is_current_admin(&services, &auth).await {
                username = Some(auth.username);
            }
        }

        Ok(InstanceInfoResponse::Ok(Json(Info {
            version: ipsentinel_version().to_string(),
            username,
        })))
    }
}
