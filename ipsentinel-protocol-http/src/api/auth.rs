use ipsentinel_common::api::AdminAuthorization;
use ipsentinel_core::Services;
use poem::session::Session;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use tracing::*;

use crate::common::SessionExt;

pub struct Api;

#[derive(Object)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(ApiResponse)]
enum LoginResponse {
    #[oai(status = 201)]
    Success,

    #[oai(status = 401)]
    Failure,
}

#[derive(ApiResponse)]
enum LogoutResponse {
    #[oai(status = 201)]
    Success,
}

#[OpenApi]
impl Api {
    #[oai(path = "/auth/login", method = "post", operation_id = "login")]
    async fn api_auth_login(
        &self,
        session: &Session,
        services: Data<&Services>,
        body: Json<LoginRequest>,
    ) -> poem::Result<LoginResponse> {
        let accepted = {
            let config = services.config.lock().await;
            config.store.admin.accepts(&body.username, &body.password)
        };

        if !accepted {
            warn!(username = %body.username, "Admin login rejected");
            return Ok(LoginResponse::Failure);
        }

        info!(username = %body.username, "Admin logged in");
        session.set_auth(AdminAuthorization {
            username: body.username.clone(),
        });
        Ok(LoginResponse::Success)
    }

    #[oai(path = "/auth/logout", method = "post", operation_id = "logout")]
    async fn api_auth_logout(&self, session: &Session) -> poem::Result<LogoutResponse> {
        if let Some(username) = session.get_username() {
            info!(%username, "Admin logged out");
        }
        session.purge();
        Ok(LogoutResponse::Success)
    }
}
