use std::sync::Arc;

use ipsentinel_common::api::AdminAuthorization;
use ipsentinel_core::Services;
use poem::http::StatusCode;
use poem::session::Session;
use poem::web::Data;
use poem::{Endpoint, EndpointExt, FromRequest, IntoResponse, Request};

static AUTH_SESSION_KEY: &str = "auth";

pub trait SessionExt {
    fn get_auth(&self) -> Option<AdminAuthorization>;
    fn set_auth(&self, auth: AdminAuthorization);
    fn get_username(&self) -> Option<String>;
}

impl SessionExt for Session {
    fn get_auth(&self) -> Option<AdminAuthorization> {
        self.get(AUTH_SESSION_KEY)
    }

    fn set_auth(&self, auth: AdminAuthorization) {
        self.set(AUTH_SESSION_KEY, auth);
    }

    fn get_username(&self) -> Option<String> {
        self.get_auth().map(|x| x.username)
    }
}

/// A session only counts while its username still matches the configured
/// admin, so renaming the admin in the config file logs existing sessions out.
pub async fn is_current_admin(services: &Services, auth: &AdminAuthorization) -> bool {
    services.config.lock().await.store.admin.username == auth.username
}

pub(crate) async fn inject_request_authorization<E: Endpoint + 'static>(
    ep: Arc<E>,
    req: Request,
) -> poem::Result<E::Output> {
    let session = <&Session>::from_request_without_body(&req).await?;

    if let Some(auth) = session.get_auth() {
        // data_opt would change the return type from E::Output
        Ok(ep.data(auth).call(req).await?)
    } else {
        Ok(ep.call(req).await?)
    }
}

pub fn endpoint_admin_auth<E: Endpoint + 'static>(e: E) -> impl Endpoint {
    e.around(|ep, req| async move {
        let services = Data::<&Services>::from_request_without_body(&req).await?;
        let auth = Option::<Data<&AdminAuthorization>>::from_request_without_body(&req).await?;

        let authorized = match auth {
            Some(auth) => is_current_admin(&services, &auth).await,
            None => false,
        };
        if authorized {
            return Ok(ep.call(req).await?.into_response());
        }
        Err(poem::Error::from_status(StatusCode::UNAUTHORIZED))
    })
}
