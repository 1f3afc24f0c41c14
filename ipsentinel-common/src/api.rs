use poem_openapi::auth::ApiKey;
use poem_openapi::SecurityScheme;
use serde::{Deserialize, Serialize};

pub static SESSION_COOKIE_NAME: &str = "ipsentinel-session";

#[derive(SecurityScheme)]
#[oai(ty = "api_key", key_name = "ipsentinel-session", key_in = "cookie")]
#[allow(dead_code)]
pub struct CookieSecurityScheme(ApiKey);

/// Attached to requests that carry a logged-in admin session.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AdminAuthorization {
    pub username: String,
}
