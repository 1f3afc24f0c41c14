use poem_openapi::OpenApi;

pub mod auth;
pub mod check;
pub mod info;

pub fn get() -> impl OpenApi {
    (auth::Api, check::Api, info::Api)
}
