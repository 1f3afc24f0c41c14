use poem_openapi::OpenApi;

pub mod access_log;
pub mod ips;
mod pagination;
pub mod users;

pub fn get() -> impl OpenApi {
    (
        ips::ListApi,
        ips::DetailApi,
        ips::ImportApi,
        users::ListApi,
        users::DetailApi,
        access_log::Api,
    )
}
