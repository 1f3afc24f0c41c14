pub mod api;
use ipsentinel_common::version::ipsentinel_version;
use poem_openapi::{OpenApi, OpenApiService};

pub fn admin_api_app() -> OpenApiService<impl OpenApi, ()> {
    OpenApiService::new(api::get(), "IP Sentinel admin", ipsentinel_version()).server("/api/admin")
}
