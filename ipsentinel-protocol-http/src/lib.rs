pub mod api;
mod common;
mod embed;
mod logging;

use anyhow::{Context, Result};
use embed::{EmbeddedFileEndpoint, EmbeddedFilesEndpoint};
use ipsentinel_admin::admin_api_app;
use ipsentinel_common::api::SESSION_COOKIE_NAME;
use ipsentinel_common::version::ipsentinel_version;
use ipsentinel_core::Services;
use ipsentinel_web::Assets;
use poem::listener::TcpListener;
use poem::session::{CookieConfig, MemoryStorage, ServerSession};
use poem::{Endpoint, EndpointExt, IntoEndpoint, Route, Server};
use poem_openapi::OpenApiService;
use tracing::*;

pub struct HttpProtocolServer {
    services: Services,
}

impl HttpProtocolServer {
    pub fn new(services: &Services) -> Self {
        HttpProtocolServer {
            services: services.clone(),
        }
    }

    pub async fn run(self) -> Result<()> {
        let address = self.services.config.lock().await.store.http.listen.clone();
        let app = build_app(&self.services).await;

        info!(%address, "Listening");
        Server::new(TcpListener::bind(*address))
            .run(app)
            .await
            .context("Failed to start HTTP server")
    }
}

pub fn public_api_app() -> OpenApiService<impl poem_openapi::OpenApi, ()> {
    OpenApiService::new(api::get(), "IP Sentinel", ipsentinel_version()).server("/api")
}

/// The full application: UI assets, the public API and the admin API.
pub async fn build_app(services: &Services) -> impl Endpoint + 'static {
    let session_max_age = services.config.lock().await.store.http.session_max_age;

    let api_service = public_api_app();
    let spec = api_service.spec_endpoint();

    Route::new()
        .nest("/api/admin", common::endpoint_admin_auth(admin_api_app().into_endpoint()))
        .nest("/api", api_service)
        .at("/openapi.json", spec)
        .at("/", EmbeddedFileEndpoint::<Assets>::new("index.html"))
        .nest("/assets", EmbeddedFilesEndpoint::<Assets>::new())
        .around(common::inject_request_authorization)
        .with(ServerSession::new(
            CookieConfig::default()
                .name(SESSION_COOKIE_NAME)
                .http_only(true)
                .secure(false)
                .max_age(session_max_age),
            MemoryStorage::new(),
        ))
        .around(logging::log_request)
        .data(services.db.clone())
        .data(services.config.clone())
        .data(services.clone())
}

#[cfg(test)]
mod tests {
    use ipsentinel_common::{IpSentinelConfig, IpSentinelConfigStore};
    use poem::http::StatusCode;
    use poem::test::TestClient;
    use serde_json::json;

    use super::*;

    async fn test_services(dir: &tempfile::TempDir) -> Services {
        let config = IpSentinelConfig {
            store: IpSentinelConfigStore::default(),
            paths_relative_to: dir.path().to_path_buf(),
        };
        Services::new(config).await.unwrap()
    }

    fn session_cookie(resp: &poem::test::TestResponse) -> String {
        resp.0
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(SESSION_COOKIE_NAME))
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string()
    }

    async fn login(cli: &TestClient<impl Endpoint>) -> String {
        let resp = cli
            .post("/api/auth/login")
            .body_json(&json!({"username": "admin", "password": "admin"}))
            .send()
            .await;
        resp.assert_status(StatusCode::CREATED);
        session_cookie(&resp)
    }

    #[tokio::test]
    async fn test_check_registers_then_detects_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        ipsentinel_core::users::create(&*services.db.lock().await, "alice")
            .await
            .unwrap();
        let cli = TestClient::new(build_app(&services).await);

        let resp = cli
            .post("/api/check")
            .body_json(&json!({"address": "192.168.1.20", "username": "alice"}))
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        body.value().object().get("status").assert_string("fresh");

        let resp = cli
            .post("/api/check")
            .body_json(&json!({"address": "192.168.1.20", "username": "alice"}))
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        body.value().object().get("status").assert_string("duplicate");
        body.value()
            .object()
            .get("record")
            .object()
            .get("added_by")
            .assert_string("alice");
    }

    #[tokio::test]
    async fn test_check_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        ipsentinel_core::users::create(&*services.db.lock().await, "alice")
            .await
            .unwrap();
        let cli = TestClient::new(build_app(&services).await);

        cli.post("/api/check")
            .body_json(&json!({"address": "256.1.1.1", "username": "alice"}))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        cli.post("/api/check")
            .body_json(&json!({"address": "10.0.0.1", "username": "nobody"}))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_api_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        let cli = TestClient::new(build_app(&services).await);

        cli.get("/api/admin/ips")
            .send()
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        cli.post("/api/auth/login")
            .body_json(&json!({"username": "admin", "password": "wrong"}))
            .send()
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let cookie = login(&cli).await;
        cli.get("/api/admin/ips")
            .header("cookie", &cookie)
            .send()
            .await
            .assert_status_is_ok();

        let resp = cli.get("/api/info").header("cookie", &cookie).send().await;
        resp.assert_status_is_ok();
        resp.json()
            .await
            .value()
            .object()
            .get("username")
            .assert_string("admin");

        cli.post("/api/auth/logout")
            .header("cookie", &cookie)
            .send()
            .await
            .assert_status(StatusCode::CREATED);
        cli.get("/api/admin/ips")
            .header("cookie", &cookie)
            .send()
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_manages_registry() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        let cli = TestClient::new(build_app(&services).await);
        let cookie = login(&cli).await;

        let resp = cli
            .post("/api/admin/ips")
            .header("cookie", &cookie)
            .body_json(&json!({"address": "8.8.4.4"}))
            .send()
            .await;
        resp.assert_status(StatusCode::CREATED);
        let id = resp
            .json()
            .await
            .value()
            .object()
            .get("id")
            .string()
            .to_string();

        cli.post("/api/admin/ips")
            .header("cookie", &cookie)
            .body_json(&json!({"address": "8.8.4.4"}))
            .send()
            .await
            .assert_status(StatusCode::CONFLICT);

        cli.post("/api/admin/ips")
            .header("cookie", &cookie)
            .body_json(&json!({"address": "8.8.4"}))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let resp = cli
            .post("/api/admin/ips/import")
            .header("cookie", &cookie)
            .content_type("text/plain")
            .body("8.8.4.4\n1.1.1.1\nnope\n")
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.assert_json(&json!({"added": 1, "existing": 1, "errors": 1}))
            .await;

        let resp = cli
            .get("/api/admin/ips")
            .header("cookie", &cookie)
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.json().await.value().object().get("total").assert_i64(2);

        cli.delete(format!("/api/admin/ips/{id}"))
            .header("cookie", &cookie)
            .send()
            .await
            .assert_status(StatusCode::NO_CONTENT);
        cli.delete(format!("/api/admin/ips/{id}"))
            .header("cookie", &cookie)
            .send()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_manages_users() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        let cli = TestClient::new(build_app(&services).await);
        let cookie = login(&cli).await;

        let resp = cli
            .post("/api/admin/users")
            .header("cookie", &cookie)
            .body_json(&json!({"username": "bob"}))
            .send()
            .await;
        resp.assert_status(StatusCode::CREATED);

        cli.post("/api/admin/users")
            .header("cookie", &cookie)
            .body_json(&json!({"username": "bob"}))
            .send()
            .await
            .assert_status(StatusCode::CONFLICT);

        cli.post("/api/admin/users")
            .header("cookie", &cookie)
            .body_json(&json!({"username": " "}))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        cli.post("/api/check")
            .body_json(&json!({"address": "9.9.9.9", "username": "bob"}))
            .send()
            .await
            .assert_status_is_ok();

        let resp = cli
            .post("/api/admin/access-log")
            .header("cookie", &cookie)
            .body_json(&json!({"username": "bob"}))
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let entries = body.value().array();
        entries.assert_len(1);
        entries.get(0).object().get("result").assert_string("fresh");
        entries.get(0).object().get("username").assert_string("bob");
    }

    #[tokio::test]
    async fn test_serves_ui() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        let cli = TestClient::new(build_app(&services).await);

        let resp = cli.get("/").send().await;
        resp.assert_status_is_ok();
        resp.assert_content_type("text/html");

        cli.get("/assets/app.js").send().await.assert_status_is_ok();
        cli.get("/assets/missing.js")
            .send()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_openapi_document() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        let cli = TestClient::new(build_app(&services).await);

        let resp = cli.get("/openapi.json").send().await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        body.value()
            .object()
            .get("info")
            .object()
            .get("title")
            .assert_string("IP Sentinel");
        body.value()
            .object()
            .get("paths")
            .object()
            .get("/check")
            .object()
            .get("post")
            .object()
            .get("operationId")
            .assert_string("check_address");
    }

    #[tokio::test]
    async fn test_check_reports_unavailable_backend() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir).await;
        let cli = TestClient::new(build_app(&services).await);

        services.db.lock().await.close_by_ref().await.unwrap();

        let resp = cli
            .post("/api/check")
            .body_json(&json!({"address": "10.0.0.7", "username": "alice"}))
            .send()
            .await;
        resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        resp.assert_text("registry backend unavailable").await;
    }
}
