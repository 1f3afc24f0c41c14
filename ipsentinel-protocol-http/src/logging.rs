use std::sync::Arc;

use ipsentinel_core::Services;
use poem::http::{Method, StatusCode, Uri};
use poem::web::Data;
use poem::{Endpoint, FromRequest, IntoResponse, Request, Response};
use tracing::*;

pub async fn get_client_ip(req: &Request, services: Option<&Services>) -> Option<String> {
    let trust_x_forwarded_headers = if let Some(services) = services {
        let config = services.config.lock().await;
        config.store.http.trust_x_forwarded_headers
    } else {
        false
    };

    let remote_ip = req.remote_addr().as_socket_addr().map(|x| x.ip().to_string());

    if trust_x_forwarded_headers {
        req.header("x-forwarded-for")
            .map(|x| x.to_string())
            .or(remote_ip)
    } else {
        remote_ip
    }
}

pub fn log_request_result(
    method: &Method,
    url: &Uri,
    client_ip: Option<&str>,
    status: &StatusCode,
) {
    let client_ip = client_ip.unwrap_or("<unknown>");
    if status.is_server_error() || status.is_client_error() {
        warn!(%method, %url, %status, %client_ip, "Request failed");
    } else {
        info!(%method, %url, %status, %client_ip, "Request");
    }
}

pub fn log_request_error(
    method: &Method,
    url: &Uri,
    client_ip: Option<&str>,
    error: &poem::Error,
) {
    let client_ip = client_ip.unwrap_or("<unknown>");
    let status = error.status();
    if status.is_server_error() {
        error!(%method, %url, %status, %error, %client_ip, "Request failed");
    } else {
        log_request_result(method, url, Some(client_ip), &status);
    }
}

pub(crate) async fn log_request<E: Endpoint + 'static>(
    ep: Arc<E>,
    req: Request,
) -> poem::Result<Response> {
    let services = Data::<&Services>::from_request_without_body(&req).await.ok();
    let client_ip = get_client_ip(&req, services.as_deref().copied()).await;
    let method = req.method().clone();
    let url = req.original_uri().clone();

    let span = match client_ip {
        Some(ref client_ip) => info_span!("HTTP", %client_ip),
        None => info_span!("HTTP"),
    };

    async {
        let response = ep
            .call(req)
            .await
            .map(IntoResponse::into_response)
            .inspect_err(|e| log_request_error(&method, &url, client_ip.as_deref(), e))?;

        log_request_result(&method, &url, client_ip.as_deref(), &response.status());
        Ok(response)
    }
    .instrument(span)
    .await
}
