use std::marker::PhantomData;

use poem::http::{header, Method, StatusCode};
use poem::{Endpoint, Request, Response};
use rust_embed::RustEmbed;

pub struct EmbeddedFileEndpoint<E: RustEmbed + Send + Sync> {
    _embed: PhantomData<E>,
    path: String,
}

impl<E: RustEmbed + Send + Sync> EmbeddedFileEndpoint<E> {
    pub fn new(path: &str) -> Self {
        EmbeddedFileEndpoint {
            _embed: PhantomData,
            path: path.to_owned(),
        }
    }
}

impl<E: RustEmbed + Send + Sync> Endpoint for EmbeddedFileEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Err(StatusCode::METHOD_NOT_ALLOWED.into());
        }

        let Some(content) = E::get(&self.path) else {
            return Err(StatusCode::NOT_FOUND.into());
        };

        let hash = hex::encode(content.metadata.sha256_hash());
        if req
            .headers()
            .get(header::IF_NONE_MATCH)
            .map(|etag| etag.to_str().unwrap_or("000000").eq(&hash))
            .unwrap_or(false)
        {
            return Ok(Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .finish());
        }

        let body: Vec<u8> = content.data.into();
        let mime = mime_guess::from_path(&self.path).first_or_octet_stream();
        Ok(Response::builder()
            .header(header::CONTENT_TYPE, mime.as_ref())
            .header(header::ETAG, hash)
            .body(body))
    }
}

/// Serves every embedded file under the path it was mounted at.
pub struct EmbeddedFilesEndpoint<E: RustEmbed + Send + Sync> {
    _embed: PhantomData<E>,
}

impl<E: RustEmbed + Send + Sync> EmbeddedFilesEndpoint<E> {
    pub fn new() -> Self {
        EmbeddedFilesEndpoint {
            _embed: PhantomData,
        }
    }
}

impl<E: RustEmbed + Send + Sync> Endpoint for EmbeddedFilesEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let path = req
            .uri()
            .path()
            .trim_start_matches('/')
            .trim_end_matches('/')
            .to_string();
        if path.is_empty() || path.split('/').any(|segment| segment == "..") {
            return Err(StatusCode::NOT_FOUND.into());
        }
        EmbeddedFileEndpoint::<E>::new(&path).call(req).await
    }
}
