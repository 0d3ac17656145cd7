//! Embedded static client
//!
//! In development, falls back to serving from the filesystem.

use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::PathBuf;

const UI_DIR: &str = "ui/dist";

#[derive(Embed)]
#[folder = "ui/dist"]
struct Assets;

/// Catch-all: serve the named asset if it exists, else the SPA shell
pub async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if !path.is_empty() {
        if let Some(bytes) = load_asset(path) {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            return ([(header::CONTENT_TYPE, mime.as_ref().to_string())], Body::from(bytes))
                .into_response();
        }
    }

    serve_index()
}

fn serve_index() -> Response {
    match load_asset("index.html").and_then(|bytes| String::from_utf8(bytes).ok()) {
        Some(html) => Html(html).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found under ui/dist</h1>".to_string()),
        )
            .into_response(),
    }
}

/// Embedded bytes first, then the filesystem copy
fn load_asset(path: &str) -> Option<Vec<u8>> {
    if let Some(content) = Assets::get(path) {
        return Some(content.data.into_owned());
    }

    // Never leave the UI directory
    if path.split('/').any(|part| part == "..") {
        return None;
    }
    let fs_path = PathBuf::from(UI_DIR).join(path);
    if fs_path.is_file() {
        std::fs::read(&fs_path).ok()
    } else {
        None
    }
}
