//! HTTP response handlers and the processing gate.
//!
//! Only successful HTML responses go through the processor; everything else
//! is served byte-for-byte. Responses are built with `Response::from_data`,
//! so the Content-Length header always reflects the final body length.

use anyhow::{Context, Result};
use regex::Regex;
use std::{fs, path::Path, sync::LazyLock};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::config::Config;
use crate::log;
use crate::tidy::TidyProcessor;
use crate::utils::mime;

/// URL suffixes that are never HTML; matching requests bypass the processor
/// without even looking at the content type.
static STATIC_ASSET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\.(bmp|css|csv|doc|docx|eot|flv|gif|gz|ico|jpeg|jpg|js|mp[34]|pdf|png|rtf|svg|swf|tif{1,2}|ttf|txt|webp|woff|woff2|xls|xlsx|xml|zip)$",
    )
    .expect("static asset pattern")
});

/// Respond with a static file, processed when the gate allows it.
pub fn respond_file(
    request: Request,
    path: &Path,
    config: &Config,
    processor: &TidyProcessor,
) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = if should_process(request.url(), content_type, body.len(), config, processor) {
        processor.process(&body)
    } else {
        body
    };

    send_body(request, 200, content_type, body)
}

/// The processing gate: asset-suffixed URLs, non-HTML content types and
/// oversized bodies pass through untouched.
fn should_process(
    url: &str,
    content_type: &str,
    body_len: usize,
    config: &Config,
    processor: &TidyProcessor,
) -> bool {
    if processor.is_noop() {
        return false;
    }
    let url_path = url.split('?').next().unwrap_or(url);
    if STATIC_ASSET_PATTERN.is_match(url_path) {
        return false;
    }
    if !mime::is_html(content_type) {
        return false;
    }
    if body_len > config.serve.max_body_len {
        log!("serve"; "{}: {} bytes exceeds processing limit, serving untouched", url, body_len);
        return false;
    }
    true
}

/// Respond with 404 (custom page when present, never processed).
pub fn respond_not_found(request: Request, config: &Config) -> Result<()> {
    use crate::utils::mime::types::{HTML, PLAIN};

    let custom_404 = config.serve.root.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let mime = if has_custom { HTML } else { PLAIN };
        return send_head(request, 404, mime);
    }

    if has_custom && let Ok(body) = fs::read(&custom_404) {
        return send_body(request, 404, HTML, body);
    }

    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
