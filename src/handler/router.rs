//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! route prefix matching, title extraction and dispatching to post handlers.

use crate::config::AppState;
use crate::handler::posts;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

pub const ROUTE_PREFIX_VIEW: &str = "/view/";
pub const ROUTE_PREFIX_EDIT: &str = "/edit/";
pub const ROUTE_PREFIX_SAVE: &str = "/save/";
pub const ROUTE_PREFIX_OOPS: &str = "/oops/";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Post operation selected by a route prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    View,
    Edit,
    Save,
    Oops,
}

/// Registered prefixes, matched in order. None of them overlaps another.
const ROUTES: [(&str, Route); 4] = [
    (ROUTE_PREFIX_VIEW, Route::View),
    (ROUTE_PREFIX_EDIT, Route::Edit),
    (ROUTE_PREFIX_SAVE, Route::Save),
    (ROUTE_PREFIX_OOPS, Route::Oops),
];

/// Find the first registered prefix of `path`
///
/// Returns the route and the raw (still percent-encoded) remainder.
pub fn match_route(path: &str) -> Option<(Route, &str)> {
    ROUTES
        .iter()
        .find_map(|&(prefix, route)| path.strip_prefix(prefix).map(|rest| (route, rest)))
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut entry = AccessLogEntry::from_request(&req, remote_addr);
    let is_head = *req.method() == Method::HEAD;

    let mut response = route_request(req, &state).await;

    if let Ok(name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, name);
    }

    let size = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);

    if is_head {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(size));
        *response.body_mut() = Full::new(Bytes::new());
    }

    if state.config.logging.access_log {
        entry.finish(response.status().as_u16(), if is_head { 0 } else { size });
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Check HTTP method and return 405 for anything the wiki does not serve
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD | Method::POST => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(parts: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = parts.headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Route request to the post handler selected by its path prefix
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&parts.method) {
        return resp;
    }

    // 2. Check declared body size
    if let Some(resp) = check_body_size(&parts, state.config.http.max_body_size) {
        return resp;
    }

    // 3. Match route prefix
    let Some((route, raw_title)) = match_route(parts.uri.path()) else {
        logger::log_debug(&format!("No route for {}", parts.uri.path()));
        return http::build_404_response();
    };

    // 4. Decode title
    let Some(title) = http::decode_path(raw_title) else {
        return http::build_400_response("post title is not valid UTF-8");
    };

    // 5. Dispatch
    match route {
        Route::View => posts::view_post(state, &title).await,
        Route::Edit => posts::edit_post(state, &title).await,
        Route::Save => {
            if parts.method != Method::POST {
                logger::log_warning(&format!(
                    "Refusing {} on {}",
                    parts.method,
                    parts.uri.path()
                ));
                return http::build_405_response_allowing("POST");
            }
            let content = match read_form_body(&parts, body, state.config.http.max_body_size).await
            {
                Ok(content) => content,
                Err(resp) => return resp,
            };
            let post_body = content
                .as_deref()
                .and_then(|form| http::form_value(form, "body"))
                .or_else(|| parts.uri.query().and_then(|q| http::form_value(q, "body")))
                .unwrap_or_default();
            posts::save_post(state, &title, post_body).await
        }
        Route::Oops => posts::server_error_page(state),
    }
}

/// Read a urlencoded request body, `None` for other content types
async fn read_form_body<B>(
    parts: &Parts,
    body: B,
    max_body_size: u64,
) -> Result<Option<String>, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let is_form = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with(FORM_CONTENT_TYPE));
    if !is_form {
        return Ok(None);
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
            return Err(http::build_413_response());
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            return Err(http::build_400_response("could not read request body"));
        }
    };

    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|_| http::build_400_response("form body is not valid UTF-8"))
}
