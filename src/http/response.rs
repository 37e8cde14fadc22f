//! HTTP response building module
//!
//! Provides builders for the status codes the wiki answers with, decoupled
//! from the post handlers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Methods the server accepts at all
pub const ALLOWED_METHODS: &str = "GET, HEAD, POST";

fn build_text_response_with_status(status: u16, message: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message)))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 plain text response (instructional messages)
pub fn build_text_response(message: &str) -> Response<Full<Bytes>> {
    build_text_response_with_status(200, message.to_string())
}

/// Build generic HTML response
pub fn build_html_response(status: u16, content: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(302)
        .header("Location", target)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("Redirecting...")))
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            Response::new(Full::new(Bytes::from("Redirecting...")))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response(message: &str) -> Response<Full<Bytes>> {
    build_text_response_with_status(400, format!("400 Bad Request: {message}"))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response_with_status(404, "404 Not Found".to_string())
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    build_405_response_allowing(ALLOWED_METHODS)
}

/// Build 405 Method Not Allowed response for a route with its own `Allow` list
pub fn build_405_response_allowing(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", allow)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response_with_status(413, "413 Payload Too Large".to_string())
}

/// Build 500 Internal Server Error response carrying `message`
pub fn build_500_response(message: &str) -> Response<Full<Bytes>> {
    build_text_response_with_status(500, message.to_string())
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
