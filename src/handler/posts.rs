//! Post handlers
//!
//! One handler per route prefix. Each owns its `Post` for the duration of the
//! request, calls into the store, then renders a view or redirects.

use crate::config::AppState;
use crate::handler::router::{ROUTE_PREFIX_EDIT, ROUTE_PREFIX_VIEW};
use crate::http;
use crate::logger;
use crate::store::{Post, StoreError};
use crate::views::{self, PostView};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde::Serialize;

pub const VIEW_MISSING_TITLE: &str = "Please enter a post title, e.g. /view/hello";
pub const EDIT_MISSING_TITLE: &str = "Error: missing post title";
pub const SAVE_MISSING_TITLE: &str = "Failed to save post: missing title";

/// `GET /view/<title>`
///
/// Missing posts redirect to the edit page so they can be created.
pub async fn view_post(state: &AppState, title: &str) -> Response<Full<Bytes>> {
    if title.is_empty() {
        return http::build_text_response(VIEW_MISSING_TITLE);
    }

    match state.store.load(title).await {
        Ok(post) => render(state, views::VIEW_POST, &PostView::from(&post)),
        Err(StoreError::InvalidTitle(_)) => invalid_title(title),
        Err(e) => {
            if !e.is_not_found() {
                logger::log_warning(&format!("Treating unreadable post as missing: {e}"));
            }
            http::build_redirect_response(&post_url(ROUTE_PREFIX_EDIT, title))
        }
    }
}

/// `GET /edit/<title>`
///
/// Missing posts are edited as if they were blank.
pub async fn edit_post(state: &AppState, title: &str) -> Response<Full<Bytes>> {
    if title.is_empty() {
        return http::build_text_response(EDIT_MISSING_TITLE);
    }

    let post = match state.store.load(title).await {
        Ok(post) => post,
        Err(StoreError::InvalidTitle(_)) => return invalid_title(title),
        Err(_) => Post::blank(title),
    };

    render(state, views::EDIT_POST, &PostView::from(&post))
}

/// `POST /save/<title>` with the new content in the `body` form field
pub async fn save_post(state: &AppState, title: &str, body: String) -> Response<Full<Bytes>> {
    if title.is_empty() {
        return http::build_text_response(SAVE_MISSING_TITLE);
    }

    let post = Post::new(title, body);
    match state.store.save(&post).await {
        Ok(()) => http::build_redirect_response(&post_url(ROUTE_PREFIX_VIEW, title)),
        Err(StoreError::InvalidTitle(_)) => invalid_title(title),
        Err(e) => http::build_500_response(&e.to_string()),
    }
}

/// `/oops/`: the server error page, on demand
pub fn server_error_page(state: &AppState) -> Response<Full<Bytes>> {
    render(state, views::SERVER_ERROR, &())
}

fn render<T: Serialize>(state: &AppState, view: &str, data: &T) -> Response<Full<Bytes>> {
    match state.views.render(view, data) {
        Ok(html) => http::build_html_response(200, html),
        Err(e) => {
            logger::log_error(&format!("Failed to render {view}: {e}"));
            http::build_500_response(&e.to_string())
        }
    }
}

fn invalid_title(title: &str) -> Response<Full<Bytes>> {
    logger::log_warning(&format!("Rejected post title {title:?}"));
    http::build_400_response(&format!("invalid post title '{title}'"))
}

fn post_url(prefix: &str, title: &str) -> String {
    format!("{prefix}{}", urlencoding::encode(title))
}
