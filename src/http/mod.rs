//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the post handlers.

pub mod form;
pub mod response;

// Re-export commonly used types
pub use form::{decode_path, form_value};
pub use response::{
    build_400_response, build_404_response, build_405_response, build_405_response_allowing,
    build_413_response, build_500_response, build_html_response, build_redirect_response, build_text_response,
};
