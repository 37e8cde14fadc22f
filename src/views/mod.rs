//! View templates module
//!
//! Compiles every `*.html` file of the views directory once at startup and
//! renders them by file name. The compiled set is read-only afterwards.

use glob::{GlobError, PatternError};
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;

use crate::logger;
use crate::store::Post;

pub const VIEW_POST: &str = "view.html";
pub const EDIT_POST: &str = "edit.html";
pub const SERVER_ERROR: &str = "500.html";

/// Views the request handlers cannot work without
const REQUIRED_VIEWS: [&str; 3] = [VIEW_POST, EDIT_POST, SERVER_ERROR];

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("invalid views pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("failed to list views: {0}")]
    Glob(#[from] GlobError),
    #[error("failed to read view: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to compile view: {0}")]
    Template(#[from] Box<TemplateError>),
    #[error("failed to render view: {0}")]
    Render(#[from] RenderError),
    #[error("missing view '{0}'")]
    MissingView(String),
}

/// Template data for a post
#[derive(Debug, Serialize)]
pub struct PostView<'a> {
    pub title: &'a str,
    /// Title percent-encoded for use inside links and form actions
    pub url_title: Cow<'a, str>,
    pub body: Cow<'a, str>,
}

impl<'a> From<&'a Post> for PostView<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            title: &post.title,
            url_title: urlencoding::encode(&post.title),
            body: String::from_utf8_lossy(&post.body),
        }
    }
}

/// Compiled template set keyed by view file name
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    /// Compile every `*.html` file found directly in `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ViewError> {
        let pattern = dir.as_ref().join("*.html");
        let mut sources = Vec::new();

        for entry in glob::glob(&pattern.to_string_lossy())? {
            let path = entry?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                logger::log_warning(&format!("Skipping view with non UTF-8 name: {path:?}"));
                continue;
            };
            let source = std::fs::read_to_string(&path)?;
            logger::log_debug(&format!("Loaded view {name}"));
            sources.push((name.to_string(), source));
        }

        Self::from_sources(sources)
    }

    /// Compile views from in-memory `(name, source)` pairs
    pub fn from_sources<I, N, S>(sources: I) -> Result<Self, ViewError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut registry = Handlebars::new();
        for (name, source) in sources {
            registry
                .register_template_string(name.as_ref(), source)
                .map_err(Box::new)?;
        }

        for name in REQUIRED_VIEWS {
            if !registry.has_template(name) {
                return Err(ViewError::MissingView(name.to_string()));
            }
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, ViewError> {
        Ok(self.registry.render(name, data)?)
    }

    /// Number of compiled views
    pub fn len(&self) -> usize {
        self.registry.get_templates().len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal view set used by the handler tests
    pub(crate) fn test_views() -> Views {
        Views::from_sources([
            (VIEW_POST, "<h1>{{title}}</h1><div>{{body}}</div>"),
            (
                EDIT_POST,
                "<h1>Editing {{title}}</h1><form action=\"/save/{{url_title}}\" method=\"POST\">\
                 <textarea name=\"body\">{{body}}</textarea></form>",
            ),
            (SERVER_ERROR, "<h1>Something went wrong</h1>"),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_escapes_html() {
        let views = test_views();
        let post = Post::new("hello", "<script>alert(1)</script>");
        let html = views.render(VIEW_POST, &PostView::from(&post)).unwrap();
        assert!(html.contains("<h1>hello</h1>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_missing_required_view() {
        let result = Views::from_sources([(VIEW_POST, "{{title}}"), (EDIT_POST, "{{title}}")]);
        assert!(matches!(result, Err(ViewError::MissingView(name)) if name == SERVER_ERROR));
    }

    #[test]
    fn test_unknown_view_is_render_error() {
        let views = test_views();
        assert!(matches!(
            views.render("nope.html", &()),
            Err(ViewError::Render(_))
        ));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in REQUIRED_VIEWS {
            std::fs::write(dir.path().join(name), format!("<p>{name}</p>")).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let views = Views::load(dir.path()).unwrap();
        assert_eq!(views.len(), 3);
        assert_eq!(views.render(SERVER_ERROR, &()).unwrap(), "<p>500.html</p>");
    }

    #[test]
    fn test_shipped_views_compile() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("views");
        let views = Views::load(dir).unwrap();

        let post = Post::new("hello", "Hello World");
        let html = views.render(EDIT_POST, &PostView::from(&post)).unwrap();
        assert!(html.contains("/save/hello"));
        assert!(html.contains("Hello World"));
    }

    #[test]
    fn test_shipped_views_encode_titles_in_urls() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("views");
        let views = Views::load(dir).unwrap();

        let post = Post::new("a?b#c%d e", "");
        let view = PostView::from(&post);

        let edit = views.render(EDIT_POST, &view).unwrap();
        assert!(edit.contains("action=\"/save/a%3Fb%23c%25d%20e\""));

        let page = views.render(VIEW_POST, &view).unwrap();
        assert!(page.contains("href=\"/edit/a%3Fb%23c%25d%20e\""));
    }
}
