// Application state module
// Immutable per-process state handed to every request

use super::types::Config;
use crate::store::PostStore;
use crate::views::{ViewError, Views};

/// Application state
///
/// Built once at startup and shared behind an `Arc`. Nothing in here is
/// mutated per request: the post store only holds paths and the views are
/// compiled up front.
pub struct AppState {
    pub config: Config,
    pub store: PostStore,
    pub views: Views,
}

impl AppState {
    /// Build state from configuration, compiling every view from disk
    pub fn new(config: &Config) -> Result<Self, ViewError> {
        let views = Views::load(&config.storage.views_dir)?;
        Ok(Self::with_views(config, views))
    }

    /// Build state around an already compiled view set
    pub fn with_views(config: &Config, views: Views) -> Self {
        Self {
            config: config.clone(),
            store: PostStore::new(&config.storage.posts_dir, &config.storage.extension),
            views,
        }
    }
}
