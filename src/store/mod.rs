//! Post store module
//!
//! Maps a post title to a single file under the posts directory and provides
//! load/save over that file. There is no cache: every load re-reads the disk.
//! Saves go through a temporary file and a rename, so a failed write never
//! leaves a truncated post behind.

mod error;

pub use error::StoreError;

use crate::logger;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A title-identified, byte-bodied document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub body: Vec<u8>,
}

impl Post {
    pub fn new(title: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// A post that has a title but no content yet
    pub fn blank(title: impl Into<String>) -> Self {
        Self::new(title, Vec::new())
    }
}

/// File-backed post storage
#[derive(Debug)]
pub struct PostStore {
    dir: PathBuf,
    extension: String,
    /// Sequence for temporary file names, unique per concurrent save
    temp_seq: AtomicU64,
}

impl PostStore {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            temp_seq: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `title`
    pub fn path_for(&self, title: &str) -> Result<PathBuf, StoreError> {
        validate_title(title)?;
        Ok(self.dir.join(format!("{title}.{}", self.extension)))
    }

    /// Read the post stored under `title`
    pub async fn load(&self, title: &str) -> Result<Post, StoreError> {
        let path = self.path_for(title)?;

        match fs::read(&path).await {
            Ok(body) => Ok(Post::new(title, body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger::log_debug(&format!("Post not found: {}", path.display()));
                Err(StoreError::NotFound {
                    title: title.to_string(),
                })
            }
            Err(e) => {
                logger::log_error(&format!("Failed to read {}: {e}", path.display()));
                Err(StoreError::Read {
                    title: title.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Persist `post`, replacing any previous body
    ///
    /// The body is written to a hidden temporary file in the posts directory
    /// and renamed over the destination once it is fully on disk.
    pub async fn save(&self, post: &Post) -> Result<(), StoreError> {
        let path = self.path_for(&post.title)?;

        match fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                logger::log_error(&format!(
                    "Posts directory is not a directory: {}",
                    self.dir.display()
                ));
                return Err(StoreError::StorageUnavailable);
            }
            Err(e) => {
                logger::log_error(&format!(
                    "Posts directory unavailable '{}': {e}",
                    self.dir.display()
                ));
                return Err(StoreError::StorageUnavailable);
            }
        }

        let temp_path = self.next_temp_path();
        if let Err(e) = write_and_rename(&temp_path, &path, &post.body).await {
            logger::log_error(&format!("Failed to write {}: {e}", path.display()));
            // Temp file may or may not exist at this point
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::Write {
                title: post.title.clone(),
                source: e,
            });
        }

        Ok(())
    }

    /// Hidden temporary path, independent of the title length
    ///
    /// Titles never start with `.`, so this cannot shadow a post file.
    fn next_temp_path(&self) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(".{}.{seq}.tmp", std::process::id()))
    }
}

async fn write_and_rename(temp_path: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(body).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp_path, path).await
}

/// Reject titles that would escape the posts directory or alias another file
fn validate_title(title: &str) -> Result<(), StoreError> {
    let invalid = title.is_empty()
        || title.starts_with('.')
        || title.contains(['/', '\\', '\0']);

    if invalid {
        return Err(StoreError::InvalidTitle(title.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store_in(dir: &Path) -> PostStore {
        PostStore::new(dir, "txt")
    }

    #[test]
    fn test_path_for() {
        let store = PostStore::new("posts", ".txt");
        assert_eq!(
            store.path_for("hello").unwrap(),
            Path::new("posts").join("hello.txt")
        );
    }

    #[test]
    fn test_invalid_titles() {
        let store = PostStore::new("posts", "txt");
        for title in ["", "../etc/passwd", "a/b", "a\\b", ".hidden", "nul\0"] {
            assert!(
                matches!(store.path_for(title), Err(StoreError::InvalidTitle(_))),
                "title {title:?} should be rejected"
            );
        }
        assert!(store.path_for("hello world").is_ok());
        assert!(store.path_for("v1.2").is_ok());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let body = vec![0u8, 159, 146, 150, b'\n', b'x'];
        store.save(&Post::new("bytes", body.clone())).await.unwrap();

        let post = store.load("bytes").await.unwrap();
        assert_eq!(post.title, "bytes");
        assert_eq!(post.body, body);
    }

    #[tokio::test]
    async fn test_repeated_save_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let post = Post::new("hello", "Hello World");

        store.save(&post).await.unwrap();
        store.save(&post).await.unwrap();

        assert_eq!(store.load("hello").await.unwrap(), post);
    }

    #[tokio::test]
    async fn test_save_overwrites_longer_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        store
            .save(&Post::new("hello", "a much longer first draft"))
            .await
            .unwrap();
        store.save(&Post::new("hello", "short")).await.unwrap();

        assert_eq!(store.load("hello").await.unwrap().body, b"short");
    }

    #[tokio::test]
    async fn test_save_title_near_name_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        // 248 + ".txt" fits in a 255 byte file name
        let title = "t".repeat(248);
        store.save(&Post::new(title.clone(), "x")).await.unwrap();
        store.save(&Post::new(title.clone(), "y")).await.unwrap();

        assert_eq!(store.load(&title).await.unwrap().body, b"y");
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let err = store.load("nosuchpost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_without_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir.path().join("missing"));

        let err = store.save(&Post::new("hello", "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable));
        assert!(!err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        // A directory squatting on the target makes the rename fail
        std::fs::create_dir(dir.path().join("blocked.txt")).unwrap();

        let err = store.save(&Post::new("blocked", "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_error_text_hides_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::create_dir(dir.path().join("blocked.txt")).unwrap();

        let err = store.save(&Post::new("blocked", "x")).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("blocked"));
        assert!(!text.contains(&*dir.path().to_string_lossy()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(dir.path()));

        let first = vec![b'a'; 64 * 1024];
        let second = vec![b'b'; 32 * 1024];

        let mut tasks = Vec::new();
        for _ in 0..8 {
            for body in [first.clone(), second.clone()] {
                let store = Arc::clone(&store);
                tasks.push(tokio::spawn(async move {
                    store.save(&Post::new("race", body)).await
                }));
            }
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = store.load("race").await.unwrap().body;
        assert!(stored == first || stored == second);

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["race.txt".to_string()]);
    }
}
