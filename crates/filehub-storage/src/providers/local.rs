//! Local filesystem storage provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use filehub_core::error::{AppError, ErrorKind};
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{ByteStream, ScanControl, StorageProvider};
use filehub_core::types::FileObject;
use filehub_core::types::path;
use filehub_entity::repository::Repository;

/// Stores each repository as a directory `root/<repo>`.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Directory holding one sub-directory per repository.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a provider rooted at `root`, which must sit under one of the
    /// `allowed` directories.
    pub async fn new(root: impl Into<PathBuf>, allowed: &[PathBuf]) -> AppResult<Self> {
        let root = lexical(&root.into());
        if !allowed.iter().any(|dir| root.starts_with(lexical(dir))) {
            return Err(AppError::configuration(format!(
                "Storage root '{}' is not under any configured root_dir",
                root.display()
            )));
        }

        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Absolute directory of a repository.
    fn repo_root(&self, repo: &str) -> AppResult<PathBuf> {
        Repository::validate_name(repo)?;
        Ok(self.root.join(repo))
    }

    /// Map `(repo, path)` to a filesystem path that cannot leave the
    /// repository directory. Returns it with the cleaned path.
    fn resolve(&self, repo: &str, raw_path: &str) -> AppResult<(PathBuf, String)> {
        let repo_root = self.repo_root(repo)?;
        let cleaned = path::clean_rooted(raw_path);
        let full = repo_root.join(cleaned.trim_start_matches('/'));
        if !full.starts_with(&repo_root) {
            return Err(AppError::authorization(format!(
                "Path '{raw_path}' escapes repository '{repo}'"
            )));
        }
        Ok((full, cleaned))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, full: &Path) -> AppResult<()> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn put_file(&self, repo: &str, raw_path: &str, mut body: ByteStream) -> AppResult<u64> {
        let (full, cleaned) = self.resolve(repo, raw_path)?;
        if path::is_root(&cleaned) {
            return Err(AppError::validation("Cannot write to the repository root"));
        }
        self.ensure_parent(&full).await?;

        let mut file = fs::File::create(&full)
            .await
            .map_err(|e| io_error(e, "create file", &cleaned))?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            total_bytes += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|e| io_error(e, "write chunk to", &cleaned))?;
        }

        file.flush()
            .await
            .map_err(|e| io_error(e, "flush", &cleaned))?;

        debug!(repo, path = %cleaned, bytes = total_bytes, "Wrote file from stream");
        Ok(total_bytes)
    }

    async fn open_file(&self, repo: &str, raw_path: &str) -> AppResult<ByteStream> {
        let (full, cleaned) = self.resolve(repo, raw_path)?;
        let meta = fs::metadata(&full)
            .await
            .map_err(|e| io_error(e, "open", &cleaned))?;
        if meta.is_dir() {
            return Err(AppError::validation(format!("'{cleaned}' is a directory")));
        }

        let file = fs::File::open(&full)
            .await
            .map_err(|e| io_error(e, "open", &cleaned))?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn delete_file(&self, repo: &str, raw_path: &str) -> AppResult<()> {
        let (full, cleaned) = self.resolve(repo, raw_path)?;
        if path::is_root(&cleaned) {
            return Err(AppError::authorization("Cannot delete the repository root"));
        }

        let meta = fs::metadata(&full)
            .await
            .map_err(|e| io_error(e, "delete", &cleaned))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&full).await
        } else {
            fs::remove_file(&full).await
        };
        result.map_err(|e| io_error(e, "delete", &cleaned))?;

        debug!(repo, path = %cleaned, "Deleted");
        Ok(())
    }

    async fn copy_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()> {
        let (from, src_clean) = self.resolve(repo, src)?;
        let (to, dst_clean) = self.resolve(repo, dst)?;
        if path::is_root(&dst_clean) || to.starts_with(&from) {
            return Err(AppError::validation(format!(
                "Cannot copy '{src_clean}' onto '{dst_clean}'"
            )));
        }

        let meta = fs::metadata(&from)
            .await
            .map_err(|e| io_error(e, "copy", &src_clean))?;
        self.ensure_parent(&to).await?;
        clear_destination(&to, &dst_clean).await?;

        if meta.is_dir() {
            copy_tree(&from, &to).await?;
        } else {
            fs::copy(&from, &to)
                .await
                .map_err(|e| io_error(e, "copy", &src_clean))?;
        }

        debug!(repo, from = %src_clean, to = %dst_clean, "Copied");
        Ok(())
    }

    async fn move_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()> {
        let (from, src_clean) = self.resolve(repo, src)?;
        let (to, dst_clean) = self.resolve(repo, dst)?;
        if path::is_root(&src_clean) || path::is_root(&dst_clean) || to.starts_with(&from) {
            return Err(AppError::validation(format!(
                "Cannot move '{src_clean}' onto '{dst_clean}'"
            )));
        }

        fs::metadata(&from)
            .await
            .map_err(|e| io_error(e, "move", &src_clean))?;
        self.ensure_parent(&to).await?;
        clear_destination(&to, &dst_clean).await?;

        fs::rename(&from, &to)
            .await
            .map_err(|e| io_error(e, "move", &src_clean))?;

        debug!(repo, from = %src_clean, to = %dst_clean, "Moved");
        Ok(())
    }

    async fn get_info(&self, repo: &str, raw_path: &str) -> AppResult<FileObject> {
        let (full, cleaned) = self.resolve(repo, raw_path)?;
        let meta = fs::metadata(&full)
            .await
            .map_err(|e| io_error(e, "stat", &cleaned))?;
        Ok(to_file_object(&cleaned, &meta))
    }

    async fn list_dir(&self, repo: &str, raw_path: &str) -> AppResult<Vec<FileObject>> {
        let (full, cleaned) = self.resolve(repo, raw_path)?;
        let meta = fs::metadata(&full)
            .await
            .map_err(|e| io_error(e, "list", &cleaned))?;
        if !meta.is_dir() {
            return Err(AppError::not_a_directory(format!(
                "'{cleaned}' is not a directory"
            )));
        }

        let mut entries = read_entries(&full, &cleaned).await?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn create_dir(&self, repo: &str, raw_path: &str) -> AppResult<()> {
        let (full, cleaned) = self.resolve(repo, raw_path)?;
        if let Ok(meta) = fs::metadata(&full).await {
            if !meta.is_dir() {
                return Err(AppError::conflict(format!(
                    "'{cleaned}' already exists as a file"
                )));
            }
        }

        fs::create_dir_all(&full)
            .await
            .map_err(|e| io_error(e, "create directory", &cleaned))?;
        Ok(())
    }

    async fn scan(
        &self,
        repo: &str,
        visit: &mut (dyn FnMut(FileObject) -> ScanControl + Send),
    ) -> AppResult<()> {
        let repo_root = self.repo_root(repo)?;
        let mut pending = vec![(repo_root, "/".to_string())];

        while let Some((dir, dir_path)) = pending.pop() {
            let mut entries = match read_entries(&dir, &dir_path).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(repo, path = %dir_path, error = %e, "Skipping unreadable directory");
                    continue;
                }
            };
            entries.sort_by(|a, b| a.name.cmp(&b.name));

            let mut subdirs = Vec::new();
            for entry in entries {
                if entry.is_dir {
                    subdirs.push((dir.join(&entry.name), entry.path.clone()));
                }
                if visit(entry) == ScanControl::Stop {
                    return Ok(());
                }
            }
            pending.extend(subdirs.into_iter().rev());
        }
        Ok(())
    }
}

/// Read the direct children of `dir`, skipping entries whose metadata
/// cannot be read.
async fn read_entries(dir: &Path, dir_path: &str) -> AppResult<Vec<FileObject>> {
    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|e| io_error(e, "list", dir_path))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| io_error(e, "read entry in", dir_path))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let entry_path = path::join(dir_path, &name);
        match entry.metadata().await {
            Ok(meta) => entries.push(to_file_object(&entry_path, &meta)),
            Err(e) => warn!(path = %entry_path, error = %e, "Failed to read entry metadata"),
        }
    }
    Ok(entries)
}

/// Remove whatever occupies a copy or move destination.
async fn clear_destination(to: &Path, dst_clean: &str) -> AppResult<()> {
    let Ok(existing) = fs::metadata(to).await else {
        return Ok(());
    };
    let result = if existing.is_dir() {
        fs::remove_dir_all(to).await
    } else {
        fs::remove_file(to).await
    };
    result.map_err(|e| io_error(e, "replace", dst_clean))
}

/// Recursively copy a directory tree.
async fn copy_tree(from: &Path, to: &Path) -> AppResult<()> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", dst.display()),
                e,
            )
        })?;

        let mut reader = fs::read_dir(&src).await?;
        while let Some(entry) = reader.next_entry().await? {
            let target = dst.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), &target).await?;
            }
        }
    }
    Ok(())
}

fn to_file_object(cleaned: &str, meta: &std::fs::Metadata) -> FileObject {
    let modified = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    if meta.is_dir() {
        FileObject::directory(cleaned, modified)
    } else {
        FileObject::file(cleaned, meta.len(), modified)
    }
}

/// Map an I/O failure on a repository path to an [`AppError`].
fn io_error(err: std::io::Error, action: &str, cleaned: &str) -> AppError {
    match err.kind() {
        std::io::ErrorKind::NotFound => AppError::not_found(format!("Not found: {cleaned}")),
        std::io::ErrorKind::NotADirectory => {
            AppError::not_a_directory(format!("Not a directory: {cleaned}"))
        }
        _ => AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to {action} '{cleaned}'"),
            err,
        ),
    }
}

/// Lexically normalise a filesystem path.
fn lexical(p: &Path) -> PathBuf {
    PathBuf::from(path::clean(&p.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::TryStreamExt;

    use super::*;

    fn body(data: &'static [u8]) -> ByteStream {
        Box::pin(futures::stream::once(async move {
            Ok::<_, std::io::Error>(Bytes::from_static(data))
        }))
    }

    async fn read_all(provider: &LocalStorageProvider, repo: &str, p: &str) -> Vec<u8> {
        let stream = provider.open_file(repo, p).await.unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    async fn provider(dir: &tempfile::TempDir) -> LocalStorageProvider {
        LocalStorageProvider::new(dir.path().join("data"), &[dir.path().to_path_buf()])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_must_be_whitelisted() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalStorageProvider::new(dir.path().join("data"), &[PathBuf::from("/srv")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        let sneaky = dir.path().join("allowed/../elsewhere");
        let err = LocalStorageProvider::new(sneaky, &[dir.path().join("allowed")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_put_open_info_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;

        let written = provider
            .put_file("alice", "/a/b/hello.txt", body(b"hello"))
            .await
            .unwrap();
        assert_eq!(written, 5);
        assert_eq!(read_all(&provider, "alice", "/a/b/hello.txt").await, b"hello");

        let info = provider.get_info("alice", "a//b/./hello.txt").await.unwrap();
        assert_eq!(info.path, "/a/b/hello.txt");
        assert_eq!(info.name, "hello.txt");
        assert_eq!(info.size, 5);
        assert_eq!(info.content_type, "text/plain");
        assert!(!info.is_dir);

        let parent = provider.get_info("alice", "/a/b").await.unwrap();
        assert!(parent.is_dir);
    }

    #[tokio::test]
    async fn test_escape_attempt_stays_in_repository() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;

        provider
            .put_file("alice", "/../../etc/passwd", body(b"x"))
            .await
            .unwrap();
        assert!(dir.path().join("data/alice/etc/passwd").is_file());
        assert!(!dir.path().join("etc/passwd").exists());
    }

    #[tokio::test]
    async fn test_copy_and_move() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;
        provider.put_file("r", "/a.txt", body(b"data")).await.unwrap();

        provider.copy_file("r", "/a.txt", "/d/b.txt").await.unwrap();
        assert_eq!(read_all(&provider, "r", "/a.txt").await, b"data");
        assert_eq!(read_all(&provider, "r", "/d/b.txt").await, b"data");

        provider.put_file("r", "/d/c.txt", body(b"old")).await.unwrap();
        provider.move_file("r", "/d/b.txt", "/d/c.txt").await.unwrap();
        assert_eq!(read_all(&provider, "r", "/d/c.txt").await, b"data");
        let err = provider.open_file("r", "/d/b.txt").await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_copy_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;
        provider.put_file("r", "/src/x/1.txt", body(b"1")).await.unwrap();

        provider.copy_file("r", "/src", "/dst").await.unwrap();
        assert_eq!(read_all(&provider, "r", "/dst/x/1.txt").await, b"1");

        let err = provider.copy_file("r", "/src", "/src/inner").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_list_dir_children_only() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;
        provider.put_file("r", "/d/b.txt", body(b"b")).await.unwrap();
        provider.put_file("r", "/d/a.txt", body(b"a")).await.unwrap();
        provider.put_file("r", "/d/sub/deep.txt", body(b"c")).await.unwrap();

        let entries = provider.list_dir("r", "/d").await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert!(entries[2].is_dir);

        let err = provider.list_dir("r", "/d/a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotADirectory);

        let err = provider.list_dir("r", "/missing").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;
        provider.put_file("r", "/d/a.txt", body(b"a")).await.unwrap();

        provider.delete_file("r", "/d").await.unwrap();
        let err = provider.get_info("r", "/d").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = provider.delete_file("r", "/d").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = provider.delete_file("r", "/").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_scan_visits_every_entry_and_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;
        provider.put_file("r", "/a/1.txt", body(b"1")).await.unwrap();
        provider.put_file("r", "/a/b/2.txt", body(b"2")).await.unwrap();
        provider.put_file("r", "/3.txt", body(b"3")).await.unwrap();

        let mut seen = Vec::new();
        provider
            .scan("r", &mut |entry: FileObject| {
                seen.push(entry.path);
                ScanControl::Continue
            })
            .await
            .unwrap();
        seen.sort();
        assert_eq!(seen, vec!["/3.txt", "/a", "/a/1.txt", "/a/b", "/a/b/2.txt"]);

        let mut count = 0;
        provider
            .scan("r", &mut |_: FileObject| {
                count += 1;
                ScanControl::Stop
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_create_dir_over_file_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir).await;
        provider.put_file("r", "/f", body(b"1")).await.unwrap();

        let err = provider.create_dir("r", "/f").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        provider.create_dir("r", "/new/nested").await.unwrap();
        assert!(provider.get_info("r", "/new/nested").await.unwrap().is_dir);
    }
}
