//! S3-compatible object storage provider.
//!
//! Paths map to hash-prefixed keys (see [`crate::keys`]). Directories are
//! zero-byte objects whose key ends in `/`. Move is a copy followed by a
//! delete and is not atomic.
//!
//! Sibling entries land in different hash partitions, so `list_dir`,
//! recursive delete and recursive copy all go through `scan`, which lists
//! every partition of the bucket prefix and then every level of the
//! repository inside each one. Their cost grows with the number of
//! partitions and with the size of the repository, not with the size of
//! the directory being listed. Keep one bucket prefix per deployment and
//! expect PROPFIND `Depth: 1` on large repositories to take many
//! ListObjectsV2 round trips.

use std::collections::HashSet;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream as S3Body;
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use filehub_core::config::storage::S3Config;
use filehub_core::error::{AppError, ErrorKind};
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{ByteStream, ScanControl, StorageProvider};
use filehub_core::types::path;
use filehub_core::types::{FileObject, content_type_for};
use filehub_entity::repository::Repository;

use crate::keys;

/// Characters left unescaped in a `CopySource` header.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Stores repositories as hash-prefixed keys in one bucket.
#[derive(Debug, Clone)]
pub struct S3StorageProvider {
    client: Client,
    bucket: String,
    prefix: String,
}

/// One delimiter-level listing.
#[derive(Debug, Default)]
struct Level {
    objects: Vec<(String, u64, DateTime<Utc>)>,
    prefixes: Vec<String>,
}

impl S3StorageProvider {
    /// Build a client for `bucket` using static credentials and path-style
    /// addressing.
    pub fn new(config: &S3Config, bucket: &str, prefix: &str) -> Self {
        tracing::info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket,
            prefix,
            "Initializing S3 storage provider"
        );

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "filehub",
        );
        let sdk_config = aws_sdk_s3::Config::builder()
            .endpoint_url(&config.endpoint)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .behavior_version(BehaviorVersion::latest())
            .build();

        Self::from_client(Client::from_conf(sdk_config), bucket, prefix)
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client, bucket: &str, prefix: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    fn file_key(&self, repo: &str, cleaned: &str) -> AppResult<String> {
        Repository::validate_name(repo)?;
        Ok(keys::object_key(&self.prefix, repo, cleaned))
    }

    fn dir_key(&self, repo: &str, cleaned: &str) -> AppResult<String> {
        Repository::validate_name(repo)?;
        Ok(keys::directory_key(&self.prefix, repo, cleaned))
    }

    /// HEAD an object, mapping a missing key to `None`.
    async fn head(&self, key: &str) -> AppResult<Option<(u64, DateTime<Utc>)>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(out) => Ok(Some((
                out.content_length().unwrap_or(0).max(0) as u64,
                to_utc(out.last_modified()),
            ))),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(None),
            Err(err) => Err(s3_error("HeadObject", key, err)),
        }
    }

    async fn put_marker(&self, key: &str) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(S3Body::from(Vec::new()))
            .send()
            .await
            .map_err(|e| s3_error("PutObject", key, e))?;
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error("DeleteObject", key, e))?;
        Ok(())
    }

    async fn copy_key(&self, from: &str, to: &str) -> AppResult<()> {
        let source = format!(
            "{}/{}",
            self.bucket,
            utf8_percent_encode(from, COPY_SOURCE)
        );
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(source)
            .key(to)
            .send()
            .await
            .map_err(|e| s3_error("CopyObject", from, e))?;
        Ok(())
    }

    /// Create directory markers for every ancestor of `cleaned` (the root
    /// excluded).
    async fn ensure_parents(&self, repo: &str, cleaned: &str) -> AppResult<()> {
        let mut dir = path::parent(cleaned);
        while !path::is_root(&dir) {
            self.put_marker(&self.dir_key(repo, &dir)?).await?;
            dir = path::parent(&dir);
        }
        Ok(())
    }

    /// List one level under `prefix` with the `/` delimiter, following
    /// continuation tokens while the response is truncated.
    async fn list_level(&self, prefix: &str) -> AppResult<Level> {
        let mut level = Level::default();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .delimiter("/");
            if !prefix.is_empty() {
                req = req.prefix(prefix);
            }
            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| s3_error("ListObjectsV2", prefix, e))?;

            for obj in resp.contents() {
                if let Some(key) = obj.key() {
                    level.objects.push((
                        key.to_string(),
                        obj.size().unwrap_or(0).max(0) as u64,
                        to_utc(obj.last_modified()),
                    ));
                }
            }
            for common in resp.common_prefixes() {
                if let Some(p) = common.prefix() {
                    level.prefixes.push(p.to_string());
                }
            }

            match (resp.is_truncated(), resp.next_continuation_token()) {
                (Some(true), Some(token)) => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(level)
    }

    /// Every entry strictly below `dir` (cleaned), in scan order.
    async fn descendants(&self, repo: &str, dir: &str) -> AppResult<Vec<FileObject>> {
        let below = if path::is_root(dir) {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        let mut found = Vec::new();
        self.scan(repo, &mut |entry: FileObject| {
            if entry.path.starts_with(&below) {
                found.push(entry);
            }
            ScanControl::Continue
        })
        .await?;
        Ok(found)
    }

    async fn remove_entry(&self, repo: &str, cleaned: &str) -> AppResult<()> {
        self.delete_key(&self.file_key(repo, cleaned)?).await?;
        let marker = self.dir_key(repo, cleaned)?;
        if let Err(e) = self.delete_key(&marker).await {
            debug!(key = %marker, error = %e, "Ignoring directory marker delete failure");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn put_file(&self, repo: &str, raw_path: &str, mut body: ByteStream) -> AppResult<u64> {
        let cleaned = path::clean_rooted(raw_path);
        if path::is_root(&cleaned) {
            return Err(AppError::validation("Cannot write to the repository root"));
        }
        let key = self.file_key(repo, &cleaned)?;

        let mut buffer = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            buffer.extend_from_slice(&chunk);
        }
        let total_bytes = buffer.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type_for(&cleaned))
            .body(S3Body::from(buffer))
            .send()
            .await
            .map_err(|e| s3_error("PutObject", &key, e))?;
        self.ensure_parents(repo, &cleaned).await?;

        debug!(repo, path = %cleaned, key = %key, bytes = total_bytes, "Uploaded object");
        Ok(total_bytes)
    }

    async fn open_file(&self, repo: &str, raw_path: &str) -> AppResult<ByteStream> {
        let cleaned = path::clean_rooted(raw_path);
        let key = self.file_key(repo, &cleaned)?;
        let out = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    AppError::not_found(format!("Not found: {cleaned}"))
                } else {
                    s3_error("GetObject", &key, err)
                }
            })?;

        let stream = futures::stream::try_unfold(out.body, |mut body| async move {
            let chunk = body.try_next().await.map_err(std::io::Error::from)?;
            Ok(chunk.map(|bytes| (bytes, body)))
        });
        Ok(Box::pin(stream))
    }

    async fn delete_file(&self, repo: &str, raw_path: &str) -> AppResult<()> {
        let cleaned = path::clean_rooted(raw_path);
        if path::is_root(&cleaned) {
            return Err(AppError::authorization("Cannot delete the repository root"));
        }

        if self.head(&self.dir_key(repo, &cleaned)?).await?.is_some() {
            for entry in self.descendants(repo, &cleaned).await? {
                self.remove_entry(repo, &entry.path).await?;
            }
        }
        self.remove_entry(repo, &cleaned).await?;

        debug!(repo, path = %cleaned, "Deleted object");
        Ok(())
    }

    async fn copy_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()> {
        let src_clean = path::clean_rooted(src);
        let dst_clean = path::clean_rooted(dst);
        if path::is_root(&dst_clean)
            || dst_clean == src_clean
            || dst_clean.starts_with(&format!("{src_clean}/"))
        {
            return Err(AppError::validation(format!(
                "Cannot copy '{src_clean}' onto '{dst_clean}'"
            )));
        }

        let info = self.get_info(repo, &src_clean).await?;
        if info.is_dir {
            self.put_marker(&self.dir_key(repo, &dst_clean)?).await?;
            for entry in self.descendants(repo, &src_clean).await? {
                let target = format!("{dst_clean}{}", &entry.path[src_clean.len()..]);
                if entry.is_dir {
                    self.put_marker(&self.dir_key(repo, &target)?).await?;
                } else {
                    self.copy_key(
                        &self.file_key(repo, &entry.path)?,
                        &self.file_key(repo, &target)?,
                    )
                    .await?;
                }
            }
        } else {
            self.copy_key(
                &self.file_key(repo, &src_clean)?,
                &self.file_key(repo, &dst_clean)?,
            )
            .await?;
        }
        self.ensure_parents(repo, &dst_clean).await?;

        debug!(repo, from = %src_clean, to = %dst_clean, "Copied object");
        Ok(())
    }

    async fn move_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()> {
        let src_clean = path::clean_rooted(src);
        if path::is_root(&src_clean) {
            return Err(AppError::validation("Cannot move the repository root"));
        }
        self.copy_file(repo, &src_clean, dst).await?;
        self.delete_file(repo, &src_clean).await
    }

    async fn get_info(&self, repo: &str, raw_path: &str) -> AppResult<FileObject> {
        let cleaned = path::clean_rooted(raw_path);
        if path::is_root(&cleaned) {
            Repository::validate_name(repo)?;
            return Ok(FileObject::directory(&cleaned, Utc::now()));
        }

        if let Some((size, modified)) = self.head(&self.file_key(repo, &cleaned)?).await? {
            return Ok(FileObject::file(&cleaned, size, modified));
        }
        if let Some((_, modified)) = self.head(&self.dir_key(repo, &cleaned)?).await? {
            return Ok(FileObject::directory(&cleaned, modified));
        }
        Err(AppError::not_found(format!("Not found: {cleaned}")))
    }

    async fn list_dir(&self, repo: &str, raw_path: &str) -> AppResult<Vec<FileObject>> {
        let cleaned = path::clean_rooted(raw_path);
        let info = self.get_info(repo, &cleaned).await?;
        if !info.is_dir {
            return Err(AppError::not_a_directory(format!(
                "'{cleaned}' is not a directory"
            )));
        }

        let mut children = Vec::new();
        self.scan(repo, &mut |entry: FileObject| {
            if path::parent(&entry.path) == cleaned && entry.path != cleaned {
                children.push(entry);
            }
            ScanControl::Continue
        })
        .await?;
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn create_dir(&self, repo: &str, raw_path: &str) -> AppResult<()> {
        let cleaned = path::clean_rooted(raw_path);
        if path::is_root(&cleaned) {
            return Ok(());
        }
        if self.head(&self.file_key(repo, &cleaned)?).await?.is_some() {
            return Err(AppError::conflict(format!(
                "'{cleaned}' already exists as a file"
            )));
        }

        self.put_marker(&self.dir_key(repo, &cleaned)?).await?;
        self.ensure_parents(repo, &cleaned).await
    }

    /// Walks every hash partition under the bucket prefix, then the
    /// repository's levels inside each partition.
    async fn scan(
        &self,
        repo: &str,
        visit: &mut (dyn FnMut(FileObject) -> ScanControl + Send),
    ) -> AppResult<()> {
        Repository::validate_name(repo)?;
        let base = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };

        let partitions = self.list_level(&base).await?.prefixes;
        let mut seen: HashSet<String> = HashSet::new();

        for partition in partitions {
            let repo_prefix = format!("{partition}{repo}/");
            let mut pending = vec![repo_prefix.clone()];

            while let Some(level_prefix) = pending.pop() {
                let level = self.list_level(&level_prefix).await?;

                for (key, size, modified) in level.objects {
                    if key == level_prefix {
                        continue;
                    }
                    let entry_path = relative_path(&repo_prefix, &key);
                    if seen.insert(entry_path.clone())
                        && visit(FileObject::file(&entry_path, size, modified))
                            == ScanControl::Stop
                    {
                        return Ok(());
                    }
                }

                for common in level.prefixes {
                    let entry_path = relative_path(&repo_prefix, &common);
                    if seen.insert(entry_path.clone())
                        && visit(FileObject::directory(&entry_path, Utc::now()))
                            == ScanControl::Stop
                    {
                        return Ok(());
                    }
                    pending.push(common);
                }
            }
        }
        Ok(())
    }
}

/// Repository path of a key (or common prefix) below `repo_prefix`.
fn relative_path(repo_prefix: &str, key: &str) -> String {
    let rest = key.strip_prefix(repo_prefix).unwrap_or(key);
    path::clean_rooted(rest)
}

fn to_utc(dt: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    dt.and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()))
        .unwrap_or_else(Utc::now)
}

fn s3_error<E: std::error::Error>(operation: &str, key: &str, err: E) -> AppError {
    AppError::storage(format!(
        "S3 {operation} failed for '{key}': {}",
        DisplayErrorContext(&err)
    ))
}
