//! Folder-level download/upload against a [`BucketStore`].

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tableflow_bucket::BucketStore;
use tracing::{info, warn};

use crate::{SyncError, pool};

/// Attempts per object before it is given up on and recorded as failed.
pub const TRANSFER_MAX_ATTEMPTS: usize = 3;

/// Worker pool size for bulk transfers. An implementation default, not a
/// per-call knob.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Outcome of a bulk transfer. `failed` lists the keys that exhausted their
/// retry budget; the transfer call itself still succeeded.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub attempted: usize,
    pub failed: Vec<String>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Download every object under `remote_prefix` into `local_dir`, preserving
/// the key structure below the prefix. Returns after every enumerated object
/// has been attempted; objects that exhaust their retries are logged,
/// reported, and absent from the local tree. Only enumeration failure is an
/// error.
pub async fn download_folder(
    store: &dyn BucketStore,
    remote_prefix: &str,
    local_dir: &Path,
) -> Result<SyncReport, SyncError> {
    let keys = store.list_objects(remote_prefix).await?;
    let attempted = keys.len();
    info!(prefix = remote_prefix, objects = attempted, "downloading folder");

    let outcomes = pool::run_all(keys, DEFAULT_CONCURRENCY, |key| async move {
        let rel = relative_key(&key, remote_prefix);
        let target = local_dir.join(rel);
        match download_object(store, &key, &target).await {
            Ok(()) => None,
            Err(err) => {
                warn!(%key, "giving up after {TRANSFER_MAX_ATTEMPTS} attempts: {err}");
                Some(key)
            }
        }
    })
    .await;

    Ok(SyncReport {
        attempted,
        failed: outcomes.into_iter().flatten().collect(),
    })
}

/// Upload every regular file under `local_dir` to `remote_prefix`, deriving
/// each key from the file's path relative to `local_dir`. Same best-effort
/// retry and barrier semantics as [`download_folder`].
pub async fn upload_folder(
    store: &dyn BucketStore,
    remote_prefix: &str,
    local_dir: &Path,
) -> Result<SyncReport, SyncError> {
    let files = enumerate_files(local_dir)?;
    let attempted = files.len();
    info!(prefix = remote_prefix, files = attempted, "uploading folder");

    let outcomes = pool::run_all(files, DEFAULT_CONCURRENCY, |path| async move {
        let key = match path.strip_prefix(local_dir) {
            Ok(rel) => object_key(remote_prefix, rel),
            Err(_) => path.display().to_string(),
        };
        match upload_object(store, &key, &path).await {
            Ok(()) => None,
            Err(err) => {
                warn!(%key, "giving up after {TRANSFER_MAX_ATTEMPTS} attempts: {err}");
                Some(key)
            }
        }
    })
    .await;

    Ok(SyncReport {
        attempted,
        failed: outcomes.into_iter().flatten().collect(),
    })
}

async fn download_object(
    store: &dyn BucketStore,
    key: &str,
    target: &Path,
) -> Result<(), SyncError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetch_and_write(store, key, target).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                warn!(%key, attempt, "download attempt failed: {err}");
                if attempt >= TRANSFER_MAX_ATTEMPTS {
                    return Err(err);
                }
            }
        }
    }
}

async fn fetch_and_write(
    store: &dyn BucketStore,
    key: &str,
    target: &Path,
) -> Result<(), SyncError> {
    let bytes = store.get_object(key).await?;
    tokio::fs::write(target, &bytes).await?;
    Ok(())
}

async fn upload_object(store: &dyn BucketStore, key: &str, path: &Path) -> Result<(), SyncError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match read_and_put(store, key, path).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                warn!(%key, attempt, "upload attempt failed: {err}");
                if attempt >= TRANSFER_MAX_ATTEMPTS {
                    return Err(err);
                }
            }
        }
    }
}

async fn read_and_put(store: &dyn BucketStore, key: &str, path: &Path) -> Result<(), SyncError> {
    let bytes = tokio::fs::read(path).await?;
    store.put_object(key, Bytes::from(bytes)).await?;
    Ok(())
}

fn enumerate_files(local_dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let pattern = local_dir.join("**/*");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| SyncError::Walk("local path is not valid UTF-8".to_string()))?;

    let mut files = Vec::new();
    for entry in glob::glob(pattern).map_err(|err| SyncError::Walk(err.to_string()))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!("could not read path while enumerating upload: {err}"),
        }
    }
    Ok(files)
}

/// The key with one leading `"{prefix}/"` stripped. An empty prefix leaves
/// the key untouched.
fn relative_key<'a>(key: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return key;
    }
    key.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(key)
}

fn object_key(remote_prefix: &str, rel: &Path) -> String {
    let rel: Vec<String> = rel
        .iter()
        .map(|part| part.to_string_lossy().into_owned())
        .collect();
    let rel = rel.join("/");
    if remote_prefix.is_empty() {
        rel
    } else {
        format!("{remote_prefix}/{rel}")
    }
}
