//! Filesystem attachment store.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use deck_core::{AttachmentStore, Error, Result};

use crate::signing::UrlSigner;

/// Filesystem-backed attachment store.
///
/// Objects are stored under `{base_path}/{object_key}`. Writes are atomic
/// (temp file + rename), deletes are idempotent, and read URLs are signed
/// with an expiry so they can be handed to untrusted viewers.
pub struct FilesystemStore {
    base_path: PathBuf,
    public_base_url: String,
    signer: UrlSigner,
}

impl FilesystemStore {
    /// Create a new filesystem store rooted at `base_path`.
    ///
    /// `public_base_url` is the externally reachable prefix signed read
    /// URLs are issued under (no trailing slash).
    pub fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        signer: UrlSigner,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            signer,
        }
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        // Paths are relative object keys; reject anything that could walk
        // out of the base directory.
        if path.starts_with('/') || path.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(Error::AttachmentIo(format!("invalid object path: {}", path)));
        }
        Ok(self.base_path.join(path))
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (overlayfs quirks, permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"store-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }

    /// Read object bytes. Used by the signed-file serving endpoint; not
    /// part of the `AttachmentStore` contract.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        Ok(fs::read(full_path).await?)
    }

    /// Check whether an object exists at the given path.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }
}

#[async_trait]
impl AttachmentStore for FilesystemStore {
    async fn put(&self, object_key: &str, data: &[u8]) -> Result<String> {
        let full_path = self.full_path(object_key)?;
        debug!(storage_path = %object_key, size = data.len(), "fs_store: put");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "fs_store: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename. The suffix is appended rather
        // than substituted so keys differing only by extension get distinct
        // temp files.
        let mut temp_os = full_path.clone().into_os_string();
        temp_os.push(".tmp");
        let temp_path = std::path::PathBuf::from(temp_os);

        let write_result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &full_path).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;
        if let Err(e) = write_result {
            warn!(temp_path = %temp_path.display(), to = %full_path.display(), error = %e, "fs_store: write failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        // 0644, no execute
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(object_key.to_string())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn signed_read_url(&self, path: &str, ttl_secs: u64) -> Result<String> {
        if !self.exists(path).await? {
            return Err(Error::AttachmentIo(format!("no object at path: {}", path)));
        }
        let expires_at = chrono::Utc::now().timestamp() + ttl_secs as i64;
        let sig = self.signer.sign(path, expires_at);
        Ok(format!(
            "{}/files/{}?exp={}&sig={}",
            self.public_base_url, path, expires_at, sig
        ))
    }
}
