use crate::traits::{
    ByteStream, ContentReader, ContentStore, StagedEntry, StorageError, StorageResult,
};
use async_trait::async_trait;
use futures::StreamExt;
use hashdrop_core::constants::STAGING_DIR;
use hashdrop_core::digest::DIGEST_CHUNK_SIZE;
use hashdrop_core::is_safe_stored_name;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Local filesystem content directory
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    staging_path: PathBuf,
}

impl LocalStorage {
    /// Create the content directory (and its staging area) if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        let staging_path = base_path.join(STAGING_DIR);

        fs::create_dir_all(&staging_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create content directory {}: {}",
                staging_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            staging_path,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a stored name inside `root`, refusing anything that could escape it.
    fn resolve(&self, root: &Path, stored_name: &str) -> StorageResult<PathBuf> {
        if !is_safe_stored_name(stored_name)
            || stored_name.contains("..")
            || stored_name.starts_with('/')
        {
            return Err(StorageError::InvalidKey(stored_name.to_string()));
        }

        let path = root.join(stored_name);

        // Existing entries must still canonicalize inside the content directory (symlinks).
        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(stored_name.to_string()));
            }
        }

        Ok(path)
    }

    fn content_path(&self, stored_name: &str) -> StorageResult<PathBuf> {
        self.resolve(&self.base_path, stored_name)
    }

    fn staged_path(&self, stored_name: &str) -> StorageResult<PathBuf> {
        self.resolve(&self.staging_path, stored_name)
    }

    async fn open_existing(path: &Path, stored_name: &str) -> StorageResult<fs::File> {
        match fs::File::open(path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(stored_name.to_string()))
            }
            Err(e) => Err(StorageError::ReadFailed(format!(
                "Failed to open file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn remove_if_present(path: &Path) -> StorageResult<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl ContentStore for LocalStorage {
    async fn stage(
        &self,
        stored_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> StorageResult<u64> {
        let path = self.staged_path(stored_name)?;
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let mut buf = vec![0u8; DIGEST_CHUNK_SIZE];
        let mut written: u64 = 0;

        let result: StorageResult<()> = async {
            loop {
                let n = reader
                    .read(&mut buf)
                    .await
                    .map_err(StorageError::SourceFailed)?;
                if n == 0 {
                    break;
                }
                written += n as u64;
                if written > max_bytes {
                    return Err(StorageError::TooLarge { limit: max_bytes });
                }
                file.write_all(&buf[..n]).await.map_err(|e| {
                    StorageError::WriteFailed(format!(
                        "Failed to write file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }

            file.sync_all().await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to sync file {}: {}",
                    path.display(),
                    e
                ))
            })
        }
        .await;

        if let Err(e) = result {
            drop(file);
            if let Err(cleanup) = Self::remove_if_present(&path).await {
                tracing::warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "Failed to remove partial staged file"
                );
            }
            return Err(e);
        }

        tracing::debug!(
            path = %path.display(),
            stored_name = %stored_name,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Staged upload"
        );

        Ok(written)
    }

    async fn open_staged(&self, stored_name: &str) -> StorageResult<ContentReader> {
        let path = self.staged_path(stored_name)?;
        let file = Self::open_existing(&path, stored_name).await?;
        Ok(Box::pin(file))
    }

    async fn promote(&self, stored_name: &str) -> StorageResult<()> {
        let from = self.staged_path(stored_name)?;
        let to = self.content_path(stored_name)?;

        if fs::try_exists(&to).await.unwrap_or(false) {
            return Err(StorageError::WriteFailed(format!(
                "Refusing to overwrite existing content {}",
                stored_name
            )));
        }

        fs::rename(&from, &to).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to move {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %to.display(),
            stored_name = %stored_name,
            "Local storage promote successful"
        );

        Ok(())
    }

    async fn discard_staged(&self, stored_name: &str) -> StorageResult<()> {
        let path = self.staged_path(stored_name)?;
        if Self::remove_if_present(&path).await? {
            tracing::debug!(path = %path.display(), "Discarded staged file");
        }
        Ok(())
    }

    async fn remove(&self, stored_name: &str) -> StorageResult<()> {
        let path = self.content_path(stored_name)?;
        let start = std::time::Instant::now();

        if Self::remove_if_present(&path).await? {
            tracing::info!(
                path = %path.display(),
                stored_name = %stored_name,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage delete successful"
            );
        }

        Ok(())
    }

    async fn open(&self, stored_name: &str) -> StorageResult<ContentReader> {
        let path = self.content_path(stored_name)?;
        let file = Self::open_existing(&path, stored_name).await?;
        Ok(Box::pin(file))
    }

    async fn download_stream(&self, stored_name: &str) -> StorageResult<ByteStream> {
        let path = self.content_path(stored_name)?;
        let start = std::time::Instant::now();

        let file = Self::open_existing(&path, stored_name).await?;

        let stream = tokio_util::io::ReaderStream::with_capacity(file, DIGEST_CHUNK_SIZE).map(
            |result| {
                result.map_err(|e| StorageError::ReadFailed(format!("Failed to read chunk: {}", e)))
            },
        );

        let name = stored_name.to_string();
        let path_display = path.display().to_string();
        let logged_stream = stream.map(move |item| {
            if item.is_err() {
                tracing::error!(
                    path = %path_display,
                    stored_name = %name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
            }
            item
        });

        Ok(Box::pin(logged_stream))
    }

    async fn content_length(&self, stored_name: &str) -> StorageResult<u64> {
        let path = self.content_path(stored_name)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(stored_name.to_string()))
            }
            Err(e) => Err(StorageError::ReadFailed(e.to_string())),
        }
    }

    async fn list_stored_names(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn list_staged(&self) -> StorageResult<Vec<StagedEntry>> {
        let mut staged = Vec::new();
        let mut entries = fs::read_dir(&self.staging_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                staged.push(StagedEntry {
                    name: name.to_string(),
                    modified: meta.modified()?,
                });
            }
        }
        Ok(staged)
    }

    async fn check_ready(&self) -> StorageResult<()> {
        for dir in [&self.base_path, &self.staging_path] {
            let meta = fs::metadata(dir).await.map_err(|e| {
                StorageError::ConfigError(format!("{} is not accessible: {}", dir.display(), e))
            })?;
            if !meta.is_dir() {
                return Err(StorageError::ConfigError(format!(
                    "{} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
