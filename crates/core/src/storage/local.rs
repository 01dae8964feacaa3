//! Local filesystem storage provider.
//!
//! Files land at `{location}/{document_id}_{file_name}` where `location` comes
//! from the [`LocationGenerator`]. Uploads are streamed in [`CHUNK_SIZE`]
//! chunks into a staging file under the temp directory and renamed into
//! place, so an interrupted upload never leaves a partial file at a path a
//! document points to. Staging files are removed when the upload fails or
//! its future is dropped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{PathPersistError, TempPath};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use docvault_shared::StorageSettings;
use docvault_shared::types::DocumentId;

use super::config::{DocStorageType, StorageKind};
use super::error::StorageError;
use super::location::LocationGenerator;
use super::provider::{CHUNK_SIZE, load_document, sanitize_file_name};
use crate::document::{
    Document, DocumentContent, DocumentError, DocumentRepository, mime::guess_mime,
};

/// Provider storing content on the local filesystem.
#[derive(Debug)]
pub struct LocalFsProvider<R> {
    repo: Arc<R>,
    locations: LocationGenerator,
    temp_dir: PathBuf,
}

impl<R: DocumentRepository> LocalFsProvider<R> {
    /// Create a provider rooted at `settings.base_dir`.
    #[must_use]
    pub fn new(repo: Arc<R>, settings: &StorageSettings) -> Self {
        Self {
            repo,
            locations: LocationGenerator::new(&settings.base_dir, settings.file_limit),
            temp_dir: settings.temp_dir.clone(),
        }
    }

    /// Verify the configuration kind and make sure the base and staging
    /// directories exist.
    pub async fn initialize(&mut self, config: &DocStorageType) -> Result<(), StorageError> {
        config.ensure_kind(StorageKind::LocalFs)?;
        fs::create_dir_all(self.locations.base_dir()).await?;
        fs::create_dir_all(&self.temp_dir).await?;
        info!(
            storage_id = %config.id,
            base_dir = %self.locations.base_dir().display(),
            "Initialized local filesystem storage provider"
        );
        Ok(())
    }

    /// Store `source` as the content of `document_id`.
    ///
    /// The previous file, if any, is removed before the new one is moved into
    /// place. A crash between those two steps leaves the record pointing at a
    /// path that no longer exists.
    pub async fn set_content<S>(
        &self,
        document_id: DocumentId,
        file_name: &str,
        source: S,
    ) -> Result<Document, DocumentError>
    where
        S: AsyncRead + Unpin + Send,
    {
        let mut document = load_document(self.repo.as_ref(), document_id).await?;

        let folder = self.locations.generate(&mut document).await?;
        let destination = folder.join(format!(
            "{}_{}",
            document.id,
            sanitize_file_name(file_name)
        ));

        let staged = self.stage(source).await?;

        if let Some(previous) = document.physical_path()
            && let Err(err) = remove_previous(Path::new(previous)).await
        {
            discard(staged);
            return Err(err.into());
        }

        commit(staged, &destination)
            .await
            .map_err(StorageError::from)?;

        document.name = Some(file_name.to_string());
        document.mime_type = Some(guess_mime(file_name));
        document.physical_path = Some(destination.to_string_lossy().into_owned());

        let updated = self.repo.update(document).await?;
        info!(
            document_id = %document_id,
            path = %destination.display(),
            "Stored document content on local filesystem"
        );
        Ok(updated.redacted())
    }

    /// Open the stored file for reading.
    pub async fn get_content(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentContent, DocumentError> {
        let document = load_document(self.repo.as_ref(), document_id).await?;
        let path = document
            .physical_path()
            .ok_or(DocumentError::ContentNotFound(document_id))?;

        let file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(document_id = %document_id, path, "Document file is missing");
                return Err(DocumentError::ContentNotFound(document_id));
            }
            Err(err) => return Err(StorageError::from(err).into()),
        };

        Ok(DocumentContent {
            reader: Box::pin(file),
            file_name: document.display_name(),
            mime_type: document.mime_type.clone(),
        })
    }

    /// Remove the file and then the metadata record.
    ///
    /// Returns `false` without touching the record when no content was ever
    /// attached. A failure to remove the file is logged and does not stop the
    /// record from being deleted.
    pub async fn delete_content(&self, document_id: DocumentId) -> Result<bool, DocumentError> {
        let document = load_document(self.repo.as_ref(), document_id).await?;

        let Some(path) = document.physical_path() else {
            warn!(document_id = %document_id, "No file path set for document");
            return Ok(false);
        };

        match fs::remove_file(path).await {
            Ok(()) => info!(document_id = %document_id, path, "Deleted document file"),
            Err(err) => warn!(
                document_id = %document_id,
                path,
                error = %err,
                "Failed to delete document file"
            ),
        }

        self.repo.delete(document_id).await
    }

    /// Copy `source` into a fresh staging file in bounded chunks.
    ///
    /// The returned path deletes the file when dropped.
    async fn stage<S>(&self, mut source: S) -> Result<TempPath, StorageError>
    where
        S: AsyncRead + Unpin + Send,
    {
        fs::create_dir_all(&self.temp_dir).await?;
        let (file, staged) = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".part")
            .tempfile_in(&self.temp_dir)?
            .into_parts();
        let mut file = fs::File::from_std(file);

        let mut buf = vec![0u8; CHUNK_SIZE];
        let written: std::io::Result<u64> = async {
            let mut total = 0u64;
            loop {
                let n = source.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                file.write_all(&buf[..n]).await?;
                total += n as u64;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok(total)
        }
        .await;

        drop(file);

        match written {
            Ok(bytes) => {
                debug!(path = %staged.display(), bytes, "Staged upload");
                Ok(staged)
            }
            Err(err) => {
                discard(staged);
                Err(err.into())
            }
        }
    }
}

async fn remove_previous(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed previous document file");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Move a staged file to its final path.
async fn commit(staged: TempPath, destination: &Path) -> std::io::Result<()> {
    match staged.persist(destination) {
        Ok(()) => Ok(()),
        Err(PathPersistError { error, path }) if error.kind() == ErrorKind::CrossesDevices => {
            let copied = fs::copy(&path, destination).await.map(|_| ());
            discard(path);
            copied
        }
        Err(PathPersistError { error, path }) => {
            discard(path);
            Err(error)
        }
    }
}

/// Delete a staging file that will not be committed.
fn discard(staged: TempPath) {
    let path = staged.to_path_buf();
    if let Err(err) = staged.close() {
        warn!(path = %path.display(), error = %err, "Failed to remove staged upload");
    }
}
