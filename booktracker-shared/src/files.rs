/// On-disk storage for uploaded book files
///
/// Files are written under a single upload directory with generated names of
/// the form `{unix_millis}-{random}.{ext}`; the client-supplied name only
/// contributes its extension. Book records keep the returned path string.
///
/// # Example
///
/// ```no_run
/// use booktracker_shared::files::FileStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let files = FileStore::new("uploads").await?;
///
/// let ext = FileStore::validate_extension("Dune.EPUB")?;
/// let stored = files.store(&ext, b"...").await?;
/// assert!(files.exists(&stored.path).await);
/// # Ok(())
/// # }
/// ```

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

/// Extensions accepted for upload, lowercase
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "epub"];

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("Invalid file type. Allowed types: pdf, doc, docx, epub")]
    InvalidFileType,

    #[error("Stored file not found: {0}")]
    NotFound(String),

    #[error("File was not persisted to disk: {0}")]
    StorageFailure(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file that was written and verified on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path recorded on the book, upload directory included
    pub path: String,

    /// Lowercase extension without the dot
    pub file_type: String,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the upload directory, creating it if absent
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        info!(path = %dir.display(), "Upload directory ready");
        Ok(Self { dir })
    }

    /// Returns the lowercase extension of `original_name` if it is allowed
    pub fn validate_extension(original_name: &str) -> Result<String, FileStoreError> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or(FileStoreError::InvalidFileType)?;

        if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(FileStoreError::InvalidFileType)
        }
    }

    /// Writes `data` under a fresh generated name and checks it landed
    ///
    /// `ext` must come from [`FileStore::validate_extension`].
    pub async fn store(&self, ext: &str, data: &[u8]) -> Result<StoredFile, FileStoreError> {
        let path = self.dir.join(generate_name(ext));

        fs::write(&path, data).await?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(FileStoreError::StorageFailure(path.display().to_string()));
        }

        debug!(path = %path.display(), size = data.len(), "Stored upload");

        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            file_type: ext.to_string(),
        })
    }

    /// Whether a recorded path still exists
    pub async fn exists(&self, path: &str) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Removes a stored file; returns false if it was already gone
    pub async fn remove(&self, path: &str) -> Result<bool, FileStoreError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path, "Removed stored file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                warn!(path, error = %e, "Failed to remove stored file");
                Err(e.into())
            }
        }
    }

    /// Opens a stored file for streaming
    pub async fn open(&self, path: &str) -> Result<fs::File, FileStoreError> {
        match fs::File::open(path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FileStoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn generate_name(ext: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{:09}.{}", Utc::now().timestamp_millis(), suffix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_extension() {
        assert_eq!(FileStore::validate_extension("a.pdf").unwrap(), "pdf");
        assert_eq!(FileStore::validate_extension("Book.EPUB").unwrap(), "epub");
        assert_eq!(FileStore::validate_extension("notes.v2.docx").unwrap(), "docx");

        for bad in ["setup.exe", "README", "archive.pdf.zip", ".pdf", ""] {
            assert!(
                matches!(
                    FileStore::validate_extension(bad),
                    Err(FileStoreError::InvalidFileType)
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_generated_names_differ() {
        let a = generate_name("pdf");
        let b = generate_name("pdf");

        assert_ne!(a, b);
        assert!(a.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_new_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("uploads");

        FileStore::new(&dir).await.unwrap();

        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_store_open_remove() {
        let tmp = TempDir::new().unwrap();
        let files = FileStore::new(tmp.path()).await.unwrap();

        let stored = files.store("epub", b"contents").await.unwrap();
        assert_eq!(stored.file_type, "epub");
        assert!(stored.path.starts_with(tmp.path().to_str().unwrap()));
        assert!(files.exists(&stored.path).await);
        assert!(files.open(&stored.path).await.is_ok());

        assert!(files.remove(&stored.path).await.unwrap());
        assert!(!files.exists(&stored.path).await);
        assert!(!files.remove(&stored.path).await.unwrap());
        assert!(matches!(
            files.open(&stored.path).await,
            Err(FileStoreError::NotFound(_))
        ));
    }
}
