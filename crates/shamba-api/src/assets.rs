//! Uploaded image files
//!
//! Files live flat in one directory served at `/uploads`. Listings store
//! `uploads/<name>`; discussion posts store `/uploads/<name>`. Removal is
//! fire-and-forget: it runs on a detached task and failures only reach
//! the logs.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use shamba_types::UPLOADS_PREFIX;

use crate::error::{ApiError, ApiResult};
use crate::form::UploadedFile;

/// How a stored file is named
#[derive(Debug, Clone, Copy)]
pub enum FileNaming {
    /// `<client base name, whitespace → _>-<millis>-<rand><ext>`
    Original,
    /// `<prefix>-<millis>-<rand><ext>`
    Prefixed(&'static str),
}

impl FileNaming {
    pub fn file_name(&self, original: &str) -> String {
        // Only the last path component of a client name is trusted
        let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
        let path = Path::new(base);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let stem = match self {
            Self::Original => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join("_");
                if stem.is_empty() || stem.starts_with('.') {
                    "image".to_string()
                } else {
                    stem
                }
            }
            Self::Prefixed(prefix) => prefix.to_string(),
        };

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let salt: u32 = rand::thread_rng().gen_range(100_000..1_000_000);

        format!("{}-{}-{}{}", stem, millis, salt, extension)
    }
}

/// Stored path for a listing image
pub fn listing_image_path(file_name: &str) -> String {
    format!("uploads/{}", file_name)
}

/// `imageUrl` for a discussion attachment
pub fn discussion_image_url(file_name: &str) -> String {
    format!("{}{}", UPLOADS_PREFIX, file_name)
}

/// Turn a client-echoed image reference back into a stored path.
///
/// Accepts the stored path itself or the absolute URL the API returned
/// for it.
pub fn stored_path(reference: &str) -> String {
    let reference = reference.trim().replace('\\', "/");
    let path = match reference.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or_default(),
        None => reference.as_str(),
    };
    path.trim_start_matches('/').to_string()
}

/// Directory of uploaded images
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if needed
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Write one file and return its stored file name
    pub async fn save(&self, file: &UploadedFile, naming: FileNaming) -> ApiResult<String> {
        let name = naming.file_name(&file.file_name);
        let write = async {
            self.prepare().await?;
            tokio::fs::write(self.root.join(&name), &file.bytes).await
        };
        write
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to store upload {}: {}", name, e)))?;

        tracing::debug!(file = %name, bytes = file.bytes.len(), "Stored upload");
        Ok(name)
    }

    /// Write several files; on failure the ones already written are removed
    pub async fn save_all(
        &self,
        files: &[UploadedFile],
        naming: FileNaming,
    ) -> ApiResult<Vec<String>> {
        let mut names = Vec::with_capacity(files.len());
        for file in files {
            match self.save(file, naming).await {
                Ok(name) => names.push(name),
                Err(e) => {
                    self.remove_detached(names.iter().map(|n| listing_image_path(n)));
                    return Err(e);
                }
            }
        }
        Ok(names)
    }

    /// Map a stored path (`uploads/x`, `/uploads/x`) to a file in this
    /// directory. Anything else, including traversal attempts, is `None`.
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        let stored = stored.replace('\\', "/");
        let name = stored.trim_start_matches('/').strip_prefix("uploads/")?;
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return None;
        }
        Some(self.root.join(name))
    }

    /// Remove files on a detached task
    pub fn remove_detached<I, S>(&self, stored: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths: Vec<PathBuf> = stored
            .into_iter()
            .filter_map(|s| self.resolve(s.as_ref()))
            .collect();
        if paths.is_empty() {
            return;
        }

        tokio::spawn(async move {
            for path in paths {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => tracing::debug!(path = %path.display(), "Removed image file"),
                    Err(e) => tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to remove image file"
                    ),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_naming_keeps_base_and_extension() {
        let name = FileNaming::Original.file_name("my  john deere.png");
        assert!(name.starts_with("my_john_deere-"));
        assert!(name.ends_with(".png"));

        let name = FileNaming::Original.file_name("../../etc/passwd");
        assert!(name.starts_with("passwd-"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_prefixed_naming() {
        let name = FileNaming::Prefixed("image").file_name("whatever.webp");
        assert!(name.starts_with("image-"));
        assert!(name.ends_with(".webp"));
    }

    #[test]
    fn test_stored_path_accepts_urls() {
        assert_eq!(stored_path("uploads/a.png"), "uploads/a.png");
        assert_eq!(stored_path("http://localhost:5000/uploads/a.png"), "uploads/a.png");
        assert_eq!(stored_path("/uploads/a.png"), "uploads/a.png");
        assert_eq!(stored_path("uploads\\a.png"), "uploads/a.png");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = ImageStore::new("/srv/uploads");
        assert_eq!(
            store.resolve("uploads/a.png"),
            Some(PathBuf::from("/srv/uploads/a.png"))
        );
        assert_eq!(
            store.resolve("/uploads/a.png"),
            Some(PathBuf::from("/srv/uploads/a.png"))
        );
        assert_eq!(store.resolve("uploads/../secret"), None);
        assert_eq!(store.resolve("uploads/.."), None);
        assert_eq!(store.resolve("https://cdn.example.com/a.png"), None);
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));
        let file = UploadedFile {
            file_name: "seed.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: b"JPEG".to_vec(),
        };

        let name = store.save(&file, FileNaming::Original).await.unwrap();
        let path = store.root().join(&name);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"JPEG");

        store.remove_detached([listing_image_path(&name)]);
        for _ in 0..50 {
            if !path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        store.remove_detached(["uploads/never-existed.png"]);
    }
}
