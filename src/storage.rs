use crate::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where uploads and generated plots live on disk
///
/// Every handler receives the same `Storage` through the router state, so
/// tests can point it at a temporary directory.
#[derive(Clone, Debug)]
pub struct Storage {
    upload_root: PathBuf,
    output_root: PathBuf,
}

/// Result of storing one uploaded file
#[derive(Clone, Debug)]
pub struct UploadHandle {
    pub upload_id: String,
    pub original_filename: String,
    pub path: PathBuf,
}

impl Storage {
    /// Create the storage roots if they don't exist
    pub fn new(
        upload_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> std::io::Result<Self> {
        let storage = Storage {
            upload_root: upload_root.into(),
            output_root: output_root.into(),
        };
        fs::create_dir_all(&storage.upload_root)?;
        fs::create_dir_all(&storage.output_root)?;
        Ok(storage)
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Persist an uploaded file under a fresh upload id
    ///
    /// The file is stored as `{upload_id}_{original filename}` where the
    /// original name is reduced to its last path component.
    pub fn save_upload(&self, original_filename: &str, bytes: &[u8]) -> Result<UploadHandle, AppError> {
        let original_filename = sanitize_filename(original_filename).ok_or(AppError::EmptyFilename)?;
        let upload_id = Uuid::new_v4().to_string();
        let path = self.upload_path(&upload_id, &original_filename)?;
        fs::write(&path, bytes)?;

        Ok(UploadHandle {
            upload_id,
            original_filename,
            path,
        })
    }

    pub fn upload_path(&self, upload_id: &str, filename: &str) -> Result<PathBuf, AppError> {
        let upload_id = validate_upload_id(upload_id)?;
        let filename = sanitize_filename(filename)
            .ok_or_else(|| AppError::InvalidRequest("filename is empty".to_string()))?;
        Ok(self.upload_root.join(format!("{}_{}", upload_id, filename)))
    }

    pub fn batch_dir(&self, upload_id: &str) -> Result<PathBuf, AppError> {
        let upload_id = validate_upload_id(upload_id)?;
        Ok(self.output_root.join(upload_id))
    }

    /// Empty the output batch of an upload, creating it if needed
    pub fn reset_batch(&self, upload_id: &str) -> Result<PathBuf, AppError> {
        let dir = self.batch_dir(upload_id)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn image_path(&self, upload_id: &str, image: &str) -> Result<PathBuf, AppError> {
        let image = sanitize_filename(image).ok_or(AppError::NotFound)?;
        Ok(self.batch_dir(upload_id)?.join(image))
    }

    pub fn archive_path(&self, archive: &str) -> Result<PathBuf, AppError> {
        let archive = sanitize_filename(archive).ok_or(AppError::NotFound)?;
        Ok(self.output_root.join(archive))
    }

    pub fn read_image(&self, upload_id: &str, image: &str) -> Result<(String, Vec<u8>), AppError> {
        let path = self.image_path(upload_id, image).map_err(|_| AppError::NotFound)?;
        read_existing(&path)
    }

    pub fn read_archive(&self, archive: &str) -> Result<(String, Vec<u8>), AppError> {
        let path = self.archive_path(archive)?;
        read_existing(&path)
    }
}

/// Reduce a client-supplied name to its last path component
///
/// Both `/` and `\` count as separators. Returns `None` when nothing usable
/// is left, e.g. for `""`, `".."` or `"dir/"`.
///
/// # Examples
/// ```
/// use boxplot_web::storage::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
/// assert_eq!(sanitize_filename("C:\\data\\plots.xlsx").as_deref(), Some("plots.xlsx"));
/// assert_eq!(sanitize_filename(".."), None);
/// ```
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    match base {
        "" | "." | ".." => None,
        base => Some(base.to_string()),
    }
}

fn validate_upload_id(upload_id: &str) -> Result<&str, AppError> {
    Uuid::parse_str(upload_id)
        .map(|_| upload_id)
        .map_err(|_| AppError::InvalidRequest(format!("invalid upload id: {}", upload_id)))
}

fn read_existing(path: &Path) -> Result<(String, Vec<u8>), AppError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(AppError::NotFound)?;

    match fs::read(path) {
        Ok(bytes) => Ok((name, bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("uploads"), dir.path().join("outputs")).unwrap();
        (dir, storage)
    }

    #[test]
    fn upload_is_keyed_by_id_and_name() {
        let (_dir, storage) = storage();
        let handle = storage.save_upload("../data.xlsx", b"bytes").unwrap();
        assert_eq!(handle.original_filename, "data.xlsx");
        assert_eq!(
            handle.path,
            storage
                .upload_root()
                .join(format!("{}_data.xlsx", handle.upload_id))
        );
        assert_eq!(fs::read(&handle.path).unwrap(), b"bytes");
    }

    #[test]
    fn empty_filename_is_rejected() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.save_upload("", b"x"),
            Err(AppError::EmptyFilename)
        ));
    }

    #[test]
    fn reset_batch_clears_previous_files() {
        let (_dir, storage) = storage();
        let id = Uuid::new_v4().to_string();
        let dir = storage.reset_batch(&id).unwrap();
        fs::write(dir.join("old.png"), b"old").unwrap();

        let dir = storage.reset_batch(&id).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn upload_id_cannot_traverse() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.batch_dir("../outside"),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn reads_are_confined_to_output_root() {
        let (_dir, storage) = storage();
        fs::write(storage.output_root().join("a.zip"), b"zip").unwrap();

        let (name, bytes) = storage.read_archive("../../a.zip").unwrap();
        assert_eq!(name, "a.zip");
        assert_eq!(bytes, b"zip");
        assert!(matches!(storage.read_archive("missing.zip"), Err(AppError::NotFound)));
    }
}
