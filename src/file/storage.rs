//! Physical file storage for sharebox.
//!
//! - UUID-based file naming
//! - Directory sharding by first 2 characters of UUID
//! - Save, load, and delete operations

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{Result, ShareboxError};

/// File storage service for managing physical files.
///
/// Files are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.docx
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890.xlsx
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Save content under a new UUID-based name and return that name.
    ///
    /// The extension of `original_name` is kept, lowercased.
    pub fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let stored_name = Self::generate_stored_name(original_name);
        let file_path = self.get_file_path(&stored_name)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, content)?;

        Ok(stored_name)
    }

    /// Load content from storage.
    pub fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let file_path = self.get_file_path(stored_name)?;

        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ShareboxError::NotFound("File".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file from storage.
    ///
    /// Returns `false` if it didn't exist.
    pub fn delete(&self, stored_name: &str) -> Result<bool> {
        let file_path = self.get_file_path(stored_name)?;

        match fs::remove_file(&file_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Full path for a stored name: `{base_path}/{shard}/{stored_name}`.
    ///
    /// Names that could escape the storage directory are rejected.
    pub fn get_file_path(&self, stored_name: &str) -> Result<PathBuf> {
        if !is_safe_stored_name(stored_name) {
            return Err(ShareboxError::NotFound("File".to_string()));
        }
        Ok(self
            .base_path
            .join(Self::get_shard(stored_name))
            .join(stored_name))
    }

    fn get_shard(stored_name: &str) -> &str {
        stored_name.get(..2).unwrap_or(stored_name)
    }

    /// Lowercased extension, or "bin" when there is none.
    fn extract_extension(filename: &str) -> String {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Generate a new UUID-based stored name with the extension of `original_name`.
    pub fn generate_stored_name(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }
}

/// A stored name is a single path component of ASCII alphanumerics,
/// `-`, `_` and `.`, not starting with a dot.
pub fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
