//! File metadata types and repository.

use chrono::Utc;
use sqlx::FromRow;

use crate::auth::FileFilter;
use crate::datetime::to_db_timestamp;
use crate::db::DbPool;
use crate::file::storage::is_safe_stored_name;
use crate::{Result, ShareboxError};

/// URL prefix under which stored files are addressed.
pub const MEDIA_URL: &str = "/media/uploads/";

/// Resource locator for a stored name.
pub fn locator(stored_name: &str) -> String {
    format!("{MEDIA_URL}{stored_name}")
}

/// Stored name addressed by a locator, if it is a plain media locator.
///
/// Anything outside [`MEDIA_URL`], or with extra path components, gives `None`.
pub fn stored_name_from_locator(locator: &str) -> Option<&str> {
    let name = locator.strip_prefix(MEDIA_URL)?;
    is_safe_stored_name(name).then_some(name)
}

/// An uploaded file, joined with its uploader's email.
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: i64,
    /// Stored filename (UUID.ext format).
    pub stored_name: String,
    /// Filename as uploaded.
    pub original_name: String,
    /// Size in bytes.
    pub size: i64,
    pub uploaded_by: i64,
    pub uploader_email: String,
    pub upload_date: String,
}

impl FileRecord {
    pub fn locator(&self) -> String {
        locator(&self.stored_name)
    }

    /// Lowercased extension of the original name, without the dot.
    pub fn file_type(&self) -> String {
        std::path::Path::new(&self.original_name)
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }
}

/// Data for creating a new file entry.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub stored_name: String,
    pub original_name: String,
    pub size: i64,
    pub uploaded_by: i64,
}

impl NewFile {
    pub fn new(
        stored_name: impl Into<String>,
        original_name: impl Into<String>,
        size: i64,
        uploaded_by: i64,
    ) -> Self {
        Self {
            stored_name: stored_name.into(),
            original_name: original_name.into(),
            size,
            uploaded_by,
        }
    }
}

const FILE_SELECT: &str = "SELECT f.id, f.stored_name, f.original_name, f.size, f.uploaded_by,
            u.email AS uploader_email, f.upload_date
     FROM files f
     JOIN users u ON u.id = f.uploaded_by";

/// Repository for file records.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a file entry.
    pub async fn create(&self, new_file: &NewFile) -> Result<FileRecord> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (stored_name, original_name, size, uploaded_by, upload_date)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&new_file.stored_name)
        .bind(&new_file.original_name)
        .bind(new_file.size)
        .bind(new_file.uploaded_by)
        .bind(to_db_timestamp(&Utc::now()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| ShareboxError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ShareboxError::NotFound("File".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("{FILE_SELECT} WHERE f.id = ?");
        let result = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(result)
    }

    pub async fn get_by_stored_name(&self, stored_name: &str) -> Result<Option<FileRecord>> {
        let sql = format!("{FILE_SELECT} WHERE f.stored_name = ?");
        let result = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(stored_name)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List files visible under `filter`, newest first.
    pub async fn list(&self, filter: FileFilter) -> Result<Vec<FileRecord>> {
        let query = match filter {
            FileFilter::Nothing => return Ok(Vec::new()),
            FileFilter::All => {
                let sql = format!("{FILE_SELECT} ORDER BY f.upload_date DESC, f.id DESC");
                sqlx::query_as::<_, FileRecord>(&sql)
                    .fetch_all(self.pool)
                    .await
            }
            FileFilter::OwnedBy(user_id) => {
                let sql = format!(
                    "{FILE_SELECT} WHERE f.uploaded_by = ? ORDER BY f.upload_date DESC, f.id DESC"
                );
                sqlx::query_as::<_, FileRecord>(&sql)
                    .bind(user_id)
                    .fetch_all(self.pool)
                    .await
            }
        };

        query.map_err(|e| ShareboxError::Database(e.to_string()))
    }

}
