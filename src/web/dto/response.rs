//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime::to_display;
use crate::file::FileRecord;

/// A bare message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Email verified successfully.")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Refresh token.
    pub refresh: String,
    /// Access token (JWT).
    pub access: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    #[schema(example = "Logged in as Client User.")]
    pub message: String,
}

/// Token refresh response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access: String,
    pub refresh: String,
    pub expires_in: u64,
}

/// Upload response.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "File uploaded successfully.")]
    pub message: String,
    pub file_name: String,
    /// Extension without the dot.
    #[schema(example = "docx")]
    pub file_type: String,
    /// Uploader's email.
    pub uploaded_by: String,
    #[schema(example = "2026-01-31 12:00:00")]
    pub upload_date: String,
}

impl UploadResponse {
    pub fn from_record(file: &FileRecord) -> Self {
        Self {
            message: "File uploaded successfully.".to_string(),
            file_name: file.original_name.clone(),
            file_type: file.file_type(),
            uploaded_by: file.uploader_email.clone(),
            upload_date: to_display(&file.upload_date),
        }
    }
}

/// One entry of a file listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileEntry {
    pub id: i64,
    /// Resource locator of the stored file.
    #[schema(example = "/media/uploads/ab12cd34-5678-90ab-cdef-123456789012.docx")]
    pub file: String,
    /// Original filename.
    pub file_name: String,
    /// Uploader's email.
    pub uploaded_by: String,
    pub upload_date: String,
}

impl From<&FileRecord> for FileEntry {
    fn from(file: &FileRecord) -> Self {
        Self {
            id: file.id,
            file: file.locator(),
            file_name: file.original_name.clone(),
            uploaded_by: file.uploader_email.clone(),
            upload_date: crate::datetime::to_rfc3339(&file.upload_date),
        }
    }
}

/// File listing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    #[schema(example = "Files listed successfully")]
    pub message: String,
    pub files: Vec<FileEntry>,
}

/// Download link response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadLinkResponse {
    /// Path to redeem, valid for five minutes.
    pub download_link: String,
    #[schema(example = "Secure download link generated.")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FileRecord {
        FileRecord {
            id: 7,
            stored_name: "ab12.docx".to_string(),
            original_name: "Q3 Report.docx".to_string(),
            size: 10,
            uploaded_by: 1,
            uploader_email: "ops@example.com".to_string(),
            upload_date: "2026-01-31 12:00:00.123456".to_string(),
        }
    }

    #[test]
    fn test_upload_response() {
        let resp = UploadResponse::from_record(&record());
        assert_eq!(resp.file_name, "Q3 Report.docx");
        assert_eq!(resp.file_type, "docx");
        assert_eq!(resp.uploaded_by, "ops@example.com");
        assert_eq!(resp.upload_date, "2026-01-31 12:00:00");
    }

    #[test]
    fn test_file_entry_uses_locator() {
        let entry = FileEntry::from(&record());
        assert_eq!(entry.id, 7);
        assert_eq!(entry.file, "/media/uploads/ab12.docx");
        assert_eq!(entry.uploaded_by, "ops@example.com");
    }

    #[test]
    fn test_message_response_serialization() {
        let json = serde_json::to_value(MessageResponse::new("User created.")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "User created."}));
    }
}
