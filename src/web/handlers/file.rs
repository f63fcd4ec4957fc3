//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::auth::{policy, JwtClaims};
use crate::db::{User, UserRepository};
use crate::file::{base_name, check_extension, stored_name_from_locator, FileRepository, NewFile};
use crate::web::dto::{
    DownloadLinkResponse, FileEntry, FileListResponse, UploadResponse,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;
use crate::ShareboxError;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped, quotes and backslashes replaced in the
/// ASCII fallback, and non-ASCII names get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// Load the acting user fresh from the database.
///
/// Role and verification state are read from the store, not the token.
async fn current_user(state: &AppState, claims: &JwtClaims) -> Result<User, ApiError> {
    UserRepository::new(state.db.pool())
        .get_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))
}

fn multipart_error(e: MultipartError, max_upload_size: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(max_upload_size);
    }
    tracing::warn!("Failed to read multipart data: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

fn too_large(max_upload_size: u64) -> ApiError {
    ApiError::bad_request(format!(
        "File too large (max {}MB)",
        max_upload_size / 1024 / 1024
    ))
}

/// POST /api/upload/ - Upload a file (ops users only).
///
/// Multipart body with a `file` field.
#[utoipa::path(
    post,
    path = "/upload/",
    tag = "files",
    request_body(
        content = Vec<u8>,
        content_type = "multipart/form-data",
        description = "`file` field with a .pptx, .docx or .xlsx document"
    ),
    responses(
        (status = 201, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "Unsupported file type or file too large", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Only Ops Users can upload files.", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let user = current_user(&state, &claims).await?;
    policy::require_upload(Some(&user))?;

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.max_upload_size))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|s| base_name(s).to_string())
            .unwrap_or_default();
        let content = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_size))?;
        upload = Some((filename, content.to_vec()));
    }

    let (filename, content) = upload.ok_or_else(|| ApiError::bad_request("No file was submitted."))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("No file was submitted."));
    }
    if filename.chars().count() > crate::file::MAX_FILENAME_LENGTH {
        return Err(ApiError::bad_request("Filename is too long."));
    }

    check_extension(&filename, &state.allowed_extensions)?;

    if content.len() as u64 > state.max_upload_size {
        return Err(too_large(state.max_upload_size));
    }

    let stored_name = state.storage.save(&content, &filename)?;

    let file = FileRepository::new(state.db.pool())
        .create(&NewFile::new(
            &stored_name,
            &filename,
            content.len() as i64,
            user.id,
        ))
        .await;

    let file = match file {
        Ok(file) => file,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&stored_name) {
                tracing::warn!(error = %cleanup, stored_name = %stored_name, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(user_id = user.id, file_id = file.id, size = file.size, "File uploaded");

    Ok((StatusCode::CREATED, Json(UploadResponse::from_record(&file))))
}

/// GET /api/files/ - List visible files.
///
/// Ops users see their own uploads, verified client users see everything,
/// anyone else gets an empty list.
#[utoipa::path(
    get,
    path = "/files/",
    tag = "files",
    responses(
        (status = 200, description = "Visible files", body = FileListResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<FileListResponse>, ApiError> {
    let user = current_user(&state, &claims).await?;
    let filter = policy::can_list(Some(&user));

    let files = FileRepository::new(state.db.pool()).list(filter).await?;

    Ok(Json(FileListResponse {
        message: "Files listed successfully".to_string(),
        files: files.iter().map(FileEntry::from).collect(),
    }))
}

/// POST /api/files/{id}/download/ - Generate a five-minute download link.
#[utoipa::path(
    post,
    path = "/files/{id}/download/",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Link generated", body = DownloadLinkResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Only verified Client Users can download files.", body = ErrorBody),
        (status = 404, description = "File not found.", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn request_download_link(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<DownloadLinkResponse>, ApiError> {
    let user = current_user(&state, &claims).await?;

    let file = FileRepository::new(state.db.pool())
        .get_by_id(file_id)
        .await?
        .ok_or_else(|| ShareboxError::NotFound("File".to_string()))?;

    policy::require_download_link(Some(&user))?;

    let opaque = state.links.encode(&file.locator(), Utc::now());
    tracing::info!(user_id = user.id, file_id = file.id, "Download link generated");

    Ok(Json(DownloadLinkResponse {
        download_link: format!("/api/files/download/{opaque}/"),
        message: "Secure download link generated.".to_string(),
    }))
}

/// GET /api/files/download/{opaque}/ - Redeem a download link.
///
/// Checks, in order: the link decodes, it has not expired, the caller is a
/// verified client user, the file exists.
#[utoipa::path(
    get,
    path = "/files/download/{opaque}/",
    tag = "files",
    params(
        ("opaque" = String, Path, description = "Link value from the download link response")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Expired or invalid download link", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Unauthorized access.", body = ErrorBody),
        (status = 404, description = "File not found.", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn redeem_download_link(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(opaque): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let link = state.links.decode_at(&opaque, Utc::now())?;

    let user = current_user(&state, &claims).await?;
    policy::require_redeem(Some(&user))?;

    let stored_name = stored_name_from_locator(&link.resource_locator).ok_or_else(|| {
        tracing::warn!(user_id = user.id, locator = %link.resource_locator, "Refused download link locator");
        ShareboxError::NotFound("File".to_string())
    })?;

    let file = FileRepository::new(state.db.pool())
        .get_by_stored_name(stored_name)
        .await?
        .ok_or_else(|| ShareboxError::NotFound("File".to_string()))?;

    let content = state.storage.load(&file.stored_name)?;

    let content_type = mime_guess::from_path(&file.original_name)
        .first_or_octet_stream()
        .to_string();

    tracing::info!(user_id = user.id, file_id = file.id, "File downloaded");

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&file.original_name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_header_simple_ascii() {
        let result = content_disposition_header("report.docx");
        assert_eq!(result, "attachment; filename=\"report.docx\"");
    }

    #[test]
    fn test_content_disposition_header_with_spaces() {
        let result = content_disposition_header("Q3 report.docx");
        assert_eq!(result, "attachment; filename=\"Q3 report.docx\"");
    }

    #[test]
    fn test_content_disposition_header_non_ascii() {
        let result = content_disposition_header("日本語ファイル.xlsx");
        assert!(result.starts_with("attachment; filename=\""));
        assert!(result.contains("filename*=UTF-8''"));
        assert!(result.contains("%E6%97%A5%E6%9C%AC%E8%AA%9E"));
    }

    #[test]
    fn test_content_disposition_header_double_quote() {
        let result = content_disposition_header("test\"file.pptx");
        assert!(result.contains("filename=\"test_file.pptx\""));
        assert!(result.contains("%22"));
    }

    #[test]
    fn test_content_disposition_header_control_characters() {
        let result = content_disposition_header("file\"\r\nX-Evil: header\r\n\r\n<script>.docx");
        assert!(!result.contains('\r'));
        assert!(!result.contains('\n'));
        assert!(result.starts_with("attachment; filename="));
    }

    #[test]
    fn test_too_large_message() {
        let err = too_large(25 * 1024 * 1024);
        assert_eq!(err.message(), "File too large (max 25MB)");
    }
}
