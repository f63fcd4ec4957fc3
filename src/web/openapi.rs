//! OpenAPI document for the web API.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::dto::{
    DownloadLinkResponse, FileEntry, FileListResponse, LoginRequest, LoginResponse,
    MessageResponse, RefreshRequest, RefreshResponse, SignupRequest, UploadResponse,
};
use super::error::{ErrorBody, ErrorCode};
use super::handlers;
use crate::db::Role;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "sharebox",
        description = "File sharing between ops and client users"
    ),
    servers((url = "/api")),
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::verification::verify_email,
        handlers::file::upload_file,
        handlers::file::list_files,
        handlers::file::request_download_link,
        handlers::file::redeem_download_link,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            RefreshRequest,
            MessageResponse,
            LoginResponse,
            RefreshResponse,
            UploadResponse,
            FileEntry,
            FileListResponse,
            DownloadLinkResponse,
            ErrorBody,
            ErrorCode,
            Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, login and email verification"),
        (name = "files", description = "Upload, listing and download links")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
