//! Access policy for sharebox.
//!
//! Pure predicates over the acting user's role and verification state.
//! `None` stands for an unauthenticated caller.

use crate::db::{Role, User};
use crate::{Result, ShareboxError};

/// Message for upload attempts by anyone but ops users.
pub const UPLOAD_DENIED: &str = "Only Ops Users can upload files.";

/// Message for link requests by anyone but verified client users.
pub const DOWNLOAD_LINK_DENIED: &str = "Only verified Client Users can download files.";

/// Message for link redemption by anyone but verified client users.
pub const REDEEM_DENIED: &str = "Unauthorized access.";

/// Which files a caller may see in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    /// Only files uploaded by this user.
    OwnedBy(i64),
    /// Every file.
    All,
    /// An empty listing.
    Nothing,
}

/// Ops users may upload.
pub fn can_upload(user: Option<&User>) -> bool {
    matches!(user, Some(u) if u.role == Role::Ops)
}

/// Listing scope: ops see their own uploads, verified clients see all,
/// everyone else sees nothing.
pub fn can_list(user: Option<&User>) -> FileFilter {
    match user {
        Some(u) if u.role == Role::Ops => FileFilter::OwnedBy(u.id),
        Some(u) if u.role == Role::Client && u.is_verified => FileFilter::All,
        _ => FileFilter::Nothing,
    }
}

/// Verified client users may request download links.
pub fn can_request_download_link(user: Option<&User>) -> bool {
    matches!(user, Some(u) if u.role == Role::Client && u.is_verified)
}

/// Redemption re-checks the same predicate against the presenting user.
pub fn can_redeem_download_link(user: Option<&User>) -> bool {
    can_request_download_link(user)
}

/// `Forbidden` unless [`can_upload`] holds.
pub fn require_upload(user: Option<&User>) -> Result<()> {
    if can_upload(user) {
        Ok(())
    } else {
        Err(ShareboxError::Forbidden(UPLOAD_DENIED.to_string()))
    }
}

/// `Forbidden` unless [`can_request_download_link`] holds.
pub fn require_download_link(user: Option<&User>) -> Result<()> {
    if can_request_download_link(user) {
        Ok(())
    } else {
        Err(ShareboxError::Forbidden(DOWNLOAD_LINK_DENIED.to_string()))
    }
}

/// `Forbidden` unless [`can_redeem_download_link`] holds.
pub fn require_redeem(user: Option<&User>) -> Result<()> {
    if can_redeem_download_link(user) {
        Ok(())
    } else {
        Err(ShareboxError::Forbidden(REDEEM_DENIED.to_string()))
    }
}
