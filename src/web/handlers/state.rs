//! Shared handler state.

use std::sync::Arc;

use crate::auth::SessionIssuer;
use crate::config::{Config, MailConfig};
use crate::db::Database;
use crate::file::FileStorage;
use crate::link::DownloadLinkCodec;
use crate::mail::{LogMailer, MailSender, SmtpMailer};
use crate::Result;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SharedDatabase,
    pub sessions: SessionIssuer,
    pub links: DownloadLinkCodec,
    pub storage: FileStorage,
    pub mailer: Arc<dyn MailSender>,
    /// Public base URL used in verification mails.
    pub backend_url: String,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// Accepted upload extensions, lowercase without the dot.
    pub allowed_extensions: Vec<String>,
}

impl AppState {
    /// Build the state from configuration, opening file storage.
    pub fn from_config(
        config: &Config,
        db: SharedDatabase,
        mailer: Arc<dyn MailSender>,
    ) -> Result<Self> {
        let storage = FileStorage::new(&config.files.storage_path)?;
        tracing::info!("File storage initialized at: {}", config.files.storage_path);

        let links = DownloadLinkCodec::from_secret(&config.web.download_link_secret);
        if links.is_signed() {
            tracing::info!("Download links are HMAC-signed");
        }

        Ok(Self {
            db,
            sessions: SessionIssuer::new(
                &config.web.jwt_secret,
                config.web.jwt_access_token_expiry_secs,
                config.web.jwt_refresh_token_expiry_days,
            ),
            links,
            storage,
            mailer,
            backend_url: config.web.backend_url.trim_end_matches('/').to_string(),
            max_upload_size: config.files.max_upload_bytes(),
            allowed_extensions: config
                .files
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        })
    }
}

/// Mail sender for the configured transport: SMTP when enabled, log-only otherwise.
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn MailSender>> {
    if config.enabled {
        tracing::info!(host = %config.smtp_host, port = config.smtp_port, "SMTP mail enabled");
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        tracing::info!("Mail disabled; outgoing mail will be logged only");
        Ok(Arc::new(LogMailer))
    }
}
