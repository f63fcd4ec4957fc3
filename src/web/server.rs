//! Web server for sharebox.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::RefreshTokenRepository;
use crate::mail::MailSender;
use crate::{Result, ShareboxError};

use super::handlers::{mailer_from_config, AppState, SharedDatabase};
use super::middleware::{JwtState, RateLimitState};
use super::router::create_router;

/// Refresh-token cleanup interval: 1 hour.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limits: Arc<RateLimitState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server with the mail transport named in `config`.
    pub fn new(config: &Config, db: SharedDatabase) -> Result<Self> {
        let mailer = mailer_from_config(&config.mail)?;
        Self::with_mailer(config, db, mailer)
    }

    /// Create a new web server with an explicit mail sender.
    pub fn with_mailer(
        config: &Config,
        db: SharedDatabase,
        mailer: Arc<dyn MailSender>,
    ) -> Result<Self> {
        let web = &config.web;
        let addr = format!("{}:{}", web.host, web.port)
            .parse()
            .map_err(|e| ShareboxError::Config(format!("invalid web server address: {e}")))?;

        let app_state = AppState::from_config(config, db, mailer)?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state: Arc::new(JwtState::new(&web.jwt_secret)),
            rate_limits: Arc::new(
                RateLimitState::new(web.auth_rate_limit, web.api_rate_limit)
                    .trust_proxy_headers(web.trust_proxy_headers),
            ),
            cors_origins: web.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the full router without binding a socket.
    pub fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            self.jwt_state.clone(),
            self.rate_limits.clone(),
            &self.cors_origins,
        )
    }

    /// Start the token cleanup background task.
    ///
    /// Runs every hour and removes expired and revoked refresh tokens.
    /// Verification tokens are never swept.
    fn start_token_cleanup_task(db: SharedDatabase) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let refresh_repo = RefreshTokenRepository::new(db.pool());
                match refresh_repo.cleanup_expired(Utc::now()).await {
                    Ok(count) if count > 0 => {
                        tracing::info!(
                            deleted_count = count,
                            "Cleaned up expired/revoked refresh tokens"
                        );
                    }
                    Ok(_) => tracing::debug!("No expired refresh tokens to clean up"),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to cleanup refresh tokens");
                    }
                }
            }
        });
    }

    async fn bind(self) -> std::io::Result<(TcpListener, Router)> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;

        // Start background tasks after successful bind
        Self::start_token_cleanup_task(self.app_state.db.clone());
        self.rate_limits.clone().start_cleanup_task();
        tracing::info!("Token cleanup task started (runs every hour)");

        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router) = self.bind().await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
