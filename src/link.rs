//! Ephemeral download links.
//!
//! A link is a URL-safe base64 encoding of
//! `{"file_url": <locator>, "expiry_time": <epoch seconds>}` valid for five
//! minutes from issuance. Links are not stored anywhere and can be redeemed
//! any number of times inside their window.
//!
//! By default the encoding is reversible and unsigned, so anyone who can
//! read the format can mint a link. Configuring a secret appends an
//! HMAC-SHA256 tag (`<payload>.<tag>`) that decoding checks.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::datetime::unix_seconds;
use crate::{Result, ShareboxError};

type HmacSha256 = Hmac<Sha256>;

/// How long a freshly encoded link stays redeemable.
pub const LINK_VALIDITY_SECS: i64 = 5 * 60;

/// Padded URL-safe alphabet on output; padding optional on input.
const LINK_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Validity window of a download link.
pub fn link_validity() -> Duration {
    Duration::seconds(LINK_VALIDITY_SECS)
}

/// Why a download link could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDefect {
    /// Not base64, or the bytes are not JSON.
    NotDecodable,
    /// JSON without a string `file_url` or a numeric `expiry_time`.
    MissingFields,
    /// Signature missing or wrong (signed codecs only).
    BadSignature,
}

#[derive(Serialize)]
struct LinkPayload<'a> {
    file_url: &'a str,
    expiry_time: f64,
}

/// Decoded contents of a download link.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLink {
    pub resource_locator: String,
    /// Expiry as float seconds since the Unix epoch.
    pub expires_at: f64,
}

impl DecodedLink {
    /// True once `now` is strictly past the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        unix_seconds(&now) > self.expires_at
    }
}

/// Encoder/decoder for download links.
#[derive(Clone)]
pub struct DownloadLinkCodec {
    signing_key: Option<Vec<u8>>,
}

impl DownloadLinkCodec {
    /// Codec producing plain, unsigned links.
    pub fn unsigned() -> Self {
        Self { signing_key: None }
    }

    /// Codec producing and requiring HMAC-signed links.
    pub fn signed(secret: impl AsRef<[u8]>) -> Self {
        Self {
            signing_key: Some(secret.as_ref().to_vec()),
        }
    }

    /// Signed when `secret` is non-empty, unsigned otherwise.
    pub fn from_secret(secret: &str) -> Self {
        if secret.is_empty() {
            Self::unsigned()
        } else {
            Self::signed(secret)
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Encode a link for `resource_locator` expiring five minutes after `now`.
    pub fn encode(&self, resource_locator: &str, now: DateTime<Utc>) -> String {
        let payload = LinkPayload {
            file_url: resource_locator,
            expiry_time: unix_seconds(&(now + link_validity())),
        };
        // Serializing a struct of a str and a finite f64 cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        let encoded = LINK_ENGINE.encode(json);

        match self.mac() {
            Some(mut mac) => {
                mac.update(encoded.as_bytes());
                let tag = LINK_ENGINE.encode(mac.finalize().into_bytes());
                format!("{encoded}.{tag}")
            }
            None => encoded,
        }
    }

    /// Decode a link without checking its expiry.
    pub fn decode(&self, opaque: &str) -> Result<DecodedLink> {
        let payload = self.verify(opaque)?;

        let bytes = LINK_ENGINE
            .decode(payload)
            .map_err(|_| ShareboxError::MalformedLink(LinkDefect::NotDecodable))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|_| ShareboxError::MalformedLink(LinkDefect::NotDecodable))?;

        let resource_locator = value
            .get("file_url")
            .and_then(|v| v.as_str())
            .ok_or(ShareboxError::MalformedLink(LinkDefect::MissingFields))?;
        let expires_at = value
            .get("expiry_time")
            .and_then(|v| v.as_f64())
            .ok_or(ShareboxError::MalformedLink(LinkDefect::MissingFields))?;

        Ok(DecodedLink {
            resource_locator: resource_locator.to_string(),
            expires_at,
        })
    }

    /// Decode a link and reject it with `LinkExpired` if `now` is past its window.
    pub fn decode_at(&self, opaque: &str, now: DateTime<Utc>) -> Result<DecodedLink> {
        let link = self.decode(opaque)?;
        if link.is_expired_at(now) {
            return Err(ShareboxError::LinkExpired);
        }
        Ok(link)
    }

    /// Strip and check the signature, returning the payload part.
    fn verify<'s>(&self, opaque: &'s str) -> Result<&'s str> {
        let Some(mut mac) = self.mac() else {
            return Ok(opaque);
        };

        let (payload, tag) = opaque
            .split_once('.')
            .ok_or(ShareboxError::MalformedLink(LinkDefect::BadSignature))?;
        let tag = LINK_ENGINE
            .decode(tag)
            .map_err(|_| ShareboxError::MalformedLink(LinkDefect::BadSignature))?;

        mac.update(payload.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| ShareboxError::MalformedLink(LinkDefect::BadSignature))?;
        Ok(payload)
    }

    fn mac(&self) -> Option<HmacSha256> {
        self.signing_key
            .as_deref()
            .and_then(|key| HmacSha256::new_from_slice(key).ok())
    }
}

impl Default for DownloadLinkCodec {
    fn default() -> Self {
        Self::unsigned()
    }
}

impl std::fmt::Debug for DownloadLinkCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadLinkCodec")
            .field("signed", &self.is_signed())
            .finish()
    }
}
