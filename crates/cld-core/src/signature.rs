//! Request signing.
//!
//! String to sign: non-empty parameters sorted by name, rendered `key=value`
//! (lists joined with `,`), joined with `&`, then the API secret appended.
//! The signature is the lowercase hex SHA-1 of that string.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::config::Configuration;
use crate::error::{CloudinaryError, Result};
use crate::params::Params;

/// Parameters that travel with a request but are never part of the signature.
pub const UNSIGNED_KEYS: [&str; 6] = [
    "api_key",
    "cloud_name",
    "file",
    "resource_type",
    "signature",
    "timeout",
];

/// A signature produced elsewhere (e.g. by a backend holding the secret).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSignature {
    pub signature: String,
    pub timestamp: i64,
}

impl ExternalSignature {
    pub fn new(signature: impl Into<String>, timestamp: i64) -> Self {
        Self {
            signature: signature.into(),
            timestamp,
        }
    }
}

/// The canonical string fed to the digest, without the secret.
pub fn string_to_sign(params: &Params) -> String {
    params
        .iter()
        .filter(|(key, _)| !UNSIGNED_KEYS.contains(key))
        .filter_map(|(key, value)| value.to_signable().map(|v| format!("{}={}", key, v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// SHA-1 signature of `params` with `api_secret`.
pub fn sign(params: &Params, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Outgoing parameters for a signed call: the caller's parameters plus
/// `timestamp`, `signature` and `api_key`.
#[tracing::instrument(skip(params, config), fields(cloud_name = %config.cloud_name()))]
pub fn sign_request(params: &Params, config: &Configuration, timestamp: i64) -> Result<Params> {
    let (api_key, api_secret) = config.require_credentials()?;

    let mut signed = params.clone();
    signed.insert("timestamp", timestamp);
    let signature = sign(&signed, api_secret);
    signed.insert("signature", signature);
    signed.insert("api_key", api_key);

    tracing::debug!(param_count = signed.len(), "Signed request parameters");
    Ok(signed)
}

/// Same as [`sign_request`] with a signature computed elsewhere. Only the
/// API key is read from the configuration.
pub fn apply_external_signature(
    params: &Params,
    config: &Configuration,
    external: &ExternalSignature,
) -> Result<Params> {
    config.validate()?;
    let api_key = config
        .api_key()
        .ok_or_else(|| CloudinaryError::config("Must supply api_key"))?;

    let mut signed = params.clone();
    signed.insert("timestamp", external.timestamp);
    signed.insert("signature", external.signature.as_str());
    signed.insert("api_key", api_key);
    Ok(signed)
}

/// Parameters for an unsigned upload: no credentials, authorized by the preset.
pub fn unsigned_request(params: &Params, upload_preset: &str) -> Params {
    let mut unsigned = params.clone();
    unsigned.insert("upload_preset", upload_preset);
    unsigned
}

/// Current unix time in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Signature component of a signed delivery URL (the part between `s--` and `--`).
pub fn url_signature(to_sign: &str, api_secret: &str, long: bool) -> String {
    let input = format!("{}{}", to_sign, api_secret);
    if long {
        let digest = Sha256::digest(input.as_bytes());
        let mut encoded = URL_SAFE.encode(digest);
        encoded.truncate(32);
        encoded
    } else {
        let digest = Sha1::digest(input.as_bytes());
        let mut encoded = URL_SAFE.encode(digest);
        encoded.truncate(8);
        encoded
    }
}
