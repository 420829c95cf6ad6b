//! VAPID sender credentials (RFC 8292).
//!
//! Loaded once at startup and shared read-only by the transport.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::config::VapidConfig;

#[derive(Debug, Error)]
pub enum VapidError {
    #[error("VAPID {0} key is not configured")]
    Missing(&'static str),

    #[error("VAPID {field} key is not valid base64url: {source}")]
    InvalidBase64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("VAPID public key must be a 65-byte uncompressed P-256 point")]
    InvalidPublicKey,

    #[error("VAPID private key must be a 32-byte P-256 scalar, got {0} bytes")]
    InvalidPrivateKey(usize),

    #[error("VAPID public key does not belong to the private key")]
    KeyMismatch,

    #[error("VAPID subject must be a mailto: or https: URL, got {0:?}")]
    InvalidSubject(String),
}

/// Validated VAPID keypair and subject claim.
///
/// The private key is kept as the raw 32-byte scalar (base64url), the format
/// `web_push::VapidSignatureBuilder::from_base64` expects.
pub struct VapidCredentials {
    private_key_b64: String,
    public_key_b64: String,
    subject: String,
}

impl std::fmt::Debug for VapidCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidCredentials")
            .field("public_key", &self.public_key_b64)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl VapidCredentials {
    /// Validate configured keys: both present, well-formed, and a matching pair.
    pub fn from_config(config: &VapidConfig) -> Result<Self, VapidError> {
        let public_key_b64 = config.public.trim();
        let private_key_b64 = config.private.trim();
        let subject = config.subject.trim();

        if public_key_b64.is_empty() {
            return Err(VapidError::Missing("public"));
        }
        if private_key_b64.is_empty() {
            return Err(VapidError::Missing("private"));
        }
        if !(subject.starts_with("mailto:") || subject.starts_with("https:")) {
            return Err(VapidError::InvalidSubject(subject.to_string()));
        }

        let public_bytes = BASE64URL
            .decode(public_key_b64)
            .map_err(|source| VapidError::InvalidBase64 { field: "public", source })?;
        if public_bytes.len() != 65 || public_bytes[0] != 0x04 {
            return Err(VapidError::InvalidPublicKey);
        }

        let private_bytes = BASE64URL
            .decode(private_key_b64)
            .map_err(|source| VapidError::InvalidBase64 { field: "private", source })?;
        if private_bytes.len() != 32 {
            return Err(VapidError::InvalidPrivateKey(private_bytes.len()));
        }
        let signing_key = SigningKey::from_bytes(private_bytes.as_slice().into())
            .map_err(|_| VapidError::InvalidPrivateKey(private_bytes.len()))?;

        let derived = signing_key.verifying_key().to_encoded_point(false);
        if derived.as_bytes() != public_bytes.as_slice() {
            return Err(VapidError::KeyMismatch);
        }

        Ok(Self {
            private_key_b64: private_key_b64.to_string(),
            public_key_b64: public_key_b64.to_string(),
            subject: subject.to_string(),
        })
    }

    /// Generate a fresh keypair.
    pub fn generate(subject: impl Into<String>) -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_point = signing_key.verifying_key().to_encoded_point(false);

        Self {
            private_key_b64: BASE64URL.encode(&signing_key.to_bytes()[..]),
            public_key_b64: BASE64URL.encode(public_point.as_bytes()),
            subject: subject.into(),
        }
    }

    /// Base64url public key, the browser's `applicationServerKey`.
    pub fn public_key_base64url(&self) -> &str {
        &self.public_key_b64
    }

    pub fn private_key_base64url(&self) -> &str {
        &self.private_key_b64
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(keys: &VapidCredentials) -> VapidConfig {
        VapidConfig {
            public: keys.public_key_base64url().to_string(),
            private: keys.private_key_base64url().to_string(),
            subject: "mailto:ops@example.com".to_string(),
        }
    }

    #[test]
    fn test_generated_keys_validate() {
        let keys = VapidCredentials::generate("mailto:ops@example.com");
        let loaded = VapidCredentials::from_config(&config_for(&keys)).expect("valid keys");
        assert_eq!(loaded.public_key_base64url(), keys.public_key_base64url());
        assert_eq!(loaded.subject(), "mailto:ops@example.com");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let keys = VapidCredentials::generate("mailto:ops@example.com");
        let mut config = config_for(&keys);
        config.public = format!("  {}\n", config.public);
        config.private = format!("{} ", config.private);
        assert!(VapidCredentials::from_config(&config).is_ok());
    }

    #[test]
    fn test_missing_keys() {
        let err = VapidCredentials::from_config(&VapidConfig::default()).unwrap_err();
        assert!(matches!(err, VapidError::Missing("public")));
    }

    #[test]
    fn test_mismatched_pair_rejected() {
        let a = VapidCredentials::generate("mailto:ops@example.com");
        let b = VapidCredentials::generate("mailto:ops@example.com");
        let config = VapidConfig {
            public: a.public_key_base64url().to_string(),
            private: b.private_key_base64url().to_string(),
            subject: "mailto:ops@example.com".to_string(),
        };
        assert!(matches!(
            VapidCredentials::from_config(&config),
            Err(VapidError::KeyMismatch)
        ));
    }

    #[test]
    fn test_malformed_keys_rejected() {
        let keys = VapidCredentials::generate("mailto:ops@example.com");
        let mut config = config_for(&keys);
        config.public = "not base64!".to_string();
        assert!(matches!(
            VapidCredentials::from_config(&config),
            Err(VapidError::InvalidBase64 { field: "public", .. })
        ));

        let mut config = config_for(&keys);
        config.private = BASE64URL.encode([7u8; 16]);
        assert!(matches!(
            VapidCredentials::from_config(&config),
            Err(VapidError::InvalidPrivateKey(16))
        ));
    }

    #[test]
    fn test_subject_must_be_contact_url() {
        let keys = VapidCredentials::generate("mailto:ops@example.com");
        let mut config = config_for(&keys);
        config.subject = "ops@example.com".to_string();
        assert!(matches!(
            VapidCredentials::from_config(&config),
            Err(VapidError::InvalidSubject(_))
        ));
    }
}
