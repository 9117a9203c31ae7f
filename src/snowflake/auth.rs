//! Key-pair authentication.
//!
//! Private keys are PKCS#8 PEM files, optionally encrypted. The SQL API
//! accepts a short-lived RS256 JWT whose issuer embeds the SHA-256
//! fingerprint of the public key.

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::collector::ConnectionError;

/// Token lifetime accepted by Snowflake.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Read an RSA private key from a PKCS#8 PEM file.
///
/// With `password`, the file must hold an encrypted PKCS#8 key.
pub fn load_private_key(
    path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<RsaPrivateKey, ConnectionError> {
    let path = path.as_ref();
    let pem = std::fs::read_to_string(path).map_err(|e| {
        ConnectionError::Auth(format!(
            "failed to read private key file {}: {e}",
            path.display()
        ))
    })?;

    let key = match password {
        Some(password) => RsaPrivateKey::from_pkcs8_encrypted_pem(&pem, password.as_bytes()),
        None => RsaPrivateKey::from_pkcs8_pem(&pem),
    };

    key.map_err(|e| {
        ConnectionError::Auth(format!(
            "failed to parse RSA private key {}: {e}",
            path.display()
        ))
    })
}

/// Encode a private key for the `privateKey` connection string parameter.
pub fn encode_private_key(key: &RsaPrivateKey) -> Result<String, ConnectionError> {
    let der = key
        .to_pkcs8_der()
        .map_err(|e| ConnectionError::Auth(format!("failed to encode private key: {e}")))?;
    Ok(URL_SAFE.encode(der.as_bytes()))
}

/// Inverse of [`encode_private_key`].
pub fn decode_private_key(encoded: &str) -> Result<RsaPrivateKey, ConnectionError> {
    let der = URL_SAFE
        .decode(encoded)
        .map_err(|e| ConnectionError::Auth(format!("invalid private key encoding: {e}")))?;
    RsaPrivateKey::from_pkcs8_der(&der)
        .map_err(|e| ConnectionError::Auth(format!("invalid private key: {e}")))
}

/// `SHA256:<base64>` fingerprint of the public half of `key`.
pub fn public_key_fingerprint(key: &RsaPrivateKey) -> Result<String, ConnectionError> {
    let der = key
        .to_public_key()
        .to_public_key_der()
        .map_err(|e| ConnectionError::Auth(format!("failed to encode public key: {e}")))?;
    let digest = Sha256::digest(der.as_bytes());
    Ok(format!("SHA256:{}", STANDARD.encode(digest)))
}

/// Account part used in JWT claims: the locator before any region suffix.
fn account_locator(account: &str) -> String {
    account
        .split('.')
        .next()
        .unwrap_or(account)
        .to_uppercase()
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues key-pair JWTs for one user.
pub struct KeyPairAuth {
    subject: String,
    issuer: String,
    key: EncodingKey,
    lifetime: Duration,
}

impl KeyPairAuth {
    pub fn new(account: &str, user: &str, key: &RsaPrivateKey) -> Result<Self, ConnectionError> {
        let subject = format!("{}.{}", account_locator(account), user.to_uppercase());
        let issuer = format!("{subject}.{}", public_key_fingerprint(key)?);

        let pkcs1 = key
            .to_pkcs1_der()
            .map_err(|e| ConnectionError::Auth(format!("failed to encode private key: {e}")))?;
        let key = EncodingKey::from_rsa_der(pkcs1.as_bytes());

        Ok(Self {
            subject,
            issuer,
            key,
            lifetime: TOKEN_LIFETIME,
        })
    }

    /// `ACCOUNT.USER` qualified name carried in `sub`.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `ACCOUNT.USER.SHA256:<fingerprint>` carried in `iss`.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign a fresh token valid from now.
    pub fn token(&self) -> Result<String, ConnectionError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            iat: now,
            exp: now + self.lifetime.as_secs() as i64,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| ConnectionError::Auth(format!("failed to sign token: {e}")))
    }
}

impl std::fmt::Debug for KeyPairAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairAuth")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation};
    use rsa::pkcs1::EncodeRsaPublicKey;

    const FINGERPRINT: &str = "SHA256:rfySLqGKzGk3RpHvfG0U6llf67BU9aknNhF8b2d8mDg=";

    fn testdata(name: &str) -> String {
        format!("{}/tests/testdata/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn test_load_unencrypted_key() {
        let key = load_private_key(testdata("rsa_key.p8"), None).unwrap();
        assert_eq!(public_key_fingerprint(&key).unwrap(), FINGERPRINT);
    }

    #[test]
    fn test_load_encrypted_key() {
        let key =
            load_private_key(testdata("rsa_key_encrypted.p8"), Some("test-passphrase")).unwrap();
        assert_eq!(public_key_fingerprint(&key).unwrap(), FINGERPRINT);
    }

    #[test]
    fn test_load_encrypted_key_wrong_password() {
        let err = load_private_key(testdata("rsa_key_encrypted.p8"), Some("nope")).unwrap_err();
        assert!(matches!(err, ConnectionError::Auth(_)));
    }

    #[test]
    fn test_load_non_rsa_key() {
        assert!(load_private_key(testdata("ec_key.p8"), None).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_private_key(testdata("does_not_exist.p8"), None).unwrap_err();
        assert!(err.to_string().contains("failed to read private key file"));
    }

    #[test]
    fn test_encode_decode_private_key() {
        let key = load_private_key(testdata("rsa_key.p8"), None).unwrap();
        let encoded = encode_private_key(&key).unwrap();
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(decode_private_key(&encoded).unwrap(), key);
    }

    #[test]
    fn test_account_locator() {
        assert_eq!(account_locator("xy12345.us-east-2.aws"), "XY12345");
        assert_eq!(account_locator("myorg-account"), "MYORG-ACCOUNT");
    }

    #[test]
    fn test_token_claims() {
        let key = load_private_key(testdata("rsa_key.p8"), None).unwrap();
        let auth = KeyPairAuth::new("xy12345.us-east-2.aws", "svc_user", &key).unwrap();
        assert_eq!(auth.subject(), "XY12345.SVC_USER");
        assert_eq!(auth.issuer(), format!("XY12345.SVC_USER.{FINGERPRINT}"));

        let token = auth.token().unwrap();
        let public = key.to_public_key().to_pkcs1_der().unwrap();
        let decoded = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_rsa_der(public.as_bytes()),
            &Validation::new(Algorithm::RS256),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, "XY12345.SVC_USER");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
    }
}
