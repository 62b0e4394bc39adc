use crate::config::SigningCredentials;
use crate::errors::GsError;
use common::grant::{GrantClaims, GRANT_ALGORITHM};
use common::secret::ExposeSecret;
use jsonwebtoken::{encode, EncodingKey, Header};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::instrument;

/// Sign grant claims with the configured HMAC secret.
///
/// The header carries `kid` so verifiers can pick the right secret during
/// key rotation.
#[instrument(skip_all)]
pub fn sign_grant(claims: &GrantClaims, signing: &SigningCredentials) -> Result<String, GsError> {
    let secret = signing.secret.expose_secret();
    if secret.is_empty() {
        return Err(GsError::Misconfigured);
    }

    let mut header = Header::new(GRANT_ALGORITHM);
    header.typ = Some("JWT".to_string());
    header.kid = Some(signing.key_id.clone());

    encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| GsError::Crypto(format!("Grant signing operation failed: {e}")))
}

/// Generate cryptographically secure random bytes.
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, GsError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| GsError::Crypto(format!("Random generation failed: {e}")))?;
    Ok(bytes)
}

/// Random lowercase hex suffix of `bytes * 2` characters.
pub fn random_suffix(bytes: usize) -> Result<String, GsError> {
    generate_random_bytes(bytes).map(hex::encode)
}
