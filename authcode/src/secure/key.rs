use std::fmt;

use base32::Alphabet::Rfc4648;
use ring::rand::{SecureRandom, SystemRandom};

use super::base32::decode_base32;
use super::error::{DecodeError, TotpError};
use super::mac::HashFamily;

/// Shared TOTP secret. Key bytes never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn from_base32(input: &str) -> Result<Self, DecodeError> {
        decode_base32(input).map(Self)
    }

    /// Unpadded RFC 4648 rendering, suitable for typing into an authenticator app.
    pub fn to_base32(&self) -> String {
        base32::encode(Rfc4648 { padding: false }, &self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for SecretKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({} bytes)", self.0.len())
    }
}

/// Draw a fresh key from the OS random source, sized to `H`'s digest.
pub fn generate_key<H: HashFamily>() -> Result<SecretKey, TotpError> {
    random_key(<H as hmac::digest::Digest>::output_size())
}

pub(crate) fn random_key(len: usize) -> Result<SecretKey, TotpError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| TotpError::Entropy)?;
    tracing::debug!(key.len = len, "generated secret key");
    Ok(SecretKey(bytes))
}
