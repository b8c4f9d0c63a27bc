use hmac::{
    Mac, SimpleHmac,
    digest::{Digest, Output, core_api::BlockSizeUser},
};
use serde::Deserialize;
pub use sha1::Sha1;
pub use sha2::{Sha256, Sha512};

use super::error::TotpError;

/// A hash function usable as the HMAC primitive of a TOTP.
pub trait HashFamily: Digest + BlockSizeUser {
    const NAME: &'static str;
}

impl HashFamily for Sha1 {
    const NAME: &'static str = "SHA1";
}

impl HashFamily for Sha256 {
    const NAME: &'static str = "SHA256";
}

impl HashFamily for Sha512 {
    const NAME: &'static str = "SHA512";
}

/// HMAC output over `H`, exactly `H`'s digest size.
pub type HmacDigest<H> = Output<SimpleHmac<H>>;

pub fn hmac<H: HashFamily>(key: &[u8], message: &[u8]) -> Result<HmacDigest<H>, TotpError> {
    let mut mac = <SimpleHmac<H> as Mac>::new_from_slice(key)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes())
}

/// Hash family chosen at runtime, e.g. from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Sha1 => Sha1::NAME,
            Algorithm::Sha256 => Sha256::NAME,
            Algorithm::Sha512 => Sha512::NAME,
        }
    }

    pub fn digest_size(self) -> usize {
        match self {
            Algorithm::Sha1 => <Sha1 as Digest>::output_size(),
            Algorithm::Sha256 => <Sha256 as Digest>::output_size(),
            Algorithm::Sha512 => <Sha512 as Digest>::output_size(),
        }
    }

    pub fn hmac(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, TotpError> {
        let digest = match self {
            Algorithm::Sha1 => hmac::<Sha1>(key, message)?.to_vec(),
            Algorithm::Sha256 => hmac::<Sha256>(key, message)?.to_vec(),
            Algorithm::Sha512 => hmac::<Sha512>(key, message)?.to_vec(),
        };
        Ok(digest)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
