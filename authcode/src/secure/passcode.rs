use std::fmt;

use serde::Deserialize;

use super::error::TotpError;

/// Number of decimal digits in a passcode, 1 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub struct Digits(u32);

impl Digits {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 9;

    pub fn new(digits: u32) -> Result<Self, TotpError> {
        if !(Self::MIN..=Self::MAX).contains(&digits) {
            return Err(TotpError::Digits(digits));
        }
        Ok(Self(digits))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn modulus(self) -> u32 {
        10u32.pow(self.0)
    }
}

impl Default for Digits {
    fn default() -> Self {
        Self(6)
    }
}

impl TryFrom<u32> for Digits {
    type Error = TotpError;

    fn try_from(digits: u32) -> Result<Self, Self::Error> {
        Self::new(digits)
    }
}

/// A zero-padded decimal one-time password.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Passcode(String);

impl Passcode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passcode(******)")
    }
}

impl PartialEq<str> for Passcode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Passcode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// RFC 4226 dynamic truncation: 31 bits read at the offset named by the low
/// nibble of the last digest byte.
pub fn truncate(digest: &[u8]) -> Result<u32, TotpError> {
    let last = digest.last().copied().unwrap_or_default();
    let offset = (last & 0x0f) as usize;
    let window = digest
        .get(offset..offset + 4)
        .ok_or(TotpError::ShortDigest {
            len: digest.len(),
            required: offset + 4,
        })?;

    Ok(((u32::from(window[0]) & 0x7f) << 24)
        | (u32::from(window[1]) << 16)
        | (u32::from(window[2]) << 8)
        | u32::from(window[3]))
}

pub fn format_passcode(digest: &[u8], digits: Digits) -> Result<Passcode, TotpError> {
    let otp = truncate(digest)? % digits.modulus();
    Ok(Passcode(format!(
        "{:0width$}",
        otp,
        width = digits.get() as usize
    )))
}
