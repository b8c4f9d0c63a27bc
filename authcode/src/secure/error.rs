use std::time::SystemTimeError;

use hmac::digest::InvalidLength;
use thiserror::Error;

/// A Base32 secret contained a character outside the accepted alphabet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid base32 character {character:?} at position {position}")]
pub struct DecodeError {
    pub character: char,
    pub position: usize,
}

#[derive(Error, Debug)]
pub enum TotpError {
    #[error("invalid secret: {0}")]
    Decode(#[from] DecodeError),

    #[error("digits must be between 1 and 9, got {0}")]
    Digits(u32),

    #[error("time step must be greater than zero")]
    TimeStep,

    #[error("skew of {0} windows exceeds the supported maximum")]
    Skew(u64),

    #[error("system clock is set before the unix epoch")]
    Clock(#[from] SystemTimeError),

    #[error("secure random source unavailable")]
    Entropy,

    #[error("hmac rejected key: {0}")]
    KeyLength(#[from] InvalidLength),

    #[error("digest of {len} bytes is too short for truncation, need {required}")]
    ShortDigest { len: usize, required: usize },
}

pub type Result<T> = std::result::Result<T, TotpError>;
