mod base32;
mod counter;
mod error;
mod key;
mod mac;
mod passcode;
mod totp;

pub use self::base32::decode_base32;
pub use counter::{TimeStep, counter_bytes};
pub use error::{DecodeError, Result, TotpError};
pub use key::{SecretKey, generate_key};
pub use mac::{Algorithm, HashFamily, HmacDigest, Sha1, Sha256, Sha512, hmac};
pub use passcode::{Digits, Passcode, format_passcode, truncate};
pub use totp::{
    MAX_SKEW, Totp, generate_code, generate_code_at, generate_hotp, google_authenticator_code,
    google_authenticator_code_at, time_left, time_left_at, validate_code, validate_code_at,
    validate_code_with_skew, validate_code_with_skew_at,
};
