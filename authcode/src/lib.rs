//! Time-based one-time passwords (RFC 6238) in the Google Authenticator
//! convention, computed from a Base32 shared secret.

pub mod env;
pub mod instrument;
pub mod secure;
