use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use super::base32::decode_base32;
use super::counter::{TimeStep, counter_bytes};
use super::error::TotpError;
use super::key::{SecretKey, random_key};
use super::mac::{Algorithm, HashFamily, Sha1, hmac};
use super::passcode::{Digits, Passcode, format_passcode};
use crate::env::{self, ConfigError};

fn since_epoch() -> Result<Duration, TotpError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?)
}

fn now() -> Result<u64, TotpError> {
    Ok(since_epoch()?.as_secs())
}

/// RFC 4226 HOTP for an explicit counter.
pub fn generate_hotp<H: HashFamily>(
    key: &[u8],
    counter: u64,
    digits: Digits,
) -> Result<Passcode, TotpError> {
    let digest = hmac::<H>(key, &counter.to_be_bytes())?;
    format_passcode(&digest, digits)
}

#[tracing::instrument(level = "debug", skip(key), fields(hash = H::NAME, digits = digits.get()))]
pub fn generate_code_at<H: HashFamily>(
    key: &[u8],
    timestamp: u64,
    digits: Digits,
    time_step: TimeStep,
) -> Result<Passcode, TotpError> {
    let digest = hmac::<H>(key, &counter_bytes(timestamp, time_step))?;
    format_passcode(&digest, digits)
}

/// Passcode for the window the system clock is currently in.
pub fn generate_code<H: HashFamily>(
    key: &[u8],
    digits: Digits,
    time_step: TimeStep,
) -> Result<Passcode, TotpError> {
    generate_code_at::<H>(key, now()?, digits, time_step)
}

/// Only the window containing `timestamp` is accepted; there is no skew
/// allowance. See [`validate_code_with_skew_at`] for a tolerant check.
pub fn validate_code_at<H: HashFamily>(
    code: &str,
    key: &[u8],
    timestamp: u64,
    digits: Digits,
    time_step: TimeStep,
) -> Result<bool, TotpError> {
    Ok(generate_code_at::<H>(key, timestamp, digits, time_step)? == code)
}

pub fn validate_code<H: HashFamily>(
    code: &str,
    key: &[u8],
    digits: Digits,
    time_step: TimeStep,
) -> Result<bool, TotpError> {
    validate_code_at::<H>(code, key, now()?, digits, time_step)
}

/// Largest window distance accepted by the skew-tolerant validators.
pub const MAX_SKEW: u64 = 10;

/// Accept `code` if it matches any window within `skew` steps of `timestamp`.
/// `skew` above [`MAX_SKEW`] is rejected with [`TotpError::Skew`].
#[tracing::instrument(level = "debug", skip(code, key), fields(hash = H::NAME))]
pub fn validate_code_with_skew_at<H: HashFamily>(
    code: &str,
    key: &[u8],
    timestamp: u64,
    digits: Digits,
    time_step: TimeStep,
    skew: u64,
) -> Result<bool, TotpError> {
    if skew > MAX_SKEW {
        return Err(TotpError::Skew(skew));
    }
    let current = time_step.counter(timestamp);
    let first = current.saturating_sub(skew);
    let last = current.saturating_add(skew);

    for counter in first..=last {
        if generate_hotp::<H>(key, counter, digits)? == code {
            if counter != current {
                // |counter - current| <= MAX_SKEW, so the casts cannot wrap
                let drift = if counter > current {
                    (counter - current) as i64
                } else {
                    -((current - counter) as i64)
                };
                tracing::debug!(drift, "accepted code from adjacent window");
            }
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn validate_code_with_skew<H: HashFamily>(
    code: &str,
    key: &[u8],
    digits: Digits,
    time_step: TimeStep,
    skew: u64,
) -> Result<bool, TotpError> {
    validate_code_with_skew_at::<H>(code, key, now()?, digits, time_step, skew)
}

/// Time remaining in the window containing `since_epoch`.
pub fn time_left_at(since_epoch: Duration, time_step: TimeStep) -> Duration {
    let elapsed = Duration::new(
        since_epoch.as_secs() % time_step.as_secs(),
        since_epoch.subsec_nanos(),
    );
    time_step.as_duration() - elapsed
}

pub fn time_left(time_step: TimeStep) -> Result<Duration, TotpError> {
    Ok(time_left_at(since_epoch()?, time_step))
}

pub fn google_authenticator_code_at(
    base32_key: &str,
    timestamp: u64,
) -> Result<Passcode, TotpError> {
    let key = decode_base32(base32_key).inspect_err(|err| {
        tracing::warn!(error.message = err.to_string(), "rejected base32 secret");
    })?;
    generate_code_at::<Sha1>(&key, timestamp, Digits::default(), TimeStep::default())
}

/// Current code under the Google Authenticator profile: SHA-1, 6 digits, 30 s.
/// Fails with [`TotpError::Decode`] when the secret is not valid Base32.
pub fn google_authenticator_code(base32_key: &str) -> Result<Passcode, TotpError> {
    google_authenticator_code_at(base32_key, now()?)
}

/// Runtime-configured TOTP parameters. The default is the Google
/// Authenticator profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Totp {
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub digits: Digits,
    #[serde(default)]
    pub time_step: TimeStep,
}

impl Totp {
    pub const ENV_PREFIX: &'static str = "TOTP_";

    pub fn new(algorithm: Algorithm, digits: Digits, time_step: TimeStep) -> Self {
        Self {
            algorithm,
            digits,
            time_step,
        }
    }

    /// Read `TOTP_ALGORITHM`, `TOTP_DIGITS` and `TOTP_TIME_STEP`.
    pub fn from_env() -> Result<Self, ConfigError> {
        env::parse_prefixed(Self::ENV_PREFIX)
    }

    #[tracing::instrument(level = "debug", skip(self, key), fields(hash = %self.algorithm))]
    pub fn generate_at(&self, key: &[u8], timestamp: u64) -> Result<Passcode, TotpError> {
        let digest = self
            .algorithm
            .hmac(key, &counter_bytes(timestamp, self.time_step))?;
        format_passcode(&digest, self.digits)
    }

    pub fn generate(&self, key: &[u8]) -> Result<Passcode, TotpError> {
        self.generate_at(key, now()?)
    }

    pub fn validate_at(&self, code: &str, key: &[u8], timestamp: u64) -> Result<bool, TotpError> {
        Ok(self.generate_at(key, timestamp)? == code)
    }

    pub fn validate(&self, code: &str, key: &[u8]) -> Result<bool, TotpError> {
        self.validate_at(code, key, now()?)
    }

    pub fn time_left(&self) -> Result<Duration, TotpError> {
        time_left(self.time_step)
    }

    pub fn generate_key(&self) -> Result<SecretKey, TotpError> {
        random_key(self.algorithm.digest_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure::mac::{Sha256, Sha512};

    const SHA1_SEED: &[u8] = b"12345678901234567890";
    const SHA256_SEED: &[u8] = b"12345678901234567890123456789012";
    const SHA512_SEED: &[u8] =
        b"1234567890123456789012345678901234567890123456789012345678901234";

    fn eight() -> Digits {
        Digits::new(8).unwrap()
    }

    #[test]
    fn rfc6238_sha1() {
        let step = TimeStep::default();
        for (time, expected) in [
            (59, "94287082"),
            (1_111_111_109, "07081804"),
            (1_111_111_111, "14050471"),
            (1_234_567_890, "89005924"),
            (2_000_000_000, "69279037"),
            (20_000_000_000, "65353130"),
        ] {
            let code = generate_code_at::<Sha1>(SHA1_SEED, time, eight(), step).unwrap();
            assert_eq!(code, expected, "time {}", time);
        }
    }

    #[test]
    fn rfc6238_sha256_and_sha512() {
        let step = TimeStep::default();
        assert_eq!(
            generate_code_at::<Sha256>(SHA256_SEED, 59, eight(), step).unwrap(),
            "46119246"
        );
        assert_eq!(
            generate_code_at::<Sha256>(SHA256_SEED, 1_111_111_109, eight(), step).unwrap(),
            "68084774"
        );
        assert_eq!(
            generate_code_at::<Sha512>(SHA512_SEED, 59, eight(), step).unwrap(),
            "90693936"
        );
        assert_eq!(
            generate_code_at::<Sha512>(SHA512_SEED, 1_111_111_109, eight(), step).unwrap(),
            "25091201"
        );
    }

    #[test]
    fn rfc4226_hotp() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583",
            "399871", "520489",
        ];
        for (counter, code) in expected.iter().enumerate() {
            assert_eq!(
                generate_hotp::<Sha1>(SHA1_SEED, counter as u64, Digits::default()).unwrap(),
                *code
            );
        }
    }

    #[test]
    fn validation_is_limited_to_current_window() {
        let step = TimeStep::default();
        let digits = Digits::default();
        let code = generate_code_at::<Sha1>(SHA1_SEED, 75, digits, step).unwrap();

        assert!(validate_code_at::<Sha1>(code.as_str(), SHA1_SEED, 60, digits, step).unwrap());
        assert!(validate_code_at::<Sha1>(code.as_str(), SHA1_SEED, 89, digits, step).unwrap());
        assert!(!validate_code_at::<Sha1>(code.as_str(), SHA1_SEED, 90, digits, step).unwrap());
        assert!(!validate_code_at::<Sha1>(code.as_str(), SHA1_SEED, 59, digits, step).unwrap());
        assert!(!validate_code_at::<Sha1>("000000x", SHA1_SEED, 75, digits, step).unwrap());
    }

    #[test]
    fn skew_accepts_neighbouring_windows() {
        let step = TimeStep::default();
        let digits = Digits::default();
        let code = generate_code_at::<Sha1>(SHA1_SEED, 75, digits, step).unwrap();

        for time in [45, 75, 105] {
            assert!(
                validate_code_with_skew_at::<Sha1>(code.as_str(), SHA1_SEED, time, digits, step, 1)
                    .unwrap()
            );
        }
        assert!(
            !validate_code_with_skew_at::<Sha1>(code.as_str(), SHA1_SEED, 125, digits, step, 1)
                .unwrap()
        );
        assert!(
            !validate_code_with_skew_at::<Sha1>(code.as_str(), SHA1_SEED, 105, digits, step, 0)
                .unwrap()
        );
    }

    #[test]
    fn skew_saturates_at_epoch() {
        let step = TimeStep::default();
        let digits = Digits::default();
        let code = generate_hotp::<Sha1>(SHA1_SEED, 0, digits).unwrap();
        assert!(
            validate_code_with_skew_at::<Sha1>(code.as_str(), SHA1_SEED, 10, digits, step, 5)
                .unwrap()
        );
    }

    #[test]
    fn time_left_counts_down_and_resets() {
        let step = TimeStep::default();
        assert_eq!(time_left_at(Duration::from_secs(59), step), Duration::from_secs(1));
        assert_eq!(time_left_at(Duration::from_secs(60), step), Duration::from_secs(30));
        assert_eq!(
            time_left_at(Duration::from_millis(59_500), step),
            Duration::from_millis(500)
        );
        assert!(
            time_left_at(Duration::from_millis(45_250), step)
                < time_left_at(Duration::from_millis(45_000), step)
        );
    }

    #[test]
    fn skew_is_bounded() {
        let step = TimeStep::default();
        let digits = Digits::default();
        let code = generate_hotp::<Sha1>(SHA1_SEED, u64::MAX, digits).unwrap();

        assert!(matches!(
            validate_code_with_skew_at::<Sha1>(code.as_str(), SHA1_SEED, 75, digits, step, u64::MAX),
            Err(TotpError::Skew(u64::MAX))
        ));
        assert!(
            validate_code_with_skew_at::<Sha1>("000000", SHA1_SEED, 75, digits, step, MAX_SKEW)
                .is_ok()
        );
    }

    #[test]
    fn skew_drift_near_counter_limit() {
        let step = TimeStep::new(1).unwrap();
        let digits = Digits::default();
        let code = generate_hotp::<Sha1>(SHA1_SEED, u64::MAX, digits).unwrap();
        assert!(
            validate_code_with_skew_at::<Sha1>(code.as_str(), SHA1_SEED, u64::MAX - 3, digits, step, 3)
                .unwrap()
        );
        let code = generate_hotp::<Sha1>(SHA1_SEED, (1 << 63) - 1, digits).unwrap();
        assert!(
            validate_code_with_skew_at::<Sha1>(code.as_str(), SHA1_SEED, 1 << 63, digits, step, 1)
                .unwrap()
        );
    }

    #[test]
    fn time_left_handles_longest_step() {
        let step = TimeStep::new(u64::MAX).unwrap();
        assert_eq!(
            time_left_at(Duration::from_secs(100), step),
            Duration::from_secs(u64::MAX - 100)
        );
        assert_eq!(
            time_left_at(Duration::new(100, 250_000_000), step),
            Duration::new(u64::MAX - 101, 750_000_000)
        );
        assert!(time_left_at(Duration::ZERO, step) <= step.as_duration());
    }

    #[test]
    fn google_authenticator_profile() {
        let code = google_authenticator_code_at("JBSWY3DPEHPK3PXP", 59).unwrap();
        let key = decode_base32("JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(
            code,
            generate_code_at::<Sha1>(&key, 59, Digits::default(), TimeStep::default()).unwrap()
        );
        assert_eq!(code.as_str().len(), 6);

        assert!(matches!(
            google_authenticator_code_at("JBSW9Y3DP", 59),
            Err(TotpError::Decode(_))
        ));
    }

    #[test]
    fn configured_totp_matches_generic_path() {
        let totp = Totp::new(Algorithm::Sha256, eight(), TimeStep::default());
        assert_eq!(totp.generate_at(SHA256_SEED, 59).unwrap(), "46119246");
        assert!(totp.validate_at("46119246", SHA256_SEED, 40).unwrap());
        assert!(!totp.validate_at("46119246", SHA256_SEED, 60).unwrap());
        assert_eq!(totp.generate_key().unwrap().len(), 32);
    }

    #[test]
    fn totp_deserializes_from_environment_pairs() {
        let vars = vec![
            ("TOTP_ALGORITHM".to_string(), "sha512".to_string()),
            ("TOTP_DIGITS".to_string(), "8".to_string()),
            ("TOTP_TIME_STEP".to_string(), "60".to_string()),
        ];
        let totp: Totp = envy::prefixed(Totp::ENV_PREFIX).from_iter(vars).unwrap();
        assert_eq!(
            totp,
            Totp::new(Algorithm::Sha512, eight(), TimeStep::new(60).unwrap())
        );

        let defaults: Totp = envy::prefixed(Totp::ENV_PREFIX)
            .from_iter(Vec::<(String, String)>::new())
            .unwrap();
        assert_eq!(defaults, Totp::default());

        let bad = envy::prefixed(Totp::ENV_PREFIX)
            .from_iter(vec![("TOTP_DIGITS".to_string(), "12".to_string())]);
        assert!(bad.map(|_: Totp| ()).is_err());
    }
}
