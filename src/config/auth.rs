use serde::Deserialize;
use std::num::{NonZeroU32, NonZeroU64};
use validator::{extras::validate_length, Validate, ValidateError};

use crate::util::Sensitive;

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Secret key signing every access and refresh token.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_AUTH_JWT_SECRET`
    pub jwt_secret: Sensitive<String>,
    /// Lifetime of an access token in seconds.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_AUTH_ACCESS_TOKEN_TTL_SECS`
    #[serde(default = "Auth::default_access_token_ttl_secs")]
    pub access_token_ttl_secs: NonZeroU64,
    /// Lifetime of a refresh token in seconds.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_AUTH_REFRESH_TOKEN_TTL_SECS`
    #[serde(default = "Auth::default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: NonZeroU64,
    /// Consecutive failed logins before an account gets locked.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_AUTH_MAX_FAILED_ATTEMPTS`
    #[serde(default = "Auth::default_max_failed_attempts")]
    pub max_failed_attempts: NonZeroU32,
    /// How long a locked account stays locked, in seconds. The
    /// lock expires by timestamp comparison alone; there is no
    /// background unlock job.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_AUTH_LOCKOUT_SECS`
    #[serde(default = "Auth::default_lockout_secs")]
    pub lockout_secs: NonZeroU64,
}

impl Auth {
    const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 900;
    const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 14;
    const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;
    const DEFAULT_LOCKOUT_SECS: u64 = 900;

    // Required by serde
    const fn default_access_token_ttl_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_ACCESS_TOKEN_TTL_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_ACCESS_TOKEN_TTL_SECS is accidentally set to 0"),
        }
    }

    const fn default_refresh_token_ttl_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_REFRESH_TOKEN_TTL_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_REFRESH_TOKEN_TTL_SECS is accidentally set to 0"),
        }
    }

    const fn default_max_failed_attempts() -> NonZeroU32 {
        match NonZeroU32::new(Self::DEFAULT_MAX_FAILED_ATTEMPTS) {
            Some(n) => n,
            None => panic!("DEFAULT_MAX_FAILED_ATTEMPTS is accidentally set to 0"),
        }
    }

    const fn default_lockout_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_LOCKOUT_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_LOCKOUT_SECS is accidentally set to 0"),
        }
    }
}

#[cfg(test)]
impl Auth {
    pub(crate) fn for_tests() -> Self {
        Self {
            jwt_secret: Sensitive::new("huddle-test-jwt-secret".to_string()),
            access_token_ttl_secs: Self::default_access_token_ttl_secs(),
            refresh_token_ttl_secs: Self::default_refresh_token_ttl_secs(),
            max_failed_attempts: Self::default_max_failed_attempts(),
            lockout_secs: Self::default_lockout_secs(),
        }
    }
}

impl Validate for Auth {
    fn validate(&self) -> Result<(), ValidateError> {
        let mut fields = ValidateError::field_builder();
        fields.insert("jwt_secret", {
            let mut error = ValidateError::msg_builder();
            if !validate_length(self.jwt_secret.as_str(), 12, 1024) {
                error.insert("Invalid JWT secret key");
            }
            error.build()
        });
        fields.build().into_result()
    }
}
