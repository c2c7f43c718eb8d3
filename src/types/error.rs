use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Machine-readable error taxonomy rendered in every error
/// response body.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
    Internal,
    NotFound,
    Unauthorized,
    Forbidden,
    ExpiredToken,
    InvalidCredentials,
    AccountLocked,
    InvalidFormBody(validator::ValidateError),
    ReadonlyMode,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal => f.write_str("Failed to perform request"),
            Error::NotFound => f.write_str("Requested resource is not found"),
            Error::Unauthorized => f.write_str("Authentication required"),
            Error::Forbidden => f.write_str("Attempt to access a restricted resource"),
            Error::ExpiredToken => f.write_str("Presented token is expired"),
            Error::InvalidCredentials => f.write_str("Invalid credentials"),
            Error::AccountLocked => f.write_str("Account is temporarily locked"),
            Error::InvalidFormBody(..) => f.write_str("User performed request with invalid body"),
            Error::ReadonlyMode => f.write_str("Attempt to write read-only database"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::Token;

    #[track_caller]
    fn assert_unit_variant(value: Error, variant: &'static str) {
        serde_test::assert_tokens(
            &value,
            &[
                Token::Struct {
                    name: "Error",
                    len: 1,
                },
                Token::Str("type"),
                Token::Str(variant),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_serde_impl() {
        assert_unit_variant(Error::Internal, "internal");
        assert_unit_variant(Error::NotFound, "not_found");
        assert_unit_variant(Error::Unauthorized, "unauthorized");
        assert_unit_variant(Error::Forbidden, "forbidden");
        assert_unit_variant(Error::ExpiredToken, "expired_token");
        assert_unit_variant(Error::InvalidCredentials, "invalid_credentials");
        assert_unit_variant(Error::AccountLocked, "account_locked");
        assert_unit_variant(Error::ReadonlyMode, "readonly_mode");
    }
}
