use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateError};

use crate::types::form::users;
use crate::types::validation::{self, is_valid_email};
use crate::util::Sensitive;

#[derive(Debug, Deserialize, Serialize)]
pub struct Request {
    pub email: Sensitive<String>,
    pub password: Sensitive<String>,
}

impl Validate for Request {
    fn validate(&self) -> Result<(), ValidateError> {
        let mut fields = ValidateError::field_builder();
        fields.insert("email", {
            let mut error = ValidateError::msg_builder();
            if !is_valid_email(self.email.as_str()) {
                error.insert("Invalid e-mail address");
            }
            error.build()
        });

        // No minimum here: accounts predating the current password
        // rules must still be able to log in.
        fields.insert("password", {
            let mut error = ValidateError::msg_builder();
            if self.password.as_str().is_empty() {
                error.insert("Password must not be empty");
            } else if self.password.as_str().len() > validation::PASSWORD_MAX {
                error.insert("Password is too long");
            }
            error.build()
        });

        fields.build().into_result()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Response {
    pub user: users::View,
    pub access_token: Sensitive<String>,
    pub refresh_token: Sensitive<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn must_fail<T: Validate>(value: &T, args: std::fmt::Arguments<'_>) {
        if value.validate().is_ok() {
            panic!("expected to fail but passed (entry = {args})");
        }
    }

    fn request(email: &str, password: &str) -> Request {
        Request {
            email: email.to_string().into(),
            password: password.to_string().into(),
        }
    }

    #[test]
    fn test_email_field() {
        static INVALID_EMAILS: &[&str] = &["", "no-at-sign", "white space@company.com"];

        for combination in INVALID_EMAILS {
            must_fail(
                &request(combination, "some valid password"),
                format_args!("{combination:?}"),
            );
        }

        assert!(request("alex.ceo@company.com", "some valid password")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_password_field() {
        must_fail(
            &request("alex.ceo@company.com", ""),
            format_args!("empty password"),
        );

        let oversized = "x".repeat(200);
        must_fail(
            &request("alex.ceo@company.com", &oversized),
            format_args!("oversized password"),
        );

        // short (legacy) passwords are accepted at login time
        assert!(request("alex.ceo@company.com", "short")
            .validate()
            .is_ok());
    }
}
