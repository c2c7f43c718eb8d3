use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateError};

use crate::util::Sensitive;

#[derive(Debug, Deserialize, Serialize)]
pub struct Request {
    pub refresh_token: Sensitive<String>,
}

impl Validate for Request {
    fn validate(&self) -> Result<(), ValidateError> {
        let mut fields = ValidateError::field_builder();
        fields.insert("refresh_token", {
            let mut error = ValidateError::msg_builder();
            if self.refresh_token.as_str().is_empty() {
                error.insert("Refresh token must not be empty");
            }
            error.build()
        });
        fields.build().into_result()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Response {
    pub access_token: Sensitive<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_token() {
        let form = Request {
            refresh_token: String::new().into(),
        };
        assert!(form.validate().is_err());

        let form = Request {
            refresh_token: "some.jwt.token".to_string().into(),
        };
        assert!(form.validate().is_ok());
    }
}
