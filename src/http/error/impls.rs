use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;

use super::Error;
use crate::http::jwt::DecodeTokenError;
use crate::types::Error as ErrorType;
use crate::util::password::VerifyPasswordError;
use crate::{database, http};

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.as_type() {
            ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::Unauthorized
            | ErrorType::ExpiredToken
            | ErrorType::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorType::Forbidden => StatusCode::FORBIDDEN,
            ErrorType::AccountLocked => StatusCode::LOCKED,
            ErrorType::InvalidFormBody(..) => StatusCode::BAD_REQUEST,
            ErrorType::ReadonlyMode => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code()).json(self.as_type())
    }
}

impl From<Report<database::Error>> for Error {
    fn from(value: Report<database::Error>) -> Self {
        match value.current_context() {
            database::Error::Readonly => Error::from_report(ErrorType::ReadonlyMode, value),
            _ => Error::from_report(ErrorType::Internal, value),
        }
    }
}

impl From<validator::ValidateError> for Error {
    fn from(value: validator::ValidateError) -> Self {
        #[derive(Debug, thiserror::Error)]
        #[error("Validation error occurred")]
        struct ValidateError;
        Error::from_context(ErrorType::InvalidFormBody(value), ValidateError)
    }
}

impl From<DecodeTokenError> for Error {
    fn from(value: DecodeTokenError) -> Self {
        let error_type = match value {
            DecodeTokenError::Expired => ErrorType::ExpiredToken,
            DecodeTokenError::WrongKind | DecodeTokenError::Invalid => ErrorType::Unauthorized,
        };
        Error::from_context(error_type, value)
    }
}

impl From<Report<http::jwt::EncodeJwtError>> for Error {
    fn from(value: Report<http::jwt::EncodeJwtError>) -> Self {
        Error::from_report(ErrorType::Internal, value)
    }
}

impl From<Report<VerifyPasswordError>> for Error {
    fn from(value: Report<VerifyPasswordError>) -> Self {
        Error::from_report(ErrorType::Internal, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Error::from_context(ErrorType::Internal, value)
    }
}
