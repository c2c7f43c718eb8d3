#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod std_impl;

pub use error::*;
pub mod extras;

/// Validates a value before it is allowed to travel further into
/// the system (form bodies, configuration and so on).
///
/// Implementors build a [`ValidateError`] tree with the builders
/// from [`ValidateError`] and finish with
/// [`into_result`](ValidateError::into_result).
pub trait Validate {
    fn validate(&self) -> Result<(), ValidateError>;
}

/// Amount of elements or bytes a value holds, used by
/// [`extras::validate_length`].
pub trait HasLength {
    fn length(&self) -> usize;
}
