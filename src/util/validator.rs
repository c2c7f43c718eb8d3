use error_stack::Report;
use std::borrow::Cow;
use thiserror::Error;
use validator::ValidateError;

#[derive(Debug, Error)]
#[error("Invalid given data occurred")]
pub struct Wrapper;

/// Flattens a [`ValidateError`] tree into printable report
/// attachments (`field.subfield: message` lines).
pub trait IntoValidatorReport<T> {
    fn into_validator_report(self) -> error_stack::Result<T, Wrapper>;
}

impl<T> IntoValidatorReport<T> for Result<T, ValidateError> {
    fn into_validator_report(self) -> error_stack::Result<T, Wrapper> {
        self.map_err(|error| {
            fn read_errors<'a>(
                err: &'a ValidateError,
                fields_queue: &mut Vec<Cow<'a, str>>,
                mut report: Report<Wrapper>,
            ) -> Report<Wrapper> {
                match err {
                    ValidateError::Fields(fields) => {
                        for (field, data) in fields {
                            fields_queue.push(Cow::Borrowed(field));
                            report = read_errors(data, fields_queue, report);
                            fields_queue.pop();
                        }
                        report
                    }
                    ValidateError::Messages(messages) => {
                        let field_str = fields_queue.join(".");
                        for message in messages {
                            report = report.attach_printable(format!("{field_str}: {message}"));
                        }
                        report
                    }
                    ValidateError::Slice(slice) => {
                        for (index, element) in slice.iter().enumerate() {
                            if let Some(element) = element {
                                fields_queue.push(Cow::Owned(index.to_string()));
                                report = read_errors(element, fields_queue, report);
                                fields_queue.pop();
                            }
                        }
                        report
                    }
                }
            }

            let mut queue = Vec::new();
            let report = Report::new(Wrapper);
            read_errors(&error, &mut queue, report)
        })
    }
}
