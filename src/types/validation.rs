use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
        .expect("compile email regex")
});

pub const EMAIL_MAX: usize = 254;
pub const PASSWORD_MIN: usize = 12;
pub const PASSWORD_MAX: usize = 128;

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email) && email.len() <= EMAIL_MAX
}

#[must_use]
pub fn is_valid_password(pass: &str) -> bool {
    let len = pass.len();
    (PASSWORD_MIN..=PASSWORD_MAX).contains(&len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("alex.ceo@company.com"));
        assert!(is_valid_email("dana+tasks@sub.company.io"));
        assert!(!is_valid_email("not-an-address"));
        assert!(!is_valid_email("spaces in@local.part"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_is_valid_password() {
        assert!(is_valid_password("twelve chars!"));
        assert!(!is_valid_password("short"));
        assert!(!is_valid_password(&"x".repeat(PASSWORD_MAX + 1)));
    }
}
