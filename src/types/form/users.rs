use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::schema::user::UserRole;
use crate::schema::User;
use crate::types::id::{marker::UserMarker, Id};

/// Public projection of a user row. Credentials and lockout
/// bookkeeping never leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct View {
    pub id: Id<UserMarker>,
    pub email: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub email_verified: bool,
    pub created_at: NaiveDateTime,
    pub last_login_at: Option<NaiveDateTime>,
    pub last_active_at: Option<NaiveDateTime>,
}

impl From<&User> for View {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            department: user.department.clone(),
            job_title: user.job_title.clone(),
            phone: user.phone.clone(),
            timezone: user.timezone.clone(),
            language: user.language.clone(),
            email_verified: user.email_verified,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
            last_active_at: user.last_active_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_view_never_carries_credentials() {
        let user = User {
            id: Id::generate(),
            created_at: Utc::now().naive_utc(),
            updated_at: None,
            email: "alex.ceo@company.com".to_string(),
            password_hash: Some("$argon2id$...".to_string()),
            display_name: None,
            role: UserRole::Ceo,
            department: None,
            job_title: None,
            phone: None,
            timezone: None,
            language: None,
            email_verified: true,
            failed_login_attempts: 3,
            locked_until: None,
            deleted_at: None,
            last_active_at: None,
            last_login_at: None,
            login_count: 10,
            version: 4,
        };

        let json = serde_json::to_string(&View::from(&user)).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("failed_login_attempts"));
        assert!(json.contains("alex.ceo@company.com"));
    }
}
