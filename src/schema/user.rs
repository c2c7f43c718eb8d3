use chrono::{NaiveDateTime, Utc};
use error_stack::ResultExt;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;

use crate::config;
use crate::database::{error::ErrorExt, Connection, Result};
use crate::types::id::{marker::UserMarker, Id};
use crate::util::password;

/// Coarse authorization level. `ceo` and `manager` accounts can
/// see every live channel; `staff` only sees channels they are a
/// member of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Ceo,
    Manager,
    Staff,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ceo => "ceo",
            Self::Manager => "manager",
            Self::Staff => "staff",
        }
    }

    #[must_use]
    pub const fn can_view_all_channels(self) -> bool {
        matches!(self, Self::Ceo | Self::Manager)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown user role")]
pub struct ParseUserRoleError;

impl FromStr for UserRole {
    type Err = ParseUserRoleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ceo" => Ok(Self::Ceo),
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            _ => Err(ParseUserRoleError),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for UserRole {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for UserRole {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
    ) -> sqlx::encode::IsNull {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UserRole {
    fn decode(
        value: <sqlx::Postgres as sqlx::database::HasValueRef<'r>>::ValueRef,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let value = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(value.parse::<Self>()?)
    }
}

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: Id<UserMarker>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub email: String,
    /// PHC-format Argon2id string. `None` means the account has no
    /// password set and cannot authenticate with one.
    pub password_hash: Option<String>,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub email_verified: bool,
    pub failed_login_attempts: i32,
    pub locked_until: Option<NaiveDateTime>,
    pub deleted_at: Option<NaiveDateTime>,
    pub last_active_at: Option<NaiveDateTime>,
    pub last_login_at: Option<NaiveDateTime>,
    pub login_count: i64,
    pub version: i64,
}

/// Outcome of comparing a plaintext attempt against the stored
/// hash. `Mismatch` is the only outcome the caller should count
/// against the lockout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Matched,
    Mismatch,
    NoPasswordSet,
}

/// Explicit lockout rules; see `auth.max_failed_attempts` and
/// `auth.lockout_secs` in the configuration.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: i32,
    pub lockout_secs: i64,
}

impl LockoutPolicy {
    #[must_use]
    pub fn from_config(auth: &config::Auth) -> Self {
        Self {
            max_attempts: i32::try_from(auth.max_failed_attempts.get()).unwrap_or(i32::MAX),
            lockout_secs: i64::try_from(auth.lockout_secs.get()).unwrap_or(i64::MAX),
        }
    }

    #[must_use]
    pub fn should_lock(&self, failed_attempts: i32) -> bool {
        failed_attempts >= self.max_attempts
    }

    #[must_use]
    pub fn lock_expiry(&self, now: NaiveDateTime) -> NaiveDateTime {
        now + chrono::Duration::seconds(self.lockout_secs)
    }
}

impl User {
    /// Whether the account is locked out at `now`. An elapsed
    /// `locked_until` means the account is usable again without any
    /// cleanup write.
    #[must_use]
    pub fn is_locked_at(&self, now: NaiveDateTime) -> bool {
        self.locked_until.map(|until| until > now).unwrap_or(false)
    }

    /// Compares a plaintext attempt against the stored hash. This
    /// is deliberately slow (Argon2id); run it on a blocking thread
    /// from async contexts.
    pub fn check_password(
        &self,
        attempt: &str,
    ) -> error_stack::Result<PasswordCheck, password::VerifyPasswordError> {
        let Some(hash) = self.password_hash.as_deref() else {
            return Ok(PasswordCheck::NoPasswordSet);
        };

        if password::verify(attempt.as_bytes(), hash)? {
            Ok(PasswordCheck::Matched)
        } else {
            Ok(PasswordCheck::Mismatch)
        }
    }
}

impl User {
    #[tracing::instrument(skip(id), fields(id = "<hidden>"))]
    pub async fn find(conn: &mut Connection, id: Id<UserMarker>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE id = $1 AND deleted_at IS NULL"#)
            .bind(id)
            .fetch_optional(conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip(email), fields(email = "<hidden>"))]
    pub async fn find_by_email(conn: &mut Connection, email: &str) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "users" WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL"#,
        )
        .bind(email)
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    /// Like [`User::find_by_email`] but includes soft-deleted rows,
    /// for maintenance flows that need to inspect or restore them.
    #[tracing::instrument(skip(email), fields(email = "<hidden>"))]
    pub async fn find_by_email_any(conn: &mut Connection, email: &str) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE LOWER(email) = LOWER($1)"#)
            .bind(email)
            .fetch_optional(conn)
            .await
            .into_db_error()
    }

    /// Clears the soft-delete marker. Restoring an already-live
    /// account is a no-op on the marker itself.
    #[tracing::instrument(skip(email), fields(email = "<hidden>"))]
    pub async fn restore(conn: &mut Connection, email: &str) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"UPDATE "users"
               SET deleted_at = NULL, updated_at = $2, version = version + 1
               WHERE LOWER(email) = LOWER($1)
               RETURNING *"#,
        )
        .bind(email)
        .bind(Utc::now().naive_utc())
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    /// Sets the soft-delete marker; an already-deleted account
    /// keeps its original deletion timestamp.
    #[tracing::instrument(skip(email), fields(email = "<hidden>"))]
    pub async fn soft_delete(conn: &mut Connection, email: &str) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"UPDATE "users"
               SET deleted_at = COALESCE(deleted_at, $2), updated_at = $2, version = version + 1
               WHERE LOWER(email) = LOWER($1)
               RETURNING *"#,
        )
        .bind(email)
        .bind(Utc::now().naive_utc())
        .fetch_optional(conn)
        .await
        .into_db_error()
    }
}

#[derive(Debug, Error)]
#[error("Could not reset user password")]
pub struct ResetPasswordError;

impl User {
    /// Overwrites the stored hash with a fresh Argon2id hash of
    /// `new_password`. Soft-deleted accounts are not touched.
    #[tracing::instrument(skip_all)]
    pub async fn reset_password(
        conn: &mut Connection,
        email: &str,
        new_password: &str,
    ) -> error_stack::Result<Option<Self>, ResetPasswordError> {
        let password_hash = password::hash(new_password).change_context(ResetPasswordError)?;

        sqlx::query_as::<_, Self>(
            r#"UPDATE "users"
               SET password_hash = $2, updated_at = $3, version = version + 1
               WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL
               RETURNING *"#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now().naive_utc())
        .fetch_optional(conn)
        .await
        .into_db_error()
        .change_context(ResetPasswordError)
    }

    /// Resets the failure counter, clears any lock and records the
    /// successful login.
    #[tracing::instrument(skip(id), fields(id = "<hidden>"))]
    pub async fn record_login_success(
        conn: &mut Connection,
        id: Id<UserMarker>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"UPDATE "users"
               SET failed_login_attempts = 0,
                   locked_until = NULL,
                   last_login_at = $2,
                   last_active_at = $2,
                   login_count = login_count + 1,
                   version = version + 1
               WHERE id = $1 AND deleted_at IS NULL
               RETURNING *"#,
        )
        .bind(id)
        .bind(Utc::now().naive_utc())
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    /// Bumps the failure counter and locks the account once the
    /// policy threshold is reached.
    #[tracing::instrument(skip(id, policy), fields(id = "<hidden>"))]
    pub async fn record_login_failure(
        conn: &mut Connection,
        id: Id<UserMarker>,
        policy: &LockoutPolicy,
    ) -> Result<Option<Self>> {
        let lock_expiry = policy.lock_expiry(Utc::now().naive_utc());

        sqlx::query_as::<_, Self>(
            r#"UPDATE "users"
               SET failed_login_attempts = failed_login_attempts + 1,
                   locked_until = CASE
                       WHEN failed_login_attempts + 1 >= $2 THEN $3
                       ELSE locked_until
                   END,
                   version = version + 1
               WHERE id = $1 AND deleted_at IS NULL
               RETURNING *"#,
        )
        .bind(id)
        .bind(policy.max_attempts)
        .bind(lock_expiry)
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    /// Refreshes `last_active_at` without touching anything else.
    #[tracing::instrument(skip(id), fields(id = "<hidden>"))]
    pub async fn record_seen(conn: &mut Connection, id: Id<UserMarker>) -> Result<()> {
        sqlx::query(r#"UPDATE "users" SET last_active_at = $2 WHERE id = $1 AND deleted_at IS NULL"#)
            .bind(id)
            .bind(Utc::now().naive_utc())
            .execute(conn)
            .await
            .into_db_error()?;

        Ok(())
    }
}

/// Per-field defaults for [`User::backfill_defaults`]. A `None`
/// rule leaves that column alone entirely.
#[derive(Debug, Default)]
pub struct BackfillDefaults<'a> {
    pub department: Option<&'a str>,
    pub timezone: Option<&'a str>,
    pub language: Option<&'a str>,
    /// Derives a display name from the e-mail local part for rows
    /// that have none.
    pub display_name_from_email: bool,
}

impl BackfillDefaults<'_> {
    #[must_use]
    fn is_empty(&self) -> bool {
        self.department.is_none()
            && self.timezone.is_none()
            && self.language.is_none()
            && !self.display_name_from_email
    }
}

impl User {
    /// Fills absent optional profile fields with the supplied
    /// defaults. Populated fields are never overwritten, so running
    /// this twice with the same rules changes nothing the second
    /// time. Returns how many rows were touched.
    #[tracing::instrument(skip_all)]
    pub async fn backfill_defaults(
        conn: &mut Connection,
        rules: &BackfillDefaults<'_>,
    ) -> Result<u64> {
        if rules.is_empty() {
            return Ok(0);
        }

        let mut query = sqlx::QueryBuilder::new(r#"UPDATE "users" SET updated_at = "#);
        query.push_bind(Utc::now().naive_utc());
        query.push(", version = version + 1");

        if let Some(department) = rules.department {
            query.push(", department = COALESCE(department, ");
            query.push_bind(department);
            query.push(")");
        }
        if let Some(timezone) = rules.timezone {
            query.push(", timezone = COALESCE(timezone, ");
            query.push_bind(timezone);
            query.push(")");
        }
        if let Some(language) = rules.language {
            query.push(", language = COALESCE(language, ");
            query.push_bind(language);
            query.push(")");
        }
        if rules.display_name_from_email {
            query.push(", display_name = COALESCE(display_name, INITCAP(SPLIT_PART(email, '@', 1)))");
        }

        let mut conditions = Vec::new();
        if rules.department.is_some() {
            conditions.push("department IS NULL");
        }
        if rules.timezone.is_some() {
            conditions.push("timezone IS NULL");
        }
        if rules.language.is_some() {
            conditions.push("language IS NULL");
        }
        if rules.display_name_from_email {
            conditions.push("display_name IS NULL");
        }

        query.push(" WHERE deleted_at IS NULL AND (");
        query.push(conditions.join(" OR "));
        query.push(")");

        let result = query.build().execute(conn).await.into_db_error()?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        User {
            id: Id::generate(),
            created_at: Utc::now().naive_utc(),
            updated_at: None,
            email: "alex.ceo@company.com".to_string(),
            password_hash: None,
            display_name: Some("Alex".to_string()),
            role: UserRole::Ceo,
            department: None,
            job_title: None,
            phone: None,
            timezone: None,
            language: None,
            email_verified: true,
            failed_login_attempts: 0,
            locked_until: None,
            deleted_at: None,
            last_active_at: None,
            last_login_at: None,
            login_count: 0,
            version: 1,
        }
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in [UserRole::Ceo, UserRole::Manager, UserRole::Staff] {
            assert_eq!(Ok(role), role.as_str().parse().map_err(|_| ()));
        }
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_channel_visibility() {
        assert!(UserRole::Ceo.can_view_all_channels());
        assert!(UserRole::Manager.can_view_all_channels());
        assert!(!UserRole::Staff.can_view_all_channels());
    }

    #[test]
    fn test_is_locked_at() {
        let now = Utc::now().naive_utc();
        let mut user = sample_user();
        assert!(!user.is_locked_at(now));

        user.locked_until = Some(now + Duration::minutes(10));
        assert!(user.is_locked_at(now));

        // an elapsed lock no longer counts
        user.locked_until = Some(now - Duration::seconds(1));
        assert!(!user.is_locked_at(now));
    }

    #[test]
    fn test_lockout_policy_threshold() {
        let policy = LockoutPolicy {
            max_attempts: 5,
            lockout_secs: 900,
        };
        assert!(!policy.should_lock(4));
        assert!(policy.should_lock(5));
        assert!(policy.should_lock(6));

        let now = Utc::now().naive_utc();
        assert_eq!(now + Duration::minutes(15), policy.lock_expiry(now));
    }

    #[test]
    fn test_check_password() {
        let mut user = sample_user();
        assert_eq!(
            PasswordCheck::NoPasswordSet,
            user.check_password("anything").unwrap()
        );

        user.password_hash = Some(password::hash("correct horse battery staple").unwrap());
        assert_eq!(
            PasswordCheck::Matched,
            user.check_password("correct horse battery staple").unwrap()
        );
        assert_eq!(
            PasswordCheck::Mismatch,
            user.check_password("wrong password entirely").unwrap()
        );
    }
}
