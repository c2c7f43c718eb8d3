use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;
use validator::{Validate, ValidateError};

use super::ParseError;
use crate::util::figment::FigmentErrorAttachable;
use crate::util::validator::IntoValidatorReport;
use crate::util::Sensitive;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub db: super::Database,
    #[serde(default)]
    pub http: super::Http,
    pub auth: super::Auth,
    /// Integration with the hosted text-processing service used by
    /// the mobile client's voice input flow. Optional; the server
    /// only carries the credential.
    pub text_processor: Option<TextProcessor>,
}

#[derive(Debug, Deserialize)]
pub struct TextProcessor {
    /// **Environment variables**:
    /// - `HUDDLE_TEXT_PROCESSOR_API_KEY`
    pub api_key: Sensitive<String>,
}

impl Server {
    pub fn load() -> Result<Self, ParseError> {
        dotenvy::dotenv().ok();

        let config = Self::figment()
            .extract::<Self>()
            .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

        config
            .validate()
            .into_validator_report()
            .change_context(ParseError)?;

        Ok(config)
    }
}

impl Server {
    const DEFAULT_CONFIG_FILE: &str = "huddle.toml";

    /// Creates a default [`figment::Figment`] object to load server
    /// configuration. Kept separate from [`Server::load`] for
    /// testing.
    pub(crate) fn figment() -> figment::Figment {
        use figment::{
            providers::{Env, Format, Toml},
            Figment,
        };

        Figment::new()
            .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
            // One big con about figment (env provider to be specific)
            // especially these fields with underscore in it.
            .merge(Env::prefixed("HUDDLE_").map(|v| match v.as_str() {
                "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
                "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

                "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
                "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

                "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
                "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

                "AUTH_JWT_SECRET" => "auth.jwt_secret".into(),
                "AUTH_ACCESS_TOKEN_TTL_SECS" => "auth.access_token_ttl_secs".into(),
                "AUTH_REFRESH_TOKEN_TTL_SECS" => "auth.refresh_token_ttl_secs".into(),
                "AUTH_MAX_FAILED_ATTEMPTS" => "auth.max_failed_attempts".into(),
                "AUTH_LOCKOUT_SECS" => "auth.lockout_secs".into(),

                "TEXT_PROCESSOR_API_KEY" => "text_processor.api_key".into(),

                _ => v.as_str().replace('_', ".").into(),
            }))
            // Environment variable aliases
            .merge(Env::raw().map(|v| match v.as_str() {
                "DATABASE_URL" => "db.primary.url".into(),
                _ => v.into(),
            }))
    }
}

impl Validate for Server {
    fn validate(&self) -> std::result::Result<(), ValidateError> {
        let mut fields = ValidateError::field_builder();
        if let Err(error) = self.db.validate() {
            fields.insert("db", error);
        }
        if let Err(error) = self.http.validate() {
            fields.insert("http", error);
        }
        if let Err(error) = self.auth.validate() {
            fields.insert("auth", error);
        }
        fields.build().into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::num::{NonZeroU32, NonZeroU64};

    #[test]
    fn env_aliases() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "hello world!");

            jail.set_env("HUDDLE_DB_PRIMARY_MIN_IDLE", "100");
            jail.set_env("HUDDLE_DB_PRIMARY_POOL_SIZE", "100");

            jail.set_env("HUDDLE_DB_REPLICA_URL", "required");
            jail.set_env("HUDDLE_DB_REPLICA_MIN_IDLE", "589");
            jail.set_env("HUDDLE_DB_REPLICA_POOL_SIZE", "589");

            jail.set_env("HUDDLE_DB_ENFORCE_TLS", "false");
            jail.set_env("HUDDLE_DB_TIMEOUT_SECS", "3030");

            jail.set_env("HUDDLE_AUTH_JWT_SECRET", "extremely-secret-key");
            jail.set_env("HUDDLE_AUTH_MAX_FAILED_ATTEMPTS", "3");
            jail.set_env("HUDDLE_AUTH_LOCKOUT_SECS", "60");

            let config: Server = Server::figment().extract()?;
            assert_eq!(config.db.primary.url.as_str(), "hello world!");
            assert_eq!(
                config.db.primary.min_idle.unwrap(),
                NonZeroU32::new(100).unwrap()
            );
            assert_eq!(config.db.primary.pool_size, NonZeroU32::new(100).unwrap());
            assert_eq!(
                config.db.replica.as_ref().unwrap().min_idle.unwrap(),
                NonZeroU32::new(589).unwrap()
            );
            assert_eq!(
                config.db.replica.as_ref().unwrap().pool_size,
                NonZeroU32::new(589).unwrap()
            );

            assert_eq!(config.db.enforce_tls, false);
            assert_eq!(config.db.timeout_secs, NonZeroU64::new(3030).unwrap());

            assert_eq!(config.auth.jwt_secret.as_str(), "extremely-secret-key");
            assert_eq!(
                config.auth.max_failed_attempts,
                NonZeroU32::new(3).unwrap()
            );
            assert_eq!(config.auth.lockout_secs, NonZeroU64::new(60).unwrap());

            Ok(())
        });
    }

    #[test]
    fn defaults_are_applied() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/huddle");
            jail.set_env("HUDDLE_AUTH_JWT_SECRET", "extremely-secret-key");

            let config: Server = Server::figment().extract()?;
            assert_eq!(config.db.timeout_secs, NonZeroU64::new(5).unwrap());
            assert_eq!(config.db.primary.pool_size, NonZeroU32::new(5).unwrap());
            assert_eq!(config.http.port, 8080);
            assert_eq!(
                config.auth.access_token_ttl_secs,
                NonZeroU64::new(900).unwrap()
            );
            assert_eq!(
                config.auth.refresh_token_ttl_secs,
                NonZeroU64::new(1_209_600).unwrap()
            );
            assert_eq!(
                config.auth.max_failed_attempts,
                NonZeroU32::new(5).unwrap()
            );
            assert!(config.text_processor.is_none());

            Ok(())
        });
    }

    #[test]
    fn rejects_weak_jwt_secret() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/huddle");
            jail.set_env("HUDDLE_AUTH_JWT_SECRET", "short");

            let config: Server = Server::figment().extract()?;
            assert!(config.validate().is_err());

            Ok(())
        });
    }
}
