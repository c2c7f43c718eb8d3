use actix_web::{
    web::{self, Json},
    HttpResponse,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use validator::Validate;

use crate::http::jwt::TokenKind;
use crate::http::{Actor, Error, Jwt};
use crate::schema::user::{LockoutPolicy, PasswordCheck};
use crate::schema::User;
use crate::types;
use crate::types::form::auth::{login, refresh};
use crate::types::form::users;
use crate::App;

fn invalid_credentials() -> Error {
    #[derive(Debug, Error)]
    #[error("Login attempt with invalid credentials")]
    struct InvalidCredentials;
    Error::from_context(types::Error::InvalidCredentials, InvalidCredentials)
}

/// Login state machine. Every attempt ends in exactly one of:
/// authenticated, invalid credentials (which covers unknown
/// accounts so their existence is not disclosed), or locked.
#[tracing::instrument(skip_all)]
pub async fn login(
    app: web::Data<App>,
    form: Json<login::Request>,
) -> Result<HttpResponse, Error> {
    form.validate()?;

    // counters are written on both outcomes, so take the primary
    let mut conn = app.db_write().await?;
    let Some(user) = User::find_by_email(&mut conn, form.email.as_str()).await? else {
        return Err(invalid_credentials());
    };

    let now = Utc::now().naive_utc();
    if user.is_locked_at(now) {
        #[derive(Debug, Error)]
        #[error("Login attempt against a locked account")]
        struct AccountLocked;
        return Err(Error::from_context(types::Error::AccountLocked, AccountLocked));
    }

    let check = {
        let user = user.clone();
        let attempt = form.password.as_str().to_string();
        tokio::task::spawn_blocking(move || user.check_password(&attempt)).await??
    };

    match check {
        PasswordCheck::Matched => {
            let Some(user) = User::record_login_success(&mut conn, user.id).await? else {
                // deleted between lookup and bookkeeping
                return Err(invalid_credentials());
            };

            let auth = &app.config.auth;
            let access_token = Jwt::new_access(user.id, auth).encode(auth)?;
            let refresh_token = Jwt::new_refresh(user.id, auth).encode(auth)?;

            Ok(HttpResponse::Ok().json(login::Response {
                user: users::View::from(&user),
                access_token: access_token.into(),
                refresh_token: refresh_token.into(),
            }))
        }
        PasswordCheck::Mismatch => {
            let policy = LockoutPolicy::from_config(&app.config.auth);
            User::record_login_failure(&mut conn, user.id, &policy).await?;
            Err(invalid_credentials())
        }
        // nothing to brute-force, so the failure counter stays
        PasswordCheck::NoPasswordSet => Err(invalid_credentials()),
    }
}

/// Trades a refresh token for a fresh access token. Access tokens
/// are rejected here by kind.
#[tracing::instrument(skip_all)]
pub async fn refresh(
    app: web::Data<App>,
    form: Json<refresh::Request>,
) -> Result<HttpResponse, Error> {
    form.validate()?;

    let auth = &app.config.auth;
    let claims = Jwt::decode(form.refresh_token.as_str(), TokenKind::Refresh, auth)?;

    let mut conn = app.db_read_prefer_primary().await?;
    let Some(user) = User::find(&mut conn, claims.user_id).await? else {
        #[derive(Debug, Error)]
        #[error("Refresh token references a missing or deleted user")]
        struct StaleToken;
        return Err(Error::from_context(types::Error::Unauthorized, StaleToken));
    };

    let access_token = Jwt::new_access(user.id, auth).encode(auth)?;
    Ok(HttpResponse::Ok().json(refresh::Response {
        access_token: access_token.into(),
    }))
}

/// "Who am I" lookup keyed by the bearer token.
#[tracing::instrument(skip_all)]
pub async fn me(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;

    let mut conn = app.db_write().await?;
    User::record_seen(&mut conn, user.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "user": users::View::from(&user),
    })))
}
