use actix_web::{http::header, web, FromRequest};
use futures::future::{ready, LocalBoxFuture};
use thiserror::Error;

use crate::http::jwt::TokenKind;
use crate::schema::User;
use crate::App;

use super::{Error, Jwt};

/// Who is performing the request. Routes that require a user call
/// [`Actor::get_user`]; everything else can stay anonymous.
#[derive(Debug)]
pub enum Actor {
    Anonymous,
    User(User),
}

impl Actor {
    pub fn get_user(self) -> Result<User, Error> {
        #[derive(Debug, Error)]
        #[error("Attempt to access user-only route")]
        struct Unauthorized;
        match self {
            Self::User(n) => Ok(n),
            Self::Anonymous => Err(Error::from_context(
                crate::types::Error::Unauthorized,
                Unauthorized,
            )),
        }
    }
}

impl FromRequest for Actor {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Box::pin(ready(Ok(Actor::Anonymous)));
        };

        let Some(app) = req.app_data::<web::Data<App>>() else {
            #[derive(Debug, Error)]
            #[error("The web app has no available configuration")]
            struct NoConfig;
            return Box::pin(ready(Err(Error::from_context(
                crate::types::Error::Internal,
                NoConfig,
            ))));
        };

        let app = app.clone();
        let jwt = match Jwt::decode(token, TokenKind::Access, &app.config.auth) {
            Ok(jwt) => jwt,
            Err(error) => return Box::pin(ready(Err(error.into()))),
        };

        Box::pin(async move {
            // the account may have been soft-deleted after the
            // token was issued; a valid signature alone is not
            // enough
            let mut conn = app.db_read_prefer_primary().await?;
            if let Some(user) = User::find(&mut conn, jwt.user_id).await? {
                Ok(Actor::User(user))
            } else {
                #[derive(Debug, Error)]
                #[error("Token references a missing or deleted user")]
                struct StaleToken;
                Err(Error::from_context(
                    crate::types::Error::Unauthorized,
                    StaleToken,
                ))
            }
        })
    }
}
