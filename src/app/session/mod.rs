use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::app::{db, domain::UserId, error::AppError, identity, identity::Identity, AppState};

pub const SESSION_COOKIE: &str = "session_id";

pub fn session_cookie(session_id: impl Into<String>) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.into()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .removal()
        .into()
}

/// Extractor for authenticated API requests. Resolves the session cookie to
/// a full [`Identity`] (superadmin flag plus memberships) exactly once per
/// request; handlers receive the resolved identity and never re-query it.
pub struct CurrentIdentity(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AppError::Unauthenticated)?;

        let session = db::sessions::find_valid(&state.db, &session_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        let user_id =
            UserId::from_string(&session.user_id).map_err(|_| AppError::Unauthenticated)?;

        let identity = identity::resolve(&state.db, &user_id).await?;
        Ok(Self(identity))
    }
}

/// Extractor carrying the raw session token alongside the identity, for
/// handlers that need to invalidate it (logout).
pub struct CurrentSession {
    pub identity: Identity,
    pub session_id: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AppError::Unauthenticated)?;

        let session = db::sessions::find_valid(&state.db, &session_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        let user_id =
            UserId::from_string(&session.user_id).map_err(|_| AppError::Unauthenticated)?;

        let identity = identity::resolve(&state.db, &user_id).await?;
        Ok(Self {
            identity,
            session_id,
        })
    }
}
