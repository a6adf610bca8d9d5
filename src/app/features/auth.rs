use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::app::{
    db,
    domain::{Email, HashedPassword, Password, UserId},
    error::AppError,
    session::{self, CurrentSession},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
}

/// POST /signup — Create an account and start a session.
///
/// New accounts have no memberships: every list they read is empty until
/// they create their first organization or get invited into one.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<Response, AppError> {
    let email = Email::new(request.email)
        .map_err(|e| AppError::Validation(e.message.map(|m| m.to_string()).unwrap_or_else(|| "Invalid email".to_string())))?;
    let password = Password::new(request.password)
        .map_err(|e| AppError::Validation(e.message.map(|m| m.to_string()).unwrap_or_else(|| "Invalid password".to_string())))?;

    if db::users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Validation(
            "Unable to create account. If you already have an account, please log in.".to_string(),
        ));
    }

    let password_hash = HashedPassword::from_password(&password).map_err(|_| AppError::Internal)?;
    let user_id = UserId::new();
    let new_user = db::users::NewUser {
        id: user_id.clone(),
        email,
        password_hash,
    };

    let mut tx = state.db.begin().await?;
    db::users::insert(&mut *tx, &new_user).await?;
    let expires_at = time::OffsetDateTime::now_utc() + Duration::days(30);
    let session_id = db::sessions::create(&mut *tx, &user_id, expires_at).await?;
    tx.commit().await?;

    let jar = jar.add(session::session_cookie(session_id));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse {
            user_id: user_id.as_str(),
        }),
    )
        .into_response())
}

/// POST /login — Verify credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = Email::new(request.email)
        .map_err(|_| AppError::Validation("Invalid email or password".to_string()))?;
    let password = Password::for_verification(request.password);

    let user = db::users::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid email or password".to_string()))?;

    let stored_hash = HashedPassword::from_string(user.password_hash);
    stored_hash
        .verify(&password)
        .map_err(|_| AppError::Validation("Invalid email or password".to_string()))?;

    let user_id = UserId::from_string(&user.id).map_err(|_| AppError::Internal)?;

    let expires_at = time::OffsetDateTime::now_utc() + Duration::days(30);
    let session_id = db::sessions::create(&state.db, &user_id, expires_at).await?;

    let jar = jar.add(session::session_cookie(session_id));
    Ok((
        StatusCode::OK,
        jar,
        Json(SessionResponse {
            user_id: user_id.as_str(),
        }),
    )
        .into_response())
}

/// POST /logout — Delete the session row and clear the cookie. The resolved
/// identity for this token is gone with the row; nothing is served stale.
pub async fn logout(
    session: CurrentSession,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    db::sessions::delete(&state.db, &session.session_id).await?;
    let jar = jar.add(session::clear_session_cookie());
    Ok((StatusCode::NO_CONTENT, jar).into_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
