use axum::{extract::State, http::StatusCode};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use std::sync::Arc;
use tracing::{instrument, debug, info, warn};

use crate::auth::{self, AuthKeys, AuthUser, ACCESS_TOKEN_COOKIE};
use crate::db::DbPool;
use crate::dto::{LoginDto, LogoutDto, RefreshDto, RegisterGuestDto, TokenResponse};
use crate::errors::ApiError;
use crate::extract::Json;
use crate::models::{RefreshToken, Role, User};
use crate::repo::{self, RepoError};

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

fn invalid_refresh_token() -> ApiError {
    ApiError::Unauthorized("Invalid refresh token".to_string())
}

fn access_cookie(token: String) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn new_refresh_token(keys: &AuthKeys, user: &User) -> (String, RefreshToken) {
    let token = auth::generate_refresh_token();
    let record = RefreshToken::new(user.get_id(), auth::hash_refresh_token(&token), Utc::now() + keys.refresh_ttl());
    (token, record)
}

fn token_response(keys: &AuthKeys, user: User, refresh_token: String) -> Result<TokenResponse, ApiError> {
    Ok(TokenResponse {
        access_token: keys.issue_access_token(&user)?,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: keys.access_ttl().num_seconds(),
        user,
    })
}

/// Starts a session: stores a refresh token and signs an access token
fn start_session(pool: &DbPool, keys: &AuthKeys, jar: CookieJar, user: User) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let (refresh_token, record) = new_refresh_token(keys, &user);
    repo::store_refresh_token(pool, &record)?;

    let response = token_response(keys, user, refresh_token)?;
    let jar = jar.add(access_cookie(response.access_token.clone()));
    Ok((jar, Json(response)))
}

/// Users of a deactivated hotel cannot sign in
fn ensure_hotel_active(pool: &DbPool, user: &User) -> Result<(), ApiError> {
    if let Some(hotel_id) = user.get_hotel_id() {
        let active = repo::get_hotel(pool, &hotel_id)?
            .map(|hotel| hotel.get_is_active())
            .unwrap_or(false);
        if !active {
            return Err(ApiError::Forbidden("Hotel is deactivated".to_string()));
        }
    }
    Ok(())
}

/// Handler for guest self-registration
///
/// This function handles POST requests to `/api/auth/register`. The guest
/// joins the active hotel named by `hotel_slug` and is signed in straight
/// away.
///
/// ### Returns
///
/// 201 with a token pair, and the access token cookie
#[instrument(skip(pool, keys, jar, payload), fields(hotel_slug = %payload.hotel_slug))]
pub async fn register_handler(
    State(pool): State<Arc<DbPool>>,
    State(keys): State<Arc<AuthKeys>>,
    jar: CookieJar,
    Json(payload): Json<RegisterGuestDto>,
) -> Result<(StatusCode, CookieJar, Json<TokenResponse>), ApiError> {
    payload.validate(Utc::now())?;

    let hotel = repo::get_hotel_by_slug(&pool, &payload.hotel_slug)?
        .filter(|hotel| hotel.get_is_active())
        .ok_or(ApiError::NotFound)?;

    let guest = User::new(
        &payload.email,
        auth::hash_password(&payload.password)?,
        payload.full_name.trim().to_string(),
        Role::Guest,
    )
    .with_hotel(hotel.get_id())
    .with_stay(payload.room_number.trim().to_string(), payload.checkout_at);
    let guest = repo::create_user(&pool, &guest)?;

    info!("Registered guest {} at hotel {}", guest.get_id(), hotel.get_id());
    let (jar, body) = start_session(&pool, &keys, jar, guest)?;
    Ok((StatusCode::CREATED, jar, body))
}

/// Handler for signing in
///
/// This function handles POST requests to `/api/auth/login`.
///
/// ### Returns
///
/// A token pair as JSON, and the access token cookie
///
/// ### Errors
///
/// 401 for unknown emails, wrong passwords and deactivated accounts; 403
/// when the user's hotel is deactivated
#[instrument(skip(pool, keys, jar, payload))]
pub async fn login_handler(
    State(pool): State<Arc<DbPool>>,
    State(keys): State<Arc<AuthKeys>>,
    jar: CookieJar,
    Json(payload): Json<LoginDto>,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let user = repo::get_user_by_email(&pool, &payload.email)?
        .ok_or_else(invalid_credentials)?;

    if !auth::verify_password(&payload.password, user.get_password_hash()) {
        debug!("Password mismatch for user {}", user.get_id());
        return Err(invalid_credentials());
    }
    if !user.get_is_active() {
        return Err(ApiError::Unauthorized("Account is inactive".to_string()));
    }
    ensure_hotel_active(&pool, &user)?;

    info!("User {} signed in", user.get_id());
    start_session(&pool, &keys, jar, user)
}

/// Handler for exchanging a refresh token for a new token pair
///
/// This function handles POST requests to `/api/auth/refresh`. The
/// presented token is revoked and replaced. Presenting a token that was
/// already revoked revokes every session of its user.
#[instrument(skip(pool, keys, jar, payload))]
pub async fn refresh_handler(
    State(pool): State<Arc<DbPool>>,
    State(keys): State<Arc<AuthKeys>>,
    jar: CookieJar,
    Json(payload): Json<RefreshDto>,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let now = Utc::now();
    let stored = repo::get_refresh_token_by_hash(&pool, &auth::hash_refresh_token(&payload.refresh_token))?
        .ok_or_else(invalid_refresh_token)?;

    if stored.get_revoked_at().is_some() {
        let revoked = repo::revoke_all_refresh_tokens(&pool, &stored.get_user_id())?;
        warn!("Revoked refresh token reused for user {}; revoked {} sessions", stored.get_user_id(), revoked);
        return Err(invalid_refresh_token());
    }
    if !stored.is_usable(now) {
        return Err(invalid_refresh_token());
    }

    let user = repo::get_user(&pool, &stored.get_user_id())?
        .filter(|user| user.get_is_active())
        .ok_or_else(|| ApiError::Unauthorized("Account is inactive".to_string()))?;
    ensure_hotel_active(&pool, &user)?;

    let (refresh_token, record) = new_refresh_token(&keys, &user);
    repo::rotate_refresh_token(&pool, &stored.get_id(), &record).map_err(|e| {
        match e.downcast_ref::<RepoError>() {
            // lost a race with a concurrent refresh of the same token
            Some(RepoError::Conflict(_)) => invalid_refresh_token(),
            _ => ApiError::from(e),
        }
    })?;

    debug!("Rotated refresh token for user {}", user.get_id());
    let response = token_response(&keys, user, refresh_token)?;
    let jar = jar.add(access_cookie(response.access_token.clone()));
    Ok((jar, Json(response)))
}

/// Handler for signing out
///
/// This function handles POST requests to `/api/auth/logout`. The body is
/// optional; when it names a refresh token, that token is revoked. The
/// access token cookie is always cleared.
#[instrument(skip(pool, jar, payload))]
pub async fn logout_handler(
    State(pool): State<Arc<DbPool>>,
    jar: CookieJar,
    payload: Option<Json<LogoutDto>>,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let refresh_token = payload.and_then(|Json(body)| body.refresh_token);

    if let Some(token) = refresh_token {
        if let Some(stored) = repo::get_refresh_token_by_hash(&pool, &auth::hash_refresh_token(&token))? {
            repo::revoke_refresh_token(&pool, &stored.get_id())?;
            info!("User {} signed out", stored.get_user_id());
        }
    }

    let jar = jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Handler for the current user's account
///
/// This function handles GET requests to `/api/auth/me`.
pub async fn me_handler(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}
