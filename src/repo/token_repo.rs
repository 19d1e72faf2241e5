use crate::db::DbPool;
use crate::models::RefreshToken;
use crate::schema::refresh_tokens;
use chrono::Utc;
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug, info, warn};

use super::RepoError;

/// Stores a newly issued refresh token
#[instrument(skip(pool, token), fields(user_id = %token.get_user_id()))]
pub fn store_refresh_token(pool: &DbPool, token: &RefreshToken) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::insert_into(refresh_tokens::table)
        .values(token)
        .execute(conn)?;

    debug!("Stored refresh token {}", token.get_id());
    Ok(())
}

/// Looks a refresh token up by the hash of its raw value
#[instrument(skip(pool, token_hash))]
pub fn get_refresh_token_by_hash(pool: &DbPool, token_hash: &str) -> Result<Option<RefreshToken>> {
    let conn = &mut pool.get()?;

    let result = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(token_hash))
        .first::<RefreshToken>(conn)
        .optional()?;

    Ok(result)
}

/// Revokes a single refresh token; revoking twice is a no-op
#[instrument(skip(pool))]
pub fn revoke_refresh_token(pool: &DbPool, token_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    diesel::update(
        refresh_tokens::table
            .find(token_id)
            .filter(refresh_tokens::revoked_at.is_null()),
    )
    .set(refresh_tokens::revoked_at.eq(Some(now)))
    .execute(conn)?;

    Ok(())
}

/// Revokes every outstanding refresh token of a user
///
/// ### Returns
///
/// The number of tokens revoked
#[instrument(skip(pool))]
pub fn revoke_all_refresh_tokens(pool: &DbPool, user_id: &str) -> Result<usize> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let revoked = diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .filter(refresh_tokens::revoked_at.is_null()),
    )
    .set(refresh_tokens::revoked_at.eq(Some(now)))
    .execute(conn)?;

    if revoked > 0 {
        warn!("Revoked {} refresh tokens for user {}", revoked, user_id);
    }
    Ok(revoked)
}

/// Swaps a refresh token for its successor
///
/// The old token is revoked only if it is still live, and the replacement is
/// inserted in the same transaction. Two concurrent refreshes with the same
/// token therefore cannot both succeed.
///
/// ### Errors
///
/// Returns `RepoError::Conflict` if the old token was already revoked
#[instrument(skip(pool, replacement), fields(user_id = %replacement.get_user_id()))]
pub fn rotate_refresh_token(pool: &DbPool, old_token_id: &str, replacement: &RefreshToken) -> Result<()> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let revoked = diesel::update(
            refresh_tokens::table
                .find(old_token_id)
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set(refresh_tokens::revoked_at.eq(Some(now)))
        .execute(conn)?;

        if revoked != 1 {
            return Err(RepoError::Conflict("Refresh token already used".to_string()).into());
        }

        diesel::insert_into(refresh_tokens::table)
            .values(replacement)
            .execute(conn)?;

        Ok(())
    })?;

    info!("Rotated refresh token {}", old_token_id);
    Ok(())
}

#[cfg(test)]
mod tests;
