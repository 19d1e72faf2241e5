use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A refresh token issued at login
///
/// Only the SHA-256 hash of the token is stored; the raw token is handed to
/// the client once and never persisted. A token is usable while it is
/// neither revoked nor expired.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::refresh_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RefreshToken {
    id: String,
    user_id: String,
    token_hash: String,
    expires_at: NaiveDateTime,
    revoked_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

impl RefreshToken {
    pub fn new(user_id: String, token_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            token_hash,
            expires_at: expires_at.naive_utc(),
            revoked_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    pub fn get_token_hash(&self) -> String {
        self.token_hash.clone()
    }

    pub fn get_expires_at(&self) -> DateTime<Utc> {
        self.expires_at.and_utc()
    }

    pub fn get_revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at.map(|t| t.and_utc())
    }

    /// Whether the token can still be exchanged at `now`
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.get_expires_at() > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_usable_until_expiry() {
        let now = Utc::now();
        let token = RefreshToken::new("user".to_string(), "hash".to_string(), now + Duration::days(1));
        assert!(token.is_usable(now));
        assert!(!token.is_usable(now + Duration::days(2)));
    }
}
