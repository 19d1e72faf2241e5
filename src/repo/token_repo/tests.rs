use super::*;
use crate::models::{Role, User};
use crate::repo::create_user;
use crate::repo::tests::setup_test_db;
use chrono::Duration;

fn seed_user(pool: &DbPool) -> User {
    let user = User::new("root@platform.test", "hash".to_string(), "Root".to_string(), Role::Superadmin);
    create_user(pool, &user).unwrap()
}

#[test]
fn test_store_and_lookup() {
    let pool = setup_test_db();
    let user = seed_user(&pool);
    let token = RefreshToken::new(user.get_id(), "abc".to_string(), Utc::now() + Duration::days(7));

    store_refresh_token(&pool, &token).unwrap();

    let found = get_refresh_token_by_hash(&pool, "abc").unwrap().unwrap();
    assert_eq!(found.get_id(), token.get_id());
    assert!(get_refresh_token_by_hash(&pool, "nope").unwrap().is_none());
}

#[test]
fn test_rotate_only_once() {
    let pool = setup_test_db();
    let user = seed_user(&pool);
    let old = RefreshToken::new(user.get_id(), "old".to_string(), Utc::now() + Duration::days(7));
    store_refresh_token(&pool, &old).unwrap();

    let first = RefreshToken::new(user.get_id(), "new-1".to_string(), Utc::now() + Duration::days(7));
    rotate_refresh_token(&pool, &old.get_id(), &first).unwrap();

    let second = RefreshToken::new(user.get_id(), "new-2".to_string(), Utc::now() + Duration::days(7));
    let err = rotate_refresh_token(&pool, &old.get_id(), &second).unwrap_err();
    assert!(matches!(err.downcast_ref::<RepoError>(), Some(RepoError::Conflict(_))));

    // the failed rotation must not leave its replacement behind
    assert!(get_refresh_token_by_hash(&pool, "new-2").unwrap().is_none());
    assert!(get_refresh_token_by_hash(&pool, "new-1").unwrap().unwrap().get_revoked_at().is_none());
}

#[test]
fn test_revoke_all() {
    let pool = setup_test_db();
    let user = seed_user(&pool);
    for hash in ["a", "b", "c"] {
        let token = RefreshToken::new(user.get_id(), hash.to_string(), Utc::now() + Duration::days(7));
        store_refresh_token(&pool, &token).unwrap();
    }
    let a = get_refresh_token_by_hash(&pool, "a").unwrap().unwrap();
    revoke_refresh_token(&pool, &a.get_id()).unwrap();

    assert_eq!(revoke_all_refresh_tokens(&pool, &user.get_id()).unwrap(), 2);
    assert_eq!(revoke_all_refresh_tokens(&pool, &user.get_id()).unwrap(), 0);
}
