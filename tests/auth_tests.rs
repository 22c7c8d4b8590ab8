//! Credential lookup and verification against a real store.

use std::collections::HashMap;

use yardman::auth::{Credentials, LegacyHasher, LegacyUserProvider};
use yardman::db::{NewUser, Store};

async fn test_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("yardman-auth-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test store")
}

fn legacy_user(username: &str, password: &str) -> NewUser {
    let hashed = LegacyHasher::hash(password);
    NewUser {
        username: username.to_string(),
        password_hash: hashed.hash,
        salt: Some(hashed.salt),
        email: None,
        archived: false,
        force_logout_enabled: false,
    }
}

#[tokio::test]
async fn username_lookup_is_case_insensitive() {
    let store = test_store().await;
    let provider = LegacyUserProvider::new(store);

    // The bootstrap migration seeds an "admin" user.
    for variant in ["admin", "Admin", "ADMIN"] {
        let creds = Credentials::with_username(variant, "password");
        let user = provider
            .find_by_credentials(&creds)
            .await
            .expect("lookup failed")
            .expect("bootstrap admin not found");
        assert_eq!(user.username, "admin");
        assert!(LegacyUserProvider::validate_credentials(&user, &creds));
    }
}

#[tokio::test]
async fn password_only_credentials_resolve_to_none() {
    let store = test_store().await;
    let provider = LegacyUserProvider::new(store);

    let mut fields = HashMap::new();
    fields.insert("password".to_string(), "password".to_string());
    let creds = Credentials::from_fields(&fields);

    assert!(creds.username.is_none());
    let result = provider.find_by_credentials(&creds).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn unknown_lookup_fields_fail_closed() {
    let store = test_store().await;
    let provider = LegacyUserProvider::new(store);

    let mut creds = Credentials::with_username("admin", "password");
    creds.extra.push(("role".to_string(), "supervisor".to_string()));

    let result = provider.find_by_credentials(&creds).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn email_lookup_finds_user() {
    let store = test_store().await;

    let mut new_user = legacy_user("gatehouse", "checkpoint");
    new_user.email = Some("gatehouse@example.com".to_string());
    store.create_user(new_user).await.unwrap();

    let provider = LegacyUserProvider::new(store);

    let mut fields = HashMap::new();
    fields.insert("email".to_string(), "gatehouse@example.com".to_string());
    fields.insert("password".to_string(), "checkpoint".to_string());
    let creds = Credentials::from_fields(&fields);

    let user = provider
        .find_by_credentials(&creds)
        .await
        .unwrap()
        .expect("email lookup failed");
    assert_eq!(user.username, "gatehouse");
    assert!(LegacyUserProvider::validate_credentials(&user, &creds));
}

#[tokio::test]
async fn archived_users_are_not_found() {
    let store = test_store().await;

    let mut new_user = legacy_user("retired", "pw");
    new_user.archived = true;
    let created = store.create_user(new_user).await.unwrap();

    let provider = LegacyUserProvider::new(store);

    assert!(provider.find_by_id(created.id).await.unwrap().is_none());

    let creds = Credentials::with_username("retired", "pw");
    assert!(provider.find_by_credentials(&creds).await.unwrap().is_none());
}

#[tokio::test]
async fn wrong_or_missing_password_never_validates() {
    let store = test_store().await;
    store.create_user(legacy_user("clerk", "right-pw")).await.unwrap();

    let provider = LegacyUserProvider::new(store);

    let creds = Credentials::with_username("clerk", "wrong-pw");
    let user = provider.find_by_credentials(&creds).await.unwrap().unwrap();
    assert!(!LegacyUserProvider::validate_credentials(&user, &creds));

    let no_password = Credentials {
        username: Some("clerk".to_string()),
        password: None,
        extra: Vec::new(),
    };
    assert!(!LegacyUserProvider::validate_credentials(&user, &no_password));
}

#[tokio::test]
async fn modern_hashes_verify_without_salt() {
    let store = test_store().await;

    let bcrypt_hash = bcrypt::hash("upgraded-pw", 4).unwrap();
    store
        .create_user(NewUser {
            username: "modern".to_string(),
            password_hash: bcrypt_hash,
            salt: None,
            email: None,
            archived: false,
            force_logout_enabled: false,
        })
        .await
        .unwrap();

    let provider = LegacyUserProvider::new(store);

    let creds = Credentials::with_username("modern", "upgraded-pw");
    let user = provider.find_by_credentials(&creds).await.unwrap().unwrap();
    assert!(LegacyUserProvider::validate_credentials(&user, &creds));

    let wrong = Credentials::with_username("modern", "nope");
    assert!(!LegacyUserProvider::validate_credentials(&user, &wrong));
}
