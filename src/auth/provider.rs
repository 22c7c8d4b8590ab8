//! Credential resolution against the user table, bridging the legacy
//! hashing scheme.
//!
//! Lookup misses resolve to `Ok(None)` so callers treat "user not found" as
//! ordinary control flow; only infrastructure failures surface as errors.

use std::collections::HashMap;

use anyhow::Result;
use tracing::debug;

use crate::auth::hasher::LegacyHasher;
use crate::db::Store;
use crate::entities::users;

/// Typed credential set. The password never participates in row lookup;
/// it is only used by [`LegacyUserProvider::validate_credentials`].
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Additional exact-match lookup fields (currently only "email").
    pub extra: Vec<(String, String)>,
}

impl Credentials {
    #[must_use]
    pub fn with_username(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            extra: Vec::new(),
        }
    }

    /// Build credentials from a loose field map. Any key containing
    /// "password" is stripped into the password slot and never used for
    /// lookup.
    #[must_use]
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let mut creds = Self::default();

        for (key, value) in fields {
            if key.contains("password") {
                creds.password = Some(value.clone());
            } else if key == "username" {
                creds.username = Some(value.clone());
            } else {
                creds.extra.push((key.clone(), value.clone()));
            }
        }

        creds
    }

    fn has_lookup_fields(&self) -> bool {
        self.username.is_some() || !self.extra.is_empty()
    }
}

pub struct LegacyUserProvider {
    store: Store,
}

impl LegacyUserProvider {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Lookup by id. Archived users are treated as not found.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.store.get_active_user(id).await
    }

    /// Lookup by credential fields. Password fields are never part of the
    /// query; a credential set with nothing but a password resolves to
    /// `None`. Unknown lookup fields also resolve to `None` (fail closed).
    pub async fn find_by_credentials(&self, creds: &Credentials) -> Result<Option<users::Model>> {
        if !creds.has_lookup_fields() {
            return Ok(None);
        }

        let mut email = None;
        for (key, value) in &creds.extra {
            if key == "email" {
                email = Some(value.as_str());
            } else {
                debug!(field = %key, "Rejecting credential lookup on unsupported field");
                return Ok(None);
            }
        }

        self.store
            .find_user_for_auth(creds.username.as_deref(), email)
            .await
    }

    /// Password check. Fails closed when no password was supplied.
    #[must_use]
    pub fn validate_credentials(user: &users::Model, creds: &Credentials) -> bool {
        let Some(password) = creds.password.as_deref() else {
            return false;
        };

        LegacyHasher::verify(
            password,
            &user.password_hash,
            user.salt.as_deref().unwrap_or(""),
        )
    }

    /// Legacy-authenticated users are never migrated to a new hash on login.
    pub const fn rehash_if_required(_user: &users::Model, _creds: &Credentials) {}
}
