use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::users;

/// Input for creating a user row. Password material is expected to be
/// pre-hashed by the caller.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub salt: Option<String>,
    pub email: Option<String>,
    pub archived: bool,
    pub force_logout_enabled: bool,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user: NewUser) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(user.username),
            password_hash: Set(user.password_hash),
            salt: Set(user.salt),
            email: Set(user.email),
            archived: Set(user.archived),
            force_logout_enabled: Set(user.force_logout_enabled),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert user")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")
    }

    /// Lookup by id, excluding archived users.
    pub async fn get_active_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .filter(users::Column::Archived.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query active user by id")
    }

    /// Credential lookup. Username matching is case-insensitive (both sides
    /// lowercased); email is exact. Archived users never match.
    pub async fn find_for_auth(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<users::Model>> {
        let mut query = users::Entity::find().filter(users::Column::Archived.eq(false));

        if let Some(username) = username {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(users::Column::Username)))
                    .eq(username.to_lowercase()),
            );
        }

        if let Some(email) = email {
            query = query.filter(users::Column::Email.eq(email));
        }

        query
            .one(&self.conn)
            .await
            .context("Failed to query user by credentials")
    }

    /// Users subject to the shift-based force-logout sweep.
    pub async fn list_force_logout_candidates(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .filter(users::Column::ForceLogoutEnabled.eq(true))
            .filter(users::Column::Archived.eq(false))
            .all(&self.conn)
            .await
            .context("Failed to list force-logout candidates")
    }
}
