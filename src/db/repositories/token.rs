use std::collections::BTreeMap;

use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{auth_tokens, users};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        user_id: i32,
        token: &str,
        created_at: &str,
    ) -> Result<auth_tokens::Model> {
        let active = auth_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(token.to_string()),
            created_at: Set(created_at.to_string()),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert auth token")
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count tokens")
    }

    /// Stale token counts per non-archived user. A token aged exactly the
    /// threshold counts as stale (`created_at <= cutoff`).
    pub async fn stale_counts_by_user(&self, cutoff: &str) -> Result<BTreeMap<i32, u64>> {
        let stale = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::CreatedAt.lte(cutoff))
            .all(&self.conn)
            .await
            .context("Failed to list stale tokens")?;

        if stale.is_empty() {
            return Ok(BTreeMap::new());
        }

        let active_users: Vec<i32> = users::Entity::find()
            .filter(users::Column::Archived.eq(false))
            .all(&self.conn)
            .await
            .context("Failed to list users for token sweep")?
            .into_iter()
            .map(|u| u.id)
            .collect();

        let mut counts = BTreeMap::new();
        for token in stale {
            if active_users.contains(&token.user_id) {
                *counts.entry(token.user_id).or_insert(0) += 1;
            }
        }

        Ok(counts)
    }

    pub async fn delete_stale_for_user(&self, user_id: i32, cutoff: &str) -> Result<u64> {
        let result = auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .filter(auth_tokens::Column::CreatedAt.lte(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to delete stale tokens")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_all_for_user(&self, user_id: i32) -> Result<u64> {
        let result = auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete user tokens")?;

        Ok(result.rows_affected)
    }
}
