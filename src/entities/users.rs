use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Legacy SHA1 digest, or a modern `$2y$`/`$argon2` hash string.
    pub password_hash: String,

    /// Hex-encoded salt for legacy hashes. NULL for users on modern hashes.
    pub salt: Option<String>,

    pub email: Option<String>,

    /// Archived users are excluded from authentication and all sweeps.
    pub archived: bool,

    pub force_logout_enabled: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
