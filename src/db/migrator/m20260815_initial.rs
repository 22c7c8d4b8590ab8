use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

use crate::auth::hasher::LegacyHasher;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(schema.create_table_from_entity(Users).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Sessions).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(AuthTokens).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(
                schema.create_table_from_entity(UserSchedules).if_not_exists().to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema.create_table_from_entity(LoginHistory).if_not_exists().to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(ScheduledNotifications)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Clients).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Bookings).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(AuditLogs).if_not_exists().to_owned())
            .await?;

        // Seed a bootstrap admin on the legacy scheme so the auth bridge is
        // exercised from day one. Operators are expected to rotate this.
        let hashed = LegacyHasher::hash("password");
        let now = chrono::Utc::now().to_rfc3339();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Username,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Salt,
                crate::entities::users::Column::Archived,
                crate::entities::users::Column::ForceLogoutEnabled,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                hashed.hash.into(),
                hashed.salt.into(),
                false.into(),
                false.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLogs).to_owned()).await?;
        manager.drop_table(Table::drop().table(Bookings).to_owned()).await?;
        manager.drop_table(Table::drop().table(Clients).to_owned()).await?;
        manager
            .drop_table(Table::drop().table(ScheduledNotifications).to_owned())
            .await?;
        manager.drop_table(Table::drop().table(LoginHistory).to_owned()).await?;
        manager.drop_table(Table::drop().table(UserSchedules).to_owned()).await?;
        manager.drop_table(Table::drop().table(AuthTokens).to_owned()).await?;
        manager.drop_table(Table::drop().table(Sessions).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users).to_owned()).await?;

        Ok(())
    }
}
