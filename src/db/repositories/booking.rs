use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::{bookings, clients};

#[derive(Debug, Clone, Default)]
pub struct NewBooking {
    pub booking_number: String,
    pub shipper: String,
    pub client_id: i32,
    pub expiration_date: String,
    pub total_20: i32,
    pub total_40: i32,
    pub total_45: i32,
    pub remaining_20: i32,
    pub remaining_40: i32,
    pub remaining_45: i32,
}

pub struct BookingRepository {
    conn: DatabaseConnection,
}

impl BookingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, b: NewBooking) -> Result<bookings::Model> {
        let active = bookings::ActiveModel {
            booking_number: Set(b.booking_number),
            shipper: Set(b.shipper),
            client_id: Set(b.client_id),
            expiration_date: Set(b.expiration_date),
            total_20: Set(b.total_20),
            total_40: Set(b.total_40),
            total_45: Set(b.total_45),
            remaining_20: Set(b.remaining_20),
            remaining_40: Set(b.remaining_40),
            remaining_45: Set(b.remaining_45),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert booking")
    }

    /// Bookings with an expiration date at or before the cutoff. Includes
    /// already-expired bookings so the scan can classify them.
    pub async fn expiring_before(&self, cutoff_date: &str) -> Result<Vec<bookings::Model>> {
        bookings::Entity::find()
            .filter(bookings::Column::ExpirationDate.lte(cutoff_date))
            .order_by_asc(bookings::Column::ExpirationDate)
            .all(&self.conn)
            .await
            .context("Failed to query expiring bookings")
    }

    pub async fn create_client(&self, name: &str, email: Option<&str>) -> Result<clients::Model> {
        let active = clients::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.map(ToString::to_string)),
            archived: Set(false),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert client")
    }

    pub async fn client_email(&self, client_id: i32) -> Result<Option<String>> {
        let client = clients::Entity::find_by_id(client_id)
            .filter(clients::Column::Archived.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query client")?;

        Ok(client.and_then(|c| c.email))
    }
}
