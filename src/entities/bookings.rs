use sea_orm::entity::prelude::*;

/// Container booking. The expiry scan only reads these rows; expiration is
/// alerting-only and never writes back to the booking.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub booking_number: String,

    pub shipper: String,

    pub client_id: i32,

    /// "YYYY-MM-DD".
    pub expiration_date: String,

    pub total_20: i32,
    pub total_40: i32,
    pub total_45: i32,

    pub remaining_20: i32,
    pub remaining_40: i32,
    pub remaining_45: i32,

    pub created_at: String,
}

impl Model {
    #[must_use]
    pub const fn remaining_containers(&self) -> i32 {
        self.remaining_20 + self.remaining_40 + self.remaining_45
    }

    #[must_use]
    pub const fn total_containers(&self) -> i32 {
        self.total_20 + self.total_40 + self.total_45
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
