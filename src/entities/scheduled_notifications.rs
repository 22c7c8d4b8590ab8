use sea_orm::entity::prelude::*;

/// A queued multi-channel message. Two contact slots per channel mirror the
/// two address/number fields stored on a user profile.
///
/// Terminal states: `delivered = true`, or `delivered = false` with
/// `retry_count` at the configured max and `error_message` set.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scheduled_notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub from_user: Option<i32>,

    pub to_user: Option<i32>,

    /// Explicit recipient override. Takes precedence over the profile email.
    pub to_email: Option<String>,

    pub subject: String,

    pub message: String,

    pub trigger_date: String,

    pub notify_screen: bool,
    pub notify_screen2: bool,
    pub notify_email: bool,
    pub notify_email2: bool,
    pub notify_sms: bool,
    pub notify_sms2: bool,
    pub notify_phone: bool,
    pub notify_phone2: bool,
    pub notify_fax: bool,
    pub notify_fax2: bool,

    pub delivered: bool,

    pub sent_date: Option<String>,

    pub retry_count: i32,

    pub error_message: Option<String>,

    pub ack_required: bool,

    pub ack_date: Option<String>,

    /// Soft delete. Soft-deleted rows are never dispatched.
    pub deleted_at: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
