//! Booking-expiry scan.
//!
//! Flags bookings expiring within the alert window and queues one reminder
//! notification per booking whose client has a contact email. Bookings that
//! are already past their expiration date but still hold unallocated
//! containers are classified and logged, never mutated — expiry is
//! alerting-only.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::db::{NewNotification, Store};
use crate::entities::bookings;

#[derive(Debug, Default, Clone, Copy)]
pub struct BookingExpirySummary {
    pub scanned: usize,
    pub notified: usize,
    pub expired: usize,
}

pub struct BookingExpiryJob {
    store: Store,
    alert_days: i64,
}

impl BookingExpiryJob {
    #[must_use]
    pub const fn new(store: Store, alert_days: i64) -> Self {
        Self { store, alert_days }
    }

    pub async fn run(&self) -> Result<BookingExpirySummary> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<BookingExpirySummary> {
        let today = now.format("%Y-%m-%d").to_string();
        let cutoff = (now + Duration::days(self.alert_days)).format("%Y-%m-%d").to_string();

        let bookings = self.store.bookings_expiring_before(&cutoff).await?;
        let mut summary = BookingExpirySummary::default();

        for booking in bookings {
            summary.scanned += 1;

            let remaining = booking.remaining_containers();
            if remaining <= 0 {
                // Fully allocated; nothing to alert on.
                continue;
            }

            if booking.expiration_date.as_str() < today.as_str() {
                warn!(
                    booking = %booking.booking_number,
                    expired = %booking.expiration_date,
                    remaining,
                    "Booking expired with containers remaining"
                );
                summary.expired += 1;
                continue;
            }

            if self.notify_client(&booking, remaining, &now).await? {
                summary.notified += 1;
            }
        }

        self.store
            .audit(
                "booking_expiry_run",
                &format!(
                    "Expiry scan complete: {} notified, {} expired with remaining",
                    summary.notified, summary.expired
                ),
                "booking_expiry",
                None,
                None,
            )
            .await?;
        info!(
            scanned = summary.scanned,
            notified = summary.notified,
            expired = summary.expired,
            "Booking expiry scan complete"
        );

        Ok(summary)
    }

    async fn notify_client(
        &self,
        booking: &bookings::Model,
        remaining: i32,
        now: &DateTime<Utc>,
    ) -> Result<bool> {
        let Some(email) = self.store.client_email(booking.client_id).await? else {
            warn!(
                booking = %booking.booking_number,
                client = booking.client_id,
                "Expiring booking has no client contact email"
            );
            return Ok(false);
        };

        self.store
            .enqueue_notification(NewNotification {
                to_email: Some(email),
                subject: format!(
                    "Booking {} expires on {}",
                    booking.booking_number, booking.expiration_date
                ),
                message: format!(
                    "Booking {} (shipper: {}) expires on {}. {} of {} containers remain unallocated.",
                    booking.booking_number,
                    booking.shipper,
                    booking.expiration_date,
                    remaining,
                    booking.total_containers(),
                ),
                trigger_date: now.to_rfc3339(),
                ..NewNotification::default()
            })
            .await?;

        self.store
            .audit(
                "booking_expiry_notice",
                &format!(
                    "Reminder queued for booking {} expiring {} ({remaining} containers remaining)",
                    booking.booking_number, booking.expiration_date
                ),
                "booking_expiry",
                Some(booking.id),
                None,
            )
            .await?;

        Ok(true)
    }
}
