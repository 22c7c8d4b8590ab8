//! Shift-based force logout.
//!
//! Runs once per scheduler tick (once a minute by design). For every user
//! with force-logout enabled: if they still hold an active session past the
//! end of today's shift window, every active session is closed, a Forced
//! login-history row is appended, and one audit entry is written.

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use tracing::{info, warn};

use crate::db::Store;
use crate::entities::{login_history, users};

#[derive(Debug, Default, Clone, Copy)]
pub struct ForceLogoutSummary {
    pub users_checked: usize,
    pub users_logged_out: usize,
    pub sessions_closed: u64,
}

pub struct ForceLogoutJob {
    store: Store,
}

impl ForceLogoutJob {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn run(&self) -> Result<ForceLogoutSummary> {
        self.run_at(Utc::now()).await
    }

    /// Sweep with an explicit clock, one user at a time. A failure on one
    /// user must not keep the rest of the sweep from running.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ForceLogoutSummary> {
        let candidates = self.store.list_force_logout_candidates().await?;
        let mut summary = ForceLogoutSummary::default();

        for user in candidates {
            summary.users_checked += 1;

            match self.process_user(&user, now).await {
                Ok(0) => {}
                Ok(closed) => {
                    summary.users_logged_out += 1;
                    summary.sessions_closed += closed;
                }
                Err(e) => {
                    warn!(user_id = user.id, error = %e, "Force-logout check failed for user");
                }
            }
        }

        if summary.sessions_closed > 0 {
            info!(
                users = summary.users_logged_out,
                sessions = summary.sessions_closed,
                "Force-logout sweep closed sessions"
            );
        }

        Ok(summary)
    }

    async fn process_user(&self, user: &users::Model, now: DateTime<Utc>) -> Result<u64> {
        let active = self.store.active_sessions_for_user(user.id).await?;
        if active.is_empty() {
            return Ok(0);
        }

        let day_of_week = i32::try_from(now.weekday().num_days_from_sunday()).unwrap_or(0);
        let Some(schedule) = self.store.get_schedule_for_day(user.id, day_of_week).await? else {
            return Ok(0);
        };
        let Some(shift_end) = schedule.shift_end else {
            return Ok(0);
        };

        let observed = now.format("%H:%M:%S").to_string();
        if observed.as_str() < shift_end.as_str() {
            return Ok(0);
        }

        // The NULL-end_time predicate makes this idempotent across
        // overlapping runs: sessions already closed are not touched again.
        let closed = self.store.close_active_sessions(user.id, &now.to_rfc3339()).await?;
        if closed == 0 {
            return Ok(0);
        }

        // Forced logout invalidates every bearer token, not just the
        // sessions, so stale clients cannot keep calling the API.
        self.store.revoke_all_tokens(user.id).await?;

        let remark = format!("Shift ended at {shift_end}; observed time {observed}");
        self.store
            .add_login_history(user.id, login_history::STATUS_FORCED, Some(&remark), None)
            .await?;
        self.store
            .audit(
                "force_logout",
                &format!("Closed {closed} active session(s) past shift end {shift_end}"),
                "force_logout",
                None,
                Some(user.id),
            )
            .await?;

        info!(user_id = user.id, closed, %shift_end, "Forced logout past shift end");
        Ok(closed)
    }
}
