//! Stale auth-token revocation.
//!
//! Deletes bearer tokens older than the configured threshold (24h by
//! default) for every non-archived user. A token aged exactly the threshold
//! is deleted. One audit entry per affected user, not per token.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::db::Store;

const LEGACY_SCHEDULE_TABLE: &str = "user_schedule_legacy";

#[derive(Debug, Default, Clone, Copy)]
pub struct TokenSweepSummary {
    pub users_processed: usize,
    pub tokens_revoked: u64,
    pub legacy_rows_processed: u64,
}

pub struct TokenSweepJob {
    store: Store,
    threshold_hours: i64,
}

impl TokenSweepJob {
    #[must_use]
    pub const fn new(store: Store, threshold_hours: i64) -> Self {
        Self { store, threshold_hours }
    }

    pub async fn run(&self) -> Result<TokenSweepSummary> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<TokenSweepSummary> {
        let cutoff = (now - Duration::hours(self.threshold_hours)).to_rfc3339();
        let counts = self.store.stale_token_counts(&cutoff).await?;

        let mut summary = TokenSweepSummary::default();

        for (user_id, _count) in counts {
            let revoked = self.store.delete_stale_tokens(user_id, &cutoff).await?;
            if revoked == 0 {
                continue;
            }

            self.store
                .audit(
                    "token_sweep",
                    &format!(
                        "Revoked {revoked} auth token(s) older than {}h",
                        self.threshold_hours
                    ),
                    "token_sweep",
                    None,
                    Some(user_id),
                )
                .await?;
            info!(user_id, revoked, "Revoked stale auth tokens");

            summary.users_processed += 1;
            summary.tokens_revoked += revoked;
        }

        summary.legacy_rows_processed = self.process_legacy_schedule().await?;

        info!(
            users = summary.users_processed,
            tokens = summary.tokens_revoked,
            "Token sweep complete"
        );

        Ok(summary)
    }

    /// Compatibility path for the retired schedule table. The modern schema
    /// never ships it, so this probes and returns without work.
    async fn process_legacy_schedule(&self) -> Result<u64> {
        if !self.store.legacy_table_exists(LEGACY_SCHEDULE_TABLE).await? {
            return Ok(0);
        }

        warn!(
            table = LEGACY_SCHEDULE_TABLE,
            "Legacy schedule table present but unsupported; skipping"
        );
        Ok(0)
    }
}
