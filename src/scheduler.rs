//! Background scheduler.
//!
//! Each job type runs as its own independently scheduled task: force logout
//! and notification dispatch on the per-minute cadence, token sweep and the
//! booking-expiry scan on the daily cadence. Jobs are idempotent and safe
//! to re-run partially, so an interrupted run is simply picked up at the
//! next tick.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::state::AppState;

pub struct Scheduler {
    state: Arc<AppState>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: Arc<AppState>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        // Per-minute sweeps on the configured cron.
        let state_for_sweep = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let sweep_job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state_for_sweep);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_minute_sweeps(&state).await;
            })
        })?;

        // Daily jobs at midnight.
        let daily_hours = self.config.daily_interval_hours.max(1);
        let daily_cron = if daily_hours >= 24 {
            "0 0 0 * * *".to_string()
        } else {
            format!("0 0 */{daily_hours} * * *")
        };

        let state_for_daily = Arc::clone(&self.state);
        let daily_job = Job::new_async(&daily_cron, move |_uuid, _lock| {
            let state = Arc::clone(&state_for_daily);
            Box::pin(async move {
                run_daily_sweeps(&state).await;
            })
        })?;

        sched.add(sweep_job).await?;
        sched.add(daily_job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);
        info!("Daily jobs scheduled: {}", daily_cron);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let sweep_mins = self.config.sweep_interval_minutes.max(1);
        let daily_hours = self.config.daily_interval_hours.max(1);

        info!(
            "Scheduler running: sweeps every {}m, daily jobs every {}h",
            sweep_mins, daily_hours
        );

        let mut sweep_interval = interval(Duration::from_secs(u64::from(sweep_mins) * 60));
        let mut daily_interval = interval(Duration::from_secs(u64::from(daily_hours) * 60 * 60));

        loop {
            tokio::select! {
                _ = sweep_interval.tick() => {
                    if !*self.running.read().await {
                        break;
                    }
                    run_minute_sweeps(&self.state).await;
                }
                _ = daily_interval.tick() => {
                    if !*self.running.read().await {
                        break;
                    }
                    run_daily_sweeps(&self.state).await;
                }
            }
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// One pass of every job, for the CLI `check` command.
    pub async fn run_once(&self) -> Result<()> {
        info!("Running manual check...");

        self.state.force_logout.run().await?;
        self.state.dispatcher.run().await?;
        self.state.token_sweep.run().await?;
        self.state.booking_expiry.run().await?;

        Ok(())
    }
}

async fn run_minute_sweeps(state: &AppState) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "force_logout", "Starting force-logout sweep");
    if let Err(e) = state.force_logout.run().await {
        error!(event = "job_failed", job_name = "force_logout", error = %e, "Force-logout sweep failed");
    }
    info!(
        event = "job_finished",
        job_name = "force_logout",
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Force-logout sweep finished"
    );

    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "notification_dispatch", "Starting notification dispatch");
    if let Err(e) = state.dispatcher.run().await {
        error!(event = "job_failed", job_name = "notification_dispatch", error = %e, "Notification dispatch failed");
    }
    info!(
        event = "job_finished",
        job_name = "notification_dispatch",
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Notification dispatch finished"
    );
}

async fn run_daily_sweeps(state: &AppState) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "token_sweep", "Starting token sweep");
    if let Err(e) = state.token_sweep.run().await {
        error!(event = "job_failed", job_name = "token_sweep", error = %e, "Token sweep failed");
    }
    info!(
        event = "job_finished",
        job_name = "token_sweep",
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Token sweep finished"
    );

    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "booking_expiry", "Starting booking-expiry scan");
    if let Err(e) = state.booking_expiry.run().await {
        error!(event = "job_failed", job_name = "booking_expiry", error = %e, "Booking-expiry scan failed");
    }
    info!(
        event = "job_finished",
        job_name = "booking_expiry",
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Booking-expiry scan finished"
    );
}
