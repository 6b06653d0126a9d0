use std::{sync::Arc, time::Duration};

use dosealert_models::{
    chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc},
    chrono_tz::Tz,
    settings::ReminderSettings,
};
use tokio::{
    task::{JoinHandle, JoinSet},
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{Clock, ReminderSweep, SweepError};

/// Wall-clock time of day, in a fixed timezone, at which the sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    pub fire_at: NaiveTime,
    pub timezone: Tz,
}

impl From<&ReminderSettings> for SweepSchedule {
    fn from(settings: &ReminderSettings) -> Self {
        Self {
            fire_at: settings.fire_at,
            timezone: settings.timezone,
        }
    }
}

/// Runs a [`ReminderSweep`] once a day until stopped.
pub struct DailySweepScheduler {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl DailySweepScheduler {
    pub fn start(sweep: Arc<ReminderSweep>, schedule: SweepSchedule, clock: Arc<dyn Clock>) -> Self {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let task = tokio::spawn(async move {
            run_daily(sweep, schedule, clock.as_ref(), task_cancellation_token).await;
        });

        Self {
            task,
            cancellation_token,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the schedule and any sweep in flight, waiting up to `timeout`
    /// for them to wind down.
    pub async fn stop(self, timeout: Duration) {
        self.cancellation_token.cancel();
        if time::timeout(timeout, self.task).await.is_err() {
            log::warn!("Reminder sweep scheduler did not stop within {timeout:?}");
        }
    }
}

async fn run_daily(
    sweep: Arc<ReminderSweep>,
    schedule: SweepSchedule,
    clock: &dyn Clock,
    cancellation_token: CancellationToken,
) {
    log::info!(
        "Reminder sweep scheduled daily at {} ({})",
        schedule.fire_at,
        schedule.timezone
    );

    let mut runs = JoinSet::new();
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let now = clock.now();
        // The wall clock may lag the timer slightly; never fire the same slot twice.
        let after = last_fired.map_or(now, |fired| fired.max(now));
        let Some(target) = next_fire_time(schedule.fire_at, schedule.timezone, after) else {
            log::error!("No further reminder sweep can be scheduled after {after}");
            break;
        };
        let delay = (target - now).to_std().unwrap_or_default();

        log::info!("[SCHEDULE] Next reminder sweep at {target}, sleeping for {delay:?}");

        tokio::select! {
            _ = cancellation_token.cancelled() => {
                log::info!("Reminder sweep scheduler shutting down");
                break;
            }
            _ = time::sleep(delay) => {}
        }

        last_fired = Some(target);
        let today = target.with_timezone(&schedule.timezone).date_naive();
        let sweep = Arc::clone(&sweep);
        let run_cancellation_token = cancellation_token.child_token();
        runs.spawn(async move {
            match sweep.run(today, &run_cancellation_token).await {
                Ok(_) | Err(SweepError::AlreadyRunning) => {}
                Err(error) => log::error!("Reminder sweep for {today} aborted: {error}"),
            }
        });

        while runs.try_join_next().is_some() {}
    }

    while runs.join_next().await.is_some() {}
}

/// The first instant strictly after `after` at which the local wall clock in
/// `timezone` reads `fire_at`. A time skipped by a DST transition fires an
/// hour later; a repeated one fires on its first occurrence.
pub fn next_fire_time(fire_at: NaiveTime, timezone: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut date = after.with_timezone(&timezone).date_naive();

    for _ in 0..3 {
        let local = date.and_time(fire_at);
        let candidate = timezone.from_local_datetime(&local).earliest().or_else(|| {
            local
                .checked_add_signed(TimeDelta::hours(1))
                .and_then(|shifted| timezone.from_local_datetime(&shifted).earliest())
        });

        if let Some(candidate) = candidate.map(|c| c.with_timezone(&Utc)) {
            if candidate > after {
                return Some(candidate);
            }
        }

        date = date.succ_opt()?;
    }

    None
}
