mod clock;
mod daily_scheduler;
mod reminder_email;
mod sweep;

#[cfg(test)]
mod test_utils;

pub use clock::{Clock, SystemClock};
pub use daily_scheduler::{DailySweepScheduler, SweepSchedule, next_fire_time};
pub use reminder_email::ReminderEmailTemplate;
pub use sweep::{EmailDispatchError, ReminderSweep, SweepError, SweepSummary};
