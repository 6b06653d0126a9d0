mod appsettings;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, ensure};
use dosealert_email::ResendEmailSender;
use dosealert_scheduler::{
    DailySweepScheduler, ReminderEmailTemplate, ReminderSweep, SweepSchedule, SystemClock,
};
use dosealert_storage::{NotificationFeed, sqlite::SqlitePatientStorage};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = appsettings::load().context("Failed to load appsettings")?;
    ensure!(
        !settings.email.api_key.trim().is_empty(),
        "email.api_key is not configured"
    );
    log::info!("Starting dose reminder service");

    let pool = dosealert_storage::sqlite::connect(
        &settings.database.url,
        settings.database.max_connections,
    )
    .await
    .context("Failed to open patient database")?;
    let patients = Arc::new(SqlitePatientStorage::new(pool));

    let email = Arc::new(
        ResendEmailSender::new(&settings.email).context("Failed to create email client")?,
    );
    let notifications = Arc::new(NotificationFeed::default());

    let sweep = ReminderSweep::new(
        patients,
        email,
        ReminderEmailTemplate::new(settings.reminders.pharmacy_name.clone()),
    )
    .with_notifications(notifications);

    let scheduler = DailySweepScheduler::start(
        Arc::new(sweep),
        SweepSchedule::from(&settings.reminders),
        Arc::new(SystemClock),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    log::info!("Shutting down");
    scheduler.stop(SHUTDOWN_TIMEOUT).await;

    Ok(())
}
