mod drug_catalog;
mod patient_storage;

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use drug_catalog::SqliteDrugCatalog;
pub use patient_storage::SqlitePatientStorage;

use crate::StorageError;

pub static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    log::info!("Connected to patient database and applied migrations");

    Ok(pool)
}
