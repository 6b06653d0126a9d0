mod drug_catalog;
mod notification_feed;
mod patient;
pub mod sqlite;

pub use drug_catalog::DrugCatalog;
pub use notification_feed::NotificationFeed;
pub use patient::{
    PatientQuery, PatientReminderQuery, PatientStorage, SEARCH_RESULT_LIMIT, StorageError,
};
