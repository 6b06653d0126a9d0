pub mod drug;
pub mod notification;
pub mod patient;
pub mod reminder_dates;
pub mod settings;

pub use chrono;
pub use chrono_tz;
