use chrono::NaiveTime;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EmailSettings {
    pub api_key: String,
    pub from: String,
    #[serde(default = "default_email_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_email_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ReminderSettings {
    #[serde(default = "default_timezone")]
    pub timezone: chrono_tz::Tz,
    #[serde(default = "default_fire_at")]
    pub fire_at: NaiveTime,
    #[serde(default = "default_pharmacy_name")]
    pub pharmacy_name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub email: EmailSettings,
    #[serde(default)]
    pub reminders: ReminderSettings,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            fire_at: default_fire_at(),
            pharmacy_name: default_pharmacy_name(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_email_endpoint() -> String {
    "https://api.resend.com/emails".to_owned()
}

fn default_email_timeout_secs() -> u64 {
    30
}

fn default_timezone() -> chrono_tz::Tz {
    chrono_tz::UTC
}

fn default_fire_at() -> NaiveTime {
    NaiveTime::MIN
}

fn default_pharmacy_name() -> String {
    "Defepe Pharmacy".to_owned()
}
