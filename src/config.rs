use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub tier_job_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "courtbook.db".to_string()),
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.mailgun.net/v3/mg.courtbook.example".to_string()),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "bookings@courtbook.example".to_string()),
            tier_job_interval_secs: env::var("TIER_JOB_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
        }
    }
}
