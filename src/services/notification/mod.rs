pub mod mailer;

use async_trait::async_trait;
use chrono::NaiveDateTime;

// Everything a notification needs, resolved up front. Callers skip the send
// entirely when the booking has no slot or no reachable user.
pub struct BookingNotice {
    pub booking_id: String,
    pub recipient: String,
    pub recipient_name: String,
    pub court_name: Option<String>,
    pub sport_name: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_booking_confirmation(&self, notice: &BookingNotice) -> anyhow::Result<()>;
    async fn send_booking_rejection(&self, notice: &BookingNotice) -> anyhow::Result<()>;
}
