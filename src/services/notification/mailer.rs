use anyhow::Context;
use async_trait::async_trait;

use super::{BookingNotice, Notifier};

pub struct MailApiNotifier {
    base_url: String,
    api_key: String,
    from_address: String,
    client: reqwest::Client,
}

impl MailApiNotifier {
    pub fn new(base_url: String, api_key: String, from_address: String) -> Self {
        Self {
            base_url,
            api_key,
            from_address,
            client: reqwest::Client::new(),
        }
    }

    async fn deliver(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            tracing::warn!(to = %to, subject = %subject, "mail API key not configured, dropping email");
            return Ok(());
        }

        let url = format!("{}/messages", self.base_url);

        self.client
            .post(&url)
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", self.from_address.as_str()),
                ("to", to),
                ("subject", subject),
                ("text", body),
            ])
            .send()
            .await
            .context("failed to send mail request")?
            .error_for_status()
            .context("mail API returned error")?;

        Ok(())
    }
}

fn describe_court(notice: &BookingNotice) -> String {
    match (&notice.court_name, &notice.sport_name) {
        (Some(court), Some(sport)) => format!("{court} ({sport})"),
        (Some(court), None) => court.clone(),
        _ => "your court".to_string(),
    }
}

#[async_trait]
impl Notifier for MailApiNotifier {
    async fn send_booking_confirmation(&self, notice: &BookingNotice) -> anyhow::Result<()> {
        let subject = format!("Booking {} confirmed", notice.booking_id);
        let body = format!(
            "Hi {},\n\nYour booking {} for {} has been approved.\n\nFrom: {}\nTo: {}\n\nSee you on the court!",
            notice.recipient_name,
            notice.booking_id,
            describe_court(notice),
            notice.starts_at.format("%Y-%m-%d %H:%M"),
            notice.ends_at.format("%Y-%m-%d %H:%M"),
        );
        self.deliver(&notice.recipient, &subject, &body).await
    }

    async fn send_booking_rejection(&self, notice: &BookingNotice) -> anyhow::Result<()> {
        let subject = format!("Booking {} rejected", notice.booking_id);
        let body = format!(
            "Hi {},\n\nUnfortunately your booking {} for {} could not be accommodated.\n\nRequested from: {}\nRequested to: {}\n\nPlease pick another time slot.",
            notice.recipient_name,
            notice.booking_id,
            describe_court(notice),
            notice.starts_at.format("%Y-%m-%d %H:%M"),
            notice.ends_at.format("%Y-%m-%d %H:%M"),
        );
        self.deliver(&notice.recipient, &subject, &body).await
    }
}
