// Reminder notifications: message composition and best-effort delivery
//
// Both channels are best-effort. A failed email or chat post is logged and
// counted, never propagated, so one bad delivery cannot stall the scan.

pub mod chat;
pub mod email;

pub use chat::SlackWebhook;
pub use email::SmtpMailer;

use crate::errors::DeliveryError;
use crate::models::{EmailMessage, ReminderNotice};
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Mail relay
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError>;
}

/// Chat incoming-webhook endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatWebhook: Send + Sync {
    /// POST `{"text": text}` to the webhook
    async fn post_text(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Fixed-format reminder texts
#[derive(Debug, Clone)]
pub struct MessageComposer {
    pub recipients: Vec<String>,
    pub calendar_link: String,
    pub sender_name: String,
}

impl MessageComposer {
    pub fn email_subject(days: i64) -> String {
        format!("Content Reminder – {} day(s) to go", days)
    }

    pub fn email(&self, notice: &ReminderNotice) -> EmailMessage {
        let mut body = format!(
            "Hi Team,\n\
             \n\
             This is a {days}-day reminder.\n\
             \n\
             Topic: {topic}\n\
             Date Range: {range}\n\
             \n\
             Content Calendar:\n\
             {calendar}\n",
            days = notice.days,
            topic = notice.topic,
            range = notice.date_range,
            calendar = self.calendar_link,
        );

        if let Some(link) = &notice.doc_link {
            body.push_str(&format!("\nContent Doc:\n{}\n", link));
        }

        body.push_str(&format!(
            "\nRegards,\n{}\n(Automated content reminder)\n",
            self.sender_name
        ));

        EmailMessage {
            recipients: self.recipients.clone(),
            subject: Self::email_subject(notice.days),
            body,
        }
    }

    /// Chat text using `<url|label>` link markup
    pub fn chat_text(&self, notice: &ReminderNotice) -> String {
        let mut text = format!(
            "📣 Content Reminder\n\
             ⏳ {days} day(s) to go\n\
             🧠 Topic: {topic}\n\
             📅 Date Range: {range}\n\
             🔗 <{calendar}|Open Content Calendar>",
            days = notice.days,
            topic = notice.topic,
            range = notice.date_range,
            calendar = self.calendar_link,
        );

        if let Some(link) = &notice.doc_link {
            text.push_str(&format!("\n📄 <{}|Open Content Doc>", link));
        }

        text
    }
}

/// Which channels accepted a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub email_delivered: bool,
    pub chat_delivered: bool,
}

impl DeliveryOutcome {
    pub fn failures(&self) -> usize {
        usize::from(!self.email_delivered) + usize::from(!self.chat_delivered)
    }
}

/// Sends one reminder over every channel
pub struct ReminderNotifier {
    composer: MessageComposer,
    mailer: Arc<dyn Mailer>,
    chat: Arc<dyn ChatWebhook>,
}

impl ReminderNotifier {
    pub fn new(
        composer: MessageComposer,
        mailer: Arc<dyn Mailer>,
        chat: Arc<dyn ChatWebhook>,
    ) -> Self {
        Self {
            composer,
            mailer,
            chat,
        }
    }

    #[instrument(skip(self, notice), fields(days = notice.days, topic = %notice.topic))]
    pub async fn notify(&self, notice: &ReminderNotice) -> DeliveryOutcome {
        let email = self.composer.email(notice);
        let email_delivered = match self.mailer.send(&email).await {
            Ok(()) => {
                info!(recipients = email.recipients.len(), "Reminder email sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "Reminder email failed");
                counter!("notification_failures_total", "channel" => "email").increment(1);
                false
            }
        };

        let text = self.composer.chat_text(notice);
        let chat_delivered = match self.chat.post_text(&text).await {
            Ok(()) => {
                info!("Reminder chat message posted");
                true
            }
            Err(e) => {
                warn!(error = %e, "Reminder chat message failed");
                counter!("notification_failures_total", "channel" => "chat").increment(1);
                false
            }
        };

        DeliveryOutcome {
            email_delivered,
            chat_delivered,
        }
    }
}
