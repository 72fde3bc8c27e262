// Calendar event creation

use crate::errors::ProvisioningError;
use crate::google::{check_status, endpoint, GoogleClient};
use crate::models::{AllDayEvent, ReminderMethod};
use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Calendar able to create events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Create an all-day event and return its identifier
    async fn create_event(&self, event: &AllDayEvent) -> Result<String, ProvisioningError>;
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

/// Google Calendar (v3 REST) event service
pub struct GoogleCalendarService {
    client: GoogleClient,
    api_base: String,
    calendar_id: String,
}

impl GoogleCalendarService {
    pub fn new(
        client: GoogleClient,
        api_base: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            calendar_id: calendar_id.into(),
        }
    }
}

/// Request body for an all-day event; the end date is exclusive
pub fn event_payload(event: &AllDayEvent) -> Value {
    let overrides: Vec<Value> = event
        .reminders
        .iter()
        .map(|r| {
            let method = match r.method {
                ReminderMethod::Popup => "popup",
                ReminderMethod::Email => "email",
            };
            json!({ "method": method, "minutes": r.minutes })
        })
        .collect();

    json!({
        "summary": event.title,
        "description": event.description,
        "start": { "date": event.date.format("%Y-%m-%d").to_string() },
        "end": { "date": (event.date + Duration::days(1)).format("%Y-%m-%d").to_string() },
        "reminders": {
            "useDefault": false,
            "overrides": overrides,
        },
    })
}

#[async_trait]
impl CalendarService for GoogleCalendarService {
    #[instrument(skip(self, event), fields(title = %event.title, date = %event.date))]
    async fn create_event(&self, event: &AllDayEvent) -> Result<String, ProvisioningError> {
        let url = endpoint(
            &self.api_base,
            &["calendar", "v3", "calendars", &self.calendar_id, "events"],
        )
        .map_err(ProvisioningError::EventCreationFailed)?;

        let response = self
            .client
            .post(url)
            .json(&event_payload(event))
            .send()
            .await
            .map_err(|e| ProvisioningError::EventCreationFailed(e.to_string()))?;

        let response = check_status(response)
            .await
            .map_err(|(status, body)| ProvisioningError::Status { status, body })?;

        let created: CreatedEvent = response
            .json()
            .await
            .map_err(|e| ProvisioningError::InvalidResponse(e.to_string()))?;

        info!(event_id = %created.id, "Calendar event created");
        Ok(created.id)
    }
}
