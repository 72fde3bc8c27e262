// Integration tests for the REST adapters against a mock HTTP server

use common::calendar::{CalendarService, GoogleCalendarService};
use common::documents::{DocumentStore, DriveDocumentStore};
use common::errors::{DeliveryError, ProvisioningError, SheetError};
use common::google::GoogleClient;
use common::models::{AllDayEvent, Cell, CellValue, EventReminder, ReminderMethod};
use common::notify::{ChatWebhook, SlackWebhook};
use common::sheets::{GoogleSheetsStore, SheetStore};
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> GoogleClient {
    GoogleClient::new("test-token", 5).unwrap()
}

#[tokio::test]
async fn test_sheets_read_recovers_link_targets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.+$"))
        .and(query_param("valueRenderOption", "FORMATTED_VALUE"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "'Content Calendar'!A1:H3",
            "majorDimension": "ROWS",
            "values": [
                ["Week", "Date Range", "", "Topic", "", "", "Sent", "Doc"],
                ["W4", "20/1-26/1", "", "Launch", "", "", "5,3", "Content Doc"],
                ["W5", "27/1-2/2", "", "Recap"]
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.+$"))
        .and(query_param("valueRenderOption", "FORMULA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                ["Week", "Date Range", "", "Topic", "", "", "Sent", "Doc"],
                ["W4", "20/1-26/1", "", "Launch", "", "", "5,3",
                 "=HYPERLINK(\"https://docs.example.com/d/abc\", \"Content Doc\")"],
                ["W5", "27/1-2/2", "", "Recap"]
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = GoogleSheetsStore::new(client(), server.uri(), "sheet-1");
    let rows = store.read_rows("Content Calendar").await.unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][6], Cell::Text("5,3".to_string()));
    assert_eq!(
        rows[1][7],
        Cell::Text("https://docs.example.com/d/abc".to_string())
    );
    // Short rows stay short; missing cells read as empty downstream
    assert_eq!(rows[2].len(), 4);
}

#[tokio::test]
async fn test_sheets_missing_tab_is_sheet_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Unable to parse range: 'Nope'" }
        })))
        .mount(&server)
        .await;

    let store = GoogleSheetsStore::new(client(), server.uri(), "sheet-1");
    let result = store.read_rows("Nope").await;
    assert!(matches!(result, Err(SheetError::SheetNotFound(_))));
}

#[tokio::test]
async fn test_sheets_write_text_is_raw() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.+G2$"))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_partial_json(json!({ "values": [["5,3"]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updatedCells": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let store = GoogleSheetsStore::new(client(), server.uri(), "sheet-1");
    store
        .write_cell("Content Calendar", 2, 7, CellValue::Text("5,3".to_string()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sheets_write_link_is_user_entered_formula() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.+H2$"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .and(body_partial_json(json!({
            "values": [["=HYPERLINK(\"https://docs.example.com/d/abc\", \"Content Doc\")"]]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = GoogleSheetsStore::new(client(), server.uri(), "sheet-1");
    store
        .write_cell(
            "Content Calendar",
            2,
            8,
            CellValue::Link {
                url: "https://docs.example.com/d/abc".to_string(),
                label: "Content Doc".to_string(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sheets_write_failure_is_request_failed() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let store = GoogleSheetsStore::new(client(), server.uri(), "sheet-1");
    let result = store
        .write_cell("Content Calendar", 2, 7, CellValue::Text("5".to_string()))
        .await;
    assert!(matches!(result, Err(SheetError::RequestFailed(msg)) if msg.contains("429")));
}

#[tokio::test]
async fn test_drive_copy_and_share() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/drive/v3/files/TEMPLATE/copy"))
        .and(body_json(json!({ "name": "20/1-26/1 - Launch - Content Doc" })))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "doc-1",
            "webViewLink": "https://docs.google.com/document/d/doc-1/edit?usp=drivesdk"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/drive/v3/files/doc-1/permissions"))
        .and(body_json(json!({ "role": "writer", "type": "anyone" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "anyoneWithLink" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = DriveDocumentStore::new(client(), server.uri());
    let document = store
        .copy_document("TEMPLATE", "20/1-26/1 - Launch - Content Doc")
        .await
        .unwrap();
    assert_eq!(document.id, "doc-1");
    assert_eq!(
        document.url,
        "https://docs.google.com/document/d/doc-1/edit?usp=drivesdk"
    );

    store.share_with_link(&document.id).await.unwrap();
}

#[tokio::test]
async fn test_drive_copy_without_view_link_builds_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files/TEMPLATE/copy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "doc-2" })))
        .mount(&server)
        .await;

    let store = DriveDocumentStore::new(client(), server.uri());
    let document = store.copy_document("TEMPLATE", "title").await.unwrap();
    assert_eq!(document.url, "https://docs.google.com/document/d/doc-2/edit");
}

#[tokio::test]
async fn test_drive_copy_rejection_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("File not found: TEMPLATE"))
        .mount(&server)
        .await;

    let store = DriveDocumentStore::new(client(), server.uri());
    let result = store.copy_document("TEMPLATE", "title").await;
    assert!(matches!(
        result,
        Err(ProvisioningError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_calendar_creates_all_day_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(body_json(json!({
            "summary": "Webinar",
            "description": "Broad Theme: N/A\nType: N/A\nLead Magnet: N/A\nCopy Link: N/A",
            "start": { "date": "2025-02-03" },
            "end": { "date": "2025-02-04" },
            "reminders": {
                "useDefault": false,
                "overrides": [
                    { "method": "popup", "minutes": 2880 },
                    { "method": "email", "minutes": 2880 }
                ]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-123",
            "status": "confirmed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = GoogleCalendarService::new(client(), server.uri(), "primary");
    let event = AllDayEvent {
        title: "Webinar".to_string(),
        description: "Broad Theme: N/A\nType: N/A\nLead Magnet: N/A\nCopy Link: N/A".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
        reminders: vec![
            EventReminder {
                method: ReminderMethod::Popup,
                minutes: 2880,
            },
            EventReminder {
                method: ReminderMethod::Email,
                minutes: 2880,
            },
        ],
    };

    assert_eq!(calendar.create_event(&event).await.unwrap(), "evt-123");
}

#[tokio::test]
async fn test_chat_webhook_posts_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/hook"))
        .and(body_json(json!({ "text": "⏳ 3 day(s) to go" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = SlackWebhook::new(format!("{}/services/hook", server.uri()), 5).unwrap();
    webhook.post_text("⏳ 3 day(s) to go").await.unwrap();
}

#[tokio::test]
async fn test_chat_webhook_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid_token"))
        .mount(&server)
        .await;

    let webhook = SlackWebhook::new(server.uri(), 5).unwrap();
    let result = webhook.post_text("hello").await;
    assert!(matches!(
        result,
        Err(DeliveryError::WebhookStatus { status: 403, ref body }) if body == "invalid_token"
    ));
}

#[tokio::test]
async fn test_chat_self_test_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({ "text": "Chat webhook test successful" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = SlackWebhook::new(server.uri(), 5).unwrap();
    assert_eq!(webhook.send_test_message().await.unwrap(), 200);
}
