use bson::{DateTime, doc, oid::ObjectId};
use sitedesk_api::routes::notification::to_response;
use sitedesk_config::Settings;
use sitedesk_db::models::{Notification, NotificationKind};

#[test]
fn notification_response_uses_wire_friendly_shapes() {
    let id = ObjectId::new();
    let row = Notification {
        id: Some(id),
        recipient_id: ObjectId::new(),
        actor_id: "auth0|uri".to_string(),
        subject_id: Some(ObjectId::new()),
        kind: NotificationKind::ExpenseAdded,
        title: "Expense Added".to_string(),
        message: "Uri Levin added an expense of 500 in Cement on Riverside House".to_string(),
        payload: doc! { "amount": 500.0, "category": "Cement" },
        is_read: false,
        created_at: DateTime::from_millis(1_700_000_000_000),
        updated_at: DateTime::from_millis(1_700_000_000_000),
    };

    let resp = to_response(row);

    assert_eq!(resp.id, id.to_hex());
    assert_eq!(resp.kind, "expense_added");
    assert_eq!(resp.payload["amount"], 500.0);
    assert_eq!(resp.payload["category"], "Cement");
    assert!(!resp.is_read);
    // RFC 3339 with the original instant intact.
    assert!(resp.created_at.starts_with("2023-11-14T"));
}

#[test]
fn default_settings_cover_the_notification_section() {
    let settings = Settings::load().unwrap();
    assert_eq!(settings.notifications.cache_window, 50);
    assert_eq!(settings.notifications.fallback_style, "sentinel");
}
