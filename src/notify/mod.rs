//! Push message handling and notification click routing.
//!
//! A push message may carry a JSON payload overriding the configured
//! title/body; everything else about the notification is fixed. Clicking
//! the `view` action brings the dashboard to the foreground; `dismiss`
//! just closes the notification.

use serde::Deserialize;
use tracing::debug;

use crate::config::NotificationDefaults;

/// Notification grouping tag
const NOTIFICATION_TAG: &str = "student-alert";

/// Route the `view` action navigates to
const DASHBOARD_ROUTE: &str = "/dashboard";

/// Optional overrides carried in a push message payload.
#[derive(Debug, Default, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// A system notification ready for the host runtime to display.
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

/// What the host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Bring a page to the foreground (or open one) at this route.
    OpenWindow(String),
}

/// Build the notification for an incoming push message. A missing or
/// malformed payload falls back to the configured defaults.
pub fn on_push(payload: Option<&[u8]>, defaults: &NotificationDefaults) -> Notification {
    let overrides = payload
        .map(|bytes| match serde_json::from_slice::<PushPayload>(bytes) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "Malformed push payload, using defaults");
                PushPayload::default()
            }
        })
        .unwrap_or_default();

    Notification {
        title: overrides.title.unwrap_or_else(|| defaults.title.clone()),
        body: overrides.body.unwrap_or_else(|| defaults.body.clone()),
        icon: defaults.icon.clone(),
        badge: defaults.badge.clone(),
        tag: NOTIFICATION_TAG.to_string(),
        require_interaction: true,
        actions: vec![
            NotificationAction {
                action: "view".to_string(),
                title: "View Alert".to_string(),
                icon: "/action-view.png".to_string(),
            },
            NotificationAction {
                action: "dismiss".to_string(),
                title: "Dismiss".to_string(),
                icon: "/action-dismiss.png".to_string(),
            },
        ],
    }
}

/// The notification is always closed; only `view` navigates.
pub fn on_notification_click(action: &str) -> Option<ClickAction> {
    match action {
        "view" => Some(ClickAction::OpenWindow(DASHBOARD_ROUTE.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> NotificationDefaults {
        NotificationDefaults::default()
    }

    #[test]
    fn test_push_without_payload_uses_defaults() {
        let notification = on_push(None, &defaults());
        assert_eq!(notification.title, "Counselling Dashboard");
        assert_eq!(notification.body, "New student alert available");
        assert_eq!(notification.tag, "student-alert");
        assert!(notification.require_interaction);
        assert_eq!(notification.actions.len(), 2);
    }

    #[test]
    fn test_push_payload_overrides_title_and_body() {
        let payload = br#"{"title": "High risk alert", "body": "Student 42 moved to high risk"}"#;
        let notification = on_push(Some(payload), &defaults());
        assert_eq!(notification.title, "High risk alert");
        assert_eq!(notification.body, "Student 42 moved to high risk");
        assert_eq!(notification.icon, "/icon-192.png");
    }

    #[test]
    fn test_partial_payload_keeps_default_body() {
        let payload = br#"{"title": "High risk alert"}"#;
        let notification = on_push(Some(payload), &defaults());
        assert_eq!(notification.title, "High risk alert");
        assert_eq!(notification.body, "New student alert available");
    }

    #[test]
    fn test_malformed_payload_falls_back_to_defaults() {
        let notification = on_push(Some(b"not json"), &defaults());
        assert_eq!(notification.title, "Counselling Dashboard");
    }

    #[test]
    fn test_view_click_opens_dashboard() {
        assert_eq!(
            on_notification_click("view"),
            Some(ClickAction::OpenWindow("/dashboard".to_string()))
        );
    }

    #[test]
    fn test_dismiss_and_unknown_clicks_do_nothing() {
        assert_eq!(on_notification_click("dismiss"), None);
        assert_eq!(on_notification_click("snooze"), None);
    }
}
