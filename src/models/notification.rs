use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a notification. Selects the icon and the action set in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    MeetingInvite,
    Chat,
    Task,
    Generic,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::MeetingInvite => "meeting_invite",
            NotificationType::Chat => "chat",
            NotificationType::Task => "task",
            NotificationType::Generic => "generic",
        }
    }
}

impl std::str::FromStr for NotificationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meeting_invite" => Ok(NotificationType::MeetingInvite),
            "chat" => Ok(NotificationType::Chat),
            "task" => Ok(NotificationType::Task),
            "generic" => Ok(NotificationType::Generic),
            other => anyhow::bail!(
                "unknown notification type '{}'. Must be one of meeting_invite, chat, task, generic",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    /// Flips false -> true once; never reverted.
    pub is_read: bool,
    /// Opaque payload, only interpreted by type-specific actions.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub time: DateTime<Utc>,
}

impl Notification {
    /// `data.meetingId` when present as a non-empty string.
    pub fn meeting_id(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .get("meetingId")?
            .as_str()
            .filter(|id| !id.is_empty())
    }
}

/// Payload accepted from event producers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Body of `GET /api/notifications/unread-count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// Body of `PATCH /api/notifications/read-all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadAllResult {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format_is_camel_case() {
        let n = Notification {
            id: 7,
            kind: NotificationType::MeetingInvite,
            title: "Standup".into(),
            message: "Daily sync".into(),
            is_read: false,
            data: Some(json!({"meetingId": "abc"})),
            time: "2026-10-19T12:00:00Z".parse().unwrap(),
        };

        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["id"], 7);
        assert_eq!(v["type"], "meeting_invite");
        assert_eq!(v["isRead"], false);
        assert_eq!(v["data"]["meetingId"], "abc");
        assert_eq!(v["time"], "2026-10-19T12:00:00Z");
    }

    #[test]
    fn test_missing_data_deserializes_as_none() {
        let n: Notification = serde_json::from_value(json!({
            "id": 1,
            "type": "chat",
            "title": "Hi",
            "message": "",
            "isRead": true,
            "time": "2026-10-19T12:00:00Z"
        }))
        .unwrap();
        assert!(n.data.is_none());
        assert_eq!(n.meeting_id(), None);
    }

    #[test]
    fn test_meeting_id_requires_non_empty_string() {
        let mut n: Notification = serde_json::from_value(json!({
            "id": 2,
            "type": "meeting_invite",
            "title": "Call",
            "message": "",
            "isRead": false,
            "data": {"meetingId": ""},
            "time": "2026-10-19T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(n.meeting_id(), None);

        n.data = Some(json!({"meetingId": 42}));
        assert_eq!(n.meeting_id(), None);

        n.data = Some(json!({"meetingId": "abc"}));
        assert_eq!(n.meeting_id(), Some("abc"));
    }

    #[test]
    fn test_type_parses_from_cli_strings() {
        assert_eq!(
            "meeting_invite".parse::<NotificationType>().unwrap(),
            NotificationType::MeetingInvite
        );
        assert!("reminder".parse::<NotificationType>().is_err());
    }
}
