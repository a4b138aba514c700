//! Notification feed view model.
//!
//! The feed never edits notifications it has fetched. Every user action that
//! changes read state goes through [`NotificationsClient`], and the feed shows
//! the new state only after the invalidated queries are fetched again.

use std::sync::Arc;

use serde::Serialize;

use crate::models::notification::{Notification, NotificationType};

use super::mutation::NotificationsClient;
use super::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Calendar,
    Message,
    Check,
    Bell,
}

impl From<NotificationType> for Icon {
    fn from(kind: NotificationType) -> Self {
        match kind {
            NotificationType::MeetingInvite => Icon::Calendar,
            NotificationType::Chat => Icon::Message,
            NotificationType::Task => Icon::Check,
            NotificationType::Generic => Icon::Bell,
        }
    }
}

impl Icon {
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Calendar => "📅",
            Icon::Message => "💬",
            Icon::Check => "☑",
            Icon::Bell => "🔔",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedAction {
    Join,
    Reject,
}

/// Actions offered for `n`. Only unread meeting invites get any.
pub fn actions_for(n: &Notification) -> Vec<FeedAction> {
    match (n.kind, n.is_read) {
        (NotificationType::MeetingInvite, false) => vec![FeedAction::Join, FeedAction::Reject],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    pub notification: Notification,
    pub icon: Icon,
    pub actions: Vec<FeedAction>,
}

impl From<Notification> for FeedEntry {
    fn from(notification: Notification) -> Self {
        Self {
            icon: notification.kind.into(),
            actions: actions_for(&notification),
            notification,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub entries: Vec<FeedEntry>,
    pub unread_count: i64,
}

impl FeedSnapshot {
    pub fn entry(&self, id: i64) -> Option<&FeedEntry> {
        self.entries.iter().find(|e| e.notification.id == id)
    }
}

/// Navigation target produced by a feed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    MeetingRoom { meeting_id: String },
}

impl Route {
    /// The meeting id is percent-encoded as a single path segment.
    pub fn path(&self) -> String {
        match self {
            Route::MeetingRoom { meeting_id } => {
                // byte_serialize writes spaces as '+' and a literal '+' as %2B
                let segment: String =
                    url::form_urlencoded::byte_serialize(meeting_id.as_bytes()).collect();
                format!("/meeting/{}", segment.replace('+', "%20"))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl std::str::FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            other => anyhow::bail!("unsupported locale '{}': expected en or ru", other),
        }
    }
}

impl Locale {
    fn meeting_rejected(&self) -> &'static str {
        match self {
            Locale::En => "Meeting invitation declined",
            Locale::Ru => "Приглашение на встречу отклонено",
        }
    }

    fn all_read(&self) -> &'static str {
        match self {
            Locale::En => "All notifications marked as read",
            Locale::Ru => "Все уведомления прочитаны",
        }
    }
}

/// Confirmation shown after an action succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
}

pub struct NotificationFeed {
    client: Arc<NotificationsClient>,
    locale: Locale,
}

impl NotificationFeed {
    pub fn new(client: Arc<NotificationsClient>, locale: Locale) -> Self {
        Self { client, locale }
    }

    pub fn client(&self) -> &NotificationsClient {
        &self.client
    }

    /// Fetch the list and the unread count concurrently.
    pub async fn load(&self) -> Result<FeedSnapshot, ClientError> {
        let (notifications, unread_count) =
            futures::future::try_join(self.client.notifications(), self.client.unread_count())
                .await?;

        Ok(FeedSnapshot {
            entries: notifications.into_iter().map(FeedEntry::from).collect(),
            unread_count,
        })
    }

    /// Join a meeting invite. Navigation only: read state is left alone.
    /// `None` unless Join is one of the entry's actions and the invite
    /// carries a usable meeting id.
    pub fn join(&self, n: &Notification) -> Option<Route> {
        if !actions_for(n).contains(&FeedAction::Join) {
            return None;
        }
        match n.meeting_id() {
            Some(meeting_id) if !meeting_id.contains('/') => Some(Route::MeetingRoom {
                meeting_id: meeting_id.to_string(),
            }),
            Some(_) => {
                tracing::warn!(notification_id = n.id, "join ignored: meetingId contains '/'");
                None
            }
            None => {
                tracing::debug!(notification_id = n.id, "join ignored: no meetingId");
                None
            }
        }
    }

    /// Decline a meeting invite: acknowledge it, then confirm with a toast.
    /// Does not navigate.
    pub async fn reject(&self, id: i64) -> Result<Toast, ClientError> {
        self.client.acknowledge(id).await?;
        Ok(Toast {
            message: self.locale.meeting_rejected().to_string(),
        })
    }

    /// Container click. Acknowledges unread entries; returns whether a request
    /// was sent.
    pub async fn open(&self, n: &Notification) -> Result<bool, ClientError> {
        if n.is_read {
            return Ok(false);
        }
        self.client.acknowledge(n.id).await?;
        Ok(true)
    }

    pub async fn mark_all_read(&self) -> Result<Toast, ClientError> {
        self.client.acknowledge_all().await?;
        Ok(Toast {
            message: self.locale.all_read().to_string(),
        })
    }
}
