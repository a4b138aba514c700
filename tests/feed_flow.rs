//! End-to-end read-state reconciliation.
//!
//! `server_tests` run the feed against a real server bound to an ephemeral
//! port. `mock_tests` use wiremock to pin exact requests and simulate
//! server rejections and network failures.

use std::sync::Arc;
use std::time::Duration;

use deskhub::client::{
    ClientConfig, ClientError, FeedAction, Locale, NotificationFeed, NotificationsClient, QueryKey,
    Route,
};

fn client_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new(base_url, "test-session");
    config.query_retries = 0;
    config.stale_after = Duration::from_secs(300);
    config
}

fn feed_for(config: &ClientConfig) -> NotificationFeed {
    let client = NotificationsClient::new(config).unwrap();
    NotificationFeed::new(Arc::new(client), config.locale)
}

mod server_tests {
    use super::*;
    use deskhub::auth::issue_session;
    use deskhub::config::Config;
    use deskhub::models::notification::{NewNotification, NotificationType};
    use deskhub::store::{memory::MemoryStore, NotificationStore};
    use deskhub::{api, AppState};
    use serde_json::json;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    const SECRET: &str = "flow-secret";

    struct TestServer {
        base_url: String,
        store: Arc<MemoryStore>,
        shutdown: Option<oneshot::Sender<()>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl TestServer {
        async fn start() -> Self {
            let store = Arc::new(MemoryStore::new());
            let state = AppState::new(store.clone(), Config::for_memory(SECRET, None));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let (tx, rx) = oneshot::channel::<()>();

            let handle = tokio::spawn(async move {
                axum::serve(listener, api::app(state))
                    .with_graceful_shutdown(async move {
                        rx.await.ok();
                    })
                    .await
                    .unwrap();
            });

            Self {
                base_url: format!("http://{}", addr),
                store,
                shutdown: Some(tx),
                handle,
            }
        }

        async fn stop(mut self) {
            if let Some(tx) = self.shutdown.take() {
                tx.send(()).ok();
            }
            self.handle.await.ok();
        }

        fn feed(&self, user: Uuid) -> NotificationFeed {
            let token = issue_session(user, SECRET, chrono::Duration::minutes(10)).unwrap();
            let mut config = client_config(&self.base_url);
            config.token = token;
            feed_for(&config)
        }

        async fn seed(&self, user: Uuid, kind: NotificationType, data: Option<serde_json::Value>) -> i64 {
            self.store
                .create(
                    user,
                    &NewNotification {
                        kind,
                        title: "seeded".into(),
                        message: String::new(),
                        data,
                    },
                )
                .await
                .unwrap()
                .id
        }
    }

    /// Seven unread notifications, ids 1..=7; id 7 is a meeting invite.
    async fn seven(server: &TestServer, user: Uuid) {
        for _ in 0..6 {
            server.seed(user, NotificationType::Chat, None).await;
        }
        let id = server
            .seed(user, NotificationType::MeetingInvite, Some(json!({"meetingId": "room-7"})))
            .await;
        assert_eq!(id, 7);
    }

    #[tokio::test]
    async fn test_acknowledge_then_refetch_shows_read_and_decrement() {
        let server = TestServer::start().await;
        let user = Uuid::new_v4();
        seven(&server, user).await;
        let feed = server.feed(user);

        let before = feed.load().await.unwrap();
        assert_eq!(before.unread_count, 7);
        assert!(!before.entry(7).unwrap().notification.is_read);

        let echo = feed.client().acknowledge(7).await.unwrap().unwrap();
        assert!(echo.is_read);

        let after = feed.load().await.unwrap();
        let entry = after.entry(7).unwrap();
        assert!(entry.notification.is_read);
        assert!(entry.actions.is_empty());
        assert_eq!(after.unread_count, before.unread_count - 1);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_acknowledge_twice_is_idempotent() {
        let server = TestServer::start().await;
        let user = Uuid::new_v4();
        seven(&server, user).await;
        let feed = server.feed(user);

        feed.client().acknowledge(7).await.unwrap();
        let second = feed.client().acknowledge(7).await.unwrap().unwrap();
        assert!(second.is_read);

        let snapshot = feed.load().await.unwrap();
        assert_eq!(snapshot.unread_count, 6);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_rejected_acknowledge_leaves_cache_untouched() {
        let server = TestServer::start().await;
        let user = Uuid::new_v4();
        seven(&server, user).await;
        let feed = server.feed(user);
        feed.load().await.unwrap();

        // Unknown id: the server answers 404.
        let err = feed.client().acknowledge(999).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 404 }));
        assert!(!feed.client().cache().is_stale(QueryKey::NOTIFICATIONS));
        assert!(!feed.client().cache().is_stale(QueryKey::UNREAD_COUNT));

        let snapshot = feed.load().await.unwrap();
        assert_eq!(snapshot.unread_count, 7);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_network_failure_keeps_notification_unread() {
        let server = TestServer::start().await;
        let user = Uuid::new_v4();
        seven(&server, user).await;
        let feed = server.feed(user);
        feed.load().await.unwrap();

        server.stop().await;

        let err = feed.client().acknowledge(7).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)), "got {:?}", err);

        // Nothing was invalidated, so the read is served from cache as before.
        let snapshot = feed.load().await.unwrap();
        assert!(!snapshot.entry(7).unwrap().notification.is_read);
        assert_eq!(snapshot.unread_count, 7);
    }

    #[tokio::test]
    async fn test_concurrent_acknowledgments_commute() {
        let server = TestServer::start().await;
        let user = Uuid::new_v4();
        seven(&server, user).await;
        let feed = server.feed(user);

        let client = feed.client();
        let (a, b, c) = tokio::join!(
            client.acknowledge(2),
            client.acknowledge(5),
            client.acknowledge(5)
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        let snapshot = feed.load().await.unwrap();
        assert_eq!(snapshot.unread_count, 5);
        assert!(snapshot.entry(2).unwrap().notification.is_read);
        assert!(snapshot.entry(5).unwrap().notification.is_read);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_open_acknowledges_only_unread() {
        let server = TestServer::start().await;
        let user = Uuid::new_v4();
        seven(&server, user).await;
        let feed = server.feed(user);

        let snapshot = feed.load().await.unwrap();
        let n = snapshot.entry(3).unwrap().notification.clone();
        assert!(feed.open(&n).await.unwrap());

        let snapshot = feed.load().await.unwrap();
        let n = snapshot.entry(3).unwrap().notification.clone();
        assert!(n.is_read);
        assert!(!feed.open(&n).await.unwrap(), "read entries send no request");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_mark_all_read_clears_badge() {
        let server = TestServer::start().await;
        let user = Uuid::new_v4();
        seven(&server, user).await;
        let feed = server.feed(user);
        feed.load().await.unwrap();

        let toast = feed.mark_all_read().await.unwrap();
        assert_eq!(toast.message, "All notifications marked as read");

        let snapshot = feed.load().await.unwrap();
        assert_eq!(snapshot.unread_count, 0);
        assert!(snapshot.entries.iter().all(|e| e.notification.is_read));

        server.stop().await;
    }
}

mod mock_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_reads(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/notifications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 2, "type": "meeting_invite", "title": "Sync", "message": "",
                 "isRead": false, "data": {"meetingId": "abc"}, "time": "2026-10-19T12:01:00Z"},
                {"id": 1, "type": "chat", "title": "Hi", "message": "",
                 "isRead": false, "data": null, "time": "2026-10-19T12:00:00Z"}
            ])))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/notifications/unread-count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 2})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_feed_renders_actions_by_type() {
        let server = MockServer::start().await;
        mount_reads(&server).await;
        let feed = feed_for(&client_config(&server.uri()));

        let snapshot = feed.load().await.unwrap();
        assert_eq!(snapshot.unread_count, 2);
        assert_eq!(
            snapshot.entry(2).unwrap().actions,
            vec![FeedAction::Join, FeedAction::Reject]
        );
        assert!(snapshot.entry(1).unwrap().actions.is_empty());
    }

    #[tokio::test]
    async fn test_join_navigates_without_acknowledging() {
        let server = MockServer::start().await;
        mount_reads(&server).await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let feed = feed_for(&client_config(&server.uri()));

        let snapshot = feed.load().await.unwrap();
        let invite = &snapshot.entry(2).unwrap().notification;
        let route = feed.join(invite).unwrap();
        assert_eq!(route, Route::MeetingRoom { meeting_id: "abc".into() });
        assert!(!invite.is_read);
        assert!(!feed.client().cache().is_stale(QueryKey::NOTIFICATIONS));
    }

    #[tokio::test]
    async fn test_reject_acknowledges_and_marks_both_queries_stale() {
        let server = MockServer::start().await;
        mount_reads(&server).await;
        Mock::given(method("PATCH"))
            .and(path("/api/notifications/2/read"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let feed = feed_for(&client_config(&server.uri()));

        feed.load().await.unwrap();
        let toast = feed.reject(2).await.unwrap();
        assert_eq!(toast.message, "Meeting invitation declined");

        let cache = feed.client().cache();
        assert!(cache.is_stale(QueryKey::NOTIFICATIONS));
        assert!(cache.is_stale(QueryKey::UNREAD_COUNT));
    }

    #[tokio::test]
    async fn test_reject_toast_is_localized() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/notifications/2/read"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let mut config = client_config(&server.uri());
        config.locale = Locale::Ru;
        let feed = feed_for(&config);

        let toast = feed.reject(2).await.unwrap();
        assert_eq!(toast.message, "Приглашение на встречу отклонено");
    }

    #[tokio::test]
    async fn test_server_error_on_reject_invalidates_nothing() {
        let server = MockServer::start().await;
        mount_reads(&server).await;
        Mock::given(method("PATCH"))
            .and(path("/api/notifications/2/read"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        let feed = feed_for(&client_config(&server.uri()));

        feed.load().await.unwrap();
        let err = feed.reject(2).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 500 }));

        let cache = feed.client().cache();
        assert!(!cache.is_stale(QueryKey::NOTIFICATIONS));
        assert!(!cache.is_stale(QueryKey::UNREAD_COUNT));

        let snapshot = feed.load().await.unwrap();
        assert!(!snapshot.entry(2).unwrap().notification.is_read);
    }

    #[tokio::test]
    async fn test_mutations_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/notifications/1/read"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        let mut config = client_config(&server.uri());
        config.query_retries = 3;
        let feed = feed_for(&config);

        assert!(feed.client().acknowledge(1).await.is_err());
    }

    #[tokio::test]
    async fn test_fresh_queries_hit_server_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/unread-count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 4})))
            .expect(1)
            .mount(&server)
            .await;
        let feed = feed_for(&client_config(&server.uri()));

        for _ in 0..3 {
            assert_eq!(feed.client().unread_count().await.unwrap(), 4);
        }
    }

    #[tokio::test]
    async fn test_negative_count_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/unread-count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": -1})))
            .mount(&server)
            .await;
        let feed = feed_for(&client_config(&server.uri()));
        assert_eq!(feed.client().unread_count().await.unwrap(), 0);
    }
}
