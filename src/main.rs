use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deskhub::client::{ClientConfig, NotificationFeed, NotificationsClient};
use deskhub::config::{self, Config, StoreBackend};
use deskhub::models::notification::{NewNotification, NotificationType};
use deskhub::store::{memory::MemoryStore, postgres::PgStore, NotificationStore};
use deskhub::{api, auth, cli, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "deskhub=debug,tower_http=debug".into()),
        ))
        .with(cfg.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cfg.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Notify {
            user,
            kind,
            title,
            message,
            data,
        }) => handle_notify(&cfg, &user, &kind, title, message, data).await,
        Some(cli::Commands::Feed) => handle_feed().await,
        Some(cli::Commands::Ack { id }) => handle_ack(Some(id)).await,
        Some(cli::Commands::AckAll) => handle_ack(None).await,
        Some(cli::Commands::Token { user, hours }) => {
            let user_id = uuid::Uuid::parse_str(&user).context("Invalid user id")?;
            let token = auth::issue_session(user_id, &cfg.jwt_secret, chrono::Duration::hours(hours))?;
            println!("{}", token);
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn open_store(cfg: &Config) -> anyhow::Result<Arc<dyn NotificationStore>> {
    match cfg.store {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db = PgStore::connect_with(&cfg.database_url, cfg.db_max_connections, cfg.log_sql)
                .await
                .context("failed to connect to Postgres")?;

            tracing::info!("Running migrations...");
            db.migrate().await?;
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store: notifications are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let store = open_store(&cfg).await?;
    let state = AppState::new(store, cfg);
    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("deskhub listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_notify(
    cfg: &Config,
    user: &str,
    kind: &str,
    title: String,
    message: String,
    data: Option<String>,
) -> anyhow::Result<()> {
    if cfg.store == StoreBackend::Memory {
        anyhow::bail!("notify needs a persistent store; unset DESKHUB_STORE=memory");
    }

    let user_id = uuid::Uuid::parse_str(user).context("Invalid user id")?;
    let kind: NotificationType = kind.parse()?;
    let data = data
        .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
        .transpose()
        .context("Invalid --data JSON")?;

    let store = open_store(cfg).await?;
    let n = store
        .create(
            user_id,
            &NewNotification {
                kind,
                title,
                message,
                data,
            },
        )
        .await?;

    println!(
        "Notification created:\n  ID:    {}\n  Type:  {}\n  User:  {}",
        n.id,
        n.kind.as_str(),
        user_id
    );
    Ok(())
}

fn feed_from_env() -> anyhow::Result<NotificationFeed> {
    let config = ClientConfig::from_env()?;
    let client = NotificationsClient::new(&config)?;
    Ok(NotificationFeed::new(Arc::new(client), config.locale))
}

async fn handle_feed() -> anyhow::Result<()> {
    let feed = feed_from_env()?;
    let snapshot = feed.load().await?;

    println!("Unread: {}", snapshot.unread_count);
    if snapshot.entries.is_empty() {
        println!("No notifications.");
        return Ok(());
    }

    println!("{:<8} {:<4} {:<6} {:<20} {:<30} ACTIONS", "ID", "", "READ", "TIME", "TITLE");
    for entry in &snapshot.entries {
        let n = &entry.notification;
        let actions: Vec<&str> = entry
            .actions
            .iter()
            .map(|a| match a {
                deskhub::client::FeedAction::Join => "join",
                deskhub::client::FeedAction::Reject => "reject",
            })
            .collect();
        println!(
            "{:<8} {:<4} {:<6} {:<20} {:<30} {}",
            n.id,
            entry.icon.glyph(),
            n.is_read,
            n.time.format("%Y-%m-%d %H:%M").to_string(),
            n.title,
            actions.join(",")
        );
    }
    Ok(())
}

async fn handle_ack(id: Option<i64>) -> anyhow::Result<()> {
    let feed = feed_from_env()?;
    match id {
        Some(id) => {
            feed.client().acknowledge(id).await?;
            println!("Notification {} marked as read.", id);
        }
        None => {
            let toast = feed.mark_all_read().await?;
            println!("{}", toast.message);
        }
    }
    Ok(())
}
