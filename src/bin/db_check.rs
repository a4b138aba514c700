//! Database connectivity diagnostic.
//!
//! Resolves the database host, reports which address families it resolves
//! to, then connects and checks that the notifications schema is present.
//! Exits non-zero on the first failing step.

use std::time::{Duration, Instant};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/deskhub".to_string());
    let url = url::Url::parse(&database_url).context("DATABASE_URL is not a valid URL")?;

    let host = url.host_str().unwrap_or("localhost").to_string();
    let port = url.port().unwrap_or(5432);
    println!("Target: {}:{} (user: {})", host, port, url.username());

    println!("Resolving {}...", host);
    let addrs: Vec<_> = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("DNS resolution failed for {}", host))?
        .collect();
    let v4 = addrs.iter().filter(|a| a.is_ipv4()).count();
    let v6 = addrs.iter().filter(|a| a.is_ipv6()).count();
    for addr in &addrs {
        println!("  {}", addr);
    }
    println!("  {} IPv4, {} IPv6", v4, v6);
    if v4 == 0 && v6 > 0 {
        println!("  warning: host resolves to IPv6 only; networks without IPv6 egress cannot reach it");
    }

    println!("Connecting...");
    let started = Instant::now();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&database_url)
        .await
        .context("connection failed")?;
    println!("  connected in {} ms", started.elapsed().as_millis());

    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&pool)
        .await?;
    println!("  server: {}", version);

    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_name = 'notifications')",
    )
    .fetch_one(&pool)
    .await?;

    if has_table {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&pool)
            .await?;
        println!("  notifications table present ({} rows)", total);
    } else {
        println!("  notifications table missing: start the server once to run migrations");
    }

    println!("Database check passed.");
    Ok(())
}
