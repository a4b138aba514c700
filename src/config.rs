use serde::Deserialize;

const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_SUPABASE_JWT_SECRET";

/// Which `NotificationStore` backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub store: StoreBackend,
    pub db_max_connections: u32,
    /// Log every SQL statement at debug level.
    pub log_sql: bool,
    /// HS256 secret used by the identity provider to sign session tokens.
    pub jwt_secret: String,
    /// Key for the producer endpoint. Unset = endpoint disabled.
    pub admin_key: Option<String>,
    /// Upper bound on `GET /api/notifications`.
    pub list_limit: i64,
    pub dashboard_origin: String,
    /// Emit JSON log lines instead of the human format.
    pub log_json: bool,
}

impl Config {
    /// Config for in-process servers in tests and local demos.
    pub fn for_memory(jwt_secret: &str, admin_key: Option<&str>) -> Self {
        Self {
            port: 0,
            database_url: String::new(),
            store: StoreBackend::Memory,
            db_max_connections: 1,
            log_sql: false,
            jwt_secret: jwt_secret.to_string(),
            admin_key: admin_key.map(String::from),
            list_limit: 50,
            dashboard_origin: "http://localhost:3000".to_string(),
            log_json: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let jwt_secret = std::env::var("SUPABASE_JWT_SECRET")
        .unwrap_or_else(|_| PLACEHOLDER_JWT_SECRET.into());

    if jwt_secret == PLACEHOLDER_JWT_SECRET {
        let env_mode = std::env::var("DESKHUB_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "SUPABASE_JWT_SECRET is still the insecure placeholder. \
                 Set the project's JWT secret before running in production."
            );
        }
        eprintln!("⚠️  SUPABASE_JWT_SECRET is not set — using insecure placeholder.");
    }

    let store = match std::env::var("DESKHUB_STORE")
        .unwrap_or_else(|_| "postgres".into())
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "postgres" | "pg" => StoreBackend::Postgres,
        "memory" | "mem" => StoreBackend::Memory,
        other => anyhow::bail!("invalid DESKHUB_STORE '{}': expected postgres or memory", other),
    };

    Ok(Config {
        port: std::env::var("DESKHUB_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/deskhub".into()),
        store,
        db_max_connections: std::env::var("DESKHUB_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10),
        log_sql: env_flag("DESKHUB_LOG_SQL"),
        jwt_secret,
        admin_key: std::env::var("DESKHUB_ADMIN_KEY")
            .ok()
            .filter(|k| !k.is_empty()),
        list_limit: std::env::var("DESKHUB_LIST_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &i64| *v > 0)
            .unwrap_or(50),
        dashboard_origin: std::env::var("DASHBOARD_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".into()),
        log_json: std::env::var("DESKHUB_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false),
    })
}
