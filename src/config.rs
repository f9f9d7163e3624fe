use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: IpAddr,
    pub server_port: u16,
    pub environment: Environment,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_access_expiration_secs: u64,
    pub frontend_url: String,
    /// Pause between a resolved turn and the next planning phase. `0` starts the
    /// next turn inline with the resolving request.
    pub turn_review_delay_ms: u64,
    pub sse_heartbeat_secs: u64,
    pub tracker_data_dir: PathBuf,
}

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

const DEV_JWT_SECRET: &str = "data-architect-dev-secret";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `DATABASE_URL`, and `JWT_SECRET` outside development.
    /// Optional with defaults: `SERVER_HOST`, `SERVER_PORT`, `ENVIRONMENT`, `LOG_LEVEL`,
    /// `JWT_ACCESS_EXPIRATION_SECS`, `FRONTEND_URL`, `TURN_REVIEW_DELAY_MS`,
    /// `SSE_HEARTBEAT_SECS`, `TRACKER_DATA_DIR`.
    ///
    /// `PORT` overrides `SERVER_PORT` and host defaults to `0.0.0.0` in production.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric / address
    /// variable cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let environment = match std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let server_port = std::env::var("PORT")
            .or_else(|_| std::env::var("SERVER_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("SERVER_PORT / PORT must be a valid u16"))?;

        let default_host = if environment == Environment::Production {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let server_host = std::env::var("SERVER_HOST")
            .unwrap_or_else(|_| default_host.to_string())
            .parse::<IpAddr>()
            .map_err(|_| anyhow::anyhow!("SERVER_HOST must be a valid IP address"))?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == Environment::Development => DEV_JWT_SECRET.to_string(),
            Err(_) => anyhow::bail!("JWT_SECRET must be set outside development"),
        };

        let jwt_access_expiration_secs = env_u64("JWT_ACCESS_EXPIRATION_SECS", 7 * 24 * 3600)?;

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let turn_review_delay_ms = env_u64("TURN_REVIEW_DELAY_MS", 3000)?;
        let sse_heartbeat_secs = env_u64("SSE_HEARTBEAT_SECS", 30)?.max(1);

        let tracker_data_dir = std::env::var("TRACKER_DATA_DIR")
            .map_or_else(|_| PathBuf::from("./data"), PathBuf::from);

        Ok(Self {
            database_url,
            server_host,
            server_port,
            environment,
            log_level,
            jwt_secret,
            jwt_access_expiration_secs,
            frontend_url,
            turn_review_delay_ms,
            sse_heartbeat_secs,
            tracker_data_dir,
        })
    }

    /// Build the socket address for the server to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }

    /// Configuration used by integration tests: in-memory database, no review delay.
    #[must_use]
    pub fn for_tests(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "debug".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_access_expiration_secs: 3600,
            frontend_url: "http://localhost:5173".to_string(),
            turn_review_delay_ms: 0,
            sse_heartbeat_secs: 30,
            tracker_data_dir: std::env::temp_dir()
                .join(format!("data-architect-tracker-{}", uuid::Uuid::new_v4())),
        }
    }
}

fn env_u64(key: &str, default: u64) -> anyhow::Result<u64> {
    std::env::var(key).map_or(Ok(default), |raw| {
        raw.parse::<u64>()
            .map_err(|_| anyhow::anyhow!("{key} must be a non-negative integer"))
    })
}
