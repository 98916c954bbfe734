use std::env;

use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    /// "sqlite" or "memory" (offline simulation with the built-in roster).
    pub store_backend: String,
    pub roster_file: Option<String>,

    pub scan_cooldown_secs: u64,
    pub batch_size: usize,
    pub batch_timeout_secs: u64,
    pub reader_poll_ms: u64,
    pub cache_capacity: u64,

    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://attendance.db".to_string()),
            store_backend: env::var("STORE_BACKEND").unwrap_or_else(|_| "sqlite".to_string()),
            roster_file: env::var("ROSTER_FILE").ok(),

            scan_cooldown_secs: env::var("SCAN_COOLDOWN_SECS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap(),
            batch_size: env::var("BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap(),
            batch_timeout_secs: env::var("BATCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap(),
            reader_poll_ms: env::var("READER_POLL_MS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap(),
            cache_capacity: env::var("CACHE_CAPACITY")
                .unwrap_or_else(|_| "100000".to_string())
                .parse()
                .unwrap(),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }
}
