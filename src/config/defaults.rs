pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3001;
pub const DEFAULT_APP_URL: &str = "http://localhost:3001";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_NAME: &str = "affiliate_cms";
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;

pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 60;

pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_FILE_SIZE_BYTES: i64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: i64 = 10;

pub const DEFAULT_PRODUCTION: bool = false;
pub const DEFAULT_RATE_LIMIT_ENABLED: bool = true;
pub const DEFAULT_GENERAL_RATE_LIMIT: i64 = 100;
pub const DEFAULT_GENERAL_RATE_WINDOW_SECS: i64 = 60;
pub const DEFAULT_GENERAL_RATE_BLOCK_SECS: i64 = 15 * 60;
pub const DEFAULT_STRICT_RATE_LIMIT: i64 = 10;
pub const DEFAULT_STRICT_RATE_WINDOW_SECS: i64 = 60;
pub const DEFAULT_STRICT_RATE_BLOCK_SECS: i64 = 60 * 60;
