/// Application name
pub const APP_NAME: &str = "Parley";

/// Default HTTP API port (decision service)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default per-request decision deadline in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;

/// Default SQLite database file name
pub const DEFAULT_DATABASE_FILE: &str = "parley.db";

/// Request header carrying the caller-supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Maximum length accepted for server, role and channel names
pub const MAX_NAME_LEN: usize = 100;
