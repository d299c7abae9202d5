use chrono::Duration;

// === Limits ===
pub const PAGE_SIZE: usize = 10;
pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_COMMENT_LENGTH: usize = 5000;
pub const MAX_GROUP_TITLE_LENGTH: usize = 200;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 3;
pub const IMAGE_UPLOAD_DIR: &str = "posts/";
pub const INDEX_CACHE_PREFIX: &str = "index_page";
pub const LOGIN_URL: &str = "/auth/login/";

// === Store keys ===
pub const USERS_LIST_KEY: &str = "users_list";
pub const GROUPS_LIST_KEY: &str = "groups_list";
pub const FEED_KEY: &str = "feed";
pub const TOKENS_LIST_KEY: &str = "tokens_list";
pub const CACHE_KEYS_KEY: &str = "cache_keys";

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn group_key(id: &str) -> String {
    format!("group:{}", id)
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

pub fn comment_key(id: &str) -> String {
    format!("comment:{}", id)
}

pub fn comments_key(post_id: &str) -> String {
    format!("comments:{}", post_id)
}

pub fn followings_key(user_id: &str) -> String {
    format!("followings:{}", user_id)
}

pub fn token_key(token: &str) -> String {
    format!("token:{}", token)
}

pub fn cache_key(prefix: &str, uri: &str) -> String {
    format!("cache:{}:{}", prefix, uri)
}

// === Environment ===
pub const DEFAULT_TOKEN_EXPIRATION_HOURS: i64 = 24;
pub const DEFAULT_INDEX_CACHE_SECONDS: i64 = 20;

pub fn token_expiration_hours() -> i64 {
    std::env::var("FEEDBOARD_TOKEN_EXPIRATION_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_EXPIRATION_HOURS)
}

pub fn index_cache_seconds() -> i64 {
    std::env::var("FEEDBOARD_INDEX_CACHE_SECONDS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_INDEX_CACHE_SECONDS)
}

/// Token lifetime; hours outside chrono's range fall back to the default.
pub fn token_lifetime() -> Duration {
    hours_or_default(token_expiration_hours())
}

/// Home page cache lifetime; seconds outside chrono's range fall back to the default.
pub fn index_cache_ttl() -> Duration {
    seconds_or_default(index_cache_seconds())
}

fn hours_or_default(hours: i64) -> Duration {
    Duration::try_hours(hours).unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_EXPIRATION_HOURS))
}

fn seconds_or_default(seconds: i64) -> Duration {
    Duration::try_seconds(seconds).unwrap_or_else(|| Duration::seconds(DEFAULT_INDEX_CACHE_SECONDS))
}

pub fn bind_address() -> String {
    std::env::var("FEEDBOARD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:80".to_string())
}

pub fn seed_demo_data() -> bool {
    std::env::var("FEEDBOARD_SEED_DEMO")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}
