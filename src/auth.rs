use spin_sdk::http::{Request, Response};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use crate::models::{User, TokenData};
use crate::config::*;
use crate::base::store::KvStore;
use crate::base::helpers::{verify_password, now, json_response};
use crate::base::errors::ApiError;
use crate::users::{find_by_username, get_user};

pub fn issue_token(store: &impl KvStore, user_id: &str) -> anyhow::Result<String> {
    let token = Uuid::new_v4().to_string();
    let data = TokenData {
        user_id: user_id.to_string(),
        created_at: now(),
    };
    store.set_json(&token_key(&token), &data)?;

    let mut tokens = store.get_list(TOKENS_LIST_KEY)?;
    tokens.push(token.clone());
    store.set_json(TOKENS_LIST_KEY, &tokens)?;
    Ok(token)
}

/// A token older than `lifetime` is expired; exactly `lifetime` old is still valid.
pub fn token_expired(created_at: DateTime<Utc>, at: DateTime<Utc>, lifetime: Duration) -> bool {
    at - created_at > lifetime
}

fn bearer_token(req: &Request) -> Option<&str> {
    let auth_header = req.header("Authorization")?.as_str()?;
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Resolves the bearer token to a user id. Expired tokens and tokens of
/// deleted users resolve to nothing.
pub fn validate_token(store: &impl KvStore, req: &Request) -> anyhow::Result<Option<String>> {
    let Some(token) = bearer_token(req) else {
        return Ok(None);
    };
    let Some(data) = store.get_json::<TokenData>(&token_key(token))? else {
        log::warn!("unknown bearer token presented");
        return Ok(None);
    };

    if token_expired(data.created_at, now(), token_lifetime()) {
        log::warn!("expired token for user {}", data.user_id);
        return Ok(None);
    }
    if get_user(store, &data.user_id)?.is_none() {
        return Ok(None);
    }
    Ok(Some(data.user_id))
}

pub fn current_user(store: &impl KvStore, req: &Request) -> anyhow::Result<Option<User>> {
    match validate_token(store, req)? {
        Some(user_id) => get_user(store, &user_id),
        None => Ok(None),
    }
}

// === HTTP Handlers ===

pub fn login_user(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    let creds: serde_json::Value = match serde_json::from_slice(req.body()) {
        Ok(v) => v,
        Err(_) => return Ok(ApiError::BadRequest("Invalid JSON body".to_string()).into()),
    };
    let username = creds["username"].as_str().unwrap_or_default();
    let password = creds["password"].as_str().unwrap_or_default();

    match find_by_username(store, username)? {
        Some(u) if verify_password(password, &u.password) => {
            let token = issue_token(store, &u.id)?;
            log::info!("user {} logged in", u.username);
            json_response(200, &serde_json::json!({
                "token": token,
                "user_id": u.id,
                "username": u.username,
            }))
        }
        _ => {
            log::warn!("failed login for {}", username);
            Ok(ApiError::Unauthorized.into())
        }
    }
}

pub fn logout_user(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    let Some(token) = bearer_token(req) else {
        return Ok(ApiError::Unauthorized.into());
    };

    store.delete(&token_key(token))?;
    let mut tokens = store.get_list(TOKENS_LIST_KEY)?;
    tokens.retain(|t| t != token);
    store.set_json(TOKENS_LIST_KEY, &tokens)?;

    json_response(200, &serde_json::json!({
        "message": "Logged out successfully"
    }))
}
