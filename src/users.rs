use spin_sdk::http::{Request, Response};
use regex::Regex;
use std::sync::OnceLock;
use crate::models::{User, TokenData};
use crate::base::store::KvStore;
use crate::base::helpers::{hash_password, new_id, json_response};
use crate::base::errors::ApiError;
use crate::config::*;
use crate::{comments, follow, posts};

fn username_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Regex should compile"))
}

fn build_user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "username": user.username,
        "bio": user.bio.as_ref().unwrap_or(&String::new()),
    })
}

pub fn get_user(store: &impl KvStore, user_id: &str) -> anyhow::Result<Option<User>> {
    store.get_json(&user_key(user_id))
}

pub fn find_by_username(store: &impl KvStore, username: &str) -> anyhow::Result<Option<User>> {
    for id in store.get_list(USERS_LIST_KEY)? {
        if let Some(u) = get_user(store, &id)? {
            if u.username == username {
                return Ok(Some(u));
            }
        }
    }
    Ok(None)
}

pub fn create_user(
    store: &impl KvStore,
    username: &str,
    password: &str,
    bio: Option<&str>,
) -> Result<User, ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    if username.chars().count() < MIN_USERNAME_LENGTH || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest("Username must be 3-50 characters".to_string()));
    }
    if !username_regex().is_match(username) {
        return Err(ApiError::BadRequest(
            "Username may contain only letters, digits and @/./+/-/_".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest("Password must be at least 3 characters".to_string()));
    }
    if find_by_username(store, username)?.is_some() {
        return Err(ApiError::Conflict("Username exists".to_string()));
    }

    let user = User {
        id: new_id(),
        username: username.to_string(),
        password: hash_password(password)?,
        bio: bio.filter(|b| !b.is_empty()).map(str::to_string),
    };
    store.set_json(&user_key(&user.id), &user)?;

    let mut users = store.get_list(USERS_LIST_KEY)?;
    users.push(user.id.clone());
    store.set_json(USERS_LIST_KEY, &users)?;

    log::info!("user {} registered", user.username);
    Ok(user)
}

/// Removes a user together with everything that cannot outlive them: their
/// posts (and those posts' threads), their comments elsewhere, follow pairs
/// in both directions and their tokens.
pub fn delete_user(store: &impl KvStore, user_id: &str) -> anyhow::Result<bool> {
    let Some(user) = get_user(store, user_id)? else {
        return Ok(false);
    };

    for post_id in store.get_list(FEED_KEY)? {
        match posts::get_post(store, &post_id)? {
            Some(post) if post.author_id == user.id => posts::delete_post(store, &post_id)?,
            Some(_) => comments::delete_comments_by_author(store, &post_id, &user.id)?,
            None => {}
        }
    }

    follow::remove_user_follows(store, &user.id)?;

    let tokens = store.get_list(TOKENS_LIST_KEY)?;
    let mut kept = Vec::with_capacity(tokens.len());
    for token in tokens {
        let key = token_key(&token);
        match store.get_json::<TokenData>(&key)? {
            Some(data) if data.user_id == user.id => store.delete(&key)?,
            _ => kept.push(token),
        }
    }
    store.set_json(TOKENS_LIST_KEY, &kept)?;

    let mut users = store.get_list(USERS_LIST_KEY)?;
    users.retain(|id| id != &user.id);
    store.set_json(USERS_LIST_KEY, &users)?;
    store.delete(&user_key(&user.id))?;

    log::info!("user {} deleted", user.username);
    Ok(true)
}

// === HTTP Handlers ===

pub fn handle_signup(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    let new_user: serde_json::Value = match serde_json::from_slice(req.body()) {
        Ok(v) => v,
        Err(_) => return Ok(ApiError::BadRequest("Invalid JSON body".to_string()).into()),
    };
    let username = new_user["username"].as_str().unwrap_or("");
    let password = new_user["password"].as_str().unwrap_or("");
    let bio = new_user["bio"].as_str();

    match create_user(store, username, password, bio) {
        Ok(user) => json_response(201, &build_user_json(&user)),
        Err(ApiError::InternalError(msg)) => Err(anyhow::anyhow!(msg)),
        Err(e) => Ok(e.into()),
    }
}
