use spin_sdk::http::{Request, Response};
use regex::Regex;
use html_escape::encode_double_quoted_attribute;
use ammonia::Builder;
use std::sync::OnceLock;
use crate::models::Post;
use crate::base::store::KvStore;
use crate::base::helpers::{new_id, now, profile_url, redirect, json_response};
use crate::base::errors::ApiError;
use crate::auth::current_user;
use crate::forms::PostForm;
use crate::comments;
use crate::config::*;

pub fn get_post(store: &impl KvStore, post_id: &str) -> anyhow::Result<Option<Post>> {
    store.get_json(&post_key(post_id))
}

/// Post text is stored as submitted (trimmed) and sanitized when rendered;
/// text that renders to nothing is refused.
fn stored_text(text: &str) -> anyhow::Result<String> {
    let text = text.trim();
    if filter_post_content(text).trim().is_empty() {
        anyhow::bail!("post text is empty after sanitizing");
    }
    Ok(text.to_string())
}

pub fn create_post(
    store: &impl KvStore,
    author_id: &str,
    text: &str,
    group_id: Option<&str>,
    image: Option<&str>,
) -> anyhow::Result<Post> {
    let post = Post {
        id: new_id(),
        text: stored_text(text)?,
        pub_date: now(),
        author_id: author_id.to_string(),
        group_id: group_id.map(str::to_string),
        image: image.map(str::to_string),
    };

    store.set_json(&post_key(&post.id), &post)?;

    // prepend newest
    let mut feed = store.get_list(FEED_KEY)?;
    feed.insert(0, post.id.clone());
    store.set_json(FEED_KEY, &feed)?;

    log::info!("post {} created by {}", post.id, author_id);
    Ok(post)
}

/// Rewrites the editable fields. `pub_date` and the author never change;
/// an absent image keeps the stored one.
pub fn update_post(
    store: &impl KvStore,
    post: &mut Post,
    text: &str,
    group_id: Option<&str>,
    image: Option<&str>,
) -> anyhow::Result<()> {
    post.text = stored_text(text)?;
    post.group_id = group_id.map(str::to_string);
    if let Some(image) = image {
        post.image = Some(image.to_string());
    }
    store.set_json(&post_key(&post.id), post)?;
    log::info!("post {} edited", post.id);
    Ok(())
}

/// Deletes a post and its comment thread.
pub fn delete_post(store: &impl KvStore, post_id: &str) -> anyhow::Result<()> {
    comments::delete_thread(store, post_id)?;
    store.delete(&post_key(post_id))?;

    let mut feed = store.get_list(FEED_KEY)?;
    feed.retain(|id| id != post_id);
    store.set_json(FEED_KEY, &feed)?;

    log::info!("post {} deleted", post_id);
    Ok(())
}

fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(^|\s)(https?://[^\s<"]+)"#).expect("Regex should compile")
    })
}

/// Renders stored text as HTML: strips dangerous markup and turns bare URLs
/// into links.
pub fn filter_post_content(content: &str) -> String {
    let clean = Builder::default()
        .link_rel(Some("noopener noreferrer"))
        .clean(content)
        .to_string();

    url_regex().replace_all(&clean, |caps: &regex::Captures| {
        let url = &caps[2];
        let escaped_url = encode_double_quoted_attribute(url);
        format!(r#"{}<a href="{}" target="_blank">{}</a>"#, &caps[1], escaped_url, url)
    }).to_string()
}

fn parse_form(req: &Request) -> PostForm {
    serde_json::from_slice(req.body()).unwrap_or_default()
}

// === HTTP Handlers ===

pub fn handle_create(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    let Some(user) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };

    let form = parse_form(req);
    let cleaned = match form.validate(store)? {
        Ok(cleaned) => cleaned,
        Err(errors) => return json_response(400, &form.with_errors(errors)),
    };

    create_post(
        store,
        &user.id,
        &cleaned.text,
        cleaned.group_id.as_deref(),
        cleaned.image.as_deref(),
    )?;
    Ok(redirect(&profile_url(&user.username)))
}

pub fn handle_edit(store: &impl KvStore, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    let Some(user) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };
    let Some(mut post) = get_post(store, post_id)? else {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    };

    let detail_url = format!("/posts/{}/", post.id);
    if post.author_id != user.id {
        log::warn!("user {} tried to edit post {} they do not own", user.id, post.id);
        return Ok(redirect(&detail_url));
    }

    let form = parse_form(req);
    let cleaned = match form.validate(store)? {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            let mut body = form.with_errors(errors);
            body["is_edit"] = serde_json::Value::Bool(true);
            return json_response(400, &body);
        }
    };

    update_post(
        store,
        &mut post,
        &cleaned.text,
        cleaned.group_id.as_deref(),
        cleaned.image.as_deref(),
    )?;
    Ok(redirect(&detail_url))
}

pub fn handle_delete(store: &impl KvStore, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    let Some(user) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };
    let Some(post) = get_post(store, post_id)? else {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    };
    if post.author_id != user.id {
        return Ok(ApiError::Forbidden.into());
    }

    delete_post(store, &post.id)?;
    Ok(redirect(&profile_url(&user.username)))
}
