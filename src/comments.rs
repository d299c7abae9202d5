use spin_sdk::http::{Request, Response};
use crate::models::Comment;
use crate::base::store::KvStore;
use crate::base::helpers::{new_id, now, redirect};
use crate::base::errors::ApiError;
use crate::auth::current_user;
use crate::forms::CommentForm;
use crate::posts::get_post;
use crate::config::*;

/// Attaches a comment to a post. Blank or overlong text stores nothing and
/// yields `None`.
pub fn add_comment(
    store: &impl KvStore,
    post_id: &str,
    author_id: &str,
    text: &str,
) -> anyhow::Result<Option<Comment>> {
    let Ok(text) = (CommentForm { text: text.to_string() }).validate() else {
        return Ok(None);
    };

    let comment = Comment {
        id: new_id(),
        text,
        created: now(),
        author_id: author_id.to_string(),
        post_id: post_id.to_string(),
    };
    store.set_json(&comment_key(&comment.id), &comment)?;

    let thread_key = comments_key(post_id);
    let mut thread = store.get_list(&thread_key)?;
    thread.push(comment.id.clone());
    store.set_json(&thread_key, &thread)?;

    log::info!("comment {} added to post {}", comment.id, post_id);
    Ok(Some(comment))
}

/// Comments of a post, oldest first.
pub fn comments_for_post(store: &impl KvStore, post_id: &str) -> anyhow::Result<Vec<Comment>> {
    let mut comments = Vec::new();
    for id in store.get_list(&comments_key(post_id))? {
        if let Some(c) = store.get_json::<Comment>(&comment_key(&id))? {
            comments.push(c);
        }
    }
    Ok(comments)
}

pub fn comment_count(store: &impl KvStore, post_id: &str) -> anyhow::Result<usize> {
    Ok(store.get_list(&comments_key(post_id))?.len())
}

pub fn delete_thread(store: &impl KvStore, post_id: &str) -> anyhow::Result<()> {
    let thread_key = comments_key(post_id);
    for id in store.get_list(&thread_key)? {
        store.delete(&comment_key(&id))?;
    }
    store.delete(&thread_key)
}

pub fn delete_comments_by_author(
    store: &impl KvStore,
    post_id: &str,
    author_id: &str,
) -> anyhow::Result<()> {
    let thread_key = comments_key(post_id);
    let thread = store.get_list(&thread_key)?;
    let mut kept = Vec::with_capacity(thread.len());
    for id in thread {
        let key = comment_key(&id);
        match store.get_json::<Comment>(&key)? {
            Some(c) if c.author_id == author_id => store.delete(&key)?,
            Some(_) => kept.push(id),
            None => {}
        }
    }
    store.set_json(&thread_key, &kept)
}

// === HTTP Handlers ===

pub fn handle_add_comment(store: &impl KvStore, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    let Some(user) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };
    let Some(post) = get_post(store, post_id)? else {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    };

    let form: CommentForm = serde_json::from_slice(req.body()).unwrap_or_default();
    if add_comment(store, &post.id, &user.id, &form.text)?.is_none() {
        log::debug!("empty comment on post {} ignored", post.id);
    }
    Ok(redirect(&format!("/posts/{}/", post.id)))
}
