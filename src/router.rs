use std::borrow::Cow;

use spin_sdk::http::{Method, Request, Response};

use crate::base::errors::ApiError;
use crate::base::store::KvStore;
use crate::{auth, comments, follow, groups, posts, users, views};

/// Dispatches a request and turns handler failures into `500`s.
pub fn route(store: &impl KvStore, req: Request) -> Response {
    let path = req.path().to_string();
    match dispatch(store, &req, &path) {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("{} {} failed: {:#}", method_name(req.method()), path, e);
            ApiError::InternalError("Internal server error".to_string()).into()
        }
    }
}

fn method_name(method: &Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Put => "PUT",
        Method::Delete => "DELETE",
        Method::Patch => "PATCH",
        Method::Head => "HEAD",
        Method::Options => "OPTIONS",
        _ => "OTHER",
    }
}

fn dispatch(store: &impl KvStore, req: &Request, path: &str) -> anyhow::Result<Response> {
    let decoded: Vec<Cow<str>> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::decode(s).unwrap_or(Cow::Borrowed(s)))
        .collect();
    let segments: Vec<&str> = decoded.iter().map(|s| s.as_ref()).collect();

    match (req.method(), segments.as_slice()) {
        (Method::Get, []) => views::index(store, req),
        (Method::Get, ["group", slug]) => views::group_posts(store, req, slug),
        (Method::Get, ["profile", username]) => views::profile(store, req, username),
        (Method::Get, ["profile", username, "followers"]) => follow::get_followers_list(store, username),
        (Method::Get, ["profile", username, "following"]) => follow::get_followings_list(store, username),
        (Method::Post, ["profile", username, "follow"]) => follow::handle_follow(store, req, username),
        (Method::Post, ["profile", username, "unfollow"]) => follow::handle_unfollow(store, req, username),
        (Method::Get, ["posts", id]) => views::post_detail(store, req, id),
        (Method::Delete, ["posts", id]) => posts::handle_delete(store, req, id),
        (Method::Get, ["posts", id, "edit"]) => views::post_edit_form(store, req, id),
        (Method::Post, ["posts", id, "edit"]) => posts::handle_edit(store, req, id),
        (Method::Post, ["posts", id, "comment"]) => comments::handle_add_comment(store, req, id),
        (Method::Get, ["create"]) => views::post_create_form(store, req),
        (Method::Post, ["create"]) => posts::handle_create(store, req),
        (Method::Get, ["follow"]) => views::follow_index(store, req),
        (Method::Post, ["groups"]) => groups::handle_create(store, req),
        (Method::Post, ["auth", "signup"]) => users::handle_signup(store, req),
        (Method::Post, ["auth", "login"]) => auth::login_user(store, req),
        (Method::Post, ["auth", "logout"]) => auth::logout_user(store, req),
        _ => Ok(ApiError::NotFound("No route found".to_string()).into()),
    }
}
