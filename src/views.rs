//! Read-only views. Each renders the JSON context a page template would get.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::json;
use spin_sdk::http::{Request, Response};

use crate::auth::current_user;
use crate::base::errors::ApiError;
use crate::base::helpers::{json_response, now, redirect};
use crate::base::page_cache::PageCache;
use crate::base::query_params::{get_string, parse_query_params, query_string};
use crate::base::store::KvStore;
use crate::comments::comments_for_post;
use crate::config::PAGE_SIZE;
use crate::feeds;
use crate::follow::is_following;
use crate::forms::{CommentForm, FormErrors, PostForm};
use crate::groups::{all_groups, find_by_slug, get_group};
use crate::models::{Group, Post};
use crate::pagination::{paginate, Page};
use crate::posts::{filter_post_content, get_post};
use crate::users::{find_by_username, get_user};

#[derive(Serialize, Clone, Debug)]
pub struct AuthorRef {
    pub id: String,
    pub username: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct GroupRef {
    pub id: String,
    pub title: String,
    pub slug: String,
}

impl From<&Group> for GroupRef {
    fn from(g: &Group) -> Self {
        GroupRef { id: g.id.clone(), title: g.title.clone(), slug: g.slug.clone() }
    }
}

/// A post joined with its author and group.
#[derive(Serialize, Clone, Debug)]
pub struct PostView {
    pub id: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: AuthorRef,
}

/// Resolves authors and groups once per render.
struct Joiner<'a, S: KvStore> {
    store: &'a S,
    authors: HashMap<String, AuthorRef>,
    groups: HashMap<String, Option<GroupRef>>,
}

impl<'a, S: KvStore> Joiner<'a, S> {
    fn new(store: &'a S) -> Self {
        Self { store, authors: HashMap::new(), groups: HashMap::new() }
    }

    fn author(&mut self, id: &str) -> anyhow::Result<AuthorRef> {
        if let Some(a) = self.authors.get(id) {
            return Ok(a.clone());
        }
        let author = AuthorRef {
            id: id.to_string(),
            username: get_user(self.store, id)?.map(|u| u.username).unwrap_or_default(),
        };
        self.authors.insert(id.to_string(), author.clone());
        Ok(author)
    }

    fn group(&mut self, id: Option<&str>) -> anyhow::Result<Option<GroupRef>> {
        let Some(id) = id else {
            return Ok(None);
        };
        if let Some(g) = self.groups.get(id) {
            return Ok(g.clone());
        }
        let group = get_group(self.store, id)?.as_ref().map(GroupRef::from);
        self.groups.insert(id.to_string(), group.clone());
        Ok(group)
    }

    fn post(&mut self, post: Post) -> anyhow::Result<PostView> {
        Ok(PostView {
            author: self.author(&post.author_id)?,
            group: self.group(post.group_id.as_deref())?,
            text: filter_post_content(&post.text),
            id: post.id,
            pub_date: post.pub_date,
            image: post.image,
        })
    }

    fn page(&mut self, page: Page<Post>) -> anyhow::Result<Page<PostView>> {
        let mut views = Vec::with_capacity(page.len());
        let Page { number, num_pages, count, has_next, has_previous, object_list } = page;
        for post in object_list {
            views.push(self.post(post)?);
        }
        Ok(Page { number, num_pages, count, has_next, has_previous, object_list: views })
    }
}

fn current_year() -> i32 {
    now().year()
}

fn requested_page(req: &Request) -> Option<String> {
    get_string(&parse_query_params(query_string(req.uri())), "page", None)
}

fn page_of_posts(store: &impl KvStore, req: &Request, posts: Vec<Post>) -> anyhow::Result<Page<PostView>> {
    let page = paginate(posts, PAGE_SIZE, requested_page(req).as_deref());
    Joiner::new(store).page(page)
}

/// Path plus query; the identity the home page cache is keyed by.
pub fn page_identity(req: &Request) -> String {
    match query_string(req.uri()) {
        "" => req.path().to_string(),
        query => format!("{}?{}", req.path(), query),
    }
}

fn cached_json(body: String) -> Response {
    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(body.into_bytes())
        .build()
}

pub fn index(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    let cache = PageCache::index();
    let identity = page_identity(req);
    if let Some(body) = cache.get(store, &identity)? {
        return Ok(cached_json(body));
    }

    let page_obj = page_of_posts(store, req, feeds::all_posts(store)?)?;
    let body = json!({
        "year": current_year(),
        "page_obj": page_obj,
    })
    .to_string();
    cache.put(store, &identity, &body)?;
    Ok(cached_json(body))
}

pub fn group_posts(store: &impl KvStore, req: &Request, slug: &str) -> anyhow::Result<Response> {
    let Some(group) = find_by_slug(store, slug)? else {
        return Ok(ApiError::NotFound("Group not found".to_string()).into());
    };

    let page_obj = page_of_posts(store, req, feeds::group_posts(store, &group.id)?)?;
    json_response(200, &json!({
        "year": current_year(),
        "group": group,
        "page_obj": page_obj,
    }))
}

pub fn profile(store: &impl KvStore, req: &Request, username: &str) -> anyhow::Result<Response> {
    let Some(author) = find_by_username(store, username)? else {
        return Ok(ApiError::NotFound("User not found".to_string()).into());
    };

    let following = match current_user(store, req)? {
        Some(viewer) if viewer.id != author.id => is_following(store, &viewer.id, &author.id)?,
        _ => false,
    };
    let posts = feeds::author_posts(store, &author.id)?;
    let post_count = posts.len();
    let page_obj = page_of_posts(store, req, posts)?;

    json_response(200, &json!({
        "year": current_year(),
        "author": {
            "id": author.id,
            "username": author.username,
            "bio": author.bio,
        },
        "post_count": post_count,
        "following": following,
        "page_obj": page_obj,
    }))
}

pub fn post_detail(store: &impl KvStore, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    let Some(post) = get_post(store, post_id)? else {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    };

    let following = match current_user(store, req)? {
        Some(viewer) => is_following(store, &viewer.id, &post.author_id)?,
        None => false,
    };
    let author_post_count = feeds::author_posts(store, &post.author_id)?.len();

    let mut joiner = Joiner::new(store);
    let mut comments = Vec::new();
    for c in comments_for_post(store, &post.id)? {
        comments.push(CommentView {
            author: joiner.author(&c.author_id)?,
            text: filter_post_content(&c.text),
            id: c.id,
            created: c.created,
        });
    }
    let post = joiner.post(post)?;

    json_response(200, &json!({
        "year": current_year(),
        "post": post,
        "author_post_count": author_post_count,
        "comments": comments,
        "following": following,
        "form": CommentForm::default(),
    }))
}

pub fn follow_index(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    let Some(viewer) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };

    let posts = feeds::follow_posts(store, Some(&viewer.id))?;
    let page_obj = page_of_posts(store, req, posts)?;
    json_response(200, &json!({
        "year": current_year(),
        "page_obj": page_obj,
    }))
}

/// Blank post form with the group choices.
pub fn post_create_form(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    if current_user(store, req)?.is_none() {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    }

    json_response(200, &json!({
        "year": current_year(),
        "form": PostForm::default(),
        "errors": FormErrors::new(),
        "groups": all_groups(store)?,
    }))
}

/// The post form filled with the stored post. Only the author gets it;
/// anyone else is sent to the post.
pub fn post_edit_form(store: &impl KvStore, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    let Some(user) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };
    let Some(post) = get_post(store, post_id)? else {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    };
    if post.author_id != user.id {
        return Ok(redirect(&format!("/posts/{}/", post.id)));
    }

    let form = PostForm {
        text: post.text,
        group: post.group_id,
        image: post.image,
    };
    json_response(200, &json!({
        "year": current_year(),
        "form": form,
        "errors": FormErrors::new(),
        "groups": all_groups(store)?,
        "is_edit": true,
        "post_id": post.id,
    }))
}
