use spin_sdk::http::{Request, Response};
use regex::Regex;
use std::sync::OnceLock;
use crate::models::Group;
use crate::base::store::KvStore;
use crate::base::helpers::{new_id, json_response};
use crate::base::errors::ApiError;
use crate::auth::current_user;
use crate::posts;
use crate::config::*;

fn slug_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("Regex should compile"))
}

pub fn get_group(store: &impl KvStore, group_id: &str) -> anyhow::Result<Option<Group>> {
    store.get_json(&group_key(group_id))
}

/// Every group, in creation order.
pub fn all_groups(store: &impl KvStore) -> anyhow::Result<Vec<Group>> {
    let mut groups = Vec::new();
    for id in store.get_list(GROUPS_LIST_KEY)? {
        if let Some(g) = get_group(store, &id)? {
            groups.push(g);
        }
    }
    Ok(groups)
}

pub fn find_by_slug(store: &impl KvStore, slug: &str) -> anyhow::Result<Option<Group>> {
    for id in store.get_list(GROUPS_LIST_KEY)? {
        if let Some(g) = get_group(store, &id)? {
            if g.slug == slug {
                return Ok(Some(g));
            }
        }
    }
    Ok(None)
}

pub fn create_group(
    store: &impl KvStore,
    title: &str,
    slug: &str,
    description: &str,
) -> Result<Group, ApiError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_GROUP_TITLE_LENGTH {
        return Err(ApiError::BadRequest("Title must be 1-200 characters".to_string()));
    }
    if !slug_regex().is_match(slug) {
        return Err(ApiError::BadRequest(
            "Slug may contain only letters, digits, hyphens and underscores".to_string(),
        ));
    }
    if find_by_slug(store, slug)?.is_some() {
        return Err(ApiError::Conflict("Group with this slug already exists".to_string()));
    }

    let group = Group {
        id: new_id(),
        title: title.to_string(),
        slug: slug.to_string(),
        description: description.to_string(),
    };
    store.set_json(&group_key(&group.id), &group)?;

    let mut groups = store.get_list(GROUPS_LIST_KEY)?;
    groups.push(group.id.clone());
    store.set_json(GROUPS_LIST_KEY, &groups)?;

    log::info!("group {} created", group.slug);
    Ok(group)
}

/// Deletes a group. Its posts survive with the group reference cleared.
pub fn delete_group(store: &impl KvStore, group_id: &str) -> anyhow::Result<bool> {
    let Some(group) = get_group(store, group_id)? else {
        return Ok(false);
    };

    for post_id in store.get_list(FEED_KEY)? {
        if let Some(mut post) = posts::get_post(store, &post_id)? {
            if post.group_id.as_deref() == Some(group.id.as_str()) {
                post.group_id = None;
                store.set_json(&post_key(&post.id), &post)?;
            }
        }
    }

    let mut groups = store.get_list(GROUPS_LIST_KEY)?;
    groups.retain(|id| id != &group.id);
    store.set_json(GROUPS_LIST_KEY, &groups)?;
    store.delete(&group_key(&group.id))?;

    log::info!("group {} deleted", group.slug);
    Ok(true)
}

// === HTTP Handlers ===

pub fn handle_create(store: &impl KvStore, req: &Request) -> anyhow::Result<Response> {
    if current_user(store, req)?.is_none() {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    }

    let value: serde_json::Value = match serde_json::from_slice(req.body()) {
        Ok(v) => v,
        Err(_) => return Ok(ApiError::BadRequest("Invalid JSON body".to_string()).into()),
    };
    let title = value["title"].as_str().unwrap_or_default();
    let slug = value["slug"].as_str().unwrap_or_default();
    let description = value["description"].as_str().unwrap_or_default();

    match create_group(store, title, slug, description) {
        Ok(group) => json_response(201, &group),
        Err(ApiError::InternalError(msg)) => Err(anyhow::anyhow!(msg)),
        Err(e) => Ok(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::store::MemoryStore;

    #[test]
    fn slugs_are_unique_and_well_formed() {
        let store = MemoryStore::new();
        create_group(&store, "Cats", "cats", "all about cats").unwrap();

        assert!(matches!(create_group(&store, "Cats 2", "cats", ""), Err(ApiError::Conflict(_))));
        assert!(matches!(create_group(&store, "Bad", "bad slug", ""), Err(ApiError::BadRequest(_))));
        assert!(matches!(create_group(&store, "", "empty", ""), Err(ApiError::BadRequest(_))));
        assert_eq!(find_by_slug(&store, "cats").unwrap().unwrap().title, "Cats");
        assert_eq!(all_groups(&store).unwrap().len(), 1);
        assert!(find_by_slug(&store, "dogs").unwrap().is_none());
    }

    #[test]
    fn deleting_a_group_keeps_its_posts() {
        let store = MemoryStore::new();
        let group = create_group(&store, "Cats", "cats", "").unwrap();
        let post = posts::create_post(&store, "author", "meow", Some(&group.id), None).unwrap();

        assert!(delete_group(&store, &group.id).unwrap());

        let post = posts::get_post(&store, &post.id).unwrap().unwrap();
        assert_eq!(post.group_id, None);
        assert!(find_by_slug(&store, "cats").unwrap().is_none());
    }
}
