//! Post selections for each feed scope, newest first.
//!
//! The global `feed` list holds post ids in creation order with the newest at
//! the front, so every scope is a filter over it.

use crate::models::Post;
use crate::base::store::KvStore;
use crate::config::{post_key, FEED_KEY};
use crate::follow::get_followings;

fn collect_posts(
    store: &impl KvStore,
    mut keep: impl FnMut(&Post) -> bool,
) -> anyhow::Result<Vec<Post>> {
    let mut posts = Vec::new();
    for id in store.get_list(FEED_KEY)? {
        if let Some(p) = store.get_json::<Post>(&post_key(&id))? {
            if keep(&p) {
                posts.push(p);
            }
        }
    }
    Ok(posts)
}

pub fn all_posts(store: &impl KvStore) -> anyhow::Result<Vec<Post>> {
    collect_posts(store, |_| true)
}

pub fn group_posts(store: &impl KvStore, group_id: &str) -> anyhow::Result<Vec<Post>> {
    collect_posts(store, |p| p.group_id.as_deref() == Some(group_id))
}

pub fn author_posts(store: &impl KvStore, author_id: &str) -> anyhow::Result<Vec<Post>> {
    collect_posts(store, |p| p.author_id == author_id)
}

/// Posts by everyone `viewer` follows; nothing for an anonymous viewer.
pub fn follow_posts(store: &impl KvStore, viewer: Option<&str>) -> anyhow::Result<Vec<Post>> {
    let Some(viewer) = viewer else {
        return Ok(Vec::new());
    };
    let followings = get_followings(store, viewer)?;
    if followings.is_empty() {
        return Ok(Vec::new());
    }
    collect_posts(store, |p| followings.contains(&p.author_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::store::MemoryStore;
    use crate::follow::follow_user;
    use crate::posts::create_post;

    #[test]
    fn scopes_filter_the_global_feed() {
        let store = MemoryStore::new();
        let a1 = create_post(&store, "alice", "one", Some("g1"), None).unwrap();
        let b1 = create_post(&store, "bob", "two", Some("g2"), None).unwrap();
        let a2 = create_post(&store, "alice", "three", None, None).unwrap();

        let ids = |posts: Vec<Post>| posts.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(all_posts(&store).unwrap()), vec![a2.id.clone(), b1.id.clone(), a1.id.clone()]);
        assert_eq!(ids(group_posts(&store, "g1").unwrap()), vec![a1.id.clone()]);
        assert!(group_posts(&store, "g3").unwrap().is_empty());
        assert_eq!(ids(author_posts(&store, "alice").unwrap()), vec![a2.id, a1.id]);
    }

    #[test]
    fn follow_feed_needs_a_viewer_with_followings() {
        let store = MemoryStore::new();
        let post = create_post(&store, "author", "hello", None, None).unwrap();
        create_post(&store, "stranger", "noise", None, None).unwrap();

        assert!(follow_posts(&store, None).unwrap().is_empty());
        assert!(follow_posts(&store, Some("reader")).unwrap().is_empty());

        follow_user(&store, "reader", "author").unwrap();
        let feed = follow_posts(&store, Some("reader")).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, post.id);
    }
}
