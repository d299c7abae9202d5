use crate::base::store::KvStore;
use crate::config::{FEED_KEY, USERS_LIST_KEY};
use crate::{follow, groups, posts, users};

/// Fills an empty store with a few users, a group, posts and one follow.
/// Does nothing once any user exists.
pub fn init_demo_data(store: &impl KvStore) -> anyhow::Result<()> {
    if !store.get_list(USERS_LIST_KEY)?.is_empty() {
        return Ok(());
    }

    let test = users::create_user(store, "test", "test", Some("Test user bio"))?;
    let alice = users::create_user(store, "alice", "alice", Some("Hello, I'm Alice!"))?;
    let bob = users::create_user(store, "bob", "bob", Some("Bob's corner of the internet"))?;

    let general = groups::create_group(store, "General", "general", "Anything goes")?;

    posts::create_post(store, &test.id, "This is my first post!", None, None)?;
    posts::create_post(
        store,
        &alice.id,
        "Welcome to my blog! Excited to share thoughts here.",
        Some(&general.id),
        None,
    )?;
    posts::create_post(
        store,
        &alice.id,
        "Just finished an amazing project. Feeling productive today!",
        None,
        None,
    )?;
    posts::create_post(
        store,
        &bob.id,
        "Hey everyone! Just joined, looking forward to connecting with you all.",
        Some(&general.id),
        None,
    )?;

    follow::follow_user(store, &test.id, &bob.id)?;

    log::info!(
        "demo data seeded: {} users, {} posts",
        store.get_list(USERS_LIST_KEY)?.len(),
        store.get_list(FEED_KEY)?.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::store::MemoryStore;

    #[test]
    fn seeding_is_idempotent() {
        let store = MemoryStore::new();
        init_demo_data(&store).unwrap();
        init_demo_data(&store).unwrap();

        assert_eq!(store.get_list(USERS_LIST_KEY).unwrap().len(), 3);
        assert_eq!(store.get_list(FEED_KEY).unwrap().len(), 4);
        assert_eq!(follow::follow_count(&store).unwrap(), 1);
    }
}
