use spin_sdk::http::{Request, Response};
use crate::models::{Follow, Followings};
use crate::base::store::KvStore;
use crate::base::helpers::{profile_url, redirect, json_response};
use crate::base::errors::ApiError;
use crate::auth::current_user;
use crate::users::{find_by_username, get_user};
use crate::config::*;

/// Records that `follower_id` follows `author_id`. Following yourself or
/// following twice changes nothing; the return value says whether a new
/// pair was stored.
pub fn follow_user(store: &impl KvStore, follower_id: &str, author_id: &str) -> anyhow::Result<bool> {
    if follower_id == author_id {
        return Ok(false);
    }

    let key = followings_key(follower_id);
    let mut followings: Followings = store.get_list(&key)?;
    if followings.iter().any(|id| id == author_id) {
        return Ok(false);
    }

    followings.push(author_id.to_string());
    store.set_json(&key, &followings)?;
    log::info!("{} now follows {}", follower_id, author_id);
    Ok(true)
}

pub fn unfollow_user(store: &impl KvStore, follower_id: &str, author_id: &str) -> anyhow::Result<bool> {
    let key = followings_key(follower_id);
    let mut followings: Followings = store.get_list(&key)?;
    let before = followings.len();
    followings.retain(|id| id != author_id);
    if followings.len() == before {
        return Ok(false);
    }

    store.set_json(&key, &followings)?;
    log::info!("{} unfollowed {}", follower_id, author_id);
    Ok(true)
}

pub fn is_following(store: &impl KvStore, follower_id: &str, author_id: &str) -> anyhow::Result<bool> {
    Ok(get_followings(store, follower_id)?.iter().any(|id| id == author_id))
}

pub fn get_followings(store: &impl KvStore, user_id: &str) -> anyhow::Result<Followings> {
    store.get_list(&followings_key(user_id))
}

pub fn get_followers(store: &impl KvStore, author_id: &str) -> anyhow::Result<Vec<String>> {
    let mut followers = Vec::new();
    for id in store.get_list(USERS_LIST_KEY)? {
        if get_followings(store, &id)?.iter().any(|f| f == author_id) {
            followers.push(id);
        }
    }
    Ok(followers)
}

/// Every stored (user, author) pair.
pub fn all_follows(store: &impl KvStore) -> anyhow::Result<Vec<Follow>> {
    let mut follows = Vec::new();
    for user_id in store.get_list(USERS_LIST_KEY)? {
        for author_id in get_followings(store, &user_id)? {
            follows.push(Follow { user_id: user_id.clone(), author_id });
        }
    }
    Ok(follows)
}

pub fn follow_count(store: &impl KvStore) -> anyhow::Result<usize> {
    Ok(all_follows(store)?.len())
}

/// Drops pairs where the user is either side.
pub fn remove_user_follows(store: &impl KvStore, user_id: &str) -> anyhow::Result<()> {
    store.delete(&followings_key(user_id))?;
    for follower in get_followers(store, user_id)? {
        unfollow_user(store, &follower, user_id)?;
    }
    Ok(())
}

fn usernames(store: &impl KvStore, ids: &[String]) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(u) = get_user(store, id)? {
            names.push(u.username);
        }
    }
    Ok(names)
}

// === HTTP Handlers ===

pub fn handle_follow(store: &impl KvStore, req: &Request, username: &str) -> anyhow::Result<Response> {
    let Some(user) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };
    let Some(author) = find_by_username(store, username)? else {
        return Ok(ApiError::NotFound("User not found".to_string()).into());
    };

    follow_user(store, &user.id, &author.id)?;
    Ok(redirect(&profile_url(&author.username)))
}

pub fn handle_unfollow(store: &impl KvStore, req: &Request, username: &str) -> anyhow::Result<Response> {
    let Some(user) = current_user(store, req)? else {
        return Ok(ApiError::LoginRequired { next: req.path().to_string() }.into());
    };
    let Some(author) = find_by_username(store, username)? else {
        return Ok(ApiError::NotFound("User not found".to_string()).into());
    };

    unfollow_user(store, &user.id, &author.id)?;
    Ok(redirect(&profile_url(&author.username)))
}

pub fn get_followings_list(store: &impl KvStore, username: &str) -> anyhow::Result<Response> {
    let Some(user) = find_by_username(store, username)? else {
        return Ok(ApiError::NotFound("User not found".to_string()).into());
    };
    let names = usernames(store, &get_followings(store, &user.id)?)?;
    json_response(200, &names)
}

pub fn get_followers_list(store: &impl KvStore, username: &str) -> anyhow::Result<Response> {
    let Some(user) = find_by_username(store, username)? else {
        return Ok(ApiError::NotFound("User not found".to_string()).into());
    };
    let names = usernames(store, &get_followers(store, &user.id)?)?;
    json_response(200, &names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::store::MemoryStore;
    use crate::users::create_user;

    #[test]
    fn follow_then_unfollow_restores_count() {
        let store = MemoryStore::new();
        let reader = create_user(&store, "reader", "pass", None).unwrap();
        let author = create_user(&store, "author", "pass", None).unwrap();
        let before = follow_count(&store).unwrap();

        assert!(follow_user(&store, &reader.id, &author.id).unwrap());
        assert!(is_following(&store, &reader.id, &author.id).unwrap());
        assert!(!is_following(&store, &author.id, &reader.id).unwrap());
        assert_eq!(follow_count(&store).unwrap(), before + 1);

        assert!(unfollow_user(&store, &reader.id, &author.id).unwrap());
        assert_eq!(follow_count(&store).unwrap(), before);
        assert!(!unfollow_user(&store, &reader.id, &author.id).unwrap());
    }

    #[test]
    fn pairs_are_unique() {
        let store = MemoryStore::new();
        let reader = create_user(&store, "reader", "pass", None).unwrap();
        let author = create_user(&store, "author", "pass", None).unwrap();

        follow_user(&store, &reader.id, &author.id).unwrap();
        assert!(!follow_user(&store, &reader.id, &author.id).unwrap());
        assert_eq!(follow_count(&store).unwrap(), 1);
        assert_eq!(get_followers(&store, &author.id).unwrap(), vec![reader.id]);
    }

    #[test]
    fn self_follow_is_ignored() {
        let store = MemoryStore::new();
        let user = create_user(&store, "narcissus", "pass", None).unwrap();
        assert!(!follow_user(&store, &user.id, &user.id).unwrap());
        assert_eq!(follow_count(&store).unwrap(), 0);
    }
}
