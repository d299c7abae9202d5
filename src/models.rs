use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: String,
    pub group_id: Option<String>,
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_id: String,
    pub post_id: String,
}

/// A directed (user, author) subscription.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Follow {
    pub user_id: String,
    pub author_id: String,
}

#[derive(Serialize, Deserialize)]
pub struct TokenData {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

pub type Followings = Vec<String>;
