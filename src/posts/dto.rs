use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::posts::repo::Post;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct PostItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: OffsetDateTime,
}

impl From<Post> for PostItem {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            date_posted: post.date_posted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserPostsResponse {
    pub username: String,
    pub posts: Vec<PostItem>,
    pub page: i64,
    pub per_page: i64,
    pub total_posts: i64,
    pub total_pages: i64,
}
