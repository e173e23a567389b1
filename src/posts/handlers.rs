use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::repo::User,
    error::FlowError,
    posts::{
        dto::{PageQuery, PostItem, UserPostsResponse},
        repo::Post,
    },
    state::AppState,
};

pub const POSTS_PER_PAGE: i64 = 5;

pub fn post_routes() -> Router<AppState> {
    Router::new().route("/user/:username", get(list_user_posts))
}

/// GET /user/:username?page=N
/// Newest first, fixed page size, 1-based pages. Pages past the last one
/// are not found, matching the user lookup itself.
#[instrument(skip(state))]
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPostsResponse>, FlowError> {
    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or(FlowError::UserNotFound)?;

    let page = query.page.max(1);
    let total_posts = Post::count_by_author(&state.db, user.id).await?;
    let total_pages = page_count(total_posts, POSTS_PER_PAGE);
    if !page_in_range(page, total_pages) {
        return Err(FlowError::PageOutOfRange);
    }
    let posts = Post::list_by_author(
        &state.db,
        user.id,
        POSTS_PER_PAGE,
        page_offset(page, POSTS_PER_PAGE),
    )
    .await?;

    Ok(Json(UserPostsResponse {
        username: user.username,
        posts: posts.into_iter().map(PostItem::from).collect(),
        page,
        per_page: POSTS_PER_PAGE,
        total_posts,
        total_pages,
    }))
}

fn page_offset(page: i64, per_page: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

fn page_count(total: i64, per_page: i64) -> i64 {
    (total + per_page - 1) / per_page
}

/// The first page always exists, even for an author with no posts yet.
fn page_in_range(page: i64, pages: i64) -> bool {
    page == 1 || page <= pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_page_of_twelve_posts_starts_at_the_sixth() {
        assert_eq!(page_offset(2, POSTS_PER_PAGE), 5);
        assert_eq!(page_count(12, POSTS_PER_PAGE), 3);
    }

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(page_offset(1, POSTS_PER_PAGE), 0);
    }

    #[test]
    fn page_counts_round_up() {
        assert_eq!(page_count(0, POSTS_PER_PAGE), 0);
        assert_eq!(page_count(1, POSTS_PER_PAGE), 1);
        assert_eq!(page_count(5, POSTS_PER_PAGE), 1);
        assert_eq!(page_count(6, POSTS_PER_PAGE), 2);
    }

    #[test]
    fn extreme_page_numbers_never_overflow() {
        assert_eq!(page_offset(i64::MAX, POSTS_PER_PAGE), i64::MAX);
    }

    #[test]
    fn pages_past_the_end_are_rejected() {
        assert!(page_in_range(3, 3));
        assert!(!page_in_range(4, 3));
        assert!(!page_in_range(i64::MAX, 3));
    }

    #[test]
    fn an_author_without_posts_still_serves_the_first_page() {
        assert!(page_in_range(1, 0));
        assert!(!page_in_range(2, 0));
    }

    #[test]
    fn page_query_defaults_to_one() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
    }
}
