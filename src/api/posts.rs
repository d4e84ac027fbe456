// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::extract::{AppJson, AppQuery};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{CreatePostRequest, Post, PostSort, PostStatus},
    state::AppState,
    upstream::{
        pagination::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE},
        Direction, PageRequest, PageResult, Query, UpstreamError,
    },
};

pub(crate) const POSTS: &str = "posts";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    /// `new` (default) or `top`
    #[serde(default)]
    pub sort: PostSort,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page, clamped to 1..=100
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Moderation status filter (default `published`)
    #[serde(default)]
    pub status: PostStatus,
    /// Only posts carrying this tag
    pub tag: Option<String>,
}

/// Page parameters shared by list endpoints without filters of their own.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl PageQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl ListPostsQuery {
    fn to_query(&self) -> Query {
        let mut query = Query::new().eq("status", self.status.as_str());
        if let Some(tag) = self.tag.as_deref().filter(|t| !t.is_empty()) {
            query = query.contains("tags", tag);
        }
        match self.sort {
            PostSort::New => query.order("created_at", Direction::Desc),
            PostSort::Top => query
                .order("up_count", Direction::Desc)
                .order("down_count", Direction::Asc),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(ListPostsQuery),
    tag = "Posts",
    responses(
        (status = 200, description = "One page of posts", body = PageResult<Post>),
        (status = 400, description = "Invalid query parameters", body = ErrorBody),
        (status = 502, description = "Data service unavailable", body = ErrorBody)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListPostsQuery>,
) -> Result<Json<PageResult<Post>>, ApiError> {
    let page = PageRequest::new(params.page, params.page_size);
    let result = state
        .data
        .list(POSTS, &params.to_query(), page, None)
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid request body", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AppJson(request): AppJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    request.validate()?;
    let row = request.to_row(&principal.subject);
    let created = state
        .data
        .create(POSTS, &principal.raw_token, &row)
        .await?;
    let post: Post = serde_json::from_value(created)
        .map_err(|e| UpstreamError::InvalidResponse(format!("{POSTS}: {e}")))?;

    tracing::info!(post_id = %post.id, author = %principal.subject, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}",
    params(("post_id" = String, Path, description = "Post identifier")),
    tag = "Posts",
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let query = Query::new().eq("id", post_id).limit(1);
    let rows: Vec<Post> = state.data.select(POSTS, &query, None).await?;
    rows.into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Post not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(sort: PostSort, tag: Option<&str>) -> ListPostsQuery {
        ListPostsQuery {
            sort,
            page: 1,
            page_size: 20,
            status: PostStatus::Published,
            tag: tag.map(str::to_string),
        }
    }

    fn rendered(query: Query) -> Vec<(String, String)> {
        query.to_params()
    }

    #[test]
    fn new_sort_filters_status_and_orders_by_creation() {
        assert_eq!(
            rendered(params(PostSort::New, None).to_query()),
            vec![
                ("status".to_string(), "eq.published".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn top_sort_with_tag() {
        assert_eq!(
            rendered(params(PostSort::Top, Some("rust")).to_query()),
            vec![
                ("status".to_string(), "eq.published".to_string()),
                ("tags".to_string(), r#"cs.{"rust"}"#.to_string()),
                (
                    "order".to_string(),
                    "up_count.desc,down_count.asc".to_string()
                ),
            ]
        );
    }

    #[test]
    fn empty_tag_is_ignored() {
        let params = rendered(params(PostSort::New, Some("")).to_query());
        assert!(params.iter().all(|(k, _)| k != "tags"));
    }

    #[test]
    fn page_query_clamps() {
        let q = PageQuery {
            page: 0,
            page_size: 1000,
        };
        assert_eq!(q.to_request(), PageRequest::new(1, 100));
    }
}
