// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Comment endpoints, scoped under a post.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::extract::{AppJson, AppQuery};
use super::posts::PageQuery;
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{Comment, CreateCommentRequest, NewComment},
    state::AppState,
    upstream::{Direction, PageResult, Query, UpstreamError},
};

const COMMENTS: &str = "comments";

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/comments",
    params(
        ("post_id" = String, Path, description = "Post identifier"),
        PageQuery
    ),
    tag = "Comments",
    responses(
        (status = 200, description = "One page of comments, newest first", body = PageResult<Comment>),
        (status = 400, description = "Invalid query parameters", body = ErrorBody)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    AppQuery(params): AppQuery<PageQuery>,
) -> Result<Json<PageResult<Comment>>, ApiError> {
    let query = Query::new()
        .eq("post_id", post_id)
        .order("created_at", Direction::Desc);
    let result = state
        .data
        .list(COMMENTS, &query, params.to_request(), None)
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/comments",
    params(("post_id" = String, Path, description = "Post identifier")),
    request_body = CreateCommentRequest,
    tag = "Comments",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Invalid request body", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Auth(principal): Auth,
    AppJson(request): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    request.validate()?;
    let row = NewComment {
        post_id: &post_id,
        author_id: &principal.subject,
        body: &request.body,
    };
    let created = state
        .data
        .create(COMMENTS, &principal.raw_token, &row)
        .await?;
    let comment: Comment = serde_json::from_value(created)
        .map_err(|e| UpstreamError::InvalidResponse(format!("{COMMENTS}: {e}")))?;
    Ok((StatusCode::CREATED, Json(comment)))
}
