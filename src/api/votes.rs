// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vote endpoints.
//!
//! A caller holds at most one vote per target: posting again replaces the
//! previous value through an upsert keyed by `(user_id, post_id)` or
//! `(user_id, comment_id)`.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use utoipa::IntoParams;

use super::extract::{AppJson, AppQuery};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{Target, VoteRequest},
    state::AppState,
    upstream::Query,
};

const VOTES: &str = "votes";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VoteTargetQuery {
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/votes",
    request_body = VoteRequest,
    tag = "Votes",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Vote recorded"),
        (status = 400, description = "Bad vote value or target", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn upsert_vote(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AppJson(request): AppJson<VoteRequest>,
) -> Result<StatusCode, ApiError> {
    let vote = request.validate()?;
    let row = vote.to_row(&principal.subject);
    state
        .data
        .upsert(
            VOTES,
            &principal.raw_token,
            &["user_id", vote.target.column()],
            &row,
        )
        .await?;

    tracing::debug!(
        user = %principal.subject,
        target = vote.target.column(),
        value = vote.value.as_i8(),
        "vote recorded"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/votes",
    params(VoteTargetQuery),
    tag = "Votes",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Vote removed (or none existed)"),
        (status = 400, description = "Bad target", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn delete_vote(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AppQuery(params): AppQuery<VoteTargetQuery>,
) -> Result<StatusCode, ApiError> {
    let target = Target::from_ids(params.post_id, params.comment_id)?;
    let query = Query::new()
        .eq("user_id", principal.subject.as_str())
        .eq(target.column(), target.id());
    state
        .data
        .delete_by_filter(VOTES, &principal.raw_token, &query)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
