// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # REST API
//!
//! All routes live under `/api/v1`; the OpenAPI document is served at
//! `/api-doc/openapi.json` with Swagger UI at `/docs`.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/health`, `/health/ready` | no |
//! | GET | `/me` | bearer |
//! | GET / POST | `/posts` | POST only |
//! | GET | `/posts/{post_id}` | no |
//! | GET / POST | `/posts/{post_id}/comments` | POST only |
//! | POST / DELETE | `/votes` | bearer |
//! | POST | `/reports` | bearer |

use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorBody,
    models::{
        Comment, CreateCommentRequest, CreatePostRequest, Post, PostSort, PostStatus,
        ReportRequest, VoteRequest,
    },
    state::AppState,
};

pub mod comments;
pub mod extract;
pub mod health;
pub mod posts;
pub mod reports;
pub mod users;
pub mod votes;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let v1_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/me", get(users::me))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/{post_id}", get(posts::get_post))
        .route(
            "/posts/{post_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/votes",
            post(votes::upsert_vote).delete(votes::delete_vote),
        )
        .route("/reports", post(reports::create_report))
        .with_state(state);

    Router::new()
        .nest("/api/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    // Path only: query strings and headers stay out of the logs.
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::readiness,
        users::me,
        posts::list_posts,
        posts::create_post,
        posts::get_post,
        comments::list_comments,
        comments::create_comment,
        votes::upsert_vote,
        votes::delete_vote,
        reports::create_report
    ),
    components(
        schemas(
            Post,
            PostSort,
            PostStatus,
            Comment,
            CreatePostRequest,
            CreateCommentRequest,
            VoteRequest,
            ReportRequest,
            ErrorBody,
            users::MeResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Users", description = "Caller identity"),
        (name = "Posts", description = "Board posts"),
        (name = "Comments", description = "Comments under a post"),
        (name = "Votes", description = "Up and down votes"),
        (name = "Reports", description = "Moderation reports")
    )
)]
pub struct ApiDoc;
