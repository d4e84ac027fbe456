// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared harness: a mock identity provider, a mock data service and
//! token signing with the fixture keys.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use ideaboard_bff::{api::router, state::AppState};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

pub const PRIMARY_PEM: &str = include_str!("../fixtures/primary_rsa.pem");
pub const ROGUE_PEM: &str = include_str!("../fixtures/rogue_rsa.pem");
pub const PRIMARY_JWK: &str = include_str!("../fixtures/primary_jwk.json");
pub const PRIMARY_KID: &str = "primary-key";
pub const ISSUER: &str = "https://project.supabase.co/auth/v1";
pub const USER_ID: &str = "user-123";

pub struct TestApp {
    pub app: Router,
    pub idp: mockito::ServerGuard,
    pub data: mockito::ServerGuard,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut idp = mockito::Server::new_async().await;
        idp.mock("GET", "/jwks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"keys":[{PRIMARY_JWK}]}}"#))
            .create_async()
            .await;
        let data = mockito::Server::new_async().await;

        let state = AppState::for_endpoints(
            &format!("{}/jwks", idp.url()),
            &data.url(),
            ISSUER,
        )
        .expect("state builds");

        Self {
            app: router(state, CorsLayer::new()),
            idp,
            data,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }
}

pub fn claims() -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": USER_ID,
        "role": "authenticated",
        "email": "ada@example.com",
        "aud": "authenticated",
        "iss": ISSUER,
        "iat": now,
        "exp": now + 3600,
    })
}

pub fn sign(claims: &Value, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(PRIMARY_KID.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

pub fn valid_token() -> String {
    sign(&claims(), PRIMARY_PEM)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
