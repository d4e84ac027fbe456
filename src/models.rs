// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Records returned by the data service and the request bodies accepted by
//! the REST API.
//!
//! Request bodies that carry cross-field invariants (votes, reports) are
//! deserialized as-is and then converted with `validate()` into a typed
//! form ([`Vote`], [`Report`]) that cannot represent an invalid request.
//!
//! Records coming back from the data service are read leniently: `null`
//! counters and tags fall back to their defaults, numeric ids are rendered
//! as strings and `status` is passed through unchanged.
//!
//! ## Model Categories
//!
//! - **Posts**: board entries with tags and vote counters
//! - **Comments**: replies under a post
//! - **Votes**: up/down votes on a post or a comment
//! - **Reports**: moderation reports on a post or a comment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Minimum length of a report reason after trimming.
pub const MIN_REPORT_REASON_LEN: usize = 3;

/// Request-shape violations, reported before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid vote value (expected -1 or 1)")]
    InvalidVoteValue,
    #[error("Provide either post_id or comment_id")]
    AmbiguousTarget,
    #[error("Reason must be at least {} characters", MIN_REPORT_REASON_LEN)]
    ReasonTooShort,
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Primary keys may be UUID text or integer columns.
fn record_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

fn published() -> String {
    PostStatus::Published.as_str().to_string()
}

fn status_or_published<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(published))
}

// =============================================================================
// Posts
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Published,
    Hidden,
    Deleted,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "published",
            PostStatus::Hidden => "hidden",
            PostStatus::Deleted => "deleted",
        }
    }
}

/// List ordering for posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    /// Newest first
    #[default]
    New,
    /// Most upvoted first, fewest downvotes breaking ties
    Top,
}

/// A board post as stored by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    #[serde(deserialize_with = "record_id")]
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Moderation state as stored; `published` when absent.
    #[serde(default = "published", deserialize_with = "status_or_published")]
    #[schema(example = "published")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub up_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub down_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /posts`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Row inserted into `posts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost<'a> {
    pub author_id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub tags: &'a [String],
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        Ok(())
    }

    pub fn to_row<'a>(&'a self, author_id: &'a str) -> NewPost<'a> {
        NewPost {
            author_id,
            title: self.title.trim(),
            body: &self.body,
            tags: self.tags.as_deref().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    #[serde(deserialize_with = "record_id")]
    pub id: String,
    #[serde(deserialize_with = "record_id")]
    pub post_id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub up_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub down_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /posts/{id}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment<'a> {
    pub post_id: &'a str,
    pub author_id: &'a str,
    pub body: &'a str,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyField("body"));
        }
        Ok(())
    }
}

// =============================================================================
// Vote & report targets
// =============================================================================

/// What a vote or report refers to: exactly one post or one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Post(String),
    Comment(String),
}

impl Target {
    /// Build from the optional id pair. Empty strings count as absent.
    pub fn from_ids(
        post_id: Option<String>,
        comment_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        let post_id = post_id.filter(|id| !id.is_empty());
        let comment_id = comment_id.filter(|id| !id.is_empty());
        match (post_id, comment_id) {
            (Some(post_id), None) => Ok(Target::Post(post_id)),
            (None, Some(comment_id)) => Ok(Target::Comment(comment_id)),
            _ => Err(ValidationError::AmbiguousTarget),
        }
    }

    /// Column holding the target id in `votes` and `reports`.
    pub fn column(&self) -> &'static str {
        match self {
            Target::Post(_) => "post_id",
            Target::Comment(_) => "comment_id",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Target::Post(id) | Target::Comment(id) => id,
        }
    }

    fn post_id(&self) -> Option<&str> {
        match self {
            Target::Post(id) => Some(id),
            Target::Comment(_) => None,
        }
    }

    fn comment_id(&self) -> Option<&str> {
        match self {
            Target::Comment(id) => Some(id),
            Target::Post(_) => None,
        }
    }
}

// =============================================================================
// Votes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i8(self) -> i8 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            _ => Err(ValidationError::InvalidVoteValue),
        }
    }
}

/// Body of `POST /votes`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoteRequest {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub comment_id: Option<String>,
    /// `1` for an upvote, `-1` for a downvote.
    pub value: i64,
}

/// A vote that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub target: Target,
    pub value: VoteValue,
}

impl VoteRequest {
    pub fn validate(self) -> Result<Vote, ValidationError> {
        let value = VoteValue::try_from(self.value)?;
        let target = Target::from_ids(self.post_id, self.comment_id)?;
        Ok(Vote { target, value })
    }
}

/// Row upserted into `votes`.
#[derive(Debug, Clone, Serialize)]
pub struct VoteRow<'a> {
    pub user_id: &'a str,
    pub post_id: Option<&'a str>,
    pub comment_id: Option<&'a str>,
    pub value: i8,
}

impl Vote {
    pub fn to_row<'a>(&'a self, user_id: &'a str) -> VoteRow<'a> {
        VoteRow {
            user_id,
            post_id: self.target.post_id(),
            comment_id: self.target.comment_id(),
            value: self.value.as_i8(),
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Body of `POST /reports`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportRequest {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub comment_id: Option<String>,
    pub reason: String,
}

/// A report that passed shape validation; `reason` is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub target: Target,
    pub reason: String,
}

impl ReportRequest {
    pub fn validate(self) -> Result<Report, ValidationError> {
        let reason = self.reason.trim();
        if reason.chars().count() < MIN_REPORT_REASON_LEN {
            return Err(ValidationError::ReasonTooShort);
        }
        let target = Target::from_ids(self.post_id, self.comment_id)?;
        Ok(Report {
            target,
            reason: reason.to_string(),
        })
    }
}

/// Row inserted into `reports`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow<'a> {
    pub reporter_id: &'a str,
    pub post_id: Option<&'a str>,
    pub comment_id: Option<&'a str>,
    pub reason: &'a str,
}

impl Report {
    pub fn to_row<'a>(&'a self, reporter_id: &'a str) -> ReportRow<'a> {
        ReportRow {
            reporter_id,
            post_id: self.target.post_id(),
            comment_id: self.target.comment_id(),
            reason: &self.reason,
        }
    }
}
