// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Service Proxy
//!
//! Translates the BFF's list/create/delete operations into the PostgREST
//! dialect spoken by the data service.
//!
//! ## Modules
//!
//! - `client` - HTTP client, token forwarding, error surfacing
//! - `pagination` - page/page-size ↔ `Range`/`Content-Range`
//! - `query` - `eq`/`cs` filters, `order`, `limit`

pub mod client;
pub mod pagination;
pub mod query;

pub use client::{DataServiceClient, UpstreamError};
pub use pagination::{extract_total, PageRequest, PageResult};
pub use query::{Direction, Query};
