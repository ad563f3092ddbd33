//! HTTP client for the SelectLine mobile API.
//!
//! Handles login-token lifecycle, transparent re-authentication on 401,
//! fixed-backoff retry on 429/503, page-at-a-time list fetching, and
//! normalization of raw SelectLine payloads into the canonical
//! [`slsync_core::RemoteGroup`] / [`slsync_core::RemoteArticle`] shapes.

mod client;
mod error;
mod normalize;
mod pager;
mod session;
mod types;

pub use client::SelectLineClient;
pub use error::ClientError;
pub use normalize::{normalize_article, normalize_group};
pub use pager::{fetch_all_articles, fetch_all_groups, MAX_PAGES};
pub use session::AuthSession;
pub use types::{RawArticle, RawGroup};
