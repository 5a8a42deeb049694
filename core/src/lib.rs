//! Synchronous client for the Shlink URL-shortener REST API.
//!
//! # Overview
//! Typed calls on `ShortUrlsClient` and `TagsClient` become HTTP requests,
//! JSON payloads become domain values, list endpoints are walked page by
//! page on demand, and Shlink's problem-details errors are refined into
//! `ShlinkError` variants per operation.
//!
//! # Design
//! - Resource clients depend only on the `ShlinkTransport` trait. The
//!   shipped `HttpClient` builds plain-data requests and hands them to a
//!   `RequestExecutor` (`UreqExecutor` by default), keeping request building
//!   and response parsing free of I/O.
//! - `PaginatedList` is restartable and uncached: each traversal re-fetches
//!   from page 1.
//! - Error translation is table driven (`translate`). Unknown discriminators
//!   surface as `ShlinkError::Http`.
//! - No retries. Failures surface on the first attempt.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod translate;
pub mod types;

pub use client::{ShlinkClient, ShortUrlsClient, TagsClient};
pub use config::ShlinkConfig;
pub use error::{HttpError, Result, ShlinkError};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, QueryParams, RequestExecutor, ShlinkTransport, UreqExecutor};
pub use pagination::{Page, PageDescriptor, PaginatedList, DEFAULT_ITEMS_PER_PAGE};
pub use types::{
    OrderDir, ShortUrl, ShortUrlCreation, ShortUrlEdition, ShortUrlIdentifier, ShortUrlMeta, ShortUrlsFilter,
    ShortUrlsOrderField, TagRenaming, TagWithStats, TagsFilter, TagsMode, TagsOrderField, VisitsSummary,
};
