//! Resource clients for the Shlink REST API.
//!
//! # Design
//! Each resource client wraps a `ShlinkTransport` handle and never mutates
//! it, so one transport can back any number of clients. Handles are cloned
//! into lazy list loaders, which is why clients want a cheap `Clone`
//! transport: a reference, an `Arc`, or `HttpClient` itself.
//!
//! List operations return a `PaginatedList`; single-item operations issue
//! one call and run failures through `translate` for that operation.

mod short_urls;
mod tags;

use serde_json::Value;

use crate::config::ShlinkConfig;
use crate::error::Result;
use crate::http::{HttpClient, QueryParams, ShlinkTransport, UreqExecutor};
use crate::pagination::{Page, PaginatedList};

pub use short_urls::ShortUrlsClient;
pub use tags::TagsClient;

/// Entry point bundling every resource client over one transport.
#[derive(Debug, Clone)]
pub struct ShlinkClient<T> {
    transport: T,
}

impl ShlinkClient<HttpClient<UreqExecutor>> {
    pub fn from_config(config: ShlinkConfig) -> Self {
        Self::new(HttpClient::from_config(config))
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(ShlinkConfig::from_env()?))
    }
}

impl<T: ShlinkTransport> ShlinkClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn short_urls(&self) -> ShortUrlsClient<&T> {
        ShortUrlsClient::new(&self.transport)
    }

    pub fn tags(&self) -> TagsClient<&T> {
        TagsClient::new(&self.transport)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// A lazy list over `GET {path}`, reading records from `{key}.data`.
fn list_endpoint<'a, T, R>(
    transport: T,
    path: &'static str,
    key: &'static str,
    query: QueryParams,
    paginate: bool,
    mapper: fn(Value) -> Result<R>,
) -> PaginatedList<'a, R>
where
    T: ShlinkTransport + 'a,
{
    let loader = move |page: u32, items_per_page: u32| {
        let mut query = query.clone();
        query.set("page", page.to_string());
        query.set("itemsPerPage", items_per_page.to_string());
        let payload = transport.get_from_shlink(path, &query)?;
        Page::from_payload(payload, key)
    };

    if paginate {
        PaginatedList::paginated(loader, mapper)
    } else {
        PaginatedList::single_page(loader, mapper)
    }
}
