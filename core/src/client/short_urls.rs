//! `/short-urls` operations: lazy listing plus single-item calls, each
//! translating remote failures through its own error table.

use serde_json::Value;
use tracing::instrument;

use super::list_endpoint;
use crate::error::Result;
use crate::http::{HttpMethod, QueryParams, ShlinkTransport};
use crate::pagination::PaginatedList;
use crate::translate::{translate, Operation};
use crate::types::{to_body, ShortUrl, ShortUrlCreation, ShortUrlEdition, ShortUrlIdentifier, ShortUrlsFilter};

/// Operations on `/short-urls`.
#[derive(Debug, Clone)]
pub struct ShortUrlsClient<T> {
    transport: T,
}

impl<T: ShlinkTransport + Clone> ShortUrlsClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Every short URL, walking all pages lazily.
    pub fn list_short_urls<'a>(&self) -> PaginatedList<'a, ShortUrl>
    where
        T: 'a,
    {
        self.list_short_urls_with_filter(&ShortUrlsFilter::create())
    }

    pub fn list_short_urls_with_filter<'a>(&self, filter: &ShortUrlsFilter) -> PaginatedList<'a, ShortUrl>
    where
        T: 'a,
    {
        list_endpoint(
            self.transport.clone(),
            "/short-urls",
            "shortUrls",
            filter.to_query(),
            filter.should_paginate_request(),
            ShortUrl::from_value,
        )
    }

    #[instrument(skip_all, fields(short_code = identifier.short_code(), domain = identifier.domain()))]
    pub fn get_short_url(&self, identifier: &ShortUrlIdentifier) -> Result<ShortUrl> {
        let payload = self
            .transport
            .get_from_shlink(&identifier.path(), &identifier.query())
            .map_err(|e| translate(Operation::GetShortUrl, e))?;
        ShortUrl::from_value(payload)
    }

    #[instrument(skip_all, fields(short_code = identifier.short_code(), domain = identifier.domain()))]
    pub fn delete_short_url(&self, identifier: &ShortUrlIdentifier) -> Result<()> {
        self.transport
            .call_shlink_with_body(&identifier.path(), HttpMethod::Delete, &Value::Null, &identifier.query())
            .map_err(|e| translate(Operation::DeleteShortUrl, e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(long_url = creation.long_url()))]
    pub fn create_short_url(&self, creation: &ShortUrlCreation) -> Result<ShortUrl> {
        let payload = self
            .transport
            .call_shlink_with_body("/short-urls", HttpMethod::Post, &to_body(creation)?, &QueryParams::new())
            .map_err(|e| translate(Operation::CreateShortUrl, e))?;
        ShortUrl::from_value(payload)
    }

    #[instrument(skip_all, fields(short_code = identifier.short_code(), domain = identifier.domain()))]
    pub fn edit_short_url(&self, identifier: &ShortUrlIdentifier, edition: &ShortUrlEdition) -> Result<ShortUrl> {
        let payload = self
            .transport
            .call_shlink_with_body(&identifier.path(), HttpMethod::Patch, &to_body(edition)?, &identifier.query())
            .map_err(|e| translate(Operation::EditShortUrl, e))?;
        ShortUrl::from_value(payload)
    }
}
