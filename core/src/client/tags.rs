//! `/tags` operations.

use serde_json::Value;
use tracing::instrument;

use super::list_endpoint;
use crate::error::Result;
use crate::http::{HttpMethod, QueryParams, ShlinkTransport};
use crate::pagination::PaginatedList;
use crate::translate::{translate, Operation};
use crate::types::{from_record, to_body, TagRenaming, TagWithStats, TagsFilter};

/// Operations on `/tags`.
#[derive(Debug, Clone)]
pub struct TagsClient<T> {
    transport: T,
}

impl<T: ShlinkTransport + Clone> TagsClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn list_tags(&self) -> Result<Vec<String>> {
        self.list_tags_with_filter(&TagsFilter::create())
    }

    /// Tag names only. The endpoint answers in one page.
    #[instrument(skip_all)]
    pub fn list_tags_with_filter(&self, filter: &TagsFilter) -> Result<Vec<String>> {
        let mut payload = self.transport.get_from_shlink("/tags", &filter.to_query())?;
        match payload.pointer_mut("/tags/data").map(Value::take) {
            Some(data @ Value::Array(_)) => from_record(data),
            _ => Ok(Vec::new()),
        }
    }

    pub fn list_tags_with_stats<'a>(&self) -> PaginatedList<'a, TagWithStats>
    where
        T: 'a,
    {
        self.list_tags_with_stats_with_filter(&TagsFilter::create())
    }

    pub fn list_tags_with_stats_with_filter<'a>(&self, filter: &TagsFilter) -> PaginatedList<'a, TagWithStats>
    where
        T: 'a,
    {
        list_endpoint(
            self.transport.clone(),
            "/tags/stats",
            "tags",
            filter.to_query(),
            filter.should_paginate_request(),
            TagWithStats::from_value,
        )
    }

    /// Tags with stats from servers older than the `/tags/stats` endpoint,
    /// which embed them in `GET /tags?withStats=true` under `tags.stats`.
    #[deprecated(note = "use list_tags_with_stats on Shlink 3.x")]
    #[instrument(skip_all)]
    pub fn list_tags_and_stats(&self) -> Result<Vec<TagWithStats>> {
        let query = QueryParams::new().with("withStats", "true");
        let mut payload = self.transport.get_from_shlink("/tags", &query)?;
        match payload.pointer_mut("/tags/stats").map(Value::take) {
            Some(Value::Array(records)) => records.into_iter().map(TagWithStats::from_value).collect(),
            _ => Ok(Vec::new()),
        }
    }

    #[instrument(skip_all, fields(old_name = renaming.old_name(), new_name = renaming.new_name()))]
    pub fn rename_tag(&self, renaming: &TagRenaming) -> Result<()> {
        self.transport
            .call_shlink_with_body("/tags", HttpMethod::Put, &to_body(renaming)?, &QueryParams::new())
            .map_err(|e| translate(Operation::RenameTag, e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(count = tags.len()))]
    pub fn delete_tags<S: AsRef<str>>(&self, tags: &[S]) -> Result<()> {
        let mut query = QueryParams::new();
        for tag in tags {
            query.push("tags[]", tag.as_ref());
        }
        self.transport
            .call_shlink_with_body("/tags", HttpMethod::Delete, &Value::Null, &query)
            .map_err(|e| translate(Operation::DeleteTags, e))?;
        Ok(())
    }
}
