//! Tag records, renaming payloads and list filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{from_record, OrderDir, VisitsSummary};
use crate::error::Result;
use crate::http::QueryParams;

/// A tag together with its usage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "TagRecord")]
pub struct TagWithStats {
    pub tag: String,
    pub short_urls_count: u64,
    pub visits: VisitsSummary,
}

impl TagWithStats {
    pub fn from_value(record: Value) -> Result<Self> {
        from_record(record)
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TagRecord {
    tag: String,
    short_urls_count: u64,
    visits_summary: Option<VisitsSummary>,
    visits_count: Option<u64>,
}

impl From<TagRecord> for TagWithStats {
    fn from(record: TagRecord) -> Self {
        Self {
            tag: record.tag,
            short_urls_count: record.short_urls_count,
            visits: VisitsSummary::resolve(record.visits_summary, record.visits_count),
        }
    }
}

/// Payload for `PUT /tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRenaming {
    old_name: String,
    new_name: String,
}

impl TagRenaming {
    pub fn from_old_to_new(old_name: &str, new_name: &str) -> Self {
        Self {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        }
    }

    pub fn old_name(&self) -> &str {
        &self.old_name
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagsOrderField {
    Tag,
    ShortUrlsCount,
    Visits,
}

/// Query constraints for `GET /tags` and `GET /tags/stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsFilter {
    search_term: Option<String>,
    order_by: Option<(TagsOrderField, OrderDir)>,
    paginate: bool,
}

impl Default for TagsFilter {
    fn default() -> Self {
        Self {
            search_term: None,
            order_by: None,
            paginate: true,
        }
    }
}

impl TagsFilter {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn search_term(mut self, term: &str) -> Self {
        self.search_term = Some(term.to_string());
        self
    }

    pub fn order_by(mut self, field: TagsOrderField, dir: OrderDir) -> Self {
        self.order_by = Some((field, dir));
        self
    }

    /// Fetch only the first page instead of walking every page.
    pub fn without_pagination(mut self) -> Self {
        self.paginate = false;
        self
    }

    pub fn should_paginate_request(&self) -> bool {
        self.paginate
    }

    pub fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        if let Some(term) = &self.search_term {
            query.push("searchTerm", term.as_str());
        }
        if let Some((field, dir)) = self.order_by {
            let field = match field {
                TagsOrderField::Tag => "tag",
                TagsOrderField::ShortUrlsCount => "shortUrlsCount",
                TagsOrderField::Visits => "visits",
            };
            query.push("orderBy", format!("{field}-{}", dir.as_str()));
        }
        query
    }
}
