//! Short URL records, identifiers, creation/edition payloads and list filters.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{from_record, OrderDir, VisitsSummary};
use crate::error::Result;
use crate::http::QueryParams;

/// A short URL as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ShortUrlRecord")]
pub struct ShortUrl {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
    pub date_created: Option<DateTime<FixedOffset>>,
    pub visits: VisitsSummary,
    pub tags: Vec<String>,
    pub meta: ShortUrlMeta,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub crawlable: bool,
    pub forward_query: bool,
}

impl ShortUrl {
    pub fn from_value(record: Value) -> Result<Self> {
        from_record(record)
    }

    pub fn identifier(&self) -> ShortUrlIdentifier {
        ShortUrlIdentifier {
            short_code: self.short_code.clone(),
            domain: self.domain.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShortUrlMeta {
    pub valid_since: Option<DateTime<FixedOffset>>,
    pub valid_until: Option<DateTime<FixedOffset>>,
    pub max_visits: Option<u64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ShortUrlRecord {
    short_code: String,
    short_url: String,
    long_url: String,
    date_created: Option<DateTime<FixedOffset>>,
    visits_summary: Option<VisitsSummary>,
    visits_count: Option<u64>,
    tags: Vec<String>,
    meta: ShortUrlMeta,
    domain: Option<String>,
    title: Option<String>,
    crawlable: bool,
    forward_query: Option<bool>,
}

impl From<ShortUrlRecord> for ShortUrl {
    fn from(record: ShortUrlRecord) -> Self {
        Self {
            short_code: record.short_code,
            short_url: record.short_url,
            long_url: record.long_url,
            date_created: record.date_created,
            visits: VisitsSummary::resolve(record.visits_summary, record.visits_count),
            tags: record.tags,
            meta: record.meta,
            domain: record.domain,
            title: record.title,
            crawlable: record.crawlable,
            // Shlink forwards the query string unless told otherwise.
            forward_query: record.forward_query.unwrap_or(true),
        }
    }
}

/// A short code, optionally scoped to a non-default domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrlIdentifier {
    short_code: String,
    domain: Option<String>,
}

impl ShortUrlIdentifier {
    pub fn from_short_code(short_code: &str) -> Self {
        Self {
            short_code: short_code.to_string(),
            domain: None,
        }
    }

    pub fn from_short_code_and_domain(short_code: &str, domain: &str) -> Self {
        Self {
            short_code: short_code.to_string(),
            domain: Some(domain.to_string()),
        }
    }

    pub fn short_code(&self) -> &str {
        &self.short_code
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The short code travels as a single path segment.
    pub(crate) fn path(&self) -> String {
        format!("/short-urls/{}", urlencoding::encode(&self.short_code))
    }

    pub(crate) fn query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        if let Some(domain) = &self.domain {
            query.push("domain", domain.as_str());
        }
        query
    }
}

/// Payload for `POST /short-urls`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlCreation {
    long_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_slug: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_since: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_until: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_visits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    find_if_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_code_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crawlable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forward_query: Option<bool>,
}

impl ShortUrlCreation {
    pub fn for_long_url(long_url: &str) -> Self {
        Self {
            long_url: long_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_custom_slug(mut self, slug: &str) -> Self {
        self.custom_slug = Some(slug.to_string());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn valid_since(mut self, since: DateTime<FixedOffset>) -> Self {
        self.valid_since = Some(since);
        self
    }

    pub fn valid_until(mut self, until: DateTime<FixedOffset>) -> Self {
        self.valid_until = Some(until);
        self
    }

    pub fn with_max_visits(mut self, max_visits: u64) -> Self {
        self.max_visits = Some(max_visits);
        self
    }

    pub fn for_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Return an existing short URL for the same long URL and options
    /// instead of creating a duplicate.
    pub fn returning_existing_matching(mut self) -> Self {
        self.find_if_exists = true;
        self
    }

    pub fn with_short_code_length(mut self, length: u32) -> Self {
        self.short_code_length = Some(length);
        self
    }

    pub fn crawlable(mut self) -> Self {
        self.crawlable = Some(true);
        self
    }

    pub fn without_query_forwarding(mut self) -> Self {
        self.forward_query = Some(false);
        self
    }

    pub fn long_url(&self) -> &str {
        &self.long_url
    }
}

/// Payload for `PATCH /short-urls/{shortCode}`. Only set fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlEdition {
    #[serde(skip_serializing_if = "Option::is_none")]
    long_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_since: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_until: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_visits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crawlable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forward_query: Option<bool>,
}

impl ShortUrlEdition {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn with_long_url(mut self, long_url: &str) -> Self {
        self.long_url = Some(long_url.to_string());
        self
    }

    /// Replace the tag set. An empty list removes every tag.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn valid_since(mut self, since: DateTime<FixedOffset>) -> Self {
        self.valid_since = Some(since);
        self
    }

    pub fn valid_until(mut self, until: DateTime<FixedOffset>) -> Self {
        self.valid_until = Some(until);
        self
    }

    pub fn with_max_visits(mut self, max_visits: u64) -> Self {
        self.max_visits = Some(max_visits);
        self
    }

    pub fn crawlable(mut self, crawlable: bool) -> Self {
        self.crawlable = Some(crawlable);
        self
    }

    pub fn forward_query(mut self, forward_query: bool) -> Self {
        self.forward_query = Some(forward_query);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagsMode {
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortUrlsOrderField {
    LongUrl,
    ShortCode,
    DateCreated,
    Title,
    Visits,
    NonBotVisits,
}

impl ShortUrlsOrderField {
    fn as_str(self) -> &'static str {
        match self {
            Self::LongUrl => "longUrl",
            Self::ShortCode => "shortCode",
            Self::DateCreated => "dateCreated",
            Self::Title => "title",
            Self::Visits => "visits",
            Self::NonBotVisits => "nonBotVisits",
        }
    }
}

/// Query constraints for `GET /short-urls`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortUrlsFilter {
    search_term: Option<String>,
    tags: Vec<String>,
    tags_mode: Option<TagsMode>,
    order_by: Option<(ShortUrlsOrderField, OrderDir)>,
    start_date: Option<DateTime<FixedOffset>>,
    end_date: Option<DateTime<FixedOffset>>,
    exclude_max_visits_reached: bool,
    exclude_past_valid_until: bool,
    domain: Option<String>,
    paginate: bool,
}

impl Default for ShortUrlsFilter {
    fn default() -> Self {
        Self {
            search_term: None,
            tags: Vec::new(),
            tags_mode: None,
            order_by: None,
            start_date: None,
            end_date: None,
            exclude_max_visits_reached: false,
            exclude_past_valid_until: false,
            domain: None,
            paginate: true,
        }
    }
}

impl ShortUrlsFilter {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn search_term(mut self, term: &str) -> Self {
        self.search_term = Some(term.to_string());
        self
    }

    pub fn containing_some_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self.tags_mode = Some(TagsMode::Any);
        self
    }

    pub fn containing_all_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self.tags_mode = Some(TagsMode::All);
        self
    }

    pub fn order_by(mut self, field: ShortUrlsOrderField, dir: OrderDir) -> Self {
        self.order_by = Some((field, dir));
        self
    }

    pub fn since(mut self, start: DateTime<FixedOffset>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<FixedOffset>) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn exclude_max_visits_reached(mut self) -> Self {
        self.exclude_max_visits_reached = true;
        self
    }

    pub fn exclude_past_valid_until(mut self) -> Self {
        self.exclude_past_valid_until = true;
        self
    }

    pub fn for_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
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
        for tag in &self.tags {
            query.push("tags[]", tag.as_str());
        }
        if let Some(mode) = self.tags_mode.filter(|_| !self.tags.is_empty()) {
            query.push(
                "tagsMode",
                match mode {
                    TagsMode::Any => "any",
                    TagsMode::All => "all",
                },
            );
        }
        if let Some((field, dir)) = self.order_by {
            query.push("orderBy", format!("{}-{}", field.as_str(), dir.as_str()));
        }
        if let Some(start) = self.start_date {
            query.push("startDate", start.to_rfc3339());
        }
        if let Some(end) = self.end_date {
            query.push("endDate", end.to_rfc3339());
        }
        if self.exclude_max_visits_reached {
            query.push("excludeMaxVisitsReached", "true");
        }
        if self.exclude_past_valid_until {
            query.push("excludePastValidUntil", "true");
        }
        if let Some(domain) = &self.domain {
            query.push("domain", domain.as_str());
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn short_url_maps_full_record() {
        let short_url = ShortUrl::from_value(json!({
            "shortCode": "abc123",
            "shortUrl": "https://s.test/abc123",
            "longUrl": "https://example.com/very/long",
            "dateCreated": "2023-01-02T03:04:05+02:00",
            "visitsSummary": {"total": 10, "nonBots": 8, "bots": 2},
            "tags": ["foo", "bar"],
            "meta": {"validSince": null, "validUntil": "2024-01-01T00:00:00+00:00", "maxVisits": 100},
            "domain": null,
            "title": "Example",
            "crawlable": true,
            "forwardQuery": false,
        }))
        .unwrap();

        assert_eq!(short_url.short_code, "abc123");
        assert_eq!(short_url.long_url, "https://example.com/very/long");
        assert_eq!(
            short_url.date_created.unwrap().to_rfc3339(),
            "2023-01-02T03:04:05+02:00"
        );
        assert_eq!(short_url.visits.non_bots, 8);
        assert_eq!(short_url.tags, vec!["foo", "bar"]);
        assert_eq!(short_url.meta.max_visits, Some(100));
        assert!(short_url.meta.valid_since.is_none());
        assert!(short_url.meta.valid_until.is_some());
        assert_eq!(short_url.title.as_deref(), Some("Example"));
        assert!(short_url.crawlable);
        assert!(!short_url.forward_query);
    }

    #[test]
    fn short_url_tolerates_sparse_record() {
        let short_url = ShortUrl::from_value(json!({"dateCreated": "2023-01-02T03:04:05+00:00"})).unwrap();
        assert_eq!(short_url.short_code, "");
        assert!(short_url.date_created.is_some());
        assert!(short_url.forward_query);
        assert_eq!(short_url.visits, VisitsSummary::default());
    }

    #[test]
    fn short_url_falls_back_to_legacy_visits_count() {
        let short_url = ShortUrl::from_value(json!({"shortCode": "x", "visitsCount": 5})).unwrap();
        assert_eq!(short_url.visits.total, 5);
    }

    #[test]
    fn short_url_rejects_bad_date() {
        assert!(ShortUrl::from_value(json!({"dateCreated": "yesterday"})).is_err());
    }

    #[test]
    fn identifier_query_includes_domain_only_when_set() {
        assert!(ShortUrlIdentifier::from_short_code("foo").query().is_empty());
        let id = ShortUrlIdentifier::from_short_code_and_domain("foo", "doma.in");
        assert_eq!(id.query().get("domain"), Some("doma.in"));
        assert_eq!(id.path(), "/short-urls/foo");
    }

    #[test]
    fn identifier_path_encodes_reserved_characters() {
        assert_eq!(ShortUrlIdentifier::from_short_code("a?b#c/d").path(), "/short-urls/a%3Fb%23c%2Fd");
        assert_eq!(ShortUrlIdentifier::from_short_code("my slug").path(), "/short-urls/my%20slug");
    }

    #[test]
    fn creation_omits_unset_fields() {
        let body = serde_json::to_value(ShortUrlCreation::for_long_url("https://foo.com")).unwrap();
        assert_eq!(body, json!({"longUrl": "https://foo.com"}));
    }

    #[test]
    fn creation_serializes_options() {
        let body = serde_json::to_value(
            ShortUrlCreation::for_long_url("https://foo.com")
                .with_custom_slug("my-slug")
                .with_tags(["a", "b"])
                .with_max_visits(3)
                .returning_existing_matching()
                .without_query_forwarding(),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "longUrl": "https://foo.com",
                "customSlug": "my-slug",
                "tags": ["a", "b"],
                "maxVisits": 3,
                "findIfExists": true,
                "forwardQuery": false,
            })
        );
    }

    #[test]
    fn edition_can_clear_tags() {
        let body = serde_json::to_value(ShortUrlEdition::create().with_tags(Vec::<String>::new())).unwrap();
        assert_eq!(body, json!({"tags": []}));
        assert_eq!(serde_json::to_value(ShortUrlEdition::create()).unwrap(), json!({}));
    }

    #[test]
    fn filter_defaults_to_empty_query_and_pagination() {
        let filter = ShortUrlsFilter::create();
        assert!(filter.to_query().is_empty());
        assert!(filter.should_paginate_request());
        assert!(!filter.without_pagination().should_paginate_request());
    }

    #[test]
    fn filter_builds_query() {
        let since = DateTime::parse_from_rfc3339("2023-01-01T00:00:00+00:00").unwrap();
        let query = ShortUrlsFilter::create()
            .search_term("foo")
            .containing_all_tags(["a", "b"])
            .order_by(ShortUrlsOrderField::Visits, OrderDir::Desc)
            .since(since)
            .exclude_max_visits_reached()
            .to_query();

        assert_eq!(query.get("searchTerm"), Some("foo"));
        assert_eq!(query.get_all("tags[]").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(query.get("tagsMode"), Some("all"));
        assert_eq!(query.get("orderBy"), Some("visits-DESC"));
        assert_eq!(query.get("startDate"), Some("2023-01-01T00:00:00+00:00"));
        assert_eq!(query.get("excludeMaxVisitsReached"), Some("true"));
        assert!(query.get("endDate").is_none());
        assert!(query.get("excludePastValidUntil").is_none());
    }
}
