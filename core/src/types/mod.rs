//! Domain values exchanged with the Shlink API.
//!
//! # Design
//! Records coming from the server deserialize with every field defaulted,
//! so older or newer Shlink versions that omit a field never fail a whole
//! listing. Payloads going to the server skip unset fields entirely.

mod short_urls;
mod tags;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ShlinkError};

pub use short_urls::{
    ShortUrl, ShortUrlCreation, ShortUrlEdition, ShortUrlIdentifier, ShortUrlMeta, ShortUrlsFilter,
    ShortUrlsOrderField, TagsMode,
};
pub use tags::{TagRenaming, TagWithStats, TagsFilter, TagsOrderField};

/// Visit counters, split by bot detection when the server supports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitsSummary {
    pub total: u64,
    pub non_bots: u64,
    pub bots: u64,
}

impl VisitsSummary {
    /// Servers predating bot detection only report a plain count.
    pub(crate) fn resolve(summary: Option<Self>, legacy_count: Option<u64>) -> Self {
        summary.unwrap_or(Self {
            total: legacy_count.unwrap_or_default(),
            non_bots: legacy_count.unwrap_or_default(),
            bots: 0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

pub(crate) fn from_record<T: DeserializeOwned>(record: Value) -> Result<T> {
    serde_json::from_value(record).map_err(|e| ShlinkError::Deserialization(e.to_string()))
}

pub(crate) fn to_body<T: Serialize>(payload: &T) -> Result<Value> {
    serde_json::to_value(payload).map_err(|e| ShlinkError::Serialization(e.to_string()))
}
