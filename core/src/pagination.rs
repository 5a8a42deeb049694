//! Lazy traversal of Shlink's paginated list endpoints.
//!
//! # Design
//! A `PaginatedList` is a recipe, not a result: it holds the page loader and
//! nothing else. Every call to `iter()` starts a new traversal from page 1,
//! so iterating twice issues the same page requests twice. The only page
//! ever kept is the first one loaded by `count()`, which the next traversal
//! consumes instead of fetching page 1 again.
//!
//! Pages are fetched on demand. Dropping an iterator half way simply stops
//! further requests.

use std::cell::RefCell;
use std::fmt;
use std::iter::FusedIterator;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ShlinkError};

/// Large enough that most instances answer in a single round-trip.
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10_000;

/// The `pagination` object Shlink sends next to each page of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageDescriptor {
    pub current_page: u32,
    pub pages_count: u32,
    pub total_items: u64,
}

/// One page of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub descriptor: PageDescriptor,
}

impl Page {
    /// Extract `payload[key].data` and `payload[key].pagination`. Both are
    /// optional: no data is an empty page, no pagination a single page.
    pub fn from_payload(mut payload: Value, key: &str) -> Result<Self> {
        let Some(section) = payload.get_mut(key) else {
            return Ok(Self::default());
        };
        let items = match section.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let descriptor = match section.get_mut("pagination").map(Value::take) {
            Some(Value::Null) | None => PageDescriptor::default(),
            Some(raw) => serde_json::from_value(raw).map_err(|e| ShlinkError::Deserialization(e.to_string()))?,
        };
        Ok(Self { items, descriptor })
    }
}

type Loader<'a> = dyn Fn(u32, u32) -> Result<Page> + 'a;

/// A restartable, lazily fetched sequence over every item of a list
/// endpoint.
pub struct PaginatedList<'a, T> {
    loader: Box<Loader<'a>>,
    mapper: fn(Value) -> Result<T>,
    items_per_page: u32,
    paginate: bool,
    first_page: RefCell<Option<Page>>,
}

impl<'a, T> PaginatedList<'a, T> {
    /// Follow `pagesCount` until the last page.
    pub fn paginated(loader: impl Fn(u32, u32) -> Result<Page> + 'a, mapper: fn(Value) -> Result<T>) -> Self {
        Self {
            loader: Box::new(loader),
            mapper,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            paginate: true,
            first_page: RefCell::new(None),
        }
    }

    /// Load page 1 only, whatever `pagesCount` says.
    pub fn single_page(loader: impl Fn(u32, u32) -> Result<Page> + 'a, mapper: fn(Value) -> Result<T>) -> Self {
        Self {
            paginate: false,
            ..Self::paginated(loader, mapper)
        }
    }

    pub fn with_items_per_page(mut self, items_per_page: u32) -> Self {
        self.items_per_page = items_per_page.max(1);
        self.first_page = RefCell::new(None);
        self
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    pub fn is_paginated(&self) -> bool {
        self.paginate
    }

    /// Start a new traversal from page 1. Page 1 is fetched again unless
    /// `count()` loaded it since the last traversal.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            raw: self.raw(),
            mapper: self.mapper,
            done: false,
        }
    }

    /// Like `iter`, without mapping records into domain objects.
    pub fn raw(&self) -> RawIter<'_> {
        let mut raw = RawIter {
            loader: &*self.loader,
            items_per_page: self.items_per_page,
            paginate: self.paginate,
            buffer: Vec::new().into_iter(),
            next_page: Some(1),
        };
        if let Some(first) = self.first_page.borrow_mut().take() {
            raw.accept(1, first);
        }
        raw
    }

    /// Total number of items as reported by the first page. Later pages are
    /// not consulted. A response without pagination metadata counts the
    /// items it carries.
    ///
    /// The loaded page is kept for the next traversal, so counting and then
    /// iterating costs no extra request.
    pub fn count(&self) -> Result<u64> {
        let mut first_page = self.first_page.borrow_mut();
        let page = match first_page.take() {
            Some(page) => page,
            None => (self.loader)(1, self.items_per_page)?,
        };
        let total = if page.descriptor == PageDescriptor::default() {
            page.items.len() as u64
        } else {
            page.descriptor.total_items
        };
        *first_page = Some(page);
        Ok(total)
    }

    /// Walk every page and collect, stopping at the first error.
    pub fn collect_all(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }
}

impl<T> fmt::Debug for PaginatedList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedList")
            .field("items_per_page", &self.items_per_page)
            .field("paginate", &self.paginate)
            .finish_non_exhaustive()
    }
}

impl<'l, T> IntoIterator for &'l PaginatedList<'_, T> {
    type Item = Result<T>;
    type IntoIter = Iter<'l, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Raw records of one traversal.
pub struct RawIter<'l> {
    loader: &'l Loader<'l>,
    items_per_page: u32,
    paginate: bool,
    buffer: std::vec::IntoIter<Value>,
    next_page: Option<u32>,
}

impl Iterator for RawIter<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            let page = self.next_page.take()?;
            debug!(page, items_per_page = self.items_per_page, "fetching page");

            match (self.loader)(page, self.items_per_page) {
                Ok(fetched) => self.accept(page, fetched),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl RawIter<'_> {
    /// Buffer the items of `page` and decide what to fetch next. Continuation
    /// follows the page we asked for, not the `currentPage` the server echoes,
    /// so a traversal never requests more than `pagesCount` pages.
    fn accept(&mut self, requested: u32, page: Page) {
        self.next_page = (self.paginate && requested < page.descriptor.pages_count).then_some(requested + 1);
        self.buffer = page.items.into_iter();
    }
}

impl FusedIterator for RawIter<'_> {}

/// Domain objects of one traversal. Ends after the first error.
pub struct Iter<'l, T> {
    raw: RawIter<'l>,
    mapper: fn(Value) -> Result<T>,
    done: bool,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.raw.next()?.and_then(self.mapper);
        self.done = item.is_err();
        Some(item)
    }
}

impl<T> FusedIterator for Iter<'_, T> {}
