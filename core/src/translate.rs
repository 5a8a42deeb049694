//! Per-operation translation of remote failures into typed errors.
//!
//! # Design
//! Every mutating operation owns an explicit table mapping Shlink's `type`
//! discriminator to the constructor of a typed `ShlinkError`. Lookup is an
//! exact string match. A discriminator missing from the table is not an
//! error: the original `ShlinkError::Http` is handed back unchanged so
//! callers can still match on it as a catch-all.

use tracing::debug;

use crate::error::{HttpError, ShlinkError};

pub type Constructor = fn(HttpError) -> ShlinkError;

/// Operations whose failures are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetShortUrl,
    DeleteShortUrl,
    CreateShortUrl,
    EditShortUrl,
    RenameTag,
    DeleteTags,
}

const GET_SHORT_URL: &[(&str, Constructor)] = &[("INVALID_SHORTCODE", ShlinkError::ShortUrlNotFound)];

const DELETE_SHORT_URL: &[(&str, Constructor)] = &[
    ("INVALID_SHORTCODE", ShlinkError::ShortUrlNotFound),
    ("INVALID_SHORTCODE_DELETION", ShlinkError::delete_threshold),
];

const CREATE_SHORT_URL: &[(&str, Constructor)] = &[
    ("INVALID_ARGUMENT", ShlinkError::InvalidData),
    ("INVALID_URL", ShlinkError::invalid_long_url),
    ("INVALID_SLUG", ShlinkError::NonUniqueSlug),
];

const EDIT_SHORT_URL: &[(&str, Constructor)] = &[
    ("INVALID_SHORTCODE", ShlinkError::ShortUrlNotFound),
    ("INVALID_ARGUMENT", ShlinkError::InvalidData),
    ("INVALID_SLUG", ShlinkError::NonUniqueSlug),
];

const RENAME_TAG: &[(&str, Constructor)] = &[
    ("INVALID_ARGUMENT", ShlinkError::InvalidData),
    ("FORBIDDEN_OPERATION", ShlinkError::ForbiddenTagOperation),
    ("TAG_NOT_FOUND", ShlinkError::TagNotFound),
    ("TAG_CONFLICT", ShlinkError::TagConflict),
];

const DELETE_TAGS: &[(&str, Constructor)] = &[("FORBIDDEN_OPERATION", ShlinkError::ForbiddenTagOperation)];

impl Operation {
    pub fn error_table(self) -> &'static [(&'static str, Constructor)] {
        match self {
            Self::GetShortUrl => GET_SHORT_URL,
            Self::DeleteShortUrl => DELETE_SHORT_URL,
            Self::CreateShortUrl => CREATE_SHORT_URL,
            Self::EditShortUrl => EDIT_SHORT_URL,
            Self::RenameTag => RENAME_TAG,
            Self::DeleteTags => DELETE_TAGS,
        }
    }
}

/// Refine `err` using `operation`'s table. Anything other than an
/// untranslated remote failure passes through untouched.
pub fn translate(operation: Operation, err: ShlinkError) -> ShlinkError {
    let ShlinkError::Http(failure) = err else {
        return err;
    };
    let constructor = operation
        .error_table()
        .iter()
        .find(|(discriminator, _)| *discriminator == failure.error_type())
        .map(|(_, constructor)| *constructor);

    match constructor {
        Some(constructor) => {
            debug!(?operation, error_type = failure.error_type(), "translated remote failure");
            constructor(failure)
        }
        None => ShlinkError::Http(failure),
    }
}
