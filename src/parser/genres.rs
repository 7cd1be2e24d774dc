//! Genre list shapes
//!
//! The API has returned genre lists in two shapes for the same logical field:
//!
//! ```json
//! { "genres": [ { "genre": { "text": "Drama" } } ] }   // nested
//! { "genres": [ { "text": "Drama" } ] }                // bare
//! ```
//!
//! Each entry is decoded independently into [`GenreEntry`]; a new upstream
//! shape only needs a new variant and an arm in [`GenreEntry::name`].

use serde::Deserialize;
use serde_json::Value;

use super::{lenient, TextValue};

/// One accepted genre entry shape
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenreEntry {
    /// `{ "genre": { "text": "Drama" } }`
    Nested { genre: TextValue },
    /// `{ "text": "Drama" }`
    Bare(TextValue),
}

impl GenreEntry {
    /// Genre display name, if the entry carries a non-empty one
    pub fn name(&self) -> Option<&str> {
        let text = match self {
            Self::Nested { genre } => genre.text.as_deref(),
            Self::Bare(t) => t.text.as_deref(),
        };
        text.map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Wrapper object holding the raw entries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreContainer {
    #[serde(default, deserialize_with = "lenient")]
    genres: Option<Vec<Value>>,
}

impl GenreContainer {
    /// Ordered genre names; entries in an unknown shape are skipped
    pub fn names(&self) -> Vec<String> {
        self.genres
            .iter()
            .flatten()
            .filter_map(|raw| GenreEntry::deserialize(raw).ok())
            .filter_map(|entry| entry.name().map(str::to_string))
            .collect()
    }
}

/// First container that yields any names, in order of preference
pub(crate) fn first_names<'a, I>(containers: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a GenreContainer>>,
{
    containers
        .into_iter()
        .flatten()
        .map(GenreContainer::names)
        .find(|names| !names.is_empty())
        .unwrap_or_default()
}
