//! Search query generation.
//!
//! The host's search index is out of our control, so every title is tried in
//! several spellings: as-is, without diacritics, cut to three words and, for
//! episodes, cut to one word. The order of the resulting set is the order the
//! queries are tried in.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::metadata::TitlePair;
use crate::utils::{remove_diacritics, shorten_title};

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("valid parenthesis regex"));

/// Kind of media requested. Only `series` enables episode tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Anything other than "series" is treated as a movie.
    pub fn from_type(media_type: &str) -> Self {
        if media_type == "series" {
            MediaKind::Series
        } else {
            MediaKind::Movie
        }
    }
}

/// Season/episode pair of a series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Episode {
    pub season: u32,
    pub episode: u32,
}

impl Episode {
    /// Both numbers must be present and non-zero; otherwise there is no episode.
    pub fn from_parts(season: Option<u32>, episode: Option<u32>) -> Option<Self> {
        match (season, episode) {
            (Some(season), Some(episode)) if season > 0 && episode > 0 => {
                Some(Self { season, episode })
            }
            _ => None,
        }
    }

    /// `S01E02`
    pub fn padded_tag(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }

    /// `1x2`
    pub fn short_tag(&self) -> String {
        format!("{}x{}", self.season, self.episode)
    }
}

/// Insertion-ordered set of queries that silently rejects exact duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl QuerySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `query` unless it is blank or already present. Returns whether it was added.
    pub fn insert(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query.trim().is_empty() || self.seen.contains(&query) {
            return false;
        }
        self.seen.insert(query.clone());
        self.order.push(query);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, query: &str) -> bool {
        self.seen.contains(query)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl fmt::Display for QuerySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, query) in self.order.iter().enumerate() {
            writeln!(f, "{:>2}. {}", i + 1, query)?;
        }
        Ok(())
    }
}

/// Removes every "(...)" group, e.g. the release year, and trims.
pub fn strip_parenthesized(title: &str) -> String {
    PARENTHESIZED.replace_all(title, "").trim().to_string()
}

/// Builds the ordered, de-duplicated list of search queries for a request.
///
/// Episode tags are only used for series with a known season and episode;
/// a series without them is searched like a movie.
pub fn generate_queries(titles: &TitlePair, kind: MediaKind, episode: Option<Episode>) -> QuerySet {
    let mut queries = QuerySet::new();
    let episode = episode.filter(|_| kind == MediaKind::Series);

    for title in [&titles.title, &titles.original_title] {
        let base = strip_parenthesized(title);
        let no_dia = remove_diacritics(&base);
        let short = shorten_title(&no_dia, 3);

        match episode {
            Some(ep) => {
                let short1 = shorten_title(&no_dia, 1);
                let (padded, plain) = (ep.padded_tag(), ep.short_tag());
                // Título vazio não pode virar só a tag do episódio.
                for variant in [&base, &no_dia, &short, &short1] {
                    if variant.is_empty() {
                        continue;
                    }
                    queries.insert(format!("{variant} {padded}"));
                    queries.insert(format!("{variant} {plain}"));
                }
            }
            None => {
                for variant in [base, no_dia, short] {
                    queries.insert(variant);
                }
            }
        }
    }

    queries
}
