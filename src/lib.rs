//! Finds direct `.mp4` streams on online.sktorrent.eu for an IMDb title.
//!
//! The IMDb page gives the display and original titles, those are turned into
//! a list of search queries, and the queries are tried one by one until a
//! search yields videos with playable sources.

pub mod config;
pub mod error;
pub mod finder;
pub mod metadata;
pub mod queries;
pub mod server;
pub mod sktonline;
pub mod utils;

pub use config::ScraperConfig;
pub use error::{Result, ScrapeError};
pub use finder::{LookupRequest, MetadataSource, ScrapeReport, StreamFinder, VideoHost};
pub use metadata::{ImdbClient, TitlePair};
pub use queries::{Episode, MediaKind, QuerySet, generate_queries};
pub use sktonline::{SkTorrentClient, Stream, VideoId};
