//! Game source: fetching and scraping game pages.
//!
//! [`GameSource`] is the seam the scheduler and the command interpreter
//! depend on. [`WebDiplomacyClient`] implements it over HTTP with a bounded
//! exponential backoff, using a [`PageParser`] to scrape the page.

pub mod client;
pub mod parser;

pub use client::{BackoffPolicy, GameSource, WebDiplomacyClient, build_snapshot};
pub use parser::{PageField, PageParser, ParsedPage, RegexPageParser};
