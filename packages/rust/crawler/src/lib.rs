//! Page acquisition for Lunathink.
//!
//! This crate provides [`ScrapingFetcher`], the [`ContentSource`] used in
//! production: it renders pages through a scraping API and normalizes them
//! with `lunathink-markdown`.
//!
//! [`ContentSource`]: lunathink_shared::ContentSource

pub mod fetcher;

pub use fetcher::{ScrapingFetcher, ScrapingOptions};
