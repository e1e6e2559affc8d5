//! Integration tests for the crawler
//!
//! `engine_tests` drive the crawl engine against a scripted fetcher and an
//! in-memory store. `crawl_tests` use wiremock to exercise the real HTTP
//! fetcher and a full crawl backed by SQLite.

mod engine_tests;
mod support;
