//! Integration tests module
//!
//! End-to-end tests for the marquee crawl engine against a mock server:
//! - Catalog → detail → review pipeline with checkpoint files
//! - Retry, session renewal and give-up scenarios

pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
