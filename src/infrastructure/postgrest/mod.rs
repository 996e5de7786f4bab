//! # PostgREST Data Source
//!
//! Query building and transport for the remote tabular data source.

pub mod client;
pub mod gateway;
pub mod query;

pub use client::{Page, PostgrestClient, parse_content_range_total};
pub use query::{RowRange, SELECT_FIELDS_BUSINESS_LIGHT, SELECT_FIELDS_FULL, SearchQuery};
