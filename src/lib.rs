//! Read-through aggregation cache for a tag-indexed blog posts API.
//!
//! A query names one or more tags. Each tag's posts come from the
//! [`cache::TagCache`] when already seen, otherwise from the upstream
//! [`application::upstream::PostSource`]; results are merged, deduplicated by
//! post id and sorted by the requested key and direction.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
