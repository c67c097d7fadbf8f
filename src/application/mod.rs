//! Application services: fan-out aggregation and the posts query pipeline.

pub mod aggregator;
pub mod error;
pub mod query;
pub mod upstream;
