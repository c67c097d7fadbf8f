//! Domain types: posts, post collections and sort order.

pub mod posts;

pub use posts::{Post, PostCollection, SortDirection, SortKey};
