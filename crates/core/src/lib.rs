//! Domain types and pure logic for accessibility-audit dispatch.
//!
//! Nothing in this crate performs I/O. The HTTP plumbing lives in
//! `a11y-client` and the concurrent engine in `a11y-dispatch`.

pub mod error;
pub mod metadata;
pub mod progress;
pub mod retry;
pub mod sitemap;
pub mod types;

pub use error::CoreError;
