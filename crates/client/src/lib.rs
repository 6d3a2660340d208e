//! HTTP clients for the reporting API, the audit worker and sitemap
//! documents.
//!
//! Reporting-API and worker requests carry `Authorization: Bearer <token>`;
//! any non-2xx response is surfaced as [`ClientError::Api`] with its status
//! and body.

pub mod api;
pub mod error;
pub mod http;
pub mod sitemap;
pub mod worker;

pub use api::ReportApi;
pub use error::ClientError;
pub use sitemap::SitemapClient;
pub use worker::WorkerApi;
