//! Errors surfaced by a dispatch run.

use a11y_client::ClientError;
use a11y_core::sitemap::{ParseLevel, SitemapError};
use a11y_core::CoreError;

/// Which reporting-API write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Report,
    ReportUpdate,
    Issue,
    UrlRecord,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Report => "report",
            Self::ReportUpdate => "report update",
            Self::Issue => "issue",
            Self::UrlRecord => "url record",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The sitemap could not be downloaded.
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: ClientError,
    },

    /// The sitemap is not well-formed XML.
    #[error("Malformed sitemap ({level}): {message}")]
    Parse { level: ParseLevel, message: String },

    /// A single worker call failed. Recovered by re-queueing the URL.
    #[error("Worker failed on {url}: {source}")]
    Worker {
        url: String,
        #[source]
        source: ClientError,
    },

    /// A URL exhausted its retry budget and was abandoned.
    #[error("Gave up on {url} after {attempts} attempts: {source}")]
    RepeatedFailure {
        url: String,
        attempts: u32,
        #[source]
        source: Box<DispatchError>,
    },

    /// The reporting API rejected a write.
    #[error("Failed to persist {entity} for {url}: {source}")]
    Persistence {
        entity: Entity,
        url: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Validation(#[from] CoreError),

    /// The run was cancelled before every URL was processed.
    #[error("Dispatch cancelled after {completed} of {total} URLs")]
    Cancelled { completed: usize, total: usize },
}

impl From<SitemapError> for DispatchError {
    fn from(err: SitemapError) -> Self {
        match err {
            SitemapError::Malformed { level, message } => Self::Parse { level, message },
        }
    }
}

impl DispatchError {
    pub fn worker(url: &str, source: ClientError) -> Self {
        Self::Worker {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn persistence(entity: Entity, url: &str, source: ClientError) -> Self {
        Self::Persistence {
            entity,
            url: url.to_string(),
            source,
        }
    }
}
