//! Sitemap XML parsing.
//!
//! Only `<loc>` elements are consumed: their text content, in document
//! order, is the list of pages to audit. The same extraction works for
//! sitemap index files, which list child sitemaps in `<loc>` as well.

use std::fmt;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Local name of the element holding a page URL.
const LOC_TAG: &[u8] = b"loc";

/// How severe a sitemap parse problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseLevel {
    Warning,
    Error,
    FatalError,
}

impl fmt::Display for ParseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::FatalError => "fatalError",
        };
        f.write_str(s)
    }
}

/// Errors from sitemap parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SitemapError {
    /// The document is not well-formed XML.
    #[error("Malformed sitemap ({level}): {message}")]
    Malformed { level: ParseLevel, message: String },
}

impl SitemapError {
    fn fatal(message: impl Into<String>) -> Self {
        Self::Malformed {
            level: ParseLevel::FatalError,
            message: message.into(),
        }
    }

    pub fn level(&self) -> ParseLevel {
        match self {
            Self::Malformed { level, .. } => *level,
        }
    }
}

/// Extract the text of every `<loc>` element, in document order.
///
/// Fails without a partial result if the document is not well-formed or
/// has no root element. Empty `<loc>` elements are skipped.
pub fn extract_locs(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut reader = Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut depth: usize = 0;
    let mut saw_root = false;
    // Text collected while inside a <loc>; `None` outside of one.
    let mut current: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            SitemapError::fatal(format!("{e} at byte {}", reader.error_position()))
        })?;

        match event {
            Event::Start(start) => {
                depth += 1;
                saw_root = true;
                if start.local_name().as_ref() == LOC_TAG {
                    current = Some(String::new());
                }
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                if end.local_name().as_ref() == LOC_TAG {
                    if let Some(text) = current.take() {
                        let url = text.trim();
                        if !url.is_empty() {
                            urls.push(url.to_string());
                        }
                    }
                }
            }
            Event::Empty(_) => {
                saw_root = true;
            }
            Event::Text(text) => {
                if let Some(buf) = current.as_mut() {
                    let unescaped = text.unescape().map_err(|e| {
                        SitemapError::fatal(format!("{e} at byte {}", reader.buffer_position()))
                    })?;
                    buf.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            // Declarations, comments, doctypes and processing instructions.
            _ => {}
        }
    }

    if !saw_root {
        return Err(SitemapError::Malformed {
            level: ParseLevel::Error,
            message: "document has no root element".to_string(),
        });
    }
    if depth != 0 {
        return Err(SitemapError::fatal(format!(
            "unexpected end of document with {depth} unclosed element(s)"
        )));
    }

    Ok(urls)
}
