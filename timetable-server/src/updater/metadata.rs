//! The feed publisher's `metadata.xml`, which states how long the
//! timetable is valid.

use std::path::Path;

use chrono::NaiveDate;
use roxmltree::Document;

use super::error::UpdateError;

/// Name of the metadata file inside the data directory.
pub const METADATA_FILE: &str = "metadata.xml";

/// Date format used by the publisher, e.g. `31.12.2024`.
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Validity information read from `metadata.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMetadata {
    pub valid_from: Option<String>,
    pub valid_to: String,
    pub generated: Option<String>,
}

impl FeedMetadata {
    /// Parse metadata XML. Only direct children of the root element are read.
    pub fn parse(xml: &str) -> Result<Self, UpdateError> {
        let doc = Document::parse(xml).map_err(|e| UpdateError::Metadata {
            message: e.to_string(),
        })?;
        let root = doc.root_element();

        let child_text = |tag: &str| {
            root.children()
                .find(|n| n.has_tag_name(tag))
                .and_then(|n| n.text())
                .map(|t| t.trim().to_string())
        };

        let valid_to = child_text("ValidTo").ok_or_else(|| UpdateError::Metadata {
            message: "no ValidTo element".to_string(),
        })?;

        Ok(Self {
            valid_from: child_text("ValidFrom"),
            valid_to,
            generated: child_text("Generated"),
        })
    }

    /// Read and parse the metadata file at `path`.
    pub fn read(path: &Path) -> Result<Self, UpdateError> {
        let xml = std::fs::read_to_string(path).map_err(|source| UpdateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    /// Last day the feed is valid.
    pub fn valid_to_date(&self) -> Result<NaiveDate, UpdateError> {
        NaiveDate::parse_from_str(self.valid_to.trim(), DATE_FORMAT).map_err(|e| {
            UpdateError::Metadata {
                message: format!("bad ValidTo {:?}: {e}", self.valid_to),
            }
        })
    }

    /// Whole days from `today` until the feed expires; negative once expired.
    pub fn days_left(&self, today: NaiveDate) -> Result<i64, UpdateError> {
        Ok((self.valid_to_date()? - today).num_days())
    }
}
