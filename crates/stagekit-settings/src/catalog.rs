//! Read-only tag catalog
//!
//! The catalog is owned by the calibration front end; the stage only reads
//! it to resolve a tag name into a move target. Document shape:
//!
//! ```json
//! { "tags": [ { "tag": 10, "x": 150.0, "y": 40.0, "z": -30.0 } ] }
//! ```
//!
//! Tag identifiers may be numbers or strings and are matched as text.

use crate::error::SettingsResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TagId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagId::Number(n) => write!(f, "{}", n),
            TagId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    tag: TagId,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    tags: Vec<RawEntry>,
}

/// A named calibration target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagLocation {
    /// Tag identifier as text
    pub tag: String,
    /// X coordinate in millimeters
    pub x: f64,
    /// Y coordinate in millimeters
    pub y: f64,
    /// Z coordinate in millimeters, negative below home
    pub z: f64,
}

impl TagLocation {
    /// Location as the triple accepted by `move_to_tag`
    pub fn location(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

/// Tags in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagCatalog {
    entries: Vec<TagLocation>,
}

impl TagCatalog {
    /// Read a catalog document
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        debug!(path = %path.display(), tags = catalog.len(), "Loaded tag catalog");
        Ok(catalog)
    }

    /// Parse a catalog document. Entries with non-finite coordinates are
    /// skipped; the first entry wins when a tag repeats.
    pub fn from_json(content: &str) -> SettingsResult<Self> {
        let raw: RawCatalog = serde_json::from_str(content)?;
        let mut entries: Vec<TagLocation> = Vec::with_capacity(raw.tags.len());
        for entry in raw.tags {
            let tag = entry.tag.to_string();
            if ![entry.x, entry.y, entry.z].iter().all(|v| v.is_finite()) {
                warn!(tag = %tag, "Skipping tag with invalid coordinates");
                continue;
            }
            if entries.iter().any(|e| e.tag == tag) {
                warn!(tag = %tag, "Duplicate tag ignored");
                continue;
            }
            entries.push(TagLocation {
                tag,
                x: entry.x,
                y: entry.y,
                z: entry.z,
            });
        }
        Ok(Self { entries })
    }

    /// Location of `tag`
    pub fn get(&self, tag: &str) -> Option<(f64, f64, f64)> {
        let tag = tag.trim();
        self.entries
            .iter()
            .find(|e| e.tag == tag)
            .map(TagLocation::location)
    }

    /// Tag identifiers in file order
    pub fn tags(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tag.as_str()).collect()
    }

    /// All entries
    pub fn entries(&self) -> &[TagLocation] {
        &self.entries
    }

    /// Number of usable tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no tag was loaded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
