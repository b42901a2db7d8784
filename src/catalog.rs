//! The ROM catalog: a read-only JSON object keyed by item identifier.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// One archive member to pull out, and where to put it relative to the roms folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractRule {
    pub src: String,
    pub dst: String,
}

/// Catalog entry for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawItemRecord")]
pub struct ItemRecord {
    pub download: Option<String>,
    pub copy_to: Option<String>,
    /// `None` for direct copies; never `Some` of an empty list.
    pub extract_to: Option<Vec<ExtractRule>>,
    /// Dependencies from both `require` and `required`, in catalog order.
    pub requires: Vec<String>,
}

impl ItemRecord {
    pub fn extracts(&self) -> bool {
        self.extract_to.is_some()
    }
}

/// On-disk shape. Older packs spell the dependency list `required`,
/// newer ones `require`, and some entries carry both.
#[derive(Deserialize)]
struct RawItemRecord {
    download: Option<String>,
    copy_to: Option<String>,
    #[serde(default)]
    extract_to: Vec<ExtractRule>,
    #[serde(default)]
    require: Vec<String>,
    #[serde(default)]
    required: Vec<String>,
}

impl From<RawItemRecord> for ItemRecord {
    fn from(raw: RawItemRecord) -> Self {
        let mut requires: Vec<String> = Vec::with_capacity(raw.require.len() + raw.required.len());
        for id in raw.require.into_iter().chain(raw.required) {
            if !requires.contains(&id) {
                requires.push(id);
            }
        }

        Self {
            download: raw.download,
            copy_to: raw.copy_to,
            extract_to: (!raw.extract_to.is_empty()).then_some(raw.extract_to),
            requires,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    items: HashMap<String, ItemRecord>,
}

impl Catalog {
    /// Load a catalog file. Missing, unreadable and malformed files are
    /// distinct configuration errors.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingCatalog(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| Error::UnreadableCatalog {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| Error::InvalidCatalog {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn get(&self, id: &str) -> Option<&ItemRecord> {
        self.items.get(id)
    }

    pub fn get_key_value(&self, id: &str) -> Option<(&str, &ItemRecord)> {
        self.items.get_key_value(id).map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<(String, ItemRecord)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, ItemRecord)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
