//! Process-level errors.
//!
//! Anything that surfaces here ends the run with exit code 1. Failures tied
//! to a single item or archive member are logged and recorded in the
//! [`FetchReport`](crate::fetch::FetchReport) instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown emulator [{0}]")]
    UnknownEmulator(String),

    #[error("unknown platform [{platform}] for emulator [{emulator}]")]
    UnknownPlatform { emulator: String, platform: String },

    #[error("missing file [{}] (missing FC2 JSON pack?)", .0.display())]
    MissingCatalog(PathBuf),

    #[error("failed to open file [{}]: {source}", path.display())]
    UnreadableCatalog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse [{}]: {source}", path.display())]
    InvalidCatalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no items found for [{item}] in [{catalog}]")]
    NoItemsFound { item: String, catalog: String },

    #[error("failed to set up HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
