//! Structural integrity check for zip files already on disk.

use std::path::Path;
use tracing::{debug, warn};

use crate::archive::{ZipArchive, is_zip_path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The archive opened and passed validation; it was left in place.
    Valid,
    /// Not a `.zip` path; nothing was checked.
    NotArchive,
    /// No file at the path.
    Missing,
    /// The archive was unreadable or invalid and has been deleted.
    Deleted { reason: String },
}

/// Check the zip at `path`, deleting it if it cannot be opened or fails validation.
///
/// The archive handle is closed before the file is removed.
pub async fn verify(path: &Path) -> std::io::Result<Verdict> {
    if !is_zip_path(path) {
        return Ok(Verdict::NotArchive);
    }
    if !tokio::fs::try_exists(path).await? {
        return Ok(Verdict::Missing);
    }

    let problem = match ZipArchive::open(path).await {
        Ok(archive) => archive.validate().await.err(),
        Err(e) => Some(e),
    };

    match problem {
        None => {
            debug!("{} passed the integrity check", path.display());
            Ok(Verdict::Valid)
        }
        Some(e) => {
            warn!("Error reading zip file [{}] (deleting): {e:#}", path.display());
            tokio::fs::remove_file(path).await?;
            Ok(Verdict::Deleted {
                reason: format!("{e:#}"),
            })
        }
    }
}
