//! Selective extraction of named archive members.

use std::path::{Component, Path, PathBuf};
use tracing::{error, info};

use crate::archive::ZipArchive;
use crate::io::ReadAt;

/// A member to extract and its destination on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTarget {
    pub member: String,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Extracted { bytes: u64 },
    MemberNotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleReport {
    pub member: String,
    pub destination: PathBuf,
    pub outcome: RuleOutcome,
}

impl RuleReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RuleOutcome::Extracted { .. })
    }
}

/// Extract each target in order. A failing target is reported and the
/// remaining ones are still attempted.
pub async fn extract<R: ReadAt>(archive: &ZipArchive<R>, targets: &[ExtractionTarget]) -> Vec<RuleReport> {
    let mut reports = Vec::with_capacity(targets.len());

    for target in targets {
        let outcome = match archive.by_name(&target.member) {
            None => {
                error!("File {} not found in archive", target.member);
                error!("The extraction list in the catalog is likely malformed; this is not a fault of the downloader.");
                RuleOutcome::MemberNotFound
            }
            Some(entry) => {
                info!("Extracting {} to {}...", target.member, target.destination.display());
                let result = async {
                    let destination = prepare_destination(&target.destination).await?;
                    archive.extract_entry(entry, &destination).await
                }
                .await;
                match result {
                    Ok(bytes) => RuleOutcome::Extracted { bytes },
                    Err(e) => {
                        error!("File {} failed to extract: {e:#}", target.member);
                        RuleOutcome::Failed(format!("{e:#}"))
                    }
                }
            }
        };

        reports.push(RuleReport {
            member: target.member.clone(),
            destination: target.destination.clone(),
            outcome,
        });
    }

    reports
}

/// Create the parent directories of `destination` and return its absolute,
/// canonical form.
async fn prepare_destination(destination: &Path) -> anyhow::Result<PathBuf> {
    let Some(file_name) = destination.file_name() else {
        anyhow::bail!("{} does not name a file", destination.display());
    };
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tokio::fs::create_dir_all(parent).await?;
    Ok(tokio::fs::canonicalize(parent).await?.join(file_name))
}

/// Join a catalog-provided relative path onto `base`, refusing anything
/// that could land outside it.
pub fn contained_join(base: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut components = relative.components().peekable();
    components.peek()?;
    components
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| base.join(relative))
}
