//! The fetch processor: drains a plan, downloading and extracting what is missing.

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::archive::ZipArchive;
use crate::catalog::{Catalog, ExtractRule, ItemRecord};
use crate::extract::{self, ExtractionTarget, RuleReport, contained_join};
use crate::integrity;
use crate::io::{Download, Transport};
use crate::progress::DownloadProgress;
use crate::resolver::FetchPlan;

/// What happened to each planned item.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl FetchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
enum ItemOutcome {
    Downloaded,
    Skipped,
}

/// Where an item's download lands and which rules still need extracting.
#[derive(Debug)]
struct ItemJob<'a> {
    url: &'a str,
    label: String,
    output: PathBuf,
    pending: Vec<ExtractionTarget>,
    rejected: usize,
}

pub struct Fetcher<T: Transport> {
    transport: T,
    show_progress: bool,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Process every planned item in order. Per-item failures are logged and
    /// recorded; they never stop the remaining items.
    pub async fn process(&mut self, plan: FetchPlan, catalog: &Catalog, roms_dir: &Path) -> FetchReport {
        let mut report = FetchReport::default();

        for id in plan {
            let Some(record) = catalog.get(&id) else {
                // Plans only hold catalog keys; a foreign plan is still handled.
                warn!("Rom [{id}] vanished from the catalog");
                report.failed.push((id, "not in catalog".to_string()));
                continue;
            };

            match self.process_item(&id, record, roms_dir).await {
                Ok(ItemOutcome::Downloaded) => report.downloaded.push(id),
                Ok(ItemOutcome::Skipped) => report.skipped.push(id),
                Err(e) => {
                    error!("Rom [{id}] failed: {e:#}");
                    report.failed.push((id, format!("{e:#}")));
                }
            }
        }

        report
    }

    #[tracing::instrument(name = "item", skip_all, fields(id = %id))]
    async fn process_item(&mut self, id: &str, record: &ItemRecord, roms_dir: &Path) -> Result<ItemOutcome> {
        let Some(url) = record.download.as_deref() else {
            debug!("Rom [{id}] has no download source; nothing to fetch");
            return Ok(ItemOutcome::Skipped);
        };

        let (file_name, label) = match record.copy_to.as_deref() {
            Some(copy_to) => {
                let label = derive_filename(url)
                    .ok()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| copy_to.to_string());
                (copy_to.to_string(), label)
            }
            None => {
                let derived = derive_filename(url)?;
                if derived.is_empty() {
                    bail!("cannot derive a file name from {url}");
                }
                (derived.clone(), derived)
            }
        };
        let output = contained_join(roms_dir, &file_name)
            .with_context(|| format!("file name {file_name:?} leaves the roms folder"))?;

        let mut job = ItemJob {
            url,
            label,
            output,
            pending: Vec::new(),
            rejected: 0,
        };

        match &record.extract_to {
            Some(rules) => {
                (job.pending, job.rejected) = pending_targets(rules, roms_dir).await?;
                if job.pending.is_empty() {
                    if job.rejected > 0 {
                        bail!("{} extraction destinations leave the roms folder", job.rejected);
                    }
                    info!("Files already exist.");
                    return Ok(ItemOutcome::Skipped);
                }
            }
            None => {
                integrity::verify(&job.output).await?;
                if tokio::fs::try_exists(&job.output).await? {
                    info!("File {} already exists.", job.output.display());
                    return Ok(ItemOutcome::Skipped);
                }
            }
        }

        if let Some(parent) = job.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let started = Instant::now();
        let bytes = self.download(&job).await?;
        info!(
            "* File {} downloaded in {:.2}s ({bytes} bytes).",
            job.label,
            started.elapsed().as_secs_f64()
        );

        if record.extracts() {
            let reports = self.unpack(&job).await?;
            let failed = reports.iter().filter(|r| !r.succeeded()).count() + job.rejected;
            if failed > 0 {
                bail!(
                    "{failed} of {} files could not be extracted",
                    reports.len() + job.rejected
                );
            }
        }

        Ok(ItemOutcome::Downloaded)
    }

    /// HEAD pre-check, then stream the body into a `.part` file that is
    /// renamed into place once complete.
    async fn download(&mut self, job: &ItemJob<'_>) -> Result<u64> {
        let status = self.transport.head(job.url).await?;
        if status != 200 {
            bail!("File failed to download (HEAD returned status {status})");
        }

        let Download { total, mut body } = self.transport.get(job.url).await?;
        let partial = partial_path(&job.output);
        let progress = DownloadProgress::start(&job.label, total, self.show_progress);

        let streamed = async {
            let mut file = tokio::fs::File::create(&partial).await?;
            let mut written = 0u64;
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
                progress.set_position(written);
            }
            file.flush().await?;
            Ok::<u64, anyhow::Error>(written)
        }
        .await;

        let result = match streamed {
            Ok(written) => tokio::fs::rename(&partial, &job.output)
                .await
                .map(|_| written)
                .map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(written) => {
                progress.finish();
                Ok(written)
            }
            Err(e) => {
                progress.abandon();
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e.context(format!("download of {} failed", job.label)))
            }
        }
    }

    /// Extract the pending rules from the freshly downloaded archive, then
    /// delete it. If the archive does not open it is left on disk.
    async fn unpack(&self, job: &ItemJob<'_>) -> Result<Vec<RuleReport>> {
        let reports = {
            let archive = ZipArchive::open(&job.output)
                .await
                .with_context(|| format!("failed to open archive {}", job.output.display()))?;
            extract::extract(&archive, &job.pending).await
        };

        tokio::fs::remove_file(&job.output)
            .await
            .with_context(|| format!("failed to delete {}", job.output.display()))?;
        Ok(reports)
    }
}

/// Rules whose destination does not exist yet, plus the number of rules
/// rejected for pointing outside the roms folder.
async fn pending_targets(rules: &[ExtractRule], roms_dir: &Path) -> Result<(Vec<ExtractionTarget>, usize)> {
    let mut pending = Vec::new();
    let mut rejected = 0;
    for rule in rules {
        let Some(destination) = contained_join(roms_dir, &rule.dst) else {
            warn!("Refusing to extract {} to {:?}: destination leaves the roms folder", rule.src, rule.dst);
            rejected += 1;
            continue;
        };
        if !tokio::fs::try_exists(&destination).await? {
            pending.push(ExtractionTarget {
                member: rule.src.clone(),
                destination,
            });
        }
    }
    Ok((pending, rejected))
}

/// File name for a download URL: percent-decode, then take what follows the
/// last `=`, or failing that the last `/`.
pub fn derive_filename(url: &str) -> Result<String> {
    let decoded = urlencoding::decode(url).with_context(|| format!("invalid URL encoding in {url}"))?;
    let start = decoded
        .rfind('=')
        .or_else(|| decoded.rfind('/'))
        .map_or(0, |i| i + 1);
    Ok(decoded[start..].to_string())
}

/// `<output>.part`, the staging name used while a download is in flight.
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_last_path_segment() {
        assert_eq!(
            derive_filename("https://example.org/roms/fbneo/kof98.zip").unwrap(),
            "kof98.zip"
        );
    }

    #[test]
    fn filename_from_query_value_wins_over_path() {
        assert_eq!(
            derive_filename("https://example.org/download.php?path=roms/sfiii3nr1.zip").unwrap(),
            "sfiii3nr1.zip"
        );
    }

    #[test]
    fn filename_is_decoded_first() {
        assert_eq!(
            derive_filename("https://example.org/files/Street%20Fighter%20III.zip").unwrap(),
            "Street Fighter III.zip"
        );
        // An encoded slash becomes a separator after decoding.
        assert_eq!(
            derive_filename("https://example.org/get?f=roms%2Fmd%2Fsonic.zip").unwrap(),
            "roms/md/sonic.zip"
        );
        assert_eq!(
            derive_filename("https://example.org/get/roms%2Fmd%2Fsonic.zip").unwrap(),
            "sonic.zip"
        );
    }

    #[test]
    fn filename_without_separators() {
        assert_eq!(derive_filename("kof98.zip").unwrap(), "kof98.zip");
        assert_eq!(derive_filename("https://example.org/").unwrap(), "");
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/frm/fbneo/ROMs/kof98.zip")),
            Path::new("/frm/fbneo/ROMs/kof98.zip.part")
        );
    }
}
