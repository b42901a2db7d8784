use tracing::info;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::emulator::Target;
use crate::error::{Error, Result};
use crate::fetch::{FetchReport, Fetcher};
use crate::io::Transport;
use crate::resolver;

/// Resolve the requested ROM and fetch everything it needs.
///
/// Configuration problems and an empty plan are errors; per-item failures
/// end up in the returned report.
pub async fn run<T: Transport>(config: &Config, transport: T) -> Result<FetchReport> {
    let target = Target::resolve(&config.emulator, &config.rom)?;
    let catalog_file = target.catalog_file_name();
    let catalog = Catalog::load(&config.catalog_dir.join(&catalog_file))?;

    info!("Searching for required roms...");
    let resolution = resolver::resolve(&catalog, &target.item);
    if resolution.plan.is_empty() {
        return Err(Error::NoItemsFound {
            item: target.item,
            catalog: catalog_file,
        });
    }
    info!(
        "Found {} rom(s): {}",
        resolution.plan.len(),
        resolution.plan.iter().collect::<Vec<_>>().join(", ")
    );

    let roms_dir = config.destination_root.join(&target.roms_folder);
    let mut fetcher = Fetcher::new(transport).with_progress(config.show_progress);
    Ok(fetcher.process(resolution.plan, &catalog, &roms_dir).await)
}
