use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

/// Settings for one run, with defaults resolved.
#[derive(Debug, Clone)]
pub struct Config {
    pub emulator: String,
    pub rom: String,
    /// Root that `roms_folder` paths are relative to.
    pub destination_root: PathBuf,
    pub catalog_dir: PathBuf,
    pub timeout: Duration,
    pub show_progress: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> std::io::Result<Self> {
        let destination_root = match &cli.root {
            Some(root) => root.clone(),
            None => executable_dir()?,
        };

        Ok(Self {
            emulator: cli.emulator.clone(),
            rom: cli.rom.clone(),
            destination_root,
            catalog_dir: cli.catalog_dir.clone(),
            timeout: Duration::from_secs(cli.timeout),
            show_progress: !cli.is_quiet(),
        })
    }
}

/// Directory containing the running executable; Fightcade keeps `frm`
/// next to the emulator folders.
fn executable_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".")))
}
