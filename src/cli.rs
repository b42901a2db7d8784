use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "frm")]
#[command(version)]
#[command(about = "Ferrum - Fightcade ROM manager", long_about = None)]
#[command(after_help = "Examples:\n  \
  frm fbneo sfiii3nr1            fetch sfiii3nr1 and everything it requires\n  \
  frm fbneo md_sonic2            fetch a Mega Drive ROM for FBNeo\n  \
  frm -d D:\\Fightcade\\emulator flycast mvsc2")]
pub struct Cli {
    /// Emulator identifier (fbneo, nulldc, fc1, flycast, duckstation, snes9x)
    #[arg(value_name = "EMULATOR")]
    pub emulator: String,

    /// ROM identifier, or PLATFORM_ROM for emulators with platforms
    #[arg(value_name = "ROM")]
    pub rom: String,

    /// Emulator root that ROM folders are created under [default: executable's directory]
    #[arg(short = 'd', long = "root", value_name = "DIR", env = "FERRUM_ROOT")]
    pub root: Option<PathBuf>,

    /// Directory holding the <emulator>_roms.json catalogs
    #[arg(short = 'c', long = "catalog-dir", value_name = "DIR", env = "FERRUM_CATALOG_DIR", default_value = ".")]
    pub catalog_dir: PathBuf,

    /// Seconds to wait on a stalled connection before giving up
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Also write JSON logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Quiet mode (-qq => errors only)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Wait for a key press before exiting
    #[arg(long)]
    pub pause: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
