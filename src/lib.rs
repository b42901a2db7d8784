//! # ferrum
//!
//! Fightcade ROM manager. Given an emulator and a ROM identifier, ferrum
//! reads the emulator's JSON catalog, resolves the ROM together with
//! everything it requires, and downloads whatever is not already on disk.
//!
//! ## Pipeline
//!
//! - [`catalog`]: the read-only item catalog
//! - [`resolver`]: builds an ordered, duplicate-free [`FetchPlan`](resolver::FetchPlan)
//! - [`fetch`]: drains the plan, downloading over a [`Transport`](io::Transport)
//! - [`integrity`]: deletes zip files that fail structural validation
//! - [`extract`]: pulls named members out of downloaded archives
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ferrum::{Catalog, Fetcher, HttpTransport, resolve};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Catalog::load("fbneo_roms.json".as_ref())?;
//!     let resolution = resolve(&catalog, "sfiii3nr1");
//!
//!     let mut fetcher = Fetcher::new(HttpTransport::new(Duration::from_secs(30))?);
//!     let report = fetcher
//!         .process(resolution.plan, &catalog, "fbneo/ROMs".as_ref())
//!         .await;
//!     println!("{} downloaded, {} failed", report.downloaded.len(), report.failed.len());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod emulator;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod integrity;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod resolver;

pub use catalog::{Catalog, ExtractRule, ItemRecord};
pub use cli::Cli;
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{FetchReport, Fetcher};
pub use io::{HttpTransport, Transport};
pub use resolver::{FetchPlan, Resolution, resolve};
