//! Emulator metadata and request targeting.
//!
//! Maps an emulator name to the folder its ROMs live in (optionally one
//! folder per platform) and decides which catalog file a request reads.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Static description of one supported emulator.
#[derive(Debug)]
pub struct EmulatorInfo {
    pub name: &'static str,
    /// Folder relative to the destination root.
    pub roms_folder: &'static str,
    /// `(platform id, folder)` pairs; empty when the emulator has no platforms.
    pub platforms: &'static [(&'static str, &'static str)],
    /// Item id prefix used by Fightcade for this emulator.
    pub prefix: Option<&'static str>,
    /// Catalog files list items without `prefix`, so strip it from requests.
    pub strip_prefix: bool,
}

impl EmulatorInfo {
    pub fn platform_folder(&self, platform: &str) -> Option<&'static str> {
        self.platforms
            .iter()
            .find(|(id, _)| *id == platform)
            .map(|(_, folder)| *folder)
    }
}

pub const EMULATORS: &[EmulatorInfo] = &[
    EmulatorInfo {
        name: "fbneo",
        roms_folder: "fbneo/ROMs",
        platforms: &[
            ("md", "fbneo/ROMs/megadrive"),
            ("gg", "fbneo/ROMs/gamegear"),
            ("cv", "fbneo/ROMs/coleco"),
            ("msx", "fbneo/ROMs/msx"),
            ("sms", "fbneo/ROMs/sms"),
            ("nes", "fbneo/ROMs/nes"),
            ("pce", "fbneo/ROMs/pce"),
            ("sg1k", "fbneo/ROMs/sg1000"),
            ("tg", "fbneo/ROMs/tg16"),
        ],
        prefix: None,
        strip_prefix: false,
    },
    EmulatorInfo {
        name: "nulldc",
        roms_folder: "nulldc/nulldc-1-0-4-en-win",
        platforms: &[],
        prefix: None,
        strip_prefix: false,
    },
    EmulatorInfo {
        name: "fc1",
        roms_folder: "ggpofba/ROMs",
        platforms: &[],
        prefix: Some("fc1_"),
        strip_prefix: true,
    },
    EmulatorInfo {
        name: "flycast",
        roms_folder: "flycast/ROMs",
        platforms: &[],
        prefix: None,
        strip_prefix: false,
    },
    EmulatorInfo {
        name: "duckstation",
        roms_folder: "duckstation/ROMs",
        platforms: &[],
        prefix: None,
        strip_prefix: false,
    },
    EmulatorInfo {
        name: "snes9x",
        roms_folder: "snes9x/ROMs",
        platforms: &[],
        prefix: None,
        strip_prefix: false,
    },
];

pub fn lookup(name: &str) -> Option<&'static EmulatorInfo> {
    EMULATORS.iter().find(|info| info.name == name)
}

/// A request resolved against the emulator table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub emulator: String,
    pub platform: Option<String>,
    /// Item id as it appears in the catalog.
    pub item: String,
    /// Folder relative to the destination root that receives the files.
    pub roms_folder: PathBuf,
}

impl Target {
    /// Resolve `requested` (`item` or `platform_item`) for `emulator`.
    pub fn resolve(emulator: &str, requested: &str) -> Result<Self> {
        let info = lookup(emulator).ok_or_else(|| Error::UnknownEmulator(emulator.to_string()))?;

        let mut platform = None;
        let mut item = requested;
        let mut roms_folder = info.roms_folder;

        if !info.platforms.is_empty() {
            if let Some((platform_id, rest)) = requested.split_once('_') {
                roms_folder = info.platform_folder(platform_id).ok_or_else(|| {
                    Error::UnknownPlatform {
                        emulator: emulator.to_string(),
                        platform: platform_id.to_string(),
                    }
                })?;
                platform = Some(platform_id.to_string());
                item = rest;
            }
        }

        if info.strip_prefix {
            if let Some(prefix) = info.prefix {
                item = item.strip_prefix(prefix).unwrap_or(item);
            }
        }

        Ok(Self {
            emulator: info.name.to_string(),
            platform,
            item: item.to_string(),
            roms_folder: PathBuf::from(roms_folder),
        })
    }

    /// `{emulator}[_{platform}]_roms.json`
    pub fn catalog_file_name(&self) -> String {
        match &self.platform {
            Some(platform) => format!("{}_{}_roms.json", self.emulator, platform),
            None => format!("{}_roms.json", self.emulator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn plain_emulator() {
        let t = Target::resolve("flycast", "mvsc2").unwrap();
        assert_eq!(t.item, "mvsc2");
        assert_eq!(t.platform, None);
        assert_eq!(t.roms_folder, Path::new("flycast/ROMs"));
        assert_eq!(t.catalog_file_name(), "flycast_roms.json");
    }

    #[test]
    fn underscores_are_kept_without_platforms() {
        let t = Target::resolve("snes9x", "super_mario_world").unwrap();
        assert_eq!(t.item, "super_mario_world");
        assert_eq!(t.catalog_file_name(), "snes9x_roms.json");
    }

    #[test]
    fn platform_split_on_first_underscore() {
        let t = Target::resolve("fbneo", "md_sonic_2").unwrap();
        assert_eq!(t.platform.as_deref(), Some("md"));
        assert_eq!(t.item, "sonic_2");
        assert_eq!(t.roms_folder, Path::new("fbneo/ROMs/megadrive"));
        assert_eq!(t.catalog_file_name(), "fbneo_md_roms.json");
    }

    #[test]
    fn platform_emulator_without_platform_part() {
        let t = Target::resolve("fbneo", "sfiii3nr1").unwrap();
        assert_eq!(t.platform, None);
        assert_eq!(t.roms_folder, Path::new("fbneo/ROMs"));
        assert_eq!(t.catalog_file_name(), "fbneo_roms.json");
    }

    #[test]
    fn unknown_platform_and_emulator() {
        assert!(matches!(
            Target::resolve("fbneo", "gba_pokemon"),
            Err(Error::UnknownPlatform { platform, .. }) if platform == "gba"
        ));
        assert!(matches!(
            Target::resolve("mame", "sf2"),
            Err(Error::UnknownEmulator(name)) if name == "mame"
        ));
    }

    #[test]
    fn prefix_is_stripped_when_flagged() {
        let t = Target::resolve("fc1", "fc1_kof98").unwrap();
        assert_eq!(t.item, "kof98");
        assert_eq!(t.roms_folder, Path::new("ggpofba/ROMs"));

        let t = Target::resolve("fc1", "kof98").unwrap();
        assert_eq!(t.item, "kof98");
    }
}
