//! Zip archive reading.
//!
//! - [`structures`]: fixed-layout records (EOCD, ZIP64 records, member metadata)
//! - [`parser`]: central directory parsing over any [`ReadAt`](crate::io::ReadAt) source
//! - [`handle`]: [`ZipArchive`], the scoped handle used for validation and extraction
//!
//! Supports STORED and DEFLATE members and ZIP64 archives. Encryption and
//! multi-disk archives are not supported.

mod handle;
mod parser;
mod structures;

pub use handle::ZipArchive;
pub use structures::{CompressionMethod, ZipEntry};

/// File extension marking a path as a zip archive.
pub fn is_zip_path(path: &std::path::Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn zip_extension_is_case_insensitive() {
        assert!(is_zip_path(Path::new("roms/sfiii3n.zip")));
        assert!(is_zip_path(Path::new("ROMS/SFIII3N.ZIP")));
        assert!(!is_zip_path(Path::new("roms/game.cue")));
        assert!(!is_zip_path(Path::new("roms/zip")));
    }
}
