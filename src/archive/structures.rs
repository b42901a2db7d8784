use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use std::path::{Component, Path};

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unsupported(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            other => CompressionMethod::Unsupported(other),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes plus a trailing comment
#[derive(Debug)]
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        // Skip the two disk number fields; multi-disk archives are not supported.
        let mut cursor = Cursor::new(&data[8..]);

        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Any saturated field means the real values live in the ZIP64 record.
    pub fn needs_zip64(&self) -> bool {
        self.disk_entries == u16::MAX
            || self.total_entries == u16::MAX
            || self.cd_size == u32::MAX
            || self.cd_offset == u32::MAX
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64Locator {
    pub eocd64_offset: u64,
}

impl Zip64Locator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 locator");
        }

        let mut cursor = Cursor::new(&data[8..]);
        Ok(Self {
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EndOfCentralDirectory {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 End of Central Directory");
        }

        // total entries (this disk) sits at 24, total entries at 32
        let mut cursor = Cursor::new(&data[32..]);
        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag bit 0: member is encrypted.
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// One member of the archive, as recorded in the central directory.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub compression: CompressionMethod,
    pub flags: u16,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub header_offset: u64,
}

impl ZipEntry {
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// True when the member name stays inside the extraction directory:
    /// relative, no `..`, no drive or root prefix, no NUL bytes.
    pub fn has_enclosed_name(&self) -> bool {
        if self.name.is_empty() || self.name.contains('\0') {
            return false;
        }
        let normalized = self.name.replace('\\', "/");
        Path::new(&normalized)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ZipEntry {
        ZipEntry {
            name: name.to_string(),
            compression: CompressionMethod::Stored,
            flags: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            header_offset: 0,
        }
    }

    #[test]
    fn enclosed_names() {
        assert!(entry("roms/sfiii3n.zip").has_enclosed_name());
        assert!(entry("./bios.bin").has_enclosed_name());
        assert!(!entry("../escape.bin").has_enclosed_name());
        assert!(!entry("a/../../escape.bin").has_enclosed_name());
        assert!(!entry("/etc/passwd").has_enclosed_name());
        assert!(!entry("..\\windows\\evil.dll").has_enclosed_name());
        assert!(!entry("").has_enclosed_name());
    }

    #[test]
    fn eocd_zip64_detection() {
        let mut raw = Vec::from(EndOfCentralDirectory::SIGNATURE);
        raw.extend_from_slice(&[0u8; 4]);
        raw.extend_from_slice(&2u16.to_le_bytes());
        raw.extend_from_slice(&2u16.to_le_bytes());
        raw.extend_from_slice(&92u32.to_le_bytes());
        raw.extend_from_slice(&u32::MAX.to_le_bytes());
        raw.extend_from_slice(&0u16.to_le_bytes());

        let eocd = EndOfCentralDirectory::parse(&raw).unwrap();
        assert_eq!(eocd.total_entries, 2);
        assert_eq!(eocd.cd_size, 92);
        assert!(eocd.needs_zip64());

        assert!(EndOfCentralDirectory::parse(&raw[..10]).is_err());
    }

    #[test]
    fn compression_method_codes() {
        assert_eq!(CompressionMethod::from(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from(14), CompressionMethod::Unsupported(14));
    }
}
