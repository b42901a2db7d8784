use flate2::CrcWriter;
use flate2::write::DeflateDecoder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::io::{LocalFileReader, ReadAt};
use anyhow::{Context, Result, bail};

use super::parser;
use super::structures::{CompressionMethod, ZipEntry};

/// Bytes pulled from the source per read while extracting.
const CHUNK_SIZE: usize = 64 * 1024;

/// An open archive: the data source plus its parsed central directory.
///
/// Dropping the handle releases both, so every early return closes the file.
pub struct ZipArchive<R: ReadAt = LocalFileReader> {
    reader: R,
    entries: Vec<ZipEntry>,
}

impl ZipArchive<LocalFileReader> {
    /// Open a zip file on disk and read its central directory.
    pub async fn open(path: &Path) -> Result<Self> {
        let reader = LocalFileReader::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_reader(reader).await
    }
}

impl<R: ReadAt> ZipArchive<R> {
    pub async fn from_reader(reader: R) -> Result<Self> {
        let entries = parser::read_central_directory(&reader).await?;
        Ok(Self { reader, entries })
    }

    /// Exact-path lookup of a member.
    pub fn by_name(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Structural validation of every member.
    ///
    /// Names must stay inside the extraction root, each local header must be
    /// present with its signature, and member data must fit inside the archive.
    pub async fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            if !entry.has_enclosed_name() {
                bail!("Member name {:?} escapes the archive root", entry.name);
            }
            let start = parser::data_offset(&self.reader, entry).await?;
            match start.checked_add(entry.compressed_size) {
                Some(end) if end <= self.reader.size() => {}
                _ => bail!(
                    "Data of {} runs past the end of the archive ({} bytes at offset {})",
                    entry.name,
                    entry.compressed_size,
                    start
                ),
            }
        }
        Ok(())
    }

    /// Decompress one member into `dest`, verifying its CRC-32.
    ///
    /// Returns the number of bytes written. On failure the partially written
    /// file is removed.
    pub async fn extract_entry(&self, entry: &ZipEntry, dest: &Path) -> Result<u64> {
        if entry.is_directory() {
            bail!("{} is a directory", entry.name);
        }
        if entry.is_encrypted() {
            bail!("{} is encrypted", entry.name);
        }

        let file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("failed to create {}", dest.display()))?
            .into_std()
            .await;
        let sink = CrcWriter::new(BufWriter::new(file));

        match self.decode_into(entry, sink).await {
            Ok(()) => Ok(entry.uncompressed_size),
            Err(e) => {
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }

    async fn decode_into(&self, entry: &ZipEntry, sink: CrcWriter<BufWriter<File>>) -> Result<()> {
        let sink = match entry.compression {
            CompressionMethod::Stored => {
                if entry.compressed_size != entry.uncompressed_size {
                    bail!(
                        "Stored member {} has mismatched sizes ({} vs {})",
                        entry.name,
                        entry.compressed_size,
                        entry.uncompressed_size
                    );
                }
                self.copy_member(entry, sink).await?
            }
            CompressionMethod::Deflate => {
                let decoder = self.copy_member(entry, DeflateDecoder::new(sink)).await?;
                tokio::task::spawn_blocking(move || decoder.finish()).await??
            }
            CompressionMethod::Unsupported(method) => {
                bail!("Unsupported compression method {} for {}", method, entry.name)
            }
        };

        let crc = tokio::task::spawn_blocking(move || -> std::io::Result<u32> {
            let mut sink = sink;
            sink.flush()?;
            Ok(sink.crc().sum())
        })
        .await??;
        if crc != entry.crc32 {
            bail!(
                "CRC mismatch for {} (expected {:08x}, got {:08x})",
                entry.name,
                entry.crc32,
                crc
            );
        }
        Ok(())
    }

    /// Stream a member's raw (possibly compressed) bytes into `writer`.
    ///
    /// Reads stay on the runtime; each write (and any inflation it triggers)
    /// runs on the blocking pool.
    async fn copy_member<W: Write + Send + 'static>(&self, entry: &ZipEntry, mut writer: W) -> Result<W> {
        let mut offset = parser::data_offset(&self.reader, entry).await?;
        let mut remaining = entry.compressed_size;
        let mut buf = vec![0u8; CHUNK_SIZE.min(remaining as usize)];

        while remaining > 0 {
            let len = (remaining as usize).min(buf.len());
            self.reader.read_exact_at(offset, &mut buf[..len]).await?;
            (writer, buf) = tokio::task::spawn_blocking(move || -> std::io::Result<(W, Vec<u8>)> {
                writer.write_all(&buf[..len])?;
                Ok((writer, buf))
            })
            .await??;
            offset += len as u64;
            remaining -= len as u64;
        }
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::{Member, write_zip};

    #[tokio::test]
    async fn lists_and_extracts_stored_and_deflated_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.zip");
        let big = b"fightcade ".repeat(20_000);
        write_zip(
            &path,
            &[
                Member::stored("bios/neogeo.bin", b"NEOGEO"),
                Member::deflated("roms/kof98.bin", &big),
            ],
        );

        let archive = ZipArchive::open(&path).await.unwrap();
        assert_eq!(archive.entries.len(), 2);
        archive.validate().await.unwrap();

        let stored = archive.by_name("bios/neogeo.bin").unwrap();
        let out = dir.path().join("neogeo.bin");
        assert_eq!(archive.extract_entry(stored, &out).await.unwrap(), 6);
        assert_eq!(std::fs::read(&out).unwrap(), b"NEOGEO");

        let deflated = archive.by_name("roms/kof98.bin").unwrap();
        assert_eq!(deflated.compression, CompressionMethod::Deflate);
        let out = dir.path().join("kof98.bin");
        archive.extract_entry(deflated, &out).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), big);
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.zip");
        write_zip(&path, &[Member::stored("roms/a.bin", b"a")]);

        let archive = ZipArchive::open(&path).await.unwrap();
        assert!(archive.by_name("a.bin").is_none());
        assert!(archive.by_name("roms/A.bin").is_none());
        assert!(archive.by_name("roms/a.bin").is_some());
    }

    #[tokio::test]
    async fn truncated_archive_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.zip");
        write_zip(&path, &[Member::stored("roms/a.bin", &[7u8; 4096])]);

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(ZipArchive::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn corrupted_member_fails_crc_and_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.zip");
        write_zip(&path, &[Member::stored("roms/a.bin", b"ABCDEFGH")]);

        // Flip a payload byte; the directory stays intact.
        let mut bytes = std::fs::read(&path).unwrap();
        let pos = bytes.windows(8).position(|w| w == b"ABCDEFGH").unwrap();
        bytes[pos] = b'Z';
        std::fs::write(&path, &bytes).unwrap();

        let archive = ZipArchive::open(&path).await.unwrap();
        let entry = archive.by_name("roms/a.bin").unwrap();
        let out = dir.path().join("a.bin");
        let err = archive.extract_entry(entry, &out).await.unwrap_err();
        assert!(err.to_string().contains("CRC mismatch"));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.zip");
        std::fs::write(&path, b"this is plain text, definitely not an archive").unwrap();
        assert!(ZipArchive::open(&path).await.is_err());
    }
}
