//! Central directory parsing.
//!
//! Zip archives are read from the end: find the End of Central Directory
//! record, follow it (through the ZIP64 record when fields are saturated)
//! to the central directory, then decode one header per member. Member data
//! is located later through its local file header.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
const MAX_COMMENT_SIZE: u64 = 65535;

/// Location and shape of the central directory.
#[derive(Debug, PartialEq, Eq)]
struct DirectoryLocation {
    offset: u64,
    size: u64,
    entries: u64,
}

/// Find the EOCD record, returning it with its offset in the source.
async fn find_eocd<R: ReadAt>(reader: &R) -> Result<(EndOfCentralDirectory, u64)> {
    let size = reader.size();
    let record = EndOfCentralDirectory::SIZE as u64;
    if size < record {
        bail!("Not a valid ZIP file (only {size} bytes)");
    }

    // Common case first: no archive comment, EOCD is the last 22 bytes.
    let mut tail = vec![0u8; EndOfCentralDirectory::SIZE];
    reader.read_exact_at(size - record, &mut tail).await?;
    if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
        return Ok((EndOfCentralDirectory::parse(&tail)?, size - record));
    }

    // Otherwise scan backwards through the largest possible comment window.
    let window = (MAX_COMMENT_SIZE + record).min(size);
    let start = size - window;
    let mut buf = vec![0u8; window as usize];
    reader.read_exact_at(start, &mut buf).await?;

    for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
        if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
            continue;
        }
        let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
        if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
            let eocd = EndOfCentralDirectory::parse(&buf[i..i + EndOfCentralDirectory::SIZE])?;
            return Ok((eocd, start + i as u64));
        }
    }

    bail!("Not a valid ZIP file (End of Central Directory not found)")
}

/// Resolve where the central directory lives, consulting ZIP64 records when needed.
async fn locate_directory<R: ReadAt>(reader: &R) -> Result<DirectoryLocation> {
    let (eocd, eocd_offset) = find_eocd(reader).await?;

    let location = if eocd.needs_zip64() {
        let Some(locator_offset) = eocd_offset.checked_sub(Zip64Locator::SIZE as u64) else {
            bail!("ZIP64 locator missing");
        };
        let mut locator_buf = vec![0u8; Zip64Locator::SIZE];
        reader.read_exact_at(locator_offset, &mut locator_buf).await?;
        let locator = Zip64Locator::parse(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EndOfCentralDirectory::MIN_SIZE];
        reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;
        let eocd64 = Zip64EndOfCentralDirectory::parse(&eocd64_buf)?;
        DirectoryLocation {
            offset: eocd64.cd_offset,
            size: eocd64.cd_size,
            entries: eocd64.total_entries,
        }
    } else {
        DirectoryLocation {
            offset: eocd.cd_offset as u64,
            size: eocd.cd_size as u64,
            entries: eocd.total_entries as u64,
        }
    };

    match location.offset.checked_add(location.size) {
        Some(end) if end <= reader.size() => {}
        _ => bail!(
            "Central directory out of bounds (offset {}, size {}, archive {} bytes)",
            location.offset,
            location.size,
            reader.size()
        ),
    }
    if location.entries > location.size / CDFH_MIN_SIZE as u64 {
        bail!(
            "Central directory too small for {} entries ({} bytes)",
            location.entries,
            location.size
        );
    }

    Ok(location)
}

/// Read and decode every central directory header.
pub async fn read_central_directory<R: ReadAt>(reader: &R) -> Result<Vec<ZipEntry>> {
    let location = locate_directory(reader).await?;

    // One read for the whole directory.
    let mut data = vec![0u8; location.size as usize];
    reader.read_exact_at(location.offset, &mut data).await?;

    let mut cursor = Cursor::new(data.as_slice());
    let mut entries = Vec::with_capacity(location.entries as usize);
    for _ in 0..location.entries {
        entries.push(parse_cdfh(&mut cursor)?);
    }
    Ok(entries)
}

fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let comment_len = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut header_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name_bytes = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name_bytes)?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();

    let mut extra = vec![0u8; extra_len as usize];
    cursor.read_exact(&mut extra)?;
    apply_zip64_extra(
        &extra,
        &mut uncompressed_size,
        &mut compressed_size,
        &mut header_offset,
    )?;

    let mut comment = vec![0u8; comment_len as usize];
    cursor.read_exact(&mut comment)?;

    Ok(ZipEntry {
        name,
        compression: CompressionMethod::from(compression),
        flags,
        compressed_size,
        uncompressed_size,
        crc32,
        header_offset,
    })
}

/// Replace saturated 32-bit fields with their values from the ZIP64 extra field (id 0x0001).
fn apply_zip64_extra(
    extra: &[u8],
    uncompressed_size: &mut u64,
    compressed_size: &mut u64,
    header_offset: &mut u64,
) -> Result<()> {
    let mut cursor = Cursor::new(extra);
    while cursor.position() + 4 <= extra.len() as u64 {
        let id = cursor.read_u16::<LittleEndian>()?;
        let len = cursor.read_u16::<LittleEndian>()? as u64;
        let end = cursor.position() + len;
        if end > extra.len() as u64 {
            bail!("Truncated extra field");
        }

        if id == 0x0001 {
            // Values appear only for fields that are saturated, in this order.
            for field in [&mut *uncompressed_size, &mut *compressed_size, &mut *header_offset] {
                if *field == u32::MAX as u64 && cursor.position() + 8 <= end {
                    *field = cursor.read_u64::<LittleEndian>()?;
                }
            }
            return Ok(());
        }
        cursor.set_position(end);
    }
    Ok(())
}

/// Offset of a member's data: local header + name + extra field.
pub async fn data_offset<R: ReadAt>(reader: &R, entry: &ZipEntry) -> Result<u64> {
    let header_end = entry
        .header_offset
        .checked_add(LFH_SIZE as u64)
        .filter(|end| *end <= reader.size());
    if header_end.is_none() {
        bail!("Local File Header of {} out of bounds", entry.name);
    }

    let mut lfh = [0u8; LFH_SIZE];
    reader.read_exact_at(entry.header_offset, &mut lfh).await?;
    if &lfh[0..4] != LFH_SIGNATURE {
        bail!("Invalid Local File Header for {}", entry.name);
    }

    let name_len = u16::from_le_bytes([lfh[26], lfh[27]]) as u64;
    let extra_len = u16::from_le_bytes([lfh[28], lfh[29]]) as u64;
    Ok(entry.header_offset + LFH_SIZE as u64 + name_len + extra_len)
}
