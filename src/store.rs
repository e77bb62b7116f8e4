use std::convert::TryInto;

use async_std::{
    fs,
    path::{Path, PathBuf},
};
use async_trait::async_trait;
use chrono::DateTime;

use crate::{error::Error, index::LineIndex, Result};

/// Suffix appended to a source path to derive its side-car index path
pub const INDEX_SUFFIX: &str = ".idx";

/// Magic bytes prefixing a binary encoded index
const MAGIC: [u8; 4] = *b"nlix";

/// Length of the binary header in bytes: magic, line count, mtime seconds,
/// mtime nanoseconds
const HEADER_SIZE: usize = 4 + 8 + 8 + 4;

/// Derive the side-car index path belonging to `source`
pub fn sidecar_path<P: AsRef<Path>>(source: P) -> PathBuf {
    let mut path = source.as_ref().as_os_str().to_os_string();
    path.push(INDEX_SUFFIX);
    path.into()
}

/// Persistence of an offset index at a side-car location.
///
/// Implementations define the on-disk representation. Decoding has to
/// round-trip saved indexes exactly and reject bytes that do not form a
/// structurally valid index.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Serialize `index` to `path`, replacing any previous content
    async fn save(&self, path: &Path, index: &LineIndex) -> Result<()>;

    /// Decode a previously saved index.
    ///
    /// Returns `Error::CorruptIndex` if the persisted bytes are malformed or
    /// violate the offset invariants.
    async fn load(&self, path: &Path) -> Result<LineIndex>;

    /// Returns `true` if a side-car index file is present at `path`
    async fn exists(&self, path: &Path) -> bool;
}

/// Write `bytes` to a temporary sibling of `path` and rename it over the
/// destination, so a concurrent reader only ever sees an entirely old or an
/// entirely new index.
async fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;

    Ok(())
}

/// The default store: a JSON object holding the mtime as RFC 3339 string and
/// the offset list.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonStore;

#[async_trait]
impl IndexStore for JsonStore {
    async fn save(&self, path: &Path, index: &LineIndex) -> Result<()> {
        let bytes = serde_json::to_vec(index).map_err(std::io::Error::from)?;
        write_replacing(path, &bytes).await
    }

    async fn load(&self, path: &Path) -> Result<LineIndex> {
        let bytes = fs::read(path).await?;

        let index: LineIndex = serde_json::from_slice(&bytes)
            .map_err(|_| Error::CorruptIndex("not a valid json index"))?;
        index.validate()?;

        Ok(index)
    }

    async fn exists(&self, path: &Path) -> bool {
        path.exists().await
    }
}

/// Compact store: a fixed-width binary encoding, one little-endian `u64` per
/// line behind a short header. Considerably smaller than JSON for files with
/// many lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryStore;

#[async_trait]
impl IndexStore for BinaryStore {
    async fn save(&self, path: &Path, index: &LineIndex) -> Result<()> {
        write_replacing(path, &encode_binary(index)).await
    }

    async fn load(&self, path: &Path) -> Result<LineIndex> {
        let bytes = fs::read(path).await?;
        decode_binary(&bytes)
    }

    async fn exists(&self, path: &Path) -> bool {
        path.exists().await
    }
}

/// Encode an index into bytes: header first, then the offset table
fn encode_binary(index: &LineIndex) -> Vec<u8> {
    let mtime = index.mtime();

    let mut out = Vec::with_capacity(HEADER_SIZE + index.len() * 8);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&(index.len() as u64).to_le_bytes());
    out.extend_from_slice(&mtime.timestamp().to_le_bytes());
    out.extend_from_slice(&mtime.timestamp_subsec_nanos().to_le_bytes());

    for offset in index.offsets() {
        out.extend_from_slice(&offset.to_le_bytes());
    }

    out
}

/// Decode a binary encoded index, validating header and offset invariants
fn decode_binary(bytes: &[u8]) -> Result<LineIndex> {
    if bytes.len() < HEADER_SIZE || bytes[..4] != MAGIC {
        return Err(Error::CorruptIndex("missing index header"));
    }

    let corrupt = |_| Error::CorruptIndex("malformed index header");
    let lines = u64::from_le_bytes(bytes[4..12].try_into().map_err(corrupt)?) as usize;
    let secs = i64::from_le_bytes(bytes[12..20].try_into().map_err(corrupt)?);
    let nanos = u32::from_le_bytes(bytes[20..24].try_into().map_err(corrupt)?);

    let mtime = DateTime::from_timestamp(secs, nanos)
        .ok_or(Error::CorruptIndex("mtime out of range"))?;

    let body = &bytes[HEADER_SIZE..];
    if body.len() % 8 != 0 || body.len() / 8 != lines {
        return Err(Error::CorruptIndex("offset table length mismatch"));
    }

    let mut offsets = Vec::with_capacity(lines);
    for chunk in body.chunks_exact(8) {
        offsets.push(u64::from_le_bytes(
            chunk.try_into().map_err(|_| Error::CorruptIndex("truncated offset table"))?,
        ));
    }

    let index = LineIndex::new(mtime, offsets);
    index.validate()?;

    Ok(index)
}
