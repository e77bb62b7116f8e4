use async_std::{
    fs,
    io::{prelude::*, BufReader, Read},
    path::Path,
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{error::Error, Result};

/// In-memory offset index of a line-delimited text file.
///
/// Maps a line number to the byte position its line starts at and remembers
/// the modification time of the source the offsets were scanned from. An
/// index is only valid for a source file whose current modification time
/// still equals the recorded one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIndex {
    /// Modification time of the source file at build time
    mtime: DateTime<Utc>,
    /// Maps line number to the byte offset the line starts at. The index
    /// within the Vec represents the line number in the file
    offsets: Vec<u64>,
}

impl LineIndex {
    /// Create a new LineIndex. The offsets are expected to satisfy the
    /// invariants checked by `validate`
    pub fn new(mtime: DateTime<Utc>, offsets: Vec<u64>) -> LineIndex {
        Self { mtime, offsets }
    }

    /// Scan the file at `path` once and index the starting byte offset of
    /// every line, then record the file's current modification time.
    ///
    /// Building does not persist anything; storing the index is up to the
    /// caller.
    pub async fn build<P: AsRef<Path>>(path: P) -> Result<LineIndex> {
        let path = path.as_ref();

        let mut reader = BufReader::new(fs::File::open(path).await?);
        let offsets = scan_offsets(&mut reader).await?;
        let mtime = source_mtime(path).await?;

        log::debug!("indexed {} lines of {}", offsets.len(), path.display());

        Ok(Self { mtime, offsets })
    }

    /// Modification time of the source file at the moment the index was built
    #[inline]
    pub fn mtime(&self) -> DateTime<Utc> {
        self.mtime
    }

    /// Byte offset at which line `line` starts
    #[inline]
    pub fn get(&self, line: usize) -> Result<u64> {
        self.offsets.get(line).copied().ok_or(Error::LineNotFound {
            line,
            lines: self.offsets.len(),
        })
    }

    /// Amount of indexed lines
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if the source file had no lines at build time
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The raw offset table
    #[inline]
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Check the structural invariants every persisted index has to satisfy:
    /// strictly ascending offsets, starting at 0 for non-empty files
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.offsets.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(Error::CorruptIndex("offsets are not strictly ascending"));
        }

        if let Some(&first) = self.offsets.first() {
            if first != 0 {
                return Err(Error::CorruptIndex("first offset is not 0"));
            }
        }

        Ok(())
    }
}

/// Collect the byte offset each line within `reader` starts at.
///
/// Lines are delimited by `\n`. The cursor advances by the byte length of
/// the line including its terminator, so offsets stay correct on multi-byte
/// encoded content. A final line without terminator still gets an entry.
pub(crate) async fn scan_offsets<R: Read + Unpin>(reader: &mut BufReader<R>) -> Result<Vec<u64>> {
    let mut offsets: Vec<u64> = Vec::new();
    let mut cursor: u64 = 0;

    let mut buff = Vec::with_capacity(1000);

    loop {
        buff.clear();
        let n = reader.read_until(b'\n', &mut buff).await?;

        if n == 0 {
            break;
        }

        offsets.push(cursor);
        cursor += n as u64;
    }

    Ok(offsets)
}

/// Current modification time of the file at `path`
pub async fn source_mtime<P: AsRef<Path>>(path: P) -> Result<DateTime<Utc>> {
    let modified = fs::metadata(path.as_ref()).await?.modified()?;
    Ok(modified.into())
}
