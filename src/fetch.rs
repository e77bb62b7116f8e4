use std::io::SeekFrom;

use async_std::{
    fs,
    io::{prelude::*, BufReader},
    path::Path,
};

use crate::{index::LineIndex, Result};

/// Read line `line` out of the file at `path` using the byte range recorded
/// in `index`.
///
/// The read is bounded: it starts at the line's offset and stops before the
/// next line's offset, or at the end of the file for the last line. Only the
/// first line of the range is kept, so a terminator byte at the boundary
/// cannot leak a neighboring line into the result. The returned line is
/// stripped of surrounding whitespace including the terminator.
pub async fn fetch_line<P: AsRef<Path>>(path: P, index: &LineIndex, line: usize) -> Result<String> {
    let start = index.get(line)?;

    let mut reader = BufReader::new(fs::File::open(path.as_ref()).await?);
    reader.seek(SeekFrom::Start(start)).await?;

    let mut buf = Vec::new();
    match index.get(line + 1) {
        Ok(next) => {
            // Space between this line's offset and the next one, minus the
            // terminator byte
            buf.resize((next - start - 1) as usize, 0);
            reader.read_exact(&mut buf).await?;
        }
        Err(_) => {
            // Last line: read up to the end of the file
            reader.read_to_end(&mut buf).await?;
        }
    }

    if let Some(terminator) = buf.iter().position(|&b| b == b'\n') {
        buf.truncate(terminator);
    }

    Ok(String::from_utf8_lossy(&buf).trim().to_owned())
}
