//! Delimiter detection from the header line.

use crate::row::CsvSource;
use std::io::{self, BufRead, BufReader, Cursor, Read};

/// Candidate delimiters, in tie-break order.
pub const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Source returned by [`detect_source`]: the consumed first line replayed
/// ahead of the rest of the stream.
pub type DetectedSource<R> = CsvSource<io::Chain<Cursor<Vec<u8>>, BufReader<R>>>;

/// Pick the candidate that occurs most often in `line`.
///
/// Ties keep the earlier candidate; a line with none of them yields `,`.
pub fn detect_delimiter(line: &[u8]) -> u8 {
    let mut best = b',';
    let mut best_count = 0;

    for candidate in CANDIDATES {
        let count = line.iter().filter(|&&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Wrap `reader` in a [`CsvSource`] whose delimiter is guessed from the first line.
pub fn detect_source<R: Read>(reader: R) -> io::Result<DetectedSource<R>> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;

    let delimiter = detect_delimiter(&line);
    tracing::debug!(delimiter = %char::from(delimiter).escape_default(), "detected delimiter");

    Ok(CsvSource::with_delimiter(
        Cursor::new(line).chain(reader),
        delimiter,
    ))
}
