//! Row-level I/O consumed by the pipeline.
//!
//! The mapper never parses or quotes delimited text itself. A [`RowSource`]
//! yields already-split rows and a [`RowSink`] accepts rows of column
//! strings; [`CsvSource`] and [`CsvSink`] adapt the `csv` crate to both.

use std::io;

/// Yields rows of column strings. The first row read is the header row.
pub trait RowSource {
    /// Read the next row, or `None` at end of input.
    fn read_row(&mut self) -> io::Result<Option<Vec<String>>>;
}

/// Accepts rows of column strings.
pub trait RowSink {
    /// Field delimiter the sink writes with, used to escape cell text.
    fn delimiter(&self) -> u8;

    fn write_row(&mut self, row: &[String]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        (**self).read_row()
    }
}

impl<S: RowSink + ?Sized> RowSink for Box<S> {
    fn delimiter(&self) -> u8 {
        (**self).delimiter()
    }

    fn write_row(&mut self, row: &[String]) -> io::Result<()> {
        (**self).write_row(row)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// In-memory rows, mostly for tests and already-split input.
impl RowSource for std::vec::IntoIter<Vec<String>> {
    fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        Ok(self.next())
    }
}

/// Collects rows in memory. Delimiter is `,`.
impl RowSink for Vec<Vec<String>> {
    fn delimiter(&self) -> u8 {
        b','
    }

    fn write_row(&mut self, row: &[String]) -> io::Result<()> {
        self.push(row.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Delimited-text row source.
///
/// Rows may be shorter or longer than the header row.
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
    delimiter: u8,
    record: csv::StringRecord,
}

impl<R: io::Read> CsvSource<R> {
    /// Comma-delimited source.
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, b',')
    }

    pub fn with_delimiter(reader: R, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);

        Self {
            reader,
            delimiter,
            record: csv::StringRecord::new(),
        }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl<R: io::Read> RowSource for CsvSource<R> {
    fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(self.record.iter().map(String::from).collect()))
    }
}

/// Delimited-text row sink. Cells are quoted as needed by the `csv` writer.
#[derive(Debug)]
pub struct CsvSink<W: io::Write> {
    writer: csv::Writer<W>,
    delimiter: u8,
}

impl<W: io::Write> CsvSink<W> {
    /// Comma-delimited sink.
    pub fn new(writer: W) -> Self {
        Self::with_delimiter(writer, b',')
    }

    pub fn with_delimiter(writer: W, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_writer(writer);

        Self { writer, delimiter }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: io::Write> RowSink for CsvSink<W> {
    fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn write_row(&mut self, row: &[String]) -> io::Result<()> {
        self.writer.write_record(row)?;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
