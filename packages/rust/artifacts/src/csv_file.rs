//! RFC 4180 CSV output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use reviewcrew_shared::{Record, Result, ReviewCrewError, Table};

use crate::{WrittenArtifact, commit_temp, temp_path_for};

fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

/// Stream a table into any writer: header row, then one row per record.
fn write_table<W: Write>(table: &Table, sink: W) -> std::result::Result<W, csv::Error> {
    let columns = table.columns();
    let mut writer = writer_builder().from_writer(sink);

    // A header with zero columns would serialize as `""`, so skip it entirely.
    if !columns.is_empty() {
        writer.write_record(&columns)?;
        for row in table.rows(&columns) {
            writer.write_record(&row)?;
        }
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))
}

/// Encode a table as CSV text.
pub fn encode_csv(table: &Table) -> Result<String> {
    let bytes = write_table(table, Vec::new())
        .map_err(|e| ReviewCrewError::validation(format!("CSV encoding failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| ReviewCrewError::validation(format!("CSV output is not UTF-8: {e}")))
}

/// Write a table to `path` as CSV, replacing any existing file.
///
/// The parent directory must already exist; an unwritable target is an
/// [`ReviewCrewError::Io`] carrying the path.
#[instrument(skip(table), fields(path = %path.display(), rows = table.len()))]
pub fn write_csv(table: &Table, path: &Path) -> Result<WrittenArtifact> {
    if table.is_empty() {
        warn!("no records to write, emitting empty CSV");
    }

    let temp = temp_path_for(path);
    let file = File::create(&temp).map_err(|e| ReviewCrewError::io(path, e))?;

    // The file handle is dropped (closed) on every path out of this block.
    let written = write_table(table, BufWriter::new(file)).and_then(|buf| {
        let file = buf
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        file.sync_all()?;
        Ok(file.metadata()?.len() as usize)
    });

    let bytes = match written {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = std::fs::remove_file(&temp);
            return Err(ReviewCrewError::io(path, std::io::Error::from(e)));
        }
    };

    commit_temp(&temp, path)?;

    info!(bytes, "CSV file written");
    Ok(WrittenArtifact {
        path: path.to_path_buf(),
        rows: table.len(),
        bytes,
    })
}

/// Read a CSV file back into a table of string cells.
///
/// Empty fields are kept as empty strings so a written table reads back with
/// the same shape.
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ReviewCrewError::io(path, std::io::Error::from(e)))?;

    let headers = reader
        .headers()
        .map_err(|e| ReviewCrewError::parse(format!("{}: {e}", path.display())))?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReviewCrewError::parse(format!("{}: {e}", path.display())))?;
        let record = headers
            .iter()
            .zip(row.iter())
            .fold(Record::new(), |rec, (k, v)| rec.with(k, v));
        records.push(record);
    }

    debug!(rows = records.len(), "read CSV file");
    Ok(Table::new(records))
}
