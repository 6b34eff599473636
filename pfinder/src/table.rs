//! Flat CSV tables: bead pairs in, normalized records out.
//!
//! Input header: `x1,y1,x2,y2` with an optional `contour_index` column, in any
//! order. Output header: `c_dist,c_disp,r`, optionally preceded by
//! `bead_index`.

use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use glam::DVec2;
use serde::Serialize;

use crate::correction::{BeadPair, CorrectionReport, NormalizedRecord};
use crate::error::{Error, Result};

const REQUIRED_COLUMNS: [&str; 4] = ["x1", "y1", "x2", "y2"];
const CONTOUR_INDEX_COLUMN: &str = "contour_index";
const RECORD_COLUMNS: [&str; 3] = ["c_dist", "c_disp", "r"];
const BEAD_INDEX_COLUMN: &str = "bead_index";

/// Output row with the bead's input position in front.
#[derive(Serialize)]
struct IndexedRecord {
    bead_index: usize,
    c_dist: f64,
    c_disp: f64,
    r: f64,
}

impl IndexedRecord {
    fn new(bead_index: usize, record: &NormalizedRecord) -> Self {
        Self {
            bead_index,
            c_dist: record.c_dist,
            c_disp: record.c_disp,
            r: record.r,
        }
    }
}

/// Column positions resolved from the header row.
struct Columns {
    coords: [usize; 4],
    contour_index: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let mut coords = [0; 4];
        for (slot, name) in coords.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = find(name).ok_or_else(|| Error::MalformedTable {
                path: path.to_path_buf(),
                line: 1,
                reason: format!("missing column '{}'", name),
            })?;
        }

        Ok(Self {
            coords,
            contour_index: find(CONTOUR_INDEX_COLUMN),
        })
    }
}

/// Load every bead pair from a CSV file.
///
/// The whole table is validated before anything is returned; the first bad
/// row fails the load with its line number.
pub fn read_beads(path: &Path) -> Result<Vec<BeadPair>> {
    let file = std::fs::File::open(path).map_err(|e| Error::Csv {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    let beads = read_beads_from(file, path)?;
    tracing::debug!("Loaded {} bead pair(s) from {}", beads.len(), path.display());
    Ok(beads)
}

/// Same as [`read_beads`] for an already open reader. `path` only labels errors.
pub fn read_beads_from<R: io::Read>(reader: R, path: &Path) -> Result<Vec<BeadPair>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader.headers().map_err(|e| table_error(e, path))?.clone();
    let columns = Columns::resolve(&headers, path)?;

    let mut beads = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| table_error(e, path))?;
        beads.push(parse_row(&record, &columns, path)?);
    }
    Ok(beads)
}

fn parse_row(record: &StringRecord, columns: &Columns, path: &Path) -> Result<BeadPair> {
    let line = record.position().map_or(0, |p| p.line());
    let malformed = |reason: String| Error::MalformedTable {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut values = [0.0f64; 4];
    for ((value, &column), name) in values.iter_mut().zip(&columns.coords).zip(REQUIRED_COLUMNS) {
        let cell = record.get(column).unwrap_or("");
        *value = cell
            .parse::<f64>()
            .map_err(|_| malformed(format!("'{}' is not a number in column '{}'", cell, name)))?;
        if !value.is_finite() {
            return Err(malformed(format!("non-finite value in column '{}'", name)));
        }
    }

    let contour_index = match columns.contour_index.and_then(|c| record.get(c)) {
        None | Some("") => None,
        Some(cell) => Some(cell.parse::<usize>().map_err(|_| {
            malformed(format!(
                "'{}' is not a valid index in column '{}'",
                cell, CONTOUR_INDEX_COLUMN
            ))
        })?),
    };

    let [x1, y1, x2, y2] = values;
    Ok(BeadPair {
        reference: DVec2::new(x1, y1),
        moving: DVec2::new(x2, y2),
        contour_index,
    })
}

/// Row-level csv errors carry a position and become [`Error::MalformedTable`].
fn table_error(err: csv::Error, path: &Path) -> Error {
    match err.position() {
        Some(position) => Error::MalformedTable {
            path: path.to_path_buf(),
            line: position.line(),
            reason: err.to_string(),
        },
        None => Error::Csv {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

/// Write one row per corrected bead, in input order.
pub fn write_records(path: &Path, report: &CorrectionReport, with_index: bool) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| Error::Csv {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    write_records_to(file, path, report, with_index)?;
    tracing::debug!(
        "Wrote {} record(s) to {}",
        report.beads.len(),
        path.display()
    );
    Ok(())
}

/// Same as [`write_records`] for any writer. `path` only labels errors.
///
/// The header is written even when no bead was corrected.
pub fn write_records_to<W: io::Write>(
    writer: W,
    path: &Path,
    report: &CorrectionReport,
    with_index: bool,
) -> Result<()> {
    let csv_error = |source: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    if with_index {
        let mut header = vec![BEAD_INDEX_COLUMN];
        header.extend(RECORD_COLUMNS);
        wtr.write_record(&header).map_err(csv_error)?;
        for bead in &report.beads {
            wtr.serialize(IndexedRecord::new(bead.index, &bead.record))
                .map_err(csv_error)?;
        }
    } else {
        wtr.write_record(RECORD_COLUMNS).map_err(csv_error)?;
        for record in report.records() {
            wtr.serialize(record).map_err(csv_error)?;
        }
    }

    wtr.flush()
        .map_err(|e| csv_error(csv::Error::from(e)))?;
    Ok(())
}
