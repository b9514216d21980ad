//! TSV Report
//!
//! One header row and one row per successful run, tab-separated. Sizes and
//! memory are reported in KB (bytes / 1024) with two decimals.
//!
//! The table is rendered completely in memory and written once, through a
//! `.partial` file that is renamed into place, so a report file is either
//! complete or absent.

use chrono::{DateTime, TimeZone};
use pixbench_core::CompressionRun;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column names, in output order
pub const COLUMNS: [&str; 7] = [
    "FileName",
    "Library",
    "Format",
    "CompressionTime(ms)",
    "MemoryUsed(KB)",
    "InputFileSize(KB)",
    "OutputFileSize(KB)",
];

/// Report file name prefix
pub const REPORT_PREFIX: &str = "compression_report_";

/// Timestamp layout embedded in report file names
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One parsed data row of a TSV report
#[derive(Debug, Clone, PartialEq)]
pub struct TsvRow {
    /// Input file name
    pub file_name: String,
    /// Backend identifier
    pub backend: String,
    /// Format token
    pub format: String,
    /// Elapsed milliseconds
    pub elapsed_ms: u64,
    /// Memory delta in KB
    pub memory_kb: f64,
    /// Input size in KB
    pub input_kb: f64,
    /// Output size in KB
    pub output_kb: f64,
}

/// Errors from [`parse_tsv`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TsvParseError {
    /// Input was empty
    #[error("missing header row")]
    MissingHeader,
    /// Header did not match [`COLUMNS`]
    #[error("unexpected header: {0}")]
    BadHeader(String),
    /// Data row with the wrong field count or an unparsable number
    #[error("line {line}: {reason}")]
    BadRow {
        /// 1-based line number
        line: usize,
        /// What went wrong
        reason: String,
    },
}

/// Bytes to KB
pub fn to_kb(bytes: f64) -> f64 {
    bytes / 1024.0
}

/// Render runs as a TSV table, in the order given
pub fn render_tsv<'a>(runs: impl IntoIterator<Item = &'a CompressionRun>) -> String {
    let mut out = COLUMNS.join("\t");
    out.push('\n');

    for run in runs {
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}",
            sanitize(&run.file_name),
            sanitize(&run.backend),
            sanitize(&run.format),
            run.elapsed_ms,
            to_kb(run.memory_delta as f64),
            to_kb(run.input_size as f64),
            to_kb(run.output_size as f64),
        );
    }

    out
}

/// Tabs and newlines would break the column layout
fn sanitize(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains(['\t', '\n', '\r']) {
        field.replace(['\t', '\n', '\r'], " ").into()
    } else {
        field.into()
    }
}

/// Report file name for a generation time
pub fn report_file_name<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}.tsv", REPORT_PREFIX, timestamp.format(TIMESTAMP_FORMAT))
}

/// Render and write a report into `dir`, returning the path written
///
/// The directory is created if missing. If a report with the same timestamp
/// already exists a numeric suffix is added instead of overwriting it.
pub fn write_report<'a, Tz: TimeZone>(
    runs: impl IntoIterator<Item = &'a CompressionRun>,
    dir: &Path,
    timestamp: &DateTime<Tz>,
) -> io::Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let table = render_tsv(runs);
    fs::create_dir_all(dir)?;

    let base = report_file_name(timestamp);
    let stem = base.trim_end_matches(".tsv");
    let partial = partial_report_path(dir, &base);

    if let Err(e) = fs::write(&partial, table.as_bytes()) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{}_{}.tsv", stem, attempt)
        };
        let path = dir.join(name);

        // Claim the name first so a concurrent writer cannot take it between
        // the existence check and the rename
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                if let Err(e) = fs::rename(&partial, &path) {
                    let _ = fs::remove_file(&partial);
                    let _ = fs::remove_file(&path);
                    return Err(e);
                }
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        }
    }
}

/// Scratch file a report is written to before it is renamed into place
///
/// The process id keeps concurrent writers in the same second apart.
fn partial_report_path(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!(".{}.{}.partial", base, std::process::id()))
}

/// Parse a rendered report back into rows
pub fn parse_tsv(text: &str) -> Result<Vec<TsvRow>, TsvParseError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or(TsvParseError::MissingHeader)?;
    if header.split('\t').ne(COLUMNS.iter().copied()) {
        return Err(TsvParseError::BadHeader(header.to_string()));
    }

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_no = idx + 2;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != COLUMNS.len() {
            return Err(TsvParseError::BadRow {
                line: line_no,
                reason: format!("expected {} fields, got {}", COLUMNS.len(), fields.len()),
            });
        }

        let number = |i: usize| -> Result<f64, TsvParseError> {
            fields[i].parse::<f64>().map_err(|e| TsvParseError::BadRow {
                line: line_no,
                reason: format!("{}: {}", COLUMNS[i], e),
            })
        };

        rows.push(TsvRow {
            file_name: fields[0].to_string(),
            backend: fields[1].to_string(),
            format: fields[2].to_string(),
            elapsed_ms: fields[3].parse().map_err(|e| TsvParseError::BadRow {
                line: line_no,
                reason: format!("{}: {}", COLUMNS[3], e),
            })?,
            memory_kb: number(4)?,
            input_kb: number(5)?,
            output_kb: number(6)?,
        });
    }

    Ok(rows)
}
