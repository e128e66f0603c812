//! Flat exports of a ranked result table.
//!
//! Each table goes out twice: CSV with the fixed column order and JSON Lines
//! with one object per row. Non-finite objectives are written as `NaN` in CSV
//! and `null` in JSONL. Files are written to a temporary sibling and renamed
//! into place, so a failed export never leaves a truncated file behind.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use hull_core::ResultRecord;
use hull_core::ResultTable;
use hull_core::table::COLUMNS;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{context} {path:?}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ExportError {
    fn io<'a>(context: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| ExportError::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path is filled in by [`write_atomic`].
    fn from_write(source: io::Error) -> Self {
        ExportError::Io {
            context: "writing",
            path: PathBuf::new(),
            source,
        }
    }
}

/// Where one export landed and how many data rows it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub jsonl: PathBuf,
    pub rows: usize,
}

/// Every row, in table order.
pub fn export_results(
    table: &ResultTable,
    csv: &Path,
    jsonl: &Path,
) -> Result<ExportPaths, ExportError> {
    export_rows(table.records().iter().collect(), csv, jsonl)
}

/// Feasible Pareto rows only, in table order. An empty front still
/// produces files with just the header (CSV) or no lines (JSONL).
pub fn export_pareto_only(
    table: &ResultTable,
    csv: &Path,
    jsonl: &Path,
) -> Result<ExportPaths, ExportError> {
    export_rows(table.pareto_only().collect(), csv, jsonl)
}

fn export_rows(
    rows: Vec<&ResultRecord>,
    csv: &Path,
    jsonl: &Path,
) -> Result<ExportPaths, ExportError> {
    write_atomic(csv, |w| write_csv(w, &rows))?;
    write_atomic(jsonl, |w| write_jsonl(w, &rows))?;
    Ok(ExportPaths {
        csv: csv.to_path_buf(),
        jsonl: jsonl.to_path_buf(),
        rows: rows.len(),
    })
}

pub fn write_csv(writer: &mut dyn Write, rows: &[&ResultRecord]) -> Result<(), ExportError> {
    writeln!(writer, "{}", COLUMNS.join(",")).map_err(ExportError::from_write)?;
    for row in rows {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            row.candidate.length,
            row.candidate.beam,
            row.candidate.draft,
            row.candidate.block_coefficient,
            row.displacement,
            row.gz_max,
            row.feasible,
            row.pareto,
        )
        .map_err(ExportError::from_write)?;
    }
    Ok(())
}

pub fn write_jsonl(writer: &mut dyn Write, rows: &[&ResultRecord]) -> Result<(), ExportError> {
    for row in rows {
        serde_json::to_writer(&mut *writer, row)?;
        writer.write_all(b"\n").map_err(ExportError::from_write)?;
    }
    Ok(())
}

/// Write through a temporary file in the target directory, then rename it
/// over `path`.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), ExportError>,
{
    let dir = staging_dir(path)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(ExportError::io("staging", path))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(|err| match err {
            ExportError::Io {
                context, source, ..
            } => ExportError::Io {
                context,
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        writer.flush().map_err(ExportError::io("flushing", path))?;
    }
    publish(tmp, path)
}

/// Directory that will hold `path`, created if missing.
pub(crate) fn staging_dir(path: &Path) -> Result<&Path, ExportError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(ExportError::io("creating directory for", path))?;
    Ok(dir)
}

/// Rename a finished temporary file over `path`.
///
/// Temporary files are created owner-only; the published file takes the
/// permissions of the file it replaces, or `0644` when there is none.
pub(crate) fn publish(tmp: NamedTempFile, path: &Path) -> Result<(), ExportError> {
    let permissions = match fs::metadata(path) {
        Ok(existing) => Some(existing.permissions()),
        Err(_) => default_permissions(),
    };
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(ExportError::io("setting permissions on", path))?;
    }
    tmp.persist(path).map_err(|err| ExportError::Io {
        context: "replacing",
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
