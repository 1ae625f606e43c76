//! Delimited file output
//!
//! The table is written to a temp file next to the destination and renamed
//! over it only once everything is flushed, so a failed write never leaves a
//! partial file at `destination`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::SinkError;
use crate::tabular::Tabular;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
}

impl OutputFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }

    /// Guess from the file extension; `None` if it is neither csv nor tsv
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(OutputFormat::Csv),
            "tsv" | "tab" => Some(OutputFormat::Tsv),
            _ => None,
        }
    }
}

/// Temp file in `dir`, created with the mode a plain `File::create` would
/// get (0o666 less the umask) rather than tempfile's private 0o600
fn create_temp(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".page-tabulator-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Write header + rows to `destination`, replacing any existing file
pub fn write(tabular: &Tabular, destination: &Path, format: OutputFormat) -> Result<(), SinkError> {
    let unwritable = |source: io::Error| SinkError::Unwritable {
        path: destination.to_path_buf(),
        source,
    };

    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let temp = create_temp(parent).map_err(unwritable)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(temp);

    writer
        .write_record(tabular.columns())
        .map_err(|e| unwritable(e.into()))?;
    for row in tabular.rows() {
        writer.write_record(row).map_err(|e| unwritable(e.into()))?;
    }

    let mut temp = writer
        .into_inner()
        .map_err(|e| unwritable(io::Error::new(e.error().kind(), e.error().to_string())))?;
    temp.flush().map_err(unwritable)?;
    temp.as_file().sync_all().map_err(unwritable)?;

    // An overwrite keeps the existing file's mode
    if let Ok(existing) = fs::metadata(destination) {
        if existing.is_file() {
            temp.as_file()
                .set_permissions(existing.permissions())
                .map_err(unwritable)?;
        }
    }

    // A failed persist hands the temp file back inside the error; dropping it deletes it
    temp.persist(destination).map_err(|e| unwritable(e.error))?;

    info!(
        "Wrote {} rows x {} columns to {}",
        tabular.len(),
        tabular.columns().len(),
        destination.display()
    );
    Ok(())
}
