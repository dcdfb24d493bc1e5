//! Tabular datasets and their CSV form
//!
//! A [`NamedDataset`] pairs the rows of one report with the name of the
//! remote file it is uploaded as. Rows are serialized with a comma delimiter,
//! a `\n` record terminator and quoting only where a field needs it.

use crate::error::TransferError;

/// One report: remote file name plus ordered rows of string fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDataset {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl NamedDataset {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build from borrowed string rows, mostly for callers holding literals
    pub fn from_rows<R, F>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = F>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            name: name.into(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Serialize every row as CSV
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, TransferError> {
        let serialization_failed = |e: csv::Error| TransferError::SerializationFailed {
            name: self.name.clone(),
            reason: e.to_string(),
        };

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b',')
            .terminator(csv::Terminator::Any(b'\n'))
            .quote_style(csv::QuoteStyle::Necessary)
            .flexible(true)
            .from_writer(Vec::new());

        for row in &self.rows {
            wtr.write_record(row).map_err(serialization_failed)?;
        }

        wtr.into_inner().map_err(|e| TransferError::SerializationFailed {
            name: self.name.clone(),
            reason: e.error().to_string(),
        })
    }
}

/// Reduce a caller-supplied name to a bare file name.
///
/// Directory components from either separator style are stripped; the
/// remaining name is kept byte for byte, whitespace included. Returns `None`
/// when nothing usable remains.
pub fn sanitize_file_name(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return None;
    }

    Some(base)
}

/// Join a sanitized dataset name onto the remote base directory.
///
/// An empty base path writes into the login directory.
pub fn remote_file_path(base_path: &str, name: &str) -> Result<String, TransferError> {
    let file_name = sanitize_file_name(name).ok_or_else(|| TransferError::RemoteFileCreateFailed {
        path: name.to_string(),
        reason: "dataset name does not contain a usable file name".to_string(),
    })?;

    let base = base_path.trim();
    if base.is_empty() {
        return Ok(file_name.to_string());
    }

    let base = base.trim_end_matches('/');
    Ok(format!("{}/{}", base, file_name))
}
