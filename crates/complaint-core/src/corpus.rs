//! Loading the cleaned complaint table produced by the ingestion stage.
//!
//! Expects CSV with at least the `complaint_id`, `product` and
//! `cleaned_narrative` columns; other columns are ignored. Rows with a blank
//! narrative are kept here and dropped by the chunker.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::Record;

pub const ID_COLUMN: &str = "complaint_id";
pub const CATEGORY_COLUMN: &str = "product";
pub const TEXT_COLUMN: &str = "cleaned_narrative";

#[derive(Debug, Deserialize)]
struct CorpusRow {
    complaint_id: String,
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    cleaned_narrative: Option<String>,
}

/// Load a CSV file, or every `*.csv` below a directory in path order.
pub fn load_corpus(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        return Err(Error::Validation(format!("corpus path {} does not exist", path.display())));
    }
    let files = if path.is_dir() { list_csv_files(path) } else { vec![path.to_path_buf()] };
    if files.is_empty() {
        tracing::warn!("No .csv files found under {}", path.display());
    }
    let mut records = Vec::new();
    for file in &files {
        let reader = std::fs::File::open(file).map_err(|e| Error::Validation(format!("cannot open {}: {}", file.display(), e)))?;
        let loaded = read_corpus(reader).map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("{}: {}", file.display(), msg)),
            other => other,
        })?;
        tracing::info!(file = %file.display(), records = loaded.len(), "loaded corpus file");
        records.extend(loaded);
    }
    Ok(records)
}

/// Parse complaint records from any CSV source.
pub fn read_corpus<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers().map_err(|e| Error::Validation(format!("unreadable header row: {e}")))?.clone();
    for required in [ID_COLUMN, CATEGORY_COLUMN, TEXT_COLUMN] {
        if !headers.iter().any(|h| h.trim() == required) {
            return Err(Error::Validation(format!("missing required column '{required}'")));
        }
    }

    let mut records = Vec::new();
    for (row, result) in csv_reader.deserialize::<CorpusRow>().enumerate() {
        let line = row + 2;
        let parsed = result.map_err(|e| Error::Validation(format!("row {line}: {e}")))?;
        let id = parsed.complaint_id.trim();
        if id.is_empty() {
            return Err(Error::Validation(format!("row {line}: empty {ID_COLUMN}")));
        }
        records.push(Record {
            id: id.to_string(),
            category: parsed.product.unwrap_or_default().trim().to_string(),
            text: parsed.cleaned_narrative.unwrap_or_default(),
        });
    }
    Ok(records)
}

fn list_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("csv"))
        .collect();
    files.sort();
    files
}
