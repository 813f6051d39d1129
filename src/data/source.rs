//! Resolve `data_source` to bytes: HTTP(S) download or local file read.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;

use crate::error::PipelineError;

/// On-disk/wire format of the source, sniffed from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    /// `.xlsx`/`.xlsm`/`.xls`/`.ods` are spreadsheets; everything else is CSV.
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xls" | "ods") => SourceFormat::Spreadsheet,
            _ => SourceFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(Url),
    File(PathBuf),
}

impl DataSource {
    /// Treat `http://` / `https://` values as URLs and anything else as a path.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => DataSource::Url(url),
            _ => DataSource::File(PathBuf::from(raw.trim())),
        }
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            DataSource::Url(url) => SourceFormat::from_path(url.path()),
            DataSource::File(path) => SourceFormat::from_path(&path.to_string_lossy()),
        }
    }

    /// Fetch the raw bytes of the source.
    pub fn fetch(&self, timeout: Duration) -> Result<Vec<u8>, PipelineError> {
        match self {
            DataSource::Url(url) => download(url, timeout),
            DataSource::File(path) => std::fs::read(path).map_err(|e| {
                PipelineError::Extract(format!("Failed to read '{}': {e}", path.display()))
            }),
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{url}"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn download(url: &Url, timeout: Duration) -> Result<Vec<u8>, PipelineError> {
    tracing::info!(%url, "downloading data source");
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::Extract(format!("Failed to build HTTP client: {e}")))?;

    let resp = client
        .get(url.clone())
        .send()
        .map_err(|e| PipelineError::Extract(format!("Request to {url} failed: {e}")))?;

    if !resp.status().is_success() {
        return Err(PipelineError::Extract(format!(
            "Request to {url} failed with status {}.",
            resp.status()
        )));
    }

    let bytes = resp
        .bytes()
        .map_err(|e| PipelineError::Extract(format!("Failed to read response body from {url}: {e}")))?;
    tracing::debug!(bytes = bytes.len(), "download complete");
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_and_paths_are_distinguished() {
        assert!(matches!(
            DataSource::parse("https://example.org/data/sales.xlsx"),
            DataSource::Url(_)
        ));
        assert!(matches!(DataSource::parse("data/sales.csv"), DataSource::File(_)));
        assert!(matches!(DataSource::parse("C:/data/sales.csv"), DataSource::File(_)));
        assert!(matches!(DataSource::parse("ftp://host/file.csv"), DataSource::File(_)));
    }

    #[test]
    fn format_is_sniffed_from_extension() {
        assert_eq!(
            DataSource::parse("https://example.org/a/b.XLSX?x=1").format(),
            SourceFormat::Spreadsheet
        );
        assert_eq!(DataSource::parse("https://example.org/export").format(), SourceFormat::Csv);
        assert_eq!(DataSource::parse("local.ods").format(), SourceFormat::Spreadsheet);
        assert_eq!(DataSource::parse("local.txt").format(), SourceFormat::Csv);
    }

    #[test]
    fn missing_local_file_is_extract_error() {
        let err = DataSource::parse("/definitely/not/here.csv")
            .fetch(Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extract(_)));
    }
}
