//! `dunya download <mbid> <slug>`

use std::path::PathBuf;

use colored::Colorize;
use dunya_common::checksum::verify_file_checksum;
use dunya_common::types::ExternalId;
use dunya_common::DunyaError;

use crate::api::{endpoints, ApiClient};
use crate::error::{CliError, Result};
use crate::progress::format_bytes;

#[derive(Debug, Clone, Default)]
pub struct DownloadArgs {
    pub mbid: String,
    pub slug: String,
    pub subtype: Option<String>,
    pub part: Option<u32>,
    pub version: Option<String>,
    pub output: Option<String>,
    /// Expected SHA-256 of the downloaded file
    pub sha256: Option<String>,
}

pub async fn run(client: &ApiClient, args: DownloadArgs, show_progress: bool) -> Result<PathBuf> {
    let id: ExternalId = args.mbid.parse()?;
    let url = endpoints::download_url(
        client.base_url(),
        id.as_str(),
        &args.slug,
        args.subtype.as_deref(),
        args.part,
        args.version.as_deref(),
    );
    let output = args.output.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let (download, path) = client.download(&url, &output, show_progress).await?;
    if let Some(expected) = args.sha256.as_deref() {
        verify_download(&path, expected)?;
    }
    if show_progress {
        println!(
            "{} {} ({})",
            "Saved".green(),
            path.display(),
            format_bytes(download.bytes)
        );
    }
    if let Some(rate) = download.limit_rate.filter(|r| r != "off") {
        tracing::info!(rate = %rate, "Server rate limits this file");
    }
    Ok(path)
}

/// Check a finished download; a mismatching file is deleted
fn verify_download(path: &std::path::Path, expected: &str) -> Result<()> {
    match verify_file_checksum(path, expected) {
        Ok(()) => Ok(()),
        Err(DunyaError::ChecksumMismatch { expected, actual }) => {
            std::fs::remove_file(path)?;
            Err(CliError::ChecksumMismatch { expected, actual })
        },
        Err(DunyaError::Io(e)) => Err(CliError::Io(e)),
        Err(other) => Err(CliError::Config(other.to_string())),
    }
}
