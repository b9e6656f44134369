//! HTTP API client for the Dunya docserver

use std::path::Path;

use futures::StreamExt;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::api::{endpoints, types::*};
use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::progress::create_download_progress;

/// API client for the docserver
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// A finished download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: u64,
    /// `X-Accel-Limit-Rate` sent by the server, if any
    pub limit_rate: Option<String>,
}

impl ApiClient {
    pub fn new(config: &CliConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.server_url.clone(),
            token: config.token.clone(),
        })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match self.token {
            Some(ref token) => request.header(header::AUTHORIZATION, format!("Token {}", token)),
            None => request,
        }
    }

    /// Turn an error status into the error the server described
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(CliError::from_envelope(
                status.as_u16(),
                &envelope.error.code,
                &envelope.error.message,
            )),
            Err(_) => Err(CliError::Api {
                status: status.as_u16(),
                code: status.as_str().to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string(),
            }),
        }
    }

    async fn get_data<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = Self::check(self.get(url).send().await?).await?;
        let envelope: ApiResponse<T> = response.json().await?;
        Ok(envelope.data)
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<Health> {
        let url = endpoints::health_url(&self.base_url);
        let response = Self::check(self.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        self.get_data(&endpoints::collections_url(&self.base_url)).await
    }

    pub async fn get_document(&self, mbid: &str) -> Result<Document> {
        self.get_data(&endpoints::document_url(&self.base_url, mbid)).await
    }

    /// Stream a file to `output`.
    ///
    /// When `output` is a directory the file name comes from the server's
    /// `Content-Disposition`. Nothing is written if the server refuses.
    pub async fn download(
        &self,
        url: &str,
        output: &Path,
        show_progress: bool,
    ) -> Result<(Download, std::path::PathBuf)> {
        let response = Self::check(self.get(url).send().await?).await?;

        let limit_rate = response
            .headers()
            .get("x-accel-limit-rate")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let target = if output.is_dir() {
            let name = response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(disposition_filename)
                .unwrap_or_else(|| "download".to_string());
            output.join(name)
        } else {
            output.to_path_buf()
        };

        let progress = show_progress.then(|| {
            create_download_progress(response.content_length(), &target.display().to_string())
        });

        let mut file = tokio::fs::File::create(&target).await?;
        let mut stream = response.bytes_stream();
        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
            if let Some(ref pb) = progress {
                pb.set_position(bytes);
            }
        }
        file.flush().await?;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        tracing::debug!(path = %target.display(), bytes, "Download complete");
        Ok((Download { bytes, limit_rate }, target))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// `attachment; filename="x.mp3"` -> `x.mp3`. Path separators are refused.
pub fn disposition_filename(value: &str) -> Option<String> {
    let name = value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename("attachment; filename=\"abc-filehash-blocks-1.json\""),
            Some("abc-filehash-blocks-1.json".to_string())
        );
        assert_eq!(disposition_filename("attachment"), None);
        assert_eq!(disposition_filename("attachment; filename=\"../etc/passwd\""), None);
    }
}
