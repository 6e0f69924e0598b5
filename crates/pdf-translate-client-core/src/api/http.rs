use async_trait::async_trait;
use reqwest::{Client, Response, Url, multipart};
use std::time::Duration;
use tracing::{debug, warn};

use crate::document::{FileId, PdfFile, TranslationResult, UploadedDocument};
use crate::error::{Error, Result};

use super::traits::{Backend, ServiceStatus};
use super::types::{ErrorBody, LanguagesResponse, StatusResponse, TranslateResponse, UploadResponse};

const UPLOAD_FALLBACK: &str = "Upload failed";
const TRANSLATE_FALLBACK: &str = "Translation failed";
const FETCH_FALLBACK: &str = "Failed to fetch translation data";
const DOWNLOAD_FALLBACK: &str = "Download failed";

/// reqwest-backed client for the translation service.
///
/// Requests carry no overall timeout: a translate call lasts as long as the
/// server needs to translate every page.
pub struct HttpBackend {
    client: Client,
    /// Always ends with `/` so relative joins keep any path prefix
    base: Url,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self> {
        let mut base = Url::parse(server_url).map_err(|e| Error::ConfigInvalid {
            field: "server_url".to_string(),
            reason: e.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::InvalidInput(format!("Invalid URL '{path}': {e}")))
    }

    /// Turn a non-success response into a server error, preferring its `detail`.
    async fn server_error(response: Response, fallback: &str) -> Error {
        let status = response.status();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        let message = body.detail().unwrap_or(fallback).to_string();
        warn!("API error: {} - {}", status, message);

        Error::Server {
            status: status.as_u16(),
            message,
        }
        .classify()
    }

    async fn checked(response: Response, fallback: &str) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::server_error(response, fallback).await)
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn status(&self) -> Result<ServiceStatus> {
        let url = self.endpoint("api/status")?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::checked(response, "Status check failed").await?;
        Ok(response.json::<StatusResponse>().await?.into())
    }

    async fn languages(&self) -> Result<Vec<String>> {
        let url = self.endpoint("api/languages")?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::checked(response, "Failed to fetch languages").await?;
        Ok(response.json::<LanguagesResponse>().await?.languages)
    }

    async fn upload(&self, file: &PdfFile) -> Result<UploadedDocument> {
        let url = self.endpoint("api/upload")?;
        debug!("POST {} ({}, {} bytes)", url, file.name, file.bytes.len());

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|e| Error::InvalidInput(format!("Invalid media type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let response = Self::checked(response, UPLOAD_FALLBACK).await?;
        let upload = response.json::<UploadResponse>().await?;
        Ok(upload.into_document(file.name.clone()))
    }

    async fn translate(
        &self,
        file_id: &FileId,
        target_language: &str,
    ) -> Result<TranslationResult> {
        let url = self.endpoint("api/translate")?;
        debug!("POST {} (file_id={}, target_language={})", url, file_id, target_language);

        let response = self
            .client
            .post(url)
            .form(&[("file_id", file_id.as_str()), ("target_language", target_language)])
            .send()
            .await?;
        let response = Self::checked(response, TRANSLATE_FALLBACK).await?;
        Ok(response.json::<TranslateResponse>().await?.into())
    }

    async fn fetch_translation(
        &self,
        file_id: &FileId,
        target_language: &str,
    ) -> Result<TranslationResult> {
        let url = self.endpoint("api/translate")?;
        debug!("GET {} (file_id={}, target_language={})", url, file_id, target_language);

        let response = self
            .client
            .get(url)
            .query(&[("file_id", file_id.as_str()), ("target_language", target_language)])
            .send()
            .await?;
        let response = Self::checked(response, FETCH_FALLBACK).await?;
        Ok(response.json::<TranslateResponse>().await?.into())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(url)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::checked(response, DOWNLOAD_FALLBACK).await?;
        Ok(response.bytes().await?.to_vec())
    }

    fn resolve_url(&self, url: &str) -> String {
        self.endpoint(url)
            .map_or_else(|_| url.to_string(), |resolved| resolved.to_string())
    }

    fn channel_url(&self, file_id: &FileId) -> Result<String> {
        let path = format!("api/ws/translate/{}", urlencoding::encode(file_id.as_str()));
        let mut url = self.endpoint(&path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::Channel(format!("Cannot derive channel URL from {url}")))?;

        Ok(url.to_string())
    }
}
