//! Remote downloads for QR images and linked PDFs

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{Error, Result};

/// Leading bytes of every PDF file
const PDF_MAGIC: &[u8] = b"%PDF";

/// Trait for fetching remote resources
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch raw image bytes
    async fn fetch_image(&self, url: &str) -> Result<Bytes>;

    /// Download a PDF, rejecting non-200 responses and non-PDF content
    async fn download_pdf(&self, url: &str) -> Result<Bytes>;
}

/// reqwest-backed fetcher with a size cap
pub struct HttpFetcher {
    client: Client,
    max_size: usize,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_size: config.max_download_size,
        })
    }

    /// GET `url`, returning the status and body up to the size cap
    async fn get(&self, url: &str) -> std::result::Result<(u16, Bytes), String> {
        let mut response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();

        if let Some(len) = response.content_length() {
            if len as usize > self.max_size {
                return Err(format!("Response of {} bytes exceeds the {} byte limit", len, self.max_size));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            if body.len() + chunk.len() > self.max_size {
                return Err(format!("Response exceeds the {} byte limit", self.max_size));
            }
            body.extend_from_slice(&chunk);
        }

        Ok((status, body.freeze()))
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch_image(&self, url: &str) -> Result<Bytes> {
        tracing::info!("Fetching QR image from {}", url);

        let (status, body) = self
            .get(url)
            .await
            .map_err(|e| Error::InvalidImage(format!("Failed to fetch image: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(Error::InvalidImage(format!(
                "Failed to fetch image. Status code: {}",
                status
            )));
        }

        Ok(body)
    }

    async fn download_pdf(&self, url: &str) -> Result<Bytes> {
        tracing::info!("Downloading PDF from {}", url);

        let (status, body) = self.get(url).await.map_err(Error::download)?;

        check_pdf_response(status, &body)?;

        tracing::info!("Downloaded {} bytes", body.len());
        Ok(body)
    }
}

/// Accept only a 200 response whose body starts with the PDF magic
fn check_pdf_response(status: u16, body: &[u8]) -> Result<()> {
    if status != 200 {
        return Err(Error::download(format!(
            "Failed to download PDF. Status code: {}",
            status
        )));
    }
    if !body.starts_with(PDF_MAGIC) {
        return Err(Error::download("The downloaded content is not a valid PDF."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max: usize) -> HttpFetcher {
        HttpFetcher::new(&FetchConfig {
            timeout_secs: 5,
            max_download_size: max,
        })
        .unwrap()
    }

    #[test]
    fn test_check_pdf_response() {
        assert!(check_pdf_response(200, b"%PDF-1.5\n...").is_ok());
        assert!(check_pdf_response(200, b"<html>").is_err());
        assert!(check_pdf_response(201, b"%PDF-1.5").is_err());
        assert!(check_pdf_response(200, b"%PD").is_err());
    }

    #[tokio::test]
    async fn test_download_pdf_accepts_pdf() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/menu.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5 body".to_vec()))
            .mount(&server)
            .await;

        let body = fetcher(1024)
            .download_pdf(&format!("{}/menu.pdf", server.uri()))
            .await
            .unwrap();
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_download_pdf_rejects_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = fetcher(1024).download_pdf(&server.uri()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "An error occurred while downloading the PDF: The downloaded content is not a valid PDF."
        );
    }

    #[tokio::test]
    async fn test_download_pdf_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher(1024).download_pdf(&server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("Status code: 404"));
    }

    #[tokio::test]
    async fn test_download_respects_size_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'%'; 64]))
            .mount(&server)
            .await;

        let err = fetcher(16).download_pdf(&server.uri()).await.unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[tokio::test]
    async fn test_fetch_image_error_is_invalid_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetcher(1024).fetch_image(&server.uri()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }
}
