//! Screenshot dispatch: wraps captured PNG bytes as a multipart upload and
//! forwards them to the external media-upload endpoint. Whatever status and
//! body the endpoint answers with is passed through verbatim as this
//! service's own response.

use crate::error::Result;
use reqwest::header;
use reqwest::multipart::{Form, Part};
use std::time::{SystemTime, UNIX_EPOCH};

/// Media-upload endpoint used when none is configured
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://telegra.ph/upload";

// The endpoint rejects obviously non-browser clients, so the request
// carries a desktop Chrome identity.
const UPLOAD_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";
const UPLOAD_REFERER: &str = "https://telegra.ph/";

/// The upstream's verbatim answer, forwarded as our response
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Client for the media-upload collaborator
#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    endpoint: String,
}

impl Uploader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload PNG bytes under the multipart field `file`. Returns the
    /// upstream status/body pair for passthrough; a transport-level failure
    /// (no response at all) surfaces as an error.
    pub async fn upload_png(&self, png: Vec<u8>) -> Result<UploadResponse> {
        let filename = screenshot_filename(now_millis());
        let size = png.len();

        let part = Part::bytes(png)
            .file_name(filename.clone())
            .mime_str("image/png")?;
        let form = Form::new().part("file", part);

        log::debug!(
            "uploading {} ({} bytes) to {}",
            filename,
            size,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::USER_AGENT, UPLOAD_USER_AGENT)
            .header(header::REFERER, UPLOAD_REFERER)
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await?.to_vec();

        log::info!(
            "upload endpoint answered {} ({} bytes) for {}",
            status,
            body.len(),
            filename
        );

        Ok(UploadResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Filename embedding the capture timestamp in unix milliseconds
pub fn screenshot_filename(unix_millis: u128) -> String {
    format!("screenshot-{}.png", unix_millis)
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_embeds_timestamp() {
        assert_eq!(
            screenshot_filename(1_700_000_000_123),
            "screenshot-1700000000123.png"
        );
    }

    #[tokio::test]
    async fn test_upload_passes_upstream_response_through() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"src":"/file/abc.png"}]"#)
            .create_async()
            .await;

        let uploader = Uploader::new(format!("{}/upload", server.url()));
        let response = uploader.upload_png(vec![0x89, b'P', b'N', b'G']).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(response.body, br#"[{"src":"/file/abc.png"}]"#.to_vec());
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_preserved_not_raised() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .with_status(403)
            .with_body(r#"{"error":"denied"}"#)
            .create_async()
            .await;

        let uploader = Uploader::new(format!("{}/upload", server.url()));
        let response = uploader.upload_png(vec![1, 2, 3]).await.unwrap();

        // An upstream 4xx/5xx is still a response; only transport failures error
        assert_eq!(response.status, 403);
        assert_eq!(response.body, br#"{"error":"denied"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        // Nothing listens here
        let uploader = Uploader::new("http://127.0.0.1:9/upload");
        let result = uploader.upload_png(vec![1, 2, 3]).await;
        assert!(result.is_err());
    }
}
