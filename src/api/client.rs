//! HTTP client for the update endpoint, `UpdateApiClient`.
//!
//! Turns an [`UpdateRequest`] into a multipart POST and returns the encoded
//! transaction from the response. Signing and submission happen elsewhere.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::api::request::{FormPart, PartBody, UpdateRequest};
use crate::api::wire::{ApiErrorBody, UpdateResponse};
use crate::error::HttpError;
use crate::network::UPDATE_PATH;
use crate::tx::EncodedTransaction;

/// Anything that can turn an update request into an encoded transaction.
#[allow(async_fn_in_trait)]
pub trait UpdateApi {
    async fn request_update(&self, request: &UpdateRequest) -> Result<EncodedTransaction, HttpError>;
}

/// Client for the remote NFT update API.
#[derive(Clone)]
pub struct UpdateApiClient {
    base_url: String,
    /// Sent as `x-api-key`. Never logged.
    api_key: String,
    client: Client,
}

impl UpdateApiClient {
    /// `timeout` of `None` leaves the transport default in place.
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self, HttpError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn update_url(&self) -> String {
        format!("{}{}", self.base_url, UPDATE_PATH)
    }

    async fn send_update(&self, request: &UpdateRequest) -> Result<EncodedTransaction, HttpError> {
        let parts = request.form_parts();
        tracing::debug!(
            token = %request.token_address,
            network = %request.network,
            fields = ?parts.iter().map(|p| p.name).collect::<Vec<_>>(),
            "Sending update request"
        );
        let form = build_form(parts).await?;

        let resp = self
            .client
            .post(self.update_url())
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<UpdateResponse>().await?;
            return extract_encoded_transaction(parsed);
        }

        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect::<Vec<_>>();
        tracing::debug!(status = status.as_u16(), ?headers, "Update request rejected");
        let body_text = resp.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), headers, body_text))
    }
}

/// Map a non-success response to an [`HttpError`].
pub fn error_from_response(status: u16, headers: Vec<(String, String)>, body: String) -> HttpError {
    let message = ApiErrorBody::message_from(&body);
    match status {
        401 => HttpError::Unauthorized(message.unwrap_or(body)),
        429 => HttpError::RateLimited(message.unwrap_or(body)),
        _ => HttpError::Rejected {
            status,
            message,
            headers,
            body,
        },
    }
}

impl UpdateApi for UpdateApiClient {
    async fn request_update(&self, request: &UpdateRequest) -> Result<EncodedTransaction, HttpError> {
        self.send_update(request).await
    }
}

impl std::fmt::Debug for UpdateApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Build the multipart body, reading file parts from disk.
pub async fn build_form(parts: Vec<FormPart>) -> Result<Form, HttpError> {
    let mut form = Form::new();
    for part in parts {
        form = match part.body {
            PartBody::Text(value) | PartBody::Json(value) | PartBody::RawJson(value) => {
                form.text(part.name, value)
            }
            PartBody::File(path) => form.part(part.name, file_part(&path).await?),
        };
    }
    Ok(form)
}

async fn file_part(path: &Path) -> Result<Part, HttpError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| HttpError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}

/// Pull `result.encoded_transaction` out of a success body.
pub fn extract_encoded_transaction(resp: UpdateResponse) -> Result<EncodedTransaction, HttpError> {
    resp.result
        .and_then(|r| r.encoded_transaction)
        .filter(|tx| !tx.is_empty())
        .map(EncodedTransaction::new)
        .ok_or(HttpError::MissingEncodedTransaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::UpdateField;
    use crate::api::wire::UpdateResult;
    use crate::network::Network;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const TOKEN: &str = "7BgBvyjrZX1YKz4oh9mjb8ZScatkkwb8DzFx7LoiVkM3";
    const AUTHORITY: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    /// Answer one HTTP request with `status` and `body`, returning the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\nx-request-id: req-42\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });
        (url, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            let Some(end) = text.find("\r\n\r\n") else {
                continue;
            };
            let head = text[..end].to_ascii_lowercase();
            let received = buf.len() - end - 4;
            let complete = match head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
            {
                Some(len) => received >= len.trim().parse::<usize>().unwrap(),
                None => text.ends_with("0\r\n\r\n"),
            };
            if complete {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn request() -> UpdateRequest {
        UpdateRequest::new(Network::Devnet, TOKEN, AUTHORITY)
            .with(UpdateField::Name, "Renamed")
            .with(UpdateField::Symbol, "")
            .with(UpdateField::Description, "")
    }

    #[tokio::test]
    async fn test_request_update_sends_key_and_only_set_fields() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"success":true,"result":{"encoded_transaction":"AQID"}}"#,
        )
        .await;
        let client = UpdateApiClient::new(&url, "secret-key", Some(Duration::from_secs(5))).unwrap();

        let encoded = client.request_update(&request()).await.unwrap();
        assert_eq!(encoded.as_str(), "AQID");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /sol/v2/nft/update HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("x-api-key: secret-key"));
        assert_eq!(raw.matches("form-data; name=").count(), 4);
        assert!(raw.contains(r#"name="network""#));
        assert!(raw.contains(r#"name="token_address""#));
        assert!(raw.contains(r#"name="update_authority_address""#));
        assert!(raw.contains(r#"name="name""#));
        assert!(raw.contains("Renamed"));
        assert!(!raw.contains(r#"name="symbol""#));
        assert!(!raw.contains(r#"name="description""#));
    }

    #[tokio::test]
    async fn test_unauthorized_response() {
        let (url, _server) = serve_once(
            "401 Unauthorized",
            r#"{"success":false,"message":"Invalid API key"}"#,
        )
        .await;
        let client = UpdateApiClient::new(&url, "wrong", None).unwrap();

        match client.request_update(&request()).await.unwrap_err() {
            HttpError::Unauthorized(msg) => assert_eq!(msg, "Invalid API key"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let (url, _server) = serve_once("429 Too Many Requests", "slow down").await;
        let client = UpdateApiClient::new(&url, "key", None).unwrap();

        match client.request_update(&request()).await.unwrap_err() {
            HttpError::RateLimited(msg) => assert_eq!(msg, "slow down"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_response_keeps_status_headers_and_body() {
        let body = r#"{"success":false,"message":"Update authority mismatch"}"#;
        let (url, _server) = serve_once("400 Bad Request", body).await;
        let client = UpdateApiClient::new(&url, "key", None).unwrap();

        match client.request_update(&request()).await.unwrap_err() {
            HttpError::Rejected {
                status,
                message,
                headers,
                body: received,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("Update authority mismatch"));
                assert_eq!(received, body);
                assert!(headers
                    .iter()
                    .any(|(name, value)| name == "x-request-id" && value == "req-42"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_without_transaction() {
        let (url, _server) = serve_once("200 OK", r#"{"success":true,"result":{}}"#).await;
        let client = UpdateApiClient::new(&url, "key", None).unwrap();

        assert!(matches!(
            client.request_update(&request()).await,
            Err(HttpError::MissingEncodedTransaction)
        ));
    }

    #[test]
    fn test_error_from_response_without_json_body() {
        match error_from_response(502, vec![], "Bad Gateway".to_string()) {
            HttpError::Rejected { status, message, body, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, None);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            error_from_response(401, vec![], String::new()),
            HttpError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_update_url_trims_trailing_slash() {
        let client = UpdateApiClient::new("https://api.shyft.to/", "key", None).unwrap();
        assert_eq!(client.update_url(), "https://api.shyft.to/sol/v2/nft/update");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = UpdateApiClient::new("https://api.shyft.to", "super-secret", None).unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }

    #[test]
    fn test_extract_encoded_transaction() {
        let ok = UpdateResponse {
            success: Some(true),
            message: None,
            result: Some(UpdateResult {
                encoded_transaction: Some("AQID".to_string()),
                mint: None,
            }),
        };
        assert_eq!(extract_encoded_transaction(ok).unwrap().as_str(), "AQID");

        let missing = UpdateResponse {
            success: Some(true),
            message: None,
            result: Some(UpdateResult {
                encoded_transaction: None,
                mint: None,
            }),
        };
        assert!(matches!(
            extract_encoded_transaction(missing),
            Err(HttpError::MissingEncodedTransaction)
        ));

        let empty = UpdateResponse {
            success: Some(true),
            message: None,
            result: Some(UpdateResult {
                encoded_transaction: Some(String::new()),
                mint: None,
            }),
        };
        assert!(extract_encoded_transaction(empty).is_err());
    }

    #[tokio::test]
    async fn test_build_form_reports_missing_file() {
        let request = UpdateRequest::new(Network::Devnet, "token", "authority")
            .with(UpdateField::Image, "/definitely/not/here.png");
        let err = build_form(request.form_parts()).await.unwrap_err();
        match err {
            HttpError::File { path, .. } => {
                assert_eq!(path, std::path::PathBuf::from("/definitely/not/here.png"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_build_form_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let request = UpdateRequest::new(Network::Devnet, "token", "authority")
            .with(UpdateField::Image, path.to_string_lossy());
        assert!(build_form(request.form_parts()).await.is_ok());
    }
}
