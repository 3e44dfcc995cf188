//! Multipart asset uploads
//!
//! Assets (screenshots, previews) are uploaded in three steps: reserve the
//! asset to get its upload operations, send each byte range to the URL the
//! operation names, then commit with the file checksum.

use std::time::Duration;

use appconnect_core::UploadRetryConfig;
use md5::{Digest, Md5};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::jsonapi::{create_body, update_body, Resource};
use crate::transport::{HttpRequest, Transport};

/// One byte range to upload, as returned by a reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOperation {
    pub method: String,
    pub url: String,
    pub offset: u64,
    pub length: u64,
    #[serde(default)]
    pub request_headers: Vec<UploadHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHeader {
    pub name: String,
    pub value: String,
}

/// Retry policy for a single chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRetry {
    /// Attempts including the first
    pub attempts: u32,
    pub delay: Duration,
}

impl From<UploadRetryConfig> for UploadRetry {
    fn from(config: UploadRetryConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            delay: Duration::from_secs(config.sleep_secs),
        }
    }
}

impl Default for UploadRetry {
    fn default() -> Self {
        UploadRetryConfig::default().into()
    }
}

/// Lowercase hex MD5 of `data`
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Send every operation's slice of `data`
pub async fn upload_parts(
    transport: &dyn Transport,
    operations: &[UploadOperation],
    data: &[u8],
    retry: UploadRetry,
) -> Result<()> {
    for (index, operation) in operations.iter().enumerate() {
        let chunk = slice(data, operation)?;
        debug!(
            part = index + 1,
            total = operations.len(),
            offset = operation.offset,
            length = operation.length,
            "uploading part"
        );
        upload_part(transport, operation, chunk, retry).await?;
    }
    Ok(())
}

fn slice<'a>(data: &'a [u8], operation: &UploadOperation) -> Result<&'a [u8]> {
    let start = usize::try_from(operation.offset).ok();
    let end = start.and_then(|s| s.checked_add(usize::try_from(operation.length).ok()?));

    match (start, end) {
        (Some(start), Some(end)) if end <= data.len() => Ok(&data[start..end]),
        _ => Err(Error::UploadFailed(format!(
            "upload operation range {}+{} exceeds file size {}",
            operation.offset,
            operation.length,
            data.len()
        ))),
    }
}

async fn upload_part(
    transport: &dyn Transport,
    operation: &UploadOperation,
    chunk: &[u8],
    retry: UploadRetry,
) -> Result<()> {
    let method = Method::from_bytes(operation.method.as_bytes())
        .map_err(|_| Error::UploadFailed(format!("invalid upload method '{}'", operation.method)))?;
    let url = Url::parse(&operation.url)?;

    let mut attempt = 1;
    loop {
        let mut request = HttpRequest::new(method.clone(), url.clone()).body(chunk.to_vec());
        for header in &operation.request_headers {
            request = request.header(&header.name, &header.value);
        }

        let failure = match transport.execute(request).await {
            Ok(response) if response.is_success() => return Ok(()),
            Ok(response) if response.status < 500 => {
                return Err(Error::UploadFailed(format!(
                    "upload of bytes {}..{} rejected with HTTP {}",
                    operation.offset,
                    operation.offset + operation.length,
                    response.status
                )));
            }
            Ok(response) => format!("HTTP {}", response.status),
            Err(e) => e.to_string(),
        };

        if attempt >= retry.attempts {
            return Err(Error::UploadFailed(format!(
                "upload of bytes {}..{} failed after {} attempts: {}",
                operation.offset,
                operation.offset + operation.length,
                attempt,
                failure
            )));
        }

        warn!(attempt, max = retry.attempts, error = %failure, "upload part failed, retrying");
        tokio::time::sleep(retry.delay).await;
        attempt += 1;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reservation {
    #[serde(default)]
    upload_operations: Vec<UploadOperation>,
}

impl Client {
    /// Reserve, upload and commit an asset.
    ///
    /// `kind` is the asset resource type (e.g. `appScreenshots`) and
    /// `relationships` links it to its parent.
    #[instrument(skip(self, relationships, data), fields(size = data.len()))]
    pub async fn upload_asset<A>(
        &self,
        kind: &str,
        file_name: &str,
        data: &[u8],
        relationships: Value,
    ) -> Result<Resource<A>>
    where
        A: DeserializeOwned + Default,
    {
        let path = format!("/{}", kind);
        let body = create_body(
            kind,
            json!({ "fileName": file_name, "fileSize": data.len() }),
            relationships,
        );
        let reserved: Resource<Reservation> = self.post(&path, &body).await?;
        let operations = reserved.attributes.upload_operations;
        if operations.is_empty() {
            return Err(Error::UploadFailed(format!(
                "reservation for {} returned no upload operations",
                file_name
            )));
        }

        upload_parts(
            self.transport(),
            &operations,
            data,
            self.config().upload.into(),
        )
        .await?;

        let commit = update_body(
            kind,
            &reserved.id,
            json!({ "uploaded": true, "sourceFileChecksum": md5_hex(data) }),
        );
        let committed = self.patch(&format!("{}/{}", path, reserved.id), &commit).await?;

        info!(id = %reserved.id, file = file_name, parts = operations.len(), "uploaded asset");
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{fixture_with, MockTransport};
    use crate::transport::HttpResponse;

    fn operation(offset: u64, length: u64) -> UploadOperation {
        UploadOperation {
            method: "PUT".to_string(),
            url: format!("https://upload.example.test/part?o={}", offset),
            offset,
            length,
            request_headers: vec![UploadHeader {
                name: "Content-Type".to_string(),
                value: "image/png".to_string(),
            }],
        }
    }

    fn no_delay(attempts: u32) -> UploadRetry {
        UploadRetry {
            attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_retry_from_config() {
        let retry = UploadRetry::from(UploadRetryConfig { attempts: 0, sleep_secs: 4 });
        assert_eq!(retry.attempts, 1);
        assert_eq!(retry.delay, Duration::from_secs(4));
    }

    #[test]
    fn test_operation_deserializes() {
        let op: UploadOperation = serde_json::from_value(json!({
            "method": "PUT",
            "url": "https://upload.example.test/x",
            "offset": 0,
            "length": 10,
            "requestHeaders": [{ "name": "Content-Type", "value": "image/png" }]
        }))
        .unwrap();
        assert_eq!(op.request_headers[0].value, "image/png");
    }

    #[tokio::test]
    async fn test_parts_send_slices_without_bearer() {
        let transport = MockTransport::with(vec![
            Ok(HttpResponse::new(200, "")),
            Ok(HttpResponse::new(200, "")),
        ]);
        let data = b"0123456789";

        upload_parts(transport.as_ref(), &[operation(0, 6), operation(6, 4)], data, no_delay(3))
            .await
            .unwrap();

        let requests = transport.recorded();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].body.as_deref(), Some(&b"012345"[..]));
        assert_eq!(requests[1].body.as_deref(), Some(&b"6789"[..]));
        assert_eq!(requests[1].header_value("Content-Type"), Some("image/png"));
        assert!(requests[0].header_value("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_part_retries_exactly_attempts_times() {
        let transport = MockTransport::with(vec![
            Ok(HttpResponse::new(503, "")),
            Ok(HttpResponse::new(502, "")),
            Ok(HttpResponse::new(500, "")),
            Ok(HttpResponse::new(200, "")),
        ]);

        let err = upload_parts(transport.as_ref(), &[operation(0, 4)], b"data", no_delay(3))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UploadFailed(ref m) if m.contains("after 3 attempts")));
        assert_eq!(transport.recorded().len(), 3);
    }

    #[tokio::test]
    async fn test_part_recovers_after_transient_failure() {
        let transport = MockTransport::with(vec![
            Err(Error::UnexpectedResponse("connection reset".to_string())),
            Ok(HttpResponse::new(200, "")),
        ]);

        upload_parts(transport.as_ref(), &[operation(0, 4)], b"data", no_delay(3))
            .await
            .unwrap();
        assert_eq!(transport.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let transport = MockTransport::with(vec![Ok(HttpResponse::new(403, ""))]);
        let err = upload_parts(transport.as_ref(), &[operation(0, 4)], b"data", no_delay(3))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadFailed(ref m) if m.contains("HTTP 403")));
        assert_eq!(transport.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_range_outside_file_fails_before_sending() {
        let transport = MockTransport::with(vec![]);
        let err = upload_parts(transport.as_ref(), &[operation(2, 10)], b"data", no_delay(3))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadFailed(_)));
        assert!(transport.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_upload_asset_reserve_upload_commit() {
        let data = b"PNGDATA!";
        let transport = MockTransport::with(vec![
            Ok(HttpResponse::new(
                201,
                json!({ "data": {
                    "type": "appScreenshots",
                    "id": "shot-1",
                    "attributes": {
                        "fileName": "home.png",
                        "uploadOperations": [{
                            "method": "PUT",
                            "url": "https://upload.example.test/shot-1",
                            "offset": 0,
                            "length": 8,
                            "requestHeaders": []
                        }]
                    }
                }})
                .to_string(),
            )),
            Ok(HttpResponse::new(200, "")),
            Ok(HttpResponse::new(
                200,
                json!({ "data": { "type": "appScreenshots", "id": "shot-1", "attributes": { "fileName": "home.png" } } })
                    .to_string(),
            )),
        ]);
        let fx = fixture_with(transport, |_| {});

        let shot: Resource<Value> = fx
            .client
            .upload_asset(
                "appScreenshots",
                "home.png",
                data,
                json!({ "appScreenshotSet": crate::jsonapi::to_one("appScreenshotSets", "set-1") }),
            )
            .await
            .unwrap();
        assert_eq!(shot.id, "shot-1");

        let requests = fx.transport.recorded();
        assert_eq!(requests.len(), 3);

        let reserve: Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(reserve["data"]["attributes"]["fileSize"], 8);
        assert_eq!(reserve["data"]["relationships"]["appScreenshotSet"]["data"]["id"], "set-1");

        assert_eq!(requests[1].url.host_str(), Some("upload.example.test"));

        assert_eq!(requests[2].method, Method::PATCH);
        assert_eq!(requests[2].url.path(), "/v1/appScreenshots/shot-1");
        let commit: Value = serde_json::from_slice(requests[2].body.as_ref().unwrap()).unwrap();
        assert_eq!(commit["data"]["attributes"]["uploaded"], true);
        assert_eq!(commit["data"]["attributes"]["sourceFileChecksum"], md5_hex(data));
    }
}
