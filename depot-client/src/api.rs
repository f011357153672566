//! HTTP session for the Depot REST API
//!
//! One `ApiClient` wraps a shared connection pool plus everything needed to
//! talk to a single server: base URL joining, CSRF header injection, and
//! mapping of `{error}` bodies into `TransferError`. Transfer payloads
//! stream through the executor; the typed management calls live here.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::warn;

use depot_api::types::{
    CreateFileRequest, CreateFolderRequest, DeleteRequest, DeleteResponse, DirectoryListing,
    MoveItemsRequest, MoveItemsResponse,
};
use depot_api::{CSRF_HEADER, STATUS_MULTI_STATUS, endpoints};

use crate::config::ClientConfig;
use crate::transfers::{BatchOutcome, TransferError};

/// HTTP session bound to one server
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build the session from a config.
    ///
    /// Fails only if the TLS backend cannot initialize.
    pub fn new(config: ClientConfig) -> Result<Self, TransferError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransferError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Raw client, for requests that must not carry the CSRF header
    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Absolute URL for an endpoint path
    pub(crate) fn url(&self, endpoint: &str) -> String {
        endpoints::join(&self.config.base_url, endpoint)
    }

    /// GET builder for an endpoint
    pub(crate) fn get(&self, endpoint: &str) -> RequestBuilder {
        self.http.get(self.url(endpoint))
    }

    /// POST builder with the CSRF header attached when the config has a token
    pub(crate) fn post(&self, endpoint: &str) -> RequestBuilder {
        let mut builder = self.http.post(self.url(endpoint));
        if let Some(token) = &self.config.csrf_token {
            builder = builder.header(CSRF_HEADER, token);
        }
        builder
    }

    // =========================================================================
    // Listing and search
    // =========================================================================

    /// List one directory of the volume
    pub async fn list(&self, path: &str) -> Result<DirectoryListing, TransferError> {
        let response = self
            .get(endpoints::LIST)
            .query(&[("path", path)])
            .send()
            .await?;
        read_json(response).await
    }

    /// Search the whole volume by name substring
    pub async fn search(&self, query: &str) -> Result<DirectoryListing, TransferError> {
        let response = self
            .get(endpoints::SEARCH)
            .query(&[("query", query)])
            .send()
            .await?;
        read_json(response).await
    }

    // =========================================================================
    // Batch operations
    // =========================================================================

    /// Delete files and directories.
    ///
    /// A 200 returns the outcome with every path in `succeeded`; a 207
    /// becomes `TransferError::Partial` carrying both sets.
    pub async fn delete_items(&self, paths: &[String]) -> Result<BatchOutcome, TransferError> {
        let request = DeleteRequest {
            path: paths.to_vec(),
        };
        let response = self.post(endpoints::DELETE).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }
        let body: DeleteResponse = decode_json(response).await?;
        split_batch(
            status,
            BatchOutcome {
                succeeded: body.deleted,
                failed: body.errors,
            },
        )
    }

    /// Move files and directories into a destination directory
    pub async fn move_items(
        &self,
        source_paths: &[String],
        destination_path: &str,
    ) -> Result<BatchOutcome, TransferError> {
        let request = MoveItemsRequest {
            source_paths: source_paths.to_vec(),
            destination_path: destination_path.to_string(),
        };
        let response = self
            .post(endpoints::MOVE_ITEMS)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }
        let body: MoveItemsResponse = decode_json(response).await?;
        split_batch(
            status,
            BatchOutcome {
                succeeded: body.moved,
                failed: body.errors,
            },
        )
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create an empty folder under `path`
    pub async fn create_folder(&self, path: &str, folder_name: &str) -> Result<(), TransferError> {
        let request = CreateFolderRequest {
            path: path.to_string(),
            folder_name: folder_name.to_string(),
        };
        let response = self
            .post(endpoints::CREATE_FOLDER)
            .json(&request)
            .send()
            .await?;
        expect_success(response).await
    }

    /// Create an empty file under `path`
    pub async fn create_file(&self, path: &str, file_name: &str) -> Result<(), TransferError> {
        let request = CreateFileRequest {
            path: path.to_string(),
            file_name: file_name.to_string(),
        };
        let response = self
            .post(endpoints::CREATE_FILE)
            .json(&request)
            .send()
            .await?;
        expect_success(response).await
    }
}

// =============================================================================
// Response helpers
// =============================================================================

/// Turn an error response into a `TransferError::Server`, preferring the
/// server's own `{error}` text over a generic message
pub(crate) async fn error_from_response(response: Response) -> TransferError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = depot_api::types::error_message(&body)
        .unwrap_or_else(|| format!("request failed with status {status}"));
    warn!(status, "server error: {message}");
    TransferError::Server { status, message }
}

/// Check the status and decode a JSON body
async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, TransferError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    decode_json(response).await
}

/// Decode a JSON body from an already status-checked response
async fn decode_json<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, TransferError> {
    let status = response.status().as_u16();
    response
        .json::<T>()
        .await
        .map_err(|e| TransferError::Server {
            status,
            message: format!("malformed response body: {e}"),
        })
}

/// Accept any 2xx and discard the body
async fn expect_success(response: Response) -> Result<(), TransferError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response).await)
    }
}

/// Split a 2xx batch response on the 200/207 line
fn split_batch(status: StatusCode, outcome: BatchOutcome) -> Result<BatchOutcome, TransferError> {
    if status.as_u16() == STATUS_MULTI_STATUS {
        Err(TransferError::Partial(outcome))
    } else {
        Ok(outcome)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(csrf_token: Option<&str>) -> ApiClient {
        let mut config = ClientConfig::new("http://localhost:5000");
        config.csrf_token = csrf_token.map(str::to_string);
        ApiClient::new(config).expect("build client")
    }

    #[test]
    fn test_url_joins_base_and_endpoint() {
        let api = test_client(None);
        assert_eq!(api.url(endpoints::DELETE), "http://localhost:5000/delete");

        let api = ApiClient::new(ClientConfig::new("http://localhost:5000/")).expect("client");
        assert_eq!(api.url(endpoints::LIST), "http://localhost:5000/api/list");
    }

    #[test]
    fn test_post_attaches_csrf_header() {
        let api = test_client(Some("tok-123"));
        let request = api.post(endpoints::DELETE).build().expect("build request");
        assert_eq!(
            request
                .headers()
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("tok-123")
        );
    }

    #[test]
    fn test_post_without_token_has_no_header() {
        let api = test_client(None);
        let request = api.post(endpoints::UPLOAD).build().expect("build request");
        assert!(request.headers().get(CSRF_HEADER).is_none());
    }

    #[test]
    fn test_delete_body_uses_path_key() {
        let api = test_client(None);
        let request = api
            .post(endpoints::DELETE)
            .json(&DeleteRequest {
                path: vec!["old.log".to_string()],
            })
            .build()
            .expect("build request");
        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .expect("buffered body");
        assert_eq!(body, br#"{"path":["old.log"]}"#);
    }

    #[test]
    fn test_list_query_parameter() {
        let api = test_client(None);
        let request = api
            .get(endpoints::LIST)
            .query(&[("path", "Documents/Work")])
            .build()
            .expect("build request");
        assert_eq!(
            request.url().query(),
            Some("path=Documents%2FWork")
        );
    }

    #[test]
    fn test_split_batch_200_is_ok() {
        let outcome = BatchOutcome {
            succeeded: vec!["a".to_string()],
            failed: vec![],
        };
        assert!(split_batch(StatusCode::OK, outcome).is_ok());
    }

    #[test]
    fn test_split_batch_207_is_partial_error() {
        let outcome = BatchOutcome {
            succeeded: vec!["a".to_string()],
            failed: vec![depot_api::types::ItemFailure {
                path: "b".to_string(),
                error: "denied".to_string(),
            }],
        };
        let result = split_batch(StatusCode::MULTI_STATUS, outcome);
        match result {
            Err(TransferError::Partial(out)) => {
                assert_eq!(out.succeeded, vec!["a"]);
                assert_eq!(out.failed.len(), 1);
            }
            other => panic!("expected partial error, got {other:?}"),
        }
    }
}
