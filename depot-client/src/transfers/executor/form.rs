//! Form-encoded download fallback
//!
//! Platforms that cannot stream an arbitrary binary response fetch
//! downloads the way a hidden HTML form submission would: a urlencoded POST
//! with repeated `selected_paths` fields and the CSRF token as a form field
//! instead of a header. The body is read in one shot, so there is no
//! progress and nothing to cancel.

use depot_api::disposition::parse_content_disposition;
use depot_api::paths::sanitize_filename;
use depot_api::{CSRF_FORM_FIELD, endpoints};

use crate::api::{ApiClient, error_from_response};
use crate::transfers::types::TransferError;

/// POST the selection form and buffer the response whole.
///
/// Returns the server-provided filename (when a usable Content-Disposition
/// is present) and the raw body bytes.
pub(super) async fn fetch_selection(
    api: &ApiClient,
    paths: &[String],
    passphrase: Option<&str>,
) -> Result<(Option<String>, Vec<u8>), TransferError> {
    let mut fields: Vec<(&str, String)> = Vec::with_capacity(paths.len() + 2);
    if let Some(token) = &api.config().csrf_token {
        fields.push((CSRF_FORM_FIELD, token.clone()));
    }
    for path in paths {
        fields.push(("selected_paths", path.clone()));
    }
    if let Some(passphrase) = passphrase {
        fields.push(("passphrase", passphrase.to_string()));
    }

    // Bare .form() post, no CSRF header: this mirrors the form submission
    // the endpoint expects from degraded clients.
    let response = api
        .http()
        .post(api.url(endpoints::DOWNLOAD_SELECTED))
        .form(&fields)
        .send()
        .await?;
    read_attachment(response).await
}

/// GET the full-volume archive and buffer it whole
pub(super) async fn fetch_entire_volume(
    api: &ApiClient,
) -> Result<(Option<String>, Vec<u8>), TransferError> {
    let response = api.get(endpoints::DOWNLOAD_ALL).send().await?;
    read_attachment(response).await
}

async fn read_attachment(
    response: reqwest::Response,
) -> Result<(Option<String>, Vec<u8>), TransferError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let file_name = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition)
        .and_then(|name| sanitize_filename(&name));
    let body = response
        .bytes()
        .await
        .map_err(|e| TransferError::Network(e.to_string()))?;
    Ok((file_name, body.to_vec()))
}
