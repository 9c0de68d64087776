mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use bytes::Bytes;

use crate::error::FetchFailure;

/// Performs a single GET against `url` and returns the raw response body.
///
/// Non-2xx statuses are reported as [`FetchFailure::Status`]; there is no
/// retry.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Bytes, FetchFailure> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchFailure::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchFailure::Status {
            status: status.as_u16(),
        });
    }
    Ok(resp.bytes().await?)
}
