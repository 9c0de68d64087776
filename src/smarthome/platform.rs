use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Serialize;

use crate::fetch::HttpClient;

use super::PowerState;

/// Reports switch state back to the smart-home platform.
#[async_trait]
pub trait SwitchPlatform: Send + Sync {
    async fn report_power_state(&self, device_id: &str, state: PowerState) -> Result<()>;
}

#[derive(Serialize)]
struct PowerStateBody {
    state: PowerState,
}

/// Posts `{ "state": "On" | "Off" }` to `<base_url>/devices/<id>/powerState`.
pub struct HttpSwitchPlatform<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> HttpSwitchPlatform<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn state_url(&self, device_id: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid smart-home API url {:?}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("smart-home API url cannot be a base"))?
            .pop_if_empty()
            .extend(["devices", device_id, "powerState"]);
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> SwitchPlatform for HttpSwitchPlatform<C> {
    #[tracing::instrument(skip(self))]
    async fn report_power_state(&self, device_id: &str, state: PowerState) -> Result<()> {
        let mut req = reqwest::Request::new(reqwest::Method::POST, self.state_url(device_id)?);
        req.headers_mut().insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        *req.body_mut() = Some(serde_json::to_vec(&PowerStateBody { state })?.into());

        let response = self
            .client
            .execute(req)
            .await
            .context("failed to send power state update")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("power state update failed with status {status}: {body}");
        }
        Ok(())
    }
}

/// Used when no platform credentials are configured; updates are dropped.
pub struct DisabledPlatform;

#[async_trait]
impl SwitchPlatform for DisabledPlatform {
    async fn report_power_state(&self, device_id: &str, state: PowerState) -> Result<()> {
        tracing::debug!(device_id, ?state, "Smart-home platform disabled, not reporting state");
        Ok(())
    }
}
