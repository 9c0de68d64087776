//! Spoken delivery of announcements.
//!
//! [`DeliverySink`] is the seam between the arrivals pipeline and the
//! playback device. [`CastGatewaySink`] hands a TTS URL to a cast gateway
//! that owns the device connection; [`UnconfiguredSink`] stands in when no
//! device address is set. [`spawn_delivery`] runs a delivery in the
//! background so callers never wait on playback.

pub mod tts;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};

use crate::error::DeliveryFailure;
use tts::TtsOptions;

#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryFailure>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaInfo<'a> {
    content_id: &'a str,
    content_type: &'a str,
    stream_type: &'a str,
}

#[derive(Serialize)]
struct LoadRequest<'a> {
    device: &'a str,
    media: MediaInfo<'a>,
    autoplay: bool,
}

/// Plays announcements on a cast device through an HTTP cast gateway.
pub struct CastGatewaySink {
    client: reqwest::Client,
    gateway_url: String,
    device_addr: String,
    tts: TtsOptions,
}

impl CastGatewaySink {
    pub fn new(gateway_url: String, device_addr: String, tts: TtsOptions) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            gateway_url,
            device_addr,
            tts,
        })
    }
}

#[async_trait]
impl DeliverySink for CastGatewaySink {
    #[tracing::instrument(skip(self, text), fields(device = %self.device_addr))]
    async fn deliver(&self, text: &str) -> Result<(), DeliveryFailure> {
        let url = tts::audio_url(text, &self.tts)?;

        let request = LoadRequest {
            device: &self.device_addr,
            media: MediaInfo {
                content_id: url.as_str(),
                content_type: "audio/mp3",
                stream_type: "BUFFERED",
            },
            autoplay: true,
        };

        info!(gateway = %self.gateway_url, "Connecting to cast device");
        let response = self
            .client
            .post(&self.gateway_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryFailure::Status {
                status: response.status().as_u16(),
            });
        }

        info!("Media loaded, playing announcement");
        Ok(())
    }
}

/// Sink used when no playback device is configured. Every delivery fails.
pub struct UnconfiguredSink;

#[async_trait]
impl DeliverySink for UnconfiguredSink {
    async fn deliver(&self, _text: &str) -> Result<(), DeliveryFailure> {
        Err(DeliveryFailure::NotConfigured)
    }
}

/// Starts delivering `text` in the background.
///
/// The outcome is only logged. The returned handle may be aborted; awaiting
/// it is optional.
pub fn spawn_delivery(sink: Arc<dyn DeliverySink>, text: String) -> JoinHandle<()> {
    let span = tracing::info_span!("delivery", chars = text.chars().count());
    tokio::spawn(
        async move {
            info!(message = %text, "Broadcasting");
            match sink.deliver(&text).await {
                Ok(()) => info!("Announcement delivered"),
                Err(e) => error!(error = %e, "Announcement delivery failed"),
            }
        }
        .instrument(span),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every delivered text.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn deliver(&self, text: &str) -> Result<(), DeliveryFailure> {
            self.delivered.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_spawn_delivery_reaches_sink() {
        let sink = Arc::new(RecordingSink::default());

        spawn_delivery(sink.clone(), "Next trains".to_string())
            .await
            .unwrap();

        assert_eq!(*sink.delivered.lock().unwrap(), vec!["Next trains".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_panic_task() {
        let handle = spawn_delivery(Arc::new(UnconfiguredSink), "hello".to_string());
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_failure() {
        let sink = CastGatewaySink::new(
            "http://127.0.0.1:9/cast".to_string(),
            "192.168.1.20".to_string(),
            TtsOptions::default(),
        )
        .unwrap();

        assert!(matches!(
            sink.deliver("Next trains").await,
            Err(DeliveryFailure::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_overlong_text_fails_before_network() {
        let sink = CastGatewaySink::new(
            "http://127.0.0.1:9/cast".to_string(),
            "192.168.1.20".to_string(),
            TtsOptions::default(),
        )
        .unwrap();

        assert!(matches!(
            sink.deliver(&"x".repeat(250)).await,
            Err(DeliveryFailure::TextTooLong { .. })
        ));
    }
}
