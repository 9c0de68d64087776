//! Environment-driven configuration.
//!
//! Values come from the process environment (optionally seeded from a
//! `.env` file by the binary). Every setting has a default except the
//! credentials and device ids, which switch features off when absent.

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::arrivals::Direction;
use crate::delivery::tts::TtsOptions;
use crate::pipeline::FeedSource;
use crate::smarthome::{Binding, DeviceRegistry};

pub const DEFAULT_ACE_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-ace";
pub const DEFAULT_BDFM_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-bdfm";

#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Stop id prefix of the station, e.g. `A17`.
    pub id: String,
    /// Name used in JSON responses.
    pub name: String,
    /// Name used in spoken announcements.
    pub spoken_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub sources: Vec<FeedSource>,
    pub feed_api_key: Option<String>,
    pub station: StationConfig,
    pub device_addr: Option<String>,
    pub cast_gateway_url: String,
    pub tts: TtsOptions,
    pub smart_home_api_url: Option<String>,
    pub smart_home_api_key: Option<String>,
    pub devices: DeviceRegistry,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = match get("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?,
            None => 3001,
        };

        let devices = match get("DEVICE_REGISTRY_PATH") {
            Some(path) => DeviceRegistry::load(&path)?,
            None => {
                let mut registry = DeviceRegistry::default();
                for (key, binding) in [
                    ("UPTOWN_DEVICE_ID", Binding::Direction(Direction::Uptown)),
                    ("DOWNTOWN_DEVICE_ID", Binding::Direction(Direction::Downtown)),
                    ("BROADCAST_DEVICE_ID", Binding::All),
                ] {
                    if let Some(id) = get(key) {
                        registry
                            .register(id, binding)
                            .with_context(|| format!("invalid {key}"))?;
                    }
                }
                registry
            }
        };

        let tts = TtsOptions {
            lang: or("TTS_LANG", "en"),
            slow: false,
            host: or("TTS_HOST", "https://translate.google.com"),
        };

        Ok(Self {
            bind_addr: or("BIND_ADDR", "0.0.0.0"),
            port,
            sources: vec![
                FeedSource::new("ACE", or("FEED_URL_ACE", DEFAULT_ACE_URL)),
                FeedSource::new("BDFM", or("FEED_URL_BDFM", DEFAULT_BDFM_URL)),
            ],
            feed_api_key: get("MTA_API_KEY"),
            station: StationConfig {
                id: or("STATION_ID", "A17"),
                name: or("STATION_NAME", "Cathedral Parkway (110 St)"),
                spoken_name: or("STATION_SPOKEN_NAME", "Cathedral Parkway"),
            },
            device_addr: get("GOOGLE_HOME_IP"),
            cast_gateway_url: or("CAST_GATEWAY_URL", "http://127.0.0.1:8009/cast"),
            tts,
            smart_home_api_url: get("SMART_HOME_API_URL"),
            smart_home_api_key: get("SMART_HOME_API_KEY"),
            devices,
        })
    }

    /// Convenience for tests and tools: configuration from a fixed map.
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }
}
