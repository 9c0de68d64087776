//! Smart-home switch integration.
//!
//! Registered switches behave like momentary push buttons: an "On" event
//! triggers an announcement and the switch is reported "Off" again after
//! [`RESET_DELAY`].

mod platform;
mod registry;

pub use platform::{DisabledPlatform, HttpSwitchPlatform, SwitchPlatform};
pub use registry::{Binding, DeviceRegistry};

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// How long a switch stays "On" before it is reset.
pub const RESET_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PowerState {
    On,
    Off,
}

impl<'de> Deserialize<'de> for PowerState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Ok(PowerState::On),
            Raw::Flag(false) => Ok(PowerState::Off),
            Raw::Text(s) if s.eq_ignore_ascii_case("on") => Ok(PowerState::On),
            Raw::Text(s) if s.eq_ignore_ascii_case("off") => Ok(PowerState::Off),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "unknown power state {s:?}"
            ))),
        }
    }
}

/// Power-state-changed callback sent by the platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerStateEvent {
    pub device_id: String,
    pub state: PowerState,
}

/// Decides which announcement, if any, an event triggers.
pub fn triggered_binding(registry: &DeviceRegistry, event: &PowerStateEvent) -> Option<Binding> {
    if event.state != PowerState::On {
        return None;
    }
    registry.get(&event.device_id)
}

/// Reports the switch "Off" after `delay`. Failures are logged.
pub fn schedule_reset(
    platform: Arc<dyn SwitchPlatform>,
    device_id: String,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match platform.report_power_state(&device_id, PowerState::Off).await {
            Ok(()) => info!(device_id, "Switch reset to Off"),
            Err(e) => error!(device_id, error = %e, "Failed to reset switch"),
        }
    })
}
