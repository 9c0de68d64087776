use anyhow::{Context, Result, bail};
use std::collections::HashMap;

use crate::arrivals::Direction;

/// What a registered switch announces when turned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Arrivals in one direction only.
    Direction(Direction),
    /// Arrivals in both directions.
    All,
}

impl Binding {
    pub fn filter(&self) -> Option<Direction> {
        match self {
            Binding::Direction(direction) => Some(*direction),
            Binding::All => None,
        }
    }

    fn parse(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case("broadcast") {
            return Ok(Binding::All);
        }
        value
            .parse::<Direction>()
            .map(Binding::Direction)
            .map_err(anyhow::Error::msg)
    }
}

/// Maps smart-home switch ids to the announcement each one triggers.
///
/// Stored on disk as a plain JSON object:
/// ```json
/// {
///   "6650a1f2c1": "uptown",
///   "6650a1f2c2": "downtown",
///   "6650a1f2c3": "all"
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    entries: HashMap<String, Binding>,
}

impl DeviceRegistry {
    /// Loads the registry from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read device registry {path}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(content)?;
        let mut registry = Self::default();
        for (device_id, value) in raw {
            let binding = Binding::parse(&value)
                .with_context(|| format!("device {device_id:?} has invalid binding"))?;
            registry.register(device_id, binding)?;
        }
        Ok(registry)
    }

    /// Registers `device_id`, rejecting empty ids and duplicates.
    pub fn register(&mut self, device_id: impl Into<String>, binding: Binding) -> Result<()> {
        let device_id = device_id.into();
        if device_id.trim().is_empty() {
            bail!("device id must not be empty");
        }
        if self.entries.contains_key(&device_id) {
            bail!("device {device_id:?} is already registered");
        }
        self.entries.insert(device_id, binding);
        Ok(())
    }

    pub fn get(&self, device_id: &str) -> Option<Binding> {
        self.entries.get(device_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let registry = DeviceRegistry::from_json(
            r#"{"up": "uptown", "down": "Downtown", "both": "all"}"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("up"), Some(Binding::Direction(Direction::Uptown)));
        assert_eq!(registry.get("down"), Some(Binding::Direction(Direction::Downtown)));
        assert_eq!(registry.get("both"), Some(Binding::All));
        assert_eq!(registry.get("both").unwrap().filter(), None);
        assert_eq!(registry.get("missing"), None);
    }

    #[test]
    fn test_from_json_rejects_unknown_binding() {
        assert!(DeviceRegistry::from_json(r#"{"x": "crosstown"}"#).is_err());
    }

    #[test]
    fn test_register_rejects_duplicates_and_empty() {
        let mut registry = DeviceRegistry::default();
        registry
            .register("a", Binding::Direction(Direction::Uptown))
            .unwrap();

        assert!(registry.register("a", Binding::All).is_err());
        assert!(registry.register("  ", Binding::All).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("station_announcer_test_registry.json");
        std::fs::write(&path, r#"{"sw-1": "downtown"}"#).unwrap();

        let registry = DeviceRegistry::load(path.to_str().unwrap()).unwrap();

        assert_eq!(registry.get("sw-1"), Some(Binding::Direction(Direction::Downtown)));
        std::fs::remove_file(&path).unwrap();
    }
}
