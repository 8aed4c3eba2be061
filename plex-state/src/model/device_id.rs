//! Device identity type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier of a player device
///
/// Plex uses the same value as the account device `clientIdentifier`, the
/// client `machineIdentifier` and the session player `machineIdentifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new DeviceId, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self(id.trim().to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        DeviceId::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims() {
        assert_eq!(DeviceId::new("  tv-1 ").as_str(), "tv-1");
        assert!(DeviceId::new("   ").is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", DeviceId::new("tv-1")), "tv-1");
    }
}
