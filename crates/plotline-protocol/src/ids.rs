//! Type-safe connection identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one connected remote client.
///
/// Generated by the service when a socket attaches; used only to track
/// membership in the session's connection registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = ConnectionId::new();
        let json = serde_json::to_string(&original).unwrap();
        let restored: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
