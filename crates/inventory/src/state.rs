use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use toolrent_core::{DomainError, ValueObject};

/// Lifecycle state of a unit of stock.
///
/// `Disposed` is a sink: units moved there are out of circulation for good.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolState {
    Available,
    Loaned,
    InRepair,
    Disposed,
}

impl ValueObject for ToolState {}

impl ToolState {
    pub const ALL: [ToolState; 4] = [
        ToolState::Available,
        ToolState::Loaned,
        ToolState::InRepair,
        ToolState::Disposed,
    ];

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolState::Available => "Available",
            ToolState::Loaned => "Loaned",
            ToolState::InRepair => "In-repair",
            ToolState::Disposed => "Disposed",
        }
    }

    /// Case-insensitive parse; accepts `In-repair`, `In repair` and `in_repair`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "available" => Ok(ToolState::Available),
            "loaned" => Ok(ToolState::Loaned),
            "in-repair" => Ok(ToolState::InRepair),
            "disposed" => Ok(ToolState::Disposed),
            _ => Err(DomainError::validation(format!(
                "invalid state '{}': expected one of Available, Loaned, In-repair, Disposed",
                raw.trim()
            ))),
        }
    }

    pub fn is_available(self) -> bool {
        self == ToolState::Available
    }
}

impl core::fmt::Display for ToolState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ToolState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ToolState::parse(&raw).map_err(serde::de::Error::custom)
    }
}
