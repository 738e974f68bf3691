//! User roles (dashboard families).

use serde::{Deserialize, Deserializer, Serialize};

/// The dashboard family a user belongs to.
///
/// Modeled as a closed set so the guard can match exhaustively. The store
/// may hold `null` or a legacy string for old rows; both deserialize to
/// [`UserRole::Unset`] at the boundary instead of leaking open strings into
/// access decisions.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Fleet operators.
    Logistics,
    Driver,
    /// Shipping businesses.
    Business,
    /// No recognized role on file.
    #[default]
    Unset,
}

// Manual impl: any unrecognized string must become `Unset`, which a derived
// externally-tagged enum cannot express.
impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(UserRole::parse(&raw))
    }
}

impl UserRole {
    /// Parse a raw store value; anything unrecognized is `Unset`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "logistics" => Self::Logistics,
            "driver" => Self::Driver,
            "business" => Self::Business,
            _ => Self::Unset,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logistics => "logistics",
            Self::Driver => "driver",
            Self::Business => "business",
            Self::Unset => "unset",
        }
    }
}

impl core::fmt::Display for UserRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
