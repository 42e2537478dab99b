//! Country codes used by shipping snapshots.

use serde::{Deserialize, Serialize};

/// ISO 3166-1 alpha-2 country codes the platform ships to.
///
/// Only the code itself matters to the core; the set is the one the original
/// storefront sells into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CountryCode {
    #[default]
    US,
    JP,
    CA,
    GB,
    AU,
}

impl CountryCode {
    /// ISO 3166-1 alpha-2 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::US => "US",
            Self::JP => "JP",
            Self::CA => "CA",
            Self::GB => "GB",
            Self::AU => "AU",
        }
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
