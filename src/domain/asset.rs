//! Asset, participant and settlement-handle identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Conventional pseudo-address that token lists use for the native currency.
pub const NATIVE_SENTINEL: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// One leg of a pool: either the native currency or a fungible token.
///
/// Serialized as a plain string: `"native"` for the native currency,
/// otherwise the token identifier. [`NATIVE_SENTINEL`] also parses as
/// native, in any letter case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Asset {
    /// The native currency, moved by attaching value to a call.
    Native,
    /// A fungible token, moved by transfer from an approved balance.
    Token(String),
}

impl Asset {
    /// Creates a token asset.
    #[must_use]
    pub fn token(id: impl Into<String>) -> Self {
        Self::Token(id.into())
    }

    /// Returns `true` for the native currency.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Token(id) => f.write_str(id),
        }
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("asset identifier must not be empty".to_string());
        }
        if trimmed.eq_ignore_ascii_case("native") || trimmed.eq_ignore_ascii_case(NATIVE_SENTINEL)
        {
            return Ok(Self::Native);
        }
        Ok(Self::Token(trimmed.to_string()))
    }
}

impl TryFrom<String> for Asset {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

/// Identity of a caller: a depositor, the operator, or a custody account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Creates a participant identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a synthetic position held at the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettlementHandle(u64);

impl SettlementHandle {
    /// Wraps a raw handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SettlementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn native_parses_from_keyword_and_sentinel() {
        assert_eq!("native".parse::<Asset>(), Ok(Asset::Native));
        assert_eq!("NATIVE".parse::<Asset>(), Ok(Asset::Native));
        assert_eq!(
            NATIVE_SENTINEL.to_ascii_lowercase().parse::<Asset>(),
            Ok(Asset::Native)
        );
    }

    #[test]
    fn token_keeps_identifier() {
        assert_eq!("DAI".parse::<Asset>(), Ok(Asset::token("DAI")));
        assert!(!Asset::token("DAI").is_native());
    }

    #[test]
    fn empty_identifier_is_rejected() {
        assert!("  ".parse::<Asset>().is_err());
    }

    #[test]
    fn serde_uses_plain_strings() {
        let json = serde_json::to_string(&Asset::Native).unwrap_or_default();
        assert_eq!(json, "\"native\"");
        let Ok(asset) = serde_json::from_str::<Asset>("\"WBTC\"") else {
            panic!("deserialization failed");
        };
        assert_eq!(asset, Asset::token("WBTC"));
    }

    #[test]
    fn handle_display_is_prefixed() {
        assert_eq!(SettlementHandle::new(9).to_string(), "#9");
    }
}
