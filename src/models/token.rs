use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain-native base units (sats, wei, e8s, lamports). Large enough for any
/// ledger this engine talks to.
pub type Balance = u128;

/// Opaque key identifying one asset/standard/network triple. Keys nearly
/// every store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A value tagged with how it was obtained: through a cryptographic
/// verification path (`certified`) or a best-effort query.
///
/// Once a slot holds certified data, an uncertified write for the same key
/// is ignored by the store layer until an explicit reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifiedData<T> {
    pub data: T,
    pub certified: bool,
}

impl<T> CertifiedData<T> {
    pub fn certified(data: T) -> Self {
        Self {
            data,
            certified: true,
        }
    }

    pub fn uncertified(data: T) -> Self {
        Self {
            data,
            certified: false,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CertifiedData<U> {
        CertifiedData {
            data: f(self.data),
            certified: self.certified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_round_trips_through_display() {
        let token = TokenId::new("ckBTC");
        assert_eq!(token.to_string(), "ckBTC");
        assert_eq!(token.as_str(), "ckBTC");
    }

    #[test]
    fn map_preserves_certification() {
        let balance = CertifiedData::certified(100u128);
        let doubled = balance.map(|v| v * 2);
        assert_eq!(doubled.data, 200);
        assert!(doubled.certified);
    }
}
