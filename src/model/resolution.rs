//! Alias-resolution outcome.

use serde::{Deserialize, Serialize};

/// Which cascade tier produced a resolution.
///
/// Serialised as its numeric code so persisted metadata reads `alias_tier: 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum AliasTier {
    /// T0: sharded exact dictionary.
    Exact,
    /// T1: in-document fuzzy match.
    Fuzzy,
    /// T2: global knowledge-base link.
    Global,
    /// No tier matched; identity fallback.
    Fallback,
}

impl AliasTier {
    /// Numeric code: 0, 1, 2, or -1 for the fallback.
    pub fn code(self) -> i8 {
        match self {
            AliasTier::Exact => 0,
            AliasTier::Fuzzy => 1,
            AliasTier::Global => 2,
            AliasTier::Fallback => -1,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(AliasTier::Exact),
            1 => Some(AliasTier::Fuzzy),
            2 => Some(AliasTier::Global),
            -1 => Some(AliasTier::Fallback),
            _ => None,
        }
    }

    pub fn is_match(self) -> bool {
        self != AliasTier::Fallback
    }
}

impl From<AliasTier> for i8 {
    fn from(tier: AliasTier) -> i8 {
        tier.code()
    }
}

impl TryFrom<i8> for AliasTier {
    type Error = String;

    fn try_from(code: i8) -> std::result::Result<Self, Self::Error> {
        AliasTier::from_code(code).ok_or_else(|| format!("unknown alias tier {code}"))
    }
}

impl std::fmt::Display for AliasTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// `(canonical, entity_id, tier)` for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub canonical: String,
    pub entity_id: Option<String>,
    pub tier: AliasTier,
}

impl ResolutionResult {
    pub fn exact(canonical: impl Into<String>) -> Self {
        Self { canonical: canonical.into(), entity_id: None, tier: AliasTier::Exact }
    }

    pub fn fuzzy(canonical: impl Into<String>) -> Self {
        Self { canonical: canonical.into(), entity_id: None, tier: AliasTier::Fuzzy }
    }

    pub fn global(canonical: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            entity_id: Some(entity_id.into()),
            tier: AliasTier::Global,
        }
    }

    /// Identity fallback: the token comes back unchanged.
    pub fn unresolved(token: impl Into<String>) -> Self {
        Self { canonical: token.into(), entity_id: None, tier: AliasTier::Fallback }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_codes_roundtrip() {
        for tier in [AliasTier::Exact, AliasTier::Fuzzy, AliasTier::Global, AliasTier::Fallback] {
            assert_eq!(AliasTier::from_code(tier.code()), Some(tier));
        }
        assert_eq!(AliasTier::from_code(7), None);
    }

    #[test]
    fn test_precision_order() {
        assert!(AliasTier::Exact < AliasTier::Fuzzy);
        assert!(AliasTier::Global < AliasTier::Fallback);
    }

    #[test]
    fn test_only_fallback_is_not_a_match() {
        assert!(AliasTier::Exact.is_match());
        assert!(AliasTier::Global.is_match());
        assert!(!AliasTier::Fallback.is_match());
    }
}
