//! Classification keywords attached to catalog entries.
//!
//! The remote API tags each license with a handful of fixed tokens
//! (e.g. `"popular-strong-community"`). [`Keyword`] is the typed side of that
//! vocabulary. Unknown tokens are dropped when a keyword list is decoded, so
//! new tags on the server never break existing clients.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::LicatError;

/// A classification tag from the catalog's fixed vocabulary.
///
/// Ordering follows declaration order, which is also the order a
/// [`BTreeSet<Keyword>`] serializes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyword {
    PopularStrongCommunity,
    International,
    SpecialPurpose,
    NonReusable,
    Superseded,
    VoluntarilyRetired,
    RedundantWithMorePopular,
    OtherMiscellaneous,
    Uncategorized,
}

impl Keyword {
    /// Every keyword, in declaration order.
    pub const ALL: [Keyword; 9] = [
        Self::PopularStrongCommunity,
        Self::International,
        Self::SpecialPurpose,
        Self::NonReusable,
        Self::Superseded,
        Self::VoluntarilyRetired,
        Self::RedundantWithMorePopular,
        Self::OtherMiscellaneous,
        Self::Uncategorized,
    ];

    /// Wire token for this keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PopularStrongCommunity => "popular-strong-community",
            Self::International => "international",
            Self::SpecialPurpose => "special-purpose",
            Self::NonReusable => "non-reusable",
            Self::Superseded => "superseded",
            Self::VoluntarilyRetired => "voluntarily-retired",
            Self::RedundantWithMorePopular => "redundant-with-more-popular",
            Self::OtherMiscellaneous => "other-miscellaneous",
            Self::Uncategorized => "uncategorized",
        }
    }

    /// Look up a wire token. Returns `None` for tokens outside the vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == token)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = LicatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_token(s)
            .ok_or_else(|| LicatError::InvalidInput(format!("unknown license keyword '{s}'")))
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Keyword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde codec for a keyword list that tolerates unknown tokens.
///
/// Reading: `null` is an empty set, unknown strings are dropped, and a
/// non-string element is a decode error. Writing emits the set in order.
pub mod keyword_set {
    use super::*;

    pub fn serialize<S: Serializer>(
        keywords: &BTreeSet<Keyword>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(keywords.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<BTreeSet<Keyword>, D::Error> {
        let tokens: Option<Vec<String>> = Option::deserialize(deserializer)?;
        Ok(tokens
            .unwrap_or_default()
            .iter()
            .filter_map(|t| Keyword::from_token(t))
            .collect())
    }
}
