//! Server-side filters for the licenses listing.

use std::fmt;

/// Query parameter accepted by the filtered listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterParam {
    /// Exact or partial license name.
    Name,
    /// One of the [`Keyword`](crate::Keyword) tokens.
    Keyword,
    /// License steward (publishing organisation).
    Steward,
    /// SPDX identifier pattern. `*` is a server-side wildcard and is sent unencoded.
    SpdxPattern,
}

impl FilterParam {
    /// Query-string parameter name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Keyword => "keyword",
            Self::Steward => "steward",
            Self::SpdxPattern => "spdx",
        }
    }

    /// URL-encode a filter value for this parameter.
    ///
    /// Values are percent-encoded, except that `*` stays literal for
    /// [`FilterParam::SpdxPattern`].
    pub fn encode_value(&self, value: &str) -> String {
        let encoded = urlencoding::encode(value);
        match self {
            Self::SpdxPattern => encoded.replace("%2A", "*"),
            _ => encoded.into_owned(),
        }
    }
}

impl fmt::Display for FilterParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
