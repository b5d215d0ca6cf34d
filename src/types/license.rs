//! License catalog record.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::date::compact_date;
use super::keyword::{Keyword, keyword_set};
use crate::{LicatError, Result};

/// A hyperlink object from the `_links` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// The `_links` block of a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    /// API resource for this record.
    #[serde(rename = "self")]
    pub self_link: Link,
    /// Human-readable detail page; the source of the license text.
    pub html: Link,
    /// API listing this record belongs to.
    pub collection: Link,
}

/// One entry of the license catalog.
///
/// Everything except [`license_text`](Self::license_text) mirrors the wire
/// payload. `license_text` is filled in after decoding by the enrichment
/// step and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    /// Catalog identifier (e.g. `"mit"`). Never empty.
    #[serde(deserialize_with = "non_empty_id")]
    pub id: String,
    /// Display name (e.g. `"MIT License"`).
    #[serde(default)]
    pub name: String,
    /// SPDX short identifier, when the license has one.
    #[serde(default)]
    pub spdx_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, with = "compact_date")]
    pub submission_date: Option<NaiveDate>,
    #[serde(default)]
    pub submission_url: Option<String>,
    #[serde(default)]
    pub submitter_name: Option<String>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, with = "compact_date")]
    pub approval_date: Option<NaiveDate>,
    #[serde(default)]
    pub license_steward_version: Option<String>,
    #[serde(default)]
    pub license_steward_url: Option<String>,
    /// Organisations stewarding the license, in catalog order.
    #[serde(default)]
    pub stewards: Vec<String>,
    /// Classification tags. Unknown wire tokens are dropped on read.
    #[serde(default, with = "keyword_set")]
    pub keywords: BTreeSet<Keyword>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    /// Plain-text license body scraped from the html page.
    #[serde(skip)]
    pub license_text: String,
}

fn non_empty_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let id = String::deserialize(deserializer)?;
    if id.trim().is_empty() {
        return Err(serde::de::Error::custom("license id must not be empty"));
    }
    Ok(id)
}

impl License {
    /// Create a record with the required fields. Fails on an empty `id`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LicatError::InvalidInput(
                "license id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name: name.into(),
            spdx_id: None,
            version: None,
            submission_date: None,
            submission_url: None,
            submitter_name: None,
            approved: false,
            approval_date: None,
            license_steward_version: None,
            license_steward_url: None,
            stewards: Vec::new(),
            keywords: BTreeSet::new(),
            links: None,
            license_text: String::new(),
        })
    }

    /// Decode a single record. Field-level malformation (bad date, non-string
    /// keyword) is reported as [`LicatError::Json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the SPDX identifier.
    pub fn with_spdx_id(mut self, spdx_id: impl Into<String>) -> Self {
        self.spdx_id = Some(spdx_id.into());
        self
    }

    /// Add a keyword.
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.insert(keyword);
        self
    }

    /// Set all three links.
    pub fn with_links(
        mut self,
        self_href: impl Into<String>,
        html_href: impl Into<String>,
        collection_href: impl Into<String>,
    ) -> Self {
        self.links = Some(Links {
            self_link: Link::new(self_href),
            html: Link::new(html_href),
            collection: Link::new(collection_href),
        });
        self
    }

    /// Key used to index the record: the SPDX id when present, otherwise the name.
    ///
    /// Returns `None` when neither is populated; such records cannot be cached.
    pub fn index_key(&self) -> Option<&str> {
        match self.spdx_id.as_deref() {
            Some(spdx) if !spdx.trim().is_empty() => Some(spdx),
            _ if !self.name.trim().is_empty() => Some(self.name.as_str()),
            _ => None,
        }
    }

    /// Case-folded key that orders records in a snapshot.
    pub fn sort_key(&self) -> String {
        self.index_key().unwrap_or_default().to_lowercase()
    }

    /// Detail page URL, when the record carries links.
    pub fn html_url(&self) -> Option<&str> {
        self.links.as_ref().map(|l| l.html.href.as_str())
    }

    pub fn has_license_text(&self) -> bool {
        !self.license_text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mit_json() -> serde_json::Value {
        serde_json::json!({
            "id": "mit",
            "name": "MIT License",
            "spdx_id": "MIT",
            "version": "",
            "submission_date": "",
            "approved": true,
            "approval_date": "20061231",
            "stewards": ["Massachusetts Institute of Technology"],
            "keywords": ["popular-strong-community", "unknown-token"],
            "_links": {
                "self": {"href": "https://opensource.org/api/license/mit"},
                "html": {"href": "https://opensource.org/license/mit/"},
                "collection": {"href": "https://opensource.org/api/licenses"}
            }
        })
    }

    #[test]
    fn decodes_wire_record() {
        let license: License = serde_json::from_value(mit_json()).unwrap();
        assert_eq!(license.id, "mit");
        assert_eq!(license.spdx_id.as_deref(), Some("MIT"));
        assert_eq!(license.submission_date, None);
        assert_eq!(license.approval_date, NaiveDate::from_ymd_opt(2006, 12, 31));
        assert_eq!(license.stewards.len(), 1);
        assert_eq!(
            license.keywords.iter().copied().collect::<Vec<_>>(),
            vec![Keyword::PopularStrongCommunity]
        );
        assert_eq!(
            license.html_url(),
            Some("https://opensource.org/license/mit/")
        );
        assert!(license.license_text.is_empty());
    }

    #[test]
    fn license_text_is_never_serialized() {
        let mut license = License::new("mit", "MIT License").unwrap();
        license.license_text = "Permission is hereby granted".to_string();
        let json = serde_json::to_value(&license).unwrap();
        assert!(json.get("license_text").is_none());
    }

    #[test]
    fn dates_serialize_compact() {
        let mut license = License::new("x", "X").unwrap();
        license.submission_date = NaiveDate::from_ymd_opt(2024, 12, 31);
        let json = serde_json::to_value(&license).unwrap();
        assert_eq!(json["submission_date"], "20241231");
        assert!(json["approval_date"].is_null());
    }

    #[test]
    fn keywords_serialize_as_tokens() {
        let license = License::new("x", "X")
            .unwrap()
            .with_keyword(Keyword::Uncategorized)
            .with_keyword(Keyword::SpecialPurpose);
        let json = serde_json::to_value(&license).unwrap();
        assert_eq!(
            json["keywords"],
            serde_json::json!(["special-purpose", "uncategorized"])
        );
    }

    #[test]
    fn null_dates_decode_to_none() {
        let license =
            License::from_json(r#"{"id":"x","name":"X","submission_date":null,"approval_date":null}"#)
                .unwrap();
        assert_eq!(license.submission_date, None);
        assert_eq!(license.approval_date, None);

        let mut json = mit_json();
        json["approval_date"] = serde_json::Value::Null;
        let license: License = serde_json::from_value(json).unwrap();
        assert_eq!(license.approval_date, None);
    }

    #[test]
    fn malformed_date_fails_the_record() {
        let mut json = mit_json();
        json["approval_date"] = serde_json::json!("2006-12-31");
        assert!(License::from_json(&json.to_string()).is_err());
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut json = mit_json();
        json["id"] = serde_json::json!("");
        assert!(License::from_json(&json.to_string()).is_err());
        assert!(License::new("  ", "Blank").is_err());
    }

    #[test]
    fn index_key_prefers_spdx_then_name() {
        let named = License::new("bsd", "BSD License").unwrap();
        assert_eq!(named.index_key(), Some("BSD License"));

        let spdx = named.clone().with_spdx_id("BSD-3-Clause");
        assert_eq!(spdx.index_key(), Some("BSD-3-Clause"));

        let blank_spdx = License::new("bsd", "BSD License")
            .unwrap()
            .with_spdx_id("");
        assert_eq!(blank_spdx.index_key(), Some("BSD License"));

        let unkeyable = License::new("anon", "").unwrap();
        assert_eq!(unkeyable.index_key(), None);
    }
}
