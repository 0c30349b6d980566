//! CiNii Research OpenSearch request and response model.
//!
//! Search endpoint: `https://cir.nii.ac.jp/opensearch/{type}`
//!
//! - `format=json` is always requested (the API default is HTML)
//! - `count` accepts only 20, 50, 100 or 200
//! - `start` cannot move past the 10000th result

use crate::error::{CiniiError, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest result position the OpenSearch API will page to
pub const MAX_START_INDEX: u32 = 10_000;

/// Search target, the `{type}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    All,
    Data,
    Articles,
    Books,
    Dissertations,
    Projects,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::All => "all",
            SearchType::Data => "data",
            SearchType::Articles => "articles",
            SearchType::Books => "books",
            SearchType::Dissertations => "dissertations",
            SearchType::Projects => "projects",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = CiniiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(SearchType::All),
            "data" => Ok(SearchType::Data),
            "articles" => Ok(SearchType::Articles),
            "books" => Ok(SearchType::Books),
            "dissertations" => Ok(SearchType::Dissertations),
            "projects" => Ok(SearchType::Projects),
            other => Err(CiniiError::Config(format!("Unknown search type: {}", other))),
        }
    }
}

/// Result ordering (`sortorder`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Publication / award / start year, newest first
    Newest,
    /// Publication / award / start year, oldest first
    Oldest,
    /// Relevance (API default)
    Relevance,
    /// Citation count, descending (articles only)
    MostCited,
}

impl SortOrder {
    pub fn code(&self) -> u8 {
        match self {
            SortOrder::Newest => 0,
            SortOrder::Oldest => 1,
            SortOrder::Relevance => 4,
            SortOrder::MostCited => 10,
        }
    }
}

impl TryFrom<u8> for SortOrder {
    type Error = CiniiError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SortOrder::Newest),
            1 => Ok(SortOrder::Oldest),
            4 => Ok(SortOrder::Relevance),
            10 => Ok(SortOrder::MostCited),
            other => Err(CiniiError::Config(format!(
                "sortorder must be one of 0, 1, 4, 10 (got {})",
                other
            ))),
        }
    }
}

/// Page size (`count`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemsPerPage {
    Twenty,
    Fifty,
    Hundred,
    #[default]
    TwoHundred,
}

impl ItemsPerPage {
    pub fn get(&self) -> u32 {
        match self {
            ItemsPerPage::Twenty => 20,
            ItemsPerPage::Fifty => 50,
            ItemsPerPage::Hundred => 100,
            ItemsPerPage::TwoHundred => 200,
        }
    }
}

impl TryFrom<u32> for ItemsPerPage {
    type Error = CiniiError;

    fn try_from(count: u32) -> Result<Self> {
        match count {
            20 => Ok(ItemsPerPage::Twenty),
            50 => Ok(ItemsPerPage::Fifty),
            100 => Ok(ItemsPerPage::Hundred),
            200 => Ok(ItemsPerPage::TwoHundred),
            other => Err(CiniiError::Config(format!(
                "count must be one of 20, 50, 100, 200 (got {})",
                other
            ))),
        }
    }
}

/// Response language (`lang`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseLang {
    Ja,
    En,
}

impl FromStr for ResponseLang {
    type Err = CiniiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ja" => Ok(ResponseLang::Ja),
            "en" => Ok(ResponseLang::En),
            other => Err(CiniiError::Config(format!("lang must be ja or en (got {})", other))),
        }
    }
}

/// OpenSearch query parameters.
///
/// `count` and `start` are left unset here; the paginator fills them per page.
#[derive(Debug, Clone, Default)]
pub struct OpenSearchQuery {
    pub appid: Option<String>,
    pub lang: Option<ResponseLang>,
    pub sortorder: Option<SortOrder>,
    pub count: Option<ItemsPerPage>,
    pub start: Option<u32>,
    /// Free word
    pub q: Option<String>,
    pub creator: Option<String>,
    /// `YYYY` or `YYYYMM`
    pub from: Option<String>,
    /// `YYYY` or `YYYYMM`
    pub until: Option<String>,
    pub title: Option<String>,
    pub is_full_title: Option<bool>,
    pub researcher_id: Option<String>,
    pub affiliation: Option<String>,
    pub publication_title: Option<String>,
    pub issn: Option<String>,
    pub volume: Option<String>,
    pub number: Option<String>,
    pub pages: Option<String>,
    pub isbn: Option<String>,
    pub ncid: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub doi: Option<String>,
    pub has_link_to_full_text: Option<bool>,
    pub data_source_type: Vec<String>,
    pub language_type: Option<String>,
    pub resource_type: Vec<String>,
}

impl OpenSearchQuery {
    /// Check `from` / `until` before any request is sent
    pub fn validate(&self) -> Result<()> {
        if let Some(from) = &self.from {
            validate_year_month(from)?;
        }
        if let Some(until) = &self.until {
            validate_year_month(until)?;
        }
        Ok(())
    }

    /// Query string pairs; `format=json` first, unset fields omitted
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = vec![("format", "json".to_string())];

        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                pairs.push((key, v));
            }
        };

        push("appid", self.appid.clone());
        push(
            "lang",
            self.lang.map(|l| match l {
                ResponseLang::Ja => "ja".to_string(),
                ResponseLang::En => "en".to_string(),
            }),
        );
        push("sortorder", self.sortorder.map(|s| s.code().to_string()));
        push("count", self.count.map(|c| c.get().to_string()));
        push("start", self.start.map(|s| s.to_string()));
        push("q", self.q.clone());
        push("creator", self.creator.clone());
        push("from", self.from.clone());
        push("until", self.until.clone());
        push("title", self.title.clone());
        push("isFullTitle", self.is_full_title.map(|b| b.to_string()));
        push("researcherId", self.researcher_id.clone());
        push("affiliation", self.affiliation.clone());
        push("publicationTitle", self.publication_title.clone());
        push("issn", self.issn.clone());
        push("volume", self.volume.clone());
        push("number", self.number.clone());
        push("pages", self.pages.clone());
        push("isbn", self.isbn.clone());
        push("ncid", self.ncid.clone());
        push("category", self.category.clone());
        push("description", self.description.clone());
        push("publisher", self.publisher.clone());
        push("doi", self.doi.clone());
        push(
            "hasLinkToFullText",
            self.has_link_to_full_text.map(|b| b.to_string()),
        );
        push(
            "dataSourceType",
            (!self.data_source_type.is_empty()).then(|| self.data_source_type.join(",")),
        );
        push("languageType", self.language_type.clone());
        push(
            "resourceType",
            (!self.resource_type.is_empty()).then(|| self.resource_type.join(",")),
        );

        pairs
    }

    /// Copy of this query positioned at one page
    pub fn page(&self, start: u32, count: ItemsPerPage) -> Self {
        Self {
            start: Some(start),
            count: Some(count),
            ..self.clone()
        }
    }
}

/// Validate a `from` / `until` value: `YYYY` or `YYYYMM`, year in 1900..=current
pub fn validate_year_month(value: &str) -> Result<()> {
    let invalid = || CiniiError::Config(format!("Expected YYYY or YYYYMM, got '{}'", value));

    if !(value.len() == 4 || value.len() == 6) || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let year: i32 = value[..4].parse().map_err(|_| invalid())?;
    let current_year = chrono::Local::now().year();
    if !(1900..=current_year).contains(&year) {
        return Err(CiniiError::Config(format!(
            "Year must be between 1900 and {} (got {})",
            current_year, year
        )));
    }

    if value.len() == 6 {
        let month: u32 = value[4..].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
    }

    Ok(())
}

// === OpenSearch Response Types ===

/// One page of OpenSearch results
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenSearchResponse {
    /// Request URI
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "opensearch:totalResults", default)]
    pub total_results: u64,
    #[serde(rename = "opensearch:startIndex", default)]
    pub start_index: u64,
    #[serde(rename = "opensearch:itemsPerPage", default)]
    pub items_per_page: u64,
    #[serde(default)]
    pub items: Vec<OpenSearchItem>,
}

/// A single search hit
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenSearchItem {
    /// Detail page URI (`https://cir.nii.ac.jp/crid/...`)
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Author names and title as displayed
    #[serde(default)]
    pub title: String,
    #[serde(rename = "dc:creator", default, skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<String>,
    #[serde(rename = "dc:publisher", default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(rename = "dc:type", default, skip_serializing_if = "Option::is_none")]
    pub dc_type: Option<String>,
    #[serde(
        rename = "prism:publicationName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publication_name: Option<String>,
    #[serde(rename = "prism:issn", default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(
        rename = "prism:publicationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publication_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "dc:identifier", default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<TypedValue>,
    #[serde(rename = "dc:subject", default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(rename = "dc:date", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// `{"@type": ..., "@value": ...}` pair
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TypedValue {
    #[serde(rename = "@type", default)]
    pub value_type: String,
    #[serde(rename = "@value", default)]
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_skip_unset_fields() {
        let query = OpenSearchQuery {
            q: Some("がん".to_string()),
            from: Some("2023".to_string()),
            until: Some("2023".to_string()),
            sortorder: Some(SortOrder::MostCited),
            data_source_type: vec!["CROSSREF".to_string(), "KAKEN".to_string()],
            ..Default::default()
        };

        let pairs = query.page(201, ItemsPerPage::TwoHundred).to_pairs();
        let get = |k: &str| pairs.iter().find(|(key, _)| *key == k).map(|(_, v)| v.as_str());

        assert_eq!(pairs[0], ("format", "json".to_string()));
        assert_eq!(get("q"), Some("がん"));
        assert_eq!(get("sortorder"), Some("10"));
        assert_eq!(get("count"), Some("200"));
        assert_eq!(get("start"), Some("201"));
        assert_eq!(get("dataSourceType"), Some("CROSSREF,KAKEN"));
        assert_eq!(get("appid"), None);
        assert_eq!(get("resourceType"), None);
    }

    #[test]
    fn test_validate_year_month() {
        assert!(validate_year_month("2021").is_ok());
        assert!(validate_year_month("202104").is_ok());
        assert!(validate_year_month("1899").is_err());
        assert!(validate_year_month("202113").is_err());
        assert!(validate_year_month("21").is_err());
        assert!(validate_year_month("20a1").is_err());
        assert!(validate_year_month("9999").is_err());
    }

    #[test]
    fn test_enum_conversions() {
        assert_eq!("articles".parse::<SearchType>().ok(), Some(SearchType::Articles));
        assert!("papers".parse::<SearchType>().is_err());
        assert_eq!(SortOrder::try_from(4).ok(), Some(SortOrder::Relevance));
        assert!(SortOrder::try_from(2).is_err());
        assert_eq!(ItemsPerPage::try_from(50).map(|c| c.get()).ok(), Some(50));
        assert!(ItemsPerPage::try_from(30).is_err());
        assert_eq!(ItemsPerPage::default().get(), 200);
    }

    #[test]
    fn test_parse_response_tolerates_missing_fields() {
        let body = r#"{
            "@id": "https://cir.nii.ac.jp/opensearch/articles?q=cancer",
            "@type": "channel",
            "title": "CiNii Research articles cancer",
            "opensearch:totalResults": 2,
            "opensearch:startIndex": 1,
            "opensearch:itemsPerPage": 200,
            "items": [
                {"@id": "https://cir.nii.ac.jp/crid/1", "title": "癌の研究", "dc:creator": ["山田 太郎"]},
                {"@id": "https://cir.nii.ac.jp/crid/2", "title": "Cancer"}
            ]
        }"#;

        let response: OpenSearchResponse = serde_json::from_str(body).expect("valid response");
        assert_eq!(response.total_results, 2);
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].creators, vec!["山田 太郎".to_string()]);
        assert!(response.items[1].creators.is_empty());
    }
}
