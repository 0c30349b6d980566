//! Author aggregation for conference-abstract review sheets.
//!
//! Each article contributes one row per creator with the presentation
//! title, the article's data sources, and the author's preferred name,
//! data sources and affiliation. The remaining review columns are left
//! blank for manual entry.

use crate::client::CiniiClient;
use crate::error::{CiniiError, Result};
use crate::flatten::Row;
use crate::japanese::{data_source_types, preferred_institution_name, preferred_person_name};
use crate::tables::{Column, Table};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Prefix of JAMAS (医中誌) links that mark a medical journal article
pub const JAMAS_LINK_PREFIX: &str = "https://search.jamas.or.jp/link/ui";

/// Review sheet columns: `(key, header)`
pub const AGGREGATE_COLUMNS: [(&str, &str); 15] = [
    ("conferenceId", "学会ID"),
    ("conferenceName", "学会名"),
    ("conferenceType", "区分"),
    ("sessionName", "セッション名"),
    ("presentationId", "演題仮番号"),
    ("presentationName", "演題名"),
    ("role", "役割"),
    ("author", "人物"),
    ("affiliation", "施設"),
    ("field", "領域"),
    ("title", "肩書"),
    ("isMoreThan11", "演者が11名以上"),
    ("abstract", "抄録"),
    ("companyName", "企業名"),
    ("isJointlyHeld", "合同開催"),
];

/// Sheet name for aggregation output
pub const AGGREGATE_SHEET: &str = "Sheet1";

/// Article-level fields of the review sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSummary {
    pub id: String,
    /// First `dc:title` value
    pub presentation_name: String,
    /// Distinct data source types, comma separated
    pub session_name: String,
    /// `@id` of every creator, in record order
    pub creator_ids: Vec<String>,
}

impl ArticleSummary {
    /// Requires `dc:title` and a non-empty `dataSourceIdentifier`
    pub fn from_record(record: &Value) -> Result<Self> {
        let id = record
            .get("@id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let titles = record.get("dc:title").filter(|t| !t.is_null());
        let has_sources = match record.get("dataSourceIdentifier") {
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(_)) => true,
            _ => false,
        };
        let Some(titles) = titles.filter(|_| has_sources) else {
            return Err(CiniiError::Validation(format!(
                "{}: dc:title or dataSourceIdentifier missing",
                id
            )));
        };

        let presentation_name = titles
            .get(0)
            .and_then(|t| t.get("@value"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let session_name = data_source_types(record)?.join(", ");

        let creator_ids = match record.get("creator") {
            Some(Value::Array(creators)) => creators
                .iter()
                .map(|c| {
                    c.get("@id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            CiniiError::Validation(format!("{}: creator without @id", id))
                        })
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            presentation_name,
            session_name,
            creator_ids,
        })
    }
}

/// Author-level fields of the review sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSummary {
    pub author: String,
    /// Distinct data source types of the author record, comma separated
    pub conference_type: String,
    pub affiliation: String,
}

impl AuthorSummary {
    /// Summarize an author record without requiring a name
    pub fn from_record(record: &Value) -> Result<Self> {
        Ok(Self {
            author: preferred_person_name(record.get("foaf:Person")),
            conference_type: data_source_types(record)?.join(", "),
            affiliation: preferred_institution_name(record.get("career")),
        })
    }

    /// Summarize an author record; a name and a data source are required
    pub fn from_creator_record(creator_id: &str, record: &Value) -> Result<Self> {
        let summary = Self::from_record(record)?;
        if summary.author.is_empty() || summary.conference_type.is_empty() {
            return Err(CiniiError::Validation(format!(
                "{}: author name or data source missing",
                creator_id
            )));
        }
        Ok(summary)
    }
}

/// One review sheet row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub conference_type: Option<String>,
    pub session_name: Option<String>,
    pub presentation_name: Option<String>,
    pub author: Option<String>,
    pub affiliation: Option<String>,
}

impl AggregateRow {
    fn article_only(article: &ArticleSummary) -> Self {
        Self {
            session_name: Some(article.session_name.clone()),
            presentation_name: Some(article.presentation_name.clone()),
            ..Default::default()
        }
    }

    fn with_author(article: &ArticleSummary, author: &AuthorSummary) -> Self {
        Self {
            conference_type: Some(author.conference_type.clone()),
            author: Some(author.author.clone()),
            affiliation: Some(author.affiliation.clone()),
            ..Self::article_only(article)
        }
    }

    fn author_only(author: &AuthorSummary) -> Self {
        Self {
            conference_type: Some(author.conference_type.clone()),
            author: Some(author.author.clone()),
            affiliation: Some(author.affiliation.clone()),
            ..Default::default()
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        let cells = [
            ("conferenceType", &self.conference_type),
            ("sessionName", &self.session_name),
            ("presentationName", &self.presentation_name),
            ("author", &self.author),
            ("affiliation", &self.affiliation),
        ];
        for (key, value) in cells {
            if let Some(v) = value {
                row.insert(key, v.as_str());
            }
        }
        row
    }
}

/// Source of creator (author) JSON-LD records
#[allow(async_fn_in_trait)]
pub trait CreatorSource {
    /// `Ok(None)` when the source has no record for `id`
    async fn creator(&self, id: &str) -> Result<Option<Value>>;
}

/// Record id with any trailing `.json` removed
fn record_key(id: &str) -> &str {
    id.strip_suffix(".json").unwrap_or(id)
}

/// Creators fetched from CiNii Research
pub struct RemoteCreators<'a> {
    client: &'a CiniiClient,
}

impl<'a> RemoteCreators<'a> {
    pub fn new(client: &'a CiniiClient) -> Self {
        Self { client }
    }
}

impl CreatorSource for RemoteCreators<'_> {
    async fn creator(&self, id: &str) -> Result<Option<Value>> {
        self.client.record(id).await.map(Some)
    }
}

/// Creators looked up in previously fetched author records
#[derive(Debug, Default)]
pub struct LocalCreators {
    by_id: HashMap<String, Value>,
}

impl LocalCreators {
    /// Index records by `@id` (`.json` suffix dropped); records without
    /// one are skipped
    pub fn new(records: Vec<Value>) -> Self {
        let by_id: HashMap<String, Value> = records
            .into_iter()
            .filter_map(|r| {
                let id = record_key(r.get("@id").and_then(Value::as_str)?).to_string();
                Some((id, r))
            })
            .collect();
        info!(count = by_id.len(), "Indexed local author records");
        Self { by_id }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl CreatorSource for LocalCreators {
    async fn creator(&self, id: &str) -> Result<Option<Value>> {
        Ok(self.by_id.get(record_key(id)).cloned())
    }
}

/// The three review sheet variants
#[derive(Debug, Default)]
pub struct AggregateResults {
    /// Every row; articles without creators get one article-only row
    pub all: Vec<AggregateRow>,
    /// Articles without creators left out
    pub ignore_no_author: Vec<AggregateRow>,
    /// Also leaves out articles where no creator has an affiliation
    pub ignore_no_author_and_no_affiliation: Vec<AggregateRow>,
}

impl AggregateResults {
    pub fn extend(&mut self, other: AggregateResults) {
        self.all.extend(other.all);
        self.ignore_no_author.extend(other.ignore_no_author);
        self.ignore_no_author_and_no_affiliation
            .extend(other.ignore_no_author_and_no_affiliation);
    }
}

/// Build review rows for a batch of article records
pub async fn aggregate<S: CreatorSource>(articles: &[Value], source: &S) -> Result<AggregateResults> {
    let mut results = AggregateResults::default();

    for record in articles {
        let article = ArticleSummary::from_record(record)?;

        if article.creator_ids.is_empty() {
            debug!(article = %article.id, "Article has no creator");
            results.all.push(AggregateRow::article_only(&article));
            continue;
        }

        let mut authors = Vec::with_capacity(article.creator_ids.len());
        for creator_id in &article.creator_ids {
            let Some(creator) = source.creator(creator_id).await? else {
                warn!(article = %article.id, creator = %creator_id, "Author record not found, skipped");
                continue;
            };
            authors.push(AuthorSummary::from_creator_record(creator_id, &creator)?);
        }

        if authors.is_empty() {
            results.all.push(AggregateRow::article_only(&article));
            continue;
        }

        let has_affiliation = authors.iter().any(|a| !a.affiliation.is_empty());
        for author in &authors {
            let row = AggregateRow::with_author(&article, author);
            results.all.push(row.clone());
            results.ignore_no_author.push(row.clone());
            if has_affiliation {
                results.ignore_no_author_and_no_affiliation.push(row);
            }
        }
    }

    info!(
        articles = articles.len(),
        rows = results.all.len(),
        "Aggregated authors"
    );
    Ok(results)
}

/// Review sheet from rows
pub fn aggregate_table(rows: &[AggregateRow]) -> Table {
    Table {
        name: AGGREGATE_SHEET.to_string(),
        columns: AGGREGATE_COLUMNS
            .iter()
            .map(|(k, h)| Column::new(*k, *h))
            .collect(),
        rows: rows.iter().map(AggregateRow::to_row).collect(),
    }
}

/// Review sheet listing author records on their own
pub fn author_summary_table(authors: &[Value]) -> Result<Table> {
    let rows = authors
        .iter()
        .map(|record| AuthorSummary::from_record(record).map(|a| AggregateRow::author_only(&a)))
        .collect::<Result<Vec<_>>>()?;
    Ok(aggregate_table(&rows))
}

/// True when a product identifier or URL links to JAMAS
pub fn is_medical_journal(record: &Value) -> bool {
    let starts_with_jamas =
        |v: Option<&Value>| v.and_then(Value::as_str).is_some_and(|s| s.starts_with(JAMAS_LINK_PREFIX));

    let in_identifiers = record
        .get("productIdentifier")
        .and_then(Value::as_array)
        .is_some_and(|ids| {
            ids.iter()
                .any(|p| starts_with_jamas(p.get("identifier").and_then(|i| i.get("@value"))))
        });

    let in_urls = record
        .get("url")
        .and_then(Value::as_array)
        .is_some_and(|urls| urls.iter().any(|u| starts_with_jamas(u.get("@id"))));

    in_identifiers || in_urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(id: &str, creators: &[&str]) -> Value {
        let creators: Vec<Value> = creators.iter().map(|c| json!({"@id": c})).collect();
        let mut record = json!({
            "@id": id,
            "dc:title": [{"@language": "ja", "@value": format!("演題 {}", id)}],
            "dataSourceIdentifier": [
                {"@type": "JALC", "@value": "1"},
                {"@type": "CROSSREF", "@value": "2"},
                {"@type": "JALC", "@value": "3"}
            ]
        });
        if !creators.is_empty() {
            record["creator"] = Value::Array(creators);
        }
        record
    }

    fn author(id: &str, name: &str, institution: Option<&str>) -> Value {
        let mut record = json!({
            "@id": id,
            "foaf:Person": [{"foaf:name": [{"@language": "ja", "@value": name}]}],
            "dataSourceIdentifier": [{"@type": "KAKEN", "@value": "x"}]
        });
        if let Some(inst) = institution {
            record["career"] = json!([{"institution": {"notation": [{"@language": "ja", "@value": inst}]}}]);
        }
        record
    }

    #[test]
    fn test_article_summary_requires_title_and_sources() {
        let summary = ArticleSummary::from_record(&article("a1", &["p1"])).expect("valid");
        assert_eq!(summary.presentation_name, "演題 a1");
        assert_eq!(summary.session_name, "JALC, CROSSREF");
        assert_eq!(summary.creator_ids, vec!["p1".to_string()]);

        let mut no_sources = article("a2", &[]);
        no_sources["dataSourceIdentifier"] = json!([]);
        assert!(matches!(
            ArticleSummary::from_record(&no_sources),
            Err(CiniiError::Validation(_))
        ));

        let no_title = json!({"@id": "a3", "dataSourceIdentifier": [{"@type": "JALC"}]});
        assert!(ArticleSummary::from_record(&no_title).is_err());
    }

    #[tokio::test]
    async fn test_aggregate_three_variants() -> Result<()> {
        let creators = LocalCreators::new(vec![
            author("p1", "山田 太郎", Some("東京大学")),
            author("p2", "佐藤 花子", None),
            author("p3", "鈴木 一郎", None),
        ]);
        let articles = vec![
            article("a1", &["p1", "p2"]),
            article("a2", &[]),
            article("a3", &["p3.json"]),
        ];

        let results = aggregate(&articles, &creators).await?;

        assert_eq!(results.all.len(), 4);
        assert_eq!(results.all[0].author.as_deref(), Some("山田太郎"));
        assert_eq!(results.all[0].affiliation.as_deref(), Some("東京大学"));
        assert_eq!(results.all[0].conference_type.as_deref(), Some("KAKEN"));
        assert_eq!(results.all[2].author, None);
        assert_eq!(results.all[2].presentation_name.as_deref(), Some("演題 a2"));

        assert_eq!(results.ignore_no_author.len(), 3);
        assert_eq!(results.ignore_no_author_and_no_affiliation.len(), 2);
        assert_eq!(
            results.ignore_no_author_and_no_affiliation[1].author.as_deref(),
            Some("佐藤花子")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_local_creators_accept_json_suffixed_ids() -> Result<()> {
        let creators = LocalCreators::new(vec![author(
            "https://cir.nii.ac.jp/crid/1.json",
            "山田 太郎",
            None,
        )]);
        assert!(creators.creator("https://cir.nii.ac.jp/crid/1").await?.is_some());
        assert!(creators.creator("https://cir.nii.ac.jp/crid/1.json").await?.is_some());

        let results = aggregate(&[article("a1", &["https://cir.nii.ac.jp/crid/1"])], &creators).await?;
        assert_eq!(results.all.len(), 1);
        assert_eq!(results.all[0].author.as_deref(), Some("山田太郎"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_creators_are_skipped() -> Result<()> {
        let creators = LocalCreators::new(vec![author("p1", "山田 太郎", Some("東京大学"))]);
        let articles = vec![article("a1", &["p1", "p2"]), article("a2", &["p9"])];

        let results = aggregate(&articles, &creators).await?;

        assert_eq!(results.all.len(), 2);
        assert_eq!(results.all[0].author.as_deref(), Some("山田太郎"));
        assert_eq!(results.all[1].author, None);
        assert_eq!(results.all[1].presentation_name.as_deref(), Some("演題 a2"));
        assert_eq!(results.ignore_no_author.len(), 1);
        assert_eq!(results.ignore_no_author_and_no_affiliation.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_rejects_nameless_author() {
        let mut nameless = author("p1", "", None);
        nameless["foaf:Person"] = json!([]);
        let creators = LocalCreators::new(vec![nameless]);

        let err = aggregate(&[article("a1", &["p1"])], &creators)
            .await
            .expect_err("nameless author");
        assert!(matches!(err, CiniiError::Validation(_)));
    }

    #[test]
    fn test_aggregate_table_has_fixed_columns() {
        let table = aggregate_table(&[AggregateRow {
            author: Some("山田太郎".to_string()),
            ..Default::default()
        }]);
        assert_eq!(table.columns.len(), 15);
        assert_eq!(table.columns[7].header, "人物");
        assert_eq!(table.rows[0].get("author"), Some("山田太郎"));
        assert_eq!(table.rows[0].get("affiliation"), None);
    }

    #[test]
    fn test_is_medical_journal() {
        let by_identifier = json!({
            "productIdentifier": [{"identifier": {"@type": "URI", "@value": "https://search.jamas.or.jp/link/ui/2023123456"}}]
        });
        let by_url = json!({"url": [{"@id": "https://search.jamas.or.jp/link/ui/2023000001"}]});
        let neither = json!({
            "productIdentifier": [{"identifier": {"@type": "DOI", "@value": "10.1234/abc"}}],
            "url": [{"@id": "https://example.org/paper"}]
        });

        assert!(is_medical_journal(&by_identifier));
        assert!(is_medical_journal(&by_url));
        assert!(!is_medical_journal(&neither));
        assert!(!is_medical_journal(&json!({})));
    }
}
