//! Field catalogue for CiNii Research JSON-LD records.
//!
//! Holds the allow-lists every export validates against: flattened column
//! keys with their sheet headers, the top-level key classification used by
//! the main table, and the Japanese label tables used by the labeled layout.

use crate::error::{CiniiError, Result};
use crate::flatten::SEPARATOR;
use std::fmt;
use std::str::FromStr;

/// Record family a catalogue applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Article,
    Author,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Article => "article",
            RecordKind::Author => "author",
        }
    }

    /// Flattened `(column key, header)` pairs in display order
    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            RecordKind::Article => ARTICLE_COLUMNS,
            RecordKind::Author => AUTHOR_COLUMNS,
        }
    }

    /// Known top-level keys with headers (one-sheet layout)
    pub fn top_level_columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            RecordKind::Article => ARTICLE_TOP_LEVEL,
            RecordKind::Author => AUTHOR_TOP_LEVEL,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = CiniiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "article" | "articles" => Ok(RecordKind::Article),
            "author" | "authors" => Ok(RecordKind::Author),
            other => Err(CiniiError::Config(format!("Unknown record kind: {}", other))),
        }
    }
}

/// Top-level keys whose values never contain arrays (scalars or flat objects)
pub const NOT_ARRAY_KEYS: &[&str] = &[
    "@context",
    "jpcoar:conferenceDate",
    "dcterms:medium",
    "@id",
    "@type",
    "resourceType",
    "dc:language",
    "since",
    "until",
    "reviewed",
    "dcterms:accessRights",
    "ndl:dissertationNumber",
    "ndl:dateGranted",
    "ndl:degreeName",
    "jpcoar:conferenceName",
    "jpcoar:conferencePlace",
    "jpcoar:conferenceSponsor",
    "invited",
    "prism:edition",
    "printing",
    "dc:date",
    "dc:creator",
    "publicationCountryCode",
    "cinii:size",
    "dcterms:extent",
    "publicationStatusCode",
    "publicationPeriodicityCode",
    "publicationRegularityCode",
    "serialsTypeCode",
    "datacite:version",
    "createdAt",
    "modifiedAt",
    "allocationAmount",
    "projectStatus",
];

/// Top-level keys whose values are, or contain, arrays
pub const ARRAY_KEYS: &[&str] = &[
    // arrays of literals or flat objects
    "projectIdentifier",
    "personIdentifier",
    "productIdentifier",
    "dc:title",
    "jpcoar:awardTitle",
    "dcterms:alternative",
    "dcterms:publisher",
    "dc:subject",
    "jpcoar:extent",
    "format",
    "dc:rights",
    "cinii:note",
    "dataSourceIdentifier",
    // arrays of objects that hold arrays
    "foaf:Person",
    "career",
    "field",
    "description",
    "researcher",
    "institution",
    "fundingProgram",
    "creator",
    "contributor",
    "url",
    "foaf:topic",
    "project",
    "relatedProject",
    "product",
    "relatedProduct",
    "dcterms:tableOfContents",
    "allocationClassification",
    // objects that hold arrays
    "publication",
    "degreeAwardInstitution",
    "dcterms:subject",
    "grant",
];

pub fn is_array_key(key: &str) -> bool {
    ARRAY_KEYS.contains(&key)
}

pub fn is_not_array_key(key: &str) -> bool {
    NOT_ARRAY_KEYS.contains(&key)
}

/// Top-level property a flattened column key belongs to.
///
/// Property names never contain the separator, so the first segment is it.
pub fn root_property(column: &str) -> &str {
    column.split(SEPARATOR).next().unwrap_or(column)
}

/// Catalogue columns that stay on the main sheet
pub fn main_columns(kind: RecordKind) -> Vec<(&'static str, &'static str)> {
    kind.columns()
        .iter()
        .filter(|(key, _)| !is_array_key(root_property(key)))
        .copied()
        .collect()
}

const CONTEXT_COLUMNS: [(&str, &str); 10] = [
    ("@context-@vocab", "コンテキスト"),
    ("@context-rdfs", "コンテキスト"),
    ("@context-dc", "コンテキスト"),
    ("@context-dcterms", "コンテキスト"),
    ("@context-foaf", "コンテキスト"),
    ("@context-prism", "コンテキスト"),
    ("@context-cinii", "コンテキスト"),
    ("@context-datacite", "コンテキスト"),
    ("@context-ndl", "コンテキスト"),
    ("@context-jpcoar", "コンテキスト"),
];

pub const ARTICLE_COLUMNS: &[(&str, &str)] = &[
    CONTEXT_COLUMNS[0],
    CONTEXT_COLUMNS[1],
    CONTEXT_COLUMNS[2],
    CONTEXT_COLUMNS[3],
    CONTEXT_COLUMNS[4],
    CONTEXT_COLUMNS[5],
    CONTEXT_COLUMNS[6],
    CONTEXT_COLUMNS[7],
    CONTEXT_COLUMNS[8],
    CONTEXT_COLUMNS[9],
    ("@id", "1.CiNiiResearchのID"),
    ("@type", "1.データ種別"),
    ("productIdentifier-identifier-@type", "4.識別子タイプ"),
    ("productIdentifier-identifier-@value", "4.コード値"),
    ("productIdentifier-extra-type", "4.拡張項目タイプ"),
    ("productIdentifier-extra-value", "4.拡張項目値"),
    ("resourceType", "5.資源種別"),
    ("dc:title-@language", "6.タイトル(言語種別)"),
    ("dc:title-@value", "6.タイトル"),
    ("dcterms:alternative-@language", "6.その他のタイトル(言語種別)"),
    ("dcterms:alternative-@value", "6.その他のタイトル"),
    ("dc:language", "10.言語"),
    ("description-type", "11.概要(抄録)-種別"),
    ("description-notation-@language", "11.概要(抄録)-表記(言語種別)"),
    ("description-notation-@value", "11.概要(抄録)-表記"),
    ("description-abstractLicenseFlag-@value", "11.概要(抄録)-ライセンスフラグ"),
    ("creator-@id", "17.著者-CiNiiResearchにおけるID"),
    ("creator-@type", "17.著者-成果物における種別"),
    ("creator-personIdentifier-@type", "17.著者-識別子タイプ"),
    ("creator-personIdentifier-@value", "17.著者-コード値"),
    ("creator-foaf:name-@language", "17.著者-氏名(言語種別)"),
    ("creator-foaf:name-@value", "17.著者-氏名"),
    ("creator-jpcoar:affiliationName-@language", "17.著者-所属(言語種別)"),
    ("creator-jpcoar:affiliationName-@value", "17.著者-所属"),
    ("contributor-@id", "18.寄与者-CiNiiResearchにおけるID"),
    ("contributor-@type", "18.寄与者-成果物における種別"),
    ("contributor-personIdentifier-@type", "18.寄与者-識別子タイプ"),
    ("contributor-personIdentifier-@value", "18.寄与者-コード値"),
    ("contributor-foaf:name-@language", "18.寄与者-氏名(言語種別)"),
    ("contributor-foaf:name-@value", "18.寄与者-氏名"),
    ("contributor-jpcoar:affiliationName-@language", "18.寄与者-所属(言語種別)"),
    ("contributor-jpcoar:affiliationName-@value", "18.寄与者-所属"),
    ("publication-publicationIdentifier-@type", "19.掲載誌-識別子タイプ"),
    ("publication-publicationIdentifier-@value", "19.掲載誌-コード値"),
    ("publication-prism:publicationName-@language", "19.掲載誌-タイトル(言語種別)"),
    ("publication-prism:publicationName-@value", "19.掲載誌-タイトル"),
    ("publication-dc:publisher-@language", "19.掲載誌-出版社(言語種別)"),
    ("publication-dc:publisher-@value", "19.掲載誌-出版社"),
    ("publication-prism:publicationDate", "19.掲載誌-出版年月日"),
    ("publication-prism:volume", "19.掲載誌-巻"),
    ("publication-prism:number", "19.掲載誌-号"),
    ("publication-prism:startingPage", "19.掲載誌-開始ページ"),
    ("publication-prism:endingPage", "19.掲載誌-終了ページ"),
    ("publication-jpcoar:numPages", "19.掲載誌-ページ数"),
    ("publication-foreign", "19.掲載誌-国際誌の有無"),
    ("publication-jointInternationalResearch", "19.国際共著の有無"),
    ("reviewed", "19.査読の有無"),
    ("dcterms:accessRights", "19.オープンアクセスの有無"),
    ("jpcoar:conferenceName", "21.学会または会議名"),
    ("jpcoar:conferencePlace", "21.開催地"),
    ("jpcoar:conferenceDate-jpcoar:startDay", "21.開催期間-開始日"),
    ("jpcoar:conferenceDate-jpcoar:startMonth", "21.開催期間-開始月"),
    ("jpcoar:conferenceDate-jpcoar:startYear", "21.開催期間-開始年"),
    ("jpcoar:conferenceDate-jpcoar:endDay", "21.開催期間-終了日"),
    ("jpcoar:conferenceDate-jpcoar:endMonth", "21.開催期間-終了月"),
    ("jpcoar:conferenceDate-jpcoar:endYear", "21.開催期間-終了年"),
    ("jpcoar:conferenceSponsor", "21.主催者"),
    ("invited", "21.招待の有無"),
    ("datacite:version", "25.バージョン"),
    ("dc:rights-elm", "26.著作権-表記"),
    ("url-@id", "27.URL"),
    ("url-notation-@language", "27.URL-表記(言語種別)"),
    ("url-notation-@value", "27.URL-表記"),
    ("createdAt", "28.公開日"),
    ("modifiedAt", "29.最終更新日"),
    ("foaf:topic-@id", "30.キーワード-CiNiiResearchにおけるID"),
    ("foaf:topic-dc:title", "30.キーワード-表記"),
    ("project-@id", "32.プロジェクト-CiNiiResearchにおけるID"),
    ("project-@type", "32.プロジェクト-成果物における種別"),
    ("project-projectIdentifier-@type", "32.プロジェクト-識別子タイプ"),
    ("project-projectIdentifier-@value", "32.プロジェクト-コード値"),
    ("project-notation-@language", "32.プロジェクト-表記(言語種別)"),
    ("project-notation-@value", "32.プロジェクト-表記"),
    ("project-role", "32.プロジェクト-本研究における役割"),
    ("relatedProduct-@id", "35.関連成果物-CiNiiResearchにおけるID"),
    ("relatedProduct-@type", "35.関連成果物-成果物における種別"),
    ("relatedProduct-productIdentifier-@type", "35.関連成果物-識別子タイプ"),
    ("relatedProduct-productIdentifier-@value", "35.関連成果物-コード値"),
    ("relatedProduct-resourceType", "35.関連成果物-資源種別"),
    ("relatedProduct-relationType-elm", "35.関連成果物-関連種別"),
    ("relatedProduct-jpcoar:relatedTitle-@language", "35.関連成果物-タイトル(言語種別)"),
    ("relatedProduct-jpcoar:relatedTitle-@value", "35.関連成果物-タイトル"),
    ("dataSourceIdentifier-@type", "36.データソース識別子-識別子タイプ"),
    ("dataSourceIdentifier-@value", "36.データソース識別子-コード値"),
];

pub const ARTICLE_TOP_LEVEL: &[(&str, &str)] = &[
    ("@context", "コンテキスト"),
    ("@id", "1.CiNiiResearchのID"),
    ("@type", "1.データ種別"),
    ("productIdentifier", "4.CiNiiResearch外部の識別子"),
    ("resourceType", "5.資源種別"),
    ("dc:title", "6.タイトル"),
    ("dcterms:alternative", "6.その他のタイトル"),
    ("dc:language", "10.言語"),
    ("description", "11.概要(抄録)"),
    ("creator", "17.著者"),
    ("contributor", "18.寄与者"),
    ("publication", "19.掲載誌"),
    ("reviewed", "19.査読の有無"),
    ("dcterms:accessRights", "19.オープンアクセスの有無"),
    ("jpcoar:conferenceName", "21.学会または会議名"),
    ("jpcoar:conferencePlace", "21.開催地"),
    ("jpcoar:conferenceDate", "21.開催期間"),
    ("jpcoar:conferenceSponsor", "21.主催者"),
    ("invited", "21.招待の有無"),
    ("datacite:version", "25.バージョン"),
    ("dc:rights", "26.著作権"),
    ("url", "27.URL"),
    ("createdAt", "28.公開日"),
    ("modifiedAt", "29.最終更新日"),
    ("foaf:topic", "30.キーワード"),
    ("project", "32.プロジェクト（研究課題）"),
    ("relatedProduct", "35.関連成果物"),
    ("dataSourceIdentifier", "36.データソース識別子"),
];

pub const AUTHOR_COLUMNS: &[(&str, &str)] = &[
    CONTEXT_COLUMNS[0],
    CONTEXT_COLUMNS[1],
    CONTEXT_COLUMNS[2],
    CONTEXT_COLUMNS[3],
    CONTEXT_COLUMNS[4],
    CONTEXT_COLUMNS[5],
    CONTEXT_COLUMNS[6],
    CONTEXT_COLUMNS[7],
    CONTEXT_COLUMNS[8],
    CONTEXT_COLUMNS[9],
    ("@id", "1.CiNiiResearchのID"),
    ("@type", "1.データ種別"),
    ("personIdentifier-@type", "3.CiNiiResearch外部の識別子-識別子タイプ"),
    ("personIdentifier-@value", "3.CiNiiResearch外部の識別子-コード値"),
    ("foaf:Person-foaf:name-@language", "7.氏名-表記(言語種別)"),
    ("foaf:Person-foaf:name-@value", "7.氏名-表記"),
    ("foaf:Person-foaf:familyName-@language", "7.氏名-姓(言語種別)"),
    ("foaf:Person-foaf:familyName-@value", "7.氏名-姓"),
    ("foaf:Person-foaf:givenName-@language", "7.氏名-名(言語種別)"),
    ("foaf:Person-foaf:givenName-@value", "7.氏名-名"),
    ("foaf:Person-foaf:middleName-@language", "7.氏名-ミドルネーム(言語種別)"),
    ("foaf:Person-foaf:middleName-@value", "7.氏名-ミドルネーム"),
    ("career-custom-id", "8.所属-集計時に独自で定義したID"),
    ("career-since", "8.所属-開始日"),
    ("career-until", "8.所属-終了日"),
    ("career-institution-institutionIdentifier-@type", "8.所属-機関-識別子タイプ"),
    ("career-institution-institutionIdentifier-@value", "8.所属-機関-コード値"),
    ("career-institution-notation-@language", "8.所属-機関-表記(言語種別)"),
    ("career-institution-notation-@value", "8.所属-機関-表記"),
    ("career-department-departmentIdentifier-@type", "8.所属-部局-識別子タイプ"),
    ("career-department-departmentIdentifier-@value", "8.所属-部局-コード値"),
    ("career-department-notation-@language", "8.所属-部局-表記(言語種別)"),
    ("career-department-notation-@value", "8.所属-部局-表記"),
    ("career-jobTitle-jobTitleIdentifier-@type", "8.所属-役職-識別子タイプ"),
    ("career-jobTitle-jobTitleIdentifier-@value", "8.所属-役職-コード値"),
    ("career-jobTitle-notation-@language", "8.所属-役職-表記(言語種別)"),
    ("career-jobTitle-notation-@value", "8.所属-役職-表記"),
    ("url-@id", "27.URL"),
    ("url-notation-@language", "27.URL-表記(言語種別)"),
    ("url-notation-@value", "27.URL-表記"),
    ("project-@id", "32.プロジェクト-CiNiiResearchにおけるID"),
    ("project-@type", "32.プロジェクト-成果物における種別"),
    ("project-projectIdentifier-@type", "32.プロジェクト-識別子タイプ"),
    ("project-projectIdentifier-@value", "32.プロジェクト-コード値"),
    ("project-notation-@language", "32.プロジェクト-表記(言語種別)"),
    ("project-notation-@value", "32.プロジェクト-表記"),
    ("project-role", "32.プロジェクト-本研究における役割"),
    ("product-@id", "34.成果物-CiNiiResearchにおけるID"),
    ("product-@type", "34.成果物-成果物種別"),
    ("product-resourceType", "34.成果物-リソース種別"),
    ("product-productIdentifier-@type", "34.成果物-識別子タイプ"),
    ("product-productIdentifier-@value", "34.成果物-コード値"),
    ("product-notation-@language", "34.成果物-表記(言語種別)"),
    ("product-notation-@value", "34.成果物-表記"),
    ("product-relation-type", "34.成果物-関連種別"),
    ("product-relation-detail", "34.成果物-関連詳細"),
    ("dataSourceIdentifier-@type", "36.データソース識別子-識別子タイプ"),
    ("dataSourceIdentifier-@value", "36.データソース識別子-コード値"),
];

pub const AUTHOR_TOP_LEVEL: &[(&str, &str)] = &[
    ("@context", "コンテキスト"),
    ("@id", "1.CiNiiResearchのID"),
    ("@type", "1.データ種別"),
    ("personIdentifier", "3.CiNiiResearch外部の識別子"),
    ("foaf:Person", "7.氏名"),
    ("career", "8.所属"),
    ("url", "27.URL"),
    ("project", "32.プロジェクト（研究課題）"),
    ("product", "34.成果物"),
    ("dataSourceIdentifier", "36.データソース識別子"),
];

// === Label tables (labeled layout) ===

/// Top-level key to Japanese label
pub const KEY_LABELS: &[(&str, &str)] = &[
    ("@context", "コンテキスト"),
    ("@id", "CiNiiResearchのID"),
    ("@type", "データ種別"),
    ("projectIdentifier", "CiNiiResearch外部の識別子"),
    ("personIdentifier", "CiNiiResearch外部の識別子"),
    ("productIdentifier", "CiNiiResearch外部の識別子"),
    ("resourceType", "資源種別"),
    ("dc:title", "タイトル"),
    ("jpcoar:awardTitle", "タイトル（プロジェクト）"),
    ("dcterms:alternative", "その他のタイトル"),
    ("foaf:Person", "氏名"),
    ("career", "所属"),
    ("field", "審査区分/研究分野"),
    ("dc:language", "言語"),
    ("description", "概要(抄録)"),
    ("researcher", "研究者"),
    ("since", "開始日"),
    ("until", "終了日"),
    ("institution", "研究機関"),
    ("fundingProgram", "助成機関"),
    ("creator", "著者"),
    ("contributor", "寄与者"),
    ("publication", "掲載誌"),
    ("reviewed", "査読の有無"),
    ("dcterms:accessRights", "オープンアクセスの有無"),
    ("ndl:dissertationNumber", "学位授与番号"),
    ("ndl:dateGranted", "学位授与年月日"),
    ("ndl:degreeName", "学位名"),
    ("degreeAwardInstitution", "学位授与機関"),
    ("jpcoar:conferenceName", "学会または会議名"),
    ("jpcoar:conferencePlace", "開催地"),
    ("jpcoar:conferenceDate", "開催機関"),
    ("jpcoar:conferenceSponsor", "主催者"),
    ("invited", "招待の有無"),
    ("prism:edition", "版"),
    ("printing", "刷"),
    ("dc:date", "出版年月日"),
    ("dcterms:medium", "出版種別コード"),
    ("dc:creator", "責任表示"),
    ("publicationCountryCode", "出版国コード"),
    ("dcterms:publisher", "出版情報"),
    ("dc:subject", "分類"),
    ("cinii:size", "大きさ、版型"),
    ("dcterms:extent", "ページ数"),
    ("publicationStatusCode", "出版状況コード"),
    ("publicationPeriodicityCode", "刊行頻度コード"),
    ("publicationRegularityCode", "定期性コード"),
    ("serialsTypeCode", "逐次刊行物のタイプコード"),
    ("jpcoar:extent", "サイズ"),
    ("format", "フォーマット"),
    ("datacite:version", "バージョン"),
    ("dc:rights", "著作権"),
    ("url", "URL"),
    ("createdAt", "公開日"),
    ("modifiedAt", "最終更新日"),
    ("foaf:topic", "キーワード"),
    ("dcterms:subject", "件名"),
    ("cinii:note", "注記"),
    ("project", "プロジェクト（研究課題）"),
    ("relatedProject", "関連プロジェクト"),
    ("product", "成果物"),
    ("relatedProduct", "関連成果物"),
    ("dataSourceIdentifier", "データソース識別子"),
    ("dcterms:tableOfContents", "目次"),
    ("grant", "助成プログラム"),
    ("allocationClassification", "配分区分"),
    ("allocationAmount", "配分額"),
    ("projectStatus", "プロジェクト状況"),
];

const PERSON_LABELS: &[(&str, &str)] = &[
    ("foaf:name", "表記"),
    ("foaf:familyName", "姓"),
    ("foaf:givenName", "名"),
    ("foaf:middleName", "ミドルネーム"),
];

const CAREER_LABELS: &[(&str, &str)] = &[
    ("institution", "所属機関"),
    ("department", "部局"),
    ("jobTitle", "職名"),
    ("since", "着任日"),
    ("until", "離任日"),
];

const FIELD_LABELS: &[(&str, &str)] = &[("keyword", "キーワード")];

const DESCRIPTION_LABELS: &[(&str, &str)] = &[
    ("type", "概要種別"),
    ("notation", "表記"),
    ("abstractLicenseFlag", "抄録ライセンスフラグ"),
];

const PERSON_REF_LABELS: &[(&str, &str)] = &[
    ("@id", "CiNiiResearchのID"),
    ("@type", "データ種別"),
    ("personIdentifier", "CiNiiResearch外部の識別子"),
    ("foaf:name", "氏名"),
    ("jpcoar:affiliationName", "所属"),
    ("role", "本研究における役割"),
];

const INSTITUTION_LABELS: &[(&str, &str)] = &[
    ("institutionIdentifier", "CiNiiResearch外部の識別子"),
    ("notation", "表記"),
];

const FUNDING_PROGRAM_LABELS: &[(&str, &str)] = &[("jpcoar:funderName", "表記")];

const PUBLICATION_LABELS: &[(&str, &str)] = &[
    ("publicationIdentifier", "CiNiiResearch外部の識別子"),
    ("prism:publicationName", "タイトル"),
    ("dc:publisher", "発行者"),
    ("prism:publicationDate", "発行日"),
    ("prism:volume", "巻"),
    ("prism:number", "号"),
    ("prism:startingPage", "開始ページ"),
    ("prism:endingPage", "終了ページ"),
    ("jpcoar:numPages", "総ページ数"),
    ("foreign", "国際誌の有無"),
    ("jointInternationalResearch", "国際共著の有無"),
];

const DEGREE_AWARD_INSTITUTION_LABELS: &[(&str, &str)] = &[
    ("institutionIdentifier", "研究機関識別子"),
    ("jpcoar:degreeGrantorName", "表記"),
];

const MEDIUM_LABELS: &[(&str, &str)] = &[
    ("generalMaterialDesignationCode", "一般"),
    ("specificMaterialDesignationCode", "特殊"),
];

const PUBLISHER_LABELS: &[(&str, &str)] = &[
    ("dc:publisher", "出版社"),
    ("publicationPlace", "出版地"),
    ("prism:publicationDate", "出版年月日"),
];

const URL_LABELS: &[(&str, &str)] = &[("@id", "外部サービスなどへのリンク"), ("notation", "表記")];

const SUBJECT_LABELS: &[(&str, &str)] = &[("subjectScheme", "種類コード"), ("notation", "表記")];

const PROJECT_LABELS: &[(&str, &str)] = &[
    ("@id", "CiNiiResearchのID"),
    ("@type", "データ種別"),
    ("projectIdentifier", "CiNiiResearch外部の識別子"),
    ("role", "本研究における役割"),
    ("notation", "課題表記"),
    ("jpcoar:relatedTitle", "タイトル"),
    ("jpcoar:awardTitle", "タイトル"),
];

const RELATED_PROJECT_LABELS: &[(&str, &str)] = &[
    ("@id", "CiNiiResearchのID"),
    ("@type", "データ種別"),
    ("projectIdentifier", "CiNiiResearch外部の識別子"),
    ("relationType", "本研究との関連"),
    ("notation", "課題表記"),
    ("jpcoar:relatedTitle", "タイトル"),
    ("jpcoar:awardTitle", "タイトル"),
];

const PRODUCT_LABELS: &[(&str, &str)] = &[
    ("@id", "CiNiiResearchのID"),
    ("@type", "データ種別"),
    ("resourceType", "成果物資源種別"),
    ("productIdentifier", "CiNiiResearch外部の識別子"),
    ("relation", "成果物との関連種別"),
    ("notation", "成果物表記"),
    ("jpcoar:relatedTitle", "タイトル"),
    ("jpcoar:awardTitle", "タイトル"),
];

const RELATED_PRODUCT_LABELS: &[(&str, &str)] = &[
    ("@id", "CiNiiResearchのID"),
    ("@type", "データ種別"),
    ("productIdentifier", "CiNiiResearch外部の識別子"),
    ("resourceType", "成果物資源種別"),
    ("relationType", "この成果物との関連性"),
    ("notation", "成果物表記"),
    ("jpcoar:relatedTitle", "タイトル"),
    ("jpcoar:awardTitle", "タイトル"),
];

const GRANT_LABELS: &[(&str, &str)] = &[
    ("grantIdentifier", "CiNiiResearch外部の識別子"),
    ("jpcoar:fundingStream", "表記"),
];

const ALLOCATION_CLASSIFICATION_LABELS: &[(&str, &str)] = &[("notation", "表記")];

const ALLOCATION_AMOUNT_LABELS: &[(&str, &str)] =
    &[("totalCost", "合計金額"), ("breakdownCost", "経費内訳")];

/// Nested property labels, keyed by the owning top-level key
pub const NEST_LABELS: &[(&str, &[(&str, &str)])] = &[
    ("foaf:Person", PERSON_LABELS),
    ("career", CAREER_LABELS),
    ("field", FIELD_LABELS),
    ("description", DESCRIPTION_LABELS),
    ("researcher", PERSON_REF_LABELS),
    ("institution", INSTITUTION_LABELS),
    ("fundingProgram", FUNDING_PROGRAM_LABELS),
    ("creator", PERSON_REF_LABELS),
    ("contributor", PERSON_REF_LABELS),
    ("publication", PUBLICATION_LABELS),
    ("degreeAwardInstitution", DEGREE_AWARD_INSTITUTION_LABELS),
    ("dcterms:medium", MEDIUM_LABELS),
    ("dcterms:publisher", PUBLISHER_LABELS),
    ("url", URL_LABELS),
    ("dcterms:subject", SUBJECT_LABELS),
    ("project", PROJECT_LABELS),
    ("relatedProject", RELATED_PROJECT_LABELS),
    ("product", PRODUCT_LABELS),
    ("relatedProduct", RELATED_PRODUCT_LABELS),
    ("grant", GRANT_LABELS),
    ("allocationClassification", ALLOCATION_CLASSIFICATION_LABELS),
    ("allocationAmount", ALLOCATION_AMOUNT_LABELS),
];

/// Japanese label for a top-level key
pub fn label(key: &str) -> Option<&'static str> {
    KEY_LABELS.iter().find(|(k, _)| *k == key).map(|(_, l)| *l)
}

/// Sub-key label table for a top-level key
pub fn nested_labels(key: &str) -> Option<&'static [(&'static str, &'static str)]> {
    NEST_LABELS.iter().find(|(k, _)| *k == key).map(|(_, t)| *t)
}

/// Label for a sub-key of `parent`, if allow-listed
pub fn nested_label(parent: &str, sub_key: &str) -> Option<&'static str> {
    nested_labels(parent)?
        .iter()
        .find(|(k, _)| *k == sub_key)
        .map(|(_, l)| *l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_classes_are_disjoint() {
        let not_array: HashSet<&str> = NOT_ARRAY_KEYS.iter().copied().collect();
        assert!(ARRAY_KEYS.iter().all(|k| !not_array.contains(k)));
    }

    #[test]
    fn test_catalogue_keys_unique() {
        for kind in [RecordKind::Article, RecordKind::Author] {
            let mut seen = HashSet::new();
            for (key, _) in kind.columns() {
                assert!(seen.insert(*key), "{} listed twice for {}", key, kind);
            }
        }
    }

    #[test]
    fn test_main_columns_exclude_array_properties() {
        let main: Vec<_> = main_columns(RecordKind::Article)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert!(main.contains(&"@context-dc"));
        assert!(main.contains(&"jpcoar:conferenceDate-jpcoar:startDay"));
        assert!(main.contains(&"createdAt"));
        assert!(!main.iter().any(|k| k.starts_with("creator")));
        assert!(!main.iter().any(|k| k.starts_with("dc:title")));
        assert!(main.iter().all(|k| is_not_array_key(root_property(k))));
    }

    #[test]
    fn test_labels() {
        assert_eq!(label("creator"), Some("著者"));
        assert_eq!(label("unknown"), None);
        assert_eq!(nested_label("creator", "foaf:name"), Some("氏名"));
        assert_eq!(nested_label("creator", "bogus"), None);
    }

    #[test]
    fn test_record_kind_from_str() {
        assert_eq!("articles".parse::<RecordKind>().ok(), Some(RecordKind::Article));
        assert_eq!("author".parse::<RecordKind>().ok(), Some(RecordKind::Author));
        assert!("project".parse::<RecordKind>().is_err());
    }
}
