//! Relational sheet layout.
//!
//! A record becomes one row on the main sheet plus rows on child sheets,
//! one child sheet per nested collection. Every child row starts with the
//! record `@id`, and rows below an array element also carry that element's
//! `{prefix}-@id` (or a synthesized `{prefix}-custom-id`) so they can be
//! joined back to their parent.

use crate::error::Result;
use crate::flatten::{
    cell_text, check_columns, flatten_into, join_key, stringify_top_level, DriftPolicy, Row,
    ELEMENT_SUFFIX,
};
use crate::schema::{self, RecordKind};
use serde_json::Value;
use tracing::debug;

/// Column suffix for ids synthesized for array elements without `@id`
pub const CUSTOM_ID_SUFFIX: &str = "custom-id";

/// Output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub header: String,
}

impl Column {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
        }
    }
}

/// One sheet worth of rows
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }
}

/// Definition of one child sheet
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Sheet name
    pub name: &'static str,
    /// Property paths from the record root to the collection; rows from
    /// several paths share the sheet
    pub paths: &'static [&'static [&'static str]],
    /// Leaf properties left out because another sheet holds them
    pub skip: &'static [&'static str],
    /// Catalogue columns besides `@id`: exact keys, or prefixes ending in `-`
    pub select: &'static [&'static str],
    /// A parent element without the collection still gets one row holding
    /// its ids
    pub parent_rows: bool,
}

impl TableSpec {
    /// Resolve the sheet's columns from the catalogue
    pub fn columns(&self, kind: RecordKind) -> Vec<Column> {
        kind.columns()
            .iter()
            .filter(|(key, _)| *key == "@id" || self.selects(key))
            .map(|(key, header)| Column::new(*key, *header))
            .collect()
    }

    fn selects(&self, key: &str) -> bool {
        self.select.iter().any(|s| {
            if s.ends_with(crate::flatten::SEPARATOR) {
                key.starts_with(s)
            } else {
                key == *s
            }
        })
    }

    /// Rows for one record.
    ///
    /// A record that yields nothing gets one row holding its `@id`, plus
    /// `{root}-custom-id` = `{@id}-0` when the sheet lists that column and
    /// the root collection is absent.
    pub fn rows(&self, record: &Value, columns: &[&str]) -> Vec<Row> {
        let root_id = record.get("@id").map(cell_text).unwrap_or_default();
        let mut base = Row::new();
        base.insert("@id", root_id.as_str());

        let walker = Walker {
            root_id: &root_id,
            columns,
            skip: self.skip,
            parent_rows: self.parent_rows,
        };

        let mut rows = Vec::new();
        for path in self.paths {
            walker.walk(record, path, "", &base, &mut rows);
        }

        if rows.is_empty() {
            if let Some(head) = self.paths.first().and_then(|p| p.first()) {
                let key = join_key(head, CUSTOM_ID_SUFFIX);
                let absent = record.get(*head).is_none_or(Value::is_null);
                if absent && columns.contains(&key.as_str()) {
                    base.insert(key, format!("{}-0", root_id));
                }
            }
            rows.push(base);
        }
        rows
    }

    /// Emit a row for parent elements that lack the collection
    pub const fn with_parent_rows(self) -> Self {
        Self {
            parent_rows: true,
            ..self
        }
    }
}

struct Walker<'a> {
    root_id: &'a str,
    columns: &'a [&'a str],
    skip: &'a [&'a str],
    parent_rows: bool,
}

impl Walker<'_> {
    fn walk(&self, node: &Value, path: &[&str], prefix: &str, base: &Row, out: &mut Vec<Row>) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };
        let Some(child) = node.get(*head).filter(|v| !v.is_null()) else {
            // below the root, `base` already carries the parent ids
            if self.parent_rows && !prefix.is_empty() {
                out.push(base.clone());
            }
            return;
        };
        let prefix = join_key(prefix, head);

        if rest.is_empty() {
            match child {
                Value::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        let mut row = base.clone();
                        self.leaf(&mut row, &prefix, item, Some(index));
                        out.push(row);
                    }
                }
                other => {
                    let mut row = base.clone();
                    self.leaf(&mut row, &prefix, other, None);
                    out.push(row);
                }
            }
            return;
        }

        match child {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let mut row = base.clone();
                    self.context(&mut row, &prefix, item, Some(index));
                    self.walk(item, rest, &prefix, &row, out);
                }
            }
            Value::Object(_) => {
                let mut row = base.clone();
                self.context(&mut row, &prefix, child, None);
                self.walk(child, rest, &prefix, &row, out);
            }
            _ => debug!(prefix = %prefix, "Scalar where a collection was expected"),
        }
    }

    fn custom_id(&self, row: &mut Row, prefix: &str, item: &Value, index: Option<usize>) {
        let (Some(index), Value::Object(map)) = (index, item) else {
            return;
        };
        let key = join_key(prefix, CUSTOM_ID_SUFFIX);
        if !map.contains_key("@id") && self.columns.contains(&key.as_str()) {
            row.insert(key, format!("{}-{}", self.root_id, index));
        }
    }

    /// Cells of a collection element
    fn leaf(&self, row: &mut Row, prefix: &str, item: &Value, index: Option<usize>) {
        match item {
            Value::Object(map) => {
                self.custom_id(row, prefix, item, index);
                for (key, value) in map {
                    if self.skip.contains(&key.as_str()) {
                        continue;
                    }
                    let column = join_key(prefix, key);
                    match value {
                        Value::Object(_) => flatten_into(row, &column, value),
                        other => row.insert(column, cell_text(other)),
                    }
                }
            }
            scalar if index.is_some() => row.insert(join_key(prefix, ELEMENT_SUFFIX), cell_text(scalar)),
            scalar => row.insert(prefix, cell_text(scalar)),
        }
    }

    /// Parent-side cells carried down to rows of a nested collection.
    /// Only columns the sheet lists are kept.
    fn context(&self, row: &mut Row, prefix: &str, item: &Value, index: Option<usize>) {
        let Value::Object(map) = item else {
            return;
        };
        self.custom_id(row, prefix, item, index);

        let mut cells = Row::new();
        for (key, value) in map {
            let column = join_key(prefix, key);
            match value {
                Value::Array(_) => {}
                Value::Object(_) => flatten_into(&mut cells, &column, value),
                other => cells.insert(column, cell_text(other)),
            }
        }
        for (key, value) in cells.iter() {
            if self.columns.contains(&key) {
                row.insert(key, value);
            }
        }
    }
}

/// Main-sheet row: array-bearing properties dropped, objects flattened one level
pub fn main_row(record: &Value) -> Row {
    let mut row = Row::new();
    let Value::Object(map) = record else {
        return row;
    };

    for (key, value) in map {
        if schema::is_array_key(key) {
            continue;
        }
        match value {
            Value::Object(inner) => {
                for (sub_key, sub_value) in inner {
                    row.insert(join_key(key, sub_key), cell_text(sub_value));
                }
            }
            other => row.insert(key.as_str(), cell_text(other)),
        }
    }
    row
}

/// Main sheet for a batch of records
pub fn main_table(kind: RecordKind, records: &[Value], policy: DriftPolicy) -> Result<Table> {
    let columns: Vec<Column> = schema::main_columns(kind)
        .into_iter()
        .map(|(k, h)| Column::new(k, h))
        .collect();
    let rows: Vec<Row> = records.iter().map(main_row).collect();

    let keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
    check_columns("Main", &rows, &keys, policy)?;

    Ok(Table {
        name: "Main".to_string(),
        columns,
        rows,
    })
}

/// Child sheet for a batch of records
pub fn child_table(
    kind: RecordKind,
    spec: &TableSpec,
    records: &[Value],
    policy: DriftPolicy,
) -> Result<Table> {
    let columns = spec.columns(kind);
    let keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
    let rows: Vec<Row> = records.iter().flat_map(|r| spec.rows(r, &keys)).collect();

    check_columns(spec.name, &rows, &keys, policy)?;

    Ok(Table {
        name: spec.name.to_string(),
        columns,
        rows,
    })
}

/// Main sheet followed by every child sheet of `kind`
pub fn build_tables(kind: RecordKind, records: &[Value], policy: DriftPolicy) -> Result<Vec<Table>> {
    let mut tables = vec![main_table(kind, records, policy)?];
    for spec in table_specs(kind) {
        tables.push(child_table(kind, spec, records, policy)?);
    }
    debug!(kind = %kind, tables = tables.len(), records = records.len(), "Built relational tables");
    Ok(tables)
}

/// One sheet, one row per record, each known top-level property as JSON text
pub fn onesheet_table(kind: RecordKind, records: &[Value], policy: DriftPolicy) -> Result<Table> {
    let columns: Vec<Column> = kind
        .top_level_columns()
        .iter()
        .map(|(k, h)| Column::new(*k, *h))
        .collect();
    let rows: Vec<Row> = records.iter().map(stringify_top_level).collect();

    let keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
    check_columns("Main", &rows, &keys, policy)?;

    Ok(Table {
        name: "Main".to_string(),
        columns,
        rows,
    })
}

pub fn table_specs(kind: RecordKind) -> &'static [TableSpec] {
    match kind {
        RecordKind::Article => ARTICLE_TABLES,
        RecordKind::Author => AUTHOR_TABLES,
    }
}

const fn spec(
    name: &'static str,
    paths: &'static [&'static [&'static str]],
    skip: &'static [&'static str],
    select: &'static [&'static str],
) -> TableSpec {
    TableSpec {
        name,
        paths,
        skip,
        select,
        parent_rows: false,
    }
}

const PERSON_REF_CHILDREN: &[&str] = &["personIdentifier", "foaf:name", "jpcoar:affiliationName"];

pub const ARTICLE_TABLES: &[TableSpec] = &[
    spec("CiNii外部の識別子", &[&["productIdentifier"]], &[], &["productIdentifier-"]),
    spec(
        "タイトル",
        &[&["dc:title"], &["dcterms:alternative"]],
        &[],
        &["dc:title-", "dcterms:alternative-"],
    ),
    spec(
        "概要(抄録)",
        &[&["description", "notation"]],
        &[],
        &["description-"],
    ),
    spec("著者", &[&["creator"]], PERSON_REF_CHILDREN, &["creator-@id", "creator-@type"]),
    spec(
        "著者-CiNiiResearch外部の識別子",
        &[&["creator", "personIdentifier"]],
        &[],
        &["creator-@id", "creator-personIdentifier-"],
    ),
    spec(
        "著者-氏名",
        &[&["creator", "foaf:name"]],
        &[],
        &["creator-@id", "creator-foaf:name-"],
    ),
    spec(
        "著者-所属",
        &[&["creator", "jpcoar:affiliationName"]],
        &[],
        &["creator-@id", "creator-jpcoar:affiliationName-"],
    ),
    spec(
        "寄与者",
        &[&["contributor"]],
        PERSON_REF_CHILDREN,
        &["contributor-@id", "contributor-@type"],
    ),
    spec(
        "寄与者-CiNiiResearch外部の識別子",
        &[&["contributor", "personIdentifier"]],
        &[],
        &["contributor-@id", "contributor-personIdentifier-"],
    ),
    spec(
        "寄与者-氏名",
        &[&["contributor", "foaf:name"]],
        &[],
        &["contributor-@id", "contributor-foaf:name-"],
    ),
    spec(
        "寄与者-所属",
        &[&["contributor", "jpcoar:affiliationName"]],
        &[],
        &["contributor-@id", "contributor-jpcoar:affiliationName-"],
    ),
    spec(
        "掲載誌",
        &[&["publication"]],
        &["publicationIdentifier", "prism:publicationName", "dc:publisher"],
        &[
            "publication-prism:publicationDate",
            "publication-prism:volume",
            "publication-prism:number",
            "publication-prism:startingPage",
            "publication-prism:endingPage",
            "publication-jpcoar:numPages",
            "publication-foreign",
            "publication-jointInternationalResearch",
        ],
    ),
    spec(
        "掲載誌-識別子",
        &[&["publication", "publicationIdentifier"]],
        &[],
        &["publication-publicationIdentifier-"],
    ),
    spec(
        "掲載誌-名称",
        &[&["publication", "prism:publicationName"]],
        &[],
        &["publication-prism:publicationName-"],
    ),
    spec(
        "掲載誌-出版社",
        &[&["publication", "dc:publisher"]],
        &[],
        &["publication-dc:publisher-"],
    ),
    spec("権利", &[&["dc:rights"]], &[], &["dc:rights-"]),
    spec("URL", &[&["url"]], &["notation"], &["url-@id"]),
    spec("URL-表記", &[&["url", "notation"]], &[], &["url-@id", "url-notation-"]).with_parent_rows(),
    spec("トピック", &[&["foaf:topic"]], &[], &["foaf:topic-"]),
    spec(
        "プロジェクト",
        &[&["project"]],
        &["projectIdentifier", "notation"],
        &["project-@id", "project-@type", "project-role"],
    ),
    spec(
        "プロジェクト-識別子",
        &[&["project", "projectIdentifier"]],
        &[],
        &["project-@id", "project-projectIdentifier-"],
    ).with_parent_rows(),
    spec(
        "プロジェクト-表記",
        &[&["project", "notation"]],
        &[],
        &["project-@id", "project-notation-"],
    ).with_parent_rows(),
    spec(
        "関連成果物",
        &[&["relatedProduct"]],
        &["productIdentifier", "relationType", "jpcoar:relatedTitle"],
        &["relatedProduct-@id", "relatedProduct-@type", "relatedProduct-resourceType"],
    ),
    spec(
        "関連成果物-識別子",
        &[&["relatedProduct", "productIdentifier"]],
        &[],
        &["relatedProduct-@id", "relatedProduct-productIdentifier-"],
    ).with_parent_rows(),
    spec(
        "関連成果物-関連タイプ",
        &[&["relatedProduct", "relationType"]],
        &[],
        &["relatedProduct-@id", "relatedProduct-relationType-"],
    ).with_parent_rows(),
    spec(
        "関連成果物-JPCOAR関連タイトル",
        &[&["relatedProduct", "jpcoar:relatedTitle"]],
        &[],
        &["relatedProduct-@id", "relatedProduct-jpcoar:relatedTitle-"],
    ).with_parent_rows(),
    spec(
        "データソース識別子",
        &[&["dataSourceIdentifier"]],
        &[],
        &["dataSourceIdentifier-"],
    ),
];

pub const AUTHOR_TABLES: &[TableSpec] = &[
    spec(
        "CiNiiResearch外部の識別子",
        &[&["personIdentifier"]],
        &[],
        &["personIdentifier-"],
    ),
    spec(
        "氏名-表記",
        &[&["foaf:Person", "foaf:name"]],
        &[],
        &["foaf:Person-foaf:name-"],
    ),
    spec(
        "氏名-姓",
        &[&["foaf:Person", "foaf:familyName"]],
        &[],
        &["foaf:Person-foaf:familyName-"],
    ),
    spec(
        "氏名-名",
        &[&["foaf:Person", "foaf:givenName"]],
        &[],
        &["foaf:Person-foaf:givenName-"],
    ),
    spec(
        "氏名-ミドルネーム",
        &[&["foaf:Person", "foaf:middleName"]],
        &[],
        &["foaf:Person-foaf:middleName-"],
    ),
    spec(
        "所属",
        &[&["career"]],
        &["institution", "department", "jobTitle"],
        &["career-custom-id", "career-since", "career-until"],
    ),
    spec(
        "所属-所属機関-識別子",
        &[&["career", "institution", "institutionIdentifier"]],
        &[],
        &["career-custom-id", "career-institution-institutionIdentifier-"],
    ).with_parent_rows(),
    spec(
        "所属-所属機関-表記",
        &[&["career", "institution", "notation"]],
        &[],
        &["career-custom-id", "career-institution-notation-"],
    ).with_parent_rows(),
    spec(
        "所属-部局-識別子",
        &[&["career", "department", "departmentIdentifier"]],
        &[],
        &["career-custom-id", "career-department-departmentIdentifier-"],
    ).with_parent_rows(),
    spec(
        "所属-部局-表記",
        &[&["career", "department", "notation"]],
        &[],
        &["career-custom-id", "career-department-notation-"],
    ).with_parent_rows(),
    spec(
        "所属-役職-識別子",
        &[&["career", "jobTitle", "jobTitleIdentifier"]],
        &[],
        &["career-custom-id", "career-jobTitle-jobTitleIdentifier-"],
    ).with_parent_rows(),
    spec(
        "所属-役職-表記",
        &[&["career", "jobTitle", "notation"]],
        &[],
        &["career-custom-id", "career-jobTitle-notation-"],
    ).with_parent_rows(),
    spec("URL", &[&["url"]], &["notation"], &["url-@id"]),
    spec("URL-表記", &[&["url", "notation"]], &[], &["url-@id", "url-notation-"]).with_parent_rows(),
    spec(
        "プロジェクト",
        &[&["project"]],
        &["projectIdentifier", "notation"],
        &["project-@id", "project-@type", "project-role"],
    ),
    spec(
        "プロジェクト-識別子",
        &[&["project", "projectIdentifier"]],
        &[],
        &["project-@id", "project-projectIdentifier-"],
    ).with_parent_rows(),
    spec(
        "プロジェクト-表記",
        &[&["project", "notation"]],
        &[],
        &["project-@id", "project-notation-"],
    ).with_parent_rows(),
    spec(
        "成果物",
        &[&["product"]],
        &["productIdentifier", "notation", "relation"],
        &["product-@id", "product-@type", "product-resourceType"],
    ),
    spec(
        "成果物-識別子",
        &[&["product", "productIdentifier"]],
        &[],
        &["product-@id", "product-productIdentifier-"],
    ).with_parent_rows(),
    spec(
        "成果物-表記",
        &[&["product", "notation"]],
        &[],
        &["product-@id", "product-notation-"],
    ).with_parent_rows(),
    spec(
        "成果物-関連性",
        &[&["product", "relation"]],
        &[],
        &["product-@id", "product-relation-"],
    ).with_parent_rows(),
    spec(
        "データソース識別子",
        &[&["dataSourceIdentifier"]],
        &[],
        &["dataSourceIdentifier-"],
    ),
];
