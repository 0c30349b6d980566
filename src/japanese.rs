//! Japanese-script detection and name selection for JSON-LD records.

use crate::error::{CiniiError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static JAPANESE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{scx=Hiragana}\p{scx=Katakana}\p{scx=Han}]").expect("valid regex")
});

/// True when `text` contains Hiragana, Katakana or Han characters
pub fn contains_japanese(text: &str) -> bool {
    JAPANESE_TEXT.is_match(text)
}

/// `@value` of a language-tagged literal, if it is a string
fn literal_value(literal: &Value) -> Option<&str> {
    literal.get("@value").and_then(Value::as_str)
}

fn literal_language(literal: &Value) -> Option<&str> {
    literal.get("@language").and_then(Value::as_str)
}

fn as_slice(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// Display name for an author from its `foaf:Person` list.
///
/// Preference: a Japanese-script name (commas removed, and spaces removed
/// when the result is still Japanese), then an English name, then the first
/// name of any person. Commas are always removed. Empty when nothing matches.
pub fn preferred_person_name(people: Option<&Value>) -> String {
    let people = as_slice(people);
    let names = || {
        people
            .iter()
            .flat_map(|person| as_slice(person.get("foaf:name")).iter())
    };

    if let Some(name) = names()
        .filter_map(literal_value)
        .find(|v| contains_japanese(v))
    {
        let without_comma = name.replace(',', "");
        return if contains_japanese(&without_comma) {
            without_comma.replace(' ', "")
        } else {
            without_comma
        };
    }

    if let Some(name) = names()
        .filter(|n| literal_language(n) == Some("en"))
        .find_map(literal_value)
    {
        return name.replace(',', "");
    }

    people
        .iter()
        .find_map(|person| as_slice(person.get("foaf:name")).first())
        .and_then(literal_value)
        .map(|name| name.replace(',', ""))
        .unwrap_or_default()
}

/// Institution name from an author's `career` list.
///
/// Preference: `@language == "ja"`, then any Japanese-script value, then
/// `@language == "en"`, then the first value. Values are returned verbatim.
pub fn preferred_institution_name(career: Option<&Value>) -> String {
    let career = as_slice(career);
    let notations = || {
        career.iter().flat_map(|entry| {
            as_slice(entry.get("institution").and_then(|i| i.get("notation"))).iter()
        })
    };

    let by_language = |lang: &str| {
        notations()
            .filter(|n| literal_language(n) == Some(lang))
            .find_map(literal_value)
            .map(str::to_string)
    };

    by_language("ja")
        .or_else(|| {
            notations()
                .filter_map(literal_value)
                .find(|v| contains_japanese(v))
                .map(str::to_string)
        })
        .or_else(|| by_language("en"))
        .or_else(|| notations().find_map(literal_value).map(str::to_string))
        .unwrap_or_default()
}

/// Distinct `@type`s of a record's `dataSourceIdentifier`, first-seen order.
///
/// Accepts either a list of identifiers or a single identifier object.
pub fn data_source_types(record: &Value) -> Result<Vec<String>> {
    let id = record.get("@id").and_then(Value::as_str).unwrap_or("<unknown>");
    let identifiers = match record.get("dataSourceIdentifier") {
        Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => {
            return Err(CiniiError::Validation(format!(
                "{} has no dataSourceIdentifier",
                id
            )))
        }
    };

    let mut types: Vec<String> = Vec::new();
    for identifier in identifiers {
        if let Some(t) = identifier.get("@type").and_then(Value::as_str) {
            if !types.iter().any(|seen| seen == t) {
                types.push(t.to_string());
            }
        }
    }
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains_japanese() {
        assert!(contains_japanese("山田"));
        assert!(contains_japanese("ひらがな"));
        assert!(contains_japanese("カタカナ"));
        assert!(contains_japanese("Tokyo 大学"));
        assert!(!contains_japanese("Yamada Taro"));
        assert!(!contains_japanese(""));
    }

    #[test]
    fn test_person_name_prefers_japanese_and_strips_separators() {
        let people = json!([{
            "foaf:name": [
                {"@language": "en", "@value": "Yamada, Taro"},
                {"@language": "ja", "@value": "山田, 太郎"}
            ]
        }]);
        assert_eq!(preferred_person_name(Some(&people)), "山田太郎");
    }

    #[test]
    fn test_person_name_falls_back_to_english_then_first() {
        let english = json!([
            {"foaf:name": [{"@language": "fr", "@value": "Dupont, Jean"}]},
            {"foaf:name": [{"@language": "en", "@value": "Yamada, Taro"}]}
        ]);
        assert_eq!(preferred_person_name(Some(&english)), "Yamada Taro");

        let other = json!([{"foaf:name": [{"@value": "Dupont, Jean"}]}]);
        assert_eq!(preferred_person_name(Some(&other)), "Dupont Jean");

        assert_eq!(preferred_person_name(None), "");
        assert_eq!(preferred_person_name(Some(&json!([]))), "");
    }

    #[test]
    fn test_institution_name_cascade() {
        let career = json!([
            {"institution": {"notation": [
                {"@language": "en", "@value": "The University of Tokyo"},
                {"@language": "ja", "@value": "東京大学"}
            ]}}
        ]);
        assert_eq!(preferred_institution_name(Some(&career)), "東京大学");

        let untagged = json!([
            {"institution": {"notation": [
                {"@language": "en", "@value": "Osaka University"},
                {"@value": "大阪大学"}
            ]}}
        ]);
        assert_eq!(preferred_institution_name(Some(&untagged)), "大阪大学");

        let english = json!([{"institution": {"notation": [
            {"@language": "de", "@value": "Universität"},
            {"@language": "en", "@value": "Kyoto University, Japan"}
        ]}}]);
        assert_eq!(
            preferred_institution_name(Some(&english)),
            "Kyoto University, Japan"
        );

        assert_eq!(preferred_institution_name(Some(&json!([{}]))), "");
    }

    #[test]
    fn test_data_source_types_distinct_in_order() {
        let record = json!({
            "@id": "https://cir.nii.ac.jp/crid/1",
            "dataSourceIdentifier": [
                {"@type": "JALC", "@value": "a"},
                {"@type": "CROSSREF", "@value": "b"},
                {"@type": "JALC", "@value": "c"}
            ]
        });
        assert_eq!(
            data_source_types(&record).expect("types"),
            vec!["JALC".to_string(), "CROSSREF".to_string()]
        );

        let missing = json!({"@id": "https://cir.nii.ac.jp/crid/2"});
        assert!(matches!(
            data_source_types(&missing),
            Err(CiniiError::Validation(_))
        ));
    }
}
