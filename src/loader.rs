//! Load translation tables from JSON rule files.
//!
//! One file per table. The file stem is the table id, for example
//! `en-us-g1.json` -> id `"en-us-g1"`:
//!
//! ```json
//! {
//!     "@metadata": { ... },  // Ignored
//!     "locale": "en-US",
//!     "grade": 1,
//!     "eightDot": false,
//!     "fallbackChar": "?",
//!     "capsDots": "6",
//!     "rules": [
//!         { "char": "a", "dots": "1" },
//!         { "seq": "the", "dots": ["2346"] }
//!     ]
//! }
//! ```
//!
//! Cells are written in dot-number notation (`"145"` = dots 1, 4 and 5);
//! the empty string is the blank cell. The first malformed rule aborts the
//! load and its index is carried in the error.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cell::dots_to_mask;
use crate::error::{BrailleError, BrailleResult};
use crate::table::{Grade, Table, TableInfo};

fn load_error(source: &str, rule: Option<usize>, message: String) -> BrailleError {
    BrailleError::TableLoad {
        source: source.to_string(),
        rule,
        message,
    }
}

/// Re-attribute builder and cell-notation errors to the file being loaded
fn attribute(source: &str, rule: Option<usize>, err: BrailleError) -> BrailleError {
    match err {
        BrailleError::TableLoad {
            rule: builder_rule,
            message,
            ..
        } => load_error(source, builder_rule.or(rule), message),
        BrailleError::InvalidTableInfo(message) => load_error(source, rule, message),
        other => other,
    }
}

/// Parse one or more cells from a rule's "dots" value (string or array of
/// strings)
fn parse_cells(source: &str, rule: usize, dots: &Value) -> BrailleResult<Vec<u8>> {
    match dots {
        Value::String(s) => Ok(vec![
            dots_to_mask(s).map_err(|e| attribute(source, Some(rule), e))?,
        ]),
        Value::Array(items) => {
            let mut cells = Vec::with_capacity(items.len());
            for item in items {
                let s = item.as_str().ok_or_else(|| {
                    load_error(source, Some(rule), "'dots' array entries must be strings".to_string())
                })?;
                cells.push(dots_to_mask(s).map_err(|e| attribute(source, Some(rule), e))?);
            }
            Ok(cells)
        }
        _ => Err(load_error(
            source,
            Some(rule),
            "'dots' must be a string or an array of strings".to_string(),
        )),
    }
}

fn required_str<'a>(source: &str, obj: &'a serde_json::Map<String, Value>, key: &str) -> BrailleResult<&'a str> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| load_error(source, None, format!("Missing or non-string '{}'", key)))
}

fn single_char(source: &str, rule: Option<usize>, key: &str, s: &str) -> BrailleResult<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(load_error(
            source,
            rule,
            format!("'{}' must be exactly one character, got \"{}\"", key, s),
        )),
    }
}

/// Parse table content. `source` names the origin for error messages;
/// `id` is the table id (the file stem when loading from disk).
pub fn parse_table(source: &str, id: &str, content: &str) -> BrailleResult<Table> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| load_error(source, None, format!("Failed to parse JSON: {}", e)))?;

    let obj = json
        .as_object()
        .ok_or_else(|| load_error(source, None, "Root must be an object".to_string()))?;

    let locale = required_str(source, obj, "locale")?;
    let grade_num = obj
        .get("grade")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| load_error(source, None, "Missing or non-integer 'grade'".to_string()))?;
    let grade = Grade::try_from(grade_num as u8).map_err(|e| attribute(source, None, e))?;
    let eight_dot = obj.get("eightDot").and_then(|v| v.as_bool()).unwrap_or(false);

    let info = TableInfo::new(id, locale, grade, eight_dot)
        .map_err(|e| attribute(source, None, e))?;
    let mut builder = Table::builder(info);

    if let Some(dots) = obj.get("fallbackDots") {
        let s = dots
            .as_str()
            .ok_or_else(|| load_error(source, None, "'fallbackDots' must be a string".to_string()))?;
        builder = builder.fallback_cell(dots_to_mask(s).map_err(|e| attribute(source, None, e))?);
    }
    if let Some(c) = obj.get("fallbackChar") {
        let s = c
            .as_str()
            .ok_or_else(|| load_error(source, None, "'fallbackChar' must be a string".to_string()))?;
        builder = builder.fallback_char(single_char(source, None, "fallbackChar", s)?);
    }
    if let Some(dots) = obj.get("capsDots") {
        let s = dots
            .as_str()
            .ok_or_else(|| load_error(source, None, "'capsDots' must be a string".to_string()))?;
        builder = builder.caps_cell(dots_to_mask(s).map_err(|e| attribute(source, None, e))?);
    }

    let rules = obj
        .get("rules")
        .and_then(|v| v.as_array())
        .ok_or_else(|| load_error(source, None, "Missing or non-array 'rules'".to_string()))?;

    for (index, entry) in rules.iter().enumerate() {
        let rule_obj = entry.as_object().ok_or_else(|| {
            load_error(source, Some(index), "Rule must be an object".to_string())
        })?;
        let dots = rule_obj.get("dots").ok_or_else(|| {
            load_error(source, Some(index), "Rule is missing 'dots'".to_string())
        })?;
        let cells = parse_cells(source, index, dots)?;

        match (rule_obj.get("char"), rule_obj.get("seq")) {
            (Some(c), None) => {
                let s = c.as_str().ok_or_else(|| {
                    load_error(source, Some(index), "'char' must be a string".to_string())
                })?;
                let character = single_char(source, Some(index), "char", s)?;
                builder = builder.simple(character, cells);
            }
            (None, Some(seq)) => {
                let s = seq.as_str().ok_or_else(|| {
                    load_error(source, Some(index), "'seq' must be a string".to_string())
                })?;
                builder = builder.contraction(s, cells);
            }
            _ => {
                return Err(load_error(
                    source,
                    Some(index),
                    "Rule must have exactly one of 'char' or 'seq'".to_string(),
                ));
            }
        }
    }

    builder.build().map_err(|e| attribute(source, None, e))
}

/// Load a table from a single JSON file; the file stem becomes the id
///
/// # Errors
/// `TableLoad` on read failures, malformed JSON, or invariant violations,
/// carrying the index of the first bad rule where applicable.
pub fn load_table_from_file(path: &Path) -> BrailleResult<Table> {
    let source = path.display().to_string();
    let id = table_id_from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| load_error(&source, None, format!("Failed to read file: {}", e)))?;
    parse_table(&source, &id, &content)
}

/// Parse only a file's identity header, without building rule indices.
/// Used for cheap catalog discovery.
pub fn read_table_header(path: &Path) -> BrailleResult<TableInfo> {
    let source = path.display().to_string();
    let id = table_id_from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| load_error(&source, None, format!("Failed to read file: {}", e)))?;
    let json: Value = serde_json::from_str(&content)
        .map_err(|e| load_error(&source, None, format!("Failed to parse JSON: {}", e)))?;
    let obj = json
        .as_object()
        .ok_or_else(|| load_error(&source, None, "Root must be an object".to_string()))?;
    let locale = required_str(&source, obj, "locale")?;
    let grade_num = obj
        .get("grade")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| load_error(&source, None, "Missing or non-integer 'grade'".to_string()))?;
    let grade = Grade::try_from(grade_num as u8).map_err(|e| attribute(&source, None, e))?;
    let eight_dot = obj.get("eightDot").and_then(|v| v.as_bool()).unwrap_or(false);
    TableInfo::new(&id, locale, grade, eight_dot).map_err(|e| attribute(&source, None, e))
}

fn table_id_from_path(path: &Path) -> BrailleResult<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            load_error(
                &path.display().to_string(),
                None,
                "Invalid filename".to_string(),
            )
        })
}

/// Scan a directory for `*.json` table files and read their headers
///
/// # Errors
/// `TableLoad` if the directory cannot be read or any header is malformed.
pub fn discover_tables(dir: &Path) -> BrailleResult<Vec<(TableInfo, PathBuf)>> {
    let source = dir.display().to_string();
    if !dir.is_dir() {
        return Err(load_error(
            &source,
            None,
            "Not a directory".to_string(),
        ));
    }
    let entries = fs::read_dir(dir)
        .map_err(|e| load_error(&source, None, format!("Failed to read directory: {}", e)))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| load_error(&source, None, format!("Error reading directory entry: {}", e)))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let info = read_table_header(&path)?;
        found.push((info, path));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "locale": "en-US",
        "grade": 1,
        "rules": [
            { "char": "a", "dots": "1" },
            { "char": "b", "dots": "12" }
        ]
    }"#;

    #[test]
    fn test_parse_minimal_table() {
        let table = parse_table("<test>", "en-us-g1", MINIMAL).unwrap();
        assert_eq!(table.info().id, "en-us-g1");
        assert_eq!(table.info().locale, "en-US");
        assert_eq!(table.info().grade, Grade::One);
        assert!(!table.info().eight_dot);
        assert_eq!(table.rules().len(), 2);
    }

    #[test]
    fn test_parse_contraction_and_caps() {
        let content = r#"{
            "@metadata": { "authors": ["test"] },
            "locale": "en-US",
            "grade": 2,
            "capsDots": "6",
            "fallbackChar": "?",
            "rules": [
                { "char": "t", "dots": "2345" },
                { "seq": "the", "dots": ["2346"] },
                { "seq": "ing", "dots": ["346"] }
            ]
        }"#;
        let table = parse_table("<test>", "en-us-g2", content).unwrap();
        assert_eq!(table.caps_cell(), Some(0x20));
        assert_eq!(table.rules().len(), 3);
    }

    #[test]
    fn test_malformed_json_reports_source() {
        let err = parse_table("<test>", "bad", "{ not json").unwrap_err();
        match err {
            BrailleError::TableLoad { source, .. } => assert_eq!(source, "<test>"),
            other => panic!("Expected TableLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_first_bad_rule_index_is_reported() {
        let content = r#"{
            "locale": "en-US",
            "grade": 1,
            "rules": [
                { "char": "a", "dots": "1" },
                { "char": "b", "dots": "99" },
                { "char": "c", "dots": "bogus" }
            ]
        }"#;
        let err = parse_table("<test>", "bad", content).unwrap_err();
        match err {
            BrailleError::TableLoad { rule, .. } => assert_eq!(rule, Some(1)),
            other => panic!("Expected TableLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_with_both_char_and_seq_is_rejected() {
        let content = r#"{
            "locale": "en-US",
            "grade": 2,
            "rules": [ { "char": "a", "seq": "ab", "dots": "1" } ]
        }"#;
        let err = parse_table("<test>", "bad", content).unwrap_err();
        match err {
            BrailleError::TableLoad { rule, .. } => assert_eq!(rule, Some(0)),
            other => panic!("Expected TableLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_grade_out_of_range_is_rejected() {
        let content = r#"{ "locale": "en-US", "grade": 3, "rules": [] }"#;
        assert!(parse_table("<test>", "bad", content).is_err());
    }

    #[test]
    fn test_multi_cell_simple_map() {
        let content = r#"{
            "locale": "en-US",
            "grade": 1,
            "rules": [ { "char": "%", "dots": ["4", "25", "1234"] } ]
        }"#;
        let table = parse_table("<test>", "t", content).unwrap();
        assert_eq!(table.rules()[0].cells().len(), 3);
    }
}
