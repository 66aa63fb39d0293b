//! Table data model: rules, indices, and table identity.
//!
//! A `Table` is the immutable, loaded ruleset for one (locale, grade,
//! dot-width) combination. Both translation directions are driven purely by
//! table data; the reverse index is derived once at build time from the
//! forward rules.

use std::collections::{HashMap, HashSet};

use icu_locale::Locale;
use serde::{Deserialize, Serialize};

use crate::cell::SIX_DOT_MASK;
use crate::error::{BrailleError, BrailleResult};

/// Braille grade: uncontracted (one-to-one) or contracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    One,
    Two,
}

impl Grade {
    pub fn as_u8(&self) -> u8 {
        match self {
            Grade::One => 1,
            Grade::Two => 2,
        }
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> u8 {
        grade.as_u8()
    }
}

impl TryFrom<u8> for Grade {
    type Error = BrailleError;

    fn try_from(value: u8) -> BrailleResult<Self> {
        match value {
            1 => Ok(Grade::One),
            2 => Ok(Grade::Two),
            other => Err(BrailleError::InvalidTableInfo(format!(
                "Grade must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Identity of one translation table: locale tag, grade, and dot-width.
///
/// Value type; callers build one to ask the registry for a table. A
/// `TableInfo` used to resolve a table must not change afterward, so the
/// `with_*` methods consume and return fresh values instead of mutating in
/// place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: String,
    pub locale: String,
    pub grade: Grade,
    #[serde(rename = "eightDot")]
    pub eight_dot: bool,
}

impl TableInfo {
    /// Create a TableInfo, validating and normalizing the locale tag
    ///
    /// # Errors
    /// `InvalidTableInfo` if the locale is not a well-formed IETF tag.
    pub fn new(id: &str, locale: &str, grade: Grade, eight_dot: bool) -> BrailleResult<Self> {
        let parsed: Locale = locale.parse().map_err(|e| {
            BrailleError::InvalidTableInfo(format!("Failed to parse locale '{}': {}", locale, e))
        })?;
        Ok(TableInfo {
            id: id.to_string(),
            locale: parsed.to_string(),
            grade,
            eight_dot,
        })
    }

    pub fn with_id(self, id: &str) -> Self {
        TableInfo {
            id: id.to_string(),
            ..self
        }
    }

    pub fn with_grade(self, grade: Grade) -> Self {
        TableInfo { grade, ..self }
    }

    pub fn with_eight_dot(self, eight_dot: bool) -> Self {
        TableInfo { eight_dot, ..self }
    }

    /// Cache/lookup key: locale is compared case-insensitively
    pub(crate) fn key(&self) -> (String, Grade, bool) {
        (self.locale.to_lowercase(), self.grade, self.eight_dot)
    }
}

impl std::fmt::Display for TableInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, grade {}, {}-dot)",
            self.id,
            self.locale,
            self.grade.as_u8(),
            if self.eight_dot { 8 } else { 6 }
        )
    }
}

/// One forward translation rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// One character to one or more cells
    SimpleMap { character: char, cells: Vec<u8> },
    /// A multi-character sequence to one or more cells (grade 2)
    Contraction { sequence: Vec<char>, cells: Vec<u8> },
}

impl Rule {
    pub fn cells(&self) -> &[u8] {
        match self {
            Rule::SimpleMap { cells, .. } => cells,
            Rule::Contraction { cells, .. } => cells,
        }
    }

    /// Number of input characters this rule consumes
    pub fn text_len(&self) -> usize {
        match self {
            Rule::SimpleMap { .. } => 1,
            Rule::Contraction { sequence, .. } => sequence.len(),
        }
    }

    fn sequence(&self) -> Vec<char> {
        match self {
            Rule::SimpleMap { character, .. } => vec![*character],
            Rule::Contraction { sequence, .. } => sequence.clone(),
        }
    }
}

/// One entry in the derived back-translation index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseEntry {
    pub cells: Vec<u8>,
    pub text: String,
    pub text_chars: usize,
}

/// An immutable, loaded ruleset for one (locale, grade, dot-width)
/// combination.
///
/// Owned by the registry cache and shared read-only by any number of
/// concurrent transcoder invocations; nothing here mutates after `build`.
pub struct Table {
    info: TableInfo,
    rules: Vec<Rule>,
    // Forward candidates bucketed by first character, longest sequence
    // first, ties by declaration order
    forward: HashMap<char, Vec<usize>>,
    // Reverse candidates bucketed by first cell, longest cell run first
    reverse: HashMap<u8, Vec<ReverseEntry>>,
    fallback_cell: u8,
    fallback_char: char,
    caps_cell: Option<u8>,
    max_sequence_len: usize,
}

impl Table {
    pub fn builder(info: TableInfo) -> TableBuilder {
        TableBuilder::new(info)
    }

    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Cell emitted for a character with no forward rule
    pub fn fallback_cell(&self) -> u8 {
        self.fallback_cell
    }

    /// Character emitted for a cell with no reverse rule
    pub fn fallback_char(&self) -> char {
        self.fallback_char
    }

    /// Capitalization marker cell, when the table matches
    /// case-insensitively
    pub fn caps_cell(&self) -> Option<u8> {
        self.caps_cell
    }

    /// Upper bound on input characters consumed by one rule
    pub fn max_sequence_len(&self) -> usize {
        self.max_sequence_len
    }

    fn fold_case(&self, c: char) -> char {
        if self.caps_cell.is_some() {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    }

    /// Longest rule matching `text[p..]`, ties broken by declaration order
    pub fn match_forward(&self, text: &[char], p: usize) -> Option<&Rule> {
        let first = self.fold_case(text[p]);
        let candidates = self.forward.get(&first)?;
        for &index in candidates {
            let rule = &self.rules[index];
            let len = rule.text_len();
            if p + len > text.len() {
                continue;
            }
            let matched = match rule {
                Rule::SimpleMap { character, .. } => self.fold_case(text[p]) == *character,
                Rule::Contraction { sequence, .. } => sequence
                    .iter()
                    .zip(&text[p..p + len])
                    .all(|(rc, tc)| *rc == self.fold_case(*tc)),
            };
            if matched {
                return Some(rule);
            }
        }
        None
    }

    /// Longest reverse entry matching `cells[q..]`
    pub fn match_reverse(&self, cells: &[u8], q: usize) -> Option<&ReverseEntry> {
        let candidates = self.reverse.get(&cells[q])?;
        for entry in candidates {
            let len = entry.cells.len();
            if q + len > cells.len() {
                continue;
            }
            if entry.cells == cells[q..q + len] {
                return Some(entry);
            }
        }
        None
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("info", &self.info)
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// Builds a `Table`, enforcing the table invariants at `build` time.
///
/// Violations report the index of the offending rule so a loader can point
/// at the bad entry in the source file.
pub struct TableBuilder {
    info: TableInfo,
    rules: Vec<Rule>,
    fallback_cell: u8,
    fallback_char: char,
    caps_cell: Option<u8>,
}

impl TableBuilder {
    pub fn new(info: TableInfo) -> Self {
        TableBuilder {
            info,
            rules: Vec::new(),
            fallback_cell: 0x00,
            fallback_char: '?',
            caps_cell: None,
        }
    }

    pub fn fallback_cell(mut self, cell: u8) -> Self {
        self.fallback_cell = cell;
        self
    }

    pub fn fallback_char(mut self, c: char) -> Self {
        self.fallback_char = c;
        self
    }

    /// Declare case-insensitive matching with `cell` emitted before the
    /// mapped cells of any capitalized match
    pub fn caps_cell(mut self, cell: u8) -> Self {
        self.caps_cell = Some(cell);
        self
    }

    pub fn simple(self, character: char, cells: Vec<u8>) -> Self {
        self.rule(Rule::SimpleMap { character, cells })
    }

    pub fn contraction(self, sequence: &str, cells: Vec<u8>) -> Self {
        self.rule(Rule::Contraction {
            sequence: sequence.chars().collect(),
            cells,
        })
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    fn load_error(&self, rule: Option<usize>, message: String) -> BrailleError {
        BrailleError::TableLoad {
            source: "<memory>".to_string(),
            rule,
            message,
        }
    }

    pub fn build(mut self) -> BrailleResult<Table> {
        let cell_mask_limit = if self.info.eight_dot {
            0xFF
        } else {
            SIX_DOT_MASK
        };
        let fold = |c: char, caps: bool| {
            if caps {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                c
            }
        };
        let caps = self.caps_cell.is_some();

        if self.fallback_cell > cell_mask_limit {
            return Err(self.load_error(
                None,
                "Fallback cell uses dots 7-8 in a 6-dot table".to_string(),
            ));
        }
        if let Some(c) = self.caps_cell {
            if c > cell_mask_limit {
                return Err(
                    self.load_error(None, "Caps cell uses dots 7-8 in a 6-dot table".to_string())
                );
            }
        }

        // Case-insensitive tables match against folded rule sequences
        if caps {
            for rule in &mut self.rules {
                match rule {
                    Rule::SimpleMap { character, .. } => {
                        *character = fold(*character, true);
                    }
                    Rule::Contraction { sequence, .. } => {
                        for c in sequence.iter_mut() {
                            *c = fold(*c, true);
                        }
                    }
                }
            }
        }

        // Validate rules and deduplicate contractions (first declaration
        // wins); a duplicate simple map is malformed data
        let mut seen_chars: HashMap<char, usize> = HashMap::new();
        let mut seen_seqs: HashSet<Vec<char>> = HashSet::new();
        let mut kept: Vec<Rule> = Vec::with_capacity(self.rules.len());
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.cells().is_empty() {
                return Err(self.load_error(Some(index), "Rule produces no cells".to_string()));
            }
            if let Some(&bad) = rule.cells().iter().find(|&&c| c > cell_mask_limit) {
                return Err(self.load_error(
                    Some(index),
                    format!("Cell 0x{:02X} uses dots 7-8 in a 6-dot table", bad),
                ));
            }
            match rule {
                Rule::SimpleMap { character, .. } => {
                    if let Some(&previous) = seen_chars.get(character) {
                        return Err(self.load_error(
                            Some(index),
                            format!(
                                "Duplicate rule for character '{}' (first at rule {})",
                                character, previous
                            ),
                        ));
                    }
                    seen_chars.insert(*character, index);
                }
                Rule::Contraction { sequence, .. } => {
                    if self.info.grade == Grade::One {
                        return Err(self.load_error(
                            Some(index),
                            "Contraction rule in a grade 1 table".to_string(),
                        ));
                    }
                    if sequence.len() < 2 {
                        return Err(self.load_error(
                            Some(index),
                            "Contraction sequence must have at least 2 characters".to_string(),
                        ));
                    }
                    if !seen_seqs.insert(sequence.clone()) {
                        // Exact duplicate sequence: first wins
                        continue;
                    }
                }
            }
            kept.push(rule.clone());
        }
        let rules = kept;

        // Forward index: bucket by first character, longest first
        let mut forward: HashMap<char, Vec<usize>> = HashMap::new();
        let mut max_sequence_len = 1;
        for (index, rule) in rules.iter().enumerate() {
            let first = rule.sequence()[0];
            forward.entry(first).or_default().push(index);
            max_sequence_len = max_sequence_len.max(rule.text_len());
        }
        for bucket in forward.values_mut() {
            bucket.sort_by(|&a, &b| {
                rules[b]
                    .text_len()
                    .cmp(&rules[a].text_len())
                    .then(a.cmp(&b))
            });
        }

        // Reverse index derived from the forward rules. Identical cell
        // patterns are ambiguous; the longer text sequence wins, ties by
        // declaration order.
        let mut by_cells: HashMap<Vec<u8>, ReverseEntry> = HashMap::new();
        let mut insertion: Vec<Vec<u8>> = Vec::new();
        for rule in &rules {
            let text: String = rule.sequence().iter().collect();
            let entry = ReverseEntry {
                cells: rule.cells().to_vec(),
                text,
                text_chars: rule.text_len(),
            };
            match by_cells.get(&entry.cells) {
                Some(existing) if existing.text_chars >= entry.text_chars => {}
                Some(_) => {
                    by_cells.insert(entry.cells.clone(), entry);
                }
                None => {
                    insertion.push(entry.cells.clone());
                    by_cells.insert(entry.cells.clone(), entry);
                }
            }
        }
        let mut reverse: HashMap<u8, Vec<ReverseEntry>> = HashMap::new();
        for cells in &insertion {
            let entry = by_cells.get(cells).cloned().ok_or_else(|| {
                self.load_error(None, "Reverse index construction lost an entry".to_string())
            })?;
            reverse.entry(entry.cells[0]).or_default().push(entry);
        }
        for bucket in reverse.values_mut() {
            // Stable sort keeps declaration order within equal lengths
            bucket.sort_by(|a, b| b.cells.len().cmp(&a.cells.len()));
        }

        Ok(Table {
            info: self.info,
            rules,
            forward,
            reverse,
            fallback_cell: self.fallback_cell,
            fallback_char: self.fallback_char,
            caps_cell: self.caps_cell,
            max_sequence_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(grade: Grade) -> TableInfo {
        TableInfo::new("test", "en-US", grade, false).unwrap()
    }

    #[test]
    fn test_table_info_normalizes_locale() {
        let info = TableInfo::new("t", "en-us", Grade::One, false).unwrap();
        assert_eq!(info.locale, "en-US");
    }

    #[test]
    fn test_table_info_rejects_bad_locale() {
        assert!(TableInfo::new("t", "not a locale!", Grade::One, false).is_err());
    }

    #[test]
    fn test_table_info_with_methods_build_fresh_values() {
        let base = TableInfo::new("t", "en-US", Grade::One, false).unwrap();
        let eight = base.clone().with_eight_dot(true).with_id("t8");
        assert!(!base.eight_dot);
        assert!(eight.eight_dot);
        assert_eq!(eight.id, "t8");
    }

    #[test]
    fn test_grade_try_from() {
        assert_eq!(Grade::try_from(1).unwrap(), Grade::One);
        assert_eq!(Grade::try_from(2).unwrap(), Grade::Two);
        assert!(Grade::try_from(3).is_err());
    }

    #[test]
    fn test_longest_match_wins() {
        let table = Table::builder(info(Grade::Two))
            .simple('t', vec![0x1E])
            .simple('h', vec![0x13])
            .simple('e', vec![0x11])
            .contraction("the", vec![0x2E])
            .contraction("th", vec![0x39])
            .build()
            .unwrap();
        let text: Vec<char> = "the".chars().collect();
        let rule = table.match_forward(&text, 0).unwrap();
        assert_eq!(rule.cells(), &[0x2E]);
        assert_eq!(rule.text_len(), 3);

        let text: Vec<char> = "this".chars().collect();
        let rule = table.match_forward(&text, 0).unwrap();
        assert_eq!(rule.cells(), &[0x39]);
    }

    #[test]
    fn test_duplicate_simple_map_is_rejected() {
        let result = Table::builder(info(Grade::One))
            .simple('a', vec![0x01])
            .simple('a', vec![0x02])
            .build();
        match result {
            Err(BrailleError::TableLoad { rule, .. }) => assert_eq!(rule, Some(1)),
            other => panic!("Expected TableLoad error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_contraction_first_wins() {
        let table = Table::builder(info(Grade::Two))
            .contraction("ch", vec![0x21])
            .contraction("ch", vec![0x2A])
            .build()
            .unwrap();
        assert_eq!(table.rules().len(), 1);
        let text: Vec<char> = "ch".chars().collect();
        assert_eq!(table.match_forward(&text, 0).unwrap().cells(), &[0x21]);
    }

    #[test]
    fn test_contraction_in_grade_one_is_rejected() {
        let result = Table::builder(info(Grade::One))
            .contraction("th", vec![0x39])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_six_dot_table_rejects_high_dots() {
        let result = Table::builder(info(Grade::One))
            .simple('a', vec![0x41])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_reverse_ambiguity_longer_text_wins() {
        // "ch" and "q" both map to the same cell; back-translation must
        // pick the longer sequence
        let table = Table::builder(info(Grade::Two))
            .simple('q', vec![0x21])
            .contraction("ch", vec![0x21])
            .build()
            .unwrap();
        let entry = table.match_reverse(&[0x21], 0).unwrap();
        assert_eq!(entry.text, "ch");
    }

    #[test]
    fn test_reverse_tie_first_declared_wins() {
        let table = Table::builder(info(Grade::One))
            .simple('i', vec![0x0A])
            .simple('!', vec![0x0A])
            .build();
        // Same length texts, same cells: duplicate cells are allowed,
        // first declaration wins on the way back
        let table = table.unwrap();
        let entry = table.match_reverse(&[0x0A], 0).unwrap();
        assert_eq!(entry.text, "i");
    }

    #[test]
    fn test_case_insensitive_match() {
        let table = Table::builder(info(Grade::One))
            .caps_cell(0x20)
            .simple('a', vec![0x01])
            .build()
            .unwrap();
        let text: Vec<char> = "A".chars().collect();
        let rule = table.match_forward(&text, 0).unwrap();
        assert_eq!(rule.cells(), &[0x01]);
    }
}
