//! Forward and backward table-driven translation.
//!
//! Both directions are longest-match, leftmost-first scans over the input,
//! recording one position span per rule application. Translation is pure
//! with respect to the table: no I/O, no shared mutable state, linear time
//! in the input length times the table's longest sequence.

use crate::cell::CellBuffer;
use crate::error::BrailleResult;
use crate::position::PositionMapper;
use crate::table::Table;

/// The result of translating text to cells, including character to cell
/// mappings in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub cells: CellBuffer,
    pub text_to_braille: Vec<usize>,
    pub braille_to_text: Vec<usize>,
    /// Cell index corresponding to the input text cursor
    pub cursor_position: usize,
}

/// The result of back-translating cells to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackTranslationResult {
    pub text: String,
    pub braille_to_text: Vec<usize>,
    pub text_to_braille: Vec<usize>,
    /// Text offset corresponding to the input cell cursor
    pub cursor_position: usize,
}

/// Pure translation algorithm bound to one table.
pub struct Transcoder<'a> {
    table: &'a Table,
}

impl<'a> Transcoder<'a> {
    pub fn new(table: &'a Table) -> Self {
        Transcoder { table }
    }

    /// Translate text to cells. `cursor` is a text offset in
    /// `0..=text length` (clamped); the result carries the corresponding
    /// cell offset.
    ///
    /// Translation always covers the whole input: a character with no rule
    /// emits the table's fallback cell and the scan continues.
    ///
    /// # Errors
    /// Only `Internal` (broken position-map invariant), which signals an
    /// engine defect; well-formed tables and any input text succeed.
    pub fn translate(&self, text: &str, cursor: usize) -> BrailleResult<TranslationResult> {
        let chars: Vec<char> = text.chars().collect();
        let mut cells: CellBuffer = Vec::with_capacity(chars.len());
        let mut mapper = PositionMapper::new();
        let caps_cell = self.table.caps_cell();

        let mut p = 0;
        while p < chars.len() {
            let cell_start = cells.len();
            match self.table.match_forward(&chars, p) {
                Some(rule) => {
                    // Capitalized match in a case-insensitive table gets
                    // the marker cell before the mapped cells
                    if let Some(marker) = caps_cell {
                        if chars[p].is_uppercase() {
                            cells.push(marker);
                        }
                    }
                    cells.extend_from_slice(rule.cells());
                    let len = rule.text_len();
                    mapper.record(p..p + len, cell_start..cells.len())?;
                    p += len;
                }
                None => {
                    // Recoverable per-character condition, never fatal
                    cells.push(self.table.fallback_cell());
                    mapper.record(p..p + 1, cell_start..cells.len())?;
                    p += 1;
                }
            }
        }

        let map = mapper.finish(chars.len(), cells.len())?;
        let cursor_position = map
            .text_to_cell(cursor.min(chars.len()))
            .unwrap_or(cells.len());
        Ok(TranslationResult {
            cells,
            text_to_braille: map.text_to_braille,
            braille_to_text: map.braille_to_text,
            cursor_position,
        })
    }

    /// Back-translate cells to text. `cursor` is a cell offset in
    /// `0..=cell count` (clamped); the result carries the corresponding
    /// text offset.
    ///
    /// # Errors
    /// Only `Internal`, as for [`translate`](Self::translate).
    pub fn back_translate(&self, cells: &[u8], cursor: usize) -> BrailleResult<BackTranslationResult> {
        let mut text = String::new();
        let mut text_len = 0;
        let mut mapper = PositionMapper::new();
        let caps_cell = self.table.caps_cell();

        let mut q = 0;
        while q < cells.len() {
            // Longest reverse match first; the caps marker is only
            // meaningful when a real match follows it
            if let Some(entry) = self.table.match_reverse(cells, q) {
                text.push_str(&entry.text);
                mapper.record(text_len..text_len + entry.text_chars, q..q + entry.cells.len())?;
                text_len += entry.text_chars;
                q += entry.cells.len();
                continue;
            }
            if caps_cell == Some(cells[q]) && q + 1 < cells.len() {
                if let Some(entry) = self.table.match_reverse(cells, q + 1) {
                    let mut chars = entry.text.chars();
                    if let Some(first) = chars.next() {
                        text.extend(first.to_uppercase());
                        text.push_str(chars.as_str());
                    }
                    let span = 1 + entry.cells.len();
                    mapper.record(text_len..text_len + entry.text_chars, q..q + span)?;
                    text_len += entry.text_chars;
                    q += span;
                    continue;
                }
            }
            // Unmatched cell decodes to the table's placeholder
            text.push(self.table.fallback_char());
            mapper.record(text_len..text_len + 1, q..q + 1)?;
            text_len += 1;
            q += 1;
        }

        let map = mapper.finish(text_len, cells.len())?;
        let cursor_position = map.cell_to_text(cursor.min(cells.len())).unwrap_or(text_len);
        Ok(BackTranslationResult {
            text,
            braille_to_text: map.braille_to_text,
            text_to_braille: map.text_to_braille,
            cursor_position,
        })
    }
}
