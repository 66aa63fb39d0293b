//! Bidirectional offset correspondence between text and cell sequences.
//!
//! The transcoder records one span pair per rule application, left to
//! right; `finish` closes the map with trailing sentinels. Monotonicity is
//! enforced by construction: out-of-order or overlapping spans are an
//! engine defect and fail with an internal error rather than being
//! silently corrected.

use std::ops::Range;

use crate::error::{BrailleError, BrailleResult};

/// The completed offset correspondence for one translation.
///
/// `text_to_braille[i]` is the index of the first cell produced from text
/// offset `i` (length = text length + 1, trailing sentinel = cell count).
/// `braille_to_text[j]` is the first text offset that produced cell `j`
/// (length = cell count + 1, trailing sentinel = text length).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap {
    pub text_to_braille: Vec<usize>,
    pub braille_to_text: Vec<usize>,
}

impl PositionMap {
    /// Cell offset for a text cursor at `k` (0..=text length)
    pub fn text_to_cell(&self, k: usize) -> Option<usize> {
        self.text_to_braille.get(k).copied()
    }

    /// Text offset for a cell cursor at `j` (0..=cell count)
    pub fn cell_to_text(&self, j: usize) -> Option<usize> {
        self.braille_to_text.get(j).copied()
    }

    pub fn text_len(&self) -> usize {
        self.text_to_braille.len() - 1
    }

    pub fn cell_len(&self) -> usize {
        self.braille_to_text.len() - 1
    }
}

/// Incremental builder used by both directions of the transcoder.
pub struct PositionMapper {
    text_to_braille: Vec<usize>,
    braille_to_text: Vec<usize>,
    // End of the last recorded span on each axis
    text_end: usize,
    cell_end: usize,
}

impl PositionMapper {
    pub fn new() -> Self {
        PositionMapper {
            text_to_braille: Vec::new(),
            braille_to_text: Vec::new(),
            text_end: 0,
            cell_end: 0,
        }
    }

    /// Record that text range `text_span` produced cell range `cell_span`.
    ///
    /// Spans must be non-empty on at least the text axis, non-overlapping,
    /// and arrive in left-to-right order on both axes.
    ///
    /// # Errors
    /// `Internal` when span ordering is violated; this signals a
    /// transcoder defect, not bad input.
    pub fn record(&mut self, text_span: Range<usize>, cell_span: Range<usize>) -> BrailleResult<()> {
        if text_span.start != self.text_end || cell_span.start != self.cell_end {
            return Err(BrailleError::Internal(format!(
                "Position span out of order: text {}..{} after {}, cells {}..{} after {}",
                text_span.start,
                text_span.end,
                self.text_end,
                cell_span.start,
                cell_span.end,
                self.cell_end
            )));
        }
        if text_span.end < text_span.start || cell_span.end < cell_span.start {
            return Err(BrailleError::Internal(format!(
                "Position span reversed: text {}..{}, cells {}..{}",
                text_span.start, text_span.end, cell_span.start, cell_span.end
            )));
        }
        if text_span.is_empty() {
            return Err(BrailleError::Internal(
                "Position span consumed no text".to_string(),
            ));
        }
        // Every offset inside the span maps back to the span start
        for _ in text_span.clone() {
            self.text_to_braille.push(cell_span.start);
        }
        for _ in cell_span.clone() {
            self.braille_to_text.push(text_span.start);
        }
        self.text_end = text_span.end;
        self.cell_end = cell_span.end;
        Ok(())
    }

    /// Close the map with trailing sentinels.
    ///
    /// # Errors
    /// `Internal` when the recorded spans do not cover exactly the stated
    /// totals.
    pub fn finish(mut self, total_text: usize, total_cells: usize) -> BrailleResult<PositionMap> {
        if self.text_end != total_text || self.cell_end != total_cells {
            return Err(BrailleError::Internal(format!(
                "Position map incomplete: covered {} of {} text offsets, {} of {} cells",
                self.text_end, total_text, self.cell_end, total_cells
            )));
        }
        self.text_to_braille.push(total_cells);
        self.braille_to_text.push(total_text);
        Ok(PositionMap {
            text_to_braille: self.text_to_braille,
            braille_to_text: self.braille_to_text,
        })
    }
}

impl Default for PositionMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map_has_sentinels_only() {
        let map = PositionMapper::new().finish(0, 0).unwrap();
        assert_eq!(map.text_to_braille, vec![0]);
        assert_eq!(map.braille_to_text, vec![0]);
        assert_eq!(map.text_to_cell(0), Some(0));
    }

    #[test]
    fn test_one_to_one_spans() {
        let mut mapper = PositionMapper::new();
        mapper.record(0..1, 0..1).unwrap();
        mapper.record(1..2, 1..2).unwrap();
        mapper.record(2..3, 2..3).unwrap();
        let map = mapper.finish(3, 3).unwrap();
        assert_eq!(map.text_to_braille, vec![0, 1, 2, 3]);
        assert_eq!(map.braille_to_text, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_contraction_span_collapses() {
        // Three characters into one cell, then one into one
        let mut mapper = PositionMapper::new();
        mapper.record(0..3, 0..1).unwrap();
        mapper.record(3..4, 1..2).unwrap();
        let map = mapper.finish(4, 2).unwrap();
        assert_eq!(map.text_to_braille, vec![0, 0, 0, 1, 2]);
        assert_eq!(map.braille_to_text, vec![0, 3, 4]);
        // All offsets inside the contraction map to its first cell
        assert_eq!(map.text_to_cell(2), Some(0));
        assert_eq!(map.cell_to_text(0), Some(0));
    }

    #[test]
    fn test_out_of_order_span_is_internal_error() {
        let mut mapper = PositionMapper::new();
        mapper.record(0..2, 0..2).unwrap();
        let err = mapper.record(1..3, 2..3).unwrap_err();
        assert!(matches!(err, BrailleError::Internal(_)));
    }

    #[test]
    fn test_gap_is_internal_error() {
        let mut mapper = PositionMapper::new();
        mapper.record(0..1, 0..1).unwrap();
        let err = mapper.record(2..3, 1..2).unwrap_err();
        assert!(matches!(err, BrailleError::Internal(_)));
    }

    #[test]
    fn test_incomplete_coverage_is_internal_error() {
        let mut mapper = PositionMapper::new();
        mapper.record(0..1, 0..1).unwrap();
        let err = mapper.finish(2, 1).unwrap_err();
        assert!(matches!(err, BrailleError::Internal(_)));
    }

    #[test]
    fn test_monotonicity_holds_for_recorded_maps() {
        let mut mapper = PositionMapper::new();
        mapper.record(0..2, 0..1).unwrap();
        mapper.record(2..3, 1..4).unwrap();
        mapper.record(3..5, 4..5).unwrap();
        let map = mapper.finish(5, 5).unwrap();
        assert!(map.text_to_braille.windows(2).all(|w| w[0] <= w[1]));
        assert!(map.braille_to_text.windows(2).all(|w| w[0] <= w[1]));
    }
}
