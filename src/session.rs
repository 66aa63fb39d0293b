//! The externally consumed translation unit.
//!
//! A `TranslationSession` couples one resolved table with the transcoder
//! and exposes the translate / back-translate / destroy lifecycle. This is
//! the only surface external collaborators use; they never see the table
//! or registry internals.

use std::sync::Arc;

use crate::error::{BrailleError, BrailleResult};
use crate::registry::TableRegistry;
use crate::table::{Table, TableInfo};
use crate::transcoder::{BackTranslationResult, Transcoder, TranslationResult};

/// Contract consumed by callers: translate text to cells and back, then
/// release the session.
pub trait BrailleTranslator {
    fn translate(&self, text: &str) -> BrailleResult<TranslationResult>;
    fn back_translate(&self, cells: &[u8]) -> BrailleResult<String>;
    /// Release the table reference. Idempotent; any later call on the
    /// session fails with `SessionClosed`.
    fn destroy(&mut self);
}

/// A session bound to one resolved table.
///
/// Stateless across calls apart from the table reference, so one session
/// is safe to share for reads, and many sessions can run against the same
/// table concurrently.
pub struct TranslationSession {
    table: Option<Arc<Table>>,
}

impl TranslationSession {
    pub fn new(table: Arc<Table>) -> Self {
        TranslationSession { table: Some(table) }
    }

    /// Resolve `info` through the registry and bind a session to it
    ///
    /// # Errors
    /// Propagates `TableNotFound` / `TableLoad` from resolution.
    pub fn open(registry: &TableRegistry, info: &TableInfo) -> BrailleResult<Self> {
        Ok(TranslationSession::new(registry.resolve(info)?))
    }

    pub fn is_destroyed(&self) -> bool {
        self.table.is_none()
    }

    /// The table identity this session is bound to
    pub fn table_info(&self) -> BrailleResult<&TableInfo> {
        Ok(self.table()?.info())
    }

    fn table(&self) -> BrailleResult<&Arc<Table>> {
        self.table.as_ref().ok_or(BrailleError::SessionClosed)
    }

    /// Forward translation with a caller-supplied cursor offset
    pub fn translate_with_cursor(
        &self,
        text: &str,
        cursor: usize,
    ) -> BrailleResult<TranslationResult> {
        let table = self.table()?;
        Transcoder::new(table).translate(text, cursor)
    }

    /// Back-translation with a caller-supplied cursor offset, keeping the
    /// position maps
    pub fn back_translate_with_cursor(
        &self,
        cells: &[u8],
        cursor: usize,
    ) -> BrailleResult<BackTranslationResult> {
        let table = self.table()?;
        Transcoder::new(table).back_translate(cells, cursor)
    }
}

impl BrailleTranslator for TranslationSession {
    fn translate(&self, text: &str) -> BrailleResult<TranslationResult> {
        self.translate_with_cursor(text, 0)
    }

    fn back_translate(&self, cells: &[u8]) -> BrailleResult<String> {
        Ok(self.back_translate_with_cursor(cells, 0)?.text)
    }

    fn destroy(&mut self) {
        self.table = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Grade;

    fn session() -> TranslationSession {
        let info = TableInfo::new("en-us-g1", "en-US", Grade::One, false).unwrap();
        let table = Table::builder(info)
            .simple('a', vec![0x01])
            .simple('b', vec![0x03])
            .build()
            .unwrap();
        TranslationSession::new(Arc::new(table))
    }

    #[test]
    fn test_translate_through_trait() {
        let session = session();
        let result = session.translate("ab").unwrap();
        assert_eq!(result.cells, vec![0x01, 0x03]);
        assert_eq!(session.back_translate(&result.cells).unwrap(), "ab");
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut session = session();
        session.destroy();
        session.destroy();
        assert!(session.is_destroyed());
    }

    #[test]
    fn test_use_after_destroy_fails() {
        let mut session = session();
        session.destroy();
        assert_eq!(session.translate("a").unwrap_err(), BrailleError::SessionClosed);
        assert_eq!(
            session.back_translate(&[0x01]).unwrap_err(),
            BrailleError::SessionClosed
        );
        assert_eq!(session.table_info().unwrap_err(), BrailleError::SessionClosed);
    }

    #[test]
    fn test_sessions_share_a_table_across_threads() {
        let info = TableInfo::new("en-us-g1", "en-US", Grade::One, false).unwrap();
        let table = Arc::new(
            Table::builder(info)
                .simple('a', vec![0x01])
                .build()
                .unwrap(),
        );
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let table = Arc::clone(&table);
                scope.spawn(move || {
                    let session = TranslationSession::new(table);
                    let result = session.translate("aaa").unwrap();
                    assert_eq!(result.cells, vec![0x01, 0x01, 0x01]);
                });
            }
        });
    }

    #[test]
    fn test_open_resolves_through_registry() {
        let mut registry = crate::registry::TableRegistry::new();
        let info = TableInfo::new("en-us-g1", "en-US", Grade::One, false).unwrap();
        let table = Table::builder(info.clone())
            .simple('a', vec![0x01])
            .build()
            .unwrap();
        registry.with_table(table);

        let session = TranslationSession::open(&registry, &info).unwrap();
        assert_eq!(session.translate("a").unwrap().cells, vec![0x01]);

        let missing = TableInfo::new("x", "de-DE", Grade::One, false).unwrap();
        assert!(TranslationSession::open(&registry, &missing).is_err());
    }
}
