//! Table discovery, loading, and caching.
//!
//! The registry is the only component that performs I/O. Resolution is
//! idempotent: the first resolve of a key loads the table, every later one
//! (and every concurrent one) shares the same loaded instance. Tables are
//! handed out as `Arc<Table>` and stay read-only for their whole life.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::VerbosityLevel;
use crate::error::{BrailleError, BrailleResult};
use crate::loader;
use crate::table::{Grade, Table, TableInfo};

type TableKey = (String, Grade, bool);
type LoadSlot = Arc<OnceLock<BrailleResult<Arc<Table>>>>;

struct CatalogEntry {
    info: TableInfo,
    // None for tables registered in memory
    path: Option<PathBuf>,
}

/// Discovers, loads, and caches translation tables.
pub struct TableRegistry {
    catalog: Vec<CatalogEntry>,
    cache: Mutex<HashMap<TableKey, LoadSlot>>,
    loads: AtomicUsize,
    verbosity: VerbosityLevel,
}

impl TableRegistry {
    pub fn new() -> Self {
        TableRegistry {
            catalog: Vec::new(),
            cache: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
            verbosity: VerbosityLevel::Normal,
        }
    }

    /// Build a registry from a directory of `*.json` table files.
    ///
    /// Only file headers are read here; rule data is loaded lazily on
    /// first resolve. When two files claim the same (locale, grade,
    /// dot-width), the first in sort order wins.
    ///
    /// # Errors
    /// `TableLoad` if the directory cannot be scanned or a header is
    /// malformed.
    pub fn from_dir(dir: &std::path::Path) -> BrailleResult<Self> {
        let mut registry = TableRegistry::new();
        for (info, path) in loader::discover_tables(dir)? {
            registry.catalog.push(CatalogEntry {
                info,
                path: Some(path),
            });
        }
        registry.sort_and_dedup();
        Ok(registry)
    }

    pub fn with_verbosity(&mut self, verbosity: VerbosityLevel) -> &mut Self {
        self.verbosity = verbosity;
        self
    }

    /// Register an already-built table in memory (no I/O on resolve).
    /// The first registration of a (locale, grade, dot-width) key wins.
    pub fn with_table(&mut self, table: Table) -> &mut Self {
        let info = table.info().clone();
        if self.catalog.iter().any(|entry| entry.info.key() == info.key()) {
            if self.verbosity >= VerbosityLevel::Normal {
                eprintln!("[braille] Ignoring duplicate table '{}' for {}", info.id, info);
            }
            return self;
        }
        let slot: LoadSlot = Arc::new(OnceLock::new());
        let _ = slot.set(Ok(Arc::new(table)));
        self.cache
            .lock()
            .expect("table cache lock poisoned")
            .insert(info.key(), slot);
        self.catalog.push(CatalogEntry { info, path: None });
        self.sort_and_dedup();
        self
    }

    fn sort_and_dedup(&mut self) {
        let verbosity = self.verbosity;
        self.catalog.sort_by(|a, b| a.info.key().cmp(&b.info.key()));
        self.catalog.dedup_by(|b, a| {
            let duplicate = a.info.key() == b.info.key();
            if duplicate && verbosity >= VerbosityLevel::Normal {
                eprintln!(
                    "[braille] Ignoring duplicate table '{}' for {}",
                    b.info.id, a.info
                );
            }
            duplicate
        });
    }

    /// Enumerate all known tables, ordered by locale, then grade, then
    /// dot-width
    pub fn list_available(&self) -> Vec<TableInfo> {
        self.catalog.iter().map(|entry| entry.info.clone()).collect()
    }

    /// Number of rule-file loads actually performed (diagnostics; cached
    /// and in-memory resolutions do not count)
    pub fn loads_performed(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Resolve a `TableInfo` to a loaded table.
    ///
    /// Matching is exact on (locale, grade, dot-width), case-insensitive
    /// on the locale tag. Concurrent resolves of the same key share one
    /// in-flight load; distinct keys load independently. A failed load is
    /// remembered for its key and never affects other tables.
    ///
    /// # Errors
    /// `TableNotFound` when nothing matches; `TableLoad` when the rule
    /// source is malformed.
    pub fn resolve(&self, info: &TableInfo) -> BrailleResult<Arc<Table>> {
        let key = info.key();
        let entry = self
            .catalog
            .iter()
            .find(|entry| entry.info.key() == key)
            .ok_or_else(|| BrailleError::TableNotFound {
                locale: info.locale.clone(),
                grade: info.grade,
                eight_dot: info.eight_dot,
            })?;

        let slot = {
            let mut cache = self.cache.lock().expect("table cache lock poisoned");
            Arc::clone(cache.entry(key).or_insert_with(|| Arc::new(OnceLock::new())))
        };

        // At most one caller runs the load; the rest block on it and
        // share the outcome
        let outcome = slot.get_or_init(|| {
            let path = entry
                .path
                .as_ref()
                .expect("catalog entry without path or cached table");
            self.loads.fetch_add(1, Ordering::Relaxed);
            match loader::load_table_from_file(path) {
                Ok(table) => {
                    if self.verbosity >= VerbosityLevel::Verbose {
                        eprintln!(
                            "[braille] Loaded table {} ({} rules)",
                            table.info(),
                            table.rules().len()
                        );
                    }
                    Ok(Arc::new(table))
                }
                Err(e) => {
                    if self.verbosity >= VerbosityLevel::Normal {
                        eprintln!("[braille] Failed to load table '{}': {}", entry.info.id, e);
                    }
                    Err(e)
                }
            }
        });
        outcome.clone()
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
