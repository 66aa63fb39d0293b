//! Bidirectional braille transcoding.
//!
//! Converts Unicode text into braille cell patterns and cell patterns back
//! into text, keeping an exact, invertible correspondence between text
//! offsets and cell offsets so a cursor in either representation can be
//! translated to the other. Translation is driven entirely by tables keyed
//! by (locale, grade, dot-width); grade 2 tables add contraction rules that
//! collapse multi-character sequences into single cells.
//!
//! ```no_run
//! use braille_transcode::{
//!     BrailleTranslator, Grade, TableInfo, TableRegistry, TranslationSession,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = TableRegistry::from_dir("tables".as_ref())?;
//!     let info = TableInfo::new("en-us-g2", "en-US", Grade::Two, false)?;
//!     let session = TranslationSession::open(&registry, &info)?;
//!
//!     let result = session.translate("the cat")?;
//!     println!("{}", braille_transcode::cell::cells_to_unicode(&result.cells));
//!     Ok(())
//! }
//! ```

pub mod cell;
pub mod error;
pub mod input;
pub mod loader;
pub mod position;
pub mod registry;
pub mod session;
pub mod table;
pub mod transcoder;

pub use cell::CellBuffer;
pub use error::{BrailleError, BrailleResult};
pub use input::{ArgumentKind, BrailleInputEvent, Command};
pub use loader::{load_table_from_file, parse_table};
pub use position::{PositionMap, PositionMapper};
pub use registry::TableRegistry;
pub use session::{BrailleTranslator, TranslationSession};
pub use table::{Grade, Rule, Table, TableInfo};
pub use transcoder::{BackTranslationResult, Transcoder, TranslationResult};

/// Verbosity level for debug logging during table loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// No debug logging
    Silent = 0,
    /// Log only load failures and ignored duplicates (default)
    Normal = 1,
    /// Log every successful table load
    Verbose = 2,
}
