use crate::table::Grade;

/// Error types for the braille transcoding engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrailleError {
    /// No table matches the requested (locale, grade, dot-width) exactly
    TableNotFound {
        locale: String,
        grade: Grade,
        eight_dot: bool,
    },
    /// Malformed rule data in a table source; `rule` is the index of the
    /// first bad rule entry when the failure is inside the rule list
    TableLoad {
        source: String,
        rule: Option<usize>,
        message: String,
    },
    /// A TableInfo field is out of range (bad locale tag, grade not 1 or 2)
    InvalidTableInfo(String),
    /// Use of a session after destroy()
    SessionClosed,
    /// Broken engine invariant (e.g. out-of-order position spans).
    /// Distinct from user-facing errors: signals a defect, not bad input.
    Internal(String),
}

impl std::fmt::Display for BrailleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrailleError::TableNotFound {
                locale,
                grade,
                eight_dot,
            } => write!(
                f,
                "No table for locale '{}', grade {}, {}-dot",
                locale,
                grade.as_u8(),
                if *eight_dot { 8 } else { 6 }
            ),
            BrailleError::TableLoad {
                source,
                rule,
                message,
            } => match rule {
                Some(index) => write!(
                    f,
                    "Failed to load table from '{}' at rule {}: {}",
                    source, index, message
                ),
                None => write!(f, "Failed to load table from '{}': {}", source, message),
            },
            BrailleError::InvalidTableInfo(msg) => write!(f, "Invalid table info: {}", msg),
            BrailleError::SessionClosed => write!(f, "Translation session already destroyed"),
            BrailleError::Internal(msg) => write!(f, "Internal engine error: {}", msg),
        }
    }
}

impl std::error::Error for BrailleError {}

/// Result type for engine operations
pub type BrailleResult<T> = Result<T, BrailleError>;
