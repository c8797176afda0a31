//! The error ledger.
//!
//! Compliance checks never stop at the first problem. Instead, each one
//! appends an [`ErrorObject`] to an [`ErrorLog`], and callers look at the
//! whole ledger once a batch of checks is done.

use core::ops::Range;

/// How bad an error is.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum ErrorLevel {
    /// Informational. Doesn't affect compliance.
    Warning,

    /// A real deviation, though checking continues.
    NonFatal,

    /// The artifact isn't compliant.
    Fatal,
}

impl core::fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ErrorLevel::Warning => "WARNING",
            ErrorLevel::NonFatal => "NON_FATAL",
            ErrorLevel::Fatal => "FATAL",
        })
    }
}

/// Which part of validation an error came from.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum ErrorCode {
    /// IMF core constraints (st2067-2), including partition rules.
    ImfCoreConstraintsError,

    /// Structural problems with an essence component (OP1A, packages, tracks).
    ImfEssenceComponentError,

    /// Problems with essence descriptors and their values.
    ImfEssenceMetadataError,

    /// Composition-level problems.
    ImfCplError,

    /// An application profile's constraints weren't met.
    ApplicationCompositionError,

    /// Something went wrong inside the validator itself.
    InternalError,
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ErrorCode::ImfCoreConstraintsError => "IMF_CORE_CONSTRAINTS_ERROR",
            ErrorCode::ImfEssenceComponentError => "IMF_ESSENCE_COMPONENT_ERROR",
            ErrorCode::ImfEssenceMetadataError => "IMF_ESSENCE_METADATA_ERROR",
            ErrorCode::ImfCplError => "IMF_CPL_ERROR",
            ErrorCode::ApplicationCompositionError => "APPLICATION_COMPOSITION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        })
    }
}

/// One entry in the ledger.
///
/// These don't change once created.
#[derive(Clone, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct ErrorObject {
    code: ErrorCode,
    level: ErrorLevel,
    description: String,
}

impl ErrorObject {
    pub fn new(code: ErrorCode, level: ErrorLevel, description: impl Into<String>) -> Self {
        Self {
            code,
            level,
            description: description.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn level(&self) -> ErrorLevel {
        self.level
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_fatal(&self) -> bool {
        self.level == ErrorLevel::Fatal
    }
}

/// Formats as `<code> - <level> - <description>`.
impl core::fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} - {} - {}", self.code, self.level, self.description)
    }
}

/// An append-only, ordered list of errors.
///
/// One of these is made per validation session. To combine the results of
/// independent sessions, use [`ErrorLog::extend`] once they're done.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct ErrorLog {
    errors: Vec<ErrorObject>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new error.
    ///
    /// FATAL entries are also written to the `log` facade at `error` level,
    /// and everything else at `warn`.
    pub fn add_error(&mut self, code: ErrorCode, level: ErrorLevel, description: impl Into<String>) {
        self.add(ErrorObject::new(code, level, description));
    }

    /// Appends an existing error.
    pub fn add(&mut self, error: ErrorObject) {
        match error.level() {
            ErrorLevel::Fatal => log::error!("{error}"),
            ErrorLevel::NonFatal | ErrorLevel::Warning => log::warn!("{error}"),
        }
        self.errors.push(error);
    }

    /// Appends every error in `errors`, in order.
    pub fn extend(&mut self, errors: impl IntoIterator<Item = ErrorObject>) {
        for e in errors {
            self.add(e);
        }
    }

    pub fn errors(&self) -> &[ErrorObject] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ErrorObject> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any FATAL error has been logged.
    pub fn has_fatal_errors(&self) -> bool {
        self.errors.iter().any(ErrorObject::is_fatal)
    }

    /// Whether any FATAL error was logged within `range` (by index).
    ///
    /// Checkers use this to look at only the errors their batch added.
    pub fn has_fatal_errors_in(&self, range: Range<usize>) -> bool {
        self.slice(range).iter().any(ErrorObject::is_fatal)
    }

    /// All errors at `level`, optionally limited to an index range.
    ///
    /// Only entries at exactly `level` are returned, whatever that level is.
    pub fn errors_by_level(&self, level: ErrorLevel, range: Option<Range<usize>>) -> Vec<&ErrorObject> {
        self.slice_opt(range)
            .iter()
            .filter(|e| e.level() == level)
            .collect()
    }

    /// All errors with `code`, optionally limited to an index range.
    ///
    /// Every level is kept, not just FATAL.
    pub fn errors_by_code(&self, code: ErrorCode, range: Option<Range<usize>>) -> Vec<&ErrorObject> {
        self.slice_opt(range)
            .iter()
            .filter(|e| e.code() == code)
            .collect()
    }

    /// Clamps `range` to the ledger, so out-of-bounds ranges just see less.
    fn slice(&self, range: Range<usize>) -> &[ErrorObject] {
        let end = range.end.min(self.errors.len());
        let start = range.start.min(end);
        &self.errors[start..end]
    }

    fn slice_opt(&self, range: Option<Range<usize>>) -> &[ErrorObject] {
        match range {
            Some(r) => self.slice(r),
            None => &self.errors,
        }
    }
}

/// One `<code> - <level> - <description>` line per entry.
impl core::fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for e in &self.errors {
            writeln!(f, "{e}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ErrorLog {
    type Item = ErrorObject;
    type IntoIter = std::vec::IntoIter<ErrorObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a ErrorObject;
    type IntoIter = core::slice::Iter<'a, ErrorObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
