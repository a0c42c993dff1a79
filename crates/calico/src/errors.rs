//! Runtime error currency.
//!
//! Calico errors are not catchable from script code: every error produced
//! during lexing, parsing, or evaluation propagates as a [`RunError`] all
//! the way out of [`crate::runtime::Runner::run`], and the embedder decides
//! what to do with it. The CLI renders the diagnostic and exits non-zero.
//!
//! The one exception is resource failures inside the `io` module, which are
//! surfaced through the file object's own status pair (`error()` /
//! `errormessage()`) instead of aborting execution.

use strum::{Display, IntoStaticStr};

use crate::{area::SourceArea, intern::Interner};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Classification of a fatal interpreter error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// Bad character or unterminated literal.
    Lex,
    /// Syntactic failure.
    Parse,
    /// Name lookup failed.
    Name,
    /// Operator unsupported by the operand types, wrong argument count, or
    /// impossible coercion.
    Type,
    /// Out-of-bounds index or negative size.
    Range,
    /// Division or remainder by zero.
    Arithmetic,
    /// Native module load failed.
    Module,
    /// Internal invariant violated or a resource limit exhausted.
    Fatal,
}

/// A fatal error with the source area it points at.
#[derive(Debug, Clone)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
    pub area: SourceArea,
}

impl RunError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, area: SourceArea) -> Self {
        Self {
            kind,
            message: message.into(),
            area,
        }
    }

    #[must_use]
    pub fn type_error(message: impl Into<String>, area: SourceArea) -> Self {
        Self::new(ErrorKind::Type, message, area)
    }

    #[must_use]
    pub fn name_error(message: impl Into<String>, area: SourceArea) -> Self {
        Self::new(ErrorKind::Name, message, area)
    }

    #[must_use]
    pub fn range_error(message: impl Into<String>, area: SourceArea) -> Self {
        Self::new(ErrorKind::Range, message, area)
    }

    /// Renders the diagnostic as `<file>:<line>:<col>: <kind> error: <message>`.
    #[must_use]
    pub fn render(&self, interner: &Interner) -> String {
        format!(
            "{}:{}:{}: {} error: {}",
            interner.name_of(self.area.file),
            self.area.first_line,
            self.area.first_column,
            self.kind,
            self.message
        )
    }
}

/// A fully rendered diagnostic, ready to show to a user.
///
/// This is the public face of [`RunError`]: the interned filename has been
/// resolved, so the diagnostic is self-contained and can outlive the runner
/// that produced it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn from_error(err: RunError, interner: &Interner) -> Self {
        Self {
            kind: err.kind,
            file: interner.name_of(err.area.file).to_owned(),
            line: err.area.first_line,
            column: err.area.first_column,
            message: err.message,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} error: {}",
            self.file, self.line, self.column, self.kind, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_location_and_kind() {
        let mut interner = Interner::new();
        let file = interner.intern("prog.cal");
        let err = RunError::type_error("Integer does not support that operator", SourceArea::new(file, 3, 7, 3, 12));
        assert_eq!(
            err.render(&interner),
            "prog.cal:3:7: type error: Integer does not support that operator"
        );
    }
}
