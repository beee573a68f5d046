//! Located, typed errors shared by the grammar compiler and the matcher.
//!
//! Both phases report failures with the same [`ErrorKind`] enumeration and the
//! same [`ErrorLoc`] format, so callers can format either uniformly. The
//! [`Phase`] tag records which input the location points into.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed taxonomy of failures.
///
/// The `Display` impl yields the short diagnostic message for each kind.
///
/// # Examples
///
/// ```
/// use argspec_core::ErrorKind;
///
/// assert_eq!(ErrorKind::UnknownFlag.to_string(), "Unknown flag.");
/// assert_eq!(ErrorKind::ALL.len(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A name or spelling was referenced that the grammar never declared.
    UnknownOption,
    /// More positional tokens than the grammar can absorb.
    TooManyArguments,
    /// A required positional or a flag value is missing.
    TooFewArguments,
    /// A flag collides with a variable (or a valued form of itself).
    FlagCannotBeVariable,
    /// A prefixed token matched no declared spelling.
    UnknownFlag,
    /// An inline value was given to a flag that takes none.
    FlagDoesNotAcceptArgument,
    /// A quote, escape or bracket was left open.
    OpenSpecialCharacter,
    /// A value failed conversion to its target type.
    InvalidArgument,
    /// Any structural failure the other kinds do not classify.
    UnknownError,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::UnknownOption,
        ErrorKind::TooManyArguments,
        ErrorKind::TooFewArguments,
        ErrorKind::FlagCannotBeVariable,
        ErrorKind::UnknownFlag,
        ErrorKind::FlagDoesNotAcceptArgument,
        ErrorKind::OpenSpecialCharacter,
        ErrorKind::InvalidArgument,
        ErrorKind::UnknownError,
    ];

    /// Snake-case identifier, stable across releases.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnknownOption => "unknown_option",
            ErrorKind::TooManyArguments => "too_many_arguments",
            ErrorKind::TooFewArguments => "too_few_arguments",
            ErrorKind::FlagCannotBeVariable => "flag_cannot_be_variable",
            ErrorKind::UnknownFlag => "unknown_flag",
            ErrorKind::FlagDoesNotAcceptArgument => "flag_does_not_accept_argument",
            ErrorKind::OpenSpecialCharacter => "open_special_character",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ErrorKind::UnknownOption => "Unknown option.",
            ErrorKind::TooManyArguments => "Too many arguments.",
            ErrorKind::TooFewArguments => "Too few arguments.",
            ErrorKind::FlagCannotBeVariable => "A flag cannot be assigned to a variable.",
            ErrorKind::UnknownFlag => "Unknown flag.",
            ErrorKind::FlagDoesNotAcceptArgument => "Flag does not accept argument.",
            ErrorKind::OpenSpecialCharacter => "At least one special character is still open.",
            ErrorKind::InvalidArgument => "Invalid argument.",
            ErrorKind::UnknownError => "Unknown error.",
        };
        f.write_str(msg)
    }
}

/// Position of a failure: token index plus character offset inside that token.
///
/// For the [`Phase::Arguments`] phase a `token_index` equal to the number of
/// tokens means "past the end" (a missing value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ErrorLoc {
    pub token_index: usize,
    pub char_offset: usize,
}

impl ErrorLoc {
    pub const fn new(token_index: usize, char_offset: usize) -> Self {
        Self {
            token_index,
            char_offset,
        }
    }

    /// Start of the given token.
    pub const fn token(token_index: usize) -> Self {
        Self::new(token_index, 0)
    }
}

/// Which input an [`ErrorLoc`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The usage grammar string.
    Grammar,
    /// The runtime argument vector (or command line).
    Arguments,
}

/// A located failure from compilation or matching.
///
/// `detail` carries either a borrowed static explanation (structural
/// grammar faults) or an owned message (conversion failures from `FromStr`).
///
/// # Examples
///
/// ```
/// use argspec_core::{ErrorKind, ErrorLoc, ParseError};
///
/// let err = ParseError::arguments(ErrorKind::TooFewArguments, ErrorLoc::token(1));
/// assert_eq!(err.to_string(), "Too few arguments. (argument 1, offset 0)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{kind} ({} {}, offset {}){}",
    phase_label(.phase),
    .loc.token_index,
    .loc.char_offset,
    detail_suffix(.detail)
)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub loc: ErrorLoc,
    pub phase: Phase,
    pub detail: Option<Cow<'static, str>>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, loc: ErrorLoc, phase: Phase) -> Self {
        Self {
            kind,
            loc,
            phase,
            detail: None,
        }
    }

    /// Error located in the usage grammar.
    pub fn grammar(kind: ErrorKind, loc: ErrorLoc) -> Self {
        Self::new(kind, loc, Phase::Grammar)
    }

    /// Error located in the runtime arguments.
    pub fn arguments(kind: ErrorKind, loc: ErrorLoc) -> Self {
        Self::new(kind, loc, Phase::Arguments)
    }

    /// Attaches a detail message.
    pub fn with_detail(mut self, detail: impl Into<Cow<'static, str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

fn phase_label(phase: &Phase) -> &'static str {
    match phase {
        Phase::Grammar => "usage token",
        Phase::Arguments => "argument",
    }
}

fn detail_suffix(detail: &Option<Cow<'static, str>>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_identifiers_are_unique() {
        let mut names: Vec<_> = ErrorKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ErrorKind::ALL.len());
        assert_eq!(ErrorKind::ALL.last(), Some(&ErrorKind::UnknownError));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ParseError::grammar(ErrorKind::UnknownError, ErrorLoc::new(2, 3))
            .with_detail("empty alias");
        assert_eq!(
            err.to_string(),
            "Unknown error. (usage token 2, offset 3): empty alias"
        );
        assert_eq!(err.detail(), Some("empty alias"));
    }

    #[test]
    fn test_detail_owned_and_borrowed_compare_equal() {
        let borrowed = ParseError::arguments(ErrorKind::InvalidArgument, ErrorLoc::token(0))
            .with_detail("bad");
        let owned = ParseError::arguments(ErrorKind::InvalidArgument, ErrorLoc::token(0))
            .with_detail(String::from("bad"));
        assert_eq!(borrowed, owned);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::FlagDoesNotAcceptArgument).unwrap();
        assert_eq!(json, "\"flag_does_not_accept_argument\"");
    }
}
