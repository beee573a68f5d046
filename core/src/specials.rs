//! Configurable special characters used by the tokenizer, compiler and matcher.
//!
//! # Example YAML
//!
//! ```yaml
//! flag_prefix: "+"
//! assignment: ":"
//! ```
//!
//! Omitted fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ErrorLoc, ParseError};

/// Flag prefix, value assignment, quote and escape characters.
///
/// # Examples
///
/// ```
/// use argspec_core::SpecialChars;
///
/// let specials = SpecialChars::default();
/// assert_eq!(specials.flag_prefix, '-');
/// assert_eq!(specials.end_marker(), "--");
/// assert!(specials.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialChars {
    /// Character that introduces a flag (`-v`, `--verbose`).
    pub flag_prefix: char,
    /// Character separating a flag from an inline value (`--color=auto`).
    pub assignment: char,
    /// Character that opens and closes a quoted run.
    pub quote: char,
    /// Character that makes the following character literal.
    pub escape: char,
}

impl Default for SpecialChars {
    fn default() -> Self {
        Self {
            flag_prefix: '-',
            assignment: '=',
            quote: '"',
            escape: '\\',
        }
    }
}

/// Characters with fixed meaning in the usage grammar.
const RESERVED: [char; 5] = ['[', ']', '<', '>', '|'];

impl SpecialChars {
    /// The end-of-options marker: the flag prefix doubled.
    pub fn end_marker(&self) -> String {
        [self.flag_prefix, self.flag_prefix].iter().collect()
    }

    /// Rejects configurations where characters coincide, are whitespace, or
    /// clash with the fixed grammar punctuation.
    pub fn validate(&self) -> Result<(), ParseError> {
        let chars = [self.flag_prefix, self.assignment, self.quote, self.escape];
        for (i, c) in chars.iter().enumerate() {
            if c.is_whitespace() || RESERVED.contains(c) || *c == '.' {
                return Err(invalid(format!("special character {c:?} is reserved")));
            }
            if chars[i + 1..].contains(c) {
                return Err(invalid(format!("special character {c:?} is used twice")));
            }
            if c.is_alphanumeric() || *c == '_' {
                return Err(invalid(format!(
                    "special character {c:?} would be part of an identifier"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(detail: String) -> ParseError {
    ParseError::grammar(ErrorKind::UnknownError, ErrorLoc::default()).with_detail(detail)
}
