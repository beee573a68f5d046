//! Whitespace tokenizer with quoting and escaping.
//!
//! The same rules split usage grammars and raw command lines: whitespace
//! separates tokens, the quote character groups a run (and is dropped), and
//! the escape character makes the next character literal.

use crate::error::{ErrorKind, ErrorLoc, ParseError, Phase};
use crate::specials::SpecialChars;

/// A token together with the character offset where its raw text starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    /// Raw offset, relative to `start`, of each character of `text`.
    offsets: Vec<usize>,
}

/// Splits `source` into tokens.
///
/// An unterminated quote or a trailing escape fails with
/// [`ErrorKind::OpenSpecialCharacter`], located at the opening character
/// relative to the start of the token it appears in.
pub fn tokenize(
    source: &str,
    specials: &SpecialChars,
    phase: Phase,
) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;
    let mut open_quote: Option<usize> = None;
    let mut open_escape: Option<usize> = None;

    for (pos, c) in source.chars().enumerate() {
        if open_escape.take().is_some() {
            push_char(&mut current, pos, c);
            continue;
        }
        if c == specials.escape {
            current.get_or_insert_with(|| Token::empty(pos));
            open_escape = Some(pos);
        } else if c == specials.quote {
            current.get_or_insert_with(|| Token::empty(pos));
            open_quote = match open_quote {
                Some(_) => None,
                None => Some(pos),
            };
        } else if c.is_whitespace() && open_quote.is_none() {
            if let Some(token) = current.take() {
                tokens.push(token);
            }
        } else {
            push_char(&mut current, pos, c);
        }
    }

    if let Some(pos) = open_escape.or(open_quote) {
        let start = current.as_ref().map_or(pos, |t| t.start);
        let loc = ErrorLoc::new(tokens.len(), pos - start);
        let detail = if open_escape.is_some() {
            "trailing escape character"
        } else {
            "unterminated quote"
        };
        return Err(ParseError::new(ErrorKind::OpenSpecialCharacter, loc, phase).with_detail(detail));
    }
    if let Some(token) = current {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Splits one command line into argument tokens.
///
/// # Examples
///
/// ```
/// use argspec_core::{SpecialChars, tokenize_line};
///
/// let specials = SpecialChars::default();
/// let args = tokenize_line(r#"cp "my file" \"x\" """#, &specials).unwrap();
/// assert_eq!(args, vec!["cp", "my file", "\"x\"", ""]);
/// ```
pub fn tokenize_line(line: &str, specials: &SpecialChars) -> Result<Vec<String>, ParseError> {
    let tokens = tokenize(line, specials, Phase::Arguments)?;
    Ok(tokens.into_iter().map(|t| t.text).collect())
}

impl Token {
    fn empty(start: usize) -> Self {
        Self {
            text: String::new(),
            start,
            offsets: Vec::new(),
        }
    }

    /// Maps a character offset in `text` to the offset in the raw source,
    /// relative to `start`, skipping the quote and escape characters that
    /// were dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::{Phase, SpecialChars, tokenize};
    ///
    /// let tokens = tokenize(r#"a "b c""#, &SpecialChars::default(), Phase::Grammar).unwrap();
    /// assert_eq!(tokens[1].text, "b c");
    /// assert_eq!(tokens[1].raw_offset(2), 3);
    /// ```
    pub fn raw_offset(&self, char_offset: usize) -> usize {
        match self.offsets.get(char_offset) {
            Some(&raw) => raw,
            None => self
                .offsets
                .last()
                .map_or(char_offset, |&last| last + 1 + char_offset - self.offsets.len()),
        }
    }
}

fn push_char(current: &mut Option<Token>, pos: usize, c: char) {
    let token = current.get_or_insert_with(|| Token::empty(pos));
    token.offsets.push(pos - token.start);
    token.text.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str) -> Result<Vec<String>, ParseError> {
        tokenize_line(line, &SpecialChars::default())
    }

    #[test]
    fn test_collapses_repeated_whitespace() {
        assert_eq!(split("  a \t b\n c ").unwrap(), vec!["a", "b", "c"]);
        assert!(split("   ").unwrap().is_empty());
    }

    #[test]
    fn test_quote_joins_and_escape_is_literal() {
        assert_eq!(
            split(r#"--name="John Smith" \\path"#).unwrap(),
            vec!["--name=John Smith", "\\path"]
        );
    }

    #[test]
    fn test_token_starts_are_char_offsets() {
        let tokens = tokenize("é  ab", &SpecialChars::default(), Phase::Grammar).unwrap();
        assert_eq!(tokens[0].start, 0);
        assert_eq!(tokens[1].start, 3);
    }

    #[test]
    fn test_raw_offsets_skip_quotes_and_escapes() {
        let tokens =
            tokenize(r#""[-a||-b]" x\"y"#, &SpecialChars::default(), Phase::Grammar).unwrap();
        assert_eq!(tokens[0].text, "[-a||-b]");
        assert_eq!(tokens[0].raw_offset(0), 1);
        assert_eq!(tokens[0].raw_offset(4), 5);
        assert_eq!(tokens[0].raw_offset(8), 9);
        assert_eq!(tokens[1].text, "x\"y");
        assert_eq!(tokens[1].raw_offset(2), 3);
    }

    #[test]
    fn test_unterminated_quote_is_located() {
        let err = split(r#"a b"c d"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OpenSpecialCharacter);
        assert_eq!(err.phase, Phase::Arguments);
        assert_eq!(err.loc, ErrorLoc::new(1, 1));
    }

    #[test]
    fn test_trailing_escape_is_open() {
        let err = split("a \\").unwrap_err();
        assert_eq!(err.kind, ErrorKind::OpenSpecialCharacter);
        assert_eq!(err.loc, ErrorLoc::new(1, 0));
    }

    #[test]
    fn test_custom_quote_character() {
        let specials = SpecialChars {
            quote: '\'',
            ..SpecialChars::default()
        };
        let args = tokenize_line("'a b' \"c", &specials).unwrap();
        assert_eq!(args, vec!["a b", "\"c"]);
    }
}
