//! Usage-grammar compiler.
//!
//! Tokenizes a usage string, classifies every token into a [`ParseNode`],
//! validates the result and indexes all flag spellings into a [`FlagTable`].
//! Compilation is pure: the same usage string and configuration always
//! produce equal [`ParserDef`] values.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ErrorKind, ErrorLoc, ParseError, Phase};
use crate::hash::{FlagHasher, PolyHash};
use crate::lexer::{self, Token};
use crate::specials::SpecialChars;
use crate::table::FlagTable;
use crate::types::{NodeKind, ParseNode, ParserDef};
use crate::validate::{Declared, validate_structure};

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("static regex must compile")
});
static FLAG_BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_?][A-Za-z0-9_-]*$").expect("static regex must compile")
});

const VARIADIC_MARKER: &str = "...";

/// Compiles usage strings into [`ParserDef`] values.
///
/// # Examples
///
/// ```
/// use argspec_core::{Compiler, NodeKind, StdHash, SpecialChars};
///
/// let compiler = Compiler::with_hasher(StdHash).specials(SpecialChars {
///     flag_prefix: '+',
///     ..SpecialChars::default()
/// });
/// let def = compiler.compile("[+v] <file> ++").unwrap();
/// let kinds: Vec<_> = def.nodes().iter().map(|n| n.kind).collect();
/// assert_eq!(kinds, vec![NodeKind::Option, NodeKind::Variable, NodeKind::End]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler<H = PolyHash> {
    specials: SpecialChars,
    hasher: H,
}

impl Compiler<PolyHash> {
    pub fn new() -> Self {
        Self::with_hasher(PolyHash)
    }
}

impl Default for Compiler<PolyHash> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: FlagHasher + Clone> Compiler<H> {
    /// Compiler using a custom flag hashing strategy.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            specials: SpecialChars::default(),
            hasher,
        }
    }

    /// Replaces the special characters.
    pub fn specials(mut self, specials: SpecialChars) -> Self {
        self.specials = specials;
        self
    }

    pub fn special_chars(&self) -> &SpecialChars {
        &self.specials
    }

    /// Compiles `usage` into an immutable definition.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] in the [`Phase::Grammar`] phase, located at
    /// the offending usage token.
    pub fn compile(&self, usage: &str) -> Result<ParserDef<H>, ParseError> {
        self.specials.validate()?;
        let tokens = lexer::tokenize(usage, &self.specials, Phase::Grammar)?;

        let mut declared = tokens
            .iter()
            .enumerate()
            .map(|(token_index, token)| {
                self.classify(token, token_index)
                    .map(|node| Declared { node, token_index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        qualify_colliding_flag_names(&mut declared, self.specials.flag_prefix);
        validate_structure(&declared)?;

        let mut table = FlagTable::with_hasher(self.hasher.clone());
        let mut positionals = Vec::new();
        let mut variadic = None;
        for (index, Declared { node, token_index }) in declared.iter().enumerate() {
            match node.kind {
                NodeKind::Variable => positionals.push(index),
                NodeKind::Variadic => variadic = Some(index),
                NodeKind::Option | NodeKind::VariableOption | NodeKind::End => {}
            }
            for spelling in &node.spellings {
                if let Err(owner) = table.insert(spelling, index) {
                    return Err(duplicate_spelling(&declared[owner].node, node, *token_index));
                }
            }
        }

        let nodes: Vec<ParseNode> = declared.into_iter().map(|d| d.node).collect();
        debug!(
            usage,
            nodes = nodes.len(),
            flags = table.len(),
            positionals = positionals.len(),
            variadic = variadic.is_some(),
            "Compiled usage grammar"
        );

        Ok(ParserDef {
            nodes,
            table,
            specials: self.specials,
            positionals,
            variadic,
        })
    }

    fn classify(&self, token: &Token, token_index: usize) -> Result<ParseNode, ParseError> {
        let text = token.text.as_str();
        let fail = |kind: ErrorKind, byte: usize, detail: &'static str| {
            let loc = ErrorLoc::new(token_index, token.raw_offset(char_offset(text, byte)));
            ParseError::grammar(kind, loc).with_detail(detail)
        };

        let (inner, base, optional) = if let Some(rest) = text.strip_prefix('[') {
            match rest.strip_suffix(']') {
                Some(inner) => (inner, 1, true),
                None => {
                    return Err(fail(ErrorKind::OpenSpecialCharacter, 0, "unclosed '['"));
                }
            }
        } else if text.ends_with(']') {
            return Err(fail(ErrorKind::UnknownError, text.len() - 1, "unmatched ']'"));
        } else {
            (text, 0, false)
        };

        if inner.is_empty() {
            return Err(fail(ErrorKind::UnknownError, 0, "empty element"));
        }
        if inner == self.specials.end_marker() {
            return Ok(ParseNode::end(inner.to_string()));
        }
        if inner.starts_with(self.specials.flag_prefix) {
            return self.classify_flag(inner, base, &fail);
        }
        self.classify_positional(inner, base, optional, &fail)
    }

    fn classify_flag(
        &self,
        inner: &str,
        base: usize,
        fail: &dyn Fn(ErrorKind, usize, &'static str) -> ParseError,
    ) -> Result<ParseNode, ParseError> {
        let (aliases, value) = match inner.find(self.specials.assignment) {
            Some(pos) => (
                &inner[..pos],
                Some((&inner[pos + self.specials.assignment.len_utf8()..], pos)),
            ),
            None => (inner, None),
        };

        let mut spellings = Vec::new();
        let mut name = "";
        let mut offset = 0;
        for alias in aliases.split('|') {
            if alias.is_empty() {
                return Err(fail(ErrorKind::UnknownError, base + offset, "empty flag alias"));
            }
            let body = strip_prefix_chars(alias, self.specials.flag_prefix);
            if body.is_none_or(|b| !FLAG_BODY_RE.is_match(b)) {
                return Err(fail(ErrorKind::UnknownError, base + offset, "malformed flag spelling"));
            }
            let body = body.unwrap_or_default();
            if body.len() > name.len() {
                name = body;
            }
            spellings.push(alias.to_string());
            offset += alias.len() + 1;
        }

        let Some((value, pos)) = value else {
            return Ok(ParseNode::option(spellings, name));
        };
        let value_base = base + pos + self.specials.assignment.len_utf8();
        let value_name = match value.strip_prefix('<') {
            Some(rest) => match rest.strip_suffix('>') {
                Some(value_name) => value_name,
                None => {
                    return Err(fail(ErrorKind::OpenSpecialCharacter, value_base, "unclosed '<'"));
                }
            },
            None => {
                return Err(fail(
                    ErrorKind::UnknownError,
                    value_base,
                    "a flag value must be written as <name>",
                ));
            }
        };
        if !IDENT_RE.is_match(value_name) {
            return Err(fail(ErrorKind::UnknownError, value_base + 1, "malformed value name"));
        }
        Ok(ParseNode::variable_option(spellings, name, value_name))
    }

    fn classify_positional(
        &self,
        inner: &str,
        base: usize,
        optional: bool,
        fail: &dyn Fn(ErrorKind, usize, &'static str) -> ParseError,
    ) -> Result<ParseNode, ParseError> {
        let (inner, trailing_dots) = match inner.strip_suffix(VARIADIC_MARKER) {
            Some(rest) => (rest, true),
            None => (inner, false),
        };
        let (ident, ident_base) = match inner.strip_prefix('<') {
            Some(rest) => match rest.strip_suffix('>') {
                Some(ident) => (ident, base + 1),
                None => {
                    return Err(fail(ErrorKind::OpenSpecialCharacter, base, "unclosed '<'"));
                }
            },
            None if inner.ends_with('>') => {
                return Err(fail(
                    ErrorKind::UnknownError,
                    base + inner.len() - 1,
                    "unmatched '>'",
                ));
            }
            None => (inner, base),
        };
        let (ident, inner_dots) = match ident.strip_suffix(VARIADIC_MARKER) {
            Some(rest) => (rest, true),
            None => (ident, false),
        };
        if trailing_dots && inner_dots {
            return Err(fail(ErrorKind::UnknownError, ident_base, "repeated variadic marker"));
        }
        if ident.starts_with(self.specials.flag_prefix) {
            return Err(fail(
                ErrorKind::FlagCannotBeVariable,
                ident_base,
                "a variable cannot be named like a flag",
            ));
        }
        if !IDENT_RE.is_match(ident) {
            return Err(fail(ErrorKind::UnknownError, ident_base, "malformed variable name"));
        }

        if trailing_dots || inner_dots {
            Ok(ParseNode::variadic(ident, !optional))
        } else {
            Ok(ParseNode::variable(ident, !optional))
        }
    }
}

impl ParserDef<PolyHash> {
    /// Compiles `usage` with the default special characters and hasher.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::ParserDef;
    ///
    /// let def = ParserDef::compile("<src> <dst>").unwrap();
    /// assert_eq!(def.required_count(), 2);
    /// ```
    pub fn compile(usage: &str) -> Result<Self, ParseError> {
        Compiler::new().compile(usage)
    }
}

fn duplicate_spelling(owner: &ParseNode, node: &ParseNode, token_index: usize) -> ParseError {
    let loc = ErrorLoc::token(token_index);
    let valued = |n: &ParseNode| n.kind == NodeKind::VariableOption;
    if valued(owner) != valued(node) {
        ParseError::grammar(ErrorKind::FlagCannotBeVariable, loc)
            .with_detail("flag declared both with and without a value")
    } else {
        ParseError::grammar(ErrorKind::UnknownError, loc).with_detail("flag declared twice")
    }
}

/// Binds flags whose stripped names collide (`-a` and `--a`) under their
/// full spelling instead, so each stays reachable by name.
fn qualify_colliding_flag_names(declared: &mut [Declared], prefix: char) {
    let is_flag = |d: &Declared| matches!(d.node.kind, NodeKind::Option | NodeKind::VariableOption);

    let mut counts: HashMap<String, usize> = HashMap::new();
    for d in declared.iter().filter(|d| is_flag(d)) {
        *counts.entry(d.node.name.clone()).or_default() += 1;
    }
    for d in declared.iter_mut() {
        if !is_flag(d) || counts.get(&d.node.name).is_none_or(|&n| n < 2) {
            continue;
        }
        let full = d
            .node
            .spellings
            .iter()
            .find(|s| strip_prefix_chars(s, prefix) == Some(d.node.name.as_str()))
            .cloned();
        if let Some(full) = full {
            d.node.name = full;
        }
    }
}

/// Strips one or two leading prefix characters.
fn strip_prefix_chars(alias: &str, prefix: char) -> Option<&str> {
    let once = alias.strip_prefix(prefix)?;
    let body = once.strip_prefix(prefix).unwrap_or(once);
    if body.is_empty() { None } else { Some(body) }
}

fn char_offset(text: &str, byte: usize) -> usize {
    text.get(..byte).map_or(byte, |prefix| prefix.chars().count())
}
