//! Argument matcher.
//!
//! A [`Matcher`] walks an argument vector once, left to right, against a
//! compiled [`ParserDef`]. Prefixed tokens are resolved through the flag
//! table; everything else fills positionals in declaration order and then the
//! variadic. The cursor never rewinds, and the first failure ends the match.
//!
//! The untyped outcome is [`Matches`]. Implement [`FromMatches`] to turn it
//! into an application type via [`ParserDef::parse`].

use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{ErrorKind, ErrorLoc, ParseError, Phase};
use crate::hash::{FlagHasher, PolyHash};
use crate::lexer::tokenize_line;
use crate::receiver::Receiver;
use crate::types::{NodeKind, ParseNode, ParserDef};

/// Result of a typed parse.
pub type ParseResult<A> = Result<A, ParseError>;

/// Builds an application type from untyped matches.
///
/// # Examples
///
/// ```
/// use argspec_core::{FlagHasher, FromMatches, Matches, ParseResult, ParserDef};
///
/// struct CopyArgs {
///     src: String,
///     dst: String,
///     force: bool,
/// }
///
/// impl FromMatches for CopyArgs {
///     fn from_matches<H: FlagHasher>(m: &Matches<'_, H>) -> ParseResult<Self> {
///         Ok(CopyArgs {
///             src: m.required("src")?,
///             dst: m.required("dst")?,
///             force: m.flag("--force")?,
///         })
///     }
/// }
///
/// let def = ParserDef::compile("[-f|--force] <src> <dst>").unwrap();
/// let copy: CopyArgs = def.parse(["a.txt", "-f", "b.txt"]).unwrap();
/// assert_eq!((copy.src.as_str(), copy.dst.as_str(), copy.force), ("a.txt", "b.txt", true));
/// ```
pub trait FromMatches: Sized {
    fn from_matches<H: FlagHasher>(matches: &Matches<'_, H>) -> ParseResult<Self>;
}

/// One matched appearance of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Raw value; `None` for plain options and for reference-bound nodes.
    pub value: Option<String>,
    pub loc: ErrorLoc,
}

/// Untyped outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches<'d, H = PolyHash> {
    def: &'d ParserDef<H>,
    slots: Vec<Vec<Occurrence>>,
    arg_count: usize,
    end_seen: bool,
}

impl<'d, H: FlagHasher> Matches<'d, H> {
    pub fn def(&self) -> &'d ParserDef<H> {
        self.def
    }

    /// Number of argument tokens that were matched.
    pub fn arg_count(&self) -> usize {
        self.arg_count
    }

    /// Whether the end-of-options marker appeared.
    pub fn end_seen(&self) -> bool {
        self.end_seen
    }

    /// Every occurrence of the node bound to `name`, in arrival order.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnknownOption`] if the grammar declares no such name.
    pub fn occurrences(&self, name: &str) -> ParseResult<&[Occurrence]> {
        let index = self.index_of(name)?;
        Ok(&self.slots[index])
    }

    /// Whether the node bound to `name` matched at least once.
    pub fn flag(&self, name: &str) -> ParseResult<bool> {
        Ok(!self.occurrences(name)?.is_empty())
    }

    pub fn count(&self, name: &str) -> ParseResult<usize> {
        Ok(self.occurrences(name)?.len())
    }

    /// The last raw value bound to `name`.
    pub fn value(&self, name: &str) -> ParseResult<Option<&str>> {
        let occurrences = self.occurrences(name)?;
        Ok(occurrences.iter().rev().find_map(|o| o.value.as_deref()))
    }

    /// All raw values bound to `name`.
    pub fn values(&self, name: &str) -> ParseResult<Vec<&str>> {
        let occurrences = self.occurrences(name)?;
        Ok(occurrences.iter().filter_map(|o| o.value.as_deref()).collect())
    }

    /// Converts the last value bound to `name`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidArgument`] located at the value if conversion
    /// fails; [`ErrorKind::UnknownOption`] for undeclared names.
    pub fn get<T>(&self, name: &str) -> ParseResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let occurrences = self.occurrences(name)?;
        occurrences
            .iter()
            .rev()
            .find_map(|o| o.value.as_deref().map(|v| (v, o.loc)))
            .map(|(raw, loc)| convert(raw, loc))
            .transpose()
    }

    /// Like [`get`](Self::get), but a missing value is
    /// [`ErrorKind::TooFewArguments`] located past the last argument.
    ///
    /// A node whose value went to a bound [`Receiver`] matched but kept no
    /// value here; reading it is [`ErrorKind::UnknownOption`].
    pub fn required<T>(&self, name: &str) -> ParseResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let index = self.index_of(name)?;
        if let Some(value) = self.get(name)? {
            return Ok(value);
        }
        let takes_value = self.def.nodes()[index].kind != NodeKind::Option;
        let err = if takes_value && !self.slots[index].is_empty() {
            ParseError::grammar(ErrorKind::UnknownOption, ErrorLoc::default())
                .with_detail(format!("`{name}` is bound to caller storage"))
        } else {
            ParseError::arguments(ErrorKind::TooFewArguments, ErrorLoc::token(self.arg_count))
                .with_detail(format!("no value for `{name}`"))
        };
        Err(err)
    }

    /// Builds an [`ErrorKind::InvalidArgument`] for a value the application
    /// rejects after conversion, located at the last occurrence of `name`
    /// (or past the last argument if it never matched).
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::{ErrorKind, ErrorLoc, ParserDef};
    ///
    /// let def = ParserDef::compile("[--jobs=<n>]").unwrap();
    /// let m = def.matches(["--jobs=0"]).unwrap();
    /// let err = m.invalid("jobs", "must be at least 1");
    /// assert_eq!(err.kind, ErrorKind::InvalidArgument);
    /// assert_eq!(err.loc, ErrorLoc::new(0, 7));
    /// ```
    pub fn invalid(&self, name: &str, detail: impl Into<Cow<'static, str>>) -> ParseError {
        let index = match self.index_of(name) {
            Ok(index) => index,
            Err(err) => return err,
        };
        let loc = self.slots[index]
            .last()
            .map_or(ErrorLoc::token(self.arg_count), |o| o.loc);
        ParseError::arguments(ErrorKind::InvalidArgument, loc).with_detail(detail)
    }

    /// Converts every value bound to `name`, preserving arrival order.
    pub fn get_all<T>(&self, name: &str) -> ParseResult<Vec<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.occurrences(name)?
            .iter()
            .filter_map(|o| o.value.as_deref().map(|v| convert(v, o.loc)))
            .collect()
    }

    /// Renders the matches as a JSON object keyed by binding name.
    ///
    /// Options map to booleans, variadics to arrays, everything else to the
    /// last value or `null`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (node, occurrences) in self.def.nodes().iter().zip(&self.slots) {
            let values = || {
                occurrences
                    .iter()
                    .filter_map(|o| o.value.clone().map(Value::String))
            };
            let rendered = match node.kind {
                NodeKind::End => continue,
                NodeKind::Option => Value::Bool(!occurrences.is_empty()),
                NodeKind::Variadic => Value::Array(values().collect()),
                NodeKind::Variable | NodeKind::VariableOption => {
                    values().last().unwrap_or(Value::Null)
                }
            };
            out.insert(node.name.clone(), rendered);
        }
        Value::Object(out)
    }

    fn index_of(&self, name: &str) -> ParseResult<usize> {
        match self.def.find(name) {
            Some(index) if self.def.nodes()[index].kind != NodeKind::End => Ok(index),
            _ => Err(unknown_option(name)),
        }
    }
}

/// Single-use matcher holding one receiver per node.
///
/// # Examples
///
/// ```
/// use argspec_core::{Matcher, ParserDef};
///
/// let def = ParserDef::compile("[-n|--count=<n>] <files...>").unwrap();
/// let mut count = 1u32;
/// let mut files: Vec<String> = Vec::new();
/// Matcher::new(&def)
///     .bind("count", &mut count)
///     .unwrap()
///     .bind_all("files", &mut files)
///     .unwrap()
///     .run(["-n", "3", "a", "b"])
///     .unwrap();
/// assert_eq!(count, 3);
/// assert_eq!(files, vec!["a", "b"]);
/// ```
#[derive(Debug)]
pub struct Matcher<'d, 'a, H = PolyHash> {
    def: &'d ParserDef<H>,
    receivers: Vec<Receiver<'a>>,
}

impl<'d, 'a, H: FlagHasher> Matcher<'d, 'a, H> {
    pub fn new(def: &'d ParserDef<H>) -> Self {
        Self {
            def,
            receivers: def.nodes().iter().map(|_| Receiver::owned()).collect(),
        }
    }

    /// Binds the node named `name` to caller storage.
    ///
    /// Plain options deliver `"true"` on each occurrence, so bind them to a
    /// `bool`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnknownOption`] if the grammar declares no such name.
    pub fn bind<T>(self, name: &str, slot: &'a mut T) -> ParseResult<Self>
    where
        T: FromStr + 'a,
        T::Err: Display,
    {
        self.attach(name, Receiver::reference(slot))
    }

    /// Binds the node named `name` to a caller vector that collects every
    /// value.
    pub fn bind_all<T>(self, name: &str, slot: &'a mut Vec<T>) -> ParseResult<Self>
    where
        T: FromStr + 'a,
        T::Err: Display,
    {
        self.attach(name, Receiver::reference_all(slot))
    }

    fn attach(mut self, name: &str, receiver: Receiver<'a>) -> ParseResult<Self> {
        match self.def.find(name) {
            Some(index) if self.def.nodes()[index].kind != NodeKind::End => {
                self.receivers[index] = receiver;
                Ok(self)
            }
            _ => Err(unknown_option(name)),
        }
    }

    /// Matches `args` (program name excluded).
    pub fn run<I, S>(self, args: I) -> ParseResult<Matches<'d, H>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let def = self.def;
        let mut state = State {
            def,
            receivers: self.receivers,
            locs: vec![Vec::new(); def.nodes().len()],
            next_positional: 0,
            end_seen: false,
        };
        match state.consume(&args) {
            Ok(()) => Ok(state.finish(args.len())),
            Err(err) => {
                debug!(kind = err.kind.as_str(), loc = ?err.loc, "Argument matching failed");
                Err(err)
            }
        }
    }
}

impl<H: FlagHasher> ParserDef<H> {
    /// Matches `args` with owned receivers for every node.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::{ErrorKind, ParserDef};
    ///
    /// let def = ParserDef::compile("<src> <dst>").unwrap();
    /// let m = def.matches(["a.txt", "b.txt"]).unwrap();
    /// assert_eq!(m.value("dst").unwrap(), Some("b.txt"));
    ///
    /// let err = def.matches(["a.txt"]).unwrap_err();
    /// assert_eq!(err.kind, ErrorKind::TooFewArguments);
    /// ```
    pub fn matches<I, S>(&self, args: I) -> ParseResult<Matches<'_, H>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Matcher::new(self).run(args)
    }

    /// Tokenizes a raw command line, then matches it.
    pub fn matches_line(&self, line: &str) -> ParseResult<Matches<'_, H>> {
        let args = tokenize_line(line, &self.specials)?;
        self.matches(args)
    }

    /// Matches `args` and builds `A` from the result.
    pub fn parse<A, I, S>(&self, args: I) -> ParseResult<A>
    where
        A: FromMatches,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matches = self.matches(args)?;
        A::from_matches(&matches)
    }
}

struct State<'d, 'a, H> {
    def: &'d ParserDef<H>,
    receivers: Vec<Receiver<'a>>,
    locs: Vec<Vec<ErrorLoc>>,
    next_positional: usize,
    end_seen: bool,
}

impl<'d, H: FlagHasher> State<'d, '_, H> {
    fn consume<S: AsRef<str>>(&mut self, args: &[S]) -> ParseResult<()> {
        let prefix = self.def.specials().flag_prefix;
        let mut index = 0;
        while index < args.len() {
            let token = args[index].as_ref();
            if !self.end_seen && token.starts_with(prefix) {
                index = self.flag(args, index)?;
            } else {
                self.positional(token, index)?;
            }
            index += 1;
        }

        let missing = self.def.nodes().iter().enumerate().find(|(i, node)| {
            node.is_positional() && node.required && self.locs[*i].is_empty()
        });
        if let Some((_, node)) = missing {
            return Err(
                ParseError::arguments(ErrorKind::TooFewArguments, ErrorLoc::token(args.len()))
                    .with_detail(format!("missing <{}>", node.name)),
            );
        }
        Ok(())
    }

    /// Handles the flag token at `index`; returns the index of the last
    /// token consumed.
    fn flag<S: AsRef<str>>(&mut self, args: &[S], index: usize) -> ParseResult<usize> {
        let def = self.def;
        let token = args[index].as_ref();
        let assignment = def.specials().assignment;
        let (spelling, inline) = match token.find(assignment) {
            Some(pos) => (
                &token[..pos],
                Some((&token[pos + assignment.len_utf8()..], token[..pos].chars().count())),
            ),
            None => (token, None),
        };

        let Some(node_index) = def.table().lookup(spelling) else {
            return Err(
                ParseError::arguments(ErrorKind::UnknownFlag, ErrorLoc::token(index))
                    .with_detail(format!("`{spelling}` is not declared")),
            );
        };
        let node: &ParseNode = &def.nodes()[node_index];
        trace!(index, spelling, kind = ?node.kind, "Matched flag");

        match node.kind {
            NodeKind::End | NodeKind::Option => {
                if let Some((_, eq_offset)) = inline {
                    return Err(ParseError::arguments(
                        ErrorKind::FlagDoesNotAcceptArgument,
                        ErrorLoc::new(index, eq_offset),
                    )
                    .with_detail(format!("`{spelling}` takes no value")));
                }
                self.end_seen |= node.kind == NodeKind::End;
                self.locs[node_index].push(ErrorLoc::token(index));
                if !self.receivers[node_index].is_owned() {
                    self.deliver(node_index, "true", ErrorLoc::token(index))?;
                }
                Ok(index)
            }
            NodeKind::VariableOption => match inline {
                Some((value, eq_offset)) => {
                    self.bind_value(node_index, value, ErrorLoc::new(index, eq_offset + 1))?;
                    Ok(index)
                }
                None => {
                    let Some(value) = args.get(index + 1) else {
                        return Err(ParseError::arguments(
                            ErrorKind::TooFewArguments,
                            ErrorLoc::token(args.len()),
                        )
                        .with_detail(format!("`{spelling}` needs a value")));
                    };
                    self.bind_value(node_index, value.as_ref(), ErrorLoc::token(index + 1))?;
                    Ok(index + 1)
                }
            },
            NodeKind::Variable | NodeKind::Variadic => Err(ParseError::arguments(
                ErrorKind::UnknownError,
                ErrorLoc::token(index),
            )
            .with_detail("flag table points at a positional")),
        }
    }

    fn positional(&mut self, token: &str, index: usize) -> ParseResult<()> {
        let target = match self.def.positionals().get(self.next_positional) {
            Some(&node_index) => {
                self.next_positional += 1;
                node_index
            }
            None => match self.def.variadic() {
                Some(node_index) => node_index,
                None => {
                    return Err(ParseError::arguments(
                        ErrorKind::TooManyArguments,
                        ErrorLoc::token(index),
                    ));
                }
            },
        };
        trace!(index, token, node = target, "Bound positional");
        self.bind_value(target, token, ErrorLoc::token(index))
    }

    fn bind_value(&mut self, node_index: usize, raw: &str, loc: ErrorLoc) -> ParseResult<()> {
        self.locs[node_index].push(loc);
        self.deliver(node_index, raw, loc)
    }

    fn deliver(&mut self, node_index: usize, raw: &str, loc: ErrorLoc) -> ParseResult<()> {
        self.receivers[node_index].receive(raw).map_err(|detail| {
            ParseError::arguments(ErrorKind::InvalidArgument, loc).with_detail(detail)
        })
    }

    fn finish(self, arg_count: usize) -> Matches<'d, H> {
        let slots = self
            .receivers
            .into_iter()
            .zip(self.locs)
            .map(|(receiver, locs)| {
                let mut values = receiver.into_values().unwrap_or_default().into_iter();
                locs.into_iter()
                    .map(|loc| Occurrence {
                        value: values.next(),
                        loc,
                    })
                    .collect()
            })
            .collect();
        Matches {
            def: self.def,
            slots,
            arg_count,
            end_seen: self.end_seen,
        }
    }
}

fn convert<T>(raw: &str, loc: ErrorLoc) -> ParseResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| {
        ParseError::arguments(ErrorKind::InvalidArgument, loc).with_detail(e.to_string())
    })
}

fn unknown_option(name: &str) -> ParseError {
    ParseError::new(ErrorKind::UnknownOption, ErrorLoc::default(), Phase::Grammar)
        .with_detail(format!("`{name}` is not declared in the usage"))
}
