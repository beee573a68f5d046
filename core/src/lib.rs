//! Usage-grammar compiler and argument matcher.
//!
//! A program describes its command line once, as a usage string, and gets
//! back a parser for it:
//!
//! - [`Compiler`] / [`ParserDef::compile`] turn a usage string such as
//!   `"[-l|--long] [--color=<mode>] <dirs...> --"` into an immutable
//!   [`ParserDef`]: ordered [`ParseNode`]s plus a [`FlagTable`] indexing
//!   every flag spelling.
//! - [`Matcher`] / [`ParserDef::matches`] match an argument vector against a
//!   definition in a single pass, producing [`Matches`] or writing straight
//!   into caller variables through [`Receiver`]s.
//! - [`FromMatches`] and [`ParserDef::parse`] build application types from
//!   the matches.
//! - [`compile_cached`] / [`GrammarCache`] compile each distinct usage
//!   string once per process.
//!
//! Every failure is a [`ParseError`]: one of nine [`ErrorKind`]s plus an
//! [`ErrorLoc`] pointing at the offending usage or argument token.
//!
//! # Example
//!
//! ```
//! use argspec_core::*;
//!
//! let def = ParserDef::compile("[-l] [--color=<mode>] <dirs...>").unwrap();
//! let m = def.matches(["--color=auto", "-l", "src", "docs"]).unwrap();
//!
//! assert!(m.flag("l").unwrap());
//! assert_eq!(m.value("color").unwrap(), Some("auto"));
//! assert_eq!(m.values("dirs").unwrap(), vec!["src", "docs"]);
//!
//! let err = def.matches(["-x", "src"]).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::UnknownFlag);
//! assert_eq!(err.loc, ErrorLoc::new(0, 0));
//! ```

mod cache;
mod compile;
mod error;
mod hash;
mod lexer;
mod matcher;
mod receiver;
mod specials;
mod table;
mod types;
mod validate;

pub use cache::{GrammarCache, compile_cached};
pub use compile::Compiler;
pub use error::{ErrorKind, ErrorLoc, ParseError, Phase};
pub use hash::{FlagHasher, PolyHash, StdHash};
pub use lexer::{Token, tokenize, tokenize_line};
pub use matcher::{FromMatches, Matcher, Matches, Occurrence, ParseResult};
pub use receiver::{Receiver, Store};
pub use specials::SpecialChars;
pub use table::FlagTable;
pub use types::{NodeKind, ParseNode, ParserDef};
