//! Compiled grammar types.
//!
//! A usage string compiles into a [`ParserDef`]: the ordered [`ParseNode`]
//! sequence, a [`FlagTable`] indexing every flag spelling, and the
//! [`SpecialChars`] in effect. A `ParserDef` is never mutated after
//! compilation and can be shared freely between threads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::PolyHash;
use crate::specials::SpecialChars;
use crate::table::FlagTable;

/// Kind of grammar element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Flag without a value (`[-l|--long]`).
    Option,
    /// Positional value (`<src>`, `[<dst>]`).
    Variable,
    /// Flag carrying a value (`[--color=<mode>]`).
    VariableOption,
    /// Positional absorbing every remaining positional token (`<files...>`).
    Variadic,
    /// End-of-options marker (`--`).
    End,
}

/// One compiled grammar element.
///
/// # Examples
///
/// ```
/// use argspec_core::{NodeKind, ParserDef};
///
/// let def = ParserDef::compile("[-c|--color=<mode>] <dirs...>").unwrap();
/// let color = &def.nodes()[0];
/// assert_eq!(color.kind, NodeKind::VariableOption);
/// assert_eq!(color.spellings, vec!["-c", "--color"]);
/// assert_eq!(color.name, "color");
/// assert_eq!(color.value_name.as_deref(), Some("mode"));
/// assert!(color.takes_value);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseNode {
    pub kind: NodeKind,
    /// Flag aliases in declaration order; empty for positionals.
    pub spellings: Vec<String>,
    /// Binding name used to read the matched value back.
    pub name: String,
    /// Placeholder of a valued flag (`mode` in `--color=<mode>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,
    pub takes_value: bool,
    /// Positionals only: must be supplied for the match to succeed.
    pub required: bool,
}

impl ParseNode {
    pub fn variable(name: &str, required: bool) -> Self {
        Self {
            kind: NodeKind::Variable,
            spellings: Vec::new(),
            name: name.to_string(),
            value_name: None,
            takes_value: true,
            required,
        }
    }

    pub fn variadic(name: &str, required: bool) -> Self {
        Self {
            kind: NodeKind::Variadic,
            ..Self::variable(name, required)
        }
    }

    pub fn option(spellings: Vec<String>, name: &str) -> Self {
        Self {
            kind: NodeKind::Option,
            spellings,
            name: name.to_string(),
            value_name: None,
            takes_value: false,
            required: false,
        }
    }

    pub fn variable_option(spellings: Vec<String>, name: &str, value_name: &str) -> Self {
        Self {
            kind: NodeKind::VariableOption,
            value_name: Some(value_name.to_string()),
            takes_value: true,
            ..Self::option(spellings, name)
        }
    }

    pub fn end(marker: String) -> Self {
        Self {
            kind: NodeKind::End,
            spellings: vec![marker],
            name: String::new(),
            value_name: None,
            takes_value: false,
            required: false,
        }
    }

    /// Whether tokens reach this node by position rather than by spelling.
    pub fn is_positional(&self) -> bool {
        matches!(self.kind, NodeKind::Variable | NodeKind::Variadic)
    }
}

/// An immutable compiled usage grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDef<H = PolyHash> {
    pub(crate) nodes: Vec<ParseNode>,
    pub(crate) table: FlagTable<H>,
    pub(crate) specials: SpecialChars,
    pub(crate) positionals: Vec<usize>,
    pub(crate) variadic: Option<usize>,
}

impl<H> ParserDef<H> {
    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[ParseNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&ParseNode> {
        self.nodes.get(index)
    }

    pub fn table(&self) -> &FlagTable<H> {
        &self.table
    }

    pub fn specials(&self) -> &SpecialChars {
        &self.specials
    }

    /// Indices of `variable` nodes in positional order.
    pub fn positionals(&self) -> &[usize] {
        &self.positionals
    }

    pub fn variadic(&self) -> Option<usize> {
        self.variadic
    }

    /// Number of positional tokens the grammar needs at minimum.
    pub fn required_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.is_positional() && n.required)
            .count()
    }

    /// Finds the node bound to `name`.
    ///
    /// Accepts a binding name (`color`) or, for flags, any declared
    /// spelling (`--color`, `-c`).
    pub fn find(&self, name: &str) -> Option<usize>
    where
        H: crate::hash::FlagHasher,
    {
        if name.starts_with(self.specials.flag_prefix) {
            return self.table.lookup(name);
        }
        if name.is_empty() {
            return None;
        }
        self.nodes.iter().position(|n| n.name == name)
    }
}

impl<H> fmt::Display for ParserDef<H> {
    /// Writes the canonical usage string; compiling it again yields an equal
    /// definition.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in &self.nodes {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match node.kind {
                NodeKind::Option => write!(f, "[{}]", node.spellings.join("|"))?,
                NodeKind::VariableOption => write!(
                    f,
                    "[{}{}<{}>]",
                    node.spellings.join("|"),
                    self.specials.assignment,
                    node.value_name.as_deref().unwrap_or(&node.name)
                )?,
                NodeKind::Variable | NodeKind::Variadic => {
                    let dots = if node.kind == NodeKind::Variadic {
                        "..."
                    } else {
                        ""
                    };
                    if node.required {
                        write!(f, "<{}{dots}>", node.name)?;
                    } else {
                        write!(f, "[<{}{dots}>]", node.name)?;
                    }
                }
                NodeKind::End => f.write_str(&node.spellings.join(""))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_canonical() {
        let def =
            ParserDef::compile("src  [dst] [-v|--verbose] -x --out=<file> [rest...] --").unwrap();
        assert_eq!(
            def.to_string(),
            "<src> [<dst>] [-v|--verbose] [-x] [--out=<file>] [<rest...>] --"
        );
        assert_eq!(ParserDef::compile(&def.to_string()).unwrap(), def);
    }

    #[test]
    fn test_find_by_name_or_spelling() {
        let def = ParserDef::compile("[-l|--long] [--color=<mode>] <dirs...>").unwrap();
        assert_eq!(def.find("long"), Some(0));
        assert_eq!(def.find("-l"), Some(0));
        assert_eq!(def.find("--color"), Some(1));
        assert_eq!(def.find("color"), Some(1));
        assert_eq!(def.find("dirs"), Some(2));
        assert_eq!(def.find("mode"), None);
        assert_eq!(def.find("--nope"), None);
        assert_eq!(def.find(""), None);
    }

    #[test]
    fn test_node_serializes_kind_snake_case() {
        let node = ParseNode::variable_option(vec!["--color".into()], "color", "mode");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "variable_option");
        assert_eq!(json["value_name"], "mode");
    }
}
