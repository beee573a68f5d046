//! Structural validation of a classified grammar.
//!
//! Runs after every token has been classified into a [`ParseNode`] and before
//! the flag table is built. Checks ordering rules (nothing after `end`,
//! nothing positional after a variadic, no required positional after an
//! optional one) and binding-name collisions.

use std::collections::HashMap;

use crate::error::{ErrorKind, ErrorLoc, ParseError};
use crate::types::{NodeKind, ParseNode};

/// A classified node together with the grammar token it came from.
#[derive(Debug, Clone)]
pub(crate) struct Declared {
    pub node: ParseNode,
    pub token_index: usize,
}

/// Validates node ordering and name uniqueness.
///
/// Fails on the first problem, located at the later of the offending tokens.
pub(crate) fn validate_structure(declared: &[Declared]) -> Result<(), ParseError> {
    let mut names: HashMap<&str, NodeKind> = HashMap::new();
    let mut seen_end = false;
    let mut seen_variadic = false;
    let mut seen_optional = false;

    for Declared { node, token_index } in declared {
        let at = |kind: ErrorKind, detail: &'static str| {
            Err(ParseError::grammar(kind, ErrorLoc::token(*token_index)).with_detail(detail))
        };

        if seen_end {
            return at(
                ErrorKind::UnknownError,
                "the end-of-options marker must be the last element",
            );
        }

        match node.kind {
            NodeKind::End => {
                seen_end = true;
                continue;
            }
            NodeKind::Variable | NodeKind::Variadic => {
                if seen_variadic {
                    return at(
                        ErrorKind::UnknownError,
                        "no positional may follow a variadic",
                    );
                }
                if node.required && seen_optional {
                    return at(
                        ErrorKind::UnknownError,
                        "a required positional cannot follow an optional one",
                    );
                }
                seen_optional |= !node.required;
                seen_variadic |= node.kind == NodeKind::Variadic;
            }
            NodeKind::Option | NodeKind::VariableOption => {}
        }

        if let Some(previous) = names.insert(node.name.as_str(), node.kind) {
            if is_flag(previous) != is_flag(node.kind) {
                return at(
                    ErrorKind::FlagCannotBeVariable,
                    "a flag and a variable share the same name",
                );
            }
            if previous != node.kind {
                return at(
                    ErrorKind::FlagCannotBeVariable,
                    "flag declared both with and without a value",
                );
            }
            return at(ErrorKind::UnknownError, "duplicate binding name");
        }
    }

    // value placeholders are variable names too
    for Declared { node, token_index } in declared {
        let Some(value_name) = node.value_name.as_deref() else {
            continue;
        };
        if names.get(value_name).is_some_and(|kind| !is_flag(*kind)) {
            return Err(
                ParseError::grammar(ErrorKind::FlagCannotBeVariable, ErrorLoc::token(*token_index))
                    .with_detail("a flag value placeholder shadows a variable"),
            );
        }
    }

    Ok(())
}

fn is_flag(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Option | NodeKind::VariableOption)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(nodes: Vec<ParseNode>) -> Vec<Declared> {
        nodes
            .into_iter()
            .enumerate()
            .map(|(token_index, node)| Declared { node, token_index })
            .collect()
    }

    fn kind_of(nodes: Vec<ParseNode>) -> Option<(ErrorKind, usize)> {
        validate_structure(&declare(nodes))
            .err()
            .map(|e| (e.kind, e.loc.token_index))
    }

    #[test]
    fn test_accepts_interleaved_flags() {
        let nodes = vec![
            ParseNode::option(vec!["-l".into()], "l"),
            ParseNode::variable("src", true),
            ParseNode::variable_option(vec!["--color".into()], "color", "mode"),
            ParseNode::variadic("rest", false),
            ParseNode::end("--".into()),
        ];
        assert_eq!(kind_of(nodes), None);
    }

    #[test]
    fn test_rejects_node_after_end() {
        let nodes = vec![
            ParseNode::end("--".into()),
            ParseNode::variable("x", true),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::UnknownError, 1)));

        let nodes = vec![ParseNode::end("--".into()), ParseNode::end("--".into())];
        assert_eq!(kind_of(nodes), Some((ErrorKind::UnknownError, 1)));
    }

    #[test]
    fn test_rejects_positional_after_variadic() {
        let nodes = vec![
            ParseNode::variadic("files", true),
            ParseNode::variable("dst", true),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::UnknownError, 1)));

        let nodes = vec![
            ParseNode::variadic("a", true),
            ParseNode::variadic("b", false),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::UnknownError, 1)));
    }

    #[test]
    fn test_rejects_required_after_optional() {
        let nodes = vec![
            ParseNode::variable("a", false),
            ParseNode::variable("b", true),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::UnknownError, 1)));
    }

    #[test]
    fn test_flag_variable_name_collision() {
        let nodes = vec![
            ParseNode::option(vec!["-l".into()], "l"),
            ParseNode::variable("l", true),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::FlagCannotBeVariable, 1)));

        let nodes = vec![
            ParseNode::variable_option(vec!["--out".into()], "out", "file"),
            ParseNode::variable("file", true),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::FlagCannotBeVariable, 0)));
    }

    #[test]
    fn test_valued_and_plain_forms_of_one_flag_collide() {
        let nodes = vec![
            ParseNode::option(vec!["-f".into()], "f"),
            ParseNode::variable_option(vec!["-f".into()], "f", "x"),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::FlagCannotBeVariable, 1)));
    }

    #[test]
    fn test_duplicate_variable_is_structural() {
        let nodes = vec![
            ParseNode::variable("x", true),
            ParseNode::variable("x", true),
        ];
        assert_eq!(kind_of(nodes), Some((ErrorKind::UnknownError, 1)));
    }
}
