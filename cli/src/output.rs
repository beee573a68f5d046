//! Output formatting for compiled grammars and match results.

use argspec_core::{ErrorKind, ErrorLoc, NodeKind, ParseError, ParseNode, ParserDef, Phase, SpecialChars};
use serde::Serialize;
use serde_json::Value;

/// Supported output formats.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Text,
}

/// Serializable summary of a compiled grammar.
#[derive(Debug, Serialize)]
pub struct DefinitionReport<'a> {
    pub usage: &'a str,
    pub canonical: String,
    pub specials: SpecialChars,
    pub nodes: &'a [ParseNode],
}

impl<'a> DefinitionReport<'a> {
    pub fn new(usage: &'a str, def: &'a ParserDef) -> Self {
        Self {
            usage,
            canonical: def.to_string(),
            specials: *def.specials(),
            nodes: def.nodes(),
        }
    }
}

/// Serializable form of a [`ParseError`].
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub phase: Phase,
    pub loc: ErrorLoc,
    pub message: String,
}

impl From<&ParseError> for ErrorReport {
    fn from(err: &ParseError) -> Self {
        Self {
            kind: err.kind,
            phase: err.phase,
            loc: err.loc,
            message: err.to_string(),
        }
    }
}

/// Outcome of matching one line of a batch file.
#[derive(Debug, Serialize)]
pub struct LineOutcome {
    /// 1-based line number in the input file.
    pub line: usize,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// Formats a compiled grammar in the requested output format.
pub fn format_definition(report: &DefinitionReport<'_>, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => Ok(definition_to_text(report)),
    }
}

/// Formats the JSON rendering of a match in the requested output format.
pub fn format_matches(matches: &Value, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(matches)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(matches).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => Ok(matches_to_text(matches)),
    }
}

/// Formats batch results in the requested output format.
pub fn format_batch(outcomes: &[LineOutcome], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcomes)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(outcomes).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => Ok(batch_to_text(outcomes)),
    }
}

fn definition_to_text(report: &DefinitionReport<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", report.canonical));
    for node in report.nodes {
        let kind = match node.kind {
            NodeKind::Option => "option",
            NodeKind::Variable => "variable",
            NodeKind::VariableOption => "variable_option",
            NodeKind::Variadic => "variadic",
            NodeKind::End => "end",
        };
        let label = if node.spellings.is_empty() {
            node.name.clone()
        } else {
            node.spellings.join(", ")
        };
        let mut line = format!("{kind:<16} {label}");
        if let Some(value_name) = &node.value_name {
            line.push_str(&format!(" <{value_name}>"));
        }
        if node.is_positional() && !node.required {
            line.push_str(" (optional)");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn matches_to_text(matches: &Value) -> String {
    let mut out = String::new();
    if let Value::Object(map) = matches {
        for (name, value) in map {
            out.push_str(&format!("{name} = {}\n", value_to_text(value)));
        }
    }
    out
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

fn batch_to_text(outcomes: &[LineOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        match (&outcome.matches, &outcome.error) {
            (_, Some(error)) => {
                out.push_str(&format!("{}: error: {}\n", outcome.line, error.message));
            }
            (Some(matches), None) => {
                out.push_str(&format!("{}: ok\n", outcome.line));
                for line in matches_to_text(matches).lines() {
                    out.push_str(&format!("    {line}\n"));
                }
            }
            (None, None) => {}
        }
    }
    out
}
