//! Caret rendering of located parse errors.
//!
//! ```text
//! Unknown flag. (argument 0, offset 0): `--colour` is not declared
//!   | --colour=auto src
//!   | ^
//! ```

use argspec_core::{ParseError, Phase, SpecialChars, tokenize};

/// Renders an argument-phase error against the argument tokens.
pub fn render_arguments(err: &ParseError, args: &[String]) -> String {
    let line = args.join(" ");
    let column = if err.loc.token_index < args.len() {
        args[..err.loc.token_index]
            .iter()
            .map(|a| a.chars().count() + 1)
            .sum::<usize>()
            + err.loc.char_offset
    } else {
        past_end(&line)
    };
    frame(err, &line, column)
}

/// Renders a grammar-phase error against the usage string.
pub fn render_usage(err: &ParseError, usage: &str, specials: &SpecialChars) -> String {
    let start = tokenize(usage, specials, Phase::Grammar)
        .ok()
        .and_then(|tokens| tokens.get(err.loc.token_index).map(|t| t.start));
    let column = match start {
        Some(start) => start + err.loc.char_offset,
        None => past_end(usage).saturating_sub(1),
    };
    frame(err, usage, column)
}

fn past_end(line: &str) -> usize {
    match line.chars().count() {
        0 => 0,
        n => n + 1,
    }
}

fn frame(err: &ParseError, line: &str, column: usize) -> String {
    format!("{err}\n  | {line}\n  | {}^", " ".repeat(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argspec_core::ParserDef;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_caret_under_inline_assignment() {
        let def = ParserDef::compile("[-f] <x>").unwrap();
        let argv = args(&["v", "-f=1"]);
        let err = def.matches(&argv).unwrap_err();
        let rendered = render_arguments(&err, &argv);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "  | v -f=1");
        assert_eq!(lines[2], "  |     ^");
    }

    #[test]
    fn test_caret_past_end_for_missing_values() {
        let def = ParserDef::compile("<src> <dst>").unwrap();
        let argv = args(&["a.txt"]);
        let err = def.matches(&argv).unwrap_err();
        let rendered = render_arguments(&err, &argv);
        assert!(rendered.ends_with("  |       ^"), "{rendered}");
    }

    #[test]
    fn test_caret_inside_usage_token() {
        let usage = "<src> [-a||-b]";
        let err = ParserDef::compile(usage).unwrap_err();
        let rendered = render_usage(&err, usage, &SpecialChars::default());
        let caret = rendered.lines().last().unwrap();
        assert_eq!(caret, format!("  | {}^", " ".repeat(6 + 4)));
    }

    #[test]
    fn test_caret_inside_quoted_usage_token() {
        let usage = r#"<src> "[-a||-b]""#;
        let err = ParserDef::compile(usage).unwrap_err();
        let rendered = render_usage(&err, usage, &SpecialChars::default());
        let caret = rendered.lines().last().unwrap();
        assert_eq!(caret, format!("  | {}^", " ".repeat(6 + 5)));
    }
}
