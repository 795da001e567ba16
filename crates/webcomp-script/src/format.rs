//! Token-level formatting normalization.
//!
//! Two rewrites are applied: string literals switch to single quotes unless
//! that would need more escapes, and multi-line object and array literals get
//! a trailing comma after their last element. Line endings become `\n`.

use crate::error::ScriptResult;
use crate::lexer::{is_keyword, match_brackets, tokenize, Token, TokenKind};

/// A replacement of `source[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Normalize quotes, trailing commas and line endings.
pub fn normalize(source: &str) -> ScriptResult<String> {
    let source = source.replace("\r\n", "\n");
    let tokens = tokenize(&source)?;
    let pairs = match_brackets(&source, &tokens)?;

    let mut edits = Vec::new();
    for token in &tokens {
        if token.kind == TokenKind::String {
            if let Some(text) = requote(token.text) {
                edits.push(Edit {
                    start: token.start,
                    end: token.end(),
                    text,
                });
            }
        }
    }

    let literals = classify_literals(&tokens);
    for (open, is_literal) in literals.iter().enumerate() {
        if !is_literal {
            continue;
        }
        let Some(close) = pairs[open] else {
            continue;
        };
        if let Some(at) = trailing_comma_position(&tokens, &pairs, open, close) {
            edits.push(Edit {
                start: at,
                end: at,
                text: ",".to_string(),
            });
        }
    }

    edits.sort_by(|a, b| b.start.cmp(&a.start));
    let mut out = source;
    for edit in edits {
        out.replace_range(edit.start..edit.end, &edit.text);
    }
    Ok(out)
}

/// Re-quote a string literal, or `None` when it is already canonical.
pub fn requote(literal: &str) -> Option<String> {
    let quote = literal.chars().next()?;
    if literal.len() < 2 || !matches!(quote, '\'' | '"') {
        return None;
    }
    let inner = &literal[1..literal.len() - 1];

    let mut singles = 0usize;
    let mut doubles = 0usize;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' { chars.next().unwrap_or('\\') } else { c };
        match c {
            '\'' => singles += 1,
            '"' => doubles += 1,
            _ => {}
        }
    }

    let target = if singles > doubles { '"' } else { '\'' };
    if target == quote {
        return None;
    }

    let mut out = String::with_capacity(literal.len() + 2);
    out.push(target);
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) if escaped == quote => out.push(escaped),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            }
        } else if c == target {
            out.push('\\');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out.push(target);
    Some(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Block,
    Object,
    Array,
    Paren,
    /// A computed member access such as `a[b]`.
    Index,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    ternary: usize,
}

/// For every token, whether it opens an object or array literal.
fn classify_literals(tokens: &[Token<'_>]) -> Vec<bool> {
    let mut literal = vec![false; tokens.len()];
    let mut frames = vec![Frame {
        kind: FrameKind::Block,
        ternary: 0,
    }];
    let mut prev: Option<Token<'_>> = None;
    let mut colon_is_value = false;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_trivia() {
            continue;
        }
        if token.kind == TokenKind::Punct {
            match token.text {
                "?" => {
                    if let Some(top) = frames.last_mut() {
                        top.ternary += 1;
                    }
                }
                ":" => {
                    if let Some(top) = frames.last_mut() {
                        colon_is_value = if top.ternary > 0 {
                            top.ternary -= 1;
                            true
                        } else {
                            top.kind == FrameKind::Object
                        };
                    }
                }
                "{" => {
                    let kind = match prev {
                        Some(p) if p.is_punct(":") => {
                            if colon_is_value {
                                FrameKind::Object
                            } else {
                                FrameKind::Block
                            }
                        }
                        _ => brace_kind(prev.as_ref()),
                    };
                    literal[i] = kind == FrameKind::Object;
                    frames.push(Frame { kind, ternary: 0 });
                }
                "[" => {
                    let kind = if bracket_is_array(prev.as_ref()) {
                        FrameKind::Array
                    } else {
                        FrameKind::Index
                    };
                    literal[i] = kind == FrameKind::Array;
                    frames.push(Frame { kind, ternary: 0 });
                }
                "(" => frames.push(Frame {
                    kind: FrameKind::Paren,
                    ternary: 0,
                }),
                ")" | "]" | "}" => {
                    if frames.len() > 1 {
                        frames.pop();
                    }
                }
                ";" => {
                    if let Some(top) = frames.last_mut() {
                        top.ternary = 0;
                    }
                }
                _ => {}
            }
        }
        prev = Some(*token);
    }
    literal
}

/// Keywords after which `{` or `[` begins an expression.
fn keyword_starts_value(word: &str) -> bool {
    matches!(
        word,
        "return"
            | "typeof"
            | "yield"
            | "await"
            | "in"
            | "of"
            | "case"
            | "throw"
            | "void"
            | "delete"
            | "const"
            | "let"
            | "var"
    )
}

fn brace_kind(prev: Option<&Token<'_>>) -> FrameKind {
    let Some(prev) = prev else {
        return FrameKind::Block;
    };
    match prev.kind {
        TokenKind::Punct => match prev.text {
            ")" | ";" | "{" | "}" | "=>" => FrameKind::Block,
            _ => FrameKind::Object,
        },
        TokenKind::Ident if keyword_starts_value(prev.text) => FrameKind::Object,
        _ => FrameKind::Block,
    }
}

fn bracket_is_array(prev: Option<&Token<'_>>) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    match prev.kind {
        TokenKind::Punct => !matches!(prev.text, ")" | "]" | "}"),
        TokenKind::Ident => keyword_starts_value(prev.text) || (is_keyword(prev.text) && prev.text != "this"),
        _ => false,
    }
}

/// Byte offset where a trailing comma belongs, if the literal needs one.
fn trailing_comma_position(
    tokens: &[Token<'_>],
    pairs: &[Option<usize>],
    open: usize,
    close: usize,
) -> Option<usize> {
    let last = (open + 1..close).rev().find(|&i| !tokens[i].is_trivia())?;
    if tokens[last].is_punct(",") {
        return None;
    }
    if !tokens[last + 1..close].iter().any(|t| t.has_newline()) {
        return None;
    }

    let mut element_start = open + 1;
    let mut i = open + 1;
    while i < close {
        let token = &tokens[i];
        if token.is_opener() {
            i = pairs[i].unwrap_or(i);
        } else if token.is_punct(",") {
            element_start = i + 1;
        }
        i += 1;
    }
    let first = (element_start..close).find(|&i| !tokens[i].is_trivia())?;
    if tokens[first].is_punct("...") {
        return None;
    }
    Some(tokens[last].end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_requote() {
        assert_eq!(requote("\"abc\"").as_deref(), Some("'abc'"));
        assert_eq!(requote("'abc'"), None);
        assert_eq!(requote("\"it's\""), None);
        assert_eq!(requote("\"say \\\"hi\\\"\"").as_deref(), Some("'say \"hi\"'"));
        assert_eq!(requote("'it\\'s'").as_deref(), Some("\"it's\""));
        assert_eq!(requote("\"a\\nb\"").as_deref(), Some("'a\\nb'"));
    }

    #[test]
    fn test_trailing_commas() {
        let source = "const a = {\n  x: 1,\n  y: [\n    1,\n    2\n  ]\n};\nconst b = { c: 1 };";
        assert_eq!(
            normalize(source).unwrap(),
            "const a = {\n  x: 1,\n  y: [\n    1,\n    2,\n  ],\n};\nconst b = { c: 1 };"
        );
    }

    #[test]
    fn test_no_commas_in_blocks_or_calls() {
        let source = "if (a) {\n  b()\n}\nfoo(\n  1\n);\nfunction f() {\n  return 1\n}";
        assert_eq!(normalize(source).unwrap(), source);
    }

    #[test]
    fn test_case_block_is_not_an_object() {
        let source = "switch (x) {\n  case 1: {\n    go()\n  }\n}";
        assert_eq!(normalize(source).unwrap(), source);
    }

    #[test]
    fn test_rest_element_keeps_no_comma() {
        let source = "const {\n  a,\n  ...rest\n} = obj;";
        assert_eq!(normalize(source).unwrap(), source);
    }

    #[test]
    fn test_ternary_object_values() {
        let source = "const o = c ? {\n  a: 1\n} : {\n  b: 2\n};";
        assert_eq!(
            normalize(source).unwrap(),
            "const o = c ? {\n  a: 1,\n} : {\n  b: 2,\n};"
        );
    }

    #[test]
    fn test_crlf_and_quotes() {
        let source = "const s = \"x\";\r\nconst t = `\"y\"`;\r\n";
        assert_eq!(normalize(source).unwrap(), "const s = 'x';\nconst t = `\"y\"`;\n");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let source = "const a = {\n  b: \"c\",\n  d: [1,\n    2]\n}";
        let once = normalize(source).unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }
}
