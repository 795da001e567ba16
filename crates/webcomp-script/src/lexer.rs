//! Tokenizer for JavaScript and TypeScript source.
//!
//! The token stream is lossless: concatenating every token's text gives back
//! the input. Template literals are single tokens, including any `${}`
//! expressions they contain, so later passes never see their contents.

use crate::error::{Position, ScriptError, ScriptResult};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Spaces, tabs and newlines.
    Whitespace,
    LineComment,
    BlockComment,
    /// Identifiers and keywords, including `#private` names.
    Ident,
    Number,
    /// Single- or double-quoted string literal.
    String,
    /// Template literal, including its interpolations.
    Template,
    Regex,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset in the tokenized source.
    pub start: usize,
}

impl<'a> Token<'a> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Whitespace or a comment.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_punct(&self, s: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == s
    }

    pub fn is_ident(&self, s: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == s
    }

    /// `(`, `[` or `{`.
    pub fn is_opener(&self) -> bool {
        self.kind == TokenKind::Punct && matches!(self.text, "(" | "[" | "{")
    }

    /// `)`, `]` or `}`.
    pub fn is_closer(&self) -> bool {
        self.kind == TokenKind::Punct && matches!(self.text, ")" | "]" | "}")
    }

    pub fn newlines(&self) -> usize {
        self.text.matches('\n').count()
    }

    pub fn has_newline(&self) -> bool {
        self.text.contains('\n')
    }
}

/// Reserved words and contextual keywords that never name a value here.
pub fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "export"
            | "extends"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "let"
            | "new"
            | "of"
            | "return"
            | "switch"
            | "throw"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
            | "await"
    )
}

/// Keywords after which a `/` starts a regular expression.
fn keyword_precedes_expression(s: &str) -> bool {
    matches!(
        s,
        "return"
            | "typeof"
            | "instanceof"
            | "in"
            | "of"
            | "new"
            | "delete"
            | "void"
            | "throw"
            | "case"
            | "do"
            | "else"
            | "yield"
            | "await"
    )
}

const PUNCTS: &[&str] = &[
    "...", "===", "!==", "**=", "<<=", "&&=", "||=", "??=", "=>", "==", "!=", "<=", "<<", "&&",
    "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**",
];

/// Byte ranges of the `${}` expressions in the template literal `template`,
/// relative to its start.
pub fn template_substitutions(template: &str) -> ScriptResult<Vec<Range<usize>>> {
    Lexer::new(template).lex_template(0)
}

/// Tokenize `source` into a lossless token stream.
pub fn tokenize(source: &str) -> ScriptResult<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    /// The last non-trivia token, used to tell regexes from division.
    prev: Option<(TokenKind, &'a str)>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            prev: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn unterminated(&self, what: &'static str, start: usize) -> ScriptError {
        ScriptError::Unterminated {
            what,
            at: Position::of(self.source, start),
        }
    }

    fn next_token(&mut self) -> ScriptResult<Option<Token<'a>>> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = if c.is_whitespace() || c == '\u{feff}' {
            while matches!(self.peek(), Some(c) if c.is_whitespace() || c == '\u{feff}') {
                self.bump();
            }
            TokenKind::Whitespace
        } else if self.rest().starts_with("//") || (start == 0 && self.rest().starts_with("#!")) {
            while matches!(self.peek(), Some(c) if c != '\n' && c != '\r') {
                self.bump();
            }
            TokenKind::LineComment
        } else if self.rest().starts_with("/*") {
            match self.rest()[2..].find("*/") {
                Some(i) => self.pos += 2 + i + 2,
                None => return Err(self.unterminated("block comment", start)),
            }
            TokenKind::BlockComment
        } else if c == '\'' || c == '"' {
            self.lex_string(c, start)?;
            TokenKind::String
        } else if c == '`' {
            self.lex_template(start)?;
            TokenKind::Template
        } else if c.is_ascii_digit()
            || (c == '.' && matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()))
        {
            self.lex_number();
            TokenKind::Number
        } else if is_ident_start(c) {
            self.bump();
            while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
                self.bump();
            }
            TokenKind::Ident
        } else if c == '/' && self.regex_allowed() {
            self.lex_regex(start)?;
            TokenKind::Regex
        } else {
            self.lex_punct();
            TokenKind::Punct
        };

        let text = &self.source[start..self.pos];
        if !matches!(
            kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        ) {
            self.prev = Some((kind, text));
        }
        Ok(Some(Token { kind, text, start }))
    }

    fn regex_allowed(&self) -> bool {
        match self.prev {
            None => true,
            Some((TokenKind::Punct, p)) => !matches!(p, ")" | "]" | "}" | "++" | "--"),
            Some((TokenKind::Ident, word)) => keyword_precedes_expression(word),
            Some(_) => false,
        }
    }

    fn lex_string(&mut self, quote: char, start: usize) -> ScriptResult<()> {
        self.bump();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.unterminated("string literal", start)),
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn lex_template(&mut self, start: usize) -> ScriptResult<Vec<Range<usize>>> {
        let mut substitutions = Vec::new();
        self.bump();
        loop {
            match self.peek() {
                None => return Err(self.unterminated("template literal", start)),
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('`') => {
                    self.bump();
                    return Ok(substitutions);
                }
                Some('$') if self.peek_nth(1) == Some('{') => {
                    self.pos += 2;
                    let from = self.pos;
                    self.lex_interpolation(start)?;
                    substitutions.push(from..self.pos - 1);
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Skip a `${ ... }` expression, stopping after its closing brace.
    fn lex_interpolation(&mut self, template_start: usize) -> ScriptResult<()> {
        let saved_prev = self.prev.take();
        let mut depth = 0usize;
        loop {
            let Some(token) = self.next_token()? else {
                return Err(self.unterminated("template literal", template_start));
            };
            if token.is_punct("{") {
                depth += 1;
            } else if token.is_punct("}") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
        }
        self.prev = saved_prev;
        Ok(())
    }

    fn lex_number(&mut self) {
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        let mut last = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && !hex && matches!(last, 'e' | 'E');
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                last = c;
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_regex(&mut self, start: usize) -> ScriptResult<()> {
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.unterminated("regular expression", start)),
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.bump();
        }
        Ok(())
    }

    fn lex_punct(&mut self) {
        let rest = self.rest();
        for p in PUNCTS {
            if rest.starts_with(p) {
                // `a?.5:b` is a conditional, not optional chaining.
                if *p == "?." && matches!(self.peek_nth(2), Some(d) if d.is_ascii_digit()) {
                    continue;
                }
                self.pos += p.len();
                return;
            }
        }
        self.bump();
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$' || c == '#' || c == '\\' || (!c.is_ascii() && !c.is_whitespace())
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\\' || c == '\u{200c}' || c == '\u{200d}'
}

/// Index of the matching closer for every opener, and vice versa.
pub fn match_brackets(source: &str, tokens: &[Token<'_>]) -> ScriptResult<Vec<Option<usize>>> {
    let mut pairs = vec![None; tokens.len()];
    let mut stack: Vec<usize> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.is_opener() {
            stack.push(i);
        } else if token.is_closer() {
            let Some(open) = stack.pop() else {
                return Err(ScriptError::Unbalanced {
                    delim: token.text.to_string(),
                    at: Position::of(source, token.start),
                });
            };
            let expected = match tokens[open].text {
                "(" => ")",
                "[" => "]",
                _ => "}",
            };
            if token.text != expected {
                return Err(ScriptError::Unbalanced {
                    delim: token.text.to_string(),
                    at: Position::of(source, token.start),
                });
            }
            pairs[open] = Some(i);
            pairs[i] = Some(open);
        }
    }
    if let Some(open) = stack.pop() {
        return Err(ScriptError::Unbalanced {
            delim: tokens[open].text.to_string(),
            at: Position::of(source, tokens[open].start),
        });
    }
    Ok(pairs)
}
