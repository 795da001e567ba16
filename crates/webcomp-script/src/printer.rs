//! Canonical printer for the statement-level tree.
//!
//! Layout is decided per line from bracket nesting alone, so printing the
//! output of a previous print yields the same text. Template literals and
//! strings are emitted byte for byte.

use crate::ast::*;
use crate::lexer::{tokenize, Token, TokenKind};

const INDENT: &str = "  ";

fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

/// Print a module. The result has no trailing newline.
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    for (i, item) in module.items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            if item.blank_before() {
                out.push('\n');
            }
        }
        match item {
            ModuleItem::Stmt(stmt) => out.push_str(&reindent(&stmt.text, 0)),
            ModuleItem::Class(class) => print_class(&mut out, class),
        }
    }
    out
}

fn print_class(out: &mut String, class: &ClassDecl) {
    if !class.leading.is_empty() {
        out.push_str(&reindent(&class.leading, 0));
        out.push('\n');
    }
    out.push_str(&reindent(&class.header, 0));
    if class.members.is_empty() {
        out.push_str(" {}");
    } else {
        out.push_str(" {\n");
        for (i, member) in class.members.iter().enumerate() {
            if i > 0 && member.blank_before {
                out.push('\n');
            }
            match &member.kind {
                MemberKind::Method(method) => print_method(out, method, 1),
                MemberKind::Other(text) => out.push_str(&reindent(text, 1)),
            }
            out.push('\n');
        }
        out.push('}');
    }
    if !class.trailing.is_empty() {
        if !class.trailing.starts_with(';') {
            out.push(' ');
        }
        out.push_str(&class.trailing);
    }
}

fn print_method(out: &mut String, method: &Method, level: usize) {
    let mut head = format!("{}({})", method.head, method.params);
    if !method.between.is_empty() {
        if !method.between.starts_with(':') {
            head.push(' ');
        }
        head.push_str(&method.between);
    }
    out.push_str(&reindent(&head, level));
    print_block(out, &method.body, level);
}

fn print_block(out: &mut String, block: &Block, level: usize) {
    if block.stmts.is_empty() {
        out.push_str(" {}");
        return;
    }
    out.push_str(" {\n");
    for (i, stmt) in block.stmts.iter().enumerate() {
        if i > 0 && stmt.blank_before {
            out.push('\n');
        }
        out.push_str(&reindent(&stmt.text, level + 1));
        out.push('\n');
    }
    out.push_str(&indent(level));
    out.push('}');
}

/// Re-indent `text` so its first line sits at `level`.
///
/// Continuation lines are indented one level per open bracket, lines that
/// start with closing brackets line up with the line that opened them, and
/// runs of blank lines collapse to one.
pub fn reindent(text: &str, level: usize) -> String {
    let Ok(tokens) = tokenize(text) else {
        return format!("{}{}", indent(level), text.trim());
    };

    let mut printer = LinePrinter {
        out: String::new(),
        stack: Vec::new(),
        base: level,
        first: true,
        pending_blank: false,
    };
    let mut line: Vec<Token<'_>> = Vec::new();
    for token in tokens {
        if token.kind == TokenKind::Whitespace {
            if token.has_newline() {
                if !line.is_empty() {
                    printer.emit(&line);
                    line.clear();
                }
                if token.newlines() >= 2 && !printer.first {
                    printer.pending_blank = true;
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
        }
        line.push(token);
    }
    if !line.is_empty() {
        printer.emit(&line);
    }
    printer.out
}

struct LinePrinter {
    out: String,
    /// Indent level of the line that opened each unclosed bracket.
    stack: Vec<usize>,
    base: usize,
    first: bool,
    pending_blank: bool,
}

impl LinePrinter {
    fn emit(&mut self, line: &[Token<'_>]) {
        let mut line = line;
        while let Some((last, rest)) = line.split_last() {
            if last.kind != TokenKind::Whitespace {
                break;
            }
            line = rest;
        }
        if line.is_empty() {
            return;
        }

        if !self.first {
            self.out.push('\n');
            if self.pending_blank {
                self.out.push('\n');
            }
        }
        self.first = false;
        self.pending_blank = false;

        let mut idx = 0;
        let mut closed_level = None;
        while idx < line.len() && line[idx].is_closer() {
            if let Some(level) = self.stack.pop() {
                closed_level = Some(level);
            }
            idx += 1;
        }
        let level = match closed_level {
            Some(level) => level,
            None => {
                let inner = self.stack.last().map(|l| l + 1).unwrap_or(self.base);
                let continuation = idx == 0
                    && line[0].kind == TokenKind::Punct
                    && matches!(line[0].text, "." | "?." | "?" | ":" | "&&" | "||" | "??");
                inner + usize::from(continuation)
            }
        };

        let prefix = indent(level);
        self.out.push_str(&prefix);
        for token in &line[..idx] {
            self.out.push_str(token.text);
        }
        for token in &line[idx..] {
            if token.is_opener() {
                self.stack.push(level);
            } else if token.is_closer() {
                self.stack.pop();
            }
            if token.kind == TokenKind::BlockComment && token.has_newline() {
                push_block_comment(&mut self.out, token.text, &prefix);
            } else {
                self.out.push_str(token.text);
            }
        }
    }
}

/// Align the `*` lines of a multi-line block comment under its opening.
fn push_block_comment(out: &mut String, text: &str, prefix: &str) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(first.trim_end());
    }
    for line in lines {
        out.push('\n');
        let trimmed = line.trim_start();
        if trimmed.starts_with('*') {
            out.push_str(prefix);
            out.push(' ');
            out.push_str(trimmed.trim_end());
        } else {
            out.push_str(line);
        }
    }
}
