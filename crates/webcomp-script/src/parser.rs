//! Builds the statement-level tree from a token stream.

use crate::ast::*;
use crate::error::ScriptResult;
use crate::lexer::{is_keyword, match_brackets, tokenize, Token, TokenKind};

/// Parse a script into module items, classes, members and body statements.
pub fn parse_module(source: &str) -> ScriptResult<Module> {
    let tokens = tokenize(source)?;
    let pairs = match_brackets(source, &tokens)?;
    let builder = TreeBuilder {
        source,
        tokens,
        pairs,
    };
    Ok(builder.module())
}

/// A token range `[lo, hi)` holding one statement or member.
#[derive(Debug, Clone, Copy)]
struct Piece {
    lo: usize,
    hi: usize,
    blank_before: bool,
}

struct TreeBuilder<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pairs: Vec<Option<usize>>,
}

impl<'a> TreeBuilder<'a> {
    fn module(&self) -> Module {
        let items = self
            .split_statements(0, self.tokens.len())
            .into_iter()
            .map(|piece| {
                let is_class = matches!(self.lead_keyword(piece.lo, piece.hi), Some((_, "class")));
                match is_class.then(|| self.class_decl(piece)).flatten() {
                    Some(class) => ModuleItem::Class(class),
                    None => ModuleItem::Stmt(self.stmt(piece)),
                }
            })
            .collect();
        Module { items }
    }

    fn stmt(&self, piece: Piece) -> Stmt {
        Stmt {
            text: self.text(piece.lo, piece.hi).to_string(),
            blank_before: piece.blank_before,
        }
    }

    fn text(&self, lo: usize, hi: usize) -> &'a str {
        if lo >= hi {
            return "";
        }
        &self.source[self.tokens[lo].start..self.tokens[hi - 1].end()]
    }

    fn pair(&self, i: usize) -> usize {
        self.pairs[i].unwrap_or(i)
    }

    fn next_code(&self, from: usize, hi: usize) -> Option<usize> {
        (from..hi).find(|&i| !self.tokens[i].is_trivia())
    }

    fn prev_code(&self, before: usize) -> Option<usize> {
        (0..before).rev().find(|&i| !self.tokens[i].is_trivia())
    }

    /// Skip a decorator starting at `@`, returning the index after it.
    fn skip_decorator(&self, at: usize, hi: usize) -> usize {
        let mut i = at + 1;
        loop {
            let Some(name) = self.next_code(i, hi) else {
                return hi;
            };
            if self.tokens[name].kind != TokenKind::Ident {
                return name;
            }
            i = name + 1;
            match self.next_code(i, hi) {
                Some(dot) if self.tokens[dot].is_punct(".") => i = dot + 1,
                Some(open) if self.tokens[open].is_punct("(") => return self.pair(open) + 1,
                _ => return i,
            }
        }
    }

    /// The first keyword of a statement after `export`, `default`, `async`
    /// and decorators, with its index. A bare block reports `{`.
    fn lead_keyword(&self, lo: usize, hi: usize) -> Option<(usize, &'a str)> {
        let mut i = lo;
        while let Some(c) = self.next_code(i, hi) {
            let token = self.tokens[c];
            if token.is_punct("@") {
                i = self.skip_decorator(c, hi);
                continue;
            }
            if token.kind == TokenKind::Ident && matches!(token.text, "export" | "default" | "async") {
                i = c + 1;
                continue;
            }
            if token.is_punct("{") || token.kind == TokenKind::Ident {
                return Some((c, token.text));
            }
            return None;
        }
        None
    }

    fn split_statements(&self, lo: usize, hi: usize) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut blank = false;
        let mut i = lo;
        while i < hi {
            let token = self.tokens[i];
            if token.kind == TokenKind::Whitespace {
                blank |= token.newlines() >= 2;
                i += 1;
                continue;
            }
            let end = match self.guarded_statement(i, hi) {
                Some(next) => self.statement_end(next, hi),
                None => self.statement_end(i, hi),
            };
            let end = self.attach_trailing_comment(end, hi);
            pieces.push(Piece {
                lo: i,
                hi: end,
                blank_before: blank,
            });
            blank = false;
            i = end.max(i + 1);
        }
        pieces
    }

    /// For a `;` written in front of a line that would otherwise continue the
    /// previous one, as in `;[a, b].forEach(f)`, the start of the statement
    /// it guards.
    fn guarded_statement(&self, at: usize, hi: usize) -> Option<usize> {
        if !self.tokens[at].is_punct(";") {
            return None;
        }
        let next = self.next_code(at + 1, hi)?;
        let token = self.tokens[next];
        let hazard = match token.kind {
            TokenKind::Punct => matches!(token.text, "(" | "[" | "+" | "-" | "/"),
            TokenKind::Template | TokenKind::Regex => true,
            _ => false,
        };
        hazard.then_some(next)
    }

    /// Exclusive end of the statement starting at `start`.
    fn statement_end(&self, start: usize, hi: usize) -> usize {
        let lead = self.lead_keyword(start, hi);
        let block_like = matches!(
            lead,
            Some((_, "if" | "for" | "while" | "do" | "switch" | "try" | "function" | "class" | "with" | "{"))
        );
        let lead_at = lead.map(|(i, _)| i).unwrap_or(start);

        let mut last_code: Option<usize> = None;
        let mut j = start;
        while j < hi {
            let token = self.tokens[j];
            match token.kind {
                TokenKind::Whitespace => {
                    if token.has_newline() && j > lead_at {
                        if let (Some(last), Some(next)) = (last_code, self.next_code(j + 1, hi)) {
                            if self.asi_break(last, next) {
                                return j;
                            }
                        }
                    }
                    j += 1;
                }
                TokenKind::LineComment | TokenKind::BlockComment => j += 1,
                _ if token.is_punct(";") => return j + 1,
                _ if token.is_opener() => {
                    let close = self.pair(j);
                    if token.is_punct("{") && block_like && self.in_block_position(j, lead_at) {
                        let next = self.next_code(close + 1, hi).map(|n| self.tokens[n]);
                        let continues = next.is_some_and(|n| {
                            n.kind == TokenKind::Ident
                                && (matches!(n.text, "else" | "catch" | "finally")
                                    || (n.text == "while" && matches!(lead, Some((_, "do")))))
                        });
                        if !continues {
                            return close + 1;
                        }
                    }
                    last_code = Some(close);
                    j = close + 1;
                }
                _ => {
                    last_code = Some(j);
                    j += 1;
                }
            }
        }
        self.trim_end(start, hi)
    }

    /// Whether the `{` at `open` starts a statement body rather than an
    /// expression.
    fn in_block_position(&self, open: usize, lead_at: usize) -> bool {
        if open == lead_at {
            return true;
        }
        match self.prev_code(open).map(|p| self.tokens[p]) {
            Some(prev) if prev.is_punct(")") => true,
            Some(prev) if prev.kind == TokenKind::Ident => {
                matches!(prev.text, "else" | "try" | "finally" | "do") || !is_keyword(prev.text)
            }
            _ => false,
        }
    }

    fn trim_end(&self, lo: usize, mut hi: usize) -> usize {
        while hi > lo && self.tokens[hi - 1].kind == TokenKind::Whitespace {
            hi -= 1;
        }
        hi
    }

    /// Extend `end` over a comment on the same line.
    fn attach_trailing_comment(&self, end: usize, hi: usize) -> usize {
        let mut i = end;
        if i < hi && self.tokens[i].kind == TokenKind::Whitespace && !self.tokens[i].has_newline() {
            i += 1;
        }
        match self.tokens.get(i) {
            Some(t) if i < hi && t.is_comment() && !t.has_newline() => i + 1,
            _ => end,
        }
    }

    /// Whether a newline between `last` and `next` ends the statement.
    fn asi_break(&self, last: usize, next: usize) -> bool {
        let l = self.tokens[last];
        let n = self.tokens[next];
        if !can_end_statement(&l) {
            return false;
        }
        if l.is_punct(")") {
            let header = self.pairs[last]
                .and_then(|open| self.prev_code(open))
                .map(|p| self.tokens[p]);
            if header.is_some_and(|h| {
                h.kind == TokenKind::Ident && matches!(h.text, "if" | "for" | "while" | "with")
            }) {
                return false;
            }
        }
        !continues_expression(&n)
    }

    fn class_decl(&self, piece: Piece) -> Option<ClassDecl> {
        let first = self.next_code(piece.lo, piece.hi)?;
        let (class_at, _) = self.lead_keyword(piece.lo, piece.hi)?;

        let name = self
            .next_code(class_at + 1, piece.hi)
            .map(|i| self.tokens[i])
            .filter(|t| t.kind == TokenKind::Ident && !matches!(t.text, "extends" | "implements"))
            .map(|t| t.text.to_string());

        let mut extends_at = None;
        let mut implements_at = None;
        let mut body_open = None;
        let mut i = class_at + 1;
        while i < piece.hi {
            let token = self.tokens[i];
            if token.is_ident("extends") && extends_at.is_none() {
                extends_at = Some(i);
            } else if token.is_ident("implements") && implements_at.is_none() {
                implements_at = Some(i);
            } else if token.is_punct("{") {
                body_open = Some(i);
                break;
            } else if token.is_opener() {
                i = self.pair(i);
            }
            i += 1;
        }
        let body_open = body_open?;
        let body_close = self.pair(body_open);

        let extends = extends_at.map(|e| {
            let end = implements_at.filter(|&m| m > e).unwrap_or(body_open);
            self.text(e + 1, end).trim().to_string()
        });

        Some(ClassDecl {
            blank_before: piece.blank_before,
            leading: self.text(piece.lo, first).trim().to_string(),
            header: self.text(first, body_open).trim_end().to_string(),
            name,
            extends,
            members: self.members(body_open + 1, body_close),
            trailing: self.text(body_close + 1, piece.hi).trim().to_string(),
        })
    }

    fn members(&self, lo: usize, hi: usize) -> Vec<ClassMember> {
        let mut members = Vec::new();
        let mut blank = false;
        let mut i = lo;
        while i < hi {
            let token = self.tokens[i];
            if token.kind == TokenKind::Whitespace {
                blank |= token.newlines() >= 2;
                i += 1;
                continue;
            }
            if token.is_punct(";") {
                i += 1;
                continue;
            }
            let (kind, end) = self.member(i, hi);
            members.push(ClassMember {
                blank_before: blank,
                kind,
            });
            blank = false;
            i = end.max(i + 1);
        }
        members
    }

    fn member(&self, start: usize, hi: usize) -> (MemberKind, usize) {
        let mut last_code: Option<usize> = None;
        let mut saw_assign = false;
        let mut j = start;
        while j < hi {
            let token = self.tokens[j];
            match token.kind {
                TokenKind::Whitespace => {
                    if token.has_newline() {
                        if let (Some(last), Some(next)) = (last_code, self.next_code(j + 1, hi)) {
                            if self.asi_break(last, next) {
                                return (MemberKind::Other(self.text(start, j).to_string()), j);
                            }
                        }
                    }
                    j += 1;
                }
                TokenKind::LineComment | TokenKind::BlockComment => j += 1,
                _ if token.is_punct(";") => {
                    let end = self.attach_trailing_comment(j + 1, hi);
                    return (MemberKind::Other(self.text(start, end).to_string()), end);
                }
                _ if token.is_punct("@") => {
                    j = self.skip_decorator(j, hi);
                    last_code = None;
                }
                _ if token.is_punct("=") => {
                    saw_assign = true;
                    last_code = Some(j);
                    j += 1;
                }
                _ if token.is_punct("(") && !saw_assign => {
                    return self.method(start, j, hi);
                }
                _ if token.is_punct("{") && !saw_assign => {
                    let end = self.attach_trailing_comment(self.pair(j) + 1, hi);
                    return (MemberKind::Other(self.text(start, end).to_string()), end);
                }
                _ if token.is_opener() => {
                    last_code = Some(self.pair(j));
                    j = self.pair(j) + 1;
                }
                _ => {
                    last_code = Some(j);
                    j += 1;
                }
            }
        }
        let end = self.trim_end(start, hi);
        (MemberKind::Other(self.text(start, end).to_string()), end)
    }

    /// A member whose parameter list opens at `params_open`.
    fn method(&self, start: usize, params_open: usize, hi: usize) -> (MemberKind, usize) {
        let params_close = self.pair(params_open);
        let mut k = params_close + 1;
        let mut body_open = None;
        while k < hi {
            let token = self.tokens[k];
            if token.is_punct("{") {
                body_open = Some(k);
                break;
            }
            if token.is_punct(";") {
                let end = self.attach_trailing_comment(k + 1, hi);
                return (MemberKind::Other(self.text(start, end).to_string()), end);
            }
            if token.kind == TokenKind::Whitespace && token.has_newline() {
                let next = self.next_code(k + 1, hi).map(|n| self.tokens[n]);
                let continues = next.is_some_and(|n| n.is_punct("{") || continues_expression(&n));
                if !continues {
                    return (MemberKind::Other(self.text(start, k).to_string()), k);
                }
            }
            k = if token.is_opener() { self.pair(k) + 1 } else { k + 1 };
        }
        let Some(body_open) = body_open else {
            let end = self.trim_end(start, hi);
            return (MemberKind::Other(self.text(start, end).to_string()), end);
        };
        let body_close = self.pair(body_open);

        let (name, kind, is_static) = self.method_name(start, params_open);
        let method = Method {
            head: self.text(start, params_open).trim().to_string(),
            name,
            kind,
            is_static,
            params: self.text(params_open + 1, params_close).trim().to_string(),
            between: self.text(params_close + 1, body_open).trim().to_string(),
            body: Block {
                stmts: self
                    .split_statements(body_open + 1, body_close)
                    .into_iter()
                    .map(|p| self.stmt(p))
                    .collect(),
            },
        };
        let end = self.attach_trailing_comment(body_close + 1, hi);
        (MemberKind::Method(method), end)
    }

    fn method_name(&self, lo: usize, hi: usize) -> (String, MethodKind, bool) {
        let mut code = Vec::new();
        let mut i = lo;
        while let Some(c) = self.next_code(i, hi) {
            if self.tokens[c].is_punct("@") {
                i = self.skip_decorator(c, hi);
                continue;
            }
            code.push(c);
            i = if self.tokens[c].is_opener() { self.pair(c) + 1 } else { c + 1 };
        }

        let mut is_static = false;
        let mut accessor = None;
        let mut idx = 0;
        while idx < code.len() {
            let token = self.tokens[code[idx]];
            let has_more = idx + 1 < code.len() && !self.tokens[code[idx + 1]].is_punct("<");
            if token.kind == TokenKind::Ident && has_more && is_member_modifier(token.text) {
                match token.text {
                    "static" => is_static = true,
                    "get" => accessor = Some(MethodKind::Getter),
                    "set" => accessor = Some(MethodKind::Setter),
                    _ => {}
                }
                idx += 1;
                continue;
            }
            if token.is_punct("*") {
                idx += 1;
                continue;
            }
            break;
        }

        let name = match code.get(idx) {
            Some(&c) if self.tokens[c].is_punct("[") => self.text(c, self.pair(c) + 1).to_string(),
            Some(&c) => self.tokens[c].text.to_string(),
            None => String::new(),
        };
        let kind = match accessor {
            Some(kind) => kind,
            None if name == "constructor" && !is_static => MethodKind::Constructor,
            None => MethodKind::Method,
        };
        (name, kind, is_static)
    }
}

fn is_member_modifier(word: &str) -> bool {
    matches!(
        word,
        "static"
            | "async"
            | "get"
            | "set"
            | "public"
            | "private"
            | "protected"
            | "readonly"
            | "override"
            | "abstract"
            | "declare"
            | "accessor"
    )
}

/// Whether a statement may end after `token`.
pub(crate) fn can_end_statement(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Ident => !matches!(
            token.text,
            "else"
                | "do"
                | "in"
                | "of"
                | "instanceof"
                | "typeof"
                | "new"
                | "delete"
                | "void"
                | "await"
                | "extends"
                | "implements"
                | "case"
                | "export"
                | "import"
                | "const"
                | "let"
                | "var"
                | "class"
                | "function"
        ),
        TokenKind::Number | TokenKind::String | TokenKind::Template | TokenKind::Regex => true,
        TokenKind::Punct => matches!(token.text, ")" | "]" | "}" | "++" | "--"),
        _ => false,
    }
}

/// Whether a line starting with `token` continues the previous expression.
pub(crate) fn continues_expression(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Punct => !matches!(token.text, "++" | "--" | "!" | "~" | "{" | "@" | ";" | "..."),
        TokenKind::Ident => matches!(
            token.text,
            "else" | "catch" | "finally" | "instanceof" | "in" | "of" | "as" | "satisfies" | "extends" | "implements"
        ),
        TokenKind::Template => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(source: &str) -> ClassDecl {
        let module = parse_module(source).unwrap();
        module.first_extending_class().cloned().unwrap()
    }

    #[test]
    fn test_split_top_level_statements() {
        let module = parse_module("import a from 'a';\nconst b = 1\n\nlet c = {\n  d: 2\n}\nfoo()").unwrap();
        let texts: Vec<&str> = module
            .items
            .iter()
            .map(|i| match i {
                ModuleItem::Stmt(s) => s.text.as_str(),
                ModuleItem::Class(_) => "<class>",
            })
            .collect();
        assert_eq!(
            texts,
            vec!["import a from 'a';", "const b = 1", "let c = {\n  d: 2\n}", "foo()"]
        );
        assert!(module.items[2].blank_before());
    }

    #[test]
    fn test_leading_semicolon_joins_guarded_statement() {
        let module = parse_module("this.a = 1\n;[1, 2].forEach(f)\n;(function () {})()\n;\nlet b").unwrap();
        let texts: Vec<&str> = module
            .items
            .iter()
            .map(|i| match i {
                ModuleItem::Stmt(s) => s.text.as_str(),
                ModuleItem::Class(_) => "<class>",
            })
            .collect();
        assert_eq!(
            texts,
            vec!["this.a = 1", ";[1, 2].forEach(f)", ";(function () {})()", ";", "let b"]
        );
    }

    #[test]
    fn test_block_statements_end_at_brace() {
        let module = parse_module("if (a) {\n  b();\n} else {\n  c();\n}\nd();").unwrap();
        assert_eq!(module.items.len(), 2);
    }

    #[test]
    fn test_if_header_does_not_end_statement() {
        let module = parse_module("if (a)\n  b();\nc();").unwrap();
        assert_eq!(module.items.len(), 2);
    }

    #[test]
    fn test_class_members() {
        let class = class_of(
            "export class Counter extends HTMLElement {\n  count = 0;\n  static tag = 'x'\n\n  constructor() {\n    super();\n  }\n\n  get value() { return this.count; }\n  handle = () => {\n    this.count++;\n  }\n  render(d) {}\n}",
        );
        assert_eq!(class.name.as_deref(), Some("Counter"));
        assert_eq!(class.extends.as_deref(), Some("HTMLElement"));
        assert_eq!(class.header, "export class Counter extends HTMLElement");
        assert_eq!(class.members.len(), 6);
        assert_eq!(class.constructor_index(), Some(2));
        assert_eq!(class.find_method("render"), Some(5));
        assert_eq!(class.find_method("value"), None);
        assert!(class.members[2].blank_before);
        assert!(matches!(&class.members[4].kind, MemberKind::Other(t) if t.starts_with("handle = ")));
    }

    #[test]
    fn test_method_parts() {
        let class = class_of("class A extends B {\n  @bound\n  static async load(a, { b }) {\n    await a;\n  }\n}");
        let MemberKind::Method(method) = &class.members[0].kind else {
            panic!("expected a method");
        };
        assert_eq!(method.name, "load");
        assert!(method.is_static);
        assert_eq!(method.head, "@bound\n  static async load");
        assert_eq!(method.params, "a, { b }");
        assert_eq!(method.body.stmts.len(), 1);
    }

    #[test]
    fn test_trailing_comment_stays_with_statement() {
        let class = class_of("class A extends B {\n  constructor() {\n    super(); // first\n    this.x = 1;\n  }\n}");
        let MemberKind::Method(ctor) = &class.members[0].kind else {
            panic!("expected a method");
        };
        assert_eq!(ctor.body.stmts[0].text, "super(); // first");
        assert_eq!(ctor.body.position_of_call("super"), Some(0));
    }

    #[test]
    fn test_no_extending_class() {
        let module = parse_module("const A = class extends B {};\nclass C {}").unwrap();
        assert!(module.first_extending_class().is_none());
    }
}
