//! TypeScript type erasure.
//!
//! Types are removed token by token: annotations, declarations without a
//! runtime form, accessibility modifiers, generic parameter lists and type
//! assertions, including those inside template substitutions. Enums are
//! lowered to the usual `var` plus initializer function, and constructor
//! parameter properties become assignments in the constructor body.
//! Namespaces are rejected. The input is checked as TypeScript and the
//! output as JavaScript, so a gap in the eraser surfaces as an error instead
//! of as broken output.

use crate::error::{Position, ScriptError, ScriptResult};
use crate::lexer::{is_keyword, match_brackets, template_substitutions, tokenize, Token, TokenKind};
use crate::parser::{can_end_statement, continues_expression};
use crate::validate;

/// Erase TypeScript syntax from `source`, producing plain JavaScript.
pub fn strip_types(source: &str) -> ScriptResult<String> {
    validate::check_typescript(source)?;
    let tokens = tokenize(source)?;
    let pairs = match_brackets(source, &tokens)?;

    let mut eraser = Eraser::new(source, &tokens, &pairs);
    let len = eraser.sig.len();
    eraser.scan(0, len, Frame::Block)?;
    let output = eraser.finish();
    tracing::debug!(edits = eraser.edits.len(), "erased TypeScript syntax");

    validate::check_javascript(&output)?;
    Ok(output)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Module top level or a function body.
    Block,
    ClassBody,
    Object,
    Paren,
    Bracket,
    /// The braces of an import or export clause.
    Specifiers,
}

#[derive(Debug, Default)]
struct State {
    /// The previous significant token in this frame.
    prev: Option<usize>,
    /// Unmatched `?` of conditional expressions.
    ternary: usize,
    /// Inside a `let`/`const`/`var` declaration: `Some(true)` while the
    /// binding name is being read, `Some(false)` in its initializer.
    binding: Option<bool>,
    case_label: bool,
    /// Whether the last `:` separated a property or branch from its value.
    colon_value: bool,
    stmt_first: Option<usize>,
}

/// Replace `start..end` of the source with `text`.
#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

struct Eraser<'s, 't> {
    source: &'s str,
    tokens: &'t [Token<'s>],
    /// Indices of the non-trivia tokens.
    sig: Vec<usize>,
    sig_pair: Vec<Option<usize>>,
    edits: Vec<Edit>,
}

fn is_ts_modifier(word: &str) -> bool {
    matches!(word, "public" | "private" | "protected" | "readonly" | "override")
}

fn is_member_modifier(word: &str) -> bool {
    is_ts_modifier(word)
        || matches!(
            word,
            "static" | "async" | "get" | "set" | "abstract" | "declare" | "accessor"
        )
}

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
            | "default"
    )
}

impl<'s, 't> Eraser<'s, 't> {
    fn new(source: &'s str, tokens: &'t [Token<'s>], pairs: &[Option<usize>]) -> Self {
        let sig: Vec<usize> = (0..tokens.len()).filter(|&i| !tokens[i].is_trivia()).collect();
        let mut sig_of = vec![None; tokens.len()];
        for (j, &i) in sig.iter().enumerate() {
            sig_of[i] = Some(j);
        }
        let sig_pair = sig.iter().map(|&i| pairs[i].and_then(|p| sig_of[p])).collect();
        Self {
            source,
            tokens,
            sig,
            sig_pair,
            edits: Vec::new(),
        }
    }

    fn get(&self, j: usize) -> Option<Token<'s>> {
        self.sig.get(j).map(|&i| self.tokens[i])
    }

    fn tok(&self, j: usize) -> Token<'s> {
        self.tokens[self.sig[j]]
    }

    fn is(&self, j: usize, s: &str) -> bool {
        self.get(j)
            .is_some_and(|t| matches!(t.kind, TokenKind::Ident | TokenKind::Punct) && t.text == s)
    }

    fn is_any(&self, j: usize, words: &[&str]) -> bool {
        words.iter().any(|w| self.is(j, w))
    }

    fn is_ident(&self, j: usize) -> bool {
        self.get(j).is_some_and(|t| t.kind == TokenKind::Ident)
    }

    fn pair(&self, j: usize) -> usize {
        self.sig_pair[j].unwrap_or(j)
    }

    fn newline_before(&self, j: usize) -> bool {
        if j == 0 || j >= self.sig.len() {
            return false;
        }
        self.tokens[self.sig[j - 1] + 1..self.sig[j]]
            .iter()
            .any(|t| t.has_newline() || t.kind == TokenKind::LineComment)
    }

    fn unsupported(&self, j: usize, construct: &str) -> ScriptError {
        let offset = self.get(j).map(|t| t.start).unwrap_or(self.source.len());
        ScriptError::Unsupported {
            construct: construct.to_string(),
            at: Position::of(self.source, offset),
        }
    }

    fn remove_bytes(&mut self, start: usize, end: usize) {
        if start < end {
            self.edits.push(Edit {
                start,
                end,
                text: String::new(),
            });
        }
    }

    /// Remove the tokens `[from, to)`.
    fn remove_tokens(&mut self, from: usize, to: usize) {
        if from < to {
            self.remove_bytes(self.tok(from).start, self.tok(to - 1).end());
        }
    }

    /// Remove the tokens `[from, to)` together with the spaces before them
    /// on the same line.
    fn remove_inline(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let start = if from > 0 && !self.newline_before(from) {
            self.tok(from - 1).end()
        } else {
            self.tok(from).start
        };
        self.remove_bytes(start, self.tok(to - 1).end());
    }

    /// Apply the edits. An edit overlapping an earlier one only replaces
    /// what is left of its range.
    fn finish(&self) -> String {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|e| (e.start, e.end));
        let mut out = String::with_capacity(self.source.len());
        let mut pos = 0;
        for edit in edits {
            let start = edit.start.max(pos);
            out.push_str(&self.source[pos..start]);
            out.push_str(&edit.text);
            pos = edit.end.max(start);
        }
        out.push_str(&self.source[pos..]);
        out
    }

    /// Leading whitespace of the line containing `offset`.
    fn indent_at(&self, offset: usize) -> &'s str {
        let source = self.source;
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line = &source[line_start..offset];
        &line[..line.len() - line.trim_start().len()]
    }

    fn starts_statement(&self, j: usize, prev: Option<usize>) -> bool {
        let Some(p) = prev else {
            return true;
        };
        if self.is_any(p, &[";", "}"]) {
            return true;
        }
        self.newline_before(j)
            && can_end_statement(&self.tok(p))
            && !continues_expression(&self.tok(j))
    }

    fn is_expression_end(&self, j: usize) -> bool {
        let t = self.tok(j);
        match t.kind {
            TokenKind::Ident => !is_keyword(t.text),
            TokenKind::Number | TokenKind::String | TokenKind::Template | TokenKind::Regex => true,
            TokenKind::Punct => matches!(t.text, ")" | "]" | "}"),
            _ => false,
        }
    }

    fn type_starts(&self, j: usize) -> bool {
        self.get(j).is_some_and(|t| match t.kind {
            TokenKind::Ident => !matches!(t.text, "in" | "of" | "instanceof"),
            TokenKind::Punct => matches!(t.text, "(" | "[" | "{" | "<" | "-" | "|" | "&"),
            TokenKind::String | TokenKind::Number | TokenKind::Template => true,
            _ => false,
        })
    }

    fn member_name_like(&self, j: usize) -> bool {
        self.get(j).is_some_and(|t| match t.kind {
            TokenKind::Ident | TokenKind::String | TokenKind::Number => true,
            TokenKind::Punct => matches!(t.text, "[" | "*"),
            _ => false,
        })
    }

    fn after_dot(&self, prev: Option<usize>) -> bool {
        prev.is_some_and(|p| self.is_any(p, &[".", "?."]))
    }

    fn type_args_allowed(&self, prev: Option<usize>) -> bool {
        let Some(p) = prev else {
            return true;
        };
        let t = self.tok(p);
        match t.kind {
            TokenKind::Ident => !is_keyword(t.text) || matches!(t.text, "return" | "yield" | "await"),
            TokenKind::Punct => matches!(
                t.text,
                "=" | "(" | "," | ":" | "=>" | "?" | "&&" | "||" | "??" | "["
            ),
            _ => false,
        }
    }

    /// Walk the significant tokens `[lo, hi)` that make up one frame.
    fn scan(&mut self, lo: usize, hi: usize, frame: Frame) -> ScriptResult<()> {
        let mut st = State::default();
        let mut j = lo;
        while j < hi {
            if matches!(frame, Frame::Block | Frame::ClassBody) && self.starts_statement(j, st.prev) {
                st.ternary = 0;
                st.binding = None;
                st.case_label = false;
                st.stmt_first = Some(j);
                if frame == Frame::Block {
                    if let Some(next) = self.declaration(j, hi)? {
                        j = next;
                        continue;
                    }
                    st.case_label = self.is_any(j, &["case", "default"]);
                } else {
                    if let Some(next) = self.member_declaration(j, hi)? {
                        j = next;
                        continue;
                    }
                    let next = self.strip_member_modifiers(j, hi);
                    if next != j {
                        j = next;
                        continue;
                    }
                    if self.is(j, "constructor") && self.is(j + 1, "(") {
                        self.parameter_properties(j + 1, hi);
                    }
                }
            }

            let token = self.tok(j);

            if token.is_ident("class") && !self.after_dot(st.prev) && !self.is_any(j + 1, &[":", "(", "="]) {
                j = self.class_header(j, hi)?;
                st.prev = Some(j - 1);
                continue;
            }

            if frame == Frame::Specifiers && token.is_ident("type") && self.is_ident(j + 1) && !self.is(j + 1, "as") {
                let mut end = j + 2;
                if self.is(end, "as") {
                    end += 2;
                }
                if end < hi && self.is(end, ",") {
                    if end + 1 < hi {
                        self.remove_bytes(token.start, self.tok(end + 1).start);
                    } else {
                        self.remove_tokens(j, end + 1);
                    }
                    j = end + 1;
                } else if let Some(p) = st.prev.filter(|&p| self.is(p, ",")) {
                    self.remove_bytes(self.tok(p).start, self.tok(end - 1).end());
                    j = end;
                } else {
                    self.remove_tokens(j, end);
                    j = end;
                }
                continue;
            }

            match token.kind {
                TokenKind::Ident => match token.text {
                    "var" | "let" | "const"
                        if matches!(frame, Frame::Block | Frame::Paren) && !self.after_dot(st.prev) =>
                    {
                        st.binding = Some(true);
                    }
                    "as" | "satisfies" if self.is_assertion(j, hi, frame, st.prev) => {
                        let end = self.parse_type(j + 1, hi)?;
                        self.remove_inline(j, end);
                        j = end;
                        continue;
                    }
                    "this" if frame == Frame::Paren && st.prev.is_none() && self.is(j + 1, ":") => {
                        let end = self.parse_type(j + 2, hi)?;
                        if end + 1 < hi && self.is(end, ",") {
                            self.remove_bytes(token.start, self.tok(end + 1).start);
                            j = end + 1;
                        } else {
                            self.remove_tokens(j, end);
                            j = end;
                        }
                        continue;
                    }
                    word if frame == Frame::Paren
                        && is_ts_modifier(word)
                        && st.prev.map_or(true, |p| self.is(p, ","))
                        && self.get(j + 1).is_some_and(|t| {
                            t.kind == TokenKind::Ident || t.is_punct("{") || t.is_punct("[")
                        }) =>
                    {
                        self.remove_bytes(token.start, self.tok(j + 1).start);
                        j += 1;
                        continue;
                    }
                    _ => {}
                },
                TokenKind::Punct => match token.text {
                    "?" => {
                        let optional = self.is_any(j + 1, &[":", ",", ")", ";"])
                            || (frame == Frame::ClassBody
                                && (self.is(j + 1, "(") || j + 1 >= hi || self.newline_before(j + 1)));
                        if optional {
                            self.remove_bytes(token.start, token.end());
                            j += 1;
                            continue;
                        }
                        st.ternary += 1;
                    }
                    ":" => {
                        if st.ternary > 0 {
                            st.ternary -= 1;
                            st.colon_value = true;
                        } else if st.case_label {
                            st.case_label = false;
                            st.colon_value = false;
                        } else {
                            let after_paren = st.prev.is_some_and(|p| self.is(p, ")"));
                            let annotation = match frame {
                                Frame::Paren | Frame::ClassBody => true,
                                Frame::Object => after_paren,
                                Frame::Block => after_paren || st.binding == Some(true),
                                Frame::Bracket | Frame::Specifiers => false,
                            };
                            if annotation {
                                let end = self.parse_type(j + 1, hi)?;
                                self.remove_inline(j, end);
                                j = end;
                                continue;
                            }
                            st.colon_value = frame == Frame::Object;
                        }
                    }
                    "=" => {
                        if st.binding.is_some() {
                            st.binding = Some(false);
                        }
                    }
                    "," => {
                        if st.binding.is_some() {
                            st.binding = Some(true);
                        }
                    }
                    ";" => {
                        st.binding = None;
                        st.ternary = 0;
                    }
                    "!" => {
                        let non_null = st.prev.is_some_and(|p| {
                            self.tok(p).end() == token.start && self.is_expression_end(p)
                        });
                        if non_null {
                            self.remove_bytes(token.start, token.end());
                            j += 1;
                            continue;
                        }
                    }
                    "<" => {
                        // `<T>value` where no operand precedes, type arguments otherwise.
                        let assertion = st
                            .prev
                            .map_or(true, |p| !self.is_expression_end(p) && !self.is_any(p, &["++", "--"]));
                        if let Some(close) = (assertion || self.type_args_allowed(st.prev))
                            .then(|| self.angle_end(j, hi))
                            .flatten()
                            .filter(|&close| close + 1 < hi)
                        {
                            if assertion {
                                self.remove_bytes(token.start, self.tok(close + 1).start);
                                j = close + 1;
                                continue;
                            }
                            if self.is(close + 1, "(") {
                                self.remove_bytes(token.start, self.tok(close).end());
                                j = close + 1;
                                continue;
                            }
                        }
                    }
                    "(" | "[" | "{" => {
                        let close = self.pair(j);
                        let child = match token.text {
                            "(" => Frame::Paren,
                            "[" => Frame::Bracket,
                            _ => self.brace_frame(&st),
                        };
                        self.scan(j + 1, close, child)?;
                        st.prev = Some(close);
                        j = close + 1;
                        continue;
                    }
                    _ => {}
                },
                TokenKind::Template if token.text.contains("${") => self.erase_substitutions(token)?,
                _ => {}
            }

            st.prev = Some(j);
            j += 1;
        }
        Ok(())
    }

    fn is_assertion(&self, j: usize, hi: usize, frame: Frame, prev: Option<usize>) -> bool {
        frame != Frame::Specifiers
            && prev.is_some_and(|p| self.is_expression_end(p) && !self.is(p, "*"))
            && !self.newline_before(j)
            && j + 1 < hi
            && self.type_starts(j + 1)
    }

    fn brace_frame(&self, st: &State) -> Frame {
        let Some(p) = st.prev else {
            return Frame::Block;
        };
        let prev = self.tok(p);
        let in_module_clause = st.stmt_first.is_some_and(|f| self.is_any(f, &["import", "export"]));
        if in_module_clause && (self.is_any(p, &["import", "export", "type"]) || prev.is_punct(",")) {
            return Frame::Specifiers;
        }
        match prev.kind {
            TokenKind::Punct => match prev.text {
                ")" | ";" | "}" | "=>" | "{" => Frame::Block,
                ":" if !st.colon_value => Frame::Block,
                _ => Frame::Object,
            },
            TokenKind::Ident if keyword_starts_value(prev.text) => Frame::Object,
            _ => Frame::Block,
        }
    }

    /// Remove a statement that exists only at the type level. Returns where
    /// scanning resumes.
    fn declaration(&mut self, j: usize, hi: usize) -> ScriptResult<Option<usize>> {
        let first = j;
        let exported = self.is(j, "export");
        let k = if exported { j + 1 } else { j };
        if k >= hi {
            return Ok(None);
        }

        if exported && self.is(k, "=") {
            return Err(self.unsupported(k, "export ="));
        }
        if self.is(k, "import") && !exported {
            if self.is(k + 1, "type") && !self.is_any(k + 2, &["from", ",", "="]) {
                let end = self.statement_end(k, hi);
                self.remove_tokens(first, end);
                return Ok(Some(end));
            }
            if self.is_ident(k + 1) && self.is(k + 2, "=") {
                return Err(self.unsupported(k, "import ="));
            }
            return Ok(None);
        }
        if exported && self.is(k, "type") && self.is_any(k + 1, &["{", "*"]) {
            let end = self.statement_end(k, hi);
            self.remove_tokens(first, end);
            return Ok(Some(end));
        }
        if self.is(k, "declare") && self.is_ident(k + 1) && !self.newline_before(k + 1) {
            let end = self.declare_end(k + 1, hi);
            self.remove_tokens(first, end);
            return Ok(Some(end));
        }
        if self.is(k, "interface") && self.is_ident(k + 1) && !self.newline_before(k + 1) {
            let body = self
                .find_body(k + 2, hi)
                .ok_or_else(|| self.unsupported(k, "interface"))?;
            let end = self.pair(body) + 1;
            self.remove_tokens(first, end);
            return Ok(Some(end));
        }
        if self.is(k, "type") && self.is_ident(k + 1) && self.is_any(k + 2, &["=", "<"]) {
            let mut m = k + 2;
            if self.is(m, "<") {
                m = self
                    .angle_end(m, hi)
                    .ok_or_else(|| self.unsupported(m, "type parameters"))?
                    + 1;
            }
            if !self.is(m, "=") {
                return Err(self.unsupported(k, "type alias"));
            }
            let mut end = self.parse_type(m + 1, hi)?;
            if end < hi && self.is(end, ";") {
                end += 1;
            }
            self.remove_tokens(first, end);
            return Ok(Some(end));
        }
        if (self.is(k, "enum") && self.is_ident(k + 1))
            || (self.is(k, "const") && self.is(k + 1, "enum"))
        {
            return self.lower_enum(first, k, hi).map(Some);
        }
        if self.is_any(k, &["namespace", "module"])
            && self
                .get(k + 1)
                .is_some_and(|t| matches!(t.kind, TokenKind::Ident | TokenKind::String))
            && !self.newline_before(k + 1)
        {
            return Err(self.unsupported(k, "namespace"));
        }
        if self.is(k, "abstract") && self.is(k + 1, "class") {
            self.remove_bytes(self.tok(k).start, self.tok(k + 1).start);
            return Ok(Some(k + 1));
        }

        // Overload signatures have no body.
        let mut m = k;
        if exported && self.is(m, "default") {
            m += 1;
        }
        if self.is(m, "async") {
            m += 1;
        }
        if self.is(m, "function") {
            m += 1;
            if self.is(m, "*") {
                m += 1;
            }
            if self.is_ident(m) {
                m += 1;
            }
            if self.is(m, "<") {
                match self.angle_end(m, hi) {
                    Some(close) => m = close + 1,
                    None => return Ok(None),
                }
            }
            if m < hi && self.is(m, "(") {
                let mut after = self.pair(m) + 1;
                if after < hi && self.is(after, ":") {
                    after = self.parse_type(after + 1, hi)?;
                }
                let has_body = after < hi && self.is(after, "{");
                if !has_body {
                    let end = if after < hi && self.is(after, ";") {
                        after + 1
                    } else {
                        after
                    };
                    self.remove_tokens(first, end);
                    return Ok(Some(end));
                }
            }
        }
        Ok(None)
    }

    /// Remove a class member that exists only at the type level.
    fn member_declaration(&mut self, j: usize, hi: usize) -> ScriptResult<Option<usize>> {
        if self.is(j, "[") && self.is_ident(j + 1) && self.is(j + 2, ":") {
            let mut end = self.pair(j) + 1;
            if end < hi && self.is(end, ":") {
                end = self.parse_type(end + 1, hi)?;
            }
            if end < hi && self.is(end, ";") {
                end += 1;
            }
            self.remove_tokens(j, end);
            return Ok(Some(end));
        }

        let mut m = j;
        let mut no_emit = false;
        while m + 1 < hi
            && self
                .get(m)
                .is_some_and(|t| t.kind == TokenKind::Ident && is_member_modifier(t.text))
            && self.member_name_like(m + 1)
        {
            no_emit |= self.is_any(m, &["declare", "abstract"]);
            m += 1;
        }
        if self.is(m, "*") {
            m += 1;
        }
        let mut n = if self.is(m, "[") {
            self.pair(m) + 1
        } else if self.member_name_like(m) {
            m + 1
        } else {
            return Ok(None);
        };
        if n < hi && self.is_any(n, &["?", "!"]) {
            n += 1;
        }
        if n < hi && self.is(n, "<") {
            match self.angle_end(n, hi) {
                Some(close) => n = close + 1,
                None => return Ok(None),
            }
        }
        if n < hi && self.is(n, "(") {
            let mut after = self.pair(n) + 1;
            if after < hi && self.is(after, ":") {
                after = self.parse_type(after + 1, hi)?;
            }
            let has_body = after < hi && self.is(after, "{");
            if !has_body {
                let end = if after < hi && self.is(after, ";") {
                    after + 1
                } else {
                    after
                };
                self.remove_tokens(j, end);
                return Ok(Some(end));
            }
            return Ok(None);
        }
        if no_emit {
            let end = self.statement_end(n.min(hi), hi);
            self.remove_tokens(j, end);
            return Ok(Some(end));
        }
        Ok(None)
    }

    /// Remove accessibility and `readonly`/`override` modifiers at the start
    /// of a member. Returns the index of the first token left to scan.
    fn strip_member_modifiers(&mut self, j: usize, hi: usize) -> usize {
        let mut m = j;
        while m + 1 < hi && self.member_name_like(m + 1) {
            let t = self.tok(m);
            if t.kind != TokenKind::Ident {
                break;
            }
            if is_ts_modifier(t.text) {
                self.remove_bytes(t.start, self.tok(m + 1).start);
                m += 1;
            } else if matches!(t.text, "static" | "async" | "accessor" | "get" | "set") {
                m += 1;
            } else {
                break;
            }
        }
        m
    }

    /// Erase types inside the `${}` expressions of a template literal.
    fn erase_substitutions(&mut self, token: Token<'s>) -> ScriptResult<()> {
        for range in template_substitutions(token.text)? {
            let expr = &token.text[range.clone()];
            let erased = erase_expression(expr)?;
            if erased != expr {
                self.edits.push(Edit {
                    start: token.start + range.start,
                    end: token.start + range.end,
                    text: erased,
                });
            }
        }
        Ok(())
    }

    /// Assign the parameter properties of the constructor whose parameter
    /// list opens at `open`. The assignments go after a top-level `super()`
    /// call, or at the start of the body without one. The modifiers
    /// themselves are removed when the parameter list is scanned.
    fn parameter_properties(&mut self, open: usize, hi: usize) {
        let close = self.pair(open);
        let mut names = Vec::new();
        let mut at_param = true;
        let mut m = open + 1;
        while m < close {
            if at_param {
                let mut k = m;
                while k + 1 < close
                    && self
                        .get(k)
                        .is_some_and(|t| t.kind == TokenKind::Ident && is_ts_modifier(t.text))
                    && self.is_ident(k + 1)
                {
                    k += 1;
                }
                if k > m {
                    names.push(self.tok(k).text);
                }
            }
            at_param = self.is(m, ",");
            m = if self.tok(m).is_opener() { self.pair(m) + 1 } else { m + 1 };
        }

        let body = close + 1;
        if names.is_empty() || body >= hi || !self.is(body, "{") {
            return;
        }
        let body_close = self.pair(body);
        let (anchor, indent) = match self.super_call_end(body + 1, body_close) {
            Some((call, end)) => (self.tok(end - 1).end(), self.indent_at(self.tok(call).start).to_string()),
            None if body + 1 < body_close && self.newline_before(body + 1) => {
                (self.tok(body).end(), self.indent_at(self.tok(body + 1).start).to_string())
            }
            None => (self.tok(body).end(), format!("{}  ", self.indent_at(self.tok(body).start))),
        };
        let mut text: String = names
            .iter()
            .map(|name| format!("\n{indent}this.{name} = {name};"))
            .collect();
        if body + 1 == body_close && !self.newline_before(body_close) {
            text.push('\n');
            text.push_str(self.indent_at(self.tok(body).start));
        }
        self.edits.push(Edit {
            start: anchor,
            end: anchor,
            text,
        });
    }

    /// The first top-level `super(...)` statement in `[lo, hi)`, as its first
    /// token and the index after it.
    fn super_call_end(&self, lo: usize, hi: usize) -> Option<(usize, usize)> {
        let mut m = lo;
        while m < hi {
            if self.is(m, "super")
                && self.is(m + 1, "(")
                && (m == lo || self.is_any(m - 1, &[";", "}"]) || self.newline_before(m))
            {
                return Some((m, self.statement_end(m, hi)));
            }
            m = if self.tok(m).is_opener() { self.pair(m) + 1 } else { m + 1 };
        }
        None
    }

    /// Replace `[export] [const] enum Name { ... }` with a `var` and the
    /// function that fills it in. Returns the index after the body.
    fn lower_enum(&mut self, first: usize, k: usize, hi: usize) -> ScriptResult<usize> {
        let keyword = if self.is(k, "const") { k + 1 } else { k };
        let name_at = keyword + 1;
        let open = name_at + 1;
        if !self.is_ident(name_at) || open >= hi || !self.is(open, "{") {
            return Err(self.unsupported(k, "enum"));
        }
        let name = self.tok(name_at).text;
        let close = self.pair(open);
        let indent = self.indent_at(self.tok(first).start);
        let export = if first != k { "export " } else { "" };

        let mut text = format!("{export}var {name};\n{indent}(function ({name}) {{\n");
        for line in self.enum_members(open + 1, close, name)? {
            text.push_str(&format!("{indent}  {line}\n"));
        }
        text.push_str(&format!("{indent}}})({name} || ({name} = {{}}));"));
        self.edits.push(Edit {
            start: self.tok(first).start,
            end: self.tok(close).end(),
            text,
        });
        Ok(close + 1)
    }

    /// One assignment per member of the enum body `[lo, hi)`.
    fn enum_members(&self, lo: usize, hi: usize, name: &str) -> ScriptResult<Vec<String>> {
        let mut lines = Vec::new();
        let mut members: Vec<&str> = Vec::new();
        // Value of the next member without an initializer.
        let mut next = Some("0".to_string());
        let mut m = lo;
        while m < hi {
            let key_at = m;
            let t = self.tok(m);
            let (key, member) = match t.kind {
                TokenKind::Ident => (format!("'{}'", t.text), t.text),
                TokenKind::String => (t.text.to_string(), &t.text[1..t.text.len() - 1]),
                _ => return Err(self.unsupported(m, "computed enum member")),
            };
            m += 1;

            let value = if m < hi && self.is(m, "=") {
                let start = m + 1;
                let mut end = start;
                while end < hi && !self.is(end, ",") {
                    end = if self.tok(end).is_opener() { self.pair(end) + 1 } else { end + 1 };
                }
                if end == start {
                    return Err(self.unsupported(m, "enum initializer"));
                }
                m = end;
                Some(self.enum_initializer(start, end, name, &members)?)
            } else {
                None
            };
            if m < hi && self.is(m, ",") {
                m += 1;
            }

            match value {
                Some((text, true)) => {
                    lines.push(format!("{name}[{key}] = {text};"));
                    next = None;
                }
                Some((text, false)) => {
                    lines.push(format!("{name}[{name}[{key}] = {text}] = {key};"));
                    next = Some(next_enum_value(&text, name, &key));
                }
                None => {
                    let text = next
                        .take()
                        .ok_or_else(|| self.unsupported(key_at, "enum member without initializer"))?;
                    lines.push(format!("{name}[{name}[{key}] = {text}] = {key};"));
                    next = Some(next_enum_value(&text, name, &key));
                }
            }
            members.push(member);
        }
        Ok(lines)
    }

    /// The initializer `[start, end)` as JavaScript, and whether it is a
    /// string. String members get no reverse mapping.
    fn enum_initializer(&self, start: usize, end: usize, name: &str, members: &[&str]) -> ScriptResult<(String, bool)> {
        let raw = &self.source[self.tok(start).start..self.tok(end - 1).end()];
        let single = self.tok(start);
        let string = end == start + 1
            && (single.kind == TokenKind::String || (single.kind == TokenKind::Template && !raw.contains("${")));
        if string {
            return Ok((raw.to_string(), true));
        }
        let expr = erase_expression(raw)?;
        Ok((qualify_members(&expr, name, members)?, false))
    }

    /// Erase type parameters, type arguments and `implements` from a class
    /// header, then scan the class body. Returns the index after the body.
    fn class_header(&mut self, j: usize, hi: usize) -> ScriptResult<usize> {
        let mut m = j + 1;
        if self.is_ident(m) && !self.is_any(m, &["extends", "implements"]) {
            m += 1;
        }
        if m < hi && self.is(m, "<") {
            let close = self
                .angle_end(m, hi)
                .ok_or_else(|| self.unsupported(m, "type parameters"))?;
            self.remove_bytes(self.tok(m).start, self.tok(close).end());
            m = close + 1;
        }
        if m < hi && self.is(m, "extends") {
            m += 1;
            while m < hi && !self.is_any(m, &["{", "implements"]) {
                if self.is(m, "<") {
                    if let Some(close) = self.angle_end(m, hi) {
                        if self.is_any(close + 1, &["{", "implements"]) {
                            self.remove_bytes(self.tok(m).start, self.tok(close).end());
                            m = close + 1;
                            continue;
                        }
                    }
                }
                if self.tok(m).is_opener() {
                    let close = self.pair(m);
                    self.scan(m + 1, close, Frame::Paren)?;
                    m = close + 1;
                    continue;
                }
                m += 1;
            }
        }
        if m < hi && self.is(m, "implements") {
            let mut b = m + 1;
            while b < hi && !self.is(b, "{") {
                b = match self.is(b, "<").then(|| self.angle_end(b, hi)).flatten() {
                    Some(close) => close + 1,
                    None => b + 1,
                };
            }
            if b < hi {
                self.remove_bytes(self.tok(m).start, self.tok(b).start);
            }
            m = b;
        }
        if m >= hi || !self.is(m, "{") {
            return Ok(m.min(hi).max(j + 1));
        }
        let close = self.pair(m);
        self.scan(m + 1, close, Frame::ClassBody)?;
        Ok(close + 1)
    }

    fn statement_end(&self, from: usize, hi: usize) -> usize {
        let mut m = from;
        while m < hi {
            if m > from
                && self.newline_before(m)
                && can_end_statement(&self.tok(m - 1))
                && !continues_expression(&self.tok(m))
            {
                return m;
            }
            if self.is(m, ";") {
                return m + 1;
            }
            m = if self.tok(m).is_opener() { self.pair(m) + 1 } else { m + 1 };
        }
        hi
    }

    fn declare_end(&self, from: usize, hi: usize) -> usize {
        let mut m = from;
        while m < hi {
            if m > from
                && self.newline_before(m)
                && can_end_statement(&self.tok(m - 1))
                && !continues_expression(&self.tok(m))
            {
                return m;
            }
            if self.is(m, ";") {
                return m + 1;
            }
            if self.is(m, "{") {
                return self.pair(m) + 1;
            }
            m = if self.tok(m).is_opener() { self.pair(m) + 1 } else { m + 1 };
        }
        hi
    }

    /// The `{` opening an interface body.
    fn find_body(&self, from: usize, hi: usize) -> Option<usize> {
        let mut angle = 0usize;
        let mut m = from;
        while m < hi {
            if self.is(m, "<") {
                angle += 1;
            } else if self.is(m, ">") {
                angle = angle.saturating_sub(1);
            } else if self.is(m, "{") && angle == 0 {
                return Some(m);
            } else if self.tok(m).is_opener() {
                m = self.pair(m);
            }
            m += 1;
        }
        None
    }

    /// The `>` closing the angle bracket list at `open`, if the tokens in
    /// between can form a type list.
    fn angle_end(&self, open: usize, hi: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut m = open;
        while m < hi {
            let t = self.tok(m);
            if t.is_punct("<") {
                depth += 1;
            } else if t.is_punct(">") {
                depth -= 1;
                if depth == 0 {
                    return Some(m);
                }
            } else if t.is_opener() {
                m = self.pair(m);
            } else if t.kind == TokenKind::Punct
                && matches!(
                    t.text,
                    ";" | "&&" | "||" | "==" | "===" | "!=" | "!==" | "+" | "*" | "/" | "%" | "+=" | "-=" | "++" | "--" | "!" | "**"
                )
            {
                return None;
            }
            m += 1;
        }
        None
    }

    /// Skip a type expression starting at `j`, returning the index after it.
    fn parse_type(&self, j: usize, hi: usize) -> ScriptResult<usize> {
        let mut j = j;
        if j < hi && self.is_any(j, &["|", "&"]) {
            j += 1;
        }
        j = self.type_operand(j, hi)?;
        loop {
            if j < hi && self.is_any(j, &["|", "&"]) {
                j = self.type_operand(j + 1, hi)?;
                continue;
            }
            if j < hi && self.is(j, "extends") && !self.newline_before(j) {
                let checked = self.type_operand(j + 1, hi)?;
                if checked < hi && self.is(checked, "?") {
                    let then = self.parse_type(checked + 1, hi)?;
                    if then < hi && self.is(then, ":") {
                        j = self.parse_type(then + 1, hi)?;
                        continue;
                    }
                }
                return Err(self.unsupported(j, "conditional type"));
            }
            return Ok(j);
        }
    }

    fn type_operand(&self, j: usize, hi: usize) -> ScriptResult<usize> {
        let mut j = j;
        while j + 1 < hi
            && self.is_any(j, &["keyof", "typeof", "readonly", "unique", "infer", "asserts"])
            && self.type_starts(j + 1)
        {
            j += 1;
        }
        if j + 1 < hi && self.is(j, "abstract") && self.is(j + 1, "new") {
            j += 1;
        }
        if j + 1 < hi && self.is(j, "new") {
            j += 1;
        }
        let Some(token) = self.get(j).filter(|_| j < hi) else {
            return Err(self.unsupported(j, "type"));
        };

        let mut end = match token.kind {
            TokenKind::Punct => match token.text {
                "<" => {
                    let close = self
                        .angle_end(j, hi)
                        .ok_or_else(|| self.unsupported(j, "type parameters"))?;
                    self.function_type(close + 1, hi)?
                }
                "(" => {
                    let close = self.pair(j);
                    if close + 1 < hi && self.is(close + 1, "=>") {
                        self.parse_type(close + 2, hi)?
                    } else {
                        close + 1
                    }
                }
                "{" | "[" => self.pair(j) + 1,
                "-" if self.get(j + 1).is_some_and(|t| t.kind == TokenKind::Number) => j + 2,
                _ => return Err(self.unsupported(j, token.text)),
            },
            TokenKind::Ident => {
                let mut m = j + 1;
                while m + 1 < hi && self.is(m, ".") && self.is_ident(m + 1) {
                    m += 2;
                }
                if m < hi && self.is(m, "<") && !self.newline_before(m) {
                    m = self
                        .angle_end(m, hi)
                        .ok_or_else(|| self.unsupported(m, "type arguments"))?
                        + 1;
                }
                if m < hi && self.is(m, "is") && !self.newline_before(m) {
                    m = self.parse_type(m + 1, hi)?;
                }
                m
            }
            TokenKind::String | TokenKind::Number | TokenKind::Template => j + 1,
            _ => return Err(self.unsupported(j, token.text)),
        };
        while end < hi && self.is(end, "[") && !self.newline_before(end) {
            end = self.pair(end) + 1;
        }
        Ok(end)
    }

    fn function_type(&self, j: usize, hi: usize) -> ScriptResult<usize> {
        if j < hi && self.is(j, "(") {
            let close = self.pair(j);
            if close + 1 < hi && self.is(close + 1, "=>") {
                return self.parse_type(close + 2, hi);
            }
        }
        Err(self.unsupported(j, "function type"))
    }
}

/// Erase TypeScript syntax from a standalone expression.
fn erase_expression(expr: &str) -> ScriptResult<String> {
    let wrapped = format!("({expr})");
    let tokens = tokenize(&wrapped)?;
    let pairs = match_brackets(&wrapped, &tokens)?;
    let mut eraser = Eraser::new(&wrapped, &tokens, &pairs);
    let len = eraser.sig.len();
    eraser.scan(1, len.saturating_sub(1), Frame::Paren)?;
    let out = eraser.finish();
    Ok(out.get(1..out.len().saturating_sub(1)).unwrap_or_default().to_string())
}

/// Prefix bare references to earlier members with the enum name.
fn qualify_members(expr: &str, name: &str, members: &[&str]) -> ScriptResult<String> {
    let mut out = String::with_capacity(expr.len());
    let mut prev: Option<Token<'_>> = None;
    for token in tokenize(expr)? {
        let member = token.kind == TokenKind::Ident
            && members.contains(&token.text)
            && !prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?."));
        if member {
            out.push_str(name);
            out.push('.');
        }
        out.push_str(token.text);
        if !token.is_trivia() {
            prev = Some(token);
        }
    }
    Ok(out)
}

/// The value following `value` in an enum: the next integer when `value`
/// is an integer literal, otherwise one more than the member at runtime.
fn next_enum_value(value: &str, name: &str, key: &str) -> String {
    let digits = value.trim().replace('_', "");
    let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => digits.parse::<i64>().ok(),
    };
    match parsed.and_then(|n| n.checked_add(1)) {
        Some(n) => n.to_string(),
        None => format!("{name}[{key}] + 1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_class_annotations() {
        let source = "class Counter extends HTMLElement {
  private count: number = 0;
  label?: string;
  constructor() {
    super();
  }
  increment(step: number = 1): void {
    this.count += step;
  }
}
";
        let expected = "class Counter extends HTMLElement {
  count = 0;
  label;
  constructor() {
    super();
  }
  increment(step = 1) {
    this.count += step;
  }
}
";
        assert_eq!(strip_types(source).unwrap(), expected);
    }

    #[test]
    fn test_strip_type_only_declarations() {
        let source = "import type { Props } from './props';
import { html, type Template } from 'lit-html';
export interface State {
  open: boolean;
}
type Mode = 'a' | 'b';
declare const VERSION: string;
const mode = 'a' as Mode;
";
        let out = strip_types(source).unwrap();
        assert!(out.contains("import { html } from 'lit-html';"));
        assert!(out.contains("const mode = 'a';"));
        assert!(!out.contains("Props"));
        assert!(!out.contains("interface"));
        assert!(!out.contains("Mode"));
        assert!(!out.contains("VERSION"));
    }

    #[test]
    fn test_strip_generics_and_modifiers() {
        let source = "abstract class Base<T> implements Thing {
  abstract load(): Promise<T>;
  protected items: Array<T> = [];
}
class List extends Base<string> {
  first(): string {
    return this.items[0]!;
  }
  make() {
    return new Map<string, number>();
  }
}
";
        let out = strip_types(source).unwrap();
        assert!(out.contains("class Base {"));
        assert!(out.contains("  items = [];"));
        assert!(out.contains("class List extends Base {"));
        assert!(out.contains("first() {"));
        assert!(out.contains("return this.items[0];"));
        assert!(out.contains("return new Map();"));
        for gone in ["abstract", "implements", "protected", "Promise"] {
            assert!(!out.contains(gone), "{gone} should be erased");
        }
    }

    #[test]
    fn test_strip_arrow_generics_and_this_param() {
        let source = "const id = <T,>(value: T): T => value;\nfunction on(this: Window, name?: string) {}\n";
        assert_eq!(
            strip_types(source).unwrap(),
            "const id = (value) => value;\nfunction on(name) {}\n"
        );
    }

    #[test]
    fn test_ternaries_and_objects_survive() {
        let source = "const o = { a: 1, b: x ? 2 : 3 };\nlet n: number = o.a > 0 ? o.b : 0;\n";
        assert_eq!(
            strip_types(source).unwrap(),
            "const o = { a: 1, b: x ? 2 : 3 };\nlet n = o.a > 0 ? o.b : 0;\n"
        );
    }

    #[test]
    fn test_angle_bracket_assertions() {
        let source = "const x = <string>'a';\nconst n = <number>(<unknown>y);\nconst m = new Map<string, number>();\n";
        assert_eq!(
            strip_types(source).unwrap(),
            "const x = 'a';\nconst n = (y);\nconst m = new Map();\n"
        );
    }

    #[test]
    fn test_types_inside_template_substitutions() {
        let source = "const s = `a ${x as string} b ${`n ${y!}`} c ${ {k: 1}.k }`;\n";
        assert_eq!(
            strip_types(source).unwrap(),
            "const s = `a ${x} b ${`n ${y}`} c ${ {k: 1}.k }`;\n"
        );
    }

    #[test]
    fn test_enums_are_lowered() {
        let source = "enum Color { Red, Green = 4, Blue }
export const enum Mode {
  Open = 'open',
  Closed = 'closed',
}
";
        let expected = "var Color;
(function (Color) {
  Color[Color['Red'] = 0] = 'Red';
  Color[Color['Green'] = 4] = 'Green';
  Color[Color['Blue'] = 5] = 'Blue';
})(Color || (Color = {}));
export var Mode;
(function (Mode) {
  Mode['Open'] = 'open';
  Mode['Closed'] = 'closed';
})(Mode || (Mode = {}));
";
        assert_eq!(strip_types(source).unwrap(), expected);
    }

    #[test]
    fn test_enum_initializers_reference_members() {
        let out = strip_types("enum Flags { A = 1 as number, B = A << 1, C, 'd-e' = 0x10, F }").unwrap();
        assert!(out.contains("Flags[Flags['A'] = 1] = 'A';"));
        assert!(out.contains("Flags[Flags['B'] = Flags.A << 1] = 'B';"));
        assert!(out.contains("Flags[Flags['C'] = Flags['B'] + 1] = 'C';"));
        assert!(out.contains("Flags[Flags['d-e'] = 0x10] = 'd-e';"));
        assert!(out.contains("Flags[Flags['F'] = 17] = 'F';"));

        let err = strip_types("enum S { A = 'a', B }").unwrap_err();
        assert!(matches!(err, ScriptError::Unsupported { ref construct, .. } if construct == "enum member without initializer"));
    }

    #[test]
    fn test_parameter_properties_are_assigned() {
        let source = "class Store extends Base {
  constructor(private readonly name?: string, public size = 1, other: number) {
    super();
    this.ready = true;
  }
}
";
        let expected = "class Store extends Base {
  constructor(name, size = 1, other) {
    super();
    this.name = name;
    this.size = size;
    this.ready = true;
  }
}
";
        assert_eq!(strip_types(source).unwrap(), expected);
    }

    #[test]
    fn test_parameter_properties_without_super() {
        let out = strip_types("class Point {\n  constructor(public x: number, y: number) {}\n}\n").unwrap();
        assert_eq!(out, "class Point {\n  constructor(x, y) {\n    this.x = x;\n  }\n}\n");
    }

    #[test]
    fn test_namespace_is_rejected() {
        let err = strip_types("namespace Util { export const a = 1; }").unwrap_err();
        assert!(matches!(err, ScriptError::Unsupported { ref construct, .. } if construct == "namespace"));
    }

    #[test]
    fn test_invalid_typescript() {
        let err = strip_types("let a: = 1;").unwrap_err();
        assert_eq!(err.code(), "invalid-typescript");
    }
}
