//! Character-level cursor over a component document.

use webcomp_span::Span;

/// A cursor used to read section tags and their contents.
pub struct SectionLexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> SectionLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Create a cursor already positioned at `pos`.
    pub fn at(source: &'a str, pos: usize) -> Self {
        Self { source, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the remaining source.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume and return the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and return the number of bytes skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        self.consume_while(char::is_whitespace);
        self.pos - start
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Consume a string if the remaining source starts with it.
    pub fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate is true.
    pub fn consume_while<F>(&mut self, pred: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if pred(c) {
                self.next_char();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Consume until the given string is found.
    pub fn consume_until(&mut self, s: &str) -> &'a str {
        let start = self.pos;
        while !self.remaining().is_empty() && !self.starts_with(s) {
            self.next_char();
        }
        &self.source[start..self.pos]
    }

    /// Read a tag name.
    pub fn read_tag_name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.next_char();
            }
            _ => return None,
        }
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        Some(&self.source[start..self.pos])
    }

    /// Read an attribute name such as `lang`, `src`, `selector` or `no-shadow`.
    pub fn read_attr_name(&mut self) -> Option<&'a str> {
        let name = self.consume_while(|c| {
            !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<')
        });
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Read a quoted string value, returning the text between the quotes.
    pub fn read_quoted_string(&mut self) -> Option<(&'a str, char)> {
        let quote = self.peek_char()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        self.next_char();

        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == quote {
                let value = &self.source[start..self.pos];
                self.next_char();
                return Some((value, quote));
            }
            self.next_char();
        }
        // Unterminated: everything up to the end is the value.
        Some((&self.source[start..self.pos], quote))
    }

    /// Read an unquoted attribute value.
    pub fn read_unquoted_value(&mut self) -> &'a str {
        self.consume_while(|c| !c.is_whitespace() && c != '>' && c != '=')
    }

    /// Check whether the remaining source opens or closes the tag `name`,
    /// case-insensitively, with `prefix` being `<` or `</`.
    pub fn at_tag(&self, prefix: &str, name: &str) -> bool {
        tag_at(self.remaining(), prefix, name)
    }

    /// Read section content up to the first closing tag `</name`.
    ///
    /// Returns `None` when the input ends before a closing tag.
    pub fn read_block_content(&mut self, name: &str) -> Option<&'a str> {
        let start = self.pos;
        while !self.is_eof() {
            if self.at_tag("</", name) {
                return Some(&self.source[start..self.pos]);
            }
            self.next_char();
        }
        None
    }

    /// Read section content up to the closing tag that matches an already
    /// consumed opening tag, balancing nested `<name>` elements.
    pub fn read_nested_block_content(&mut self, name: &str) -> Option<&'a str> {
        let start = self.pos;
        let mut depth = 0usize;
        while !self.is_eof() {
            if self.at_tag("</", name) {
                if depth == 0 {
                    return Some(&self.source[start..self.pos]);
                }
                depth -= 1;
                self.pos += 2 + name.len();
                continue;
            }
            if self.at_tag("<", name) {
                depth += 1;
                self.pos += 1 + name.len();
                continue;
            }
            self.next_char();
        }
        None
    }

    /// Consume a closing tag `</name ... >`.
    pub fn consume_closing_tag(&mut self, name: &str) -> bool {
        if !self.at_tag("</", name) {
            return false;
        }
        self.pos += 2 + name.len();
        self.consume_until(">");
        self.consume(">");
        true
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Get a span from start to current position.
    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }
}

/// Check whether `text` starts with `prefix` followed by the tag `name`
/// (case-insensitive) and then a tag boundary.
pub fn tag_at(text: &str, prefix: &str, name: &str) -> bool {
    let Some(rest) = text.strip_prefix(prefix) else {
        return false;
    };
    let Some(candidate) = rest.get(..name.len()) else {
        return false;
    };
    if !candidate.eq_ignore_ascii_case(name) {
        return false;
    }
    match rest[name.len()..].chars().next() {
        None => prefix == "</",
        Some(c) => c.is_whitespace() || c == '>' || c == '/',
    }
}

/// Byte offsets of every opening tag `<name` in `source`.
pub fn find_opening_tags(source: &str, name: &str) -> Vec<usize> {
    source
        .match_indices('<')
        .map(|(i, _)| i)
        .filter(|&i| tag_at(&source[i..], "<", name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_tag_name() {
        let mut lexer = SectionLexer::new("template>");
        assert_eq!(lexer.read_tag_name(), Some("template"));
    }

    #[test]
    fn test_read_attr_name_with_dash() {
        let mut lexer = SectionLexer::new("no-shadow selector=\"x\"");
        assert_eq!(lexer.read_attr_name(), Some("no-shadow"));
    }

    #[test]
    fn test_read_quoted_string() {
        let mut lexer = SectionLexer::new("'a > b' rest");
        assert_eq!(lexer.read_quoted_string(), Some(("a > b", '\'')));
        assert_eq!(lexer.remaining(), " rest");
    }

    #[test]
    fn test_tag_boundaries() {
        assert!(tag_at("<script>", "<", "script"));
        assert!(tag_at("<SCRIPT lang=\"ts\">", "<", "script"));
        assert!(tag_at("<template/>", "<", "template"));
        assert!(!tag_at("<scripts>", "<", "script"));
        assert!(!tag_at("<scr", "<", "script"));
        assert!(tag_at("</style>", "</", "style"));
    }

    #[test]
    fn test_find_opening_tags() {
        let source = "<style></style><div><style>a</style>";
        assert_eq!(find_opening_tags(source, "style"), vec![0, 20]);
    }

    #[test]
    fn test_read_block_content() {
        let mut lexer = SectionLexer::new("let a = 1;</script>");
        assert_eq!(lexer.read_block_content("script"), Some("let a = 1;"));
        assert!(lexer.consume_closing_tag("script"));
        assert!(lexer.is_eof());
    }

    #[test]
    fn test_read_block_content_unclosed() {
        let mut lexer = SectionLexer::new("let a = 1;");
        assert_eq!(lexer.read_block_content("script"), None);
    }

    #[test]
    fn test_read_nested_block_content() {
        let mut lexer = SectionLexer::new("<ul><template><li></li></template></ul></template>");
        let content = lexer.read_nested_block_content("template");
        assert_eq!(content, Some("<ul><template><li></li></template></ul>"));
    }
}
