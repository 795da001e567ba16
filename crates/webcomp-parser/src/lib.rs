//! Single-file web component document parser.
//!
//! This crate splits a component document into its `<template>`, `<script>`
//! and optional `<style>` sections, together with the attributes that steer
//! compilation (`lang`, `src`, `selector`, `no-shadow`).

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use error::{ErrorCode, ParseError, ParseResult};
pub use parser::parse_document;

/// Parse a component document and return its sections.
pub fn parse(source: &str) -> ParseResult<ComponentDocument> {
    parse_document(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_component() {
        let source = r#"<template lang="hbs">
  <p>{{ name }}</p>
</template>

<script lang="ts" selector="hello-card">
class HelloCard extends HTMLElement {
  name: string = 'World';
}
</script>

<style lang="scss">
$c: red;
p { color: $c; }
</style>
"#;
        let doc = parse(source).unwrap();
        assert_eq!(
            doc.template.lang.as_deref().and_then(TemplateEngine::parse),
            Some(TemplateEngine::Handlebars)
        );
        assert_eq!(
            doc.script.lang.as_deref().and_then(ScriptLang::parse),
            Some(ScriptLang::Ts)
        );
        assert_eq!(doc.script.selector, "hello-card");
        assert!(doc.script.inline_text().starts_with("class HelloCard"));
        let style = doc.style.as_ref().unwrap();
        assert_eq!(style.lang.as_deref().and_then(StyleLang::parse), Some(StyleLang::Scss));
        assert!(style.content.contains("$c: red;"));
    }

    #[test]
    fn test_error_position() {
        let source = "<template>\n  <p></p>\n</template>\n<script>\nclass A extends HTMLElement {}\n</script>";
        let err = parse(source).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingSelector);
        assert_eq!(err.line_col(source).to_display(), (4, 1));
    }

    #[test]
    fn test_uppercase_tags() {
        let source = r#"<TEMPLATE><p></p></TEMPLATE><SCRIPT selector="x-a">class A extends HTMLElement {}</SCRIPT>"#;
        let doc = parse(source).unwrap();
        assert_eq!(doc.template.content, "<p></p>");
        assert_eq!(doc.script.selector, "x-a");
    }
}
