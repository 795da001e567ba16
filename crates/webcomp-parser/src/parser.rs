//! Section extraction for component documents.
//!
//! The document is not parsed as markup. Each section is found by scanning
//! for its opening tag: the first `<template`, the last `<script` and the
//! last `<style`. Anchoring on the last script/style tag keeps `<script>` or
//! `<style>` elements that appear inside template markup from being mistaken
//! for the component's own sections, as long as the sections come last.

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{find_opening_tags, SectionLexer};
use webcomp_span::Span;

/// Extract the sections of a component document.
pub fn parse_document(source: &str) -> ParseResult<ComponentDocument> {
    let parser = DocumentParser::new(source);

    let script_start = parser
        .anchor(SectionKind::Script)
        .ok_or_else(|| ParseError::missing_section(SectionKind::Script, source.len()))?;
    let template_start = parser
        .anchor(SectionKind::Template)
        .ok_or_else(|| ParseError::missing_section(SectionKind::Template, source.len()))?;

    let script = parser.read_section(SectionKind::Script, script_start)?;
    let template = parser.read_section(SectionKind::Template, template_start)?;
    let style = match parser.anchor(SectionKind::Style) {
        Some(start) => Some(parser.read_section(SectionKind::Style, start)?),
        None => None,
    };

    let script_src = get_src_attr(&script);
    let template_src = get_src_attr(&template);
    ensure_content(SectionKind::Script, &script, &script_src)?;
    ensure_content(SectionKind::Template, &template, &template_src)?;

    let script = build_script(script, script_src)?;
    let template = TemplateSection {
        lang: get_lang(&template),
        src: template_src,
        block: template,
    };
    let style = style.map(build_style);

    Ok(ComponentDocument {
        source: source.to_string(),
        template,
        script,
        style,
    })
}

struct DocumentParser<'a> {
    source: &'a str,
}

impl<'a> DocumentParser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Offset of the opening tag that anchors the `kind` section.
    fn anchor(&self, kind: SectionKind) -> Option<usize> {
        let openings = find_opening_tags(self.source, kind.tag_name());
        match kind {
            SectionKind::Template => openings.first().copied(),
            SectionKind::Script | SectionKind::Style => openings.last().copied(),
        }
    }

    /// Read the section whose opening tag starts at `start`.
    fn read_section(&self, kind: SectionKind, start: usize) -> ParseResult<SectionBlock> {
        let name = kind.tag_name();
        let mut lexer = SectionLexer::at(self.source, start);

        lexer.consume("<");
        lexer.read_tag_name();
        let attrs = parse_attributes(&mut lexer);

        lexer.skip_whitespace();
        if lexer.consume("/>") {
            let tag_end = lexer.pos() as u32;
            return Ok(SectionBlock {
                span: lexer.span_from(start),
                content_span: Span::empty(tag_end),
                content: String::new(),
                attrs,
            });
        }
        if !lexer.consume(">") {
            return Err(ParseError::unclosed_section(kind, lexer.span_from(start)));
        }

        let content_start = lexer.pos();
        let content = match kind {
            SectionKind::Template => lexer.read_nested_block_content(name),
            SectionKind::Script | SectionKind::Style => lexer.read_block_content(name),
        };
        let Some(content) = content else {
            return Err(ParseError::unclosed_section(
                kind,
                Span::new(start as u32, content_start as u32),
            ));
        };
        let content_span = lexer.span_from(content_start);
        lexer.consume_closing_tag(name);

        Ok(SectionBlock {
            span: lexer.span_from(start),
            content_span,
            content: content.to_string(),
            attrs,
        })
    }
}

/// Parse the attributes of an opening tag, stopping at `>` or `/>`.
fn parse_attributes(lexer: &mut SectionLexer<'_>) -> Vec<SectionAttr> {
    let mut attrs = Vec::new();

    loop {
        lexer.skip_whitespace();
        if lexer.starts_with(">") || lexer.starts_with("/>") || lexer.is_eof() {
            break;
        }

        let attr_start = lexer.pos();
        let Some(name) = lexer.read_attr_name() else {
            // Stray quote, `=` or `/`: skip it.
            lexer.next_char();
            continue;
        };

        lexer.skip_whitespace();
        if !lexer.consume("=") {
            attrs.push(SectionAttr::boolean(name, lexer.span_from(attr_start)));
            continue;
        }
        lexer.skip_whitespace();

        let (value, value_span) = if lexer.starts_with("\"") || lexer.starts_with("'") {
            let value_start = lexer.pos() + 1;
            match lexer.read_quoted_string() {
                Some((v, _)) => (
                    v.to_string(),
                    Span::new(value_start as u32, (value_start + v.len()) as u32),
                ),
                None => continue,
            }
        } else {
            let value_start = lexer.pos();
            let v = lexer.read_unquoted_value();
            (v.to_string(), lexer.span_from(value_start))
        };

        attrs.push(SectionAttr::with_value(
            name,
            value,
            lexer.span_from(attr_start),
            value_span,
        ));
    }

    attrs
}

fn get_src_attr(block: &SectionBlock) -> Option<SrcAttr> {
    block.find_attr("src").and_then(|a| {
        a.value
            .as_ref()
            .filter(|v| !v.trim().is_empty())
            .map(|v| SrcAttr {
                value: v.trim().to_string(),
                span: a.span,
                value_span: a.value_span.unwrap_or(a.span),
            })
    })
}

fn get_lang(block: &SectionBlock) -> Option<String> {
    block
        .get_attr("lang")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Shadow DOM is on unless `no-shadow` is present with anything but `"false"`.
fn uses_shadow_dom(block: &SectionBlock) -> bool {
    match block.find_attr("no-shadow") {
        None => true,
        Some(attr) => matches!(attr.value.as_deref(), Some(v) if v.trim().eq_ignore_ascii_case("false")),
    }
}

fn ensure_content(kind: SectionKind, block: &SectionBlock, src: &Option<SrcAttr>) -> ParseResult<()> {
    if src.is_none() && block.inline_text().is_empty() {
        return Err(ParseError::empty_section(kind, block.span));
    }
    Ok(())
}

fn build_script(block: SectionBlock, src: Option<SrcAttr>) -> ParseResult<ScriptSection> {
    let (selector, selector_span) = match block.find_attr("selector") {
        Some(attr) => match (&attr.value, attr.value_span) {
            (Some(v), Some(span)) if !v.trim().is_empty() => (v.trim().to_string(), span),
            _ => return Err(ParseError::missing_selector(attr.span)),
        },
        None => return Err(ParseError::missing_selector(block.span)),
    };

    Ok(ScriptSection {
        lang: get_lang(&block),
        shadow_dom: uses_shadow_dom(&block),
        src,
        selector,
        selector_span,
        block,
    })
}

fn build_style(block: SectionBlock) -> StyleSection {
    StyleSection {
        lang: get_lang(&block),
        src: get_src_attr(&block),
        block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"<template><h1>Hi</h1></template><script selector="my-comp">class MyComp extends HTMLElement{constructor(){super();}}</script>"#;

    #[test]
    fn test_parse_minimal_document() {
        let doc = parse_document(MINIMAL).unwrap();
        assert_eq!(doc.template.content, "<h1>Hi</h1>");
        assert_eq!(doc.script.selector, "my-comp");
        assert!(doc.script.shadow_dom);
        assert!(doc.style.is_none());
        assert!(doc.script.content.starts_with("class MyComp"));
    }

    #[test]
    fn test_missing_script() {
        let err = parse_document("<template><p></p></template>").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingScript);
        assert_eq!(err.message, "no script section found");
    }

    #[test]
    fn test_missing_template() {
        let err = parse_document(r#"<script selector="x-a">class A extends HTMLElement {}</script>"#)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingTemplate);
        assert_eq!(err.message, "no template section found");
    }

    #[test]
    fn test_missing_selector() {
        let source = "<template><p></p></template><script>class A extends HTMLElement {}</script>";
        let err = parse_document(source).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingSelector);
    }

    #[test]
    fn test_empty_selector_value() {
        let source = r#"<template><p></p></template><script selector="">class A extends HTMLElement {}</script>"#;
        let err = parse_document(source).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingSelector);
    }

    #[test]
    fn test_attributes() {
        let source = r#"<template lang="lit" src="./a.html"></template>
<script lang="ts" src='./a.ts' selector=x-a no-shadow></script>
<style lang="scss">:host { color: red; }</style>"#;
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.template.lang.as_deref(), Some("lit"));
        assert_eq!(doc.template.src.as_ref().unwrap().value, "./a.html");
        assert_eq!(doc.script.lang.as_deref(), Some("ts"));
        assert_eq!(doc.script.src.as_ref().unwrap().value, "./a.ts");
        assert_eq!(doc.script.selector, "x-a");
        assert!(!doc.script.shadow_dom);
        let style = doc.style.unwrap();
        assert_eq!(style.lang.as_deref(), Some("scss"));
        assert_eq!(style.inline_text(), ":host { color: red; }");
    }

    #[test]
    fn test_no_shadow_values() {
        let doc_for = |attr: &str| {
            let source = format!(
                r#"<template><p></p></template><script selector="x-a" {}>class A extends HTMLElement {{}}</script>"#,
                attr
            );
            parse_document(&source).unwrap().script.shadow_dom
        };
        assert!(!doc_for("no-shadow"));
        assert!(!doc_for(r#"no-shadow="true""#));
        assert!(doc_for(r#"no-shadow="false""#));
        assert!(doc_for(""));
    }

    #[test]
    fn test_last_script_and_style_win() {
        let source = r#"<template>
  <style>.inner {}</style>
  <p>text</p>
</template>
<script selector="x-a">class A extends HTMLElement {}</script>
<style>.outer {}</style>"#;
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.style.unwrap().inline_text(), ".outer {}");
        assert!(doc.template.content.contains(".inner"));
    }

    #[test]
    fn test_nested_template_elements() {
        let source = r#"<template><ul><template><li></li></template></ul></template>
<script selector="x-a">class A extends HTMLElement {}</script>"#;
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.template.content, "<ul><template><li></li></template></ul>");
    }

    #[test]
    fn test_self_closing_with_src() {
        let source = r#"<template src="./a.html" />
<script selector="x-a" src="./a.js"/>"#;
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.template.src.as_ref().unwrap().value, "./a.html");
        assert_eq!(doc.script.src.as_ref().unwrap().value, "./a.js");
        assert!(doc.script.content.is_empty());
    }

    #[test]
    fn test_empty_template_is_rejected() {
        let source = r#"<template>
</template><script selector="x-a">class A extends HTMLElement {}</script>"#;
        let err = parse_document(source).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptySection);
    }

    #[test]
    fn test_unclosed_script() {
        let source = r#"<template><p></p></template><script selector="x-a">class A {}"#;
        let err = parse_document(source).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnclosedSection);
    }

    #[test]
    fn test_spans_point_into_source() {
        let doc = parse_document(MINIMAL).unwrap();
        let selector = doc.script.selector_span.slice(&doc.source);
        assert_eq!(selector, Some("my-comp"));
        assert_eq!(
            doc.template.content_span.slice(&doc.source),
            Some("<h1>Hi</h1>")
        );
    }
}
