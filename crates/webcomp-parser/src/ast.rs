//! Section types for single-file component documents.

use smol_str::SmolStr;
use webcomp_span::Span;

/// A parsed component document.
///
/// Built once per compile pass and never mutated afterwards; every later
/// stage reads from it through a shared reference.
#[derive(Debug, Clone)]
pub struct ComponentDocument {
    /// The full source text.
    pub source: String,
    /// The template section.
    pub template: TemplateSection,
    /// The script section.
    pub script: ScriptSection,
    /// The style section, if present.
    pub style: Option<StyleSection>,
}

/// Which of the three sections a block is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Template,
    Script,
    Style,
}

impl SectionKind {
    /// The tag name that opens this section.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Script => "script",
            Self::Style => "style",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// Properties shared by every section.
#[derive(Debug, Clone)]
pub struct SectionBlock {
    /// The span of the entire section including tags.
    pub span: Span,
    /// The span of the inner text only.
    pub content_span: Span,
    /// The raw inner text.
    pub content: String,
    /// Attributes of the opening tag.
    pub attrs: Vec<SectionAttr>,
}

impl SectionBlock {
    /// Get an attribute value by name (case-insensitive).
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.find_attr(name).and_then(|a| a.value.as_deref())
    }

    /// Find an attribute by name (case-insensitive).
    pub fn find_attr(&self, name: &str) -> Option<&SectionAttr> {
        self.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// The inline text with surrounding whitespace removed.
    pub fn inline_text(&self) -> &str {
        self.content.trim()
    }
}

/// An attribute on a section's opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionAttr {
    /// The attribute name as written.
    pub name: SmolStr,
    /// The attribute value (None for boolean attributes).
    pub value: Option<String>,
    /// The span of the attribute.
    pub span: Span,
    /// The span of the value (if present).
    pub value_span: Option<Span>,
}

impl SectionAttr {
    /// Create a boolean attribute.
    pub fn boolean(name: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name: name.into(),
            value: None,
            span,
            value_span: None,
        }
    }

    /// Create an attribute with a value.
    pub fn with_value(
        name: impl Into<SmolStr>,
        value: impl Into<String>,
        span: Span,
        value_span: Span,
    ) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            span,
            value_span: Some(value_span),
        }
    }
}

/// The `src` attribute pointing at an external file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcAttr {
    /// The path as written, relative to the document.
    pub value: String,
    /// The span of the attribute.
    pub span: Span,
    /// The span of the value.
    pub value_span: Span,
}

/// The template section.
#[derive(Debug, Clone)]
pub struct TemplateSection {
    pub block: SectionBlock,
    /// The template engine tag (`html`, `lit`, `hbs`, `ejs`).
    pub lang: Option<String>,
    pub src: Option<SrcAttr>,
}

impl std::ops::Deref for TemplateSection {
    type Target = SectionBlock;
    fn deref(&self) -> &Self::Target {
        &self.block
    }
}

/// The script section.
#[derive(Debug, Clone)]
pub struct ScriptSection {
    pub block: SectionBlock,
    /// The script dialect tag (`js`, `ts`).
    pub lang: Option<String>,
    pub src: Option<SrcAttr>,
    /// The custom element's tag name.
    pub selector: String,
    /// Span of the selector value.
    pub selector_span: Span,
    /// Whether the component renders into a shadow root.
    pub shadow_dom: bool,
}

impl std::ops::Deref for ScriptSection {
    type Target = SectionBlock;
    fn deref(&self) -> &Self::Target {
        &self.block
    }
}

/// The style section.
#[derive(Debug, Clone)]
pub struct StyleSection {
    pub block: SectionBlock,
    /// The stylesheet dialect tag (`css`, `scss`).
    pub lang: Option<String>,
    pub src: Option<SrcAttr>,
}

impl std::ops::Deref for StyleSection {
    type Target = SectionBlock;
    fn deref(&self) -> &Self::Target {
        &self.block
    }
}

/// Template engine variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateEngine {
    /// Plain markup parsed with `DOMParser`.
    #[default]
    Html,
    /// lit-html tagged templates.
    Lit,
    /// Handlebars.
    Handlebars,
    /// Embedded JavaScript templates.
    Ejs,
}

impl TemplateEngine {
    /// Parse from a `lang` attribute value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Some(Self::Html),
            "lit" | "lit-html" => Some(Self::Lit),
            "hbs" | "handlebars" => Some(Self::Handlebars),
            "ejs" => Some(Self::Ejs),
            _ => None,
        }
    }

    /// The canonical tag for this engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Lit => "lit",
            Self::Handlebars => "hbs",
            Self::Ejs => "ejs",
        }
    }

    /// The npm package the emitted code imports at runtime.
    pub fn runtime_package(&self) -> Option<&'static str> {
        match self {
            Self::Html => None,
            Self::Lit => Some("lit-html"),
            Self::Handlebars => Some("handlebars"),
            Self::Ejs => Some("ejs"),
        }
    }
}

/// Script dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptLang {
    #[default]
    Js,
    Ts,
}

impl ScriptLang {
    /// Parse from a `lang` attribute value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "js" | "javascript" => Some(Self::Js),
            "ts" | "typescript" => Some(Self::Ts),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Ts => "ts",
        }
    }

    pub fn is_typescript(&self) -> bool {
        matches!(self, Self::Ts)
    }
}

/// Stylesheet dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StyleLang {
    #[default]
    Css,
    /// SCSS, also accepted under the `sass` tag.
    Scss,
}

impl StyleLang {
    /// Parse from a `lang` attribute value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "css" => Some(Self::Css),
            "scss" | "sass" => Some(Self::Scss),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Scss => "scss",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_engine_tags() {
        assert_eq!(TemplateEngine::parse("lit-html"), Some(TemplateEngine::Lit));
        assert_eq!(TemplateEngine::parse("Handlebars"), Some(TemplateEngine::Handlebars));
        assert_eq!(TemplateEngine::parse("pug"), None);
        assert_eq!(TemplateEngine::Html.runtime_package(), None);
        assert_eq!(TemplateEngine::Ejs.runtime_package(), Some("ejs"));
    }

    #[test]
    fn test_script_and_style_tags() {
        assert_eq!(ScriptLang::parse("typescript").map(|l| l.is_typescript()), Some(true));
        assert_eq!(ScriptLang::parse("coffee"), None);
        assert_eq!(StyleLang::parse("sass"), Some(StyleLang::Scss));
        assert_eq!(StyleLang::parse(" CSS "), Some(StyleLang::Css));
    }
}
