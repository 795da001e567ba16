//! Template stage: render method bodies and runtime imports per engine.

use crate::context::CompileContext;
use crate::error::CompileError;
use crate::resolve::resolve_content;
use webcomp_parser::{ComponentDocument, TemplateEngine};

/// Where rendered markup is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachTarget {
    /// The element's open shadow root.
    ShadowRoot,
    /// The element itself.
    Host,
}

impl AttachTarget {
    pub fn new(shadow_dom: bool) -> Self {
        if shadow_dom {
            Self::ShadowRoot
        } else {
            Self::Host
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShadowRoot => "this.shadowRoot",
            Self::Host => "this",
        }
    }
}

/// The template stage's contribution to the emitted script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOutput {
    pub engine: TemplateEngine,
    /// Statements of the render method.
    pub render_body: Vec<String>,
    /// The runtime import, followed by a blank line, or empty.
    pub import: String,
}

/// Resolve the template, prefix it with the style block and build the render
/// method body for the document's engine.
pub fn build_template(
    ctx: &mut CompileContext<'_>,
    doc: &ComponentDocument,
    style_block: &str,
) -> Result<TemplateOutput, CompileError> {
    tracing::info!(path = %ctx.path.display(), "building template");
    let template = &doc.template;

    let engine = match template.lang.as_deref() {
        None => TemplateEngine::default(),
        Some(tag) => TemplateEngine::parse(tag).unwrap_or_else(|| {
            ctx.warn(
                "unknown-engine",
                format!("unknown template engine `{tag}`, falling back to html"),
            );
            TemplateEngine::Html
        }),
    };

    let content = resolve_content(
        ctx.fs,
        ctx.path,
        template.src.as_ref().map(|s| s.value.as_str()),
        &template.content,
    )?;
    let markup = if style_block.is_empty() {
        content
    } else {
        format!("{style_block}\n{content}")
    };

    if let Some(package) = engine.runtime_package() {
        ctx.warn(
            "runtime-dependency",
            format!("the {} engine needs a runtime: add {package} to your package.json", engine.as_str()),
        );
    }

    Ok(TemplateOutput {
        engine,
        render_body: build_render_body(&markup, engine, AttachTarget::new(doc.script.shadow_dom)),
        import: build_import_line(engine),
    })
}

/// Statements that render `content` into `target`.
pub fn build_render_body(content: &str, engine: TemplateEngine, target: AttachTarget) -> Vec<String> {
    let literal = format!("`{}`", escape_backticks(content));
    let target = target.as_str();
    match engine {
        TemplateEngine::Html => vec![
            format!("const template = {literal};"),
            "const templateNode = new DOMParser().parseFromString(template, 'text/html').firstChild;".to_string(),
            format!("{target}.innerHTML = '';"),
            format!("{target}.appendChild(templateNode.cloneNode(true));"),
        ],
        TemplateEngine::Lit => vec![
            format!("const template = html{literal};"),
            format!("render(template, {target});"),
        ],
        TemplateEngine::Handlebars => vec![
            format!("if (!this.compiledTemplate) {{\n  this.compiledTemplate = Handlebars.compile({literal});\n}}"),
            format!("{target}.innerHTML = this.compiledTemplate(data);"),
        ],
        TemplateEngine::Ejs => vec![
            format!("const template = {literal};"),
            format!("{target}.innerHTML = ejs.render(template, data);"),
        ],
    }
}

/// The engine's runtime import followed by a blank line, or empty for html.
pub fn build_import_line(engine: TemplateEngine) -> String {
    let line = match engine {
        TemplateEngine::Html => return String::new(),
        TemplateEngine::Lit => "import { html, render } from 'lit-html';",
        TemplateEngine::Handlebars => "import Handlebars from 'handlebars/dist/handlebars';",
        TemplateEngine::Ejs => "import ejs from 'ejs/ejs';",
    };
    format!("{line}\n\n")
}

/// Escape backticks that are not already escaped. `${}` is left alone.
pub fn escape_backticks(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut backslashes = 0usize;
    for c in content.chars() {
        if c == '`' && backslashes % 2 == 0 {
            out.push('\\');
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_html_body() {
        let body = build_render_body("<h1>Hi</h1>", TemplateEngine::Html, AttachTarget::ShadowRoot);
        assert_eq!(
            body,
            vec![
                "const template = `<h1>Hi</h1>`;",
                "const templateNode = new DOMParser().parseFromString(template, 'text/html').firstChild;",
                "this.shadowRoot.innerHTML = '';",
                "this.shadowRoot.appendChild(templateNode.cloneNode(true));",
            ]
        );
    }

    #[test]
    fn test_host_target() {
        let body = build_render_body("<p></p>", TemplateEngine::Ejs, AttachTarget::Host);
        assert_eq!(body[1], "this.innerHTML = ejs.render(template, data);");
    }

    #[test]
    fn test_lit_and_handlebars_bodies() {
        let lit = build_render_body("<p>${data.name}</p>", TemplateEngine::Lit, AttachTarget::ShadowRoot);
        assert_eq!(lit, vec!["const template = html`<p>${data.name}</p>`;", "render(template, this.shadowRoot);"]);

        let hbs = build_render_body("<p>{{name}}</p>", TemplateEngine::Handlebars, AttachTarget::Host);
        assert_eq!(
            hbs[0],
            "if (!this.compiledTemplate) {\n  this.compiledTemplate = Handlebars.compile(`<p>{{name}}</p>`);\n}"
        );
        assert_eq!(hbs[1], "this.innerHTML = this.compiledTemplate(data);");
    }

    #[test]
    fn test_import_lines() {
        assert_eq!(build_import_line(TemplateEngine::Html), "");
        assert_eq!(build_import_line(TemplateEngine::Lit), "import { html, render } from 'lit-html';\n\n");
        assert_eq!(build_import_line(TemplateEngine::Ejs), "import ejs from 'ejs/ejs';\n\n");
    }

    #[test]
    fn test_escape_backticks() {
        assert_eq!(escape_backticks("a `b` ${c}"), "a \\`b\\` ${c}");
        assert_eq!(escape_backticks("already \\` escaped"), "already \\` escaped");
        assert_eq!(escape_backticks("\\\\`"), "\\\\\\`");
    }
}
