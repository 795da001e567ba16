//! Script stage: transpile, normalize and splice the component class.

use crate::context::CompileContext;
use crate::error::CompileError;
use crate::resolve::resolve_content;
use crate::template::TemplateOutput;
use webcomp_parser::{ComponentDocument, ScriptLang};
use webcomp_script::{normalize, parse_module, print_module, strip_types, ClassDecl, Method, MemberKind, Stmt};

const RENDER_CALL: &str = "this.render(this);";
const ATTACH_SHADOW: &str = "this.attachShadow({ mode: 'open' });";

/// Build the emitted module for `doc`.
pub fn build_script(
    ctx: &mut CompileContext<'_>,
    doc: &ComponentDocument,
    template: &TemplateOutput,
) -> Result<String, CompileError> {
    tracing::info!(path = %ctx.path.display(), "building script");
    let script = &doc.script;

    let lang = match script.lang.as_deref() {
        None => ScriptLang::default(),
        Some(tag) => ScriptLang::parse(tag).unwrap_or_else(|| {
            ctx.warn("unknown-script-lang", format!("unknown script language `{tag}`, treating it as js"));
            ScriptLang::Js
        }),
    };

    let resolved = resolve_content(
        ctx.fs,
        ctx.path,
        script.src.as_ref().map(|s| s.value.as_str()),
        &script.content,
    )?;

    let source = if lang.is_typescript() {
        match strip_types(&resolved) {
            Ok(js) => js,
            Err(e) if ctx.options.strict => return Err(CompileError::Transpile(e)),
            Err(e) => {
                ctx.error(e.code(), format!("TypeScript transpilation failed, keeping the source as written: {e}"));
                resolved
            }
        }
    } else {
        resolved
    };

    let mut module = parse_module(&normalize(&source)?)?;
    let class = module
        .first_extending_class_mut()
        .ok_or(CompileError::ClassNameNotFound)?;
    let name = class.name.clone().ok_or(CompileError::ClassNameNotFound)?;

    inject_render_call(class);
    if script.shadow_dom && !attach_shadow(class) {
        ctx.warn(
            "missing-super",
            format!("the constructor of {name} never calls super(); attachShadow is inserted first"),
        );
    }
    splice_render_method(class, &template.render_body);

    Ok(format!(
        "{}{}\n\ncustomElements.define('{}', {});",
        template.import,
        print_module(&module),
        escape_single_quoted(&script.selector),
        name
    ))
}

/// Escape `value` for use inside a single-quoted JavaScript string.
fn escape_single_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Make `this.render(this)` the first statement of `connectedCallback`,
/// creating the hook when the class has none. The hook may be a method or a
/// field holding a function.
fn inject_render_call(class: &mut ClassDecl) {
    if let Some(method) = class
        .find_method("connectedCallback")
        .and_then(|index| class.method_mut(index))
    {
        method.body.insert(0, Stmt::new(RENDER_CALL));
        return;
    }
    if let Some(index) = class.find_field_function("connectedCallback") {
        if class.prepend_to_field_function(index, "connectedCallback", RENDER_CALL) {
            return;
        }
    }
    let at = class.constructor_index().map_or(0, |index| index + 1);
    class.insert_method(
        at,
        Method::new("connectedCallback", "", vec![Stmt::new(RENDER_CALL)]),
    );
}

/// Attach an open shadow root right after `super(...)`. Returns false when
/// an existing constructor has no `super` call.
fn attach_shadow(class: &mut ClassDecl) -> bool {
    let Some(index) = class.constructor_index() else {
        class.insert_method(
            0,
            Method::new(
                "constructor",
                "",
                vec![Stmt::new("super();"), Stmt::new(ATTACH_SHADOW)],
            ),
        );
        return true;
    };
    let Some(constructor) = class.method_mut(index) else {
        return true;
    };
    match constructor.body.position_of_call("super") {
        Some(index) => {
            constructor.body.insert(index + 1, Stmt::new(ATTACH_SHADOW));
            true
        }
        None => {
            constructor.body.insert(0, Stmt::new(ATTACH_SHADOW));
            false
        }
    }
}

/// Replace the body of a one-parameter `render` method, or add `render(data)`
/// as the first member.
fn splice_render_method(class: &mut ClassDecl, body: &[String]) {
    let stmts: Vec<Stmt> = body.iter().map(Stmt::new).collect();
    let existing = class.find_method("render").filter(|&index| {
        matches!(&class.members[index].kind, MemberKind::Method(m) if m.param_count() == 1)
    });
    match existing.and_then(|index| class.method_mut(index)) {
        Some(method) => {
            method.params = "data".to_string();
            method.body.stmts = stmts;
        }
        None => class.insert_method(0, Method::new("render", "data", stmts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn class_of(source: &str) -> ClassDecl {
        parse_module(source)
            .unwrap()
            .first_extending_class()
            .cloned()
            .unwrap()
    }

    fn body_texts(class: &ClassDecl, name: &str) -> Vec<String> {
        let index = if name == "constructor" {
            class.constructor_index()
        } else {
            class.find_method(name)
        };
        match &class.members[index.unwrap()].kind {
            MemberKind::Method(m) => m.body.stmts.iter().map(|s| s.text.clone()).collect(),
            MemberKind::Other(_) => panic!("{name} is not a method"),
        }
    }

    #[test]
    fn test_render_call_goes_first_in_existing_hook() {
        let mut class = class_of("class A extends HTMLElement {\n  connectedCallback() {\n    this.load();\n  }\n}");
        inject_render_call(&mut class);
        assert_eq!(body_texts(&class, "connectedCallback"), vec![RENDER_CALL, "this.load();"]);
        assert_eq!(class.members.len(), 1);
    }

    #[test]
    fn test_render_call_goes_into_field_hook() {
        let mut class = class_of("class A extends HTMLElement {\n  connectedCallback = () => { this.x = 1; }\n}");
        inject_render_call(&mut class);
        assert_eq!(class.members.len(), 1);
        assert_eq!(class.find_method("connectedCallback"), None);
        match &class.members[0].kind {
            MemberKind::Other(text) => {
                assert_eq!(text, "connectedCallback = () => { this.render(this); this.x = 1; }")
            }
            MemberKind::Method(_) => panic!("the field should stay a field"),
        }
    }

    #[test]
    fn test_selector_is_escaped() {
        assert_eq!(escape_single_quoted("x-card"), "x-card");
        assert_eq!(escape_single_quoted("it's-a\\b"), "it\\'s-a\\\\b");
    }

    #[test]
    fn test_hook_is_created_after_constructor() {
        let mut class = class_of("class A extends HTMLElement {\n  constructor() {\n    super();\n  }\n  go() {}\n}");
        inject_render_call(&mut class);
        assert_eq!(class.find_method("connectedCallback"), Some(1));
    }

    #[test]
    fn test_shadow_root_follows_super() {
        let mut class = class_of("class A extends HTMLElement {\n  constructor() {\n    const x = 1;\n    super(x);\n    this.x = x;\n  }\n}");
        assert!(attach_shadow(&mut class));
        assert_eq!(
            body_texts(&class, "constructor"),
            vec!["const x = 1;", "super(x);", ATTACH_SHADOW, "this.x = x;"]
        );
    }

    #[test]
    fn test_constructor_is_synthesized() {
        let mut class = class_of("class A extends HTMLElement {\n  go() {}\n}");
        assert!(attach_shadow(&mut class));
        assert_eq!(class.constructor_index(), Some(0));
        assert_eq!(body_texts(&class, "constructor"), vec!["super();", ATTACH_SHADOW]);
    }

    #[test]
    fn test_constructor_without_super() {
        let mut class = class_of("class A extends HTMLElement {\n  constructor() {\n    this.x = 1;\n  }\n}");
        assert!(!attach_shadow(&mut class));
        assert_eq!(body_texts(&class, "constructor"), vec![ATTACH_SHADOW, "this.x = 1;"]);
    }

    #[test]
    fn test_existing_render_is_replaced() {
        let mut class = class_of("class A extends HTMLElement {\n  render(state) {\n    old();\n  }\n}");
        splice_render_method(&mut class, &["fresh();".to_string()]);
        assert_eq!(class.members.len(), 1);
        assert_eq!(body_texts(&class, "render"), vec!["fresh();"]);
        match &class.members[0].kind {
            MemberKind::Method(m) => assert_eq!(m.params, "data"),
            MemberKind::Other(_) => unreachable!(),
        }
    }

    #[test]
    fn test_render_with_other_arity_is_kept() {
        let mut class = class_of("class A extends HTMLElement {\n  render() {\n    old();\n  }\n}");
        splice_render_method(&mut class, &["fresh();".to_string()]);
        assert_eq!(class.members.len(), 2);
        match &class.members[0].kind {
            MemberKind::Method(m) => assert_eq!(m.params, "data"),
            MemberKind::Other(_) => unreachable!(),
        }
    }
}
