//! Script handling for webcomp components.
//!
//! This crate provides:
//! - A lossless tokenizer for JavaScript and TypeScript
//! - A statement-level tree with class and method structure
//! - A canonical printer and formatting normalization
//! - TypeScript type erasure, validated with swc

pub mod ast;
pub mod error;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod typescript;
pub mod validate;

pub use ast::*;
pub use error::{Position, ScriptError, ScriptResult};
pub use format::normalize;
pub use parser::parse_module;
pub use printer::{print_module, reindent};
pub use typescript::strip_types;

/// Normalize and print `source` in canonical form.
pub fn reformat(source: &str) -> ScriptResult<String> {
    let normalized = normalize(source)?;
    Ok(print_module(&parse_module(&normalized)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reformat() {
        let source = "import { html } from \"lit-html\";\nclass A extends HTMLElement {\n    constructor() {\n        super();\n        this.items = [\n            1,\n            2\n        ];\n    }\n}";
        assert_eq!(
            reformat(source).unwrap(),
            "import { html } from 'lit-html';\nclass A extends HTMLElement {\n  constructor() {\n    super();\n    this.items = [\n      1,\n      2,\n    ];\n  }\n}"
        );
    }

    #[test]
    fn test_reformat_is_idempotent() {
        let source = "const a = {b: \"c\",\n d: 1}\n\n\nexport class A extends B {\n  connectedCallback(){ this.go() }\n}\ncustomElements.define(\"x-a\", A);";
        let once = reformat(source).unwrap();
        assert_eq!(reformat(&once).unwrap(), once);
    }

    #[test]
    fn test_strip_then_reformat() {
        let source = "class A extends HTMLElement {\n  private n: number = 1;\n}";
        let js = strip_types(source).unwrap();
        assert_eq!(reformat(&js).unwrap(), "class A extends HTMLElement {\n  n = 1;\n}");
    }
}
