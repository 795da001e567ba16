//! Syntax checks backed by swc.

use crate::error::{Position, ScriptError, ScriptResult};
use swc_common::{sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// Check that `source` parses as a TypeScript module.
pub fn check_typescript(source: &str) -> ScriptResult<()> {
    let syntax = Syntax::Typescript(TsSyntax {
        decorators: true,
        ..Default::default()
    });
    parse(source, syntax).map_err(|(message, offset)| ScriptError::InvalidTypeScript {
        message,
        at: Position::of(source, offset),
    })
}

/// Check that `source` parses as a JavaScript module.
pub fn check_javascript(source: &str) -> ScriptResult<()> {
    let syntax = Syntax::Es(EsSyntax {
        decorators: true,
        ..Default::default()
    });
    parse(source, syntax).map_err(|(message, offset)| ScriptError::InvalidOutput {
        message,
        at: Position::of(source, offset),
    })
}

/// Parse and return the first error's message and byte offset.
fn parse(source: &str, syntax: Syntax) -> Result<(), (String, usize)> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("component".into()).into(),
        source.to_string(),
    );
    let lexer = Lexer::new(syntax, EsVersion::latest(), StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);

    let result = parser.parse_module();
    let recovered = parser.take_errors();
    let error = match result {
        Err(e) => Some(e),
        Ok(_) => recovered.into_iter().next(),
    };
    match error {
        Some(e) => {
            let offset = e.span().lo.0.saturating_sub(fm.start_pos.0) as usize;
            Err((e.kind().msg().to_string(), offset))
        }
        None => Ok(()),
    }
}
