//! A minimal statement-level tree for component scripts.
//!
//! Only the shape needed for splicing is modelled: module items, class
//! declarations, class members and the statements of method bodies. Every
//! other construct is kept as opaque source text.

use crate::lexer::{match_brackets, tokenize, TokenKind};

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub items: Vec<ModuleItem>,
}

impl Module {
    /// The first top-level class declaration with an `extends` clause.
    pub fn first_extending_class(&self) -> Option<&ClassDecl> {
        self.items.iter().find_map(|item| match item {
            ModuleItem::Class(class) if class.extends.is_some() => Some(class),
            _ => None,
        })
    }

    pub fn first_extending_class_mut(&mut self) -> Option<&mut ClassDecl> {
        self.items.iter_mut().find_map(|item| match item {
            ModuleItem::Class(class) if class.extends.is_some() => Some(class),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleItem {
    Stmt(Stmt),
    Class(ClassDecl),
}

impl ModuleItem {
    pub fn blank_before(&self) -> bool {
        match self {
            ModuleItem::Stmt(stmt) => stmt.blank_before,
            ModuleItem::Class(class) => class.blank_before,
        }
    }
}

/// An opaque statement, comments included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub text: String,
    /// Whether a blank line separates this statement from the previous one.
    pub blank_before: bool,
}

impl Stmt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blank_before: false,
        }
    }

    /// Whether the statement's code starts with a call to `callee`, as in
    /// `super(...)`.
    pub fn starts_with_call(&self, callee: &str) -> bool {
        let Ok(tokens) = tokenize(&self.text) else {
            return false;
        };
        let mut code = tokens.iter().filter(|t| !t.is_trivia());
        matches!(
            (code.next(), code.next()),
            (Some(a), Some(b)) if a.kind == TokenKind::Ident && a.text == callee && b.is_punct("(")
        )
    }
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub blank_before: bool,
    /// Comments written before the declaration.
    pub leading: String,
    /// Everything from the first keyword up to the body, e.g.
    /// `export class Counter extends HTMLElement`.
    pub header: String,
    pub name: Option<String>,
    /// The superclass expression.
    pub extends: Option<String>,
    pub members: Vec<ClassMember>,
    /// Text after the closing brace on the same statement, such as `;`.
    pub trailing: String,
}

impl ClassDecl {
    /// Index of the first non-static method called `name`.
    pub fn find_method(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| match &m.kind {
            MemberKind::Method(method) => {
                method.name == name && !method.is_static && method.kind == MethodKind::Method
            }
            MemberKind::Other(_) => false,
        })
    }

    /// Index of the first instance field `name` whose value is an arrow or
    /// function expression with a block body, as in
    /// `connectedCallback = () => { ... }`.
    pub fn find_field_function(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| match &m.kind {
            MemberKind::Other(text) => field_function_body(text, name).is_some(),
            MemberKind::Method(_) => false,
        })
    }

    /// Insert `stmt` as the first statement of the field function at
    /// `index`. Returns false when that member is not a field function.
    pub fn prepend_to_field_function(&mut self, index: usize, name: &str, stmt: &str) -> bool {
        let Some(ClassMember {
            kind: MemberKind::Other(text),
            ..
        }) = self.members.get_mut(index)
        else {
            return false;
        };
        let Some(open_end) = field_function_body(text, name) else {
            return false;
        };
        let rest = &text[open_end..];
        let multiline = rest.find('\n').is_some_and(|nl| rest[..nl].trim().is_empty());
        let insertion = if multiline {
            format!("\n{stmt}")
        } else if rest.starts_with(char::is_whitespace) {
            format!(" {stmt}")
        } else {
            format!(" {stmt} ")
        };
        text.insert_str(open_end, &insertion);
        true
    }

    pub fn constructor_index(&self) -> Option<usize> {
        self.members.iter().position(|m| {
            matches!(&m.kind, MemberKind::Method(method) if method.kind == MethodKind::Constructor)
        })
    }

    pub fn method_mut(&mut self, index: usize) -> Option<&mut Method> {
        match self.members.get_mut(index).map(|m| &mut m.kind) {
            Some(MemberKind::Method(method)) => Some(method),
            _ => None,
        }
    }

    /// Insert a method at `index`, separated from its neighbours by blank
    /// lines.
    pub fn insert_method(&mut self, index: usize, method: Method) {
        let index = index.min(self.members.len());
        self.members.insert(
            index,
            ClassMember {
                blank_before: true,
                kind: MemberKind::Method(method),
            },
        );
        if let Some(next) = self.members.get_mut(index + 1) {
            next.blank_before = true;
        }
    }
}

/// Byte offset just after the `{` that opens the body of the function
/// assigned to field `name` in `text`.
fn field_function_body(text: &str, name: &str) -> Option<usize> {
    let tokens = tokenize(text).ok()?;
    let pairs = match_brackets(text, &tokens).ok()?;
    let code: Vec<usize> = (0..tokens.len()).filter(|&i| !tokens[i].is_trivia()).collect();
    let at = |k: usize| code.get(k).map(|&i| tokens[i]);
    let after = |i: usize| code.iter().position(|&c| c > i);

    let mut k = 0;
    while at(k).is_some_and(|t| {
        t.kind == TokenKind::Ident && matches!(t.text, "public" | "private" | "protected" | "readonly" | "override")
    }) {
        k += 1;
    }
    if !at(k).is_some_and(|t| t.is_ident(name)) || !at(k + 1).is_some_and(|t| t.is_punct("=")) {
        return None;
    }
    k += 2;
    if at(k).is_some_and(|t| t.is_ident("async")) {
        k += 1;
    }

    let open = match at(k)? {
        t if t.is_ident("function") => {
            k += 1;
            if at(k).is_some_and(|t| t.is_punct("*")) {
                k += 1;
            }
            if at(k).is_some_and(|t| t.kind == TokenKind::Ident) {
                k += 1;
            }
            let close = pairs[*code.get(k).filter(|&&i| tokens[i].is_punct("("))?]?;
            after(close)?
        }
        t if t.is_punct("(") => {
            let close = pairs[code[k]]?;
            let arrow = after(close)?;
            at(arrow).filter(|t| t.is_punct("=>"))?;
            arrow + 1
        }
        t if t.kind == TokenKind::Ident => {
            at(k + 1).filter(|t| t.is_punct("=>"))?;
            k + 2
        }
        _ => return None,
    };
    let brace = at(open).filter(|t| t.is_punct("{"))?;
    Some(brace.end())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMember {
    pub blank_before: bool,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Method(Method),
    /// Fields, static blocks, bodiless signatures and stray comments.
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Getter,
    Setter,
}

/// A class method with a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Decorators, modifiers and the name, e.g. `static async load`.
    pub head: String,
    pub name: String,
    pub kind: MethodKind,
    pub is_static: bool,
    /// The text between the parentheses.
    pub params: String,
    /// Text between `)` and the body, such as a return type.
    pub between: String,
    pub body: Block,
}

impl Method {
    /// A plain method `name(params) { ... }`.
    pub fn new(name: &str, params: &str, stmts: Vec<Stmt>) -> Self {
        Self {
            head: name.to_string(),
            name: name.to_string(),
            kind: if name == "constructor" {
                MethodKind::Constructor
            } else {
                MethodKind::Method
            },
            is_static: false,
            params: params.to_string(),
            between: String::new(),
            body: Block { stmts },
        }
    }

    /// Number of declared parameters.
    pub fn param_count(&self) -> usize {
        let Ok(tokens) = tokenize(&self.params) else {
            return 0;
        };
        let mut depth = 0usize;
        let mut count = 0usize;
        let mut pending = false;
        for token in tokens.iter().filter(|t| !t.is_trivia()) {
            if token.is_opener() {
                depth += 1;
            } else if token.is_closer() {
                depth = depth.saturating_sub(1);
            } else if token.is_punct(",") && depth == 0 {
                if pending {
                    count += 1;
                }
                pending = false;
                continue;
            }
            pending = true;
        }
        if pending {
            count += 1;
        }
        count
    }
}

/// The statements of a function body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    /// Index of the first statement that calls `callee`.
    pub fn position_of_call(&self, callee: &str) -> Option<usize> {
        self.stmts.iter().position(|s| s.starts_with_call(callee))
    }

    pub fn insert(&mut self, index: usize, stmt: Stmt) {
        let index = index.min(self.stmts.len());
        self.stmts.insert(index, stmt);
    }
}
