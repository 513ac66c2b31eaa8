use crate::error::{Result, TransformError};
use swc_core::common::Spanned;
use swc_core::ecma::ast::{Expr, MemberProp, Tpl};

// -----------------------------------------------------------------------------
// Template extraction
// -----------------------------------------------------------------------------

/// Where a deleted `${...}` sat in the GraphQL text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Top level of the document, after `after_definition` complete definitions.
    Document { after_definition: usize },
    /// Anywhere a document cannot be embedded (selection sets, headers, strings, comments).
    Nested { offset: usize },
}

#[derive(Debug)]
pub struct Interpolation {
    pub expr: Box<Expr>,
    pub offset: usize,
    pub slot: Slot,
}

/// The parseable text of a template plus the expressions removed from it, in source order.
#[derive(Debug)]
pub struct TemplateSource {
    pub text: String,
    pub interpolations: Vec<Interpolation>,
}

pub fn collect_template(tpl: &Tpl) -> Result<TemplateSource> {
    let mut text = String::new();
    let mut removed = Vec::with_capacity(tpl.exprs.len());

    for (idx, quasi) in tpl.quasis.iter().enumerate() {
        match &quasi.cooked {
            Some(cooked) => text.push_str(cooked),
            None => text.push_str(&quasi.raw),
        }
        if let Some(expr) = tpl.exprs.get(idx) {
            ensure_reference_chain(expr)?;
            removed.push((expr.clone(), text.len()));
        }
    }

    let offsets: Vec<usize> = removed.iter().map(|(_, offset)| *offset).collect();
    let slots = classify_slots(&text, &offsets);
    let interpolations = removed
        .into_iter()
        .zip(slots)
        .map(|((expr, offset), slot)| Interpolation { expr, offset, slot })
        .collect();

    Ok(TemplateSource {
        text,
        interpolations,
    })
}

fn ensure_reference_chain(expr: &Expr) -> Result<()> {
    if is_reference_chain(expr) {
        Ok(())
    } else {
        Err(TransformError::UnsupportedInterpolation {
            span: expr.span(),
            kind: describe_expr(expr),
        })
    }
}

/// `a`, `a.b`, `a.b.c`, ... and nothing else.
fn is_reference_chain(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) => true,
        Expr::Member(m) => matches!(m.prop, MemberProp::Ident(_)) && is_reference_chain(&m.obj),
        _ => false,
    }
}

fn describe_expr(expr: &Expr) -> &'static str {
    match expr {
        Expr::Call(_) => "call expression",
        Expr::New(_) => "new expression",
        Expr::Lit(_) => "literal",
        Expr::Tpl(_) | Expr::TaggedTpl(_) => "template literal",
        Expr::Member(_) => "computed or non-identifier member access",
        Expr::OptChain(_) => "optional chain",
        Expr::Bin(_) | Expr::Unary(_) | Expr::Update(_) | Expr::Cond(_) => "operator expression",
        Expr::Object(_) | Expr::Array(_) => "object or array literal",
        Expr::Arrow(_) | Expr::Fn(_) => "function",
        Expr::This(_) => "this",
        Expr::Paren(_) => "parenthesized expression",
        Expr::Await(_) => "await expression",
        _ => "expression",
    }
}

// -----------------------------------------------------------------------------
// Slot scanner
// -----------------------------------------------------------------------------

/// Classify each byte offset (ascending) of `text` as a document-level slot or a nested one.
///
/// Walks GraphQL lexical structure just far enough to know the brace/paren depth,
/// skipping strings, block strings and comments. Commas and whitespace are ignored
/// tokens. A definition is complete when its top-level selection set closes.
pub(crate) fn classify_slots(text: &str, offsets: &[usize]) -> Vec<Slot> {
    let bytes = text.as_bytes();
    let mut slots = Vec::with_capacity(offsets.len());
    let mut next = 0;

    let mut braces = 0usize;
    let mut parens = 0usize;
    let mut closed = 0usize;
    // A definition has started but not yet closed.
    let mut pending = false;
    let mut lexeme = Lexeme::Code;

    let mut i = 0;
    while i <= bytes.len() {
        while next < offsets.len() && offsets[next] <= i {
            let offset = offsets[next];
            let at_top = lexeme == Lexeme::Code && braces == 0 && parens == 0 && !pending;
            slots.push(if at_top && offset == i {
                Slot::Document {
                    after_definition: closed,
                }
            } else {
                Slot::Nested { offset }
            });
            next += 1;
        }
        let Some(&b) = bytes.get(i) else {
            break;
        };

        match lexeme {
            Lexeme::Comment => {
                if b == b'\n' || b == b'\r' {
                    lexeme = Lexeme::Code;
                }
                i += 1;
            }
            Lexeme::String => {
                match b {
                    b'\\' => i += 1,
                    b'"' | b'\n' => lexeme = Lexeme::Code,
                    _ => {}
                }
                i += 1;
            }
            Lexeme::BlockString => {
                if bytes[i..].starts_with(b"\\\"\"\"") {
                    i += 4;
                } else if bytes[i..].starts_with(b"\"\"\"") {
                    lexeme = Lexeme::Code;
                    i += 3;
                } else {
                    i += 1;
                }
            }
            Lexeme::Code => {
                let top = braces == 0 && parens == 0;
                match b {
                    b' ' | b'\t' | b'\n' | b'\r' | b',' => {}
                    b'#' => lexeme = Lexeme::Comment,
                    b'"' => {
                        pending |= top;
                        if bytes[i..].starts_with(b"\"\"\"") {
                            lexeme = Lexeme::BlockString;
                            i += 2;
                        } else {
                            lexeme = Lexeme::String;
                        }
                    }
                    b'{' => {
                        pending |= top;
                        braces += 1;
                    }
                    b'}' => {
                        braces = braces.saturating_sub(1);
                        if braces == 0 && parens == 0 {
                            closed += 1;
                            pending = false;
                        }
                    }
                    b'(' => {
                        pending |= top;
                        parens += 1;
                    }
                    b')' => parens = parens.saturating_sub(1),
                    _ => pending |= top,
                }
                i += 1;
            }
        }
    }

    // Offsets past the end of the text cannot be placed.
    slots.extend(
        offsets[next..]
            .iter()
            .map(|&offset| Slot::Nested { offset }),
    );
    slots
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lexeme {
    Code,
    Comment,
    String,
    BlockString,
}
