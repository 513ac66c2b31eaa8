//! Content signatures for GraphQL documents.
//!
//! The signature is a SHA-256 over a canonical rendering of the document that
//! ignores formatting, sibling order and the values (but not the kinds) of
//! Int, Float and String literals. Two documents that differ only in those
//! respects share a signature; the emitted document itself always keeps its
//! real values.

use crate::ast::{self, Definition, Selection, Type, Value};
use crate::collect::TemplateSource;
use crate::error::{Result, TransformError};
use sha2::{Digest, Sha256};

/// A parsed document with its signature attached out of band.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedDocument {
    pub document: ast::Document,
    pub signature: String,
}

impl SignedDocument {
    fn sign(document: ast::Document) -> Self {
        let signature = signature(&canonical_form(&document));
        Self {
            document,
            signature,
        }
    }
}

pub fn canonicalize(raw_text: &str) -> Result<SignedDocument> {
    let document = ast::parse(raw_text).map_err(|err| TransformError::QuerySyntax {
        message: err.to_string(),
        source_text: raw_text.to_string(),
    })?;
    ensure_named_operations(&document, raw_text)?;
    Ok(SignedDocument::sign(document))
}

/// Like [`canonicalize`], except that a template made only of interpolations
/// (and ignored tokens) yields an empty document.
pub fn canonicalize_template(source: &TemplateSource) -> Result<SignedDocument> {
    if !source.interpolations.is_empty() && is_blank(&source.text) {
        return Ok(SignedDocument::sign(ast::Document {
            definitions: vec![],
        }));
    }
    canonicalize(&source.text)
}

/// Whether the text holds nothing but GraphQL ignored tokens.
fn is_blank(text: &str) -> bool {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .all(|code| code.chars().all(|c| c.is_whitespace() || c == ',' || c == '\u{feff}'))
}

fn ensure_named_operations(document: &ast::Document, raw_text: &str) -> Result<()> {
    if document.definitions.len() < 2 {
        return Ok(());
    }
    let unnamed = document.definitions.iter().any(|def| match def {
        Definition::Operation(op) => op.name.is_none(),
        Definition::Fragment(_) => false,
    });
    if unnamed {
        return Err(TransformError::UnnamedOperation {
            source_text: raw_text.to_string(),
        });
    }
    Ok(())
}

pub fn signature(canonical: &str) -> String {
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

// -----------------------------------------------------------------------------
// Canonical printer
// -----------------------------------------------------------------------------

pub fn canonical_form(document: &ast::Document) -> String {
    let definitions = document.definitions.iter().map(definition).collect();
    join_sorted(definitions)
}

fn definition(def: &ast::Definition) -> String {
    let mut out = String::new();
    match def {
        Definition::Operation(op) => {
            push_token(&mut out, op.operation.as_str());
            if let Some(name) = &op.name {
                push_token(&mut out, name);
            }
            if !op.variable_definitions.is_empty() {
                let vars = op.variable_definitions.iter().map(variable_definition).collect();
                push_token(&mut out, &format!("({})", join_sorted(vars)));
            }
            push_token(&mut out, &directives(&op.directives));
            push_token(&mut out, &selection_set(&op.selection_set));
        }
        Definition::Fragment(f) => {
            push_token(&mut out, "fragment");
            push_token(&mut out, &f.name);
            push_token(&mut out, &type_condition(&f.type_condition));
            push_token(&mut out, &directives(&f.directives));
            push_token(&mut out, &selection_set(&f.selection_set));
        }
    }
    out
}

fn variable_definition(var: &ast::VariableDefinition) -> String {
    let mut out = format!("${}:", var.name);
    push_token(&mut out, &type_ref(&var.var_type));
    if let Some(default) = &var.default_value {
        push_token(&mut out, "=");
        push_token(&mut out, &value(default));
    }
    push_token(&mut out, &directives(&var.directives));
    out
}

fn type_ref(ty: &ast::Type) -> String {
    match ty {
        Type::Named(name) => name.clone(),
        Type::List(inner) => format!("[{}]", type_ref(inner)),
        Type::NonNull(inner) => format!("{}!", type_ref(inner)),
    }
}

fn type_condition(name: &str) -> String {
    let mut out = String::from("on");
    push_token(&mut out, name);
    out
}

fn selection_set(set: &ast::SelectionSet) -> String {
    let items = set.items.iter().map(selection).collect();
    format!("{{{}}}", join_sorted(items))
}

fn selection(sel: &ast::Selection) -> String {
    let mut out = String::new();
    match sel {
        Selection::Field(field) => {
            if let Some(alias) = &field.alias {
                push_token(&mut out, &format!("{alias}:"));
            }
            push_token(&mut out, &field.name);
            push_token(&mut out, &arguments(&field.arguments));
            push_token(&mut out, &directives(&field.directives));
            if let Some(set) = &field.selection_set {
                push_token(&mut out, &selection_set(set));
            }
        }
        Selection::FragmentSpread(spread) => {
            push_token(&mut out, "...");
            push_token(&mut out, &spread.fragment_name);
            push_token(&mut out, &directives(&spread.directives));
        }
        Selection::InlineFragment(inline) => {
            push_token(&mut out, "...");
            if let Some(cond) = &inline.type_condition {
                push_token(&mut out, &type_condition(cond));
            }
            push_token(&mut out, &directives(&inline.directives));
            push_token(&mut out, &selection_set(&inline.selection_set));
        }
    }
    out
}

fn arguments(args: &[ast::Argument]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let args = args.iter().map(|arg| pair(&arg.name, &arg.value)).collect();
    format!("({})", join_sorted(args))
}

fn pair(name: &str, v: &ast::Value) -> String {
    let mut out = format!("{name}:");
    push_token(&mut out, &value(v));
    out
}

fn directives(dirs: &[ast::Directive]) -> String {
    let mut out = String::new();
    for dir in dirs {
        push_token(&mut out, &format!("@{}", dir.name));
        push_token(&mut out, &arguments(&dir.arguments));
    }
    out
}

/// Print a value with Int, Float and String contents blanked.
fn value(v: &ast::Value) -> String {
    match v {
        Value::Variable(name) => format!("${name}"),
        Value::Int(_) => "0".to_string(),
        Value::Float(_) => "0.0".to_string(),
        Value::String { .. } => "\"\"".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Enum(name) => name.clone(),
        Value::List(items) => {
            let mut out = String::new();
            for item in items {
                push_token(&mut out, &value(item));
            }
            format!("[{out}]")
        }
        Value::Object(fields) => {
            let fields = fields.iter().map(|f| pair(&f.name, &f.value)).collect();
            format!("{{{}}}", join_sorted(fields))
        }
    }
}

// -----------------------------------------------------------------------------
// Token joining
// -----------------------------------------------------------------------------

fn join_sorted(mut parts: Vec<String>) -> String {
    parts.sort();
    let mut out = String::new();
    for part in &parts {
        push_token(&mut out, part);
    }
    out
}

/// Append `token`, separating it with a single space only where two adjacent
/// tokens would otherwise merge (`a b`, `"" ""`, `0 -1`).
fn push_token(out: &mut String, token: &str) {
    let Some(first) = token.chars().next() else {
        return;
    };
    let needs_space = out
        .chars()
        .next_back()
        .is_some_and(|last| is_word_char(last) && (is_word_char(first) || first == '-'));
    if needs_space {
        out.push(' ');
    }
    out.push_str(token);
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '"'
}
