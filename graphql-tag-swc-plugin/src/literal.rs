use crate::ast::{self, Definition, Selection, Type, Value};
use crate::canonical::SignedDocument;
use crate::collect::{Interpolation, Slot};
use crate::error::{Result, TransformError};
use swc_core::{
    common::DUMMY_SP,
    ecma::ast::*,
};

/// Property carrying the document signature on every inlined document.
pub const SIGNATURE_KEY: &str = "__signature__";

// -----------------------------------------------------------------------------
// Literal builders
// -----------------------------------------------------------------------------

fn str_lit(value: &str) -> Box<Expr> {
    Box::new(Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    })))
}

fn bool_lit(value: bool) -> Box<Expr> {
    Box::new(Expr::Lit(Lit::Bool(Bool {
        span: DUMMY_SP,
        value,
    })))
}

fn prop(key: &str, value: Box<Expr>) -> PropOrSpread {
    PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
        key: PropName::Ident(IdentName::new(key.into(), DUMMY_SP)),
        value,
    })))
}

fn object(props: Vec<PropOrSpread>) -> Box<Expr> {
    Box::new(Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props,
    }))
}

fn array(elems: Vec<ExprOrSpread>) -> Box<Expr> {
    Box::new(Expr::Array(ArrayLit {
        span: DUMMY_SP,
        elems: elems.into_iter().map(Some).collect(),
    }))
}

fn elem(expr: Box<Expr>) -> ExprOrSpread {
    ExprOrSpread { spread: None, expr }
}

fn list<T>(items: &[T], f: impl Fn(&T) -> Box<Expr>) -> Box<Expr> {
    array(items.iter().map(|item| elem(f(item))).collect())
}

/// `{ kind: "<kind>", ...props }`
fn node(kind: &str, mut props: Vec<PropOrSpread>) -> Box<Expr> {
    props.insert(0, prop("kind", str_lit(kind)));
    object(props)
}

fn name(value: &str) -> Box<Expr> {
    node("Name", vec![prop("value", str_lit(value))])
}

/// `...<expr>.definitions`
fn spread_definitions(expr: Box<Expr>) -> ExprOrSpread {
    ExprOrSpread {
        spread: Some(DUMMY_SP),
        expr: Box::new(Expr::Member(MemberExpr {
            span: DUMMY_SP,
            obj: expr,
            prop: MemberProp::Ident(IdentName::new("definitions".into(), DUMMY_SP)),
        })),
    }
}

// -----------------------------------------------------------------------------
// Document → literal
// -----------------------------------------------------------------------------

/// Build the object literal for `signed`, re-threading `interpolations` into the
/// top-level `definitions` array at the slots they were removed from.
pub fn literalize(signed: SignedDocument, interpolations: Vec<Interpolation>) -> Result<Box<Expr>> {
    let SignedDocument {
        document,
        signature,
    } = signed;

    let expected = interpolations.len();
    let defs = &document.definitions;
    let mut pending = interpolations.into_iter().peekable();
    let mut consumed = 0;
    let mut definitions = Vec::with_capacity(defs.len() + expected);

    for idx in 0..=defs.len() {
        while let Some(interp) = pending.next_if(|i| is_slot_after(&i.slot, idx)) {
            definitions.push(spread_definitions(interp.expr));
            consumed += 1;
        }
        if let Some(def) = defs.get(idx) {
            definitions.push(elem(definition(def)));
        }
    }

    if consumed != expected {
        return Err(TransformError::InterpolationMismatch { expected, consumed });
    }

    Ok(node(
        "Document",
        vec![
            prop("definitions", array(definitions)),
            prop(SIGNATURE_KEY, str_lit(&signature)),
        ],
    ))
}

fn is_slot_after(slot: &Slot, definitions: usize) -> bool {
    matches!(slot, Slot::Document { after_definition } if *after_definition == definitions)
}

fn definition(def: &ast::Definition) -> Box<Expr> {
    match def {
        Definition::Operation(op) => {
            let mut props = vec![prop("operation", str_lit(op.operation.as_str()))];
            if let Some(op_name) = &op.name {
                props.push(prop("name", name(op_name)));
            }
            props.push(prop(
                "variableDefinitions",
                list(&op.variable_definitions, variable_definition),
            ));
            props.push(prop("directives", list(&op.directives, directive)));
            props.push(prop("selectionSet", selection_set(&op.selection_set)));
            node("OperationDefinition", props)
        }
        Definition::Fragment(f) => node(
            "FragmentDefinition",
            vec![
                prop("name", name(&f.name)),
                prop("typeCondition", named_type(&f.type_condition)),
                prop("directives", list(&f.directives, directive)),
                prop("selectionSet", selection_set(&f.selection_set)),
            ],
        ),
    }
}

fn variable_definition(var: &ast::VariableDefinition) -> Box<Expr> {
    let mut props = vec![
        prop("variable", variable(&var.name)),
        prop("type", type_ref(&var.var_type)),
    ];
    if let Some(default) = &var.default_value {
        props.push(prop("defaultValue", value(default)));
    }
    props.push(prop("directives", list(&var.directives, directive)));
    node("VariableDefinition", props)
}

fn variable(var_name: &str) -> Box<Expr> {
    node("Variable", vec![prop("name", name(var_name))])
}

fn type_ref(ty: &ast::Type) -> Box<Expr> {
    match ty {
        Type::Named(type_name) => named_type(type_name),
        Type::List(inner) => node("ListType", vec![prop("type", type_ref(inner))]),
        Type::NonNull(inner) => node("NonNullType", vec![prop("type", type_ref(inner))]),
    }
}

fn named_type(type_name: &str) -> Box<Expr> {
    node("NamedType", vec![prop("name", name(type_name))])
}

fn selection_set(set: &ast::SelectionSet) -> Box<Expr> {
    node(
        "SelectionSet",
        vec![prop("selections", list(&set.items, selection))],
    )
}

fn selection(sel: &ast::Selection) -> Box<Expr> {
    match sel {
        Selection::Field(field) => {
            let mut props = vec![];
            if let Some(alias) = &field.alias {
                props.push(prop("alias", name(alias)));
            }
            props.push(prop("name", name(&field.name)));
            props.push(prop("arguments", list(&field.arguments, argument)));
            props.push(prop("directives", list(&field.directives, directive)));
            if let Some(set) = &field.selection_set {
                props.push(prop("selectionSet", selection_set(set)));
            }
            node("Field", props)
        }
        Selection::FragmentSpread(spread) => node(
            "FragmentSpread",
            vec![
                prop("name", name(&spread.fragment_name)),
                prop("directives", list(&spread.directives, directive)),
            ],
        ),
        Selection::InlineFragment(inline) => {
            let mut props = vec![];
            if let Some(cond) = &inline.type_condition {
                props.push(prop("typeCondition", named_type(cond)));
            }
            props.push(prop("directives", list(&inline.directives, directive)));
            props.push(prop("selectionSet", selection_set(&inline.selection_set)));
            node("InlineFragment", props)
        }
    }
}

fn argument(arg: &ast::Argument) -> Box<Expr> {
    node(
        "Argument",
        vec![prop("name", name(&arg.name)), prop("value", value(&arg.value))],
    )
}

fn directive(dir: &ast::Directive) -> Box<Expr> {
    node(
        "Directive",
        vec![
            prop("name", name(&dir.name)),
            prop("arguments", list(&dir.arguments, argument)),
        ],
    )
}

fn object_field(field: &ast::ObjectField) -> Box<Expr> {
    node(
        "ObjectField",
        vec![prop("name", name(&field.name)), prop("value", value(&field.value))],
    )
}

fn value(v: &ast::Value) -> Box<Expr> {
    match v {
        Value::Variable(var_name) => variable(var_name),
        Value::Int(raw) => node("IntValue", vec![prop("value", str_lit(raw))]),
        Value::Float(raw) => node("FloatValue", vec![prop("value", str_lit(raw))]),
        Value::String { value, block } => node(
            "StringValue",
            vec![prop("value", str_lit(value)), prop("block", bool_lit(*block))],
        ),
        Value::Boolean(b) => node("BooleanValue", vec![prop("value", bool_lit(*b))]),
        Value::Null => node("NullValue", vec![]),
        Value::Enum(e) => node("EnumValue", vec![prop("value", str_lit(e))]),
        Value::List(items) => node("ListValue", vec![prop("values", list(items, value))]),
        Value::Object(fields) => node("ObjectValue", vec![prop("fields", list(fields, object_field))]),
    }
}
